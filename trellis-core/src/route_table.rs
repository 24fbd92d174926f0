//! 内存路由表
//!
//! 记录编译器发出的注册，并能按注册顺序执行一条处理器链。
//! 同一方法和路径重复注册时，新的处理器追加到已有链的末尾。

use std::collections::HashMap;
use std::fmt;

use crate::error::CompileResult;
use crate::handler::{Continuation, HandlerChain, Next};
use crate::method::HttpMethod;
use crate::router::Router;

/// 路由键，显示为 `GET:/path`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteKey {
    pub method: HttpMethod,
    pub path: String,
}

impl RouteKey {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.method, self.path)
    }
}

/// 请求分发结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// 没有匹配的路由
    NotFound,
    /// 第 `at` 个处理器结束时没有继续，请求在这里完成
    Completed { at: usize },
    /// 所有处理器都调用了 `proceed`
    Exhausted,
}

/// 内存路由表
pub struct RouteTable<Req, Res> {
    order: Vec<RouteKey>,
    routes: HashMap<RouteKey, HandlerChain<Req, Res>>,
}

impl<Req, Res> RouteTable<Req, Res>
where
    Req: Clone + Send + 'static,
    Res: Clone + Send + 'static,
{
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            routes: HashMap::new(),
        }
    }

    fn insert(&mut self, method: HttpMethod, path: &str, handlers: HandlerChain<Req, Res>) {
        let key = RouteKey::new(method, path);
        tracing::trace!(route = %key, handlers = handlers.len(), "Route registered");
        match self.routes.get_mut(&key) {
            Some(chain) => chain.extend(handlers),
            None => {
                self.order.push(key.clone());
                self.routes.insert(key, handlers);
            }
        }
    }

    /// 查找已注册的处理器链
    pub fn handlers(&self, method: HttpMethod, path: &str) -> Option<&HandlerChain<Req, Res>> {
        self.routes.get(&RouteKey::new(method, path))
    }

    pub fn contains(&self, method: HttpMethod, path: &str) -> bool {
        self.handlers(method, path).is_some()
    }

    /// 按首次注册顺序列出路由
    pub fn keys(&self) -> impl Iterator<Item = &RouteKey> {
        self.order.iter()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// 执行匹配的处理器链
    ///
    /// 每个处理器拿到新的 `Next`；处理器调用 `proceed` 时继续下一个，
    /// 调用 `fail` 时返回错误，两者都没有调用时请求在该处理器完成。
    pub async fn dispatch(
        &self,
        method: HttpMethod,
        path: &str,
        request: Req,
        response: Res,
    ) -> anyhow::Result<DispatchOutcome> {
        let Some(chain) = self.handlers(method, path) else {
            tracing::debug!(%method, path, "No route matched");
            return Ok(DispatchOutcome::NotFound);
        };

        for (index, handler) in chain.iter().enumerate() {
            let next = Next::new();
            handler(request.clone(), response.clone(), next.clone()).await;

            match next.take() {
                Some(Continuation::Proceed) => continue,
                Some(Continuation::Fail(error)) => {
                    tracing::warn!(%method, path, handler = index, error = %error, "Handler failed");
                    return Err(error);
                }
                None => return Ok(DispatchOutcome::Completed { at: index }),
            }
        }

        Ok(DispatchOutcome::Exhausted)
    }
}

impl<Req, Res> Default for RouteTable<Req, Res>
where
    Req: Clone + Send + 'static,
    Res: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<Req, Res> fmt::Debug for RouteTable<Req, Res> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.order.iter().map(|key| {
                let handlers = self.routes.get(key).map_or(0, Vec::len);
                format!("{key} ({handlers} handlers)")
            }))
            .finish()
    }
}

impl<Req, Res> Router for RouteTable<Req, Res>
where
    Req: Clone + Send + 'static,
    Res: Clone + Send + 'static,
{
    type Request = Req;
    type Response = Res;

    fn get(&mut self, path: &str, handlers: HandlerChain<Req, Res>) -> CompileResult<()> {
        self.insert(HttpMethod::Get, path, handlers);
        Ok(())
    }

    fn post(&mut self, path: &str, handlers: HandlerChain<Req, Res>) -> CompileResult<()> {
        self.insert(HttpMethod::Post, path, handlers);
        Ok(())
    }

    fn put(&mut self, path: &str, handlers: HandlerChain<Req, Res>) -> CompileResult<()> {
        self.insert(HttpMethod::Put, path, handlers);
        Ok(())
    }

    fn delete(&mut self, path: &str, handlers: HandlerChain<Req, Res>) -> CompileResult<()> {
        self.insert(HttpMethod::Delete, path, handlers);
        Ok(())
    }

    fn patch(&mut self, path: &str, handlers: HandlerChain<Req, Res>) -> CompileResult<()> {
        self.insert(HttpMethod::Patch, path, handlers);
        Ok(())
    }

    fn head(&mut self, path: &str, handlers: HandlerChain<Req, Res>) -> CompileResult<()> {
        self.insert(HttpMethod::Head, path, handlers);
        Ok(())
    }

    fn options(&mut self, path: &str, handlers: HandlerChain<Req, Res>) -> CompileResult<()> {
        self.insert(HttpMethod::Options, path, handlers);
        Ok(())
    }
}
