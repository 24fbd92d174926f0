//! 路由器契约
//!
//! 每个 HTTP 方法对应一个注册函数。默认实现返回
//! [`CompileError::UnsupportedMethod`]，路由器只需实现自己支持的方法。

use crate::error::{CompileError, CompileResult};
use crate::handler::HandlerChain;
use crate::method::HttpMethod;

fn unsupported(method: HttpMethod, path: &str) -> CompileResult<()> {
    Err(CompileError::UnsupportedMethod {
        method,
        path: path.to_string(),
    })
}

/// 路由器
pub trait Router {
    type Request: Send + 'static;
    type Response: Send + 'static;

    fn get(
        &mut self,
        path: &str,
        _handlers: HandlerChain<Self::Request, Self::Response>,
    ) -> CompileResult<()> {
        unsupported(HttpMethod::Get, path)
    }

    fn post(
        &mut self,
        path: &str,
        _handlers: HandlerChain<Self::Request, Self::Response>,
    ) -> CompileResult<()> {
        unsupported(HttpMethod::Post, path)
    }

    fn put(
        &mut self,
        path: &str,
        _handlers: HandlerChain<Self::Request, Self::Response>,
    ) -> CompileResult<()> {
        unsupported(HttpMethod::Put, path)
    }

    fn delete(
        &mut self,
        path: &str,
        _handlers: HandlerChain<Self::Request, Self::Response>,
    ) -> CompileResult<()> {
        unsupported(HttpMethod::Delete, path)
    }

    fn patch(
        &mut self,
        path: &str,
        _handlers: HandlerChain<Self::Request, Self::Response>,
    ) -> CompileResult<()> {
        unsupported(HttpMethod::Patch, path)
    }

    fn head(
        &mut self,
        path: &str,
        _handlers: HandlerChain<Self::Request, Self::Response>,
    ) -> CompileResult<()> {
        unsupported(HttpMethod::Head, path)
    }

    fn options(
        &mut self,
        path: &str,
        _handlers: HandlerChain<Self::Request, Self::Response>,
    ) -> CompileResult<()> {
        unsupported(HttpMethod::Options, path)
    }
}

/// 查找 HTTP 方法对应的注册函数
#[allow(clippy::type_complexity)]
pub fn registrar<R>(
    method: HttpMethod,
) -> fn(&mut R, &str, HandlerChain<R::Request, R::Response>) -> CompileResult<()>
where
    R: Router + ?Sized,
{
    match method {
        HttpMethod::Get => R::get,
        HttpMethod::Post => R::post,
        HttpMethod::Put => R::put,
        HttpMethod::Delete => R::delete,
        HttpMethod::Patch => R::patch,
        HttpMethod::Head => R::head,
        HttpMethod::Options => R::options,
    }
}

/// 按 HTTP 方法把处理器链注册到路由器
pub fn register<R>(
    router: &mut R,
    method: HttpMethod,
    path: &str,
    handlers: HandlerChain<R::Request, R::Response>,
) -> CompileResult<()>
where
    R: Router + ?Sized,
{
    registrar::<R>(method)(router, path, handlers)
}
