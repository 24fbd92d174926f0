//! 处理器类型
//!
//! - [`RouterHandler`]：路由器原生的处理器签名 `(request, response, next)`
//! - [`Handler`]：挂在路由组实例上的目标处理器，分为直接调用和延迟调用两种形态
//! - [`Next`]：交给每个路由处理器的续延

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use parking_lot::Mutex;

/// 路由器原生处理器
pub type RouterHandler<Req, Res> =
    Arc<dyn Fn(Req, Res, Next) -> BoxFuture<'static, ()> + Send + Sync>;

/// 按执行顺序排列的处理器链
pub type HandlerChain<Req, Res> = Vec<RouterHandler<Req, Res>>;

/// 把异步闭包包装为 [`RouterHandler`]
pub fn router_handler<Req, Res, F, Fut>(f: F) -> RouterHandler<Req, Res>
where
    Req: 'static,
    Res: 'static,
    F: Fn(Req, Res, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move |req: Req, res: Res, next: Next| -> BoxFuture<'static, ()> {
        Box::pin(f(req, res, next))
    })
}

/// 处理器结束时留下的续延信号
#[derive(Debug)]
pub enum Continuation {
    /// 继续执行链上的下一个处理器
    Proceed,
    /// 处理失败，交给路由器的错误通道
    Fail(anyhow::Error),
}

/// 续延
///
/// 路由器为每次调用创建一个 `Next`，保留一个克隆用于读取处理器留下的信号。
/// 只记录第一次信号，之后的调用会被忽略。
#[derive(Clone, Default)]
pub struct Next {
    signal: Arc<Mutex<Option<Continuation>>>,
}

impl Next {
    pub fn new() -> Self {
        Self::default()
    }

    /// 继续执行下一个处理器
    pub fn proceed(self) {
        self.signal_with(Continuation::Proceed);
    }

    /// 以错误结束当前请求
    pub fn fail(self, error: impl Into<anyhow::Error>) {
        self.signal_with(Continuation::Fail(error.into()));
    }

    /// 取走处理器留下的信号
    pub fn take(&self) -> Option<Continuation> {
        self.signal.lock().take()
    }

    /// 是否已经收到信号
    pub fn is_signalled(&self) -> bool {
        self.signal.lock().is_some()
    }

    fn signal_with(&self, continuation: Continuation) {
        let mut slot = self.signal.lock();
        if slot.is_some() {
            tracing::warn!(?continuation, "Continuation already signalled, ignoring");
            return;
        }
        *slot = Some(continuation);
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("signalled", &self.is_signalled())
            .finish()
    }
}

/// 直接调用形态：`(instance, request, response, next)`
pub type DirectFn<G, Req, Res> =
    Arc<dyn Fn(Arc<G>, Req, Res, Next) -> BoxFuture<'static, ()> + Send + Sync>;

/// 延迟调用形态：`(instance, request) -> Future<Result<()>>`
pub type DeferredFn<G, Req> =
    Arc<dyn Fn(Arc<G>, Req) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// 处理器形态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerShape {
    Direct,
    Deferred,
}

impl fmt::Display for HandlerShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerShape::Direct => f.write_str("direct"),
            HandlerShape::Deferred => f.write_str("deferred"),
        }
    }
}

/// 路由组实例上的目标处理器
pub enum Handler<G, Req, Res> {
    /// 自己负责通过 `next` 通知完成或失败
    Direct(DirectFn<G, Req, Res>),
    /// 只接收请求，失败由返回的 Future 表达
    Deferred(DeferredFn<G, Req>),
}

impl<G, Req, Res> Handler<G, Req, Res>
where
    G: 'static,
    Req: 'static,
    Res: 'static,
{
    /// 创建直接调用形态的处理器
    pub fn direct<F, Fut>(f: F) -> Self
    where
        F: Fn(Arc<G>, Req, Res, Next) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Handler::Direct(Arc::new(
            move |instance: Arc<G>, req: Req, res: Res, next: Next| -> BoxFuture<'static, ()> {
                Box::pin(f(instance, req, res, next))
            },
        ))
    }

    /// 创建延迟调用形态的处理器
    pub fn deferred<F, Fut>(f: F) -> Self
    where
        F: Fn(Arc<G>, Req) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Handler::Deferred(Arc::new(
            move |instance: Arc<G>, req: Req| -> BoxFuture<'static, anyhow::Result<()>> {
                Box::pin(f(instance, req))
            },
        ))
    }
}

impl<G, Req, Res> Handler<G, Req, Res> {
    pub fn shape(&self) -> HandlerShape {
        match self {
            Handler::Direct(_) => HandlerShape::Direct,
            Handler::Deferred(_) => HandlerShape::Deferred,
        }
    }
}

impl<G, Req, Res> Clone for Handler<G, Req, Res> {
    fn clone(&self) -> Self {
        match self {
            Handler::Direct(f) => Handler::Direct(Arc::clone(f)),
            Handler::Deferred(f) => Handler::Deferred(Arc::clone(f)),
        }
    }
}

impl<G, Req, Res> fmt::Debug for Handler<G, Req, Res> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handler").field(&self.shape()).finish()
    }
}
