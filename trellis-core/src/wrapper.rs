//! 调用包装策略
//!
//! 把路由组实例上的目标处理器适配为路由器原生的 `(request, response, next)` 签名。

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::Deserialize;

use crate::error::SettingsError;
use crate::handler::{Handler, Next, RouterHandler};
use crate::scope::InstanceFactory;

/// 调用包装策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InvocationWrapper {
    /// 原样转发 `(request, response, next)`，完成和错误都由处理器自己通过 `next` 通知
    #[default]
    Direct,

    /// 只传入 `request`，等待返回的 Future；失败时转交给 `next`，成功时不做任何事
    Deferred,
}

impl InvocationWrapper {
    /// 包装目标处理器
    ///
    /// 处理器形态与策略不匹配时返回 `None`
    pub fn wrap<G, Req, Res>(
        &self,
        handler: &Handler<G, Req, Res>,
        factory: InstanceFactory<G>,
    ) -> Option<RouterHandler<Req, Res>>
    where
        G: Send + Sync + 'static,
        Req: Send + 'static,
        Res: Send + 'static,
    {
        match (self, handler) {
            (InvocationWrapper::Direct, Handler::Direct(target)) => {
                let target = Arc::clone(target);
                let wrapped: RouterHandler<Req, Res> =
                    Arc::new(move |req: Req, res: Res, next: Next| -> BoxFuture<'static, ()> {
                        target(factory(), req, res, next)
                    });
                Some(wrapped)
            }
            (InvocationWrapper::Deferred, Handler::Deferred(target)) => {
                let target = Arc::clone(target);
                let wrapped: RouterHandler<Req, Res> =
                    Arc::new(move |req: Req, _res: Res, next: Next| -> BoxFuture<'static, ()> {
                        let pending = target(factory(), req);
                        Box::pin(async move {
                            if let Err(error) = pending.await {
                                tracing::debug!(error = %error, "Deferred handler failed, forwarding to continuation");
                                next.fail(error);
                            }
                        })
                    });
                Some(wrapped)
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InvocationWrapper::Direct => "direct",
            InvocationWrapper::Deferred => "deferred",
        }
    }
}

impl fmt::Display for InvocationWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvocationWrapper {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "direct" | "callback" => Ok(InvocationWrapper::Direct),
            "deferred" | "promise" => Ok(InvocationWrapper::Deferred),
            _ => Err(SettingsError::InvalidValue {
                key: crate::constants::INVOCATION_WRAPPER.to_string(),
                value: s.to_string(),
            }),
        }
    }
}
