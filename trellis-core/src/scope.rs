use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::SettingsError;
use crate::group::{Constructor, EndpointSource};

/// 实例工厂：每次调用返回用于执行目标处理器的实例
pub type InstanceFactory<G> = Arc<dyn Fn() -> Arc<G> + Send + Sync>;

/// 实例提供策略
///
/// 决定目标处理器所属实例的生命周期
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstanceProvider {
    /// 每次调用都构造新实例，请求之间不共享状态
    #[default]
    PerInvocation,

    /// 应用策略时构造唯一实例，同一路由组的所有端点共享
    Shared,
}

impl InstanceProvider {
    /// 为路由组生成实例工厂
    pub fn provide<Req, Res, S>(&self, group: &S) -> InstanceFactory<S::Instance>
    where
        S: EndpointSource<Req, Res> + ?Sized,
    {
        self.factory(group.constructor())
    }

    /// 由构造函数生成实例工厂
    ///
    /// `Shared` 在这里立即构造实例
    pub fn factory<G>(&self, constructor: Constructor<G>) -> InstanceFactory<G>
    where
        G: Send + Sync + 'static,
    {
        match self {
            InstanceProvider::PerInvocation => Arc::new(move || Arc::new(constructor())),
            InstanceProvider::Shared => {
                let instance = Arc::new(constructor());
                Arc::new(move || Arc::clone(&instance))
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceProvider::PerInvocation => "per-invocation",
            InstanceProvider::Shared => "shared",
        }
    }
}

impl fmt::Display for InstanceProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstanceProvider {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "per-invocation" | "per_invocation" | "prototype" => Ok(InstanceProvider::PerInvocation),
            "shared" | "singleton" => Ok(InstanceProvider::Shared),
            _ => Err(SettingsError::InvalidValue {
                key: crate::constants::INSTANCE_PROVIDER.to_string(),
                value: s.to_string(),
            }),
        }
    }
}
