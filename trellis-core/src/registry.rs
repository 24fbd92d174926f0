use parking_lot::RwLock;

use crate::scope::InstanceProvider;
use crate::wrapper::InvocationWrapper;

/// 一组生效的策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Strategies {
    pub instance_provider: InstanceProvider,
    pub invocation_wrapper: InvocationWrapper,
}

/// 策略注册表
///
/// 显式构造后通过 `Arc` 共享给一个或多个编译器。编译时读取一次快照，
/// 之后替换策略不会影响已经生成的注册。
#[derive(Debug, Default)]
pub struct StrategyRegistry {
    strategies: RwLock<Strategies>,
}

impl StrategyRegistry {
    /// 使用默认策略创建注册表
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strategies(strategies: Strategies) -> Self {
        Self {
            strategies: RwLock::new(strategies),
        }
    }

    /// 当前策略快照
    pub fn snapshot(&self) -> Strategies {
        *self.strategies.read()
    }

    pub fn instance_provider(&self) -> InstanceProvider {
        self.strategies.read().instance_provider
    }

    pub fn invocation_wrapper(&self) -> InvocationWrapper {
        self.strategies.read().invocation_wrapper
    }

    /// 替换实例提供策略，返回旧策略
    pub fn set_instance_provider(&self, provider: InstanceProvider) -> InstanceProvider {
        let mut strategies = self.strategies.write();
        let previous = std::mem::replace(&mut strategies.instance_provider, provider);
        tracing::debug!(from = %previous, to = %provider, "Instance provider replaced");
        previous
    }

    /// 替换调用包装策略，返回旧策略
    pub fn set_invocation_wrapper(&self, wrapper: InvocationWrapper) -> InvocationWrapper {
        let mut strategies = self.strategies.write();
        let previous = std::mem::replace(&mut strategies.invocation_wrapper, wrapper);
        tracing::debug!(from = %previous, to = %wrapper, "Invocation wrapper replaced");
        previous
    }
}
