use std::fmt;

use crate::handler::RouterHandler;

/// 前置处理器配置
///
/// 路由组和端点各持有一份。只能追加，不能删除或重排。
pub struct Config<Req, Res> {
    run_before: Vec<RouterHandler<Req, Res>>,
}

impl<Req, Res> Config<Req, Res> {
    pub fn new() -> Self {
        Self {
            run_before: Vec::new(),
        }
    }

    /// 追加一个前置处理器
    pub fn run_function_before(&mut self, handler: RouterHandler<Req, Res>) -> &mut Self {
        self.run_before.push(handler);
        self
    }

    /// 按声明顺序排列的前置处理器
    pub fn run_before(&self) -> &[RouterHandler<Req, Res>] {
        &self.run_before
    }

    pub fn len(&self) -> usize {
        self.run_before.len()
    }

    pub fn is_empty(&self) -> bool {
        self.run_before.is_empty()
    }
}

/// 向配置追加前置处理器，配置不存在时先创建
pub fn run_function_before<Req, Res>(
    config: &mut Option<Config<Req, Res>>,
    handler: RouterHandler<Req, Res>,
) {
    config
        .get_or_insert_with(Config::new)
        .run_function_before(handler);
}

impl<Req, Res> Default for Config<Req, Res> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Req, Res> Clone for Config<Req, Res> {
    fn clone(&self) -> Self {
        Self {
            run_before: self.run_before.clone(),
        }
    }
}

impl<Req, Res> fmt::Debug for Config<Req, Res> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("run_before", &self.run_before.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{router_handler, Next};

    fn noop() -> RouterHandler<(), ()> {
        router_handler(|_, _, next: Next| async move { next.proceed() })
    }

    #[test]
    fn test_run_function_before_creates_config() {
        let mut config: Option<Config<(), ()>> = None;
        run_function_before(&mut config, noop());
        run_function_before(&mut config, noop());

        assert_eq!(config.map(|c| c.len()), Some(2));
    }

    #[test]
    fn test_run_function_before_appends_in_order() {
        let first = noop();
        let second = noop();

        let mut config = Config::new();
        config
            .run_function_before(first.clone())
            .run_function_before(second.clone());

        assert!(std::sync::Arc::ptr_eq(&config.run_before()[0], &first));
        assert!(std::sync::Arc::ptr_eq(&config.run_before()[1], &second));
    }
}
