//! 处理器链组合
//!
//! 顺序固定为：路由组前置处理器 → 端点前置处理器 → 目标处理器。
//! 路由组级别的横切逻辑（例如整组鉴权）必须先于端点级别的逻辑执行。

use crate::config::Config;
use crate::handler::{HandlerChain, RouterHandler};

/// 组合处理器链
pub fn compose_chain<Req, Res>(
    group_config: Option<&Config<Req, Res>>,
    member_config: Option<&Config<Req, Res>>,
    target: RouterHandler<Req, Res>,
) -> HandlerChain<Req, Res> {
    let before = group_config.map_or(0, Config::len) + member_config.map_or(0, Config::len);
    let mut chain = Vec::with_capacity(before + 1);

    for config in [group_config, member_config].into_iter().flatten() {
        chain.extend(config.run_before().iter().cloned());
    }
    chain.push(target);

    chain
}
