// trellis-core: 端点编译与中间件组合引擎
//
// 把路由组描述编译成路由器上的注册调用：
// - 路由组前缀 + 端点路径拼接
// - 路由组前置处理器 → 端点前置处理器 → 目标处理器
// - 可替换的实例提供策略（每次调用 / 共享）
// - 可替换的调用包装策略（直接 / 延迟）

pub mod chain;
pub mod compiler;
pub mod config;
pub mod constants;
pub mod error;
pub mod group;
pub mod handler;
pub mod logging;
pub mod method;
pub mod path;
pub mod registry;
pub mod route_table;
pub mod router;
pub mod scope;
pub mod settings;
pub mod wrapper;

// 重新导出常用类型
pub use chain::compose_chain;
pub use compiler::{CompileReport, CompiledRoute, EndpointCompiler, GroupDefinition};
pub use config::{run_function_before, Config};
pub use error::{CompileError, CompileResult, LoggingError, SettingsError};
pub use group::{Constructor, Endpoint, EndpointSource, RouteDescriptor, RouteGroup, Visitor};
pub use handler::{
    router_handler, Continuation, Handler, HandlerChain, HandlerShape, Next, RouterHandler,
};
pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use method::HttpMethod;
pub use path::compose_path;
pub use registry::{Strategies, StrategyRegistry};
pub use route_table::{DispatchOutcome, RouteKey, RouteTable};
pub use router::{register, registrar, Router};
pub use scope::{InstanceFactory, InstanceProvider};
pub use settings::Settings;
pub use wrapper::InvocationWrapper;

/// Prelude 模块，包含常用的 traits 和类型
pub mod prelude {
    pub use crate::compiler::{CompileReport, EndpointCompiler, GroupDefinition};
    pub use crate::config::Config;
    pub use crate::group::{Endpoint, EndpointSource, RouteGroup};
    pub use crate::handler::{router_handler, Handler, Next, RouterHandler};
    pub use crate::logging::LoggingConfig;
    pub use crate::method::HttpMethod;
    pub use crate::registry::StrategyRegistry;
    pub use crate::route_table::{DispatchOutcome, RouteTable};
    pub use crate::router::Router;
    pub use crate::scope::InstanceProvider;
    pub use crate::settings::Settings;
    pub use crate::wrapper::InvocationWrapper;
}
