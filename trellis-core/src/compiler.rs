//! 端点编译器
//!
//! 对每个路由组的每个端点：拼接路径，用当前策略包装目标处理器，
//! 组合前置处理器链，然后按 HTTP 方法调用路由器的注册函数。
//! 编译只追加注册，没有撤销或重新编译的机制。

use std::sync::Arc;

use crate::chain::compose_chain;
use crate::error::{CompileError, CompileResult};
use crate::group::EndpointSource;
use crate::method::HttpMethod;
use crate::path::compose_path;
use crate::registry::{Strategies, StrategyRegistry};
use crate::router::{register, Router};

/// 已发出的一条注册
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledRoute {
    pub group: String,
    pub method: HttpMethod,
    pub path: String,
    /// 处理器链长度（前置处理器 + 目标处理器）
    pub handlers: usize,
}

/// 一次编译的结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileReport {
    routes: Vec<CompiledRoute>,
}

impl CompileReport {
    /// 按注册顺序排列的路由
    pub fn routes(&self) -> &[CompiledRoute] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    fn push(&mut self, route: CompiledRoute) {
        self.routes.push(route);
    }
}

/// 可以被编译的路由组
///
/// 所有 [`EndpointSource`] 自动实现此 trait，用于把不同实例类型的路由组放进同一次编译
pub trait GroupDefinition<Req, Res>
where
    Req: Send + 'static,
    Res: Send + 'static,
{
    fn group_name(&self) -> &str;

    fn compile_into(
        &self,
        strategies: &Strategies,
        router: &mut dyn Router<Request = Req, Response = Res>,
        report: &mut CompileReport,
    ) -> CompileResult<()>;
}

impl<Req, Res, S> GroupDefinition<Req, Res> for S
where
    S: EndpointSource<Req, Res>,
    Req: Send + 'static,
    Res: Send + 'static,
{
    fn group_name(&self) -> &str {
        self.name()
    }

    fn compile_into(
        &self,
        strategies: &Strategies,
        router: &mut dyn Router<Request = Req, Response = Res>,
        report: &mut CompileReport,
    ) -> CompileResult<()> {
        compile_source(self, strategies, router, report)
    }
}

fn compile_source<Req, Res, S>(
    source: &S,
    strategies: &Strategies,
    router: &mut dyn Router<Request = Req, Response = Res>,
    report: &mut CompileReport,
) -> CompileResult<()>
where
    S: EndpointSource<Req, Res> + ?Sized,
    Req: Send + 'static,
    Res: Send + 'static,
{
    let group = source.name().to_string();
    let wrapper = strategies.invocation_wrapper;
    let factory = strategies.instance_provider.provide::<Req, Res, S>(source);

    tracing::debug!(
        group = %group,
        instance_provider = %strategies.instance_provider,
        invocation_wrapper = %wrapper,
        "Compiling route group"
    );

    source.process_endpoints(&mut |descriptor| {
        let method = descriptor.http_method;
        let path = compose_path(descriptor.group_path, descriptor.member_path);

        let target = wrapper
            .wrap(descriptor.member_handler, Arc::clone(&factory))
            .ok_or_else(|| CompileError::HandlerShapeMismatch {
                method,
                path: path.clone(),
                wrapper,
                handler: descriptor.member_handler.shape(),
            })?;

        let chain = compose_chain(descriptor.group_config, descriptor.member_config, target);
        let handlers = chain.len();

        register(&mut *router, method, &path, chain)?;
        tracing::debug!(
            group = %group,
            registrar = method.registrar_name(),
            path = %path,
            handlers,
            "Route compiled"
        );

        report.push(CompiledRoute {
            group: group.clone(),
            method,
            path,
            handlers,
        });
        Ok(())
    })
}

/// 端点编译器
///
/// 持有共享的策略注册表，每次编译开始时读取一次策略快照
#[derive(Debug, Clone, Default)]
pub struct EndpointCompiler {
    registry: Arc<StrategyRegistry>,
}

impl EndpointCompiler {
    pub fn new(registry: Arc<StrategyRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<StrategyRegistry> {
        &self.registry
    }

    /// 按给定顺序编译多个路由组
    ///
    /// 遇到第一个错误立即停止，已经发出的注册保留在路由器中
    pub fn compile<R>(
        &self,
        router: &mut R,
        groups: &[&dyn GroupDefinition<R::Request, R::Response>],
    ) -> CompileResult<CompileReport>
    where
        R: Router,
    {
        let strategies = self.registry.snapshot();
        let mut report = CompileReport::default();

        for group in groups {
            if let Err(error) = group.compile_into(&strategies, &mut *router, &mut report) {
                tracing::error!(
                    group = group.group_name(),
                    error = %error,
                    "Route compilation failed"
                );
                return Err(error);
            }
        }

        tracing::info!(
            groups = groups.len(),
            routes = report.len(),
            "Route compilation completed"
        );
        Ok(report)
    }

    /// 编译单个路由组
    pub fn compile_group<R, S>(&self, router: &mut R, group: &S) -> CompileResult<CompileReport>
    where
        R: Router,
        S: EndpointSource<R::Request, R::Response>,
    {
        self.compile(router, &[group])
    }
}
