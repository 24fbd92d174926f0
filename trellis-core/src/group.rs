//! 路由组定义
//!
//! [`EndpointSource`] 是编译器消费元数据的唯一入口：对每个声明的端点调用一次访问者，
//! 传入一个 [`RouteDescriptor`]。[`RouteGroup`] 是它的构建器实现，
//! `#[endpoints]` 宏生成的代码也落在这里。

use std::fmt;
use std::sync::Arc;

use crate::config::{run_function_before, Config};
use crate::error::CompileResult;
use crate::handler::{Handler, RouterHandler};
use crate::method::HttpMethod;

/// 路由组实例的构造函数
pub type Constructor<G> = Arc<dyn Fn() -> G + Send + Sync>;

/// 单个端点的描述
///
/// 由元数据提供方产生，只在访问者调用期间借给编译器
pub struct RouteDescriptor<'a, G, Req, Res> {
    pub http_method: HttpMethod,
    pub member_handler: &'a Handler<G, Req, Res>,
    pub member_path: Option<&'a str>,
    pub member_config: Option<&'a Config<Req, Res>>,
    pub group_path: Option<&'a str>,
    pub group_config: Option<&'a Config<Req, Res>>,
}

impl<G, Req, Res> fmt::Debug for RouteDescriptor<'_, G, Req, Res> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteDescriptor")
            .field("http_method", &self.http_method)
            .field("member_handler", self.member_handler)
            .field("member_path", &self.member_path)
            .field("member_config", &self.member_config)
            .field("group_path", &self.group_path)
            .field("group_config", &self.group_config)
            .finish()
    }
}

/// 端点访问者
pub type Visitor<'v, G, Req, Res> =
    dyn FnMut(RouteDescriptor<'_, G, Req, Res>) -> CompileResult<()> + 'v;

/// 元数据提供方
pub trait EndpointSource<Req, Res> {
    /// 拥有目标处理器的实例类型
    type Instance: Send + Sync + 'static;

    /// 路由组名称，用于日志和编译报告
    fn name(&self) -> &str;

    /// 实例构造函数，由实例提供策略使用
    fn constructor(&self) -> Constructor<Self::Instance>;

    /// 按声明顺序为每个端点调用一次 `visit`
    ///
    /// 访问者返回错误时立即停止并返回该错误
    fn process_endpoints(
        &self,
        visit: &mut Visitor<'_, Self::Instance, Req, Res>,
    ) -> CompileResult<()>;
}

/// 路由组中的一个端点
pub struct Endpoint<G, Req, Res> {
    method: HttpMethod,
    path: Option<String>,
    config: Option<Config<Req, Res>>,
    handler: Handler<G, Req, Res>,
}

impl<G, Req, Res> Endpoint<G, Req, Res> {
    pub fn new(method: HttpMethod, handler: Handler<G, Req, Res>) -> Self {
        Self {
            method,
            path: None,
            config: None,
            handler,
        }
    }

    /// 设置端点路径
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// 追加端点级别的前置处理器
    pub fn before(mut self, handler: RouterHandler<Req, Res>) -> Self {
        run_function_before(&mut self.config, handler);
        self
    }

    /// 用装饰函数修改端点配置，例如 `fn auth(config: &mut Config<..>)`
    pub fn decorate<F>(mut self, decorator: F) -> Self
    where
        F: FnOnce(&mut Config<Req, Res>),
    {
        decorator(self.config.get_or_insert_with(Config::new));
        self
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    fn descriptor<'a>(
        &'a self,
        group: &'a RouteGroup<G, Req, Res>,
    ) -> RouteDescriptor<'a, G, Req, Res> {
        RouteDescriptor {
            http_method: self.method,
            member_handler: &self.handler,
            member_path: self.path.as_deref(),
            member_config: self.config.as_ref(),
            group_path: group.path.as_deref(),
            group_config: group.config.as_ref(),
        }
    }
}

/// 路由组构建器
///
/// ```ignore
/// let group = RouteGroup::<UserRoutes, Request, Response>::with_default()
///     .path("/users")
///     .before(authenticate)
///     .route(HttpMethod::Get, "/:id", Handler::direct(|routes, req, res, next| async move {
///         routes.show(req, res, next).await
///     }));
/// ```
pub struct RouteGroup<G, Req, Res> {
    name: String,
    path: Option<String>,
    config: Option<Config<Req, Res>>,
    constructor: Constructor<G>,
    endpoints: Vec<Endpoint<G, Req, Res>>,
}

impl<G, Req, Res> RouteGroup<G, Req, Res>
where
    G: Send + Sync + 'static,
{
    /// 用指定的构造函数创建路由组
    pub fn new<F>(constructor: F) -> Self
    where
        F: Fn() -> G + Send + Sync + 'static,
    {
        Self {
            name: std::any::type_name::<G>().to_string(),
            path: None,
            config: None,
            constructor: Arc::new(constructor),
            endpoints: Vec::new(),
        }
    }

    /// 使用 `Default` 构造实例
    pub fn with_default() -> Self
    where
        G: Default,
    {
        Self::new(G::default)
    }

    /// 覆盖路由组名称
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// 设置路由组路径前缀
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// 追加路由组级别的前置处理器
    pub fn before(mut self, handler: RouterHandler<Req, Res>) -> Self {
        run_function_before(&mut self.config, handler);
        self
    }

    /// 用装饰函数修改路由组配置
    pub fn decorate<F>(mut self, decorator: F) -> Self
    where
        F: FnOnce(&mut Config<Req, Res>),
    {
        decorator(self.config.get_or_insert_with(Config::new));
        self
    }

    /// 添加端点
    pub fn endpoint(mut self, endpoint: Endpoint<G, Req, Res>) -> Self {
        self.endpoints.push(endpoint);
        self
    }

    /// 添加不带前置处理器的端点
    pub fn route(
        self,
        method: HttpMethod,
        path: impl Into<String>,
        handler: Handler<G, Req, Res>,
    ) -> Self {
        self.endpoint(Endpoint::new(method, handler).path(path))
    }

    pub fn endpoints(&self) -> &[Endpoint<G, Req, Res>] {
        &self.endpoints
    }
}

impl<G, Req, Res> EndpointSource<Req, Res> for RouteGroup<G, Req, Res>
where
    G: Send + Sync + 'static,
{
    type Instance = G;

    fn name(&self) -> &str {
        &self.name
    }

    fn constructor(&self) -> Constructor<G> {
        Arc::clone(&self.constructor)
    }

    fn process_endpoints(&self, visit: &mut Visitor<'_, G, Req, Res>) -> CompileResult<()> {
        for endpoint in &self.endpoints {
            visit(endpoint.descriptor(self))?;
        }
        Ok(())
    }
}

impl<G, Req, Res> fmt::Debug for RouteGroup<G, Req, Res> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteGroup")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("config", &self.config)
            .field("endpoints", &self.endpoints.len())
            .finish()
    }
}
