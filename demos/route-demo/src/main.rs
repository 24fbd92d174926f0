use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use trellis_core::prelude::*;
use trellis_core::{DispatchOutcome, Strategies};
use trellis_macros::endpoints;

// ==================== 请求与响应 ====================

#[derive(Debug, Clone, Default)]
struct Request {
    user: Option<String>,
    body: String,
}

impl Request {
    fn signed(user: &str, body: &str) -> Self {
        Self {
            user: Some(user.to_string()),
            body: body.to_string(),
        }
    }

    fn anonymous(body: &str) -> Self {
        Self {
            user: None,
            body: body.to_string(),
        }
    }
}

/// 处理器写入的响应行
type Response = Arc<Mutex<Vec<String>>>;

// ==================== 前置处理器 ====================

fn authenticate(config: &mut Config<Request, Response>) {
    config.run_function_before(router_handler(
        |req: Request, res: Response, next: Next| async move {
            match req.user {
                Some(user) => {
                    res.lock().push(format!("authenticated as {user}"));
                    next.proceed();
                }
                None => next.fail(anyhow::anyhow!("missing credentials")),
            }
        },
    ));
}

fn trace_request(config: &mut Config<Request, Response>) {
    config.run_function_before(router_handler(
        |req: Request, _res: Response, next: Next| async move {
            tracing::info!(body = %req.body, "Request received");
            next.proceed();
        },
    ));
}

// ==================== 路由组 ====================

/// 问候服务，共享实例时计数在请求之间累加
#[derive(Default)]
struct Greetings {
    served: AtomicUsize,
}

#[endpoints(request = Request, response = Response, path = "/greetings", before = [authenticate])]
impl Greetings {
    #[get("/hello", before = [trace_request])]
    async fn hello(&self, req: Request, res: Response, _next: Next) {
        let served = self.served.fetch_add(1, Ordering::SeqCst) + 1;
        let user = req.user.unwrap_or_default();
        res.lock().push(format!("hello {user} (#{served})"));
    }

    #[post]
    async fn create(&self, req: Request, res: Response, next: Next) {
        if req.body.is_empty() {
            next.fail(anyhow::anyhow!("greeting body is empty"));
            return;
        }
        res.lock().push(format!("saved greeting '{}'", req.body));
    }
}

/// 任务服务，使用延迟调用形态
#[derive(Default)]
struct Jobs;

#[endpoints(request = Request, response = Response, path = "/jobs")]
impl Jobs {
    #[post("/run", before = [trace_request])]
    async fn run(&self, req: Request) -> anyhow::Result<()> {
        anyhow::ensure!(req.body != "crash", "job '{}' failed", req.body);
        tracing::info!(job = %req.body, "Job finished");
        Ok(())
    }
}

/// 用构建器声明的健康检查
fn health_group() -> RouteGroup<(), Request, Response> {
    RouteGroup::new(|| ())
        .named("health")
        .route(
            HttpMethod::Get,
            "/health",
            Handler::direct(|_, _, res: Response, _next: Next| async move {
                res.lock().push("ok".to_string());
            }),
        )
}

// ==================== 启动 ====================

/// 随 demo 一起提供的配置文件
const DEFAULT_CONFIG: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/trellis.toml");

fn load_settings() -> anyhow::Result<Settings> {
    let settings = match std::env::args().nth(1) {
        Some(path) => Settings::from_file(path)?,
        None if Path::new(DEFAULT_CONFIG).exists() => Settings::from_file(DEFAULT_CONFIG)?,
        None => Settings::default(),
    };
    Ok(settings.with_env_overrides()?)
}

async fn call(table: &RouteTable<Request, Response>, method: HttpMethod, path: &str, req: Request) {
    let res = Response::default();
    let verb = method.as_str();
    match table.dispatch(method, path, req, Arc::clone(&res)).await {
        Ok(DispatchOutcome::NotFound) => println!("  {verb:<7} {path:<18} -> 404"),
        Ok(outcome) => println!("  {verb:<7} {path:<18} -> {:?} {:?}", outcome, res.lock()),
        Err(error) => println!("  {verb:<7} {path:<18} -> error: {error}"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = load_settings()?;
    settings.logging().clone().init()?;

    println!("🌿 Trellis - Route Compilation Demo");
    println!("===================================\n");

    // 直接调用形态的路由组使用配置中的策略
    let registry = Arc::new(settings.build_registry());
    let compiler = EndpointCompiler::new(Arc::clone(&registry));

    // 延迟调用形态的路由组使用独立的注册表
    let deferred = EndpointCompiler::new(Arc::new(StrategyRegistry::with_strategies(Strategies {
        invocation_wrapper: InvocationWrapper::Deferred,
        ..settings.strategies()
    })));

    let greetings = Greetings::route_group();
    let jobs = Jobs::route_group();
    let health = health_group();

    let mut table: RouteTable<Request, Response> = RouteTable::new();
    let report = compiler.compile(&mut table, &[&greetings, &health])?;
    let jobs_report = deferred.compile_group(&mut table, &jobs)?;

    println!(
        "📋 已注册的路由（instance-provider = {}）：\n",
        registry.instance_provider()
    );
    for route in report.routes().iter().chain(jobs_report.routes()) {
        println!(
            "  {:<7} {:<18} {} handlers  [{}]",
            route.method.as_str(), route.path, route.handlers, route.group
        );
    }

    println!("\n🚀 分发示例请求：\n");
    call(&table, HttpMethod::Get, "/greetings/hello", Request::signed("ada", "")).await;
    call(&table, HttpMethod::Get, "/greetings/hello", Request::signed("alan", "")).await;
    call(&table, HttpMethod::Get, "/greetings/hello", Request::anonymous("")).await;
    call(&table, HttpMethod::Post, "/greetings", Request::signed("ada", "good morning")).await;
    call(&table, HttpMethod::Post, "/greetings", Request::signed("ada", "")).await;
    call(&table, HttpMethod::Post, "/jobs/run", Request::anonymous("reindex")).await;
    call(&table, HttpMethod::Post, "/jobs/run", Request::anonymous("crash")).await;
    call(&table, HttpMethod::Get, "/health", Request::default()).await;
    call(&table, HttpMethod::Delete, "/health", Request::default()).await;

    Ok(())
}
