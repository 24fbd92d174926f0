use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use trellis_core::{
    router_handler, CompileError, CompileResult, Config, DispatchOutcome, Endpoint,
    EndpointCompiler, Handler, HandlerChain, HandlerShape, HttpMethod, InstanceProvider,
    InvocationWrapper, Next, RouteGroup, RouteTable, Router, RouterHandler, Strategies,
    StrategyRegistry,
};

/// 响应对象：处理器把输出写进共享日志
type Reply = Arc<Mutex<Vec<String>>>;

fn compiler(strategies: Strategies) -> EndpointCompiler {
    EndpointCompiler::new(Arc::new(StrategyRegistry::with_strategies(strategies)))
}

/// 写入名字后继续的前置处理器
fn mark(name: &'static str) -> RouterHandler<String, Reply> {
    router_handler(move |_, res: Reply, next: Next| async move {
        res.lock().push(name.to_string());
        next.proceed();
    })
}

/// 写入固定内容后结束请求的目标处理器
fn respond<G: Send + Sync + 'static>(body: &'static str) -> Handler<G, String, Reply> {
    Handler::direct(move |_, _, res: Reply, _next: Next| async move {
        res.lock().push(body.to_string());
    })
}

fn replies(reply: &Reply) -> Vec<String> {
    reply.lock().clone()
}

#[derive(Default)]
struct Pages;

#[tokio::test]
async fn test_get_route_with_empty_group_path() {
    let group = RouteGroup::<Pages, String, Reply>::with_default()
        .path("")
        .route(HttpMethod::Get, "/test", respond("true"));

    let mut table: RouteTable<String, Reply> = RouteTable::new();
    let report = EndpointCompiler::default()
        .compile_group(&mut table, &group)
        .unwrap();

    assert_eq!(report.len(), 1);
    assert_eq!(report.routes()[0].method, HttpMethod::Get);
    assert_eq!(report.routes()[0].path, "/test");
    assert_eq!(report.routes()[0].handlers, 1);
    assert!(table.contains(HttpMethod::Get, "/test"));
    assert_eq!(table.handlers(HttpMethod::Get, "/test").map(Vec::len), Some(1));

    let reply = Reply::default();
    let outcome = table
        .dispatch(HttpMethod::Get, "/test", String::new(), Arc::clone(&reply))
        .await
        .unwrap();

    assert_eq!(outcome, DispatchOutcome::Completed { at: 0 });
    assert_eq!(replies(&reply), vec!["true"]);
}

#[tokio::test]
async fn test_member_before_handlers_run_in_order() {
    let group = RouteGroup::<Pages, String, Reply>::with_default().endpoint(
        Endpoint::new(HttpMethod::Get, respond("original"))
            .path("/test")
            .before(mark("first"))
            .before(mark("second")),
    );

    let mut table: RouteTable<String, Reply> = RouteTable::new();
    EndpointCompiler::default()
        .compile_group(&mut table, &group)
        .unwrap();

    let reply = Reply::default();
    let outcome = table
        .dispatch(HttpMethod::Get, "/test", String::new(), Arc::clone(&reply))
        .await
        .unwrap();

    assert_eq!(outcome, DispatchOutcome::Completed { at: 2 });
    assert_eq!(replies(&reply), vec!["first", "second", "original"]);
}

#[tokio::test]
async fn test_group_before_handlers_precede_member_ones() {
    fn third(config: &mut Config<String, Reply>) {
        config.run_function_before(mark("third"));
    }

    let group = RouteGroup::<Pages, String, Reply>::with_default()
        .path("/pages")
        .before(mark("first"))
        .before(mark("second"))
        .endpoint(
            Endpoint::new(HttpMethod::Get, respond("original"))
                .path("/test")
                .decorate(third),
        );

    let mut table: RouteTable<String, Reply> = RouteTable::new();
    let report = EndpointCompiler::default()
        .compile_group(&mut table, &group)
        .unwrap();
    assert_eq!(report.routes()[0].path, "/pages/test");
    assert_eq!(report.routes()[0].handlers, 4);

    let reply = Reply::default();
    table
        .dispatch(HttpMethod::Get, "/pages/test", String::new(), Arc::clone(&reply))
        .await
        .unwrap();

    assert_eq!(replies(&reply), vec!["first", "second", "third", "original"]);
}

#[test]
fn test_empty_group_registers_nothing() {
    let group = RouteGroup::<Pages, String, Reply>::with_default()
        .path("/empty")
        .before(mark("unused"));

    let mut table: RouteTable<String, Reply> = RouteTable::new();
    let report = EndpointCompiler::default()
        .compile_group(&mut table, &group)
        .unwrap();

    assert!(report.is_empty());
    assert!(table.is_empty());
}

/// 记录每次注册调用的路由器
#[derive(Default)]
struct RecordingRouter {
    calls: Vec<(&'static str, String, usize)>,
}

impl RecordingRouter {
    fn record(&mut self, verb: &'static str, path: &str, handlers: HandlerChain<String, Reply>) {
        self.calls.push((verb, path.to_string(), handlers.len()));
    }
}

impl Router for RecordingRouter {
    type Request = String;
    type Response = Reply;

    fn get(&mut self, path: &str, handlers: HandlerChain<String, Reply>) -> CompileResult<()> {
        self.record("get", path, handlers);
        Ok(())
    }

    fn post(&mut self, path: &str, handlers: HandlerChain<String, Reply>) -> CompileResult<()> {
        self.record("post", path, handlers);
        Ok(())
    }

    fn put(&mut self, path: &str, handlers: HandlerChain<String, Reply>) -> CompileResult<()> {
        self.record("put", path, handlers);
        Ok(())
    }

    fn delete(&mut self, path: &str, handlers: HandlerChain<String, Reply>) -> CompileResult<()> {
        self.record("delete", path, handlers);
        Ok(())
    }

    fn patch(&mut self, path: &str, handlers: HandlerChain<String, Reply>) -> CompileResult<()> {
        self.record("patch", path, handlers);
        Ok(())
    }

    fn head(&mut self, path: &str, handlers: HandlerChain<String, Reply>) -> CompileResult<()> {
        self.record("head", path, handlers);
        Ok(())
    }

    fn options(&mut self, path: &str, handlers: HandlerChain<String, Reply>) -> CompileResult<()> {
        self.record("options", path, handlers);
        Ok(())
    }
}

#[test]
fn test_one_registration_per_descriptor() {
    let group = RouteGroup::<Pages, String, Reply>::with_default()
        .path("/api")
        .before(mark("auth"))
        .route(HttpMethod::Get, "/items", respond("list"))
        .endpoint(
            Endpoint::new(HttpMethod::Post, respond("create"))
                .path("/items")
                .before(mark("validate")),
        )
        .route(HttpMethod::Put, "/items/:id", respond("update"))
        .route(HttpMethod::Delete, "/items/:id", respond("delete"))
        .route(HttpMethod::Patch, "/items/:id", respond("patch"))
        .route(HttpMethod::Head, "/items", respond("head"))
        .route(HttpMethod::Options, "/items", respond("options"));

    let mut router = RecordingRouter::default();
    let report = EndpointCompiler::default()
        .compile_group(&mut router, &group)
        .unwrap();

    assert_eq!(
        router.calls,
        vec![
            ("get", "/api/items".to_string(), 2),
            ("post", "/api/items".to_string(), 3),
            ("put", "/api/items/:id".to_string(), 2),
            ("delete", "/api/items/:id".to_string(), 2),
            ("patch", "/api/items/:id".to_string(), 2),
            ("head", "/api/items".to_string(), 2),
            ("options", "/api/items".to_string(), 2),
        ]
    );
    assert_eq!(report.len(), router.calls.len());
}

/// 记录被调用次数的路由组实例
#[derive(Default)]
struct Counter {
    hits: AtomicUsize,
}

fn counting() -> Handler<Counter, String, Reply> {
    Handler::direct(|counter: Arc<Counter>, _, res: Reply, _next: Next| async move {
        let hits = counter.hits.fetch_add(1, Ordering::SeqCst) + 1;
        res.lock().push(hits.to_string());
    })
}

fn counter_group(built: &Arc<AtomicUsize>) -> RouteGroup<Counter, String, Reply> {
    let built = Arc::clone(built);
    RouteGroup::new(move || {
        built.fetch_add(1, Ordering::SeqCst);
        Counter::default()
    })
    .route(HttpMethod::Get, "/a", counting())
    .route(HttpMethod::Get, "/b", counting())
}

#[tokio::test]
async fn test_shared_instance_is_visible_across_chains() {
    let built = Arc::new(AtomicUsize::new(0));
    let group = counter_group(&built);

    let mut table: RouteTable<String, Reply> = RouteTable::new();
    compiler(Strategies {
        instance_provider: InstanceProvider::Shared,
        invocation_wrapper: InvocationWrapper::Direct,
    })
    .compile_group(&mut table, &group)
    .unwrap();
    assert_eq!(built.load(Ordering::SeqCst), 1);

    let reply = Reply::default();
    for path in ["/a", "/b"] {
        table
            .dispatch(HttpMethod::Get, path, String::new(), Arc::clone(&reply))
            .await
            .unwrap();
    }

    assert_eq!(replies(&reply), vec!["1", "2"]);
    assert_eq!(built.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_per_invocation_instances_are_distinct() {
    let built = Arc::new(AtomicUsize::new(0));
    let group = counter_group(&built);

    let mut table: RouteTable<String, Reply> = RouteTable::new();
    compiler(Strategies::default())
        .compile_group(&mut table, &group)
        .unwrap();
    assert_eq!(built.load(Ordering::SeqCst), 0);

    let reply = Reply::default();
    for _ in 0..2 {
        table
            .dispatch(HttpMethod::Get, "/a", String::new(), Arc::clone(&reply))
            .await
            .unwrap();
    }

    assert_eq!(replies(&reply), vec!["1", "1"]);
    assert_eq!(built.load(Ordering::SeqCst), 2);
}

/// 只支持 GET 的路由器
#[derive(Default)]
struct ReadOnlyRouter {
    paths: Vec<String>,
}

impl Router for ReadOnlyRouter {
    type Request = String;
    type Response = Reply;

    fn get(&mut self, path: &str, _handlers: HandlerChain<String, Reply>) -> CompileResult<()> {
        self.paths.push(path.to_string());
        Ok(())
    }
}

#[test]
fn test_unsupported_method_aborts_compilation() {
    let group = RouteGroup::<Pages, String, Reply>::with_default()
        .route(HttpMethod::Get, "/a", respond("a"))
        .route(HttpMethod::Post, "/b", respond("b"))
        .route(HttpMethod::Get, "/c", respond("c"));

    let mut router = ReadOnlyRouter::default();
    let err = EndpointCompiler::default()
        .compile_group(&mut router, &group)
        .unwrap_err();

    assert!(matches!(
        &err,
        CompileError::UnsupportedMethod { method: HttpMethod::Post, path } if path == "/b"
    ));
    assert_eq!(err.method(), Some(HttpMethod::Post));
    assert_eq!(err.path(), Some("/b"));
    assert_eq!(router.paths, vec!["/a".to_string()]);
}

/// 拒绝重复路径的路由器
#[derive(Default)]
struct StrictRouter {
    paths: Vec<String>,
}

impl Router for StrictRouter {
    type Request = String;
    type Response = Reply;

    fn get(&mut self, path: &str, _handlers: HandlerChain<String, Reply>) -> CompileResult<()> {
        if self.paths.iter().any(|p| p == path) {
            return Err(CompileError::Registration {
                method: HttpMethod::Get,
                path: path.to_string(),
                source: anyhow::anyhow!("route already registered"),
            });
        }
        self.paths.push(path.to_string());
        Ok(())
    }
}

#[test]
fn test_router_rejection_stops_compilation() {
    let group = RouteGroup::<Pages, String, Reply>::with_default()
        .route(HttpMethod::Get, "/a", respond("a"))
        .route(HttpMethod::Get, "/a", respond("again"))
        .route(HttpMethod::Get, "/b", respond("b"));

    let mut router = StrictRouter::default();
    let err = EndpointCompiler::default()
        .compile_group(&mut router, &group)
        .unwrap_err();

    assert!(matches!(err, CompileError::Registration { .. }));
    assert_eq!(err.method(), Some(HttpMethod::Get));
    assert_eq!(err.path(), Some("/a"));
    let source = std::error::Error::source(&err).map(ToString::to_string);
    assert_eq!(source.as_deref(), Some("route already registered"));
    assert_eq!(router.paths, vec!["/a".to_string()]);
}

#[test]
fn test_handler_shape_must_match_wrapper() {
    let group = RouteGroup::<Pages, String, Reply>::with_default().route(
        HttpMethod::Post,
        "/submit",
        Handler::deferred(|_, _| async { Ok(()) }),
    );

    let mut table: RouteTable<String, Reply> = RouteTable::new();
    let err = EndpointCompiler::default()
        .compile_group(&mut table, &group)
        .unwrap_err();

    match err {
        CompileError::HandlerShapeMismatch {
            method,
            path,
            wrapper,
            handler,
        } => {
            assert_eq!(method, HttpMethod::Post);
            assert_eq!(path, "/submit");
            assert_eq!(wrapper, InvocationWrapper::Direct);
            assert_eq!(handler, HandlerShape::Deferred);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(table.is_empty());
}

#[derive(Default)]
struct Accounts;

impl Accounts {
    async fn create(&self, name: String) -> anyhow::Result<()> {
        anyhow::ensure!(!name.is_empty(), "account name is required");
        Ok(())
    }
}

#[tokio::test]
async fn test_deferred_failure_reaches_router() {
    let group = RouteGroup::<Accounts, String, Reply>::with_default()
        .path("/accounts")
        .before(mark("auth"))
        .route(
            HttpMethod::Post,
            "",
            Handler::deferred(|accounts: Arc<Accounts>, req: String| async move {
                accounts.create(req).await
            }),
        );

    let mut table: RouteTable<String, Reply> = RouteTable::new();
    compiler(Strategies {
        instance_provider: InstanceProvider::PerInvocation,
        invocation_wrapper: InvocationWrapper::Deferred,
    })
    .compile_group(&mut table, &group)
    .unwrap();

    let reply = Reply::default();
    let err = table
        .dispatch(HttpMethod::Post, "/accounts", String::new(), Arc::clone(&reply))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "account name is required");
    assert_eq!(replies(&reply), vec!["auth"]);

    let outcome = table
        .dispatch(HttpMethod::Post, "/accounts", "ada".to_string(), Reply::default())
        .await
        .unwrap();
    assert_eq!(outcome, DispatchOutcome::Completed { at: 1 });
}

#[tokio::test]
async fn test_strategy_swap_is_not_retroactive() {
    let registry = Arc::new(StrategyRegistry::new());
    let compiler = EndpointCompiler::new(Arc::clone(&registry));

    let pages = RouteGroup::<Pages, String, Reply>::with_default()
        .route(HttpMethod::Get, "/direct", respond("direct"));
    let mut table: RouteTable<String, Reply> = RouteTable::new();
    compiler.compile_group(&mut table, &pages).unwrap();

    registry.set_invocation_wrapper(InvocationWrapper::Deferred);
    assert_eq!(compiler.registry().invocation_wrapper(), InvocationWrapper::Deferred);

    let reply = Reply::default();
    table
        .dispatch(HttpMethod::Get, "/direct", String::new(), Arc::clone(&reply))
        .await
        .unwrap();
    assert_eq!(replies(&reply), vec!["direct"]);

    // 新的编译使用替换后的策略
    let direct_again = compiler.compile_group(&mut table, &pages);
    assert!(matches!(
        direct_again,
        Err(CompileError::HandlerShapeMismatch { .. })
    ));
}

#[tokio::test]
async fn test_groups_of_different_types_compile_together() {
    let pages = RouteGroup::<Pages, String, Reply>::with_default()
        .named("pages")
        .route(HttpMethod::Get, "/", respond("home"));
    let counters = counter_group(&Arc::new(AtomicUsize::new(0))).named("counters");

    let mut table: RouteTable<String, Reply> = RouteTable::new();
    let report = EndpointCompiler::default()
        .compile(&mut table, &[&pages, &counters])
        .unwrap();

    let routes: Vec<(&str, &str)> = report
        .routes()
        .iter()
        .map(|route| (route.group.as_str(), route.path.as_str()))
        .collect();
    assert_eq!(
        routes,
        vec![("pages", "/"), ("counters", "/a"), ("counters", "/b")]
    );

    let keys: Vec<String> = table.keys().map(ToString::to_string).collect();
    assert_eq!(keys, vec!["GET:/", "GET:/a", "GET:/b"]);
}
