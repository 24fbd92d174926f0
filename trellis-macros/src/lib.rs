//! Trellis Macros
//!
//! 声明式的端点元数据，展开为 `trellis_core::RouteGroup` 构建器调用

mod endpoints;

use proc_macro::TokenStream;

/// 把 impl 块声明为路由组
///
/// 方法上的 `#[get]`、`#[post]`、`#[put]`、`#[delete]`、`#[patch]`、`#[head]`、
/// `#[options]` 标记端点。参数为 `(request, response, next)` 的方法是直接调用形态，
/// 参数为 `(request)` 的方法是延迟调用形态。
///
/// `before` 列出装饰函数 `fn(&mut Config<Req, Res>)`，在其中调用
/// `run_function_before` 追加前置处理器。
///
/// # 示例
///
/// ```ignore
/// #[derive(Default)]
/// struct UserRoutes;
///
/// #[endpoints(request = Request, response = Reply, path = "/users", before = [authenticate])]
/// impl UserRoutes {
///     #[get("/:id", before = [audit])]
///     async fn show(&self, req: Request, res: Reply, next: Next) {
///         // ...
///     }
///
///     #[post]
///     async fn create(&self, req: Request) -> anyhow::Result<()> {
///         // ...
///     }
/// }
///
/// let group = UserRoutes::route_group();
/// ```
#[proc_macro_attribute]
pub fn endpoints(attr: TokenStream, item: TokenStream) -> TokenStream {
    endpoints::endpoints_impl(attr, item)
}
