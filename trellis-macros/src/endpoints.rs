//! `#[endpoints]` 宏实现

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::parse::ParseStream;
use syn::{
    parse_macro_input, Attribute, Expr, ExprArray, FnArg, Ident, ImplItem, ImplItemFn, ItemImpl,
    LitStr, Meta, Token, Type,
};

/// `#[endpoints(...)]` 参数
#[derive(Default)]
struct GroupArgs {
    request: Option<Type>,
    response: Option<Type>,
    path: Option<LitStr>,
    before: Vec<Expr>,
}

/// `#[get(...)]` 等路由标记的参数
#[derive(Default)]
struct RouteArgs {
    path: Option<LitStr>,
    before: Vec<Expr>,
}

/// 一个端点方法
struct RouteMethod {
    verb: Ident,
    method_name: Ident,
    is_async: bool,
    typed_args: usize,
    args: RouteArgs,
}

pub fn endpoints_impl(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut group_args = GroupArgs::default();
    let parser = syn::meta::parser(|meta| {
        if meta.path.is_ident("request") {
            group_args.request = Some(meta.value()?.parse()?);
        } else if meta.path.is_ident("response") {
            group_args.response = Some(meta.value()?.parse()?);
        } else if meta.path.is_ident("path") {
            group_args.path = Some(meta.value()?.parse()?);
        } else if meta.path.is_ident("before") {
            let list: ExprArray = meta.value()?.parse()?;
            group_args.before.extend(list.elems);
        } else {
            return Err(meta.error("expected `request`, `response`, `path` or `before`"));
        }
        Ok(())
    });
    parse_macro_input!(attr with parser);

    let input = parse_macro_input!(item as ItemImpl);
    TokenStream::from(render(group_args, input))
}

fn render(group_args: GroupArgs, mut input: ItemImpl) -> TokenStream2 {
    match expand(group_args, &mut input) {
        Ok(expanded) => expanded,
        Err(e) => {
            // 出错时 impl 块原样输出，路由标记必须全部移除
            strip_route_markers(&mut input);
            let error = e.to_compile_error();
            quote! {
                #input
                #error
            }
        }
    }
}

fn strip_route_markers(input: &mut ItemImpl) {
    for item in &mut input.items {
        if let ImplItem::Fn(method) = item {
            method.attrs.retain(|attr| route_verb(attr).is_none());
        }
    }
}

fn expand(group_args: GroupArgs, input: &mut ItemImpl) -> syn::Result<TokenStream2> {
    let (Some(request), Some(response)) = (&group_args.request, &group_args.response) else {
        return Err(syn::Error::new_spanned(
            &input.self_ty,
            "#[endpoints] requires `request = Type` and `response = Type`",
        ));
    };

    // 收集端点方法，同时移除路由标记
    let mut routes = Vec::new();
    for item in &mut input.items {
        if let ImplItem::Fn(method) = item {
            if let Some(route) = take_route(method)? {
                routes.push(route);
            }
        }
    }

    let group_path = group_args.path.iter().map(|path| quote! { .path(#path) });
    let group_before = group_args.before.iter().map(|decorator| quote! { .decorate(#decorator) });

    let endpoints = routes
        .iter()
        .map(|route| endpoint_tokens(route, request, response))
        .collect::<syn::Result<Vec<_>>>()?;

    let self_ty = &input.self_ty;
    let (impl_generics, _, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        #input

        impl #impl_generics #self_ty #where_clause {
            /// 由 `#[endpoints]` 生成的路由组定义
            pub fn route_group() -> ::trellis_core::RouteGroup<Self, #request, #response> {
                ::trellis_core::RouteGroup::<Self, #request, #response>::new(
                    <Self as ::core::default::Default>::default,
                )
                #(#group_path)*
                #(#group_before)*
                #(.endpoint(#endpoints))*
            }
        }
    })
}

fn endpoint_tokens(route: &RouteMethod, request: &Type, response: &Type) -> syn::Result<TokenStream2> {
    let method_name = &route.method_name;
    let variant = verb_variant(&route.verb);
    let await_call = route.is_async.then(|| quote! { .await });

    let handler = match route.typed_args {
        3 => quote! {
            ::trellis_core::Handler::<Self, #request, #response>::direct(
                |instance: ::std::sync::Arc<Self>, req, res, next| async move {
                    instance.#method_name(req, res, next) #await_call
                },
            )
        },
        1 => quote! {
            ::trellis_core::Handler::<Self, #request, #response>::deferred(
                |instance: ::std::sync::Arc<Self>, req| async move {
                    instance.#method_name(req) #await_call
                },
            )
        },
        _ => {
            return Err(syn::Error::new_spanned(
                method_name,
                "endpoint methods take `(&self, request, response, next)` or `(&self, request)`",
            ))
        }
    };

    let member_path = route.args.path.iter().map(|path| quote! { .path(#path) });
    let member_before = route.args.before.iter().map(|decorator| quote! { .decorate(#decorator) });

    Ok(quote! {
        ::trellis_core::Endpoint::new(::trellis_core::HttpMethod::#variant, #handler)
            #(#member_path)*
            #(#member_before)*
    })
}

/// 找到方法上的路由标记，解析后从方法上移除
fn take_route(method: &mut ImplItemFn) -> syn::Result<Option<RouteMethod>> {
    let Some(index) = method.attrs.iter().position(|attr| route_verb(attr).is_some()) else {
        return Ok(None);
    };

    let attr = method.attrs.remove(index);
    if let Some(extra) = method.attrs.iter().find(|attr| route_verb(attr).is_some()) {
        return Err(syn::Error::new_spanned(extra, "an endpoint method takes a single route attribute"));
    }

    if method.sig.receiver().is_none() {
        return Err(syn::Error::new_spanned(
            &method.sig.ident,
            "endpoint methods must take `&self`",
        ));
    }

    let verb = route_verb(&attr).cloned().ok_or_else(|| {
        syn::Error::new_spanned(&attr, "unknown route attribute")
    })?;
    let args = match &attr.meta {
        Meta::Path(_) => RouteArgs::default(),
        _ => attr.parse_args_with(parse_route_args)?,
    };

    let typed_args = method
        .sig
        .inputs
        .iter()
        .filter(|arg| matches!(arg, FnArg::Typed(_)))
        .count();

    Ok(Some(RouteMethod {
        verb,
        method_name: method.sig.ident.clone(),
        is_async: method.sig.asyncness.is_some(),
        typed_args,
        args,
    }))
}

/// 路由标记对应的 HTTP 方法标识符
fn route_verb(attr: &Attribute) -> Option<&Ident> {
    let ident = attr.path().get_ident()?;
    match ident.to_string().as_str() {
        "get" | "post" | "put" | "delete" | "patch" | "head" | "options" => Some(ident),
        _ => None,
    }
}

fn verb_variant(verb: &Ident) -> Ident {
    let name = match verb.to_string().as_str() {
        "get" => "Get",
        "post" => "Post",
        "put" => "Put",
        "delete" => "Delete",
        "patch" => "Patch",
        "head" => "Head",
        _ => "Options",
    };
    Ident::new(name, verb.span())
}

/// 解析 `("/path", before = [a, b])`，两部分都可省略
fn parse_route_args(input: ParseStream) -> syn::Result<RouteArgs> {
    let mut args = RouteArgs::default();

    if input.peek(LitStr) {
        args.path = Some(input.parse()?);
        if !input.is_empty() {
            input.parse::<Token![,]>()?;
        }
    }

    while !input.is_empty() {
        let key: Ident = input.parse()?;
        input.parse::<Token![=]>()?;
        match key.to_string().as_str() {
            "path" => args.path = Some(input.parse()?),
            "before" => {
                let list: ExprArray = input.parse()?;
                args.before.extend(list.elems);
            }
            _ => return Err(syn::Error::new(key.span(), "expected `path` or `before`")),
        }
        if !input.is_empty() {
            input.parse::<Token![,]>()?;
        }
    }

    Ok(args)
}
