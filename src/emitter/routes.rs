use super::fragment::{finish, FragmentKind, Fragments};
use super::templates::{
    BidiMethodTemplate, ClientStreamMethodTemplate, ErrorCodeTemplate, HandlerFileTemplate,
    HandlerRouterTemplate, RouteTableTemplate, RouteView, ServerStreamMethodTemplate,
    ServiceFileTemplate, ServiceRouterTemplate, ServiceView, SseHandlerTemplate,
    UnaryHandlerTemplate, UnaryMethodTemplate, WebSocketHandlerTemplate,
};
use crate::descriptor::{Route, Streaming};
use crate::error::Result;
use askama::Template;
use heck::{ToShoutySnakeCase, ToSnakeCase, ToUpperCamelCase};
use http::Method;
use std::collections::{BTreeMap, BTreeSet};

/// First error code of the first service in handler mode
pub const HTTP_CODE_BASE: u32 = 20_000;
/// First error code of the first service in service mode
pub const RPC_CODE_BASE: u32 = 40_000;
/// Codes reserved per service
pub const SERVICE_CODE_STEP: u32 = 100;

/// Crate the generated code imports compiled proto messages from
const API_CRATE: &str = "module_name_example";

/// Which logic-bearing fragments accompany the route table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitMode {
    /// Route table only
    RoutesOnly,
    /// axum handlers, one per HTTP-bound method
    Handler,
    /// tonic service impls, one method per RPC
    Service,
}

/// Stem used to name every file generated from a proto file
///
/// `api/v1/order.proto` becomes `order`.
pub fn file_stem(proto_name: &str) -> String {
    let base = proto_name.rsplit('/').next().unwrap_or(proto_name);
    base.strip_suffix(".proto").unwrap_or(base).to_snake_case()
}

/// Relative path of the route table, next to its proto file
pub fn route_table_path(proto_name: &str) -> String {
    let stem = file_stem(proto_name);
    match proto_name.rsplit_once('/') {
        Some((dir, _)) => format!("{dir}/{stem}_router.pb.rs"),
        None => format!("{stem}_router.pb.rs"),
    }
}

fn route_fn(method: &Method) -> &'static str {
    match *method {
        Method::GET => "get",
        Method::POST => "post",
        Method::PUT => "put",
        Method::DELETE => "delete",
        Method::PATCH => "patch",
        Method::HEAD => "head",
        Method::OPTIONS => "options",
        Method::TRACE => "trace",
        _ => "any",
    }
}

fn extractor(method: &Method) -> &'static str {
    match *method {
        Method::GET | Method::DELETE | Method::HEAD | Method::OPTIONS => "Query",
        _ => "Json",
    }
}

fn package_path(package: Option<&str>) -> Option<String> {
    package
        .filter(|p| !p.is_empty())
        .map(|p| p.split('.').collect::<Vec<_>>().join("::"))
}

/// Split a full message name into (package path, short name)
fn message_path(full_name: &str) -> (Option<String>, String) {
    match full_name.rsplit_once('.') {
        Some((package, name)) => (package_path(Some(package)), name.to_string()),
        None => (None, full_name.to_string()),
    }
}

fn message_imports<'a>(routes: impl Iterator<Item = &'a Route>) -> Vec<String> {
    let mut by_package: BTreeMap<Option<String>, BTreeSet<String>> = BTreeMap::new();
    for route in routes {
        for (key, short) in [
            ("request_full_name", &route.request_type),
            ("response_full_name", &route.response_type),
        ] {
            let (package, name) = match route.option(key) {
                Some(full) => message_path(full),
                None => (None, short.clone()),
            };
            by_package.entry(package).or_default().insert(name);
        }
    }
    by_package
        .into_iter()
        .map(|(package, names)| {
            let prefix = match package {
                Some(p) => format!("{API_CRATE}::{p}"),
                None => API_CRATE.to_string(),
            };
            let names: Vec<_> = names.into_iter().collect();
            if names.len() == 1 {
                format!("use {prefix}::{};", names[0])
            } else {
                format!("use {prefix}::{{{}}};", names.join(", "))
            }
        })
        .collect()
}

fn route_view(route: &Route) -> RouteView {
    let path = route.path.as_deref();
    RouteView {
        service: route.service.clone(),
        rpc: route.rpc.clone(),
        rpc_fn: route.rpc.to_snake_case(),
        method: route.method.to_string(),
        route_fn: route_fn(&route.method).to_string(),
        path_literal: format!("{:?}", path.unwrap_or_default()),
        display_path: path.unwrap_or("(no http binding)").to_string(),
        request_type: route.request_type.clone(),
        response_type: route.response_type.clone(),
        streaming: route.streaming.to_string(),
        is_bidi: route.streaming == Streaming::Bidi,
        shape: route.streaming,
        extractor: extractor(&route.method).to_string(),
        error_const: format!(
            "{}_{}",
            route.service.to_shouty_snake_case(),
            route.rpc.to_shouty_snake_case()
        ),
        stream_type: format!("{}Stream", route.rpc.to_upper_camel_case()),
        deprecated: route.option("deprecated") == Some("true"),
    }
}

/// Group routes by declaring service, keeping declaration order
fn group_services(routes: &[Route], code_base: u32) -> Vec<ServiceView> {
    let mut order: Vec<&str> = Vec::new();
    let mut grouped: BTreeMap<&str, Vec<&Route>> = BTreeMap::new();
    for route in routes {
        if !grouped.contains_key(route.service.as_str()) {
            order.push(route.service.as_str());
        }
        grouped.entry(route.service.as_str()).or_default().push(route);
    }

    order
        .into_iter()
        .enumerate()
        .map(|(index, name)| {
            let members = grouped.remove(name).unwrap_or_default();
            let snake = name.to_snake_case();
            let package = members.first().and_then(|r| package_path(r.option("package")));
            let server_module = match package {
                Some(p) => format!("{API_CRATE}::{p}::{snake}_server"),
                None => format!("{API_CRATE}::{snake}_server"),
            };
            let routes: Vec<RouteView> = members.iter().map(|r| route_view(r)).collect();
            let http_routes = members
                .iter()
                .zip(routes.iter())
                .filter(|(r, _)| r.has_http_binding())
                .map(|(_, v)| v.clone())
                .collect();
            ServiceView {
                name: name.to_string(),
                screaming: name.to_shouty_snake_case(),
                snake,
                server_module,
                base_code: code_base + SERVICE_CODE_STEP * (index as u32 + 1),
                routes,
                http_routes,
                bodies: Vec::new(),
            }
        })
        .collect()
}

fn handler_body(route: &RouteView) -> Result<String> {
    let body = match route.shape {
        Streaming::Unary => UnaryHandlerTemplate { r: route }.render()?,
        Streaming::ServerStream => SseHandlerTemplate { r: route }.render()?,
        Streaming::ClientStream | Streaming::Bidi => {
            WebSocketHandlerTemplate { r: route }.render()?
        }
    };
    Ok(body.trim_end().to_string())
}

fn service_body(route: &RouteView) -> Result<String> {
    let body = match route.shape {
        Streaming::Unary => UnaryMethodTemplate { r: route }.render()?,
        Streaming::ServerStream => ServerStreamMethodTemplate { r: route }.render()?,
        Streaming::ClientStream => ClientStreamMethodTemplate { r: route }.render()?,
        Streaming::Bidi => BidiMethodTemplate { r: route }.render()?,
    };
    Ok(body.trim_end().to_string())
}

fn handler_imports(routes: &[&Route]) -> Vec<String> {
    let mut imports: BTreeSet<String> = BTreeSet::new();
    for route in routes {
        match route.streaming {
            Streaming::Unary => {
                imports.insert("use axum::Json;".into());
                imports.insert("use crate::ecode::ErrCode;".into());
            }
            Streaming::ServerStream => {
                imports.insert("use axum::response::sse::{Event, Sse};".into());
                imports.insert("use futures::stream::{self, Stream, StreamExt};".into());
            }
            Streaming::ClientStream | Streaming::Bidi => {
                imports.insert(
                    "use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};".into(),
                );
                imports.insert("use axum::response::Response;".into());
            }
        }
        let needs_extractor = !route.streaming.is_client_streaming();
        if needs_extractor && extractor(&route.method) == "Query" {
            imports.insert("use axum::extract::Query;".into());
        }
        if needs_extractor && extractor(&route.method) == "Json" {
            imports.insert("use axum::Json;".into());
        }
    }
    imports.extend(message_imports(routes.iter().copied()));
    imports.into_iter().collect()
}

fn service_imports(routes: &[Route]) -> Vec<String> {
    let mut imports: BTreeSet<String> = BTreeSet::new();
    let any_client = routes.iter().any(|r| r.streaming.is_client_streaming());
    let any_server = routes.iter().any(|r| r.streaming.is_server_streaming());
    if any_client {
        imports.insert("use tonic::{Request, Response, Status, Streaming};".into());
    } else {
        imports.insert("use tonic::{Request, Response, Status};".into());
    }
    if any_server {
        imports.insert("use futures::Stream;".into());
        imports.insert("use std::pin::Pin;".into());
    }
    if routes.iter().any(|r| r.streaming == Streaming::Bidi) {
        imports.insert("use futures::StreamExt;".into());
    }
    imports.extend(message_imports(routes.iter()));
    imports.into_iter().collect()
}

fn router_imports(services: &[ServiceView]) -> Vec<String> {
    let fns: BTreeSet<&str> = services
        .iter()
        .flat_map(|s| s.http_routes.iter().map(|r| r.route_fn.as_str()))
        .collect();
    let mut imports = vec!["use axum::Router;".to_string()];
    match fns.len() {
        0 => {}
        1 => imports.push(format!(
            "use axum::routing::{};",
            fns.iter().next().copied().unwrap_or_default()
        )),
        _ => imports.push(format!(
            "use axum::routing::{{{}}};",
            fns.into_iter().collect::<Vec<_>>().join(", ")
        )),
    }
    imports
}

/// Render the fragments for the routes of one proto file
///
/// The output depends only on `source`, the routes and the mode, so two runs
/// over the same descriptor produce identical text. A file without routes
/// yields no fragments at all.
pub fn emit_routes(source: &str, routes: &[Route], mode: EmitMode) -> Result<Fragments> {
    let mut fragments = Fragments::new();
    if routes.is_empty() {
        return Ok(fragments);
    }
    let stem = file_stem(source);
    let code_base = match mode {
        EmitMode::Service => RPC_CODE_BASE,
        _ => HTTP_CODE_BASE,
    };
    let mut services = group_services(routes, code_base);

    let table = RouteTableTemplate {
        source,
        services: &services,
    }
    .render()?;
    fragments.insert(FragmentKind::RouteTable, finish(table));

    match mode {
        EmitMode::RoutesOnly => {}
        EmitMode::Handler => {
            let bound: Vec<&Route> = routes.iter().filter(|r| r.has_http_binding()).collect();
            for service in services.iter_mut() {
                service.bodies = service
                    .http_routes
                    .iter()
                    .map(handler_body)
                    .collect::<Result<_>>()?;
            }
            let router = HandlerRouterTemplate {
                source,
                stem: &stem,
                imports: router_imports(&services),
                services: &services,
            }
            .render()?;
            let handler = HandlerFileTemplate {
                source,
                imports: handler_imports(&bound),
                services: &services,
            }
            .render()?;
            fragments.insert(FragmentKind::Router, finish(router));
            fragments.insert(FragmentKind::Handler, finish(handler));
            fragments.insert(FragmentKind::ErrorCode, error_codes(source, "HTTP", &services)?);
        }
        EmitMode::Service => {
            for service in services.iter_mut() {
                service.bodies = service
                    .routes
                    .iter()
                    .map(service_body)
                    .collect::<Result<_>>()?;
            }
            let router = ServiceRouterTemplate {
                source,
                stem: &stem,
                services: &services,
            }
            .render()?;
            let service = ServiceFileTemplate {
                source,
                imports: service_imports(routes),
                services: &services,
            }
            .render()?;
            fragments.insert(FragmentKind::Router, finish(router));
            fragments.insert(FragmentKind::Service, finish(service));
            fragments.insert(FragmentKind::ErrorCode, error_codes(source, "RPC", &services)?);
        }
    }
    Ok(fragments)
}

fn error_codes(source: &str, flavor: &str, services: &[ServiceView]) -> Result<String> {
    let rendered = ErrorCodeTemplate {
        source,
        flavor,
        services,
    }
    .render()?;
    Ok(finish(rendered))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(service: &str, rpc: &str, method: Method, path: Option<&str>) -> Route {
        let mut options = BTreeMap::new();
        options.insert("request_full_name".into(), format!("api.v1.{rpc}Request"));
        options.insert("response_full_name".into(), format!("api.v1.{rpc}Reply"));
        options.insert("package".into(), "api.v1".into());
        Route {
            method,
            path: path.map(str::to_string),
            service: service.into(),
            rpc: rpc.into(),
            request_type: format!("{rpc}Request"),
            response_type: format!("{rpc}Reply"),
            streaming: Streaming::Unary,
            options,
        }
    }

    #[test]
    fn test_file_stem_and_table_path() {
        assert_eq!(file_stem("api/v1/order.proto"), "order");
        assert_eq!(file_stem("OrderService.proto"), "order_service");
        assert_eq!(route_table_path("api/v1/order.proto"), "api/v1/order_router.pb.rs");
        assert_eq!(route_table_path("order.proto"), "order_router.pb.rs");
    }

    #[test]
    fn test_message_imports_grouped_by_package() {
        let routes = vec![route("Order", "GetOrder", Method::GET, Some("/v1/orders/{id}"))];
        assert_eq!(
            message_imports(routes.iter()),
            vec!["use module_name_example::api::v1::{GetOrderReply, GetOrderRequest};"]
        );
    }

    #[test]
    fn test_route_fn_falls_back_to_any() {
        assert_eq!(route_fn(&Method::GET), "get");
        assert_eq!(route_fn(&Method::from_bytes(b"LIST").unwrap()), "any");
    }

    #[test]
    fn test_empty_file_yields_nothing() {
        let fragments = emit_routes("empty.proto", &[], EmitMode::Handler).unwrap();
        assert!(fragments.is_empty());
    }

    #[test]
    fn test_routes_only_mode() {
        let routes = vec![route("Order", "GetOrder", Method::GET, Some("/v1/orders/{id}"))];
        let fragments = emit_routes("order.proto", &routes, EmitMode::RoutesOnly).unwrap();
        assert_eq!(fragments.kinds().collect::<Vec<_>>(), vec![FragmentKind::RouteTable]);
        let table = fragments.get(FragmentKind::RouteTable).unwrap();
        assert!(table.contains("pub const ORDER_ROUTES"));
        assert!(table.contains("path: \"/v1/orders/{id}\""));
    }

    #[test]
    fn test_service_base_codes_follow_declaration_order() {
        let routes = vec![
            route("Order", "GetOrder", Method::GET, None),
            route("Order", "ListOrders", Method::GET, None),
            route("Cart", "AddItem", Method::POST, None),
        ];
        let fragments = emit_routes("shop.proto", &routes, EmitMode::Service).unwrap();
        let codes = fragments.get(FragmentKind::ErrorCode).unwrap();
        assert!(codes.contains("pub const ORDER_BASE_CODE: u32 = 40100;"));
        assert!(codes.contains("pub const CART_BASE_CODE: u32 = 40200;"));
        let get = codes.find("ORDER_GET_ORDER").unwrap();
        let list = codes.find("ORDER_LIST_ORDERS").unwrap();
        assert!(get < list);
        assert!(codes.contains("ORDER_BASE_CODE + 2"));
    }
}
