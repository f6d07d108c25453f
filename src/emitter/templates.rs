use crate::descriptor::Streaming;
use askama::Template;

/// Route data as the templates see it: every value pre-formatted
#[derive(Debug, Clone)]
pub struct RouteView {
    pub service: String,
    pub rpc: String,
    /// snake_case function name (`get_order`)
    pub rpc_fn: String,
    /// HTTP verb as written in the binding (`GET`)
    pub method: String,
    /// axum method router (`get`, `post`, ... `any` for custom verbs)
    pub route_fn: String,
    /// Path quoted as a Rust string literal
    pub path_literal: String,
    /// Path for doc comments, `(no http binding)` when absent
    pub display_path: String,
    pub request_type: String,
    pub response_type: String,
    pub streaming: String,
    pub is_bidi: bool,
    /// Selects the body template
    pub shape: Streaming,
    /// `Query` for body-less verbs, `Json` otherwise
    pub extractor: String,
    /// Error-code constant (`ORDER_GET_ORDER`)
    pub error_const: String,
    /// tonic associated stream type (`WatchOrdersStream`)
    pub stream_type: String,
    pub deprecated: bool,
}

#[derive(Debug, Clone)]
pub struct ServiceView {
    pub name: String,
    pub snake: String,
    pub screaming: String,
    /// Path of the tonic server module for the service
    pub server_module: String,
    pub base_code: u32,
    pub routes: Vec<RouteView>,
    pub http_routes: Vec<RouteView>,
    /// Rendered method bodies, in declaration order
    pub bodies: Vec<String>,
}

#[derive(Template)]
#[template(path = "route_table.rs.txt", escape = "none")]
pub struct RouteTableTemplate<'a> {
    pub source: &'a str,
    pub services: &'a [ServiceView],
}

#[derive(Template)]
#[template(path = "router_handler.rs.txt", escape = "none")]
pub struct HandlerRouterTemplate<'a> {
    pub source: &'a str,
    pub stem: &'a str,
    pub imports: Vec<String>,
    pub services: &'a [ServiceView],
}

#[derive(Template)]
#[template(path = "router_service.rs.txt", escape = "none")]
pub struct ServiceRouterTemplate<'a> {
    pub source: &'a str,
    pub stem: &'a str,
    pub services: &'a [ServiceView],
}

/// Logic file of handler mode: imports plus one stub per bound method
#[derive(Template)]
#[template(path = "handler_file.rs.txt", escape = "none")]
pub struct HandlerFileTemplate<'a> {
    pub source: &'a str,
    pub imports: Vec<String>,
    pub services: &'a [ServiceView],
}

#[derive(Template)]
#[template(path = "handler_unary.rs.txt", escape = "none")]
pub struct UnaryHandlerTemplate<'a> {
    pub r: &'a RouteView,
}

#[derive(Template)]
#[template(path = "handler_sse.rs.txt", escape = "none")]
pub struct SseHandlerTemplate<'a> {
    pub r: &'a RouteView,
}

#[derive(Template)]
#[template(path = "handler_ws.rs.txt", escape = "none")]
pub struct WebSocketHandlerTemplate<'a> {
    pub r: &'a RouteView,
}

/// Logic file of service mode: one trait impl per service
#[derive(Template)]
#[template(path = "service_file.rs.txt", escape = "none")]
pub struct ServiceFileTemplate<'a> {
    pub source: &'a str,
    pub imports: Vec<String>,
    pub services: &'a [ServiceView],
}

#[derive(Template)]
#[template(path = "service_unary.rs.txt", escape = "none")]
pub struct UnaryMethodTemplate<'a> {
    pub r: &'a RouteView,
}

#[derive(Template)]
#[template(path = "service_server_stream.rs.txt", escape = "none")]
pub struct ServerStreamMethodTemplate<'a> {
    pub r: &'a RouteView,
}

#[derive(Template)]
#[template(path = "service_client_stream.rs.txt", escape = "none")]
pub struct ClientStreamMethodTemplate<'a> {
    pub r: &'a RouteView,
}

#[derive(Template)]
#[template(path = "service_bidi.rs.txt", escape = "none")]
pub struct BidiMethodTemplate<'a> {
    pub r: &'a RouteView,
}

#[derive(Template)]
#[template(path = "ecode.rs.txt", escape = "none")]
pub struct ErrorCodeTemplate<'a> {
    pub source: &'a str,
    /// `HTTP` or `RPC`
    pub flavor: &'a str,
    pub services: &'a [ServiceView],
}

/// Model field with its attribute lines
#[derive(Debug, Clone)]
pub struct FieldView {
    pub name: String,
    pub ty: String,
    pub docs: Vec<String>,
    pub attrs: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SampleView {
    pub name: String,
    pub value: String,
}

#[derive(Template)]
#[template(path = "model.rs.txt", escape = "none")]
pub struct ModelTemplate<'a> {
    pub table: &'a str,
    pub struct_name: &'a str,
    pub embed: bool,
    pub fields: Vec<FieldView>,
}

#[derive(Template)]
#[template(path = "dao.rs.txt", escape = "none")]
pub struct DaoTemplate<'a> {
    pub table: &'a str,
    pub resource: &'a str,
    pub struct_name: &'a str,
    pub key: &'a str,
    pub key_type: &'a str,
    /// Field access path of the key on a row (`id` or `base.id`)
    pub key_access: &'a str,
    pub soft_delete: bool,
    pub insert_sql: String,
    pub insert_binds: Vec<String>,
    pub update_sql: String,
    pub update_binds: Vec<String>,
    pub delete_sql: String,
    pub get_sql: String,
    pub list_sql: String,
}

#[derive(Template)]
#[template(path = "dao_test.rs.txt", escape = "none")]
pub struct DaoTestTemplate<'a> {
    pub resource: &'a str,
    pub struct_name: &'a str,
    pub key_type: &'a str,
    pub key_access: &'a str,
    pub int_key: bool,
    pub samples: Vec<SampleView>,
}
