use http::Method;
use std::collections::BTreeMap;
use std::fmt;

/// Streaming shape of an RPC method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Streaming {
    Unary,
    ClientStream,
    ServerStream,
    Bidi,
}

impl Streaming {
    pub fn from_flags(client_streaming: bool, server_streaming: bool) -> Self {
        match (client_streaming, server_streaming) {
            (false, false) => Streaming::Unary,
            (true, false) => Streaming::ClientStream,
            (false, true) => Streaming::ServerStream,
            (true, true) => Streaming::Bidi,
        }
    }

    pub fn is_client_streaming(self) -> bool {
        matches!(self, Streaming::ClientStream | Streaming::Bidi)
    }

    pub fn is_server_streaming(self) -> bool {
        matches!(self, Streaming::ServerStream | Streaming::Bidi)
    }
}

impl fmt::Display for Streaming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Streaming::Unary => "unary",
            Streaming::ClientStream => "client_stream",
            Streaming::ServerStream => "server_stream",
            Streaming::Bidi => "bidi",
        };
        write!(f, "{s}")
    }
}

/// One RPC/HTTP endpoint extracted from a service descriptor.
///
/// Routes are built once per method, in declaration order, and are never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    /// HTTP verb from the binding, `POST` when the method has none
    pub method: Method,
    /// URL path verbatim from the binding, `None` when the method has none
    pub path: Option<String>,
    /// Owning service name
    pub service: String,
    /// Method name as declared (e.g. `GetOrder`)
    pub rpc: String,
    /// Short request message name
    pub request_type: String,
    /// Short response message name
    pub response_type: String,
    pub streaming: Streaming,
    /// Free-form metadata (`body`, `response_body`, full type names, ...)
    pub options: BTreeMap<String, String>,
}

impl Route {
    /// Whether the method carried an HTTP binding
    pub fn has_http_binding(&self) -> bool {
        self.path.is_some()
    }

    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }
}
