use super::proto::{FileDescriptor, HttpRule, MethodDescriptor};
use super::types::{Route, Streaming};
use crate::error::{Result, ScaffoldError};
use http::Method;
use std::collections::BTreeMap;
use tracing::debug;

/// Strip the package qualifier from a fully qualified message name
///
/// `.api.order.v1.GetOrderRequest` becomes `GetOrderRequest`.
pub fn short_type_name(full_name: &str) -> &str {
    full_name.rsplit('.').next().unwrap_or(full_name)
}

fn required<'a>(value: Option<&'a String>, file: &str, what: &str) -> Result<&'a str> {
    match value.map(String::as_str) {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ScaffoldError::descriptor(file, format!("{what} is missing"))),
    }
}

/// Resolve the verb and path of an HTTP binding
///
/// Returns `None` when the rule carries no pattern at all. Custom verbs that
/// are not valid HTTP tokens fall back to `POST`.
fn resolve_binding(rule: &HttpRule) -> Option<(Method, String)> {
    let patterns = [
        (Method::GET, &rule.get),
        (Method::PUT, &rule.put),
        (Method::POST, &rule.post),
        (Method::DELETE, &rule.delete),
        (Method::PATCH, &rule.patch),
    ];
    for (method, pattern) in patterns {
        if let Some(path) = pattern {
            return Some((method, path.clone()));
        }
    }
    rule.custom.as_ref().map(|custom| {
        let method = Method::from_bytes(custom.kind.to_ascii_uppercase().as_bytes())
            .unwrap_or(Method::POST);
        (method, custom.path.clone())
    })
}

fn build_route(
    file: &str,
    package: Option<&str>,
    service: &str,
    method: &MethodDescriptor,
) -> Result<Route> {
    let rpc = required(method.name.as_ref(), file, &format!("method name in service {service}"))?;
    let location = format!("{service}.{rpc}");
    let input = required(method.input_type.as_ref(), file, &format!("input type of {location}"))?;
    let output = required(method.output_type.as_ref(), file, &format!("output type of {location}"))?;

    let streaming = Streaming::from_flags(
        method.client_streaming.unwrap_or(false),
        method.server_streaming.unwrap_or(false),
    );

    let mut options = BTreeMap::new();
    options.insert(
        "request_full_name".to_string(),
        input.trim_start_matches('.').to_string(),
    );
    options.insert(
        "response_full_name".to_string(),
        output.trim_start_matches('.').to_string(),
    );
    options.insert("streaming".to_string(), streaming.to_string());
    if let Some(package) = package.filter(|p| !p.is_empty()) {
        options.insert("package".to_string(), package.to_string());
    }

    let method_options = method.options.as_ref();
    if method_options.and_then(|o| o.deprecated).unwrap_or(false) {
        options.insert("deprecated".to_string(), "true".to_string());
    }

    let binding = method_options
        .and_then(|o| o.http.as_ref())
        .and_then(|rule| resolve_binding(rule).map(|b| (rule, b)));

    let (http_method, path) = match binding {
        Some((rule, (verb, path))) => {
            if !rule.body.is_empty() {
                options.insert("body".to_string(), rule.body.clone());
            }
            if !rule.response_body.is_empty() {
                options.insert("response_body".to_string(), rule.response_body.clone());
            }
            if !rule.additional_bindings.is_empty() {
                options.insert(
                    "additional_bindings".to_string(),
                    rule.additional_bindings.len().to_string(),
                );
            }
            (verb, Some(path))
        }
        None => {
            debug!(method = %location, "no http binding, defaulting to POST");
            (Method::POST, None)
        }
    };

    Ok(Route {
        method: http_method,
        path,
        service: service.to_string(),
        rpc: rpc.to_string(),
        request_type: short_type_name(input).to_string(),
        response_type: short_type_name(output).to_string(),
        streaming,
        options,
    })
}

/// Walk a file descriptor and produce one [`Route`] per method
///
/// Services and methods are visited in declaration order. Any structural
/// defect (no file name, unnamed service, method without types) fails the
/// whole file so that half-described files never reach the emitter.
pub fn walk_file(file: &FileDescriptor) -> Result<Vec<Route>> {
    let file_name = required(file.name.as_ref(), "<unnamed>", "file name")?;
    let mut routes = Vec::new();
    for service in &file.service {
        let service_name = required(service.name.as_ref(), file_name, "service name")?;
        for method in &service.method {
            routes.push(build_route(
                file_name,
                file.package.as_deref(),
                service_name,
                method,
            )?);
        }
    }
    debug!(file = file_name, routes = routes.len(), "walked descriptor");
    Ok(routes)
}
