//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: upgrade classification, method
//! validation, body-size gating, health endpoints, and route dispatch into
//! the fallback handler set.

use crate::config::AppState;
use crate::handler::fallback::{
    FallbackContentHandler, FallbackFileHandler, NotFoundDelegatingHandler, RequestHandler,
};
use crate::http;
use crate::logger;
use crate::tunnel::handshake;
use crate::vfs::Vfs;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::sync::Arc;

/// Request context encapsulating what the content handlers need
#[derive(Clone)]
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub is_head: bool,
    pub if_none_match: Option<String>,
    pub if_modified_since: Option<String>,
    pub range_header: Option<String>,
    pub access_log: bool,
}

/// A mounted route: one of the fallback handler variants
pub enum Route<F: Vfs> {
    Files(FallbackFileHandler<F>),
    Spa(NotFoundDelegatingHandler<F, FallbackContentHandler>),
    Content(FallbackContentHandler),
}

impl<F: Vfs> Route<F> {
    async fn serve(&self, ctx: &RequestContext<'_>) -> Response<Full<Bytes>> {
        match self {
            Self::Files(h) => h.serve(ctx).await,
            Self::Spa(h) => h.serve(ctx).await,
            Self::Content(h) => h.serve(ctx).await,
        }
    }
}

/// Main entry point for HTTP request handling
pub async fn handle_request<F: Vfs>(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState<F>>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let access_log = state.config.logging.access_log;
    if access_log {
        logger::log_request(req.method(), req.uri(), req.version());
    }

    // Upgrade handshakes are classified first and never reach the content
    // handlers: the tunnel takes over the raw connection.
    if let Some(tunnel) = state.tunnel.as_ref() {
        if handshake::is_upgrade(req.headers()) {
            return Ok(tunnel.serve(req).await);
        }
    }

    if let Some(resp) = check_http_method(req.method(), state.config.http.enable_cors) {
        return Ok(resp);
    }

    if let Some(resp) = check_body_size(&req, state.config.http.max_body_size) {
        return Ok(resp);
    }

    if state.config.logging.show_headers {
        logger::log_headers_count(req.headers().len());
    }

    let ctx = RequestContext {
        path: req.uri().path(),
        is_head: *req.method() == Method::HEAD,
        if_none_match: header_string(&req, "if-none-match"),
        if_modified_since: header_string(&req, "if-modified-since"),
        range_header: header_string(&req, "range"),
        access_log,
    };

    Ok(route_request(&ctx, &state).await)
}

fn header_string(req: &Request<hyper::body::Incoming>, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

/// Check HTTP method and return an early response for non-GET/HEAD methods
fn check_http_method(method: &Method, enable_cors: bool) -> Option<Response<Full<Bytes>>> {
    match method {
        &Method::GET | &Method::HEAD => None,
        &Method::OPTIONS => Some(http::build_options_response(enable_cors)),
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            Some(http::build_405_response())
        }
    }
}

/// Validate Content-Length against the configured limit
fn check_body_size(
    req: &Request<hyper::body::Incoming>,
    max_body_size: u64,
) -> Option<Response<Full<Bytes>>> {
    let content_length = req.headers().get("content-length")?;
    let size_str = content_length.to_str().ok()?;
    match size_str.parse::<u64>() {
        Ok(size) if size > max_body_size => {
            logger::log_error(&format!(
                "Request body too large: {size} bytes (max: {max_body_size})"
            ));
            Some(http::build_413_response())
        }
        Err(_) => {
            logger::log_warning(&format!(
                "Invalid Content-Length value: '{size_str}', skipping size check"
            ));
            None
        }
        _ => None,
    }
}

/// Route a request through health endpoints and the mounted route table
async fn route_request<F: Vfs>(
    ctx: &RequestContext<'_>,
    state: &Arc<AppState<F>>,
) -> Response<Full<Bytes>> {
    let health = &state.config.routes.health;
    if health.enabled
        && (ctx.path == health.liveness_path || ctx.path == health.readiness_path)
    {
        return http::build_health_response("ok");
    }

    match best_match(&state.routes, ctx.path) {
        Some((prefix, route)) => {
            let sub_ctx = RequestContext {
                path: strip_route_prefix(ctx.path, prefix),
                ..ctx.clone()
            };
            route.serve(&sub_ctx).await
        }
        None => http::build_404_response(),
    }
}

/// Find the route with the longest matching prefix (exact match included)
fn best_match<'a, F: Vfs>(
    routes: &'a [(String, Route<F>)],
    path: &str,
) -> Option<(&'a str, &'a Route<F>)> {
    routes
        .iter()
        .filter(|(prefix, _)| path == prefix || path.starts_with(prefix.as_str()))
        .max_by_key(|(prefix, _)| prefix.len())
        .map(|(prefix, route)| (prefix.as_str(), route))
}

/// Drop the mount prefix so handlers resolve inside their own root
fn strip_route_prefix<'a>(path: &'a str, prefix: &str) -> &'a str {
    if prefix == "/" {
        return path;
    }
    match path.strip_prefix(prefix) {
        Some("") | None => "/",
        Some(rest) => rest,
    }
}
