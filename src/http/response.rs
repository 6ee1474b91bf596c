//! HTTP response building module
//!
//! Builders for the fixed response surface of the router and the tunnel.
//! Hard-failure bodies are plain text with `X-Content-Type-Options: nosniff`
//! so user agents never attempt content sniffing on them.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

/// Body of the terminal failure path: primary lookup missed and the
/// configured fallback could not be served either.
pub const FALLBACK_FAILURE_BODY: &str = "File not found and default could not be served.";

/// Build 304 Not Modified response
pub fn build_304_response(etag: &str, last_modified: Option<&str>) -> Response<Full<Bytes>> {
    let mut builder = Response::builder()
        .status(304)
        .header("ETag", etag)
        .header("Cache-Control", "public, max-age=3600");
    if let Some(date) = last_modified {
        builder = builder.header("Last-Modified", date);
    }
    builder.body(Full::new(Bytes::new())).unwrap_or_else(|e| {
        log_build_error("304", &e);
        Response::new(Full::new(Bytes::new()))
    })
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<Full<Bytes>> {
    plain_text_response(404, "404 Not Found")
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(405)
        .header("Content-Type", "text/plain")
        .header("Allow", "GET, HEAD, OPTIONS")
        .body(Full::new(Bytes::from("405 Method Not Allowed")))
        .unwrap_or_else(|e| {
            log_build_error("405", &e);
            Response::new(Full::new(Bytes::from("405 Method Not Allowed")))
        })
}

/// Build OPTIONS response (preflight request)
pub fn build_options_response(enable_cors: bool) -> Response<Full<Bytes>> {
    let mut builder = Response::builder()
        .status(204)
        .header("Allow", "GET, HEAD, OPTIONS");

    if enable_cors {
        builder = builder
            .header("Access-Control-Allow-Origin", "*")
            .header("Access-Control-Allow-Methods", "GET, HEAD, OPTIONS")
            .header("Access-Control-Allow-Headers", "Content-Type, Range")
            .header("Access-Control-Max-Age", "86400");
    }

    builder.body(Full::new(Bytes::new())).unwrap_or_else(|e| {
        log_build_error("OPTIONS", &e);
        Response::new(Full::new(Bytes::new()))
    })
}

/// Build 413 Payload Too Large response
pub fn build_413_response() -> Response<Full<Bytes>> {
    plain_text_response(413, "413 Payload Too Large")
}

/// Build 416 Range Not Satisfiable response
pub fn build_416_response(total_size: usize) -> Response<Full<Bytes>> {
    Response::builder()
        .status(416)
        .header("Content-Type", "text/plain")
        .header("Content-Range", format!("bytes */{total_size}"))
        .body(Full::new(Bytes::from("Range Not Satisfiable")))
        .unwrap_or_else(|e| {
            log_build_error("416", &e);
            Response::new(Full::new(Bytes::from("Range Not Satisfiable")))
        })
}

/// Build the terminal 500 for the fallback tier itself being unusable
pub fn build_fallback_failure_response() -> Response<Full<Bytes>> {
    nosniff_text_response(500, FALLBACK_FAILURE_BODY)
}

/// Build the 500 for a serving context that cannot yield its raw connection
pub fn build_hijack_unsupported_response() -> Response<Full<Bytes>> {
    nosniff_text_response(500, "Connection cannot be taken over for tunneling.")
}

/// Build the 502 for an unreachable or refusing tunnel backend
pub fn build_502_response() -> Response<Full<Bytes>> {
    nosniff_text_response(502, "Error contacting backend server.")
}

/// Build health check response
pub fn build_health_response(status: &'static str) -> Response<Full<Bytes>> {
    plain_text_response(200, status)
}

/// Build success response with cache validators
pub fn build_cached_response(
    data: Bytes,
    content_type: &str,
    etag: &str,
    last_modified: Option<&str>,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let content_length = data.len();
    let body = if is_head { Bytes::new() } else { data };

    let mut builder = Response::builder()
        .status(200)
        .header("Content-Type", content_type)
        .header("Content-Length", content_length)
        .header("Accept-Ranges", "bytes")
        .header("ETag", etag)
        .header("Cache-Control", "public, max-age=3600");
    if let Some(date) = last_modified {
        builder = builder.header("Last-Modified", date);
    }
    builder.body(Full::new(body)).unwrap_or_else(|e| {
        log_build_error("200", &e);
        Response::new(Full::new(Bytes::new()))
    })
}

/// Build 206 Partial Content response
pub fn build_partial_response(
    data: Bytes,
    content_type: &str,
    etag: &str,
    start: usize,
    end: usize,
    total_size: usize,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let content_length = end - start + 1;
    let body = if is_head { Bytes::new() } else { data };

    Response::builder()
        .status(206)
        .header("Content-Type", content_type)
        .header("Content-Length", content_length)
        .header("Content-Range", format!("bytes {start}-{end}/{total_size}"))
        .header("Accept-Ranges", "bytes")
        .header("ETag", etag)
        .header("Cache-Control", "public, max-age=3600")
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("206", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

fn plain_text_response(status: u16, body: &'static str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain")
        .body(Full::new(Bytes::from(body)))
        .unwrap_or_else(|e| {
            log_build_error("text", &e);
            Response::new(Full::new(Bytes::from(body)))
        })
}

fn nosniff_text_response(status: u16, body: &'static str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain; charset=utf-8")
        .header("X-Content-Type-Options", "nosniff")
        .body(Full::new(Bytes::from(body)))
        .unwrap_or_else(|e| {
            log_build_error("failure", &e);
            Response::new(Full::new(Bytes::from(body)))
        })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_failure_headers() {
        let resp = build_fallback_failure_response();
        assert_eq!(resp.status(), 500);
        assert_eq!(
            resp.headers().get("Content-Type").unwrap(),
            "text/plain; charset=utf-8"
        );
        assert_eq!(
            resp.headers().get("X-Content-Type-Options").unwrap(),
            "nosniff"
        );
    }

    #[test]
    fn backend_unreachable_is_502() {
        let resp = build_502_response();
        assert_eq!(resp.status(), 502);
        assert_eq!(
            resp.headers().get("X-Content-Type-Options").unwrap(),
            "nosniff"
        );
    }

    #[test]
    fn cached_response_carries_validators() {
        let resp = build_cached_response(
            Bytes::from_static(b"abc"),
            "text/plain",
            "\"e1\"",
            Some("Sun, 06 Nov 1994 08:49:37 GMT"),
            false,
        );
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers().get("ETag").unwrap(), "\"e1\"");
        assert_eq!(
            resp.headers().get("Last-Modified").unwrap(),
            "Sun, 06 Nov 1994 08:49:37 GMT"
        );
        assert_eq!(resp.headers().get("Accept-Ranges").unwrap(), "bytes");
    }

    #[test]
    fn head_empties_body_but_keeps_length() {
        let resp = build_cached_response(
            Bytes::from_static(b"abcdef"),
            "text/plain",
            "\"e1\"",
            None,
            true,
        );
        assert_eq!(resp.headers().get("Content-Length").unwrap(), "6");
    }
}
