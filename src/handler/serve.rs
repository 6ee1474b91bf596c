//! Content serving module
//!
//! The capability the resolver-based handlers hand resolved content to:
//! MIME inference, conditional GET (`ETag` and modification time), Range
//! negotiation, and HEAD handling. Content is served from memory, so range
//! responses are slices rather than seeks.

use crate::handler::router::RequestContext;
use crate::http::range::RangeParseResult;
use crate::http::{self, cache, mime, response};
use crate::logger;
use crate::vfs::{FileMeta, VfsFile};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::time::SystemTime;
use tokio::io::AsyncReadExt;

/// Read a resolved handle fully into memory.
///
/// A read failure after successful resolution is logged and collapses to
/// `None`, which callers treat the same as a resolution miss.
pub async fn read_all<Fh: VfsFile>(mut file: Fh, meta: &FileMeta) -> Option<Bytes> {
    let mut data = Vec::with_capacity(usize::try_from(meta.len).unwrap_or(0));
    match file.read_to_end(&mut data).await {
        Ok(_) => Some(Bytes::from(data)),
        Err(e) => {
            logger::log_error(&format!("Failed to read '{}': {e}", meta.name));
            None
        }
    }
}

/// Serve a byte representation with full negotiation.
///
/// `content_type` pins the type when a route configures one; otherwise it
/// is inferred from `name`. Either cache validator matching yields a 304.
pub fn serve_bytes(
    ctx: &RequestContext<'_>,
    data: Bytes,
    name: &str,
    modified: Option<SystemTime>,
    content_type: Option<&str>,
) -> Response<Full<Bytes>> {
    let content_type = content_type.unwrap_or_else(|| mime::content_type_for(name));
    let etag = cache::generate_etag(&data);
    let last_modified = modified.map(cache::format_http_date);

    if cache::check_etag_match(ctx.if_none_match.as_deref(), &etag)
        || cache::check_modified_since(ctx.if_modified_since.as_deref(), modified)
    {
        return http::build_304_response(&etag, last_modified.as_deref());
    }

    let total_size = data.len();
    match http::parse_range_header(ctx.range_header.as_deref(), total_size) {
        RangeParseResult::Valid(range) => {
            if ctx.access_log {
                logger::log_response(range.len());
            }
            let body = if ctx.is_head {
                Bytes::new()
            } else {
                data.slice(range.start..=range.end)
            };
            response::build_partial_response(
                body,
                content_type,
                &etag,
                range.start,
                range.end,
                total_size,
                ctx.is_head,
            )
        }
        RangeParseResult::NotSatisfiable => http::build_416_response(total_size),
        RangeParseResult::None => {
            if ctx.access_log {
                logger::log_response(total_size);
            }
            response::build_cached_response(
                data,
                content_type,
                &etag,
                last_modified.as_deref(),
                ctx.is_head,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(path: &str) -> RequestContext<'_> {
        RequestContext {
            path,
            is_head: false,
            if_none_match: None,
            if_modified_since: None,
            range_header: None,
            access_log: false,
        }
    }

    #[test]
    fn full_body_with_inferred_type() {
        let resp = serve_bytes(
            &ctx("/a.html"),
            Bytes::from_static(b"<p>hi</p>"),
            "a.html",
            None,
            None,
        );
        assert_eq!(resp.status(), 200);
        assert_eq!(
            resp.headers().get("Content-Type").unwrap(),
            "text/html; charset=utf-8"
        );
    }

    #[test]
    fn pinned_type_wins_over_inference() {
        let resp = serve_bytes(
            &ctx("/a.bin"),
            Bytes::from_static(b"{}"),
            "a.bin",
            None,
            Some("application/json"),
        );
        assert_eq!(
            resp.headers().get("Content-Type").unwrap(),
            "application/json"
        );
    }

    #[test]
    fn etag_match_yields_304() {
        let data = Bytes::from_static(b"stable");
        let etag = cache::generate_etag(&data);
        let mut c = ctx("/f");
        c.if_none_match = Some(etag);
        let resp = serve_bytes(&c, data, "f", None, None);
        assert_eq!(resp.status(), 304);
    }

    #[test]
    fn modified_since_yields_304() {
        let t = SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_700_000_000);
        let mut c = ctx("/f");
        c.if_modified_since = Some(cache::format_http_date(t));
        let resp = serve_bytes(&c, Bytes::from_static(b"x"), "f", Some(t), None);
        assert_eq!(resp.status(), 304);
        assert!(resp.headers().get("Last-Modified").is_some());
    }

    #[test]
    fn range_request_is_partial() {
        let mut c = ctx("/f.txt");
        c.range_header = Some("bytes=2-4".to_string());
        let resp = serve_bytes(&c, Bytes::from_static(b"abcdefgh"), "f.txt", None, None);
        assert_eq!(resp.status(), 206);
        assert_eq!(
            resp.headers().get("Content-Range").unwrap(),
            "bytes 2-4/8"
        );
        assert_eq!(resp.headers().get("Content-Length").unwrap(), "3");
    }

    #[test]
    fn unsatisfiable_range_is_416() {
        let mut c = ctx("/f.txt");
        c.range_header = Some("bytes=100-".to_string());
        let resp = serve_bytes(&c, Bytes::from_static(b"short"), "f.txt", None, None);
        assert_eq!(resp.status(), 416);
        assert_eq!(resp.headers().get("Content-Range").unwrap(), "bytes */5");
    }
}
