//! HTTP cache validation module
//!
//! Conditional-GET support: `ETag` generation with `If-None-Match`
//! evaluation, and modification-time validation with `If-Modified-Since`.

use chrono::{DateTime, Utc};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::SystemTime;

/// Generate a quoted `ETag` from content bytes using fast hashing
pub fn generate_etag(content: &[u8]) -> String {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    let v = hasher.finish();
    format!("\"{v:x}\"")
}

/// Check whether the client's `If-None-Match` header matches the `ETag`
///
/// Handles a single `ETag`, a comma-separated list, and the `*` wildcard.
/// Returns true when the client copy is current (respond 304).
pub fn check_etag_match(if_none_match: Option<&str>, etag: &str) -> bool {
    if_none_match.is_some_and(|client_etag| {
        client_etag
            .split(',')
            .any(|e| e.trim() == etag || e.trim() == "*")
    })
}

/// Format a modification time as an RFC 7231 HTTP date (`Last-Modified` value)
pub fn format_http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time)
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

/// Check an `If-Modified-Since` header against a modification time
///
/// HTTP dates carry second granularity, so the comparison truncates to whole
/// seconds. Returns true when the resource has not changed since the client's
/// recorded date (respond 304). An unparsable header or unknown modification
/// time never matches.
pub fn check_modified_since(
    if_modified_since: Option<&str>,
    modified: Option<SystemTime>,
) -> bool {
    let (Some(header), Some(modified)) = (if_modified_since, modified) else {
        return false;
    };
    let Ok(client_time) = DateTime::parse_from_rfc2822(header) else {
        return false;
    };
    let modified = DateTime::<Utc>::from(modified);
    modified.timestamp() <= client_time.timestamp()
}
