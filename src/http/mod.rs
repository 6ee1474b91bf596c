//! HTTP protocol layer module
//!
//! Protocol-level helpers shared by the content handlers and the tunnel:
//! MIME inference, conditional-request evaluation, Range parsing, and
//! response builders for the fixed status surface.

pub mod cache;
pub mod mime;
pub mod range;
pub mod response;

pub use range::parse_range_header;
pub use response::{
    build_304_response, build_404_response, build_405_response, build_413_response,
    build_416_response, build_502_response, build_fallback_failure_response,
    build_health_response, build_hijack_unsupported_response, build_options_response,
};
