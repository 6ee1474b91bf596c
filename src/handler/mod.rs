//! Request handler module
//!
//! Content resolution, the fallback handler set, the serving capability,
//! and the routing dispatch that composes them.

pub mod fallback;
pub mod resolver;
pub mod router;
pub mod serve;

// Re-export main entry point
pub use router::handle_request;
