//! doorman — a small front-of-house request router.
//!
//! Serves static content with configurable fallback tiers and tunnels
//! WebSocket upgrade connections to a backend over a raw byte relay.

pub mod config;
pub mod handler;
pub mod http;
pub mod logger;
pub mod tunnel;
pub mod vfs;
