//! Logger module
//!
//! Logging for the router and the tunnel: server lifecycle, access lines,
//! warnings and errors, and tunnel session events. Targets (stdout/stderr
//! or files) come from the logging configuration.

pub mod writer;

use crate::config::Config;
use chrono::Local;
use hyper::{Method, Uri, Version};
use std::net::SocketAddr;

/// Initialize the logger with configuration.
///
/// Should be called once at application startup; before that, messages go
/// to stdout/stderr directly.
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

fn write_info(message: &str) {
    match writer::get() {
        Some(w) => w.write_info(message),
        None => println!("{message}"),
    }
}

fn write_error(message: &str) {
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

fn timestamp() -> String {
    Local::now().format("%d/%b/%Y:%H:%M:%S %z").to_string()
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    write_info("======================================");
    write_info("doorman started");
    write_info(&format!("Listening on: http://{addr}"));
    write_info(&format!("Log level: {}", config.logging.level));
    if let Some(workers) = config.server.workers {
        write_info(&format!("Worker threads: {workers}"));
    }
    if let Some(tunnel) = &config.tunnel {
        write_info(&format!("WebSocket backend: {}", tunnel.backend));
    }
    write_info(&format!("Mounted routes: {}", config.routes.custom_routes.len()));
    write_info("======================================\n");
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    write_info(&format!("[Connection] Accepted from: {peer_addr}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(&format!("[ERROR] Failed to serve connection: {err:?}"));
}

pub fn log_request(method: &Method, uri: &Uri, version: Version) {
    write_info(&format!("[{}] \"{method} {uri} {version:?}\"", timestamp()));
}

pub fn log_response(body_bytes: usize) {
    write_info(&format!("[Response] {body_bytes} bytes"));
}

pub fn log_headers_count(count: usize) {
    write_info(&format!("[Headers] Count: {count}"));
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(&format!("[WARN] {message}"));
}

// --- tunnel session events ---

pub fn log_tunnel_dial_error(target: &str, err: &std::io::Error) {
    write_error(&format!("[Tunnel] Error dialing backend {target}: {err}"));
}

pub fn log_tunnel_forward_error(target: &str, err: &impl std::fmt::Display) {
    write_error(&format!(
        "[Tunnel] Error forwarding handshake to {target}: {err}"
    ));
}

pub fn log_tunnel_refused(target: &str, status: u16) {
    write_error(&format!(
        "[Tunnel] Backend {target} refused the handshake with status {status}"
    ));
}

pub fn log_hijack_error(err: &impl std::fmt::Display) {
    write_error(&format!("[Tunnel] Hijack error: {err}"));
}

pub fn log_relay_end(target: &str, direction: &str, bytes: u64) {
    write_info(&format!(
        "[Tunnel] {target} {direction} closed after {bytes} bytes"
    ));
}

pub fn log_relay_error(target: &str, direction: &str, err: &std::io::Error) {
    write_error(&format!("[Tunnel] {target} {direction} ended: {err}"));
}

pub fn log_shutdown() {
    write_info("\n[Shutdown] Signal received, stopping accept loop");
}
