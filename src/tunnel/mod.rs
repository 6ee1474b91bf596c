//! WebSocket tunnel module
//!
//! Transparent tunneling of upgrade connections to a backend over a raw
//! byte relay. The tunnel dials the backend, forwards the client's
//! handshake verbatim, hands the backend's handshake answer back through
//! the host, then takes exclusive ownership of the raw client transport
//! and relays bytes in both directions until either side terminates.
//!
//! WebSocket framing is opaque here: correctness requires passing bytes
//! through untouched, not reinterpreting frames. The backend is always a
//! plain TCP endpoint; no backend TLS exists.

pub mod handshake;

use crate::http;
use crate::logger;
use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Bytes};
use hyper::upgrade::OnUpgrade;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::fmt;
use std::io;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

/// Backend address derived once from a URL; immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunnelTarget {
    host: String,
    port: u16,
}

impl TunnelTarget {
    /// Derive the dial target from a backend URL.
    ///
    /// Only host and port are used; the scheme merely supplies the default
    /// port (80 unless the URL says otherwise). The transport is always
    /// plain TCP.
    pub fn from_url(raw: &str) -> Result<Self, String> {
        let parsed = url::Url::parse(raw).map_err(|e| format!("invalid backend URL: {e}"))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| format!("backend URL '{raw}' has no host"))?
            .to_string();
        let port = parsed.port_or_known_default().unwrap_or(80);
        Ok(Self { host, port })
    }

    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for TunnelTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Reverse proxy for WebSocket upgrade requests.
///
/// Invoked only for requests already classified as upgrade handshakes.
/// Once the relay starts, the session exclusively owns both sockets and
/// no structured response writing happens again on this connection.
pub struct WebSocketTunnel {
    target: TunnelTarget,
}

impl WebSocketTunnel {
    #[must_use]
    pub const fn new(target: TunnelTarget) -> Self {
        Self { target }
    }

    #[must_use]
    pub const fn target(&self) -> &TunnelTarget {
        &self.target
    }

    /// Serve one upgrade request: dial, hijack, forward, relay.
    ///
    /// Failure surface: 502 when the backend is unreachable or refuses the
    /// handshake, 500 when the serving context cannot yield its raw
    /// connection. Once the relay is running no further response exists;
    /// failures are logged and the session torn down with both sockets
    /// closed.
    pub async fn serve<B>(&self, mut req: Request<B>) -> Response<Full<Bytes>>
    where
        B: Body + Send + 'static,
        B::Data: Send,
        B::Error: std::error::Error + Send + Sync + 'static,
    {
        let mut backend = match TcpStream::connect(self.target.addr()).await {
            Ok(stream) => stream,
            Err(e) => {
                logger::log_tunnel_dial_error(&self.target.addr(), &e);
                return http::build_502_response();
            }
        };

        // The host grants raw-transport access through the request's
        // upgrade extension; without it there is nothing to tunnel over.
        let Some(on_upgrade) = req.extensions_mut().remove::<OnUpgrade>() else {
            logger::log_warning("Upgrade request on a connection without hijack support");
            return http::build_hijack_unsupported_response();
        };

        // Forward the handshake exactly as received: request line, headers,
        // and any body bytes. No header rewriting of any kind.
        let head = handshake::encode_request_head(&req);
        if let Err(e) = backend.write_all(&head).await {
            logger::log_tunnel_forward_error(&self.target.addr(), &e);
            return http::build_502_response();
        }
        match req.into_body().collect().await {
            Ok(collected) => {
                let body = collected.to_bytes();
                if !body.is_empty() {
                    if let Err(e) = backend.write_all(&body).await {
                        logger::log_tunnel_forward_error(&self.target.addr(), &e);
                        return http::build_502_response();
                    }
                }
            }
            Err(e) => {
                logger::log_tunnel_forward_error(&self.target.addr(), &e);
                return http::build_502_response();
            }
        }

        let (response, leftover) = match handshake::read_response_head(&mut backend).await {
            Ok(parsed) => parsed,
            Err(e) => {
                logger::log_tunnel_forward_error(&self.target.addr(), &e);
                return http::build_502_response();
            }
        };

        if response.status() != StatusCode::SWITCHING_PROTOCOLS {
            logger::log_tunnel_refused(&self.target.addr(), response.status().as_u16());
            return http::build_502_response();
        }

        // Returning the backend's own 101 triggers the hijack; the relay
        // session picks the transport up from there.
        let target = self.target.addr();
        tokio::spawn(run_relay(on_upgrade, backend, leftover, target));
        response
    }
}

/// The lifetime of one hijacked session: wait for the raw client
/// transport, flush backend bytes that arrived past the handshake head,
/// then relay both directions until the first one ends.
async fn run_relay(on_upgrade: OnUpgrade, backend: TcpStream, leftover: Vec<u8>, target: String) {
    let upgraded = match on_upgrade.await {
        Ok(upgraded) => upgraded,
        Err(e) => {
            // Connection state is unspecified here; nothing can be written.
            logger::log_hijack_error(&e);
            return;
        }
    };

    let client = TokioIo::new(upgraded);
    let (client_read, mut client_write) = tokio::io::split(client);
    let (backend_read, backend_write) = backend.into_split();

    if !leftover.is_empty() {
        if let Err(e) = client_write.write_all(&leftover).await {
            logger::log_relay_error(&target, "backend->client", &e);
            return;
        }
    }

    // Capacity 2: each direction can deliver its outcome without blocking
    // even when teardown has already begun.
    let (outcome_tx, mut outcome_rx) = mpsc::channel::<(&'static str, io::Result<u64>)>(2);
    let uplink = tokio::spawn(relay_copy(
        client_read,
        backend_write,
        outcome_tx.clone(),
        "client->backend",
    ));
    let downlink = tokio::spawn(relay_copy(
        backend_read,
        client_write,
        outcome_tx,
        "backend->client",
    ));

    // First outcome ends the session; the other direction is not awaited.
    if let Some((direction, outcome)) = outcome_rx.recv().await {
        match outcome {
            Ok(bytes) => logger::log_relay_end(&target, direction, bytes),
            Err(e) => logger::log_relay_error(&target, direction, &e),
        }
    }

    // Aborting drops all four stream halves, closing both sockets on
    // every exit path; the peer's blocked I/O fails and unwinds on its own.
    uplink.abort();
    downlink.abort();
}

/// One relay direction: copy bytes until end-of-stream or error and
/// deliver the outcome.
async fn relay_copy<R, W>(
    mut src: R,
    mut dst: W,
    outcome_tx: mpsc::Sender<(&'static str, io::Result<u64>)>,
    direction: &'static str,
) where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    let outcome = tokio::io::copy(&mut src, &mut dst).await;
    let _ = outcome_tx.send((direction, outcome)).await;
}
