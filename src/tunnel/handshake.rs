//! Upgrade handshake plumbing
//!
//! Classification of upgrade requests, verbatim serialization of the
//! handshake request for the backend, and a minimal parser for the
//! backend's handshake response head.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderMap, CONNECTION, UPGRADE};
use hyper::{Request, Response, Version};
use std::io;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;

/// Largest backend handshake head accepted before giving up
const MAX_RESPONSE_HEAD: usize = 16 * 1024;

/// Classify whether a request is a WebSocket upgrade handshake.
///
/// True iff the first `Connection` value case-insensitively equals the
/// literal `upgrade` and the first `Upgrade` value case-insensitively
/// equals `websocket`. This is an exact-match check, not a token-list
/// scan: a multi-token `Connection` value such as `keep-alive, Upgrade`
/// is classified as false even though the protocol grammar permits it.
/// Known limitation, preserved because relaxing it changes which requests
/// get tunneled.
pub fn is_upgrade(headers: &HeaderMap) -> bool {
    let connection_is_upgrade = headers
        .get(CONNECTION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("upgrade"));
    if !connection_is_upgrade {
        return false;
    }
    headers
        .get(UPGRADE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("websocket"))
}

/// Serialize the request line and headers exactly as received.
///
/// Header order and values are preserved; hyper stores field names
/// lowercased, which upgrade backends must accept (field names are
/// case-insensitive on the wire).
pub fn encode_request_head<B>(req: &Request<B>) -> Vec<u8> {
    let target = req
        .uri()
        .path_and_query()
        .map_or("/", |pq| pq.as_str());
    let version = if req.version() == Version::HTTP_10 {
        "HTTP/1.0"
    } else {
        "HTTP/1.1"
    };

    let mut head = Vec::with_capacity(256);
    head.extend_from_slice(format!("{} {} {}\r\n", req.method(), target, version).as_bytes());
    for (name, value) in req.headers() {
        head.extend_from_slice(name.as_str().as_bytes());
        head.extend_from_slice(b": ");
        head.extend_from_slice(value.as_bytes());
        head.extend_from_slice(b"\r\n");
    }
    head.extend_from_slice(b"\r\n");
    head
}

/// Read and parse the backend's handshake response head.
///
/// Reads until the blank line ending the head, parses the status line and
/// headers into a response the host can write back to the client, and
/// returns any bytes the backend sent past the head — those belong to the
/// relay and must reach the client first.
pub async fn read_response_head(
    stream: &mut TcpStream,
) -> io::Result<(Response<Full<Bytes>>, Vec<u8>)> {
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        if let Some(pos) = find_head_end(&buf) {
            break pos;
        }
        if buf.len() > MAX_RESPONSE_HEAD {
            return Err(invalid("backend handshake head too large"));
        }
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "backend closed during handshake",
            ));
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let leftover = buf[head_end + 4..].to_vec();
    let head = std::str::from_utf8(&buf[..head_end])
        .map_err(|_| invalid("backend handshake head is not valid UTF-8"))?;

    let mut lines = head.split("\r\n");
    let status_line = lines.next().ok_or_else(|| invalid("empty handshake head"))?;
    let mut parts = status_line.splitn(3, ' ');
    let version = parts.next().unwrap_or_default();
    if !version.starts_with("HTTP/1.") {
        return Err(invalid("backend did not answer with HTTP/1.x"));
    }
    let status: u16 = parts
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| invalid("unparsable status code in handshake"))?;

    let mut builder = Response::builder().status(status);
    for line in lines {
        if line.is_empty() {
            continue;
        }
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| invalid("malformed header line in handshake"))?;
        builder = builder.header(name.trim(), value.trim());
    }

    let response = builder
        .body(Full::new(Bytes::new()))
        .map_err(|e| invalid(&format!("invalid handshake head: {e}")))?;
    Ok((response, leftover))
}

fn find_head_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

fn invalid(message: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message.to_string())
}
