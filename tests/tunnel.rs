//! End-to-end tunnel tests over real sockets.
//!
//! A fake backend speaks just enough of the WebSocket handshake to accept
//! or refuse an upgrade, and a raw TCP client drives the front server the
//! way a browser would.

use doorman::tunnel::{TunnelTarget, WebSocketTunnel};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Bind, record the port, and drop the listener so nothing answers there.
async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Spin a front server that serves one connection with upgrades enabled,
/// routing every request through the tunnel.
async fn spawn_front(tunnel: WebSocketTunnel) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let tunnel = Arc::new(tunnel);

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let io = TokioIo::new(stream);
        let service = service_fn(move |req: Request<hyper::body::Incoming>| {
            let tunnel = Arc::clone(&tunnel);
            async move { Ok::<_, Infallible>(tunnel.serve(req).await) }
        });
        let _ = http1::Builder::new()
            .serve_connection(io, service)
            .with_upgrades()
            .await;
    });

    addr
}

/// Send an upgrade handshake and read the response head. Returns the
/// status line, any bytes received past the head, and the open stream.
async fn client_handshake(addr: SocketAddr) -> (String, Vec<u8>, TcpStream) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let handshake = format!(
        "GET /ws HTTP/1.1\r\nHost: {addr}\r\nConnection: upgrade\r\nUpgrade: websocket\r\n\r\n"
    );
    stream.write_all(handshake.as_bytes()).await.unwrap();

    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    let head_end = loop {
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed before response head");
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8(buf[..head_end].to_vec()).unwrap();
    let status_line = head.lines().next().unwrap().to_string();
    let leftover = buf[head_end..].to_vec();
    (status_line, leftover, stream)
}

/// Read from the backend socket until the request head is complete.
async fn read_request_head(stream: &mut TcpStream) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "client closed before request head");
        buf.extend_from_slice(&chunk[..n]);
        if buf.windows(4).any(|w| w == b"\r\n\r\n") {
            return buf;
        }
    }
}

#[tokio::test]
async fn unreachable_backend_yields_502() {
    let addr = unused_addr().await;
    let target = TunnelTarget::from_url(&format!("http://{addr}")).unwrap();
    let tunnel = WebSocketTunnel::new(target);

    let req = Request::builder()
        .uri("/ws")
        .header("connection", "upgrade")
        .header("upgrade", "websocket")
        .body(Full::new(Bytes::new()))
        .unwrap();

    let resp = tunnel.serve(req).await;
    assert_eq!(resp.status(), hyper::StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn refused_handshake_yields_502_to_client() {
    let backend = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let backend_addr = backend.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut stream, _) = backend.accept().await.unwrap();
        read_request_head(&mut stream).await;
        stream
            .write_all(b"HTTP/1.1 403 Forbidden\r\nContent-Length: 0\r\n\r\n")
            .await
            .unwrap();
    });

    let target = TunnelTarget::from_url(&format!("http://{backend_addr}")).unwrap();
    let front = spawn_front(WebSocketTunnel::new(target)).await;

    let (status_line, _, _stream) = client_handshake(front).await;
    assert!(status_line.contains("502"), "got: {status_line}");
}

#[tokio::test]
async fn relay_carries_bytes_both_ways() {
    let backend = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let backend_addr = backend.local_addr().unwrap();

    let backend_task = tokio::spawn(async move {
        let (mut stream, _) = backend.accept().await.unwrap();
        let head = read_request_head(&mut stream).await;
        let head_text = String::from_utf8(head).unwrap();
        assert!(head_text.starts_with("GET /ws HTTP/1.1\r\n"));
        assert!(head_text.to_ascii_lowercase().contains("upgrade: websocket"));

        // The greeting rides in the same write as the handshake answer,
        // exercising the past-the-head leftover path.
        stream
            .write_all(
                b"HTTP/1.1 101 Switching Protocols\r\n\
                  Upgrade: websocket\r\nConnection: Upgrade\r\n\r\nhello",
            )
            .await
            .unwrap();

        let mut ping = [0u8; 4];
        stream.read_exact(&mut ping).await.unwrap();
        assert_eq!(&ping, b"ping");
        stream.write_all(b"pong").await.unwrap();

        // Wait for the client to hang up; the relay must propagate it.
        let mut rest = Vec::new();
        stream.read_to_end(&mut rest).await.unwrap();
        assert!(rest.is_empty());
    });

    let target = TunnelTarget::from_url(&format!("http://{backend_addr}")).unwrap();
    let front = spawn_front(WebSocketTunnel::new(target)).await;

    let (status_line, mut leftover, mut stream) = client_handshake(front).await;
    assert!(status_line.contains("101"), "got: {status_line}");

    while leftover.len() < 5 {
        let mut chunk = [0u8; 64];
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0);
        leftover.extend_from_slice(&chunk[..n]);
    }
    assert_eq!(&leftover, b"hello");

    stream.write_all(b"ping").await.unwrap();
    let mut pong = [0u8; 4];
    stream.read_exact(&mut pong).await.unwrap();
    assert_eq!(&pong, b"pong");

    drop(stream);
    backend_task.await.unwrap();
}
