use doorman::config::{AppState, Config};
use doorman::handler;
use doorman::logger;
use doorman::vfs::DiskRoot;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use socket2::{Domain, Protocol, Socket, Type};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = Config::load()?;
    logger::init(&cfg)?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.socket_addr()?;
    let listener = create_reusable_listener(addr)?;

    logger::log_server_start(&addr, &cfg);

    let state = Arc::new(AppState::from_config(cfg)?);
    let active_connections = Arc::new(AtomicUsize::new(0));

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections);
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                logger::log_shutdown();
                break;
            }
        }
    }

    Ok(())
}

/// Accept one connection, enforcing the optional connection limit.
fn accept_connection(
    stream: tokio::net::TcpStream,
    peer_addr: std::net::SocketAddr,
    state: &Arc<AppState<DiskRoot>>,
    active_connections: &Arc<AtomicUsize>,
) {
    // Increment first, then check the limit, so two racing accepts cannot
    // both slip under it.
    let prev_count = active_connections.fetch_add(1, Ordering::SeqCst);
    if let Some(max_connections) = state.config.performance.max_connections {
        if prev_count as u64 >= max_connections {
            active_connections.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_connections}. Connection rejected."
            ));
            drop(stream);
            return;
        }
    }

    if state.config.logging.access_log {
        logger::log_connection_accepted(&peer_addr);
    }

    handle_connection(stream, Arc::clone(state), Arc::clone(active_connections));
}

/// Serve one connection in a spawned task.
///
/// Upgrades stay enabled so the tunnel can take over the raw transport,
/// and no connection deadline is applied: a relay session may legitimately
/// sit idle for as long as both sides keep it open.
fn handle_connection(
    stream: tokio::net::TcpStream,
    state: Arc<AppState<DiskRoot>>,
    active_connections: Arc<AtomicUsize>,
) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);

        let mut builder = http1::Builder::new();
        builder.keep_alive(state.config.performance.keep_alive_timeout > 0);

        let service_state = Arc::clone(&state);
        let conn = builder
            .serve_connection(
                io,
                service_fn(move |req| handler::handle_request(req, Arc::clone(&service_state))),
            )
            .with_upgrades();

        if let Err(err) = conn.await {
            logger::log_connection_error(&err);
        }

        active_connections.fetch_sub(1, Ordering::SeqCst);
    });
}

/// Create a `TcpListener` with `SO_REUSEPORT` and `SO_REUSEADDR` enabled,
/// so a replacement process can bind while sockets linger in TIME_WAIT.
fn create_reusable_listener(addr: std::net::SocketAddr) -> std::io::Result<TcpListener> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_port(true)?;
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(128)?;

    let std_listener: std::net::TcpListener = socket.into();
    TcpListener::from_std(std_listener)
}
