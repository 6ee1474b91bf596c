// Application state module
// Builds the immutable per-process state the request handlers share.

use super::types::{Config, RouteConfig};
use crate::handler::fallback::{
    FallbackContentHandler, FallbackFileHandler, NotFoundDelegatingHandler,
};
use crate::handler::router::Route;
use crate::tunnel::{TunnelTarget, WebSocketTunnel};
use crate::vfs::{DiskRoot, Vfs};
use std::io;
use std::path::Path;
use std::sync::Arc;

/// Application state: configuration, the mounted route table, and the
/// optional tunnel. Built once at startup, immutable afterwards, shared
/// across all concurrent requests.
pub struct AppState<F: Vfs> {
    pub config: Config,
    pub routes: Vec<(String, Route<F>)>,
    pub tunnel: Option<WebSocketTunnel>,
}

impl<F: Vfs> AppState<F> {
    #[must_use]
    pub fn new(
        config: Config,
        routes: Vec<(String, Route<F>)>,
        tunnel: Option<WebSocketTunnel>,
    ) -> Self {
        Self {
            config,
            routes,
            tunnel,
        }
    }
}

impl AppState<DiskRoot> {
    /// Build the runtime state from configuration: one disk root per
    /// mounted route, entry documents loaded into memory for the process
    /// lifetime, and the tunnel target derived from its backend URL.
    pub fn from_config(config: Config) -> io::Result<Self> {
        let index_file = config.routes.index_file.clone();
        let mut routes = Vec::with_capacity(config.routes.custom_routes.len());

        for (prefix, route) in &config.routes.custom_routes {
            let built = match route {
                RouteConfig::Files { root, fallback } => Route::Files(FallbackFileHandler::new(
                    Arc::new(DiskRoot::new(root)),
                    index_file.clone(),
                    fallback.clone(),
                )),
                RouteConfig::Spa {
                    root,
                    entry,
                    content_type,
                } => Route::Spa(NotFoundDelegatingHandler::new(
                    Arc::new(DiskRoot::new(root)),
                    index_file.clone(),
                    load_entry_document(entry, content_type.clone())?,
                )),
                RouteConfig::Content { file, content_type } => {
                    Route::Content(load_entry_document(file, content_type.clone())?)
                }
            };
            routes.push((prefix.clone(), built));
        }

        let tunnel = match &config.tunnel {
            Some(tunnel_config) => {
                let target = TunnelTarget::from_url(&tunnel_config.backend)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
                Some(WebSocketTunnel::new(target))
            }
            None => None,
        };

        Ok(Self::new(config, routes, tunnel))
    }
}

/// Load a fixed entry document into memory for the process lifetime
fn load_entry_document(
    path: &str,
    content_type: Option<String>,
) -> io::Result<FallbackContentHandler> {
    let data = std::fs::read(path)?;
    let modified = std::fs::metadata(path)?.modified().ok();
    let name = Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("index.html")
        .to_string();
    Ok(FallbackContentHandler::new(data, name, content_type, modified))
}
