//! Fallback handler module
//!
//! The polymorphic handler set of the router: a file server with a
//! single-file fallback tier, a constant in-memory responder, and a
//! delegating server that hands misses to an injected secondary handler.
//! Every handler is immutable after construction and safely shared across
//! concurrent requests.

use crate::handler::resolver;
use crate::handler::router::RequestContext;
use crate::handler::serve::{read_all, serve_bytes};
use crate::http;
use crate::logger;
use crate::vfs::{Vfs, VfsFile};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::future::Future;
use std::sync::Arc;
use std::time::SystemTime;

/// A request handler producing a complete response
pub trait RequestHandler: Send + Sync {
    fn serve(
        &self,
        ctx: &RequestContext<'_>,
    ) -> impl Future<Output = Response<Full<Bytes>>> + Send;
}

/// Static file server with a single-file fallback tier.
///
/// Resolves the request path against the filesystem root; on a miss, opens
/// and stats the configured fallback path and serves it with its own name
/// and modification time. When the fallback itself is unusable the terminal
/// plain-text 500 is returned. Without a configured fallback a miss is a
/// plain 404.
pub struct FallbackFileHandler<F> {
    fs: Arc<F>,
    index_file: String,
    fallback: Option<String>,
}

impl<F: Vfs> FallbackFileHandler<F> {
    pub fn new(fs: Arc<F>, index_file: impl Into<String>, fallback: Option<String>) -> Self {
        Self {
            fs,
            index_file: index_file.into(),
            fallback: fallback.map(|p| resolver::clean_path(&p)),
        }
    }

    async fn serve_fallback(&self, ctx: &RequestContext<'_>) -> Response<Full<Bytes>> {
        let Some(fallback_path) = self.fallback.as_deref() else {
            return http::build_404_response();
        };

        // The fallback is served as-is: no resolution, its own metadata
        // drives the caching headers.
        let served = async {
            let file = self.fs.open(fallback_path).await.ok()?;
            let meta = file.stat().await.ok()?;
            let data = read_all(file, &meta).await?;
            Some(serve_bytes(ctx, data, &meta.name, meta.modified, None))
        }
        .await;

        served.unwrap_or_else(|| {
            logger::log_error(&format!(
                "Fallback '{fallback_path}' could not be served for '{}'",
                ctx.path
            ));
            http::build_fallback_failure_response()
        })
    }
}

impl<F: Vfs> RequestHandler for FallbackFileHandler<F> {
    async fn serve(&self, ctx: &RequestContext<'_>) -> Response<Full<Bytes>> {
        if let Some((file, meta)) = resolver::resolve(&*self.fs, ctx.path, &self.index_file).await
        {
            if let Some(data) = read_all(file, &meta).await {
                return serve_bytes(ctx, data, &meta.name, meta.modified, None);
            }
        }
        self.serve_fallback(ctx).await
    }
}

/// Constant responder: serves one fixed content stream for every request,
/// never consulting a filesystem. Conditional GET and range negotiation
/// still apply to the fixed bytes.
pub struct FallbackContentHandler {
    data: Bytes,
    name: String,
    content_type: Option<String>,
    modified: Option<SystemTime>,
}

impl FallbackContentHandler {
    pub fn new(
        data: impl Into<Bytes>,
        name: impl Into<String>,
        content_type: Option<String>,
        modified: Option<SystemTime>,
    ) -> Self {
        Self {
            data: data.into(),
            name: name.into(),
            content_type,
            modified,
        }
    }
}

impl RequestHandler for FallbackContentHandler {
    async fn serve(&self, ctx: &RequestContext<'_>) -> Response<Full<Bytes>> {
        serve_bytes(
            ctx,
            self.data.clone(),
            &self.name,
            self.modified,
            self.content_type.as_deref(),
        )
    }
}

/// File server that delegates misses to an injected secondary handler,
/// e.g. an application entry-point responder for client-side routing.
pub struct NotFoundDelegatingHandler<F, H> {
    fs: Arc<F>,
    index_file: String,
    not_found: H,
}

impl<F: Vfs, H: RequestHandler> NotFoundDelegatingHandler<F, H> {
    pub fn new(fs: Arc<F>, index_file: impl Into<String>, not_found: H) -> Self {
        Self {
            fs,
            index_file: index_file.into(),
            not_found,
        }
    }
}

impl<F: Vfs, H: RequestHandler> RequestHandler for NotFoundDelegatingHandler<F, H> {
    async fn serve(&self, ctx: &RequestContext<'_>) -> Response<Full<Bytes>> {
        if let Some((file, meta)) = resolver::resolve(&*self.fs, ctx.path, &self.index_file).await
        {
            if let Some(data) = read_all(file, &meta).await {
                return serve_bytes(ctx, data, &meta.name, meta.modified, None);
            }
        }
        self.not_found.serve(ctx).await
    }
}
