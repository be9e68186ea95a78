//! Development server over the asset servlet.
//!
//! Requests are dispatched on a small thread pool; each one is matched
//! against the servlet's URL patterns, resolved through the resolution cache
//! and answered with `Content-Type`, `Last-Modified` and the configured
//! `Cache-Control` header.

mod lifecycle;
mod response;

pub use lifecycle::{is_shutdown, setup_shutdown_handler};

use super::common::build_servlet;
use crate::{
    asset::AssetServlet,
    config::AppConfig,
    debug, log,
    utils::{mime::MimeTable, path::normalize_url},
};
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tiny_http::{Request, Server};

/// Number of request worker threads.
const WORKERS: usize = 4;

/// State shared by request workers.
struct ServeContext {
    servlet: AssetServlet,
    mime: MimeTable,
}

/// Bound server ready to accept requests
pub struct BoundServer {
    server: Arc<Server>,
    addr: SocketAddr,
    context: Arc<ServeContext>,
}

/// Build the servlet and bind the HTTP server without starting the loop.
pub fn bind_server(config: &AppConfig) -> Result<BoundServer> {
    let servlet = build_servlet(config)?;

    let mut mime = MimeTable::new();
    servlet.register_mime_types(&mut mime);
    if !mime.is_empty() {
        debug!("serve"; "registered {} mime types", mime.len());
    }
    for (name, value) in servlet.init_parameters() {
        debug!("serve"; "{} = {}", name, value);
    }

    let (server, addr) = lifecycle::bind_with_retry(config.serve.interface, config.serve.port)?;
    let server = Arc::new(server);
    lifecycle::register_server(Arc::clone(&server));

    log!("serve"; "http://{}", addr);

    Ok(BoundServer {
        server,
        addr,
        context: Arc::new(ServeContext { servlet, mime }),
    })
}

/// Bind and serve until Ctrl+C.
pub fn serve(config: &AppConfig) -> Result<()> {
    bind_server(config)?.run()
}

impl BoundServer {
    /// Get the bound address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Start the request loop (blocking).
    pub fn run(self) -> Result<()> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(WORKERS)
            .build()
            .context("failed to create thread pool")?;

        for request in self.server.incoming_requests() {
            let context = Arc::clone(&self.context);
            pool.spawn(move || {
                if let Err(e) = handle_request(request, &context) {
                    log!("serve"; "request error: {e}");
                }
            });
        }

        let stats = self.context.servlet.stats();
        debug!(
            "cache";
            "hits {}, misses {}, loads {}, evictions {}",
            stats.hits, stats.misses, stats.loads, stats.evictions
        );
        Ok(())
    }
}

/// Handle a single HTTP request
fn handle_request(request: Request, context: &ServeContext) -> Result<()> {
    if is_shutdown() {
        return response::respond_unavailable(request);
    }

    if !response::is_get_or_head(&request) {
        return response::respond_method_not_allowed(request);
    }

    let Some(path) = normalize_url(request.url()) else {
        return response::respond_not_found(request);
    };

    if !context.servlet.handles(&path) {
        debug!("serve"; "404 {} (no mapping)", path);
        return response::respond_not_found(request);
    }

    match context.servlet.get_resource(&path) {
        Some(resource) => {
            debug!("serve"; "200 {} <- {}", path, resource.origin());
            response::respond_resource(
                request,
                &path,
                &resource,
                &context.mime,
                context.servlet.config().cache_control_header.as_deref(),
            )
        }
        None => {
            debug!("serve"; "404 {}", path);
            response::respond_not_found(request)
        }
    }
}
