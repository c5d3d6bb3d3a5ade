//! Development server with live reload.
//!
//! Serves `[build] output` over HTTP while the watch actors rebuild changed
//! sources on a separate runtime. HTML responses get the live reload client
//! injected.

mod content;
mod lifecycle;
mod path;
mod response;

use crate::actor::Coordinator;
use crate::core::{is_shutdown, register_server};
use crate::embed::serve::LIVERELOAD_URL;
use crate::report::Notification;
use crate::task::{TaskName, TaskRunner};
use crate::transform::BuildContext;
use crate::{debug, log};
use anyhow::Result;
use crossbeam::channel;
use std::path::PathBuf;
use std::sync::Arc;
use tiny_http::{Method, Request, Server};

/// What a request handler needs.
#[derive(Debug, Clone)]
pub struct Site {
    /// Served directory
    pub root: PathBuf,
    /// Port the live reload client connects to
    pub ws_port: u16,
}

/// Serve until Ctrl+C, rebuilding on change.
///
/// `failed` are tasks that failed in the preceding build, with their errors;
/// the browser overlay shows them until all of them succeed again.
pub fn run(
    ctx: BuildContext,
    runner: Arc<dyn TaskRunner>,
    failed: Vec<(TaskName, Notification)>,
) -> Result<()> {
    let config = Arc::clone(&ctx.config);
    let serve = &config.serve;

    let (ws_listener, ws_port) = crate::reload::server::bind(serve.interface, serve.ws_port)?;
    let (server, addr) = lifecycle::bind_with_retry(serve.interface, serve.port)?;
    let server = Arc::new(server);

    let (shutdown_tx, shutdown_rx) = channel::unbounded::<()>();
    register_server(Arc::clone(&server), shutdown_tx);

    log!("serve"; "http://{}", addr);
    debug!("serve"; "live reload on port {}", ws_port);

    let coordinator = Coordinator::new(ctx, runner)
        .with_ws_listener(ws_listener)
        .with_failed(failed)
        .with_shutdown_signal(shutdown_rx);
    let actors = lifecycle::spawn_actors(coordinator);

    let site = Site {
        root: config.build.output.clone(),
        ws_port,
    };
    run_request_loop(&server, site)?;

    lifecycle::wait_for_shutdown(actors);
    Ok(())
}

fn run_request_loop(server: &Server, site: Site) -> Result<()> {
    let pool = rayon::ThreadPoolBuilder::new().num_threads(4).build()?;
    let site = Arc::new(site);

    for request in server.incoming_requests() {
        let site = Arc::clone(&site);
        pool.spawn(move || {
            if let Err(e) = handle_request(request, &site) {
                log!("serve"; "request error: {e}");
            }
        });
    }
    Ok(())
}

fn handle_request(request: Request, site: &Site) -> Result<()> {
    if is_shutdown() {
        return response::respond_unavailable(request);
    }
    if !matches!(request.method(), Method::Get | Method::Head) {
        return response::respond_method_not_allowed(request);
    }

    debug!("serve"; "{} {}", request.method(), request.url());

    if path::url_path(request.url()) == LIVERELOAD_URL {
        return response::respond_livereload_js(request, site.ws_port);
    }

    match path::resolve_path(request.url(), &site.root) {
        Some(file) => response::respond_file(request, &file),
        None => response::respond_not_found(request, &site.root),
    }
}
