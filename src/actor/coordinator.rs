//! Actor Coordinator - wires up the watch actors
//!
//! ```text
//! FsActor --> Dispatcher --> WsActor
//! (notify)    (tasks)       (broadcast)
//! ```
//!
//! Creates the channels, starts the WebSocket acceptor and runs the actors
//! until the shutdown signal fires or one of them stops.

use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, anyhow};
use crossbeam::channel::{Receiver, TryRecvError};
use tokio::sync::mpsc;

use super::dispatcher::{Dispatcher, WatchRules};
use super::fs::FsActor;
use super::messages::{DispatchMsg, WsMsg};
use super::ws::WsActor;
use crate::report::Notification;
use crate::task::{TaskName, TaskRunner};
use crate::transform::BuildContext;

/// Channel buffer size
const CHANNEL_BUFFER: usize = 32;

pub struct Coordinator {
    ctx: BuildContext,
    runner: Arc<dyn TaskRunner>,
    ws_listener: Option<TcpListener>,
    failed: Vec<(TaskName, Notification)>,
    shutdown_rx: Option<Receiver<()>>,
}

impl Coordinator {
    pub fn new(ctx: BuildContext, runner: Arc<dyn TaskRunner>) -> Self {
        Self {
            ctx,
            runner,
            ws_listener: None,
            failed: Vec::new(),
            shutdown_rx: None,
        }
    }

    pub fn with_ws_listener(mut self, listener: TcpListener) -> Self {
        self.ws_listener = Some(listener);
        self
    }

    /// Tasks that failed before the watcher started.
    pub fn with_failed(mut self, failed: Vec<(TaskName, Notification)>) -> Self {
        self.failed = failed;
        self
    }

    pub fn with_shutdown_signal(mut self, rx: Receiver<()>) -> Self {
        self.shutdown_rx = Some(rx);
        self
    }

    pub async fn run(self) -> Result<()> {
        let (dispatch_tx, dispatch_rx) = mpsc::channel::<DispatchMsg>(CHANNEL_BUFFER);
        let (ws_tx, ws_rx) = mpsc::channel::<WsMsg>(CHANNEL_BUFFER);

        if let Some(listener) = self.ws_listener {
            crate::reload::server::spawn_acceptor(listener, ws_tx.clone())?;
        }

        let rules = WatchRules::from_config(&self.ctx.config)?;
        let roots = rules.roots();
        for root in &roots {
            crate::debug!("watch"; "{}", self.ctx.config.root_relative(root).display());
        }

        let fs = FsActor::new(roots, dispatch_tx.clone())
            .map_err(|e| anyhow!("watcher failed: {}", e))?;
        let dispatcher = Dispatcher::new(dispatch_rx, ws_tx.clone(), rules, self.ctx, self.runner)
            .with_failed(self.failed);
        let ws = WsActor::new(ws_rx);

        crate::log!("watch"; "watching for changes");

        let fs_handle = tokio::spawn(fs.run());
        let dispatch_handle = tokio::spawn(dispatcher.run());
        let ws_handle = tokio::spawn(ws.run());

        match self.shutdown_rx {
            Some(rx) => {
                while let Err(TryRecvError::Empty) = rx.try_recv() {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
                crate::debug!("actor"; "shutdown signal received");
            }
            None => {
                tokio::select! {
                    _ = fs_handle => {}
                    _ = ws_handle => {}
                }
            }
        }

        let _ = dispatch_tx.send(DispatchMsg::Shutdown).await;
        let _ = ws_tx.send(WsMsg::Shutdown).await;
        // A transformer may still be running on the blocking pool
        let _ = tokio::time::timeout(Duration::from_millis(500), dispatch_handle).await;

        crate::debug!("actor"; "stopped");
        Ok(())
    }
}
