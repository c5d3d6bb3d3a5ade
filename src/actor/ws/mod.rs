//! WebSocket Actor - live reload broadcast
//!
//! ```text
//! Dispatcher --[Css/Reload/Error]--> WsActor --[broadcast]--> Clients
//! ```
//!
//! The last unresolved error is kept and replayed to clients that connect
//! while it is showing, so a reload does not hide the overlay.

mod client_io;
mod delivery;

use std::net::TcpStream;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tungstenite::WebSocket;

use super::messages::WsMsg;
use crate::reload::message::ReloadMessage;
use crate::report::{Notification, Reporter};

pub struct WsActor {
    rx: mpsc::Receiver<WsMsg>,
    /// Connected clients (shared with the reader thread)
    clients: Arc<Mutex<Vec<WebSocket<TcpStream>>>>,
    /// Error replayed to new clients
    pending_error: Option<Notification>,
}

impl WsActor {
    pub fn new(rx: mpsc::Receiver<WsMsg>) -> Self {
        Self {
            rx,
            clients: Arc::new(Mutex::new(Vec::new())),
            pending_error: None,
        }
    }

    pub async fn run(mut self) {
        let clients = Arc::clone(&self.clients);
        std::thread::spawn(move || client_io::reader_loop(clients));

        while let Some(msg) = self.rx.recv().await {
            match msg {
                WsMsg::Css { href } => {
                    crate::debug!("ws"; "css {}", href);
                    self.broadcast(&ReloadMessage::css(href));
                }
                WsMsg::Reload { reason } => {
                    crate::debug!("ws"; "reload ({})", reason);
                    self.broadcast(&ReloadMessage::reload_with_reason(reason));
                }
                WsMsg::Error(notification) => {
                    self.broadcast(&ReloadMessage::error(&notification));
                    self.pending_error = Some(notification);
                }
                WsMsg::ClearError => {
                    self.pending_error = None;
                    self.broadcast(&ReloadMessage::ClearError);
                }
                WsMsg::AddClient(stream) => self.add_client(stream),
                WsMsg::Shutdown => {
                    crate::debug!("ws"; "shutting down");
                    for mut client in self.clients.lock().drain(..) {
                        let _ = client.close(None);
                    }
                    break;
                }
            }
        }
    }
}

/// Shows failures in the browser overlay.
pub struct OverlayReporter {
    tx: mpsc::Sender<WsMsg>,
}

impl OverlayReporter {
    pub fn new(tx: mpsc::Sender<WsMsg>) -> Self {
        Self { tx }
    }
}

impl Reporter for OverlayReporter {
    fn report(&self, notification: &Notification) {
        if self.tx.try_send(WsMsg::Error(notification.clone())).is_err() {
            crate::debug!("ws"; "overlay queue full, dropping error");
        }
    }

    fn resolved(&self) {
        if self.tx.try_send(WsMsg::ClearError).is_err() {
            crate::debug!("ws"; "overlay queue full, dropping clear");
        }
    }
}
