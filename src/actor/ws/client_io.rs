use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tungstenite::WebSocket;
use tungstenite::protocol::Message;

use super::WsActor;
use crate::reload::message::ReloadMessage;

impl WsActor {
    /// Finish the handshake, greet the client and replay a pending error.
    pub(super) fn add_client(&self, stream: TcpStream) {
        let mut ws = match tungstenite::accept(stream) {
            Ok(ws) => ws,
            Err(e) => {
                crate::log!("ws"; "handshake failed: {}", e);
                return;
            }
        };
        // Reads are polled by the reader thread
        let _ = ws.get_ref().set_nonblocking(true);

        let mut greeting = vec![ReloadMessage::connected()];
        if let Some(error) = &self.pending_error {
            greeting.push(ReloadMessage::error(error));
        }
        for msg in greeting {
            if let Err(e) = ws.send(Message::Text(msg.to_json().into())) {
                crate::log!("ws"; "failed to greet client: {}", e);
                return;
            }
        }

        let mut clients = self.clients.lock();
        clients.push(ws);
        crate::debug!("ws"; "client connected (total: {})", clients.len());
    }
}

/// Drain client frames so pings get answered and closed sockets dropped.
pub(super) fn reader_loop(clients: Arc<Mutex<Vec<WebSocket<TcpStream>>>>) {
    loop {
        std::thread::sleep(Duration::from_millis(100));
        if crate::core::is_shutdown() {
            break;
        }

        clients.lock().retain_mut(|ws| match ws.read() {
            Ok(Message::Close(_)) => false,
            Ok(_) => true,
            Err(tungstenite::Error::Io(ref e)) if e.kind() == std::io::ErrorKind::WouldBlock => {
                true
            }
            Err(_) => false,
        });
    }
}
