use tungstenite::protocol::Message;

use super::WsActor;
use crate::reload::message::ReloadMessage;

impl WsActor {
    /// Send to every client, dropping the ones that fail.
    pub(super) fn broadcast(&self, msg: &ReloadMessage) {
        let frame = Message::Text(msg.to_json().into());
        let mut clients = self.clients.lock();

        if clients.is_empty() {
            crate::debug!("ws"; "no clients connected");
            return;
        }

        clients.retain_mut(|ws| match ws.send(frame.clone()) {
            Ok(()) => true,
            Err(e) => {
                crate::debug!("ws"; "client disconnected: {}", e);
                false
            }
        });
        crate::debug!("ws"; "broadcast to {} clients", clients.len());
    }
}
