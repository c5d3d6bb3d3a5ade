//! Live reload for the dev server.
//!
//! ```text
//! Dispatcher -> WsActor -> Browser (livereload.js)
//! ```
//!
//! - `message` - JSON messages understood by the client
//! - `server` - WebSocket listener that feeds new clients to the WsActor

pub mod message;
pub mod server;
