//! Actor Message Definitions
//!
//! ```text
//! FsActor --Changed--> Dispatcher --Css/Reload/Error--> WsActor
//! ```

use std::path::PathBuf;

use crate::report::Notification;

/// Messages to the Dispatcher
#[derive(Debug)]
pub enum DispatchMsg {
    /// Debounced source changes
    Changed(Vec<PathBuf>),
    Shutdown,
}

/// Messages to the WebSocket Actor
#[derive(Debug)]
pub enum WsMsg {
    /// Swap one stylesheet, `href` relative to the served root
    Css { href: String },
    /// Reload the page
    Reload { reason: String },
    /// Show the error overlay
    Error(Notification),
    /// Hide the error overlay
    ClearError,
    /// Client accepted by the WebSocket listener
    AddClient(std::net::TcpStream),
    Shutdown,
}
