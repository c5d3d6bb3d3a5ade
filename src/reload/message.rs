//! Live reload message protocol.
//!
//! JSON messages sent from the dev server to browser clients over
//! WebSocket, tagged by `type`:
//!
//! - `connected`: handshake finished
//! - `reload`: reload the page
//! - `css`: swap the stylesheet at `href` without reloading
//! - `error`: show the overlay
//! - `clear_error`: hide the overlay

use serde::{Deserialize, Serialize};

use crate::report::Notification;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReloadMessage {
    Connected {
        version: String,
    },

    Reload {
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    /// `href` is relative to the served root.
    Css {
        href: String,
    },

    Error {
        title: String,
        message: String,
    },

    ClearError,
}

impl ReloadMessage {
    pub fn connected() -> Self {
        Self::Connected {
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn reload_with_reason(reason: impl Into<String>) -> Self {
        Self::Reload {
            reason: Some(reason.into()),
        }
    }

    pub fn css(href: impl Into<String>) -> Self {
        Self::Css { href: href.into() }
    }

    pub fn error(notification: &Notification) -> Self {
        Self::Error {
            title: notification.title.clone(),
            message: notification.message.clone(),
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"reload"}"#.to_string())
    }

    #[cfg(test)]
    pub fn from_json(s: &str) -> Option<Self> {
        serde_json::from_str(s).ok()
    }
}
