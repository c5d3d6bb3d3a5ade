//! User-facing failure reports.
//!
//! Transformers return a [`Notification`] inside `TaskError::Transform`;
//! how it is shown is up to the [`Reporter`] sinks subscribed by the caller.
//! One-shot builds use the terminal, watch mode adds the browser overlay.

use serde::{Deserialize, Serialize};

/// Title and message describing a recoverable task failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}

/// Sink for failure notifications.
pub trait Reporter: Send + Sync {
    fn report(&self, notification: &Notification);

    /// Called on the first success after a reported failure.
    fn resolved(&self) {}
}

/// Prints notifications through the watch status block.
pub struct TerminalReporter;

impl Reporter for TerminalReporter {
    fn report(&self, notification: &Notification) {
        crate::logger::status_error(&notification.title, &notification.message);
    }
}

/// Fans a notification out to several sinks.
#[derive(Default)]
pub struct Reporters {
    sinks: Vec<Box<dyn Reporter>>,
}

impl Reporters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl Reporter + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }
}

impl Reporter for Reporters {
    fn report(&self, notification: &Notification) {
        for sink in &self.sinks {
            sink.report(notification);
        }
    }

    fn resolved(&self) {
        for sink in &self.sinks {
            sink.resolved();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<String>>>);

    impl Reporter for Recorder {
        fn report(&self, n: &Notification) {
            self.0.lock().push(n.title.clone());
        }

        fn resolved(&self) {
            self.0.lock().push("resolved".into());
        }
    }

    #[test]
    fn test_reporters_fan_out() {
        let a = Recorder::default();
        let b = Recorder::default();
        let reporters = Reporters::new().with(a.clone()).with(b.clone());

        reporters.report(&Notification::new("Styles Error", "expected \";\""));
        reporters.resolved();

        assert_eq!(*a.0.lock(), vec!["Styles Error", "resolved"]);
        assert_eq!(*b.0.lock(), vec!["Styles Error", "resolved"]);
    }

    #[test]
    fn test_notification_display() {
        let n = Notification::new("Icons Error", "unexpected end of file");
        assert_eq!(n.to_string(), "Icons Error: unexpected end of file");
    }
}
