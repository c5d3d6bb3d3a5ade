//! Task error types.

use crate::config::ConfigError;
use crate::report::Notification;
use crate::utils::glob::WalkError;
use std::error::Error as StdError;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors returned by transformers and utility tasks.
#[derive(Debug, Error)]
pub enum TaskError {
    /// The project is not set up for this task (missing entry, bad config).
    #[error("{message}")]
    Setup { message: String },

    /// The sources failed to compile. Recoverable in watch mode.
    #[error("{0}")]
    Transform(Notification),

    #[error("IO error at `{0}`")]
    Io(PathBuf, #[source] io::Error),

    #[error(transparent)]
    Walk(#[from] WalkError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl TaskError {
    pub fn setup(message: impl Into<String>) -> Self {
        Self::Setup {
            message: message.into(),
        }
    }

    pub fn transform(title: &str, message: impl Into<String>) -> Self {
        Self::Transform(Notification::new(title, message))
    }

    /// `map_err` adapter attaching `path` to an I/O error.
    pub fn io(path: &Path) -> impl FnOnce(io::Error) -> Self + '_ {
        move |err| Self::Io(path.to_path_buf(), err)
    }

    /// Notification to show for this error.
    ///
    /// Transform errors carry their own; everything else is titled after
    /// the failing task.
    pub fn notification(&self, task: &str) -> Notification {
        match self {
            Self::Transform(n) => n.clone(),
            other => Notification::new(format!("{task} failed"), error_chain(other)),
        }
    }
}

/// Render an error with its `source()` chain, one cause per line.
pub fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push('\n');
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
