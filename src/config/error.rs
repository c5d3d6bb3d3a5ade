//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config file parsing error")]
    Toml(#[from] toml::de::Error),

    #[error("invalid glob pattern in `{field}`")]
    Glob {
        field: String,
        #[source]
        source: globset::Error,
    },

    #[error("Config validation error: {0}")]
    Validation(String),
}
