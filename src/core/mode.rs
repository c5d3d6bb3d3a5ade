//! Build mode: development vs production.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Build mode, chosen once per process and passed to every transformer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    /// Readable output, inline source maps, no minification.
    Development,
    /// Minified output without debug metadata.
    #[default]
    Production,
}

impl BuildMode {
    /// Check if this is development mode.
    #[inline]
    pub const fn is_dev(self) -> bool {
        matches!(self, Self::Development)
    }

    /// Whether outputs should be minified.
    #[inline]
    pub const fn minify(self) -> bool {
        matches!(self, Self::Production)
    }

    /// Lowercase name, as substituted for `process.env.NODE_ENV`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

impl std::fmt::Display for BuildMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
