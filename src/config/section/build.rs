//! `[build]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [build]
//! mode = "development"        # "development" | "production"
//! output = "dist"             # Output root, served by the dev server
//! cache = ".kiln/cache"       # Image optimization cache
//! browsers = ["> 0.5%", "last 2 versions", "not dead"]
//! ```

use crate::core::BuildMode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Global build settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Build mode, fixed for the whole run.
    pub mode: BuildMode,

    /// Output root directory.
    pub output: PathBuf,

    /// On-disk cache directory (removed by `clear-cache`).
    pub cache: PathBuf,

    /// Browserslist queries used for vendor prefixing.
    pub browsers: Vec<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            mode: BuildMode::Production,
            output: "dist".into(),
            cache: ".kiln/cache".into(),
            browsers: super::patterns(&["> 0.5%", "last 2 versions", "not dead"]),
        }
    }
}
