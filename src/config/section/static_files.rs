//! `[static]` section configuration.
//!
//! Files are copied keeping their path relative to the glob base.
//!
//! ```toml
//! [static.fonts]
//! input = ["src/fonts/**/*"]
//! output = "dist/fonts"
//!
//! [static.images]
//! input = ["src/img/**/*.{png,jpg,jpeg,gif}"]
//! output = "dist/img"
//! optimize = false       # Re-encode PNG/JPEG, keep the smaller file
//! jpeg_quality = 80
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticConfig {
    pub fonts: FontsConfig,
    pub images: ImagesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FontsConfig {
    pub input: Vec<String>,
    pub output: PathBuf,
}

impl Default for FontsConfig {
    fn default() -> Self {
        Self {
            input: super::patterns(&["src/fonts/**/*"]),
            output: "dist/fonts".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagesConfig {
    pub input: Vec<String>,
    pub output: PathBuf,
    pub optimize: bool,
    /// JPEG quality (1-100) used when optimizing.
    pub jpeg_quality: u8,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            input: super::patterns(&["src/img/**/*.{png,jpg,jpeg,gif}"]),
            output: "dist/img".into(),
            optimize: false,
            jpeg_quality: 80,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::test_parse_config;
    use std::path::Path;

    #[test]
    fn test_static_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.static_files.fonts.output, Path::new("dist/fonts"));
        assert!(!config.static_files.images.optimize);
        assert_eq!(config.static_files.images.jpeg_quality, 80);
    }

    #[test]
    fn test_static_images_optimize() {
        let config = test_parse_config("[static.images]\noptimize = true\njpeg_quality = 60");
        assert!(config.static_files.images.optimize);
        assert_eq!(config.static_files.images.jpeg_quality, 60);
    }
}
