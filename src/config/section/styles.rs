//! `[styles]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [styles]
//! watch = ["src/scss/**/*.scss"]
//! input = ["src/scss/style.scss"]   # Entry points, compiled in order
//! output = "dist/css"
//! bundle = "bundle.css"             # Concatenated file name
//! suffix = ".min"                   # Inserted before the extension
//! load_paths = []                   # Extra @use/@import search paths
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Stylesheet settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StylesConfig {
    pub watch: Vec<String>,
    pub input: Vec<String>,
    pub output: PathBuf,
    pub bundle: String,
    pub suffix: String,
    pub load_paths: Vec<PathBuf>,
}

impl Default for StylesConfig {
    fn default() -> Self {
        Self {
            watch: super::patterns(&["src/scss/**/*.scss"]),
            input: super::patterns(&["src/scss/style.scss"]),
            output: "dist/css".into(),
            bundle: "bundle.css".into(),
            suffix: ".min".into(),
            load_paths: Vec::new(),
        }
    }
}

impl StylesConfig {
    /// Final file name: `bundle.css` + `.min` -> `bundle.min.css`.
    pub fn file_name(&self) -> String {
        match self.bundle.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => format!("{stem}{}.{ext}", self.suffix),
            _ => format!("{}{}", self.bundle, self.suffix),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::test_parse_config;

    #[test]
    fn test_styles_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.styles.input, vec!["src/scss/style.scss"]);
        assert_eq!(config.styles.file_name(), "bundle.min.css");
    }

    #[test]
    fn test_styles_file_name_variants() {
        let config = test_parse_config("[styles]\nbundle = \"app.css\"\nsuffix = \"\"");
        assert_eq!(config.styles.file_name(), "app.css");

        let config = test_parse_config("[styles]\nbundle = \"app\"");
        assert_eq!(config.styles.file_name(), "app.min");
    }
}
