//! `[icons]` section configuration.
//!
//! ```toml
//! [icons]
//! watch = ["src/img/svg/*.svg"]
//! input = ["src/img/svg/*.svg"]
//! output = "dist/img/symbol"
//! bundle = "sprite.svg"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// SVG sprite settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IconsConfig {
    pub watch: Vec<String>,
    pub input: Vec<String>,
    pub output: PathBuf,
    pub bundle: String,
}

impl Default for IconsConfig {
    fn default() -> Self {
        Self {
            watch: super::patterns(&["src/img/svg/*.svg"]),
            input: super::patterns(&["src/img/svg/*.svg"]),
            output: "dist/img/symbol".into(),
            bundle: "sprite.svg".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::test_parse_config;

    #[test]
    fn test_icons_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.icons.bundle, "sprite.svg");
        assert_eq!(config.icons.input, config.icons.watch);
    }
}
