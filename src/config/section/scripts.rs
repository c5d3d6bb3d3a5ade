//! `[scripts]` section configuration.
//!
//! ```toml
//! [scripts]
//! watch = ["src/js/**/*.js"]
//! input = "src/js/index.js"
//! output = "dist/js"
//! bundle = "bundle.min.js"
//! dev_bundle = "bundle.js"      # Optional, defaults to `bundle`
//! target = "es2015"
//! ```

use crate::core::BuildMode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Script bundle settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptsConfig {
    pub watch: Vec<String>,
    /// Entry module.
    pub input: PathBuf,
    pub output: PathBuf,
    pub bundle: String,
    pub dev_bundle: Option<String>,
    /// Syntax level project modules are lowered to.
    pub target: String,
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            watch: super::patterns(&["src/js/**/*.js"]),
            input: "src/js/index.js".into(),
            output: "dist/js".into(),
            bundle: "bundle.min.js".into(),
            dev_bundle: None,
            target: "es2015".into(),
        }
    }
}

impl ScriptsConfig {
    /// Output file name for `mode`.
    pub fn file_name(&self, mode: BuildMode) -> &str {
        match (mode, &self.dev_bundle) {
            (BuildMode::Development, Some(dev)) => dev,
            _ => &self.bundle,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::test_parse_config;
    use crate::core::BuildMode;

    #[test]
    fn test_scripts_file_name() {
        let config = test_parse_config("");
        assert_eq!(config.scripts.file_name(BuildMode::Production), "bundle.min.js");
        assert_eq!(config.scripts.file_name(BuildMode::Development), "bundle.min.js");

        let config = test_parse_config("[scripts]\ndev_bundle = \"bundle.js\"");
        assert_eq!(config.scripts.file_name(BuildMode::Production), "bundle.min.js");
        assert_eq!(config.scripts.file_name(BuildMode::Development), "bundle.js");
    }

    #[test]
    fn test_scripts_target() {
        let config = test_parse_config("[scripts]\ntarget = \"es2020\"");
        assert_eq!(config.scripts.target, "es2020");
    }
}
