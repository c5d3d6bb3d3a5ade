//! `[markup]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [markup]
//! watch = ["src/templates/**/*.html"]   # Every template, pages and partials
//! input = ["src/templates/pages/*.html"] # Pages rendered to <stem>.html
//! output = "dist"
//! pretty = true
//! indent = "  "
//!
//! [markup.data]
//! watch = ["src/data/**/*.json"]
//! file = "src/data/content.json"
//! variable = "sectionContent"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Template settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkupConfig {
    pub watch: Vec<String>,
    pub input: Vec<String>,
    pub output: PathBuf,
    /// Re-indent rendered HTML.
    pub pretty: bool,
    /// Indent unit used when `pretty` is set.
    pub indent: String,
    pub data: MarkupDataConfig,
}

impl Default for MarkupConfig {
    fn default() -> Self {
        Self {
            watch: super::patterns(&["src/templates/**/*.html"]),
            input: super::patterns(&["src/templates/pages/*.html"]),
            output: "dist".into(),
            pretty: true,
            indent: "  ".into(),
            data: MarkupDataConfig::default(),
        }
    }
}

/// JSON data exposed to every page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkupDataConfig {
    pub watch: Vec<String>,
    pub file: PathBuf,
    /// Template variable holding the parsed JSON.
    pub variable: String,
}

impl Default for MarkupDataConfig {
    fn default() -> Self {
        Self {
            watch: super::patterns(&["src/data/**/*.json"]),
            file: "src/data/content.json".into(),
            variable: "sectionContent".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::test_parse_config;
    use std::path::Path;

    #[test]
    fn test_markup_defaults() {
        let config = test_parse_config("");
        assert!(config.markup.pretty);
        assert_eq!(config.markup.output, Path::new("dist"));
        assert_eq!(config.markup.data.variable, "sectionContent");
    }

    #[test]
    fn test_markup_data_override() {
        let config = test_parse_config(
            "[markup]\npretty = false\n[markup.data]\nfile = \"data/site.json\"\nvariable = \"site\"",
        );
        assert!(!config.markup.pretty);
        assert_eq!(config.markup.data.file, Path::new("data/site.json"));
        assert_eq!(config.markup.data.variable, "site");
        // untouched field keeps its default
        assert_eq!(config.markup.data.watch, vec!["src/data/**/*.json"]);
    }
}
