//! Project configuration management for `kiln.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/   # One file per TOML section
//! ├── error      # ConfigError
//! ├── util       # Config file discovery
//! └── mod.rs     # KilnConfig (this file)
//! ```
//!
//! Every field is optional. Without a config file the defaults describe the
//! conventional `src/` → `dist/` layout and the cwd is the project root.

mod error;
pub mod section;
mod util;

pub use error::ConfigError;
pub use section::{
    Breakpoint, BuildConfig, GridConfig, IconsConfig, MarkupConfig, ScriptsConfig, ServeConfig,
    StaticConfig, StylesConfig,
};

use crate::core::BuildMode;
use crate::log;
use crate::utils::fs::normalize_path;
use crate::utils::glob::{PathSet, normalize_pattern};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use util::find_config_file;

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing kiln.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KilnConfig {
    /// Absolute path to the config file (may not exist)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory, parent of the config file
    #[serde(skip)]
    pub root: PathBuf,

    pub build: BuildConfig,
    pub styles: StylesConfig,
    pub markup: MarkupConfig,
    pub icons: IconsConfig,
    pub scripts: ScriptsConfig,
    #[serde(rename = "static")]
    pub static_files: StaticConfig,
    pub grid: GridConfig,
    pub serve: ServeConfig,
}

impl KilnConfig {
    /// Load configuration, searching upward from the cwd for `config_name`.
    ///
    /// `mode` overrides `[build] mode` when given.
    pub fn load(config_name: &Path, mode: Option<BuildMode>) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let mut config = match find_config_file(&cwd, config_name) {
            Some(path) => {
                let mut config = Self::from_path(&path)?;
                config.config_path = path;
                config
            }
            None => {
                crate::debug!("config"; "no {} found, using defaults", config_name.display());
                Self {
                    config_path: cwd.join(config_name),
                    ..Self::default()
                }
            }
        };

        if let Some(mode) = mode {
            config.build.mode = mode;
        }

        let root = config
            .config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or(cwd);
        let root = root.canonicalize().unwrap_or(root);
        config.finalize(&root);
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {field}");
        }
    }

    /// Set the root and make every configured directory absolute.
    ///
    /// Glob patterns stay relative to the root; they are compiled with
    /// [`KilnConfig::path_set`].
    pub fn finalize(&mut self, root: &Path) {
        let root = normalize_path(root);
        let abs = |p: &Path| normalize_path(&root.join(p));

        self.build.output = abs(&self.build.output);
        self.build.cache = abs(&self.build.cache);
        self.styles.output = abs(&self.styles.output);
        self.styles.load_paths = self.styles.load_paths.iter().map(|p| abs(p)).collect();
        self.markup.output = abs(&self.markup.output);
        self.markup.data.file = abs(&self.markup.data.file);
        self.icons.output = abs(&self.icons.output);
        self.scripts.input = abs(Path::new(normalize_pattern(
            &self.scripts.input.to_string_lossy(),
        )));
        self.scripts.output = abs(&self.scripts.output);
        self.static_files.fonts.output = abs(&self.static_files.fonts.output);
        self.static_files.images.output = abs(&self.static_files.images.output);
        self.grid.path = abs(&self.grid.path);

        self.root = root;
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        &self.root
    }

    /// Get path relative to the project root, for display.
    pub fn root_relative(&self, path: impl AsRef<Path>) -> PathBuf {
        path.as_ref()
            .strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.as_ref().to_path_buf())
    }

    /// Compile a list of patterns from the `field` config entry.
    pub fn path_set(&self, field: &str, patterns: &[String]) -> Result<PathSet, ConfigError> {
        PathSet::new(&self.root, patterns).map_err(|source| ConfigError::Glob {
            field: field.to_string(),
            source,
        })
    }

    /// Every glob list in the config, keyed by its field name.
    pub fn glob_fields(&self) -> Vec<(&'static str, &[String])> {
        vec![
            ("styles.watch", self.styles.watch.as_slice()),
            ("styles.input", self.styles.input.as_slice()),
            ("markup.watch", self.markup.watch.as_slice()),
            ("markup.input", self.markup.input.as_slice()),
            ("markup.data.watch", self.markup.data.watch.as_slice()),
            ("icons.watch", self.icons.watch.as_slice()),
            ("icons.input", self.icons.input.as_slice()),
            ("scripts.watch", self.scripts.watch.as_slice()),
            ("static.fonts.input", self.static_files.fonts.input.as_slice()),
            ("static.images.input", self.static_files.images.input.as_slice()),
        ]
    }

    /// Output directories of every asset class, keyed by field name.
    pub fn output_dirs(&self) -> Vec<(&'static str, &Path)> {
        vec![
            ("build.output", self.build.output.as_path()),
            ("styles.output", self.styles.output.as_path()),
            ("markup.output", self.markup.output.as_path()),
            ("icons.output", self.icons.output.as_path()),
            ("scripts.output", self.scripts.output.as_path()),
            ("static.fonts.output", self.static_files.fonts.output.as_path()),
            ("static.images.output", self.static_files.images.output.as_path()),
        ]
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate configuration, collecting every problem into one error.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, patterns) in self.glob_fields() {
            self.path_set(field, patterns)?;
        }

        let mut errors = Vec::new();

        for (field, name) in [
            ("styles.bundle", &self.styles.bundle),
            ("icons.bundle", &self.icons.bundle),
            ("scripts.bundle", &self.scripts.bundle),
            ("markup.data.variable", &self.markup.data.variable),
        ] {
            if name.trim().is_empty() {
                errors.push(format!("[{field}] must not be empty"));
            }
        }
        if matches!(&self.scripts.dev_bundle, Some(name) if name.trim().is_empty()) {
            errors.push("[scripts.dev_bundle] must not be empty".into());
        }

        for (field, dir) in self.output_dirs() {
            if self.root.starts_with(dir) {
                errors.push(format!(
                    "[{field}] `{}` would contain the project root",
                    dir.display()
                ));
            }
        }

        if !(1..=100).contains(&self.static_files.images.jpeg_quality) {
            errors.push("[static.images.jpeg_quality] must be between 1 and 100".into());
        }

        if oxc::transformer::TransformOptions::from_target(&self.scripts.target).is_err() {
            errors.push(format!(
                "[scripts.target] unknown target `{}`",
                self.scripts.target
            ));
        }

        self.grid.validate(&mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors.join("\n")))
        }
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config text. Panics on unknown fields to catch typos in tests.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> KilnConfig {
    let (parsed, ignored) = KilnConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

/// Parsed and finalized config rooted at `root`.
#[cfg(test)]
pub fn test_config_at(root: &Path, content: &str) -> KilnConfig {
    let mut config = test_parse_config(content);
    config.config_path = root.join("kiln.toml");
    config.finalize(root);
    config
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_invalid_toml() {
        let result: Result<KilnConfig, _> = toml::from_str("[build\nmode = \"production\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_fields_detected() {
        let content = "[styles]\nbundle = \"app.css\"\n[unknown_section]\nfield = \"value\"";
        let (config, ignored) = KilnConfig::parse_with_ignored(content).unwrap();

        assert_eq!(config.styles.bundle, "app.css");
        assert!(ignored.iter().any(|f| f.contains("unknown_section")));
    }

    #[test]
    fn test_static_section_name() {
        let (_, ignored) =
            KilnConfig::parse_with_ignored("[static.fonts]\noutput = \"public/fonts\"").unwrap();
        assert!(ignored.is_empty());
    }

    #[test]
    fn test_finalize_makes_paths_absolute() {
        let config = test_config_at(Path::new("/project"), "[scripts]\ninput = \"./src/js/app.js\"");

        assert_eq!(config.get_root(), Path::new("/project"));
        assert_eq!(config.build.output, Path::new("/project/dist"));
        assert_eq!(config.styles.output, Path::new("/project/dist/css"));
        assert_eq!(config.scripts.input, Path::new("/project/src/js/app.js"));
        assert_eq!(
            config.markup.data.file,
            Path::new("/project/src/data/content.json")
        );
        assert_eq!(config.grid.path, Path::new("/project/src/scss/helpers"));
    }

    #[test]
    fn test_validate_defaults_ok() {
        let config = test_config_at(Path::new("/project"), "");
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_collects_errors() {
        let config = test_config_at(
            Path::new("/project"),
            "[styles]\nbundle = \"\"\n[build]\noutput = \".\"\n[static.images]\njpeg_quality = 0",
        );
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("styles.bundle"));
        assert!(err.contains("build.output"));
        assert!(err.contains("jpeg_quality"));
    }

    #[test]
    fn test_validate_bad_glob() {
        let config = test_config_at(Path::new("/project"), "[icons]\ninput = [\"src/{a,b\"]");
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Glob { ref field, .. } if field == "icons.input"));
    }

    #[test]
    fn test_validate_bad_target() {
        let config = test_config_at(Path::new("/project"), "[scripts]\ntarget = \"es1999\"");
        assert!(config.validate().unwrap_err().to_string().contains("scripts.target"));
    }

    #[test]
    fn test_root_relative() {
        let config = test_config_at(Path::new("/project"), "");
        assert_eq!(
            config.root_relative(&config.styles.output),
            PathBuf::from("dist/css")
        );
    }
}
