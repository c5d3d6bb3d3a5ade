//! `[grid]` section configuration.
//!
//! Drives the generated SCSS grid helper file.
//!
//! # Example
//!
//! ```toml
//! [grid]
//! path = "src/scss/helpers"
//! filename = "grid"           # Written as grid.scss
//! columns = 12
//! offset = "30px"             # Gutter between columns
//! mobile_first = false        # true: ascending widths with min-width queries
//! tab = "  "
//!
//! [grid.container]
//! max_width = "1200px"
//! fields = "15px"             # Horizontal padding of the wrapper
//!
//! [grid.breakpoints]
//! xl = { width = "1439px" }
//! lg = { width = "1279px" }
//! ```

use crate::config::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub path: PathBuf,
    pub filename: String,
    pub columns: u32,
    pub offset: String,
    pub mobile_first: bool,
    pub tab: String,
    pub container: ContainerConfig,
    pub breakpoints: BTreeMap<String, BreakpointConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    pub max_width: String,
    pub fields: String,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            max_width: "1200px".into(),
            fields: "15px".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakpointConfig {
    pub width: String,
}

/// A validated breakpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Breakpoint {
    pub name: String,
    pub width: String,
    pub px: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        let breakpoints = [
            ("xl", "1439px"),
            ("lg", "1279px"),
            ("md", "991px"),
            ("sm", "767px"),
            ("xs", "575px"),
        ]
        .into_iter()
        .map(|(name, width)| {
            (
                name.to_string(),
                BreakpointConfig {
                    width: width.to_string(),
                },
            )
        })
        .collect();

        Self {
            path: "src/scss/helpers".into(),
            filename: "grid".into(),
            columns: 12,
            offset: "30px".into(),
            mobile_first: false,
            tab: "  ".into(),
            container: ContainerConfig::default(),
            breakpoints,
        }
    }
}

/// Parse a pixel length such as `991px` or `767.5px`.
pub fn parse_px(value: &str) -> Option<f64> {
    let number = value.trim().strip_suffix("px")?;
    let px: f64 = number.trim().parse().ok()?;
    (px.is_finite() && px > 0.0).then_some(px)
}

impl GridConfig {
    /// File name with the `.scss` extension.
    pub fn file_name(&self) -> String {
        format!("{}.scss", self.filename)
    }

    /// Breakpoints ordered by width: descending, or ascending when
    /// `mobile_first` is set. Equal widths keep name order.
    pub fn sorted_breakpoints(&self) -> Result<Vec<Breakpoint>, ConfigError> {
        let mut out = Vec::with_capacity(self.breakpoints.len());
        for (name, bp) in &self.breakpoints {
            let px = parse_px(&bp.width).ok_or_else(|| {
                ConfigError::Validation(format!(
                    "[grid.breakpoints.{name}] width `{}` is not a positive px length",
                    bp.width
                ))
            })?;
            out.push(Breakpoint {
                name: name.clone(),
                width: bp.width.trim().to_string(),
                px,
            });
        }

        if self.mobile_first {
            out.sort_by(|a, b| a.px.total_cmp(&b.px));
        } else {
            out.sort_by(|a, b| b.px.total_cmp(&a.px));
        }
        Ok(out)
    }

    pub(crate) fn validate(&self, errors: &mut Vec<String>) {
        if self.columns == 0 {
            errors.push("[grid] columns must be at least 1".into());
        }
        if self.filename.trim().is_empty() {
            errors.push("[grid] filename must not be empty".into());
        }
        if let Err(ConfigError::Validation(msg)) = self.sorted_breakpoints() {
            errors.push(msg);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_parse_px() {
        assert_eq!(parse_px("991px"), Some(991.0));
        assert_eq!(parse_px(" 767.5px "), Some(767.5));
        assert_eq!(parse_px("50%"), None);
        assert_eq!(parse_px("0px"), None);
        assert_eq!(parse_px("px"), None);
    }

    #[test]
    fn test_default_order_desktop_first() {
        let config = test_parse_config("");
        let names: Vec<_> = config
            .grid
            .sorted_breakpoints()
            .unwrap()
            .into_iter()
            .map(|b| b.name)
            .collect();
        assert_eq!(names, vec!["xl", "lg", "md", "sm", "xs"]);
    }

    #[test]
    fn test_mobile_first_order() {
        let config = test_parse_config("[grid]\nmobile_first = true");
        let names: Vec<_> = config
            .grid
            .sorted_breakpoints()
            .unwrap()
            .into_iter()
            .map(|b| b.name)
            .collect();
        assert_eq!(names, vec!["xs", "sm", "md", "lg", "xl"]);
    }

    #[test]
    fn test_custom_breakpoints_replace_defaults() {
        let config = test_parse_config(
            "[grid.breakpoints]\ntablet = { width = \"1024px\" }\nphone = { width = \"480px\" }",
        );
        let bps = config.grid.sorted_breakpoints().unwrap();
        assert_eq!(bps.len(), 2);
        assert_eq!(bps[0].name, "tablet");
        assert_eq!(bps[1].px, 480.0);
    }

    #[test]
    fn test_invalid_width() {
        let config = test_parse_config("[grid.breakpoints]\nmd = { width = \"wide\" }");
        let err = config.grid.sorted_breakpoints().unwrap_err();
        assert!(err.to_string().contains("grid.breakpoints.md"));
    }
}
