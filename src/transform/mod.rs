//! Asset transformers and utility tasks.
//!
//! Every task has the same shape: `fn run(ctx: &BuildContext) ->
//! Result<TaskReport, TaskError>`. Transformers read their sources, run a
//! [`Pipeline`](crate::pipeline::Pipeline) in memory and emit the result.
//!
//! | Module         | Task          | Output                         |
//! |----------------|---------------|--------------------------------|
//! | `clean`        | `clean`       | removes every output directory |
//! | `grid`         | `grid`        | `src/scss/helpers/grid.scss`   |
//! | `styles`       | `styles`      | `dist/css/bundle.min.css`      |
//! | `cache`        | `clear-cache` | removes `.kiln/cache`          |
//! | `icons`        | `icons`       | `dist/img/symbol/sprite.svg`   |
//! | `markup`       | `markup`      | `dist/*.html`                  |
//! | `scripts`      | `scripts`     | `dist/js/bundle.min.js`        |
//! | `static_files` | `static`      | `dist/fonts`, `dist/img`       |

pub mod cache;
pub mod clean;
mod error;
pub mod grid;
pub mod icons;
pub mod markup;
pub mod minify;
pub mod scripts;
pub mod static_files;
pub mod styles;

pub use error::{TaskError, error_chain};

use crate::config::KilnConfig;
use crate::core::BuildMode;
use std::path::PathBuf;
use std::sync::Arc;

/// Everything a task needs, passed explicitly.
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub config: Arc<KilnConfig>,
    pub mode: BuildMode,
}

impl BuildContext {
    /// Context using the configured `[build] mode`.
    pub fn new(config: Arc<KilnConfig>) -> Self {
        let mode = config.build.mode;
        Self { config, mode }
    }

    pub fn with_mode(mut self, mode: BuildMode) -> Self {
        self.mode = mode;
        self
    }
}

/// How connected browsers should pick up a task's output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reload {
    /// Swap the stylesheet at `href` (relative to the served root).
    Css { href: String },
    /// Reload the page.
    Page,
    /// Nothing served changed.
    None,
}

/// Result of a successful task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReport {
    pub outputs: Vec<PathBuf>,
    pub reload: Reload,
}

impl TaskReport {
    pub fn page(outputs: Vec<PathBuf>) -> Self {
        Self {
            outputs,
            reload: Reload::Page,
        }
    }

    pub fn silent(outputs: Vec<PathBuf>) -> Self {
        Self {
            outputs,
            reload: Reload::None,
        }
    }
}
