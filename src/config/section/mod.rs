//! Configuration section definitions.
//!
//! Each module corresponds to a section in `kiln.toml`:
//!
//! | Module         | TOML Section   | Purpose                               |
//! |----------------|----------------|---------------------------------------|
//! | `build`        | `[build]`      | Mode, output root, cache, browsers    |
//! | `styles`       | `[styles]`     | Sass entries and CSS bundle           |
//! | `markup`       | `[markup]`     | Templates, pages and page data        |
//! | `icons`        | `[icons]`      | SVG icons and sprite                  |
//! | `scripts`      | `[scripts]`    | Script entry and bundle               |
//! | `static_files` | `[static]`     | Fonts and raster images               |
//! | `grid`         | `[grid]`       | Generated SCSS grid helpers           |
//! | `serve`        | `[serve]`      | Development server                    |

mod build;
mod grid;
mod icons;
mod markup;
mod scripts;
mod serve;
mod static_files;
mod styles;

pub use build::BuildConfig;
pub use grid::{Breakpoint, BreakpointConfig, ContainerConfig, GridConfig};
pub use icons::IconsConfig;
pub use markup::{MarkupConfig, MarkupDataConfig};
pub use scripts::ScriptsConfig;
pub use serve::ServeConfig;
pub use static_files::StaticConfig;
pub use styles::StylesConfig;

/// Convert a list of `&str` into owned patterns.
pub(crate) fn patterns(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}
