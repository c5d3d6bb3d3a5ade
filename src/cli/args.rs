//! Command-line interface definitions.

use crate::core::BuildMode;
use crate::task::TaskName;
use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Front-end asset pipeline with a live-reload dev server
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
#[command(disable_version_flag = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file, searched upward from the current directory
    #[arg(short = 'C', long, global = true, default_value = "kiln.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Override `[build] mode`
    #[arg(short, long, global = true, value_enum)]
    pub mode: Option<BuildMode>,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long, global = true)]
    pub verbose: bool,

    /// Print version
    #[arg(long, action = clap::ArgAction::Version)]
    version: Option<bool>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available tasks
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Remove every output directory
    Clean,

    /// Generate the grid partial from `[grid]`
    Grid,

    /// Compile, prefix and bundle stylesheets
    #[command(visible_alias = "css")]
    Styles,

    /// Remove the image cache
    #[command(visible_alias = "clear")]
    ClearCache,

    /// Build the SVG sprite
    #[command(visible_alias = "svg")]
    Icons,

    /// Render page templates
    #[command(visible_alias = "pug")]
    Markup,

    /// Bundle scripts
    #[command(visible_alias = "js")]
    Scripts,

    /// Copy fonts and images
    Static,

    /// Run every task in dependency order
    Build,

    /// Serve the output directory and rebuild on change
    Server,

    /// Build, then serve and rebuild on change
    Watch,
}

impl Commands {
    pub const fn task(self) -> TaskName {
        match self {
            Self::Clean => TaskName::Clean,
            Self::Grid => TaskName::Grid,
            Self::Styles => TaskName::Styles,
            Self::ClearCache => TaskName::ClearCache,
            Self::Icons => TaskName::Icons,
            Self::Markup => TaskName::Markup,
            Self::Scripts => TaskName::Scripts,
            Self::Static => TaskName::Static,
            Self::Build => TaskName::Build,
            Self::Server => TaskName::Server,
            Self::Watch => TaskName::Watch,
        }
    }
}
