//! Tasks, their dependency graph and the orchestrator that runs them.
//!
//! ```text
//! TaskName ──► TaskGraph::order() ──► Orchestrator ──► TaskRunner
//!                                         │
//!                                         └──► dev server (watch / server)
//! ```

mod graph;
mod orchestrator;

pub use graph::TaskGraph;
pub use orchestrator::{Orchestrator, TaskFailure, TaskRunner};

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Every task the CLI accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TaskName {
    Clean,
    Grid,
    Styles,
    ClearCache,
    Icons,
    Markup,
    Scripts,
    Static,
    Build,
    Server,
    Watch,
}

impl TaskName {
    /// Tasks that run a single transformer or utility.
    pub const ACTIONS: [TaskName; 8] = [
        Self::Clean,
        Self::Grid,
        Self::Styles,
        Self::ClearCache,
        Self::Icons,
        Self::Markup,
        Self::Scripts,
        Self::Static,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Clean => "clean",
            Self::Grid => "grid",
            Self::Styles => "styles",
            Self::ClearCache => "clear-cache",
            Self::Icons => "icons",
            Self::Markup => "markup",
            Self::Scripts => "scripts",
            Self::Static => "static",
            Self::Build => "build",
            Self::Server => "server",
            Self::Watch => "watch",
        }
    }

    /// Legacy names still accepted on the command line.
    pub const fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Styles => &["css"],
            Self::ClearCache => &["clear"],
            Self::Icons => &["svg"],
            Self::Markup => &["pug"],
            Self::Scripts => &["js"],
            _ => &[],
        }
    }

    pub const fn is_action(self) -> bool {
        !matches!(self, Self::Build | Self::Server | Self::Watch)
    }
}

impl fmt::Display for TaskName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown task `{0}`")]
pub struct UnknownTask(pub String);

impl FromStr for TaskName {
    type Err = UnknownTask;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ACTIONS
            .into_iter()
            .chain([Self::Build, Self::Server, Self::Watch])
            .find(|task| task.as_str() == s || task.aliases().contains(&s))
            .ok_or_else(|| UnknownTask(s.to_string()))
    }
}
