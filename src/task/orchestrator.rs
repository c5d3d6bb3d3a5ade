//! Runs a task, a build, or the dev server.
//!
//! - actions run alone, without their dependencies
//! - `build` runs the graph order and stops at the first failure
//! - `watch` builds, reporting failures instead of stopping, then serves
//! - `server` serves whatever is already in the output directory

use super::{TaskGraph, TaskName};
use crate::report::{Notification, Reporter, TerminalReporter};
use crate::transform::{self, BuildContext, TaskError, TaskReport};
use anyhow::Result;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Executes a single action.
///
/// The dev server dispatcher and the orchestrator share one runner, so tests
/// can swap the transformers for a recorder.
pub trait TaskRunner: Send + Sync {
    fn run(&self, task: TaskName, ctx: &BuildContext) -> Result<TaskReport, TaskError>;
}

/// Runner backed by the real transformers.
pub struct Transformers;

impl TaskRunner for Transformers {
    fn run(&self, task: TaskName, ctx: &BuildContext) -> Result<TaskReport, TaskError> {
        match task {
            TaskName::Clean => transform::clean::run(ctx),
            TaskName::Grid => transform::grid::run(ctx),
            TaskName::Styles => transform::styles::run(ctx),
            TaskName::ClearCache => transform::cache::run(ctx),
            TaskName::Icons => transform::icons::run(ctx),
            TaskName::Markup => transform::markup::run(ctx),
            TaskName::Scripts => transform::scripts::run(ctx),
            TaskName::Static => transform::static_files::run(ctx),
            TaskName::Build | TaskName::Server | TaskName::Watch => Err(TaskError::setup(
                format!("`{task}` is not a single action"),
            )),
        }
    }
}

/// A task failed; carries which one for reporting.
#[derive(Debug, Error)]
#[error("`{task}` failed")]
pub struct TaskFailure {
    pub task: TaskName,
    #[source]
    pub source: TaskError,
}

impl TaskFailure {
    pub fn notification(&self) -> Notification {
        self.source.notification(self.task.as_str())
    }

    pub fn report(&self, reporter: &dyn Reporter) {
        reporter.report(&self.notification());
    }
}

pub struct Orchestrator {
    ctx: BuildContext,
    graph: TaskGraph,
    runner: Arc<dyn TaskRunner>,
}

impl Orchestrator {
    pub fn new(ctx: BuildContext) -> Self {
        Self::with_runner(ctx, Arc::new(Transformers))
    }

    pub fn with_runner(ctx: BuildContext, runner: Arc<dyn TaskRunner>) -> Self {
        Self {
            ctx,
            graph: TaskGraph::standard(),
            runner,
        }
    }

    pub fn run(&self, task: TaskName) -> Result<()> {
        match task {
            TaskName::Build => {
                self.build()?;
            }
            TaskName::Watch => {
                let failed = self
                    .build_reporting(&TerminalReporter)?
                    .iter()
                    .map(|failure| (failure.task, failure.notification()))
                    .collect();
                self.serve(failed)?;
            }
            TaskName::Server => self.serve(Vec::new())?,
            action => {
                self.run_action(action)?;
            }
        }
        Ok(())
    }

    /// Run one action and log its duration.
    pub fn run_action(&self, task: TaskName) -> Result<TaskReport, TaskFailure> {
        let start = Instant::now();
        crate::debug!(task.as_str(); "starting ({})", self.ctx.mode);

        let report = self
            .runner
            .run(task, &self.ctx)
            .map_err(|source| TaskFailure { task, source })?;

        crate::log!(task.as_str(); "finished in {}ms", start.elapsed().as_millis());
        Ok(report)
    }

    /// Run the whole graph in order, stopping at the first failure.
    pub fn build(&self) -> Result<Vec<TaskReport>> {
        let start = Instant::now();
        let mut reports = Vec::new();
        for task in self.graph.order()? {
            reports.push(self.run_action(task)?);
        }
        crate::log!("build"; "finished in {}ms", start.elapsed().as_millis());
        Ok(reports)
    }

    /// Run the whole graph in order, reporting failures and carrying on.
    ///
    /// Returns the failures in build order.
    pub fn build_reporting(&self, reporter: &dyn Reporter) -> Result<Vec<TaskFailure>> {
        let mut failed = Vec::new();
        for task in self.graph.order()? {
            if let Err(failure) = self.run_action(task) {
                failure.report(reporter);
                failed.push(failure);
            }
        }
        Ok(failed)
    }

    fn serve(&self, failed: Vec<(TaskName, Notification)>) -> Result<()> {
        crate::cli::serve::run(self.ctx.clone(), Arc::clone(&self.runner), failed)
    }
}
