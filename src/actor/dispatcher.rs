//! Dispatcher - maps changed paths to tasks and runs them one at a time.
//!
//! Each batch from the FsActor is matched against the watch rules. Tasks run
//! on the blocking pool and are awaited before the next one starts, so a
//! transformer never overlaps with itself. Batches that arrive during a run
//! are merged into the queue; a task queued twice runs once.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;

use super::messages::{DispatchMsg, WsMsg};
use super::ws::OverlayReporter;
use crate::config::{ConfigError, KilnConfig};
use crate::report::{Notification, Reporter, Reporters, TerminalReporter};
use crate::task::{TaskName, TaskRunner};
use crate::transform::{BuildContext, Reload, TaskError, TaskReport};
use crate::utils::glob::PathSet;

/// `{glob → task}` bindings of the dev server.
pub struct WatchRules {
    rules: Vec<(TaskName, PathSet)>,
}

impl WatchRules {
    pub fn from_config(config: &KilnConfig) -> Result<Self, ConfigError> {
        let bindings = [
            (TaskName::Styles, "styles.watch", &config.styles.watch),
            (TaskName::Icons, "icons.watch", &config.icons.watch),
            (TaskName::Scripts, "scripts.watch", &config.scripts.watch),
            (TaskName::Markup, "markup.watch", &config.markup.watch),
            (TaskName::Markup, "markup.data.watch", &config.markup.data.watch),
            (TaskName::Static, "static.fonts.input", &config.static_files.fonts.input),
            (TaskName::Static, "static.images.input", &config.static_files.images.input),
        ];

        let mut rules = Vec::with_capacity(bindings.len());
        for (task, field, patterns) in bindings {
            rules.push((task, config.path_set(field, patterns)?));
        }
        Ok(Self { rules })
    }

    /// Tasks bound to `path`, in rule order.
    pub fn tasks_for<'a>(&'a self, path: &'a Path) -> impl Iterator<Item = TaskName> + 'a {
        self.rules
            .iter()
            .filter(move |(_, set)| set.is_match(path))
            .map(|(task, _)| *task)
    }

    /// Directories to watch: glob bases, without those nested in another.
    pub fn roots(&self) -> Vec<PathBuf> {
        let mut bases: Vec<PathBuf> = self
            .rules
            .iter()
            .flat_map(|(_, set)| set.base_dirs())
            .collect();
        bases.sort();
        bases.dedup();

        let mut roots: Vec<PathBuf> = Vec::new();
        for base in bases {
            if !roots.iter().any(|root| base.starts_with(root)) {
                roots.push(base);
            }
        }
        roots
    }
}

pub struct Dispatcher {
    rx: mpsc::Receiver<DispatchMsg>,
    ws_tx: mpsc::Sender<WsMsg>,
    rules: WatchRules,
    ctx: BuildContext,
    runner: Arc<dyn TaskRunner>,
    reporter: Reporters,
    /// Tasks whose last run failed, with the error shown for each
    failed: BTreeMap<TaskName, Notification>,
}

impl Dispatcher {
    pub fn new(
        rx: mpsc::Receiver<DispatchMsg>,
        ws_tx: mpsc::Sender<WsMsg>,
        rules: WatchRules,
        ctx: BuildContext,
        runner: Arc<dyn TaskRunner>,
    ) -> Self {
        let reporter = Reporters::new()
            .with(TerminalReporter)
            .with(OverlayReporter::new(ws_tx.clone()));
        Self {
            rx,
            ws_tx,
            rules,
            ctx,
            runner,
            reporter,
            failed: BTreeMap::new(),
        }
    }

    /// Start with the overlay showing failures from the initial build.
    pub fn with_failed(
        mut self,
        failed: impl IntoIterator<Item = (TaskName, Notification)>,
    ) -> Self {
        self.failed.extend(failed);
        self
    }

    pub async fn run(mut self) {
        let mut queue: Vec<TaskName> = Vec::new();

        if !self.show_remaining_failure().await {
            return;
        }

        loop {
            if queue.is_empty() {
                match self.rx.recv().await {
                    Some(DispatchMsg::Changed(paths)) => self.enqueue(&mut queue, &paths),
                    Some(DispatchMsg::Shutdown) | None => break,
                }
                continue;
            }

            let task = queue.remove(0);
            if !self.run_task(task).await {
                break;
            }

            while let Ok(msg) = self.rx.try_recv() {
                match msg {
                    DispatchMsg::Changed(paths) => self.enqueue(&mut queue, &paths),
                    DispatchMsg::Shutdown => return,
                }
            }
        }
        crate::debug!("dispatch"; "stopped");
    }

    /// Queue the tasks bound to `paths`, keeping build order.
    fn enqueue(&self, queue: &mut Vec<TaskName>, paths: &[PathBuf]) {
        for path in paths {
            for task in self.rules.tasks_for(path) {
                if !queue.contains(&task) {
                    crate::debug!("dispatch"; "{} → {}", self.ctx.config.root_relative(path).display(), task);
                    queue.push(task);
                }
            }
        }
        queue.sort_by_key(|task| TaskName::ACTIONS.iter().position(|a| a == task));
    }

    /// Run one task to completion. Returns `false` once the WsActor is gone.
    async fn run_task(&mut self, task: TaskName) -> bool {
        let runner = Arc::clone(&self.runner);
        let ctx = self.ctx.clone();
        let start = Instant::now();

        let result = tokio::task::spawn_blocking(move || runner.run(task, &ctx))
            .await
            .unwrap_or_else(|e| Err(TaskError::setup(format!("task panicked: {e}"))));

        match result {
            Ok(report) => {
                crate::logger::status_success(&format!(
                    "{task} finished in {}ms",
                    start.elapsed().as_millis()
                ));
                if self.failed.remove(&task).is_some() {
                    if self.failed.is_empty() {
                        self.reporter.resolved();
                    } else if !self.show_remaining_failure().await {
                        return false;
                    }
                }
                self.notify_clients(task, report).await
            }
            Err(err) => {
                let notification = err.notification(task.as_str());
                self.reporter.report(&notification);
                self.failed.insert(task, notification);
                true
            }
        }
    }

    /// Put the overlay back on a task that is still failing.
    ///
    /// Only the browser is told; the terminal already printed the error.
    async fn show_remaining_failure(&self) -> bool {
        match self.failed.values().next() {
            Some(notification) => self.ws_tx.send(WsMsg::Error(notification.clone())).await.is_ok(),
            None => true,
        }
    }

    async fn notify_clients(&self, task: TaskName, report: TaskReport) -> bool {
        let msg = match report.reload {
            Reload::Css { href } => WsMsg::Css { href },
            Reload::Page => WsMsg::Reload {
                reason: task.to_string(),
            },
            Reload::None => return true,
        };
        self.ws_tx.send(msg).await.is_ok()
    }
}
