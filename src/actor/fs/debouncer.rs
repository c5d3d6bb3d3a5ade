use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

use super::types::ChangeKind;
use crate::utils::fs::normalize_path;

pub(super) const DEBOUNCE_MS: u64 = 150;

/// Quiet period bookkeeping for raw notify events.
///
/// Editors save in bursts (write temp, rename, chmod). Events are merged per
/// path and released once no new event arrived for `DEBOUNCE_MS`.
pub(super) struct Debouncer {
    pub(super) changes: FxHashMap<PathBuf, ChangeKind>,
    pub(super) last_event: Option<Instant>,
}

impl Debouncer {
    pub(super) fn new() -> Self {
        Self {
            changes: FxHashMap::default(),
            last_event: None,
        }
    }

    pub(super) fn add_event(&mut self, event: &notify::Event) {
        use notify::EventKind;
        use notify::event::ModifyKind;

        let kind = match event.kind {
            EventKind::Create(_) => ChangeKind::Created,
            EventKind::Remove(_) => ChangeKind::Removed,
            // Metadata-only changes would retrigger on our own writes
            EventKind::Modify(ModifyKind::Metadata(_)) => return,
            EventKind::Modify(_) => ChangeKind::Modified,
            _ => return,
        };

        for path in event.paths.iter().filter(|p| !is_temp_file(p)) {
            let path = normalize_path(path);
            crate::debug!("watch"; "event {}: {}", kind.label(), path.display());

            match merge(self.changes.get(&path).copied(), kind) {
                Some(merged) => {
                    self.changes.insert(path, merged);
                }
                None => {
                    self.changes.remove(&path);
                }
            }
            self.last_event = Some(Instant::now());
        }
    }

    /// Changed paths, sorted, once the quiet period has passed.
    pub(super) fn take_if_ready(&mut self) -> Option<Vec<PathBuf>> {
        let last_event = self.last_event?;
        if last_event.elapsed() < Duration::from_millis(DEBOUNCE_MS) {
            return None;
        }

        self.last_event = None;
        let mut paths: Vec<PathBuf> = std::mem::take(&mut self.changes).into_keys().collect();
        if paths.is_empty() {
            return None;
        }
        paths.sort();
        Some(paths)
    }

    /// Time until the pending batch may be released. Idle ticks also let
    /// the actor re-attach missing watch roots.
    pub(super) fn sleep_duration(&self) -> Duration {
        match self.last_event {
            Some(last) => Duration::from_millis(DEBOUNCE_MS)
                .saturating_sub(last.elapsed())
                .max(Duration::from_millis(1)),
            None => Duration::from_secs(1),
        }
    }
}

/// Combine an already pending change with a new one.
///
/// `None` means the path no longer needs attention: it appeared and vanished
/// within one batch.
fn merge(existing: Option<ChangeKind>, new: ChangeKind) -> Option<ChangeKind> {
    use ChangeKind::*;

    match (existing, new) {
        (None, kind) => Some(kind),
        (Some(Created), Removed) => None,
        (Some(Removed), Created | Modified) => Some(Modified),
        (Some(_), Removed) => Some(Removed),
        (Some(first), _) => Some(first),
    }
}

/// Editor swap, backup and atomic-save artifacts.
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bak" | "swp" | "swo" | "swx" | "tmp" | "crdownload")
        || name.ends_with('~')
        || name.ends_with("___jb_tmp___")
        || name.ends_with("___jb_old___")
        || name.starts_with('.')
        || name == "4913"
}
