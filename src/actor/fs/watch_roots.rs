use std::path::PathBuf;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};

/// Glob base directories and whether each is currently watched.
///
/// A base may not exist when the server starts (no icons yet) or may be
/// deleted and recreated; `maintain` picks those up.
pub(super) struct WatchRoots {
    roots: Vec<(PathBuf, bool)>,
}

impl WatchRoots {
    pub(super) fn new(paths: Vec<PathBuf>) -> Self {
        Self {
            roots: paths.into_iter().map(|p| (p, false)).collect(),
        }
    }

    pub(super) fn attach_existing(
        &mut self,
        watcher: &mut RecommendedWatcher,
    ) -> notify::Result<()> {
        for (path, attached) in &mut self.roots {
            if path.exists() {
                watcher.watch(path, RecursiveMode::Recursive)?;
                *attached = true;
                crate::debug!("watch"; "{}", path.display());
            }
        }
        Ok(())
    }

    pub(super) fn maintain(&mut self, watcher: &mut RecommendedWatcher) {
        for (path, attached) in &mut self.roots {
            match (*attached, path.exists()) {
                (true, false) => *attached = false,
                (false, true) => {
                    if watcher.watch(path, RecursiveMode::Recursive).is_ok() {
                        *attached = true;
                        crate::debug!("watch"; "attached {}", path.display());
                    }
                }
                _ => {}
            }
        }
    }
}
