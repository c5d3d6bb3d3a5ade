//! FileSystem Actor
//!
//! Watches the base directory of every watch glob and forwards debounced
//! batches of changed paths to the Dispatcher. Which task a path belongs to
//! is the Dispatcher's business.
//!
//! ```text
//! notify ──► bridge thread ──► Debouncer ──► DispatchMsg::Changed
//! ```

use std::path::PathBuf;

use notify::RecommendedWatcher;
use tokio::sync::mpsc;

use super::messages::DispatchMsg;

mod debouncer;
mod types;
mod watch_roots;

use debouncer::Debouncer;
use watch_roots::WatchRoots;

pub struct FsActor {
    /// Channel to receive notify events (sync -> async bridge)
    notify_rx: std::sync::mpsc::Receiver<notify::Result<notify::Event>>,
    /// Watcher handle (must be kept alive)
    watcher: RecommendedWatcher,
    watch_roots: WatchRoots,
    dispatch_tx: mpsc::Sender<DispatchMsg>,
}

impl FsActor {
    /// Start watching `roots` immediately.
    ///
    /// Events buffer in the channel until `run` is polled, so nothing is
    /// lost between creating the actor and starting the runtime loop.
    pub fn new(roots: Vec<PathBuf>, dispatch_tx: mpsc::Sender<DispatchMsg>) -> notify::Result<Self> {
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();

        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })?;

        let mut watch_roots = WatchRoots::new(roots);
        watch_roots.attach_existing(&mut watcher)?;

        Ok(Self {
            notify_rx,
            watcher,
            watch_roots,
            dispatch_tx,
        })
    }

    pub async fn run(self) {
        let Self {
            notify_rx,
            mut watcher,
            mut watch_roots,
            dispatch_tx,
        } = self;
        let mut debouncer = Debouncer::new();

        let (async_tx, mut async_rx) = mpsc::channel::<notify::Event>(64);

        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                match result {
                    Ok(event) => {
                        if async_tx.blocking_send(event).is_err() {
                            break;
                        }
                    }
                    Err(e) => crate::log!("watch"; "notify error: {}", e),
                }
            }
        });

        loop {
            tokio::select! {
                biased;
                event = async_rx.recv() => match event {
                    Some(event) => debouncer.add_event(&event),
                    None => break,
                },
                _ = tokio::time::sleep(debouncer.sleep_duration()) => {
                    watch_roots.maintain(&mut watcher);
                    if let Some(paths) = debouncer.take_if_ready()
                        && dispatch_tx.send(DispatchMsg::Changed(paths)).await.is_err()
                    {
                        break;
                    }
                }
            }
        }
        crate::debug!("watch"; "stopped");
    }
}

#[cfg(test)]
mod tests;
