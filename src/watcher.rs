//! Wake-up strategies for the wait-for-changes loop.
//!
//! The reader always decides what happened from a fresh metadata snapshot; a strategy only
//! controls when the next snapshot is taken.

use crate::config::WatchMode;
use crate::error::Result;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::{OsStr, OsString};
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Decides how long the reader sleeps between metadata checks.
pub(crate) enum ChangeWaker {
    /// Sleep the whole poll interval.
    Interval,
    /// Wake on the first event naming the file, or after the poll interval.
    Events(FileWatcher),
}

impl ChangeWaker {
    pub(crate) fn for_mode(mode: WatchMode, path: &Path) -> Result<Self> {
        match mode {
            WatchMode::Poll => Ok(ChangeWaker::Interval),
            WatchMode::Notify => Ok(ChangeWaker::Events(FileWatcher::new(path)?)),
        }
    }

    /// Suspends until the next metadata check is due. Cancel-safe.
    pub(crate) async fn wait(&mut self, poll_interval: Duration) {
        match self {
            ChangeWaker::Interval => tokio::time::sleep(poll_interval).await,
            ChangeWaker::Events(watcher) => {
                let woke_by_event = tokio::select! {
                    _ = tokio::time::sleep(poll_interval) => false,
                    _ = watcher.next_relevant_event() => true,
                };
                if woke_by_event {
                    // One metadata check covers every event queued so far.
                    watcher.drain();
                }
            }
        }
    }
}

/// Watches the parent directory of the followed file, so creations and renames are seen too.
pub(crate) struct FileWatcher {
    _watcher: RecommendedWatcher,
    receiver: mpsc::UnboundedReceiver<notify::Result<Event>>,
    file_name: OsString,
}

impl FileWatcher {
    pub(crate) fn new(path: &Path) -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();

        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            Config::default(),
        )?;

        let watch_path = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        watcher.watch(watch_path, RecursiveMode::NonRecursive)?;
        debug!(dir = %watch_path.display(), "watching directory for file events");

        Ok(Self {
            _watcher: watcher,
            receiver: rx,
            file_name: path.file_name().map(OsStr::to_os_string).unwrap_or_default(),
        })
    }

    /// Resolves on the next event that names the followed file.
    ///
    /// Never resolves once the backend has shut down; the poll interval takes over then.
    async fn next_relevant_event(&mut self) {
        loop {
            match self.receiver.recv().await {
                Some(Ok(event)) if is_event_relevant_to_file(&event, &self.file_name) => return,
                Some(Ok(_)) => {}
                Some(Err(e)) => warn!(error = %e, "file watcher error"),
                None => std::future::pending::<()>().await,
            }
        }
    }

    fn drain(&mut self) {
        while self.receiver.try_recv().is_ok() {}
    }
}

/// Check if a notify event is relevant to a specific file name
pub(crate) fn is_event_relevant_to_file(event: &Event, target_file_name: &OsStr) -> bool {
    event
        .paths
        .iter()
        .any(|path| path.file_name() == Some(target_file_name))
}
