//! Watch event routing.
//!
//! A [`Watcher`] reports filesystem activity as [`WatchEvent`]s over a
//! channel. [`WatchEventRouter`] consumes that channel, drops events for
//! paths outside the tracked module set, and turns the rest into engine
//! calls: `Add` and `Change` resync the file, `Unlink` removes its entry.
//!
//! Each routed event runs in its own task. Two events for the same path may
//! therefore overlap, and the later store write wins. Callers that need
//! strict per-path ordering must serialize events before sending them.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use crate::error::Result;
use crate::storage::Store;

use super::engine::SyncEngine;

/// Filesystem notification for one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    Add(PathBuf),
    Change(PathBuf),
    Unlink(PathBuf),
}

impl WatchEvent {
    /// Path the event refers to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Add(path) | Self::Change(path) | Self::Unlink(path) => path,
        }
    }
}

/// Source of [`WatchEvent`]s.
///
/// Implementations start emitting events for everything under `dir` once
/// `watch` returns.
pub trait Watcher: Send {
    /// Begin watching `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be watched.
    fn watch(&mut self, dir: &Path) -> Result<()>;
}

/// Counters for a finished [`WatchEventRouter::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouterStats {
    /// Events dispatched to the engine.
    pub routed: usize,
    /// Events for untracked paths.
    pub ignored: usize,
    /// Routed events whose engine call failed.
    pub failed: usize,
}

/// Dispatches watch events for tracked paths to a [`SyncEngine`].
pub struct WatchEventRouter<S> {
    engine: SyncEngine<S>,
    tracked: Arc<HashSet<PathBuf>>,
}

impl<S> Clone for WatchEventRouter<S> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            tracked: Arc::clone(&self.tracked),
        }
    }
}

impl<S: Store> WatchEventRouter<S> {
    /// Router over the paths tracked by `engine` right now.
    #[must_use]
    pub fn new(engine: SyncEngine<S>) -> Self {
        let tracked = engine.tracked_paths().into_iter().collect();
        Self {
            engine,
            tracked: Arc::new(tracked),
        }
    }

    /// Whether events for `path` are routed.
    ///
    /// Relative paths are read against the engine's project root.
    #[must_use]
    pub fn is_tracked(&self, path: &Path) -> bool {
        self.tracked.contains(&self.engine.absolute(path))
    }

    /// Handle one event.
    ///
    /// Returns `Ok(false)` if the path is not tracked and nothing was done.
    ///
    /// # Errors
    ///
    /// Returns the engine error for the routed event.
    pub async fn dispatch(&self, event: WatchEvent) -> Result<bool> {
        if !self.is_tracked(event.path()) {
            debug!(path = %event.path().display(), "Ignoring untracked path");
            return Ok(false);
        }

        match event {
            WatchEvent::Add(path) | WatchEvent::Change(path) => {
                self.engine.on_change(&path).await?;
            }
            WatchEvent::Unlink(path) => {
                self.engine.on_unlink(&path).await?;
            }
        }
        Ok(true)
    }

    /// Route events from `rx` until the channel closes.
    ///
    /// Every routed event is handled in its own task; all of them have
    /// finished by the time this returns.
    pub async fn run(self, mut rx: mpsc::Receiver<WatchEvent>) -> RouterStats {
        let mut stats = RouterStats::default();
        let mut in_flight: JoinSet<Result<bool>> = JoinSet::new();

        loop {
            tokio::select! {
                event = rx.recv() => {
                    let Some(event) = event else { break };
                    if !self.is_tracked(event.path()) {
                        debug!(path = %event.path().display(), "Ignoring untracked path");
                        stats.ignored += 1;
                        continue;
                    }
                    let router = self.clone();
                    in_flight.spawn(async move {
                        let path = event.path().to_path_buf();
                        router.dispatch(event).await.inspect_err(|e| {
                            warn!(path = %path.display(), error = %e, "Failed to apply watch event");
                        })
                    });
                }
                Some(done) = in_flight.join_next(), if !in_flight.is_empty() => {
                    Self::tally(&mut stats, done);
                }
            }
        }

        while let Some(done) = in_flight.join_next().await {
            Self::tally(&mut stats, done);
        }
        debug!(?stats, "Watch event channel closed");
        stats
    }

    fn tally(stats: &mut RouterStats, done: std::result::Result<Result<bool>, tokio::task::JoinError>) {
        match done {
            Ok(Ok(_)) => stats.routed += 1,
            Ok(Err(_)) => {
                stats.routed += 1;
                stats.failed += 1;
            }
            Err(e) => {
                error!(error = %e, "Watch event task did not complete");
                stats.routed += 1;
                stats.failed += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Module, ModuleProvider, ModuleSource};
    use crate::storage::MemoryStore;
    use crate::sync::collaborators::RenderError;
    use crate::error::Error;
    use std::fs;
    use tempfile::TempDir;

    fn render(body: &str) -> std::result::Result<String, RenderError> {
        Ok(body.to_string())
    }

    fn setup() -> (TempDir, PathBuf, Arc<MemoryStore>, SyncEngine<MemoryStore>) {
        let temp_dir = TempDir::new().unwrap();
        let content = temp_dir.path().join("content");
        fs::create_dir_all(&content).unwrap();

        let source = ModuleSource::new()
            .with(content.join("a.md"), Module::new("a"))
            .with(content.join("b.md"), Module::new("b"));
        let store = Arc::new(MemoryStore::new());
        let engine = SyncEngine::builder(Arc::clone(&store), temp_dir.path(), render)
            .build(source)
            .unwrap();
        (temp_dir, content, store, engine)
    }

    #[derive(Default)]
    struct RecordingWatcher {
        dirs: Vec<PathBuf>,
    }

    impl Watcher for RecordingWatcher {
        fn watch(&mut self, dir: &Path) -> Result<()> {
            self.dirs.push(dir.to_path_buf());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_dispatch_ignores_untracked() {
        let (_temp_dir, content, store, engine) = setup();
        let router = WatchEventRouter::new(engine);

        let routed = router
            .dispatch(WatchEvent::Add(content.join("notes.txt")))
            .await
            .unwrap();

        assert!(!routed);
        assert!(store.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_dispatch_change_and_unlink() {
        let (_temp_dir, content, store, engine) = setup();
        let router = WatchEventRouter::new(engine);

        assert!(router.dispatch(WatchEvent::Change(content.join("a.md"))).await.unwrap());
        assert!(store.get("a").await.unwrap().is_some());

        assert!(router.dispatch(WatchEvent::Unlink(content.join("a.md"))).await.unwrap());
        assert!(store.get("a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_start_attaches_watcher_after_bulk_sync() {
        let (_temp_dir, content, store, engine) = setup();
        let mut watcher = RecordingWatcher::default();

        let (report, router) = engine.start(Some(&mut watcher)).await.unwrap();

        assert_eq!(report.created, 2);
        assert_eq!(store.len().unwrap(), 2);
        assert_eq!(watcher.dirs, vec![content.clone()]);
        assert!(router.unwrap().is_tracked(&content.join("b.md")));
    }

    #[tokio::test]
    async fn test_relative_root_routes_absolute_events() {
        let cwd = std::env::current_dir().unwrap();
        let temp_dir = TempDir::new_in(&cwd).unwrap();
        let root = temp_dir.path().strip_prefix(&cwd).unwrap();
        fs::create_dir_all(root.join("content")).unwrap();

        let source = ModuleSource::new()
            .with("content/a.md", Module::new("a"))
            .with("content/b.md", Module::new("b"));
        let store = Arc::new(MemoryStore::new());
        let engine = SyncEngine::builder(Arc::clone(&store), root, render)
            .build(source)
            .unwrap();
        let mut watcher = RecordingWatcher::default();

        let (_report, router) = engine.start(Some(&mut watcher)).await.unwrap();
        let router = router.unwrap();

        let content = temp_dir.path().join("content");
        assert_eq!(watcher.dirs, vec![content.clone()]);
        assert!(router.is_tracked(Path::new("content/a.md")));
        assert!(router.dispatch(WatchEvent::Change(content.join("a.md"))).await.unwrap());
        assert!(router.dispatch(WatchEvent::Unlink(content.join("b.md"))).await.unwrap());
        assert!(store.get("a").await.unwrap().is_some());
        assert!(store.get("b").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_start_without_watcher() {
        let (_temp_dir, _content, _store, engine) = setup();
        let (report, router) = engine.start(None).await.unwrap();
        assert_eq!(report.created, 2);
        assert!(router.is_none());
    }

    #[tokio::test]
    async fn test_run_drains_channel() {
        let (_temp_dir, content, store, engine) = setup();
        engine.bulk_sync().await.unwrap();
        engine.supersede(
            &content.join("b.md"),
            ModuleProvider::lazy(|| async { Err(Error::Other("bad".into())) }),
        );
        let router = WatchEventRouter::new(engine);

        let (tx, rx) = mpsc::channel(8);
        tx.send(WatchEvent::Unlink(content.join("a.md"))).await.unwrap();
        tx.send(WatchEvent::Change(content.join("b.md"))).await.unwrap();
        tx.send(WatchEvent::Add(content.join("c.md"))).await.unwrap();
        drop(tx);

        let stats = router.run(rx).await;

        assert_eq!(
            stats,
            RouterStats {
                routed: 2,
                ignored: 1,
                failed: 1
            }
        );
        assert!(store.get("a").await.unwrap().is_none());
        assert!(store.get("b").await.unwrap().is_some());
    }
}
