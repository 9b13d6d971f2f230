//! Synchronization engine.
//!
//! # Architecture
//!
//! The engine owns everything needed to turn tracked source files into store
//! records: the module providers, the resolved base directory, the
//! collaborators (validator, renderer, digester, id strategy) and the
//! [`FileIdentityIndex`].
//!
//! ```text
//! load ─► entry path ─► id ─► digest ─┬─► unchanged (bulk only) ─► index
//!                                     └─► validate ─► render ─► store.set ─► index
//! ```
//!
//! `SyncEngine` is a cheap handle around shared state, so per-file work is
//! spawned onto the runtime as independent tasks. The bulk pass joins every
//! task before returning, and only then are stale records pruned or a watcher
//! attached.
//!
//! No lock is held across an await. The identity index is read and written
//! in single map operations, and the store is expected to handle concurrent
//! per-id calls on its own.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::config::SyncConfig;
use crate::error::{Error, Result};
use crate::model::{Module, ModuleProvider, ModuleSource, StoreRecord};
use crate::storage::Store;

use super::base_dir::{canonical_path, entry_path, resolve_base_dir};
use super::collaborators::{PassthroughValidator, Renderer, ValidationInput, Validator};
use super::hash::{content_digest, Digester, Sha256Digester};
use super::id::{DefaultIdGenerator, IdGenerator};
use super::index::FileIdentityIndex;
use super::router::{WatchEventRouter, Watcher};
use super::types::{ChangeOutcome, SyncOutcome, SyncReport, SyncWarning};

// ==================
// Builder
// ==================

/// Configures and builds a [`SyncEngine`].
pub struct SyncEngineBuilder<S: Store> {
    store: Arc<S>,
    project_root: PathBuf,
    renderer: Arc<dyn Renderer>,
    validator: Arc<dyn Validator>,
    digester: Arc<dyn Digester>,
    id_generator: Arc<dyn IdGenerator>,
    base: Option<PathBuf>,
    prune_stale: bool,
}

impl<S: Store> SyncEngineBuilder<S> {
    /// Start a builder with the default validator, digester and id strategy.
    pub fn new(
        store: Arc<S>,
        project_root: impl Into<PathBuf>,
        renderer: impl Renderer + 'static,
    ) -> Self {
        Self {
            store,
            project_root: project_root.into(),
            renderer: Arc::new(renderer),
            validator: Arc::new(PassthroughValidator),
            digester: Arc::new(Sha256Digester),
            id_generator: Arc::new(DefaultIdGenerator),
            base: None,
            prune_stale: true,
        }
    }

    /// Apply the base directory and pruning settings from a loaded config.
    #[must_use]
    pub fn config(mut self, config: &SyncConfig) -> Self {
        self.base.clone_from(&config.base);
        self.prune_stale = config.prune_stale;
        self
    }

    #[must_use]
    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validator = Arc::new(validator);
        self
    }

    #[must_use]
    pub fn digester(mut self, digester: impl Digester + 'static) -> Self {
        self.digester = Arc::new(digester);
        self
    }

    #[must_use]
    pub fn id_generator(mut self, id_generator: impl IdGenerator + 'static) -> Self {
        self.id_generator = Arc::new(id_generator);
        self
    }

    /// Explicit base directory, relative to the project root.
    #[must_use]
    pub fn base(mut self, base: impl Into<PathBuf>) -> Self {
        self.base = Some(base.into());
        self
    }

    /// Whether the bulk pass deletes records no tracked file claims.
    #[must_use]
    pub fn prune_stale(mut self, prune: bool) -> Self {
        self.prune_stale = prune;
        self
    }

    /// Resolve the base directory and check every tracked path against it.
    ///
    /// A relative project root is resolved against the current directory,
    /// and relative keys in `source` against the project root, so the base
    /// and every tracked path are absolute. With no tracked files and no
    /// explicit base, the project root is used and a
    /// [`SyncWarning::NoTrackedFiles`] is carried into the first report.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the base is ambiguous or missing, or
    /// if a tracked file lies outside it. Nothing is written in that case.
    /// Returns [`Error::Io`] if a relative project root cannot be resolved.
    pub fn build(self, source: ModuleSource) -> Result<SyncEngine<S>> {
        let project_root = std::path::absolute(&self.project_root)?;
        let source = source.rooted_at(&project_root);
        let files: Vec<PathBuf> = source.paths().map(Path::to_path_buf).collect();

        let base = if files.is_empty() && self.base.is_none() {
            project_root.clone()
        } else {
            resolve_base_dir(&project_root, self.base.as_deref(), &files)?
        };
        for file in &files {
            entry_path(file, &base)?;
        }

        let mut warnings = Vec::new();
        if files.is_empty() {
            warn!(base = %base.display(), "No tracked files; sync will be empty");
            warnings.push(SyncWarning::NoTrackedFiles { base: base.clone() });
        }
        debug!(base = %base.display(), files = files.len(), "Resolved base directory");

        Ok(SyncEngine {
            inner: Arc::new(EngineInner {
                store: self.store,
                project_root,
                base,
                renderer: self.renderer,
                validator: self.validator,
                digester: self.digester,
                id_generator: self.id_generator,
                prune_stale: self.prune_stale,
                sources: RwLock::new(source.into_iter().collect()),
                index: FileIdentityIndex::new(),
                warnings,
            }),
        })
    }
}

// ==================
// Engine
// ==================

struct EngineInner<S> {
    store: Arc<S>,
    project_root: PathBuf,
    base: PathBuf,
    renderer: Arc<dyn Renderer>,
    validator: Arc<dyn Validator>,
    digester: Arc<dyn Digester>,
    id_generator: Arc<dyn IdGenerator>,
    prune_stale: bool,
    sources: RwLock<BTreeMap<PathBuf, ModuleProvider>>,
    index: FileIdentityIndex,
    warnings: Vec<SyncWarning>,
}

/// Keeps a [`Store`] in step with a set of tracked source files.
pub struct SyncEngine<S> {
    inner: Arc<EngineInner<S>>,
}

impl<S> Clone for SyncEngine<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Outcome of one file in the bulk pass, plus the id it claimed (if any).
struct FileSync {
    path: PathBuf,
    id: Option<String>,
    result: Result<SyncOutcome>,
}

impl<S: Store> SyncEngine<S> {
    /// Shorthand for [`SyncEngineBuilder::new`].
    pub fn builder(
        store: Arc<S>,
        project_root: impl Into<PathBuf>,
        renderer: impl Renderer + 'static,
    ) -> SyncEngineBuilder<S> {
        SyncEngineBuilder::new(store, project_root, renderer)
    }

    #[must_use]
    pub fn base(&self) -> &Path {
        &self.inner.base
    }

    #[must_use]
    pub fn project_root(&self) -> &Path {
        &self.inner.project_root
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.inner.store
    }

    #[must_use]
    pub fn index(&self) -> &FileIdentityIndex {
        &self.inner.index
    }

    /// Absolute paths of every tracked file, sorted.
    #[must_use]
    pub fn tracked_paths(&self) -> Vec<PathBuf> {
        self.sources().keys().cloned().collect()
    }

    /// Whether `path` is part of the tracked module set.
    #[must_use]
    pub fn is_tracked(&self, path: &Path) -> bool {
        self.sources().contains_key(&self.absolute(path))
    }

    /// Replace the provider for an already tracked path.
    ///
    /// Returns `false` (and changes nothing) for untracked paths. The next
    /// [`on_change`](Self::on_change) for the path uses the new provider.
    pub fn supersede(&self, path: &Path, provider: impl Into<ModuleProvider>) -> bool {
        let path = self.absolute(path);
        let mut sources = self
            .inner
            .sources
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        match sources.get_mut(&path) {
            Some(slot) => {
                *slot = provider.into();
                true
            }
            None => false,
        }
    }

    // ── Bulk pass ─────────────────────────────────────────────

    /// Synchronize every tracked file concurrently and wait for all of them.
    ///
    /// Files whose stored record already carries their digest are skipped
    /// (only the identity index is filled in). Per-file failures are
    /// collected in the report and never stop other files. When pruning is
    /// enabled, records no tracked file claimed are deleted afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error only if listing or pruning the store fails.
    pub async fn bulk_sync(&self) -> Result<SyncReport> {
        let mut pending: HashSet<PathBuf> = self.tracked_paths().into_iter().collect();
        info!(files = pending.len(), base = %self.base().display(), "Starting bulk sync");

        let mut tasks = JoinSet::new();
        for path in &pending {
            let engine = self.clone();
            let path = path.clone();
            tasks.spawn(async move { engine.sync_file(path).await });
        }

        let mut report = SyncReport {
            warnings: self.inner.warnings.clone(),
            ..SyncReport::default()
        };
        let mut claimed: HashSet<String> = HashSet::new();
        let mut failed_paths: HashSet<String> = HashSet::new();

        while let Some(joined) = tasks.join_next().await {
            let file = match joined {
                Ok(file) => file,
                Err(e) => {
                    error!(error = %e, "Sync task did not complete");
                    continue;
                }
            };
            pending.remove(&file.path);
            if let Some(id) = file.id {
                claimed.insert(id);
            }
            match file.result {
                Ok(outcome) => report.record(outcome),
                Err(e) => {
                    warn!(path = %file.path.display(), error = %e, "Failed to sync file");
                    failed_paths.insert(canonical_path(self.project_root(), &file.path));
                    report.fail(&file.path, e);
                }
            }
        }

        // Whatever is still pending belongs to a task that panicked.
        for path in pending {
            failed_paths.insert(canonical_path(self.project_root(), &path));
            report.fail(&path, Error::Other("sync task panicked".to_string()));
        }

        if self.inner.prune_stale {
            report.pruned = self.prune(&claimed, &failed_paths).await?;
        }

        info!(
            created = report.created,
            updated = report.updated,
            unchanged = report.unchanged,
            failed = report.failed(),
            pruned = report.pruned,
            "Bulk sync complete"
        );
        Ok(report)
    }

    /// Run the bulk pass, then attach `watcher` to the base directory.
    ///
    /// The watcher is only attached once every file has been written, so
    /// consumers never see a half-populated store. Returns the report and,
    /// when a watcher was given, a router for its events.
    ///
    /// # Errors
    ///
    /// Returns an error if the bulk pass fails as a whole or the watcher
    /// cannot watch the base directory.
    pub async fn start(
        &self,
        watcher: Option<&mut dyn Watcher>,
    ) -> Result<(SyncReport, Option<WatchEventRouter<S>>)> {
        let report = self.bulk_sync().await?;

        let router = match watcher {
            Some(watcher) => {
                watcher.watch(self.base())?;
                info!(base = %self.base().display(), "Watching for changes");
                Some(WatchEventRouter::new(self.clone()))
            }
            None => None,
        };
        Ok((report, router))
    }

    async fn sync_file(&self, path: PathBuf) -> FileSync {
        let (module, id) = match self.prepare(&path).await {
            Ok(prepared) => prepared,
            Err(e) => {
                return FileSync {
                    path,
                    id: None,
                    result: Err(e),
                };
            }
        };
        let result = self.sync_prepared(&path, &id, module).await;
        FileSync {
            path,
            id: Some(id),
            result,
        }
    }

    async fn sync_prepared(&self, path: &Path, id: &str, module: Module) -> Result<SyncOutcome> {
        let digest = content_digest(self.inner.digester.as_ref(), &module)?;

        let existing = self.inner.store.get(id).await?;
        if existing.as_ref().is_some_and(|record| record.is_current(&digest)) {
            debug!(id, "Unchanged, skipping");
            self.inner.index.insert(path, id.to_string());
            return Ok(SyncOutcome::Unchanged);
        }

        self.process(path, id, module, digest).await?;
        self.inner.index.insert(path, id.to_string());

        Ok(if existing.is_some() {
            SyncOutcome::Updated
        } else {
            SyncOutcome::Created
        })
    }

    async fn prune(&self, claimed: &HashSet<String>, failed_paths: &HashSet<String>) -> Result<usize> {
        let mut pruned = 0;
        for id in self.inner.store.ids().await? {
            if claimed.contains(&id) {
                continue;
            }
            // A file that failed before its id was known still owns its record.
            let owned_by_failure = self
                .inner
                .store
                .get(&id)
                .await?
                .and_then(|record| record.file_path)
                .is_some_and(|file_path| failed_paths.contains(&file_path));
            if owned_by_failure {
                continue;
            }
            if self.inner.store.delete(&id).await? {
                debug!(id, "Pruned stale entry");
                pruned += 1;
            }
        }
        Ok(pruned)
    }

    // ── Change notifications ──────────────────────────────────

    /// Resynchronize one file after it was added or modified.
    ///
    /// Always runs the full pipeline. If the file's id moved, the record
    /// under the old id is deleted before the new one is written. The index
    /// is updated only after the write succeeds.
    ///
    /// # Errors
    ///
    /// Returns the per-file error (load, validation, render, store) for this
    /// file, or [`Error::PathOutsideBase`] if it lies outside the base.
    pub async fn on_change(&self, path: &Path) -> Result<ChangeOutcome> {
        let path = self.absolute(path);
        let previous = self.inner.index.get(&path);

        let (module, id) = self.prepare(&path).await?;
        let digest = content_digest(self.inner.digester.as_ref(), &module)?;

        let outcome = match previous {
            Some(old) if old != id => {
                debug!(from = %old, to = %id, "Entry id changed");
                self.inner.store.delete(&old).await?;
                ChangeOutcome::Renamed { from: old }
            }
            Some(_) => ChangeOutcome::Updated,
            None => ChangeOutcome::Created,
        };

        self.process(&path, &id, module, digest).await?;
        self.inner.index.insert(&path, id.clone());

        debug!(id, path = %path.display(), ?outcome, "Synced change");
        Ok(outcome)
    }

    /// Remove the record for a deleted file.
    ///
    /// Returns the removed id, or `None` if the path was never synced.
    ///
    /// # Errors
    ///
    /// Returns an error if the store delete fails; the index entry is kept
    /// in that case.
    pub async fn on_unlink(&self, path: &Path) -> Result<Option<String>> {
        let path = self.absolute(path);
        let Some(id) = self.inner.index.get(&path) else {
            debug!(path = %path.display(), "Unlinked file was never synced");
            return Ok(None);
        };

        self.inner.store.delete(&id).await?;
        self.inner.index.remove(&path);
        debug!(id, path = %path.display(), "Removed entry");
        Ok(Some(id))
    }

    // ── Pipeline ──────────────────────────────────────────────

    /// Load the module and derive its logical id.
    async fn prepare(&self, path: &Path) -> Result<(Module, String)> {
        let module = self.load(path).await?;
        let entry = entry_path(path, self.base())?;
        let id = self
            .inner
            .id_generator
            .generate(&entry, self.base(), module.metadata.as_ref());
        if id.split('/').all(str::is_empty) {
            return Err(Error::InvalidId {
                path: path.to_path_buf(),
                entry,
            });
        }
        Ok((module, id))
    }

    async fn load(&self, path: &Path) -> Result<Module> {
        let provider = self.sources().get(path).cloned().ok_or_else(|| Error::Load {
            path: path.to_path_buf(),
            message: "file is not tracked".to_string(),
        })?;

        provider.materialize().await.map_err(|e| match e {
            e @ Error::Load { .. } => e,
            other => Error::Load {
                path: path.to_path_buf(),
                message: other.to_string(),
            },
        })
    }

    /// Validate, render and write one record.
    async fn process(&self, path: &Path, id: &str, module: Module, digest: String) -> Result<()> {
        let input = ValidationInput {
            id: id.to_string(),
            data: module.metadata.unwrap_or_default(),
            source_path: path.to_path_buf(),
        };
        let data = self
            .inner
            .validator
            .validate(input)
            .map_err(|e| Error::Validation {
                id: id.to_string(),
                path: path.to_path_buf(),
                message: e.0,
            })?;

        let rendered = self
            .inner
            .renderer
            .render(&module.body)
            .map_err(|e| Error::Render {
                path: path.to_path_buf(),
                message: e.0,
            })?;

        let record = StoreRecord {
            id: id.to_string(),
            data,
            rendered,
            file_path: Some(canonical_path(self.project_root(), path)),
            digest,
        };
        self.inner.store.set(record).await
    }

    /// `path` as an absolute path, joining relative paths onto the project root.
    pub(crate) fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.inner.project_root.join(path)
        }
    }

    fn sources(&self) -> RwLockReadGuard<'_, BTreeMap<PathBuf, ModuleProvider>> {
        self.inner
            .sources
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
