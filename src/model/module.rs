//! Module model and module providers.
//!
//! A source file is synchronized as a structured [`Module`]: an optional
//! metadata mapping declared by the file plus an opaque renderable body.
//! Modules reach the engine through a [`ModuleProvider`], which is either
//! already materialized (eager) or produced on demand by a loader (lazy).
//! Both variants are resolved to a plain `Module` before the sync pipeline
//! touches them.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Declared metadata (and validated entry data) as an ordered JSON object.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A loaded source module.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Module {
    /// Metadata the module declares about itself, if any.
    pub metadata: Option<Metadata>,

    /// Renderable body, opaque to the sync engine.
    pub body: String,
}

impl Module {
    /// Create a module with a body and no declared metadata.
    #[must_use]
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            metadata: None,
            body: body.into(),
        }
    }

    /// Attach declared metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Boxed future returned by lazy module loaders.
pub type LoadFuture = Pin<Box<dyn Future<Output = Result<Module>> + Send>>;

/// Deferred module loader.
pub type ModuleLoader = Arc<dyn Fn() -> LoadFuture + Send + Sync>;

/// Source of one module: materialized up front or loaded on demand.
#[derive(Clone)]
pub enum ModuleProvider {
    /// Module already loaded.
    Eager(Module),
    /// Module produced by calling the loader; called again on every resync.
    Lazy(ModuleLoader),
}

impl ModuleProvider {
    /// Wrap an async loader function.
    pub fn lazy<F, Fut>(loader: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Module>> + Send + 'static,
    {
        Self::Lazy(Arc::new(move || Box::pin(loader())))
    }

    /// Resolve to a materialized module.
    ///
    /// # Errors
    ///
    /// Returns whatever error the lazy loader produced.
    pub async fn materialize(&self) -> Result<Module> {
        match self {
            Self::Eager(module) => Ok(module.clone()),
            Self::Lazy(loader) => loader().await,
        }
    }
}

impl From<Module> for ModuleProvider {
    fn from(module: Module) -> Self {
        Self::Eager(module)
    }
}

impl fmt::Debug for ModuleProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eager(module) => f.debug_tuple("Eager").field(module).finish(),
            Self::Lazy(_) => f.write_str("Lazy(..)"),
        }
    }
}

/// Mapping from source file path to module provider.
///
/// Keys may be absolute or relative; relative keys are resolved against the
/// project root when the engine is built.
#[derive(Debug, Clone, Default)]
pub struct ModuleSource {
    modules: BTreeMap<PathBuf, ModuleProvider>,
}

impl ModuleSource {
    /// Create an empty module source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a path with the given provider, replacing any previous one.
    pub fn insert(&mut self, path: impl Into<PathBuf>, provider: impl Into<ModuleProvider>) {
        self.modules.insert(path.into(), provider.into());
    }

    /// Builder-style [`ModuleSource::insert`].
    #[must_use]
    pub fn with(mut self, path: impl Into<PathBuf>, provider: impl Into<ModuleProvider>) -> Self {
        self.insert(path, provider);
        self
    }

    /// Provider registered for `path`.
    #[must_use]
    pub fn get(&self, path: &Path) -> Option<&ModuleProvider> {
        self.modules.get(path)
    }

    /// Number of tracked paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Tracked paths in sorted order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.modules.keys().map(PathBuf::as_path)
    }

    /// Re-key every relative path against `root`.
    #[must_use]
    pub fn rooted_at(self, root: &Path) -> Self {
        let modules = self
            .modules
            .into_iter()
            .map(|(path, provider)| {
                if path.is_absolute() {
                    (path, provider)
                } else {
                    (root.join(path), provider)
                }
            })
            .collect();
        Self { modules }
    }
}

impl<P: Into<PathBuf>, M: Into<ModuleProvider>> FromIterator<(P, M)> for ModuleSource {
    fn from_iter<I: IntoIterator<Item = (P, M)>>(iter: I) -> Self {
        let mut source = Self::new();
        for (path, provider) in iter {
            source.insert(path, provider);
        }
        source
    }
}

impl IntoIterator for ModuleSource {
    type Item = (PathBuf, ModuleProvider);
    type IntoIter = std::collections::btree_map::IntoIter<PathBuf, ModuleProvider>;

    fn into_iter(self) -> Self::IntoIter {
        self.modules.into_iter()
    }
}
