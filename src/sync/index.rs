//! File identity bookkeeping.
//!
//! Maps each absolute source path to the id last written for it. The map is
//! what lets a change notice a renamed id and an unlink find the record to
//! remove. It is never consulted to infer renames from store contents.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Path → last-assigned id.
///
/// Every method takes the lock for a single map operation only, so callers
/// never hold it across an await.
#[derive(Debug, Default)]
pub struct FileIdentityIndex {
    ids: Mutex<HashMap<PathBuf, String>>,
}

impl FileIdentityIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Id currently assigned to `path`.
    #[must_use]
    pub fn get(&self, path: &Path) -> Option<String> {
        self.lock().get(path).cloned()
    }

    /// Assign `id` to `path`, returning the previous id.
    pub fn insert(&self, path: &Path, id: String) -> Option<String> {
        self.lock().insert(path.to_path_buf(), id)
    }

    /// Forget `path`, returning the id it had.
    pub fn remove(&self, path: &Path) -> Option<String> {
        self.lock().remove(path)
    }

    /// Number of tracked paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no path is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Sorted copy of the whole mapping.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<PathBuf, String> {
        self.lock()
            .iter()
            .map(|(path, id)| (path.clone(), id.clone()))
            .collect()
    }

    // A poisoned map is still a consistent map: every mutation is a single
    // insert or remove.
    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, String>> {
        self.ids.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
