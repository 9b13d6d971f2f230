//! Content store layer.
//!
//! The sync engine talks to a store through the [`Store`] trait: independent
//! per-id `get`/`set`/`delete` with no transactional guarantees across calls.
//! Two implementations ship with the crate:
//!
//! - [`memory`] - In-process map, for tests and short-lived runs
//! - [`sqlite`] - SQLite-backed store scoped to a collection
//!
//! # Submodules
//!
//! - [`schema`] - Database schema definitions

pub mod memory;
pub mod schema;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::{EntrySummary, SqliteStore};

use std::future::Future;

use crate::error::Result;
use crate::model::StoreRecord;

/// Key-value store holding processed entries of one collection.
///
/// Implementations must tolerate concurrent calls for different ids. The
/// engine never holds a lock of its own across these calls.
pub trait Store: Send + Sync + 'static {
    /// Fetch the record stored under `id`.
    fn get(&self, id: &str) -> impl Future<Output = Result<Option<StoreRecord>>> + Send;

    /// Insert or replace the record under `record.id`.
    fn set(&self, record: StoreRecord) -> impl Future<Output = Result<()>> + Send;

    /// Remove the record under `id`. Returns whether a record existed.
    fn delete(&self, id: &str) -> impl Future<Output = Result<bool>> + Send;

    /// All stored ids.
    fn ids(&self) -> impl Future<Output = Result<Vec<String>>> + Send;
}
