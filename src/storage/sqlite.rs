//! SQLite content store.
//!
//! Persists entries for one collection in a shared SQLite database. The
//! connection sits behind a mutex that is only held for the duration of a
//! single statement.
//!
//! The `*_entry` methods block and are meant for synchronous callers such as
//! the CLI. The [`Store`] impl runs the same statements on tokio's blocking
//! pool so runtime workers never wait on disk.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{Connection, OptionalExtension, Row};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::{Metadata, StoreRecord};
use crate::storage::schema::apply_schema;
use crate::storage::Store;

/// SQLite-based content store scoped to one collection.
///
/// Clones share the same connection.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    collection: String,
}

/// Lightweight listing row for an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntrySummary {
    pub id: String,
    pub file_path: Option<String>,
    pub digest: String,
    /// Last write time (Unix milliseconds).
    pub updated_at: i64,
}

impl SqliteStore {
    /// Open a database at the given path for `collection`.
    ///
    /// Creates the database and applies schema if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema fails.
    pub fn open(path: &Path, collection: &str) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Self::from_connection(conn, collection)
    }

    /// Open an in-memory database (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory(collection: &str) -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?, collection)
    }

    fn from_connection(conn: Connection, collection: &str) -> Result<Self> {
        apply_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            collection: collection.to_string(),
        })
    }

    /// Collection this store is scoped to.
    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Store("sqlite connection lock poisoned".into()))
    }

    /// Run `op` against a handle to this store on the blocking pool.
    async fn blocking<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Self) -> Result<T> + Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || op(&store))
            .await
            .map_err(|e| Error::Store(format!("sqlite task failed: {e}")))?
    }

    // ==================
    // Entry Operations
    // ==================

    /// Get an entry by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or stored data is not valid JSON.
    pub fn get_entry(&self, id: &str) -> Result<Option<StoreRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, data, rendered, file_path, digest
             FROM entries WHERE collection = ?1 AND id = ?2",
        )?;

        let row = stmt
            .query_row([self.collection.as_str(), id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })
            .optional()?;

        row.map(|(id, data, rendered, file_path, digest)| {
            let data: Metadata = serde_json::from_str(&data)?;
            Ok(StoreRecord {
                id,
                data,
                rendered,
                file_path,
                digest,
            })
        })
        .transpose()
    }

    /// Insert or replace an entry.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the upsert fails.
    pub fn put_entry(&self, record: &StoreRecord) -> Result<()> {
        let data = serde_json::to_string(&record.data)?;
        let now = chrono::Utc::now().timestamp_millis();

        self.conn()?.execute(
            "INSERT INTO entries (collection, id, data, rendered, file_path, digest, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(collection, id) DO UPDATE SET
                data = excluded.data,
                rendered = excluded.rendered,
                file_path = excluded.file_path,
                digest = excluded.digest,
                updated_at = excluded.updated_at",
            rusqlite::params![
                self.collection,
                record.id,
                data,
                record.rendered,
                record.file_path,
                record.digest,
                now
            ],
        )?;

        Ok(())
    }

    /// Delete an entry. Returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn delete_entry(&self, id: &str) -> Result<bool> {
        let changed = self.conn()?.execute(
            "DELETE FROM entries WHERE collection = ?1 AND id = ?2",
            [self.collection.as_str(), id],
        )?;
        Ok(changed > 0)
    }

    /// List entries in the collection, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_entries(&self) -> Result<Vec<EntrySummary>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, file_path, digest, updated_at
             FROM entries WHERE collection = ?1 ORDER BY id",
        )?;

        let rows = stmt
            .query_map([self.collection.as_str()], map_summary)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
    }

    /// Count entries in the collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count_entries(&self) -> Result<usize> {
        let count: i64 = self.conn()?.query_row(
            "SELECT COUNT(*) FROM entries WHERE collection = ?1",
            [self.collection.as_str()],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// IDs of every entry in the collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn entry_ids(&self) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT id FROM entries WHERE collection = ?1 ORDER BY id")?;
        let ids = stmt
            .query_map([self.collection.as_str()], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(ids)
    }
}

fn map_summary(row: &Row<'_>) -> rusqlite::Result<EntrySummary> {
    Ok(EntrySummary {
        id: row.get(0)?,
        file_path: row.get(1)?,
        digest: row.get(2)?,
        updated_at: row.get(3)?,
    })
}

impl Store for SqliteStore {
    async fn get(&self, id: &str) -> Result<Option<StoreRecord>> {
        let id = id.to_string();
        self.blocking(move |store| store.get_entry(&id)).await
    }

    async fn set(&self, record: StoreRecord) -> Result<()> {
        self.blocking(move |store| store.put_entry(&record)).await
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let id = id.to_string();
        self.blocking(move |store| store.delete_entry(&id)).await
    }

    async fn ids(&self) -> Result<Vec<String>> {
        self.blocking(Self::entry_ids).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn record(id: &str, digest: &str) -> StoreRecord {
        StoreRecord {
            id: id.to_string(),
            data: json!({"title": id}).as_object().cloned().unwrap(),
            rendered: format!("<h1>{id}</h1>"),
            file_path: Some(format!("src/content/{id}.md")),
            digest: digest.to_string(),
        }
    }

    #[test]
    fn test_put_and_get_entry() {
        let store = SqliteStore::open_memory("blog").unwrap();
        store.put_entry(&record("posts/a", "d1")).unwrap();

        let fetched = store.get_entry("posts/a").unwrap().unwrap();
        assert_eq!(fetched, record("posts/a", "d1"));
        assert!(store.get_entry("posts/missing").unwrap().is_none());
    }

    #[test]
    fn test_put_entry_replaces_existing() {
        let store = SqliteStore::open_memory("blog").unwrap();
        store.put_entry(&record("posts/a", "d1")).unwrap();
        store.put_entry(&record("posts/a", "d2")).unwrap();

        assert_eq!(store.count_entries().unwrap(), 1);
        assert_eq!(store.get_entry("posts/a").unwrap().unwrap().digest, "d2");
    }

    #[test]
    fn test_collections_are_isolated() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.db");

        let blog = SqliteStore::open(&path, "blog").unwrap();
        blog.put_entry(&record("a", "d1")).unwrap();

        let docs = SqliteStore::open(&path, "docs").unwrap();
        assert!(docs.get_entry("a").unwrap().is_none());
        assert_eq!(docs.count_entries().unwrap(), 0);
        assert_eq!(blog.count_entries().unwrap(), 1);
    }

    #[test]
    fn test_delete_entry() {
        let store = SqliteStore::open_memory("blog").unwrap();
        store.put_entry(&record("a", "d1")).unwrap();

        assert!(store.delete_entry("a").unwrap());
        assert!(!store.delete_entry("a").unwrap());
    }

    #[test]
    fn test_list_entries_ordered() {
        let store = SqliteStore::open_memory("blog").unwrap();
        store.put_entry(&record("b", "d2")).unwrap();
        store.put_entry(&record("a", "d1")).unwrap();

        let ids: Vec<_> = store.list_entries().unwrap().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(store.entry_ids().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(".contentsync").join("store.db");

        SqliteStore::open(&path, "default").unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_store_trait_roundtrip() {
        let store = SqliteStore::open_memory("blog").unwrap();
        Store::set(&store, record("a", "d1")).await.unwrap();

        assert!(Store::get(&store, "a").await.unwrap().is_some());
        assert_eq!(Store::ids(&store).await.unwrap(), vec!["a"]);
        assert!(Store::delete(&store, "a").await.unwrap());
    }

    #[test]
    fn test_clones_share_connection() {
        let store = SqliteStore::open_memory("blog").unwrap();
        let handle = store.clone();
        handle.put_entry(&record("a", "d1")).unwrap();

        assert_eq!(store.get_entry("a").unwrap().unwrap().digest, "d1");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_store_trait_concurrent_writes() {
        let store = Arc::new(SqliteStore::open_memory("blog").unwrap());
        let mut tasks = tokio::task::JoinSet::new();
        for i in 0..16 {
            let store = Arc::clone(&store);
            tasks.spawn(async move { Store::set(store.as_ref(), record(&format!("e{i:02}"), "d1")).await });
        }
        while let Some(done) = tasks.join_next().await {
            done.unwrap().unwrap();
        }

        assert_eq!(store.count_entries().unwrap(), 16);
        assert_eq!(Store::ids(store.as_ref()).await.unwrap().len(), 16);
    }
}
