//! Command implementations.

pub mod completions;
pub mod entries;
pub mod status;
pub mod version;

use crate::cli::StoreArgs;
use crate::config::{current_project_root, load_config, resolve_db_path, SyncConfig};
use crate::error::{Error, Result};
use crate::storage::SqliteStore;
use std::path::PathBuf;

/// Where a command's store lives and which collection it reads.
pub(crate) struct StoreLocation {
    /// Loaded project config, when a project root was found.
    pub config: Option<SyncConfig>,
    pub db_path: PathBuf,
    pub collection: String,
}

/// Resolve project, config, store path and collection from global flags.
pub(crate) fn locate_store(args: StoreArgs<'_>) -> Result<StoreLocation> {
    let project_root = args.project.cloned().or_else(current_project_root);
    let config = project_root.as_deref().map(load_config).transpose()?;

    let db_path = resolve_db_path(args.db.map(PathBuf::as_path), config.as_ref())
        .ok_or_else(|| Error::Config("Could not determine a store location".into()))?;

    let collection = args
        .collection
        .map(ToString::to_string)
        .or_else(|| config.as_ref().map(|c| c.collection.clone()))
        .unwrap_or_else(|| SyncConfig::default().collection);

    Ok(StoreLocation {
        config,
        db_path,
        collection,
    })
}

/// Open the store for an existing database.
pub(crate) fn open_store(location: &StoreLocation) -> Result<SqliteStore> {
    if !location.db_path.exists() {
        return Err(Error::StoreNotFound {
            path: location.db_path.clone(),
        });
    }
    SqliteStore::open(&location.db_path, &location.collection)
}
