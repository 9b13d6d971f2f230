//! Configuration management.
//!
//! This module provides functions for discovering the project root, loading
//! the per-project sync configuration, and resolving the store path.
//!
//! # Architecture
//!
//! Each project keeps its settings in a `.contentsync/` directory at the
//! project root:
//! - **Config**: `.contentsync/config.json` (optional, defaults apply)
//! - **Store**: `.contentsync/store.db` unless overridden
//!
//! The project root is the directory containing `.contentsync/`, so every
//! command resolves the same root regardless of which subdirectory it is
//! run from.

use crate::error::{Error, Result};

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the per-project settings directory.
pub const CONFIG_DIR: &str = ".contentsync";

const CONFIG_FILE: &str = "config.json";
const STORE_FILE: &str = "store.db";

/// Environment variable overriding the store path.
pub const DB_ENV_VAR: &str = "CONTENTSYNC_DB";

/// Sync settings for one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SyncConfig {
    /// Directory containing `.contentsync/`. Not stored in the file.
    #[serde(skip)]
    pub project_root: PathBuf,

    /// Explicit base directory, relative to the project root.
    pub base: Option<PathBuf>,

    /// Store scope name.
    pub collection: String,

    /// Store path, relative to the project root unless absolute.
    pub db: Option<PathBuf>,

    /// Delete records no tracked file claims after a bulk pass.
    pub prune_stale: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::new(),
            base: None,
            collection: "default".to_string(),
            db: None,
            prune_stale: true,
        }
    }
}

impl SyncConfig {
    /// Defaults rooted at `project_root`.
    #[must_use]
    pub fn for_root(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            ..Self::default()
        }
    }

    /// Store path from the config alone: `db` if set, else the project store.
    #[must_use]
    pub fn store_path(&self) -> PathBuf {
        match &self.db {
            Some(db) if db.is_absolute() => db.clone(),
            Some(db) => self.project_root.join(db),
            None => self.project_root.join(CONFIG_DIR).join(STORE_FILE),
        }
    }
}

/// Walk up from `start` looking for a directory containing `.contentsync/`.
#[must_use]
pub fn discover_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(CONFIG_DIR).is_dir())
        .map(Path::to_path_buf)
}

/// Project root for the current directory, if any.
#[must_use]
pub fn current_project_root() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .and_then(|cwd| discover_project_root(&cwd))
}

/// Get the global content-sync directory (`~/.contentsync/`).
#[must_use]
pub fn global_contentsync_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(CONFIG_DIR))
}

/// Path of the config file for `project_root`.
#[must_use]
pub fn config_path(project_root: &Path) -> PathBuf {
    project_root.join(CONFIG_DIR).join(CONFIG_FILE)
}

/// Load the config for `project_root`.
///
/// A missing file yields the defaults.
///
/// # Errors
///
/// Returns [`Error::Config`] if the file exists but cannot be read or parsed.
pub fn load_config(project_root: &Path) -> Result<SyncConfig> {
    let path = config_path(project_root);

    let mut config = if path.exists() {
        let content = fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {e}", path.display())))?;
        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {e}", path.display())))?
    } else {
        SyncConfig::default()
    };

    config.project_root = project_root.to_path_buf();
    Ok(config)
}

/// Resolve the store path.
///
/// Priority:
/// 1. If `explicit_path` is provided, use it directly
/// 2. `CONTENTSYNC_DB` environment variable
/// 3. The project config (`db`, else `.contentsync/store.db`)
/// 4. Global location: `~/.contentsync/store.db`
///
/// # Returns
///
/// Returns the path to the store, or `None` if no location found.
#[must_use]
pub fn resolve_db_path(explicit_path: Option<&Path>, config: Option<&SyncConfig>) -> Option<PathBuf> {
    let from_env = std::env::var(DB_ENV_VAR)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from);
    pick_db_path(explicit_path, from_env, config)
}

fn pick_db_path(
    explicit_path: Option<&Path>,
    from_env: Option<PathBuf>,
    config: Option<&SyncConfig>,
) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return Some(path.to_path_buf());
    }
    if let Some(path) = from_env {
        return Some(path);
    }
    if let Some(config) = config {
        return Some(config.store_path());
    }
    global_contentsync_dir().map(|dir| dir.join(STORE_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_config_missing_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = load_config(temp_dir.path()).unwrap();

        assert_eq!(config.collection, "default");
        assert!(config.prune_stale);
        assert_eq!(config.project_root, temp_dir.path());
    }

    #[test]
    fn test_load_config_reads_file() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join(CONFIG_DIR)).unwrap();
        fs::write(
            config_path(temp_dir.path()),
            r#"{"base": "src/content", "collection": "blog", "pruneStale": false}"#,
        )
        .unwrap();

        let config = load_config(temp_dir.path()).unwrap();
        assert_eq!(config.base, Some(PathBuf::from("src/content")));
        assert_eq!(config.collection, "blog");
        assert!(!config.prune_stale);
    }

    #[test]
    fn test_load_config_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join(CONFIG_DIR)).unwrap();
        fs::write(config_path(temp_dir.path()), "{ not json").unwrap();

        let err = load_config(temp_dir.path()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_discover_project_root_from_subdirectory() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join(CONFIG_DIR)).unwrap();
        let nested = temp_dir.path().join("src/content/posts");
        fs::create_dir_all(&nested).unwrap();

        assert_eq!(discover_project_root(&nested), Some(temp_dir.path().to_path_buf()));
    }

    #[test]
    fn test_db_path_priority() {
        let config = SyncConfig::for_root("/site");
        let explicit = PathBuf::from("/custom/store.db");

        assert_eq!(
            pick_db_path(Some(explicit.as_path()), Some("/env.db".into()), Some(&config)),
            Some(explicit.clone())
        );
        assert_eq!(
            pick_db_path(None, Some("/env.db".into()), Some(&config)),
            Some(PathBuf::from("/env.db"))
        );
        assert_eq!(
            pick_db_path(None, None, Some(&config)),
            Some(PathBuf::from("/site/.contentsync/store.db"))
        );
    }

    #[test]
    fn test_store_path_relative_db() {
        let config = SyncConfig {
            db: Some(PathBuf::from("data/entries.db")),
            ..SyncConfig::for_root("/site")
        };
        assert_eq!(config.store_path(), PathBuf::from("/site/data/entries.db"));
    }

    #[test]
    fn test_global_fallback_is_store_db() {
        let path = pick_db_path(None, None, None).unwrap();
        assert!(path.ends_with(".contentsync/store.db"));
    }
}
