//! Error types for content-sync.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=store, 3=not_found, 4=validation, etc.)
//! - Context-aware recovery hints (including corrected base directories)
//! - Structured JSON output for piped / non-TTY consumers
//!
//! Errors fall into the three sync categories:
//! - **Configuration** errors abort a run before any file is processed
//! - **Per-file** errors are collected into a report and never abort siblings
//! - **Consistency warnings** are not errors at all, see [`crate::sync::SyncWarning`]

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for content-sync operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Store (exit 2)
    StoreNotFound,
    StoreError,

    // Not Found (exit 3)
    EntryNotFound,

    // Per-file pipeline (exit 4)
    LoadFailed,
    InvalidId,
    ValidationFailed,
    RenderFailed,

    // Config (exit 7)
    AmbiguousBaseDirectory,
    BaseDirectoryNotFound,
    PathOutsideBase,
    ConfigError,

    // I/O (exit 8)
    IoError,
    JsonError,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::StoreNotFound => "STORE_NOT_FOUND",
            Self::StoreError => "STORE_ERROR",
            Self::EntryNotFound => "ENTRY_NOT_FOUND",
            Self::LoadFailed => "LOAD_FAILED",
            Self::InvalidId => "INVALID_ID",
            Self::ValidationFailed => "VALIDATION_FAILED",
            Self::RenderFailed => "RENDER_FAILED",
            Self::AmbiguousBaseDirectory => "AMBIGUOUS_BASE_DIRECTORY",
            Self::BaseDirectoryNotFound => "BASE_DIRECTORY_NOT_FOUND",
            Self::PathOutsideBase => "PATH_OUTSIDE_BASE",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InternalError => 1,
            Self::StoreNotFound | Self::StoreError => 2,
            Self::EntryNotFound => 3,
            Self::LoadFailed | Self::InvalidId | Self::ValidationFailed | Self::RenderFailed => 4,
            Self::AmbiguousBaseDirectory
            | Self::BaseDirectoryNotFound
            | Self::PathOutsideBase
            | Self::ConfigError => 7,
            Self::IoError | Self::JsonError => 8,
        }
    }

    /// Whether retrying with corrected input can succeed.
    ///
    /// True for per-file content problems (fix the file, resave) and for
    /// configuration mistakes. False for I/O, store, or internal errors.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::LoadFailed
                | Self::InvalidId
                | Self::ValidationFailed
                | Self::RenderFailed
                | Self::AmbiguousBaseDirectory
                | Self::BaseDirectoryNotFound
                | Self::PathOutsideBase
        )
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in content-sync operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Cannot infer base directory from {count} tracked file(s); at least 2 are required")]
    AmbiguousBaseDirectory { count: usize },

    #[error("Base directory does not exist: {}", path.display())]
    BaseDirectoryNotFound {
        path: PathBuf,
        /// Existing directory the path most likely meant.
        suggestion: Option<PathBuf>,
    },

    #[error("Tracked file {} is outside base directory {}", path.display(), base.display())]
    PathOutsideBase { path: PathBuf, base: PathBuf },

    #[error("Failed to load module {}: {message}", path.display())]
    Load { path: PathBuf, message: String },

    #[error("Cannot derive an entry id for {} (entry path '{entry}')", path.display())]
    InvalidId { path: PathBuf, entry: String },

    #[error("Validation failed for entry '{id}' ({}): {message}", path.display())]
    Validation {
        id: String,
        path: PathBuf,
        message: String,
    },

    #[error("Failed to render {}: {message}", path.display())]
    Render { path: PathBuf, message: String },

    #[error("No content store at {}", path.display())]
    StoreNotFound { path: PathBuf },

    #[error("Entry not found: {id}")]
    EntryNotFound { id: String },

    #[error("Store error: {0}")]
    Store(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::AmbiguousBaseDirectory { .. } => ErrorCode::AmbiguousBaseDirectory,
            Self::BaseDirectoryNotFound { .. } => ErrorCode::BaseDirectoryNotFound,
            Self::PathOutsideBase { .. } => ErrorCode::PathOutsideBase,
            Self::Load { .. } => ErrorCode::LoadFailed,
            Self::InvalidId { .. } => ErrorCode::InvalidId,
            Self::Validation { .. } => ErrorCode::ValidationFailed,
            Self::Render { .. } => ErrorCode::RenderFailed,
            Self::StoreNotFound { .. } => ErrorCode::StoreNotFound,
            Self::EntryNotFound { .. } => ErrorCode::EntryNotFound,
            Self::Store(_) | Self::Database(_) => ErrorCode::StoreError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Configuration errors abort a run before any file is processed.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::AmbiguousBaseDirectory { .. }
                | Self::BaseDirectoryNotFound { .. }
                | Self::PathOutsideBase { .. }
                | Self::Config(_)
        )
    }

    /// Per-file errors are reported individually and skip only that file.
    ///
    /// Store failures count as per-file: a write that fails for one entry
    /// does not stop the others. A missing store is not, since nothing can
    /// be written at all.
    #[must_use]
    pub const fn is_per_file(&self) -> bool {
        matches!(
            self,
            Self::Load { .. }
                | Self::InvalidId { .. }
                | Self::Validation { .. }
                | Self::Render { .. }
                | Self::Store(_)
                | Self::Database(_)
        )
    }

    /// Context-aware recovery hint.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::AmbiguousBaseDirectory { .. } => Some(
                "Set an explicit base directory with `base` in .contentsync/config.json \
                 or track at least two files so the common root can be inferred."
                    .to_string(),
            ),

            Self::BaseDirectoryNotFound {
                suggestion: Some(suggested),
                path,
            } => Some(format!(
                "'{}' looks like a relative path written as absolute. Did you mean '{}'?",
                path.display(),
                suggested.display()
            )),
            Self::BaseDirectoryNotFound { path, .. } => Some(format!(
                "Create '{}' or point `base` at an existing directory.",
                path.display()
            )),

            Self::PathOutsideBase { base, .. } => Some(format!(
                "Every tracked file must live under '{}'. Move the file or widen `base`.",
                base.display()
            )),

            Self::StoreNotFound { .. } => Some(
                "Run a sync for this project first, or pass `--db` to point at an existing store."
                    .to_string(),
            ),

            Self::InvalidId { .. } => Some(
                "Rename the file so its name contains letters or digits, or set a `slug` in its metadata."
                    .to_string(),
            ),

            Self::EntryNotFound { id } => Some(format!(
                "No entry with ID '{id}'. Use `csync entries list` to see stored entries."
            )),

            Self::Load { .. }
            | Self::Validation { .. }
            | Self::Render { .. }
            | Self::Store(_)
            | Self::Database(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::Config(_)
            | Self::Other(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_classification() {
        let err = Error::AmbiguousBaseDirectory { count: 1 };
        assert!(err.is_configuration());
        assert!(!err.is_per_file());
        assert_eq!(err.exit_code(), 7);
    }

    #[test]
    fn test_per_file_classification() {
        let err = Error::Validation {
            id: "posts/a".into(),
            path: PathBuf::from("/site/posts/a.md"),
            message: "title is required".into(),
        };
        assert!(err.is_per_file());
        assert!(!err.is_configuration());
        assert!(err.to_string().contains("posts/a"));
    }

    #[test]
    fn test_store_errors_are_per_file() {
        assert!(Error::Store("disk full".into()).is_per_file());
        assert!(Error::Database(rusqlite::Error::InvalidQuery).is_per_file());
        assert!(!Error::StoreNotFound { path: PathBuf::from("/site/store.db") }.is_per_file());
        assert!(!Error::Store("disk full".into()).is_configuration());
    }

    #[test]
    fn test_invalid_id_is_per_file() {
        let err = Error::InvalidId {
            path: PathBuf::from("/site/content/!!!.md"),
            entry: "!!!.md".into(),
        };
        assert!(err.is_per_file());
        assert_eq!(err.exit_code(), 4);
        assert_eq!(err.to_structured_json()["error"]["code"], "INVALID_ID");
        assert!(err.hint().unwrap().contains("slug"));
    }

    #[test]
    fn test_base_dir_hint_includes_suggestion() {
        let err = Error::BaseDirectoryNotFound {
            path: PathBuf::from("/src/content"),
            suggestion: Some(PathBuf::from("/home/me/site/src/content")),
        };
        let hint = err.hint().unwrap();
        assert!(hint.contains("/home/me/site/src/content"));
    }

    #[test]
    fn test_structured_json() {
        let err = Error::EntryNotFound { id: "missing".into() };
        let json = err.to_structured_json();
        assert_eq!(json["error"]["code"], "ENTRY_NOT_FOUND");
        assert_eq!(json["error"]["exit_code"], 3);
        assert!(json["error"]["hint"].is_string());
    }
}
