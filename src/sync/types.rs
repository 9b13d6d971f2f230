//! Sync result types.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::Error;

/// How the bulk pass handled one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No record existed under the id; one was written.
    Created,
    /// A stale record existed under the id and was replaced.
    Updated,
    /// Stored digest matched; processing skipped.
    Unchanged,
}

/// How a change notification was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeOutcome {
    /// Path had no previous id.
    Created,
    /// Path kept its id; the record was rewritten.
    Updated,
    /// Path's id moved; the record under `from` was deleted first.
    Renamed { from: String },
}

/// A file that could not be synchronized.
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: Error,
}

/// Non-fatal condition noticed during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SyncWarning {
    /// The module source tracked no files at all.
    NoTrackedFiles { base: PathBuf },
}

impl std::fmt::Display for SyncWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoTrackedFiles { base } => {
                write!(f, "No files matched under {}", base.display())
            }
        }
    }
}

/// Result of a bulk synchronization pass.
#[derive(Debug, Default)]
pub struct SyncReport {
    /// Files written under an id that had no record.
    pub created: usize,
    /// Files whose stale record was replaced.
    pub updated: usize,
    /// Files skipped because their digest matched.
    pub unchanged: usize,
    /// Records removed because no tracked file claims their id.
    pub pruned: usize,
    /// Per-file failures.
    pub failures: Vec<FileFailure>,
    /// Non-fatal warnings.
    pub warnings: Vec<SyncWarning>,
}

impl SyncReport {
    /// Record the outcome of one file.
    pub fn record(&mut self, outcome: SyncOutcome) {
        match outcome {
            SyncOutcome::Created => self.created += 1,
            SyncOutcome::Updated => self.updated += 1,
            SyncOutcome::Unchanged => self.unchanged += 1,
        }
    }

    /// Record a per-file failure.
    pub fn fail(&mut self, path: &Path, error: Error) {
        self.failures.push(FileFailure {
            path: path.to_path_buf(),
            error,
        });
    }

    /// Number of records written this pass.
    #[must_use]
    pub fn written(&self) -> usize {
        self.created + self.updated
    }

    /// Number of files that failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Total files processed, successful or not.
    #[must_use]
    pub fn total(&self) -> usize {
        self.written() + self.unchanged + self.failed()
    }

    /// Whether every file synchronized without error.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counters() {
        let mut report = SyncReport::default();
        report.record(SyncOutcome::Created);
        report.record(SyncOutcome::Updated);
        report.record(SyncOutcome::Unchanged);
        report.fail(Path::new("/c/bad.md"), Error::Other("boom".into()));

        assert_eq!(report.written(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.total(), 4);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_warning_serializes_tagged() {
        let warning = SyncWarning::NoTrackedFiles {
            base: PathBuf::from("/site/content"),
        };
        let json = serde_json::to_value(&warning).unwrap();
        assert_eq!(json["kind"], "no_tracked_files");
        assert!(warning.to_string().contains("/site/content"));
    }
}
