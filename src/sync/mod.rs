//! Incremental content synchronization.
//!
//! Keeps a [`Store`](crate::storage::Store) consistent with a changing set of
//! source files:
//!
//! - **Base directory**: Explicit or inferred root for all entry paths
//! - **Ids**: Stable logical ids derived from entry paths or a declared slug
//! - **Hashing**: Content digests so unchanged files skip reprocessing
//! - **Engine**: Bulk pass, change and unlink handling, rename detection
//! - **Router**: Watch events routed to the engine over a channel
//!
//! # Architecture
//!
//! Identity lives in two places. The filesystem identity of a file is its
//! absolute path; the logical identity is the id generated from it. Both can
//! move. The engine's [`FileIdentityIndex`] remembers which id each path last
//! produced, so a change can delete the record under a stale id and an
//! unlink can find the record to remove.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use contentsync::model::{Module, ModuleSource};
//! use contentsync::storage::MemoryStore;
//! use contentsync::sync::SyncEngine;
//!
//! let source = ModuleSource::new()
//!     .with("src/content/a.md", Module::new("# A"))
//!     .with("src/content/b.md", Module::new("# B"));
//!
//! let engine = SyncEngine::builder(Arc::new(MemoryStore::new()), project_root, render)
//!     .build(source)?;
//! let (report, router) = engine.start(Some(&mut watcher)).await?;
//! if let Some(router) = router {
//!     router.run(events).await;
//! }
//! ```

mod base_dir;
mod collaborators;
mod engine;
mod hash;
mod id;
mod index;
mod router;
mod types;

pub use base_dir::{canonical_path, entry_path, infer_common_base, resolve_base_dir, to_slash};
pub use collaborators::{
    PassthroughValidator, RenderError, Renderer, ValidationError, ValidationInput, Validator,
};
pub use engine::{SyncEngine, SyncEngineBuilder};
pub use hash::{content_digest, Digester, Sha256Digester};
pub use id::{generate_id, slugify, DefaultIdGenerator, IdGenerator};
pub use index::FileIdentityIndex;
pub use router::{RouterStats, WatchEvent, WatchEventRouter, Watcher};
pub use types::{ChangeOutcome, FileFailure, SyncOutcome, SyncReport, SyncWarning};
