//! Data models for content-sync.
//!
//! This module contains the domain models:
//! - Module, ModuleProvider, ModuleSource
//! - StoreRecord

pub mod module;
pub mod record;

pub use module::{LoadFuture, Metadata, Module, ModuleLoader, ModuleProvider, ModuleSource};
pub use record::StoreRecord;
