//! content-sync - incremental synchronization of source modules into a content store
//!
//! This crate provides the sync engine and the `csync` inspection CLI.
//!
//! # Architecture
//!
//! - [`sync`] - Base directory resolution, id generation, the sync engine and watch routing
//! - [`model`] - Data types (Module, ModuleProvider, StoreRecord)
//! - [`storage`] - Store trait with in-memory and SQLite implementations
//! - [`config`] - Project discovery and configuration
//! - [`cli`] - Command-line interface using clap
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod storage;
pub mod sync;

pub use error::{Error, Result};
