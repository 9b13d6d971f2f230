//! Status command implementation.

use crate::cli::StoreArgs;
use crate::error::Result;
use serde::Serialize;
use std::path::PathBuf;

use super::{locate_store, open_store};

/// Output for status command.
#[derive(Serialize)]
struct StatusOutput {
    project_root: Option<PathBuf>,
    base: Option<PathBuf>,
    collection: String,
    db_path: PathBuf,
    store_exists: bool,
    prune_stale: bool,
    entry_count: usize,
}

/// Execute status command.
///
/// A missing store is reported, not treated as an error.
pub fn execute(args: StoreArgs<'_>, json: bool) -> Result<()> {
    let location = locate_store(args)?;
    let store_exists = location.db_path.exists();
    let entry_count = if store_exists {
        open_store(&location)?.count_entries()?
    } else {
        0
    };

    let config = location.config.clone().unwrap_or_default();
    let output = StatusOutput {
        project_root: location.config.as_ref().map(|c| c.project_root.clone()),
        base: config.base,
        collection: location.collection,
        db_path: location.db_path,
        store_exists,
        prune_stale: config.prune_stale,
        entry_count,
    };

    if json {
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    println!("Content Sync Status");
    println!("===================");
    println!();
    match &output.project_root {
        Some(root) => println!("Project:    {}", root.display()),
        None => println!("Project:    (none found)"),
    }
    match &output.base {
        Some(base) => println!("Base:       {}", base.display()),
        None => println!("Base:       (inferred)"),
    }
    println!("Collection: {}", output.collection);
    println!("Store:      {}", output.db_path.display());
    println!("Pruning:    {}", if output.prune_stale { "on" } else { "off" });
    println!();

    if output.store_exists {
        println!("Entries: {}", output.entry_count);
    } else {
        println!("Store not created yet.");
    }
    Ok(())
}
