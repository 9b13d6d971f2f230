//! Entries command implementations.

use crate::cli::{EntriesCommands, StoreArgs};
use crate::error::{Error, Result};
use crate::model::StoreRecord;
use crate::storage::EntrySummary;
use colored::Colorize;
use serde::Serialize;

use super::{locate_store, open_store};

/// Output for entries list.
#[derive(Serialize)]
struct EntryListOutput<'a> {
    collection: &'a str,
    entries: Vec<EntrySummary>,
    count: usize,
}

/// Output for entries delete.
#[derive(Serialize)]
struct EntryDeleteOutput<'a> {
    id: &'a str,
    deleted: bool,
}

/// Execute entries commands.
pub fn execute(command: &EntriesCommands, args: StoreArgs<'_>, json: bool) -> Result<()> {
    match command {
        EntriesCommands::List => list(args, json),
        EntriesCommands::Get { id } => get(id, args, json),
        EntriesCommands::Delete { id } => delete(id, args, json),
    }
}

fn list(args: StoreArgs<'_>, json: bool) -> Result<()> {
    let location = locate_store(args)?;
    let store = open_store(&location)?;
    let entries = store.list_entries()?;

    if json {
        let output = EntryListOutput {
            collection: store.collection(),
            count: entries.len(),
            entries,
        };
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No entries in collection '{}'.", store.collection());
        return Ok(());
    }

    for entry in &entries {
        let digest = entry.digest.get(..12).unwrap_or(&entry.digest);
        println!(
            "{}  {}  {}",
            entry.id.bold(),
            entry.file_path.as_deref().unwrap_or("-"),
            digest.dimmed()
        );
    }
    println!();
    println!("{} entries in '{}'", entries.len(), store.collection());
    Ok(())
}

fn get(id: &str, args: StoreArgs<'_>, json: bool) -> Result<()> {
    let location = locate_store(args)?;
    let store = open_store(&location)?;
    let record = store
        .get_entry(id)?
        .ok_or_else(|| Error::EntryNotFound { id: id.to_string() })?;

    if json {
        println!("{}", serde_json::to_string(&record)?);
    } else {
        print_record(&record)?;
    }
    Ok(())
}

fn delete(id: &str, args: StoreArgs<'_>, json: bool) -> Result<()> {
    let location = locate_store(args)?;
    let store = open_store(&location)?;

    if !store.delete_entry(id)? {
        return Err(Error::EntryNotFound { id: id.to_string() });
    }

    if json {
        println!("{}", serde_json::to_string(&EntryDeleteOutput { id, deleted: true })?);
    } else {
        println!("Deleted entry: {id}");
    }
    Ok(())
}

fn print_record(record: &StoreRecord) -> Result<()> {
    println!("{}", record.id.cyan().bold());
    println!("  Path:   {}", record.file_path.as_deref().unwrap_or("-"));
    println!("  Digest: {}", record.digest);
    if !record.data.is_empty() {
        println!("  Data:   {}", serde_json::to_string_pretty(&record.data)?);
    }
    println!();
    println!("{}", record.rendered);
    Ok(())
}
