//! List command handler

use anyhow::{Context, Result};
use std::fs;

use pcdseq::Config;

use super::{sequence_settings, truncate_string};
use crate::cli::SequenceArgs;

/// List the frames a `play` with the same arguments would step through.
#[cfg(not(tarpaulin_include))]
pub fn handle(config: &Config, args: &SequenceArgs) -> Result<()> {
    let settings = sequence_settings(config, args);
    let store = settings.store();
    let sequence = store.discover().with_context(|| {
        format!(
            "Failed to list sequence in {}",
            store.directory().display()
        )
    })?;

    if sequence.is_empty() {
        println!(
            "No files matching {} in {}",
            store.pattern(),
            store.directory().display()
        );
        return Ok(());
    }

    let mut total: u64 = 0;
    let sizes: Vec<u64> = sequence
        .iter()
        .map(|path| fs::metadata(path).map(|m| m.len()).unwrap_or(0))
        .collect();

    println!(
        "Sequence: {} frames in {}",
        sequence.len(),
        store.directory().display()
    );
    println!();
    println!("    # | Size       | Filename");
    println!("------+------------+------------------------------------------");
    for (i, (path, size)) in sequence.iter().zip(&sizes).enumerate() {
        total += size;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        println!(
            "{:>5} | {:>10} | {}",
            i,
            format_size(*size),
            truncate_string(&name, 42)
        );
    }
    println!();
    println!("Total: {}", format_size(total));
    Ok(())
}

fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}
