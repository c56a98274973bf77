//! The `quizvault delete-result` command.

use anyhow::{Context, Result};

use quizvault_core::config::QuizvaultConfig;

pub fn execute(config: &QuizvaultConfig, index: usize) -> Result<()> {
    let removed = config
        .store()
        .remove_degree(index)
        .with_context(|| format!("failed to delete result {index}"))?;
    println!(
        "Deleted result {index}: {} ({}) in {}, {} / {}",
        removed.name, removed.grade, removed.test, removed.degree, removed.out_of
    );
    Ok(())
}
