//! The `quizvault export` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use quizvault_core::config::QuizvaultConfig;
use quizvault_core::store::write_records;

pub fn execute(config: &QuizvaultConfig, to: Option<PathBuf>) -> Result<()> {
    let store = config.store();
    let bank = store.load_bank().context("failed to load the question bank")?;

    let target = to.unwrap_or_else(|| {
        let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
        PathBuf::from(format!("quizvault-export-{stamp}.json"))
    });
    write_records(&target, store.envelope(), &bank)
        .with_context(|| format!("failed to write {}", target.display()))?;

    println!("Exported {} test(s) to {}", bank.len(), target.display());
    Ok(())
}
