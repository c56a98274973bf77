//! The `quizvault import` command.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use quizvault_core::config::QuizvaultConfig;
use quizvault_core::import::{merge_into, ConflictPolicy, ImportAction};
use quizvault_core::model::Test;
use quizvault_core::store::read_records;
use quizvault_core::validation::validate_bank;

pub fn execute(config: &QuizvaultConfig, from: PathBuf, policy: ConflictPolicy) -> Result<()> {
    if !from.exists() {
        bail!("bank file not found: {}", from.display());
    }
    let incoming: Vec<Test> = read_records(&from, &config.envelope())
        .with_context(|| format!("{} is not a valid data file", from.display()))?;
    if incoming.is_empty() {
        bail!("{} is empty", from.display());
    }

    let issues = validate_bank(&incoming);
    if let Some(first) = issues.first() {
        bail!(
            "{} has {} invalid entr{}, first in test '{}': {} (run `quizvault validate --bank {}`)",
            from.display(),
            issues.len(),
            if issues.len() == 1 { "y" } else { "ies" },
            first.test,
            first.issue,
            from.display()
        );
    }

    let store = config.store();
    let mut bank = store.load_bank().context("failed to load the question bank")?;
    let report = merge_into(&mut bank, incoming, policy);

    for entry in &report.entries {
        let what = match &entry.action {
            ImportAction::Added { id } => format!("added with id {id}"),
            ImportAction::Duplicate => "already exists, discarded".to_string(),
            ImportAction::Skipped(kind) => format!("same name, {kind}: skipped"),
            ImportAction::Overridden(kind) => format!("same name, {kind}: overridden"),
            ImportAction::Merged { added_questions } => {
                format!("same name, different questions: {added_questions} question(s) added")
            }
        };
        println!("  {}: {what}", entry.name);
    }

    if report.changed() {
        store.save_bank(&bank).context("failed to save the question bank")?;
    }
    println!(
        "\nImported {} new test(s), {} duplicate(s), {} conflict(s).",
        report.added(),
        report.duplicates(),
        report.conflicts()
    );
    Ok(())
}
