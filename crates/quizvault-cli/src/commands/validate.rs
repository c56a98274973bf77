//! The `quizvault validate` command.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use quizvault_core::config::QuizvaultConfig;
use quizvault_core::model::Test;
use quizvault_core::store::read_records;
use quizvault_core::validation::validate_bank;

pub fn execute(config: &QuizvaultConfig, bank_path: PathBuf) -> Result<()> {
    if !bank_path.exists() {
        bail!("bank file not found: {}", bank_path.display());
    }
    let tests: Vec<Test> = read_records(&bank_path, &config.envelope())
        .with_context(|| format!("{} is not a valid data file", bank_path.display()))?;

    let total_questions: usize = tests.iter().map(|t| t.questions.len()).sum();
    println!(
        "Bank: {} ({} tests, {} questions)",
        bank_path.display(),
        tests.len(),
        total_questions
    );

    let issues = validate_bank(&tests);
    for issue in &issues {
        match issue.question {
            Some(q) => println!("  [{}] question {}: {}", issue.test, q + 1, issue.issue),
            None => println!("  [{}] {}", issue.test, issue.issue),
        }
    }

    if !issues.is_empty() {
        bail!("{} issue(s) found", issues.len());
    }
    println!("All tests valid.");
    Ok(())
}
