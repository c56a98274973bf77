//! The `quizvault list` command.

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use quizvault_core::config::QuizvaultConfig;
use quizvault_core::session::format_clock;

pub fn execute(config: &QuizvaultConfig) -> Result<()> {
    let (tests, _) = config
        .store()
        .load_bank_with_degrees()
        .context("failed to load the question bank")?;

    if tests.is_empty() {
        println!("No tests yet. Run `quizvault import --from <bank.json>` to add some.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Questions", "Time", "Degree", "Attempts"]);
    for test in &tests {
        table.add_row(vec![
            Cell::new(test.id),
            Cell::new(&test.name),
            Cell::new(test.questions.len()),
            Cell::new(format_clock(test.time_limit_seconds)),
            Cell::new(test.max_degree),
            Cell::new(test.student_degrees.len()),
        ]);
    }
    println!("{table}");
    Ok(())
}
