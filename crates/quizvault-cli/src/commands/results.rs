//! The `quizvault results` command.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use quizvault_core::config::QuizvaultConfig;
use quizvault_core::records::attach_degrees;
use quizvault_core::statistics::{summarize, OutcomeShares, TestSummary};

use crate::OutputFormat;

pub fn execute(
    config: &QuizvaultConfig,
    test_filter: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let store = config.store();
    let mut tests = store.load_bank().context("failed to load the question bank")?;
    let degrees = store.load_degrees().context("failed to load student degrees")?;

    // Keep each result's stored index; `delete-result` takes it.
    let selected: Vec<(usize, _)> = degrees
        .iter()
        .enumerate()
        .filter(|(_, d)| test_filter.as_ref().map_or(true, |t| &d.test == t))
        .collect();

    attach_degrees(&mut tests, degrees.clone());
    let summaries: Vec<TestSummary> = tests
        .iter()
        .filter(|t| test_filter.as_ref().map_or(true, |f| &t.name == f))
        .map(summarize)
        .collect();

    match format {
        OutputFormat::Json => {
            let results: Vec<serde_json::Value> = selected
                .iter()
                .map(|(index, degree)| -> Result<serde_json::Value, serde_json::Error> {
                    let mut value = serde_json::to_value(degree)?;
                    value["index"] = serde_json::json!(index);
                    Ok(value)
                })
                .collect::<Result<_, _>>()?;
            let out = serde_json::json!({
                "results": results,
                "summaries": summaries,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => {
            if selected.is_empty() {
                println!("No results yet.");
                return Ok(());
            }

            let mut table = Table::new();
            table.set_header(vec![
                "#", "Test", "Name", "School", "Grade", "Phone", "Degree", "Correct", "Failed at",
                "Left",
            ]);
            for (index, degree) in &selected {
                let correct = tests
                    .iter()
                    .find(|t| t.name == degree.test)
                    .and_then(|t| OutcomeShares::from_degree(degree, t.questions.len()))
                    .map(|shares| shares.credited_pct);
                table.add_row(vec![
                    Cell::new(index),
                    Cell::new(&degree.test),
                    Cell::new(&degree.name),
                    Cell::new(&degree.school),
                    Cell::new(&degree.grade),
                    Cell::new(&degree.phone),
                    Cell::new(format!("{} / {}", degree.degree, degree.out_of)),
                    Cell::new(correct.map_or("-".to_string(), |pct| format!("{pct:.1}%"))),
                    Cell::new(question_list(&degree.failed_at)),
                    Cell::new(question_list(&degree.left)),
                ]);
            }
            println!("{table}");

            for summary in summaries.iter().filter(|s| s.attempts > 0) {
                print_summary(summary);
            }
        }
    }
    Ok(())
}

/// One-based question numbers, comma separated.
fn question_list(indices: &BTreeSet<usize>) -> String {
    if indices.is_empty() {
        return "-".to_string();
    }
    indices
        .iter()
        .map(|i| (i + 1).to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_summary(summary: &TestSummary) {
    println!("\n{} ({} attempt(s), out of {})", summary.test, summary.attempts, summary.max_degree);
    if let (Some(mean), Some(best), Some(worst)) =
        (summary.mean_degree, summary.best_degree, summary.worst_degree)
    {
        println!("  mean {mean:.2}, best {best}, worst {worst}");
    }
    if let Some(q) = summary.hardest_question() {
        println!(
            "  most failed: question {} ({} student(s))",
            q + 1,
            summary.failed_per_question[q]
        );
    }
}
