//! Merging an external question bank into the current one.
//!
//! Each incoming test is matched by name against the bank:
//! - no test with that name: appended with a fresh id;
//! - same name and same content: discarded as a duplicate;
//! - same name, different content: a conflict, resolved by [`ConflictPolicy`].
//!
//! A conflict is about the questions when the question lists differ, and
//! about the details (description, time limit, degree) otherwise.

use std::fmt;

use crate::model::Test;

/// What to do with an incoming test whose name is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictPolicy {
    /// Keep the existing test untouched.
    #[default]
    Skip,
    /// Replace the existing test's content, keeping its id.
    Override,
    /// Append the incoming questions to the existing test. Detail
    /// conflicts are skipped.
    Merge,
}

/// Which part of a same-name test differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    Details,
    Questions,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictKind::Details => write!(f, "different details"),
            ConflictKind::Questions => write!(f, "different questions"),
        }
    }
}

/// What happened to one incoming test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportAction {
    Added { id: u32 },
    Duplicate,
    Skipped(ConflictKind),
    Overridden(ConflictKind),
    /// Number of questions appended.
    Merged { added_questions: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportEntry {
    pub name: String,
    pub action: ImportAction,
}

/// Outcome of an import, one entry per incoming test in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub entries: Vec<ImportEntry>,
}

impl ImportReport {
    pub fn added(&self) -> usize {
        self.count(|a| matches!(a, ImportAction::Added { .. }))
    }

    pub fn duplicates(&self) -> usize {
        self.count(|a| matches!(a, ImportAction::Duplicate))
    }

    pub fn conflicts(&self) -> usize {
        self.count(|a| {
            matches!(
                a,
                ImportAction::Skipped(_) | ImportAction::Overridden(_) | ImportAction::Merged { .. }
            )
        })
    }

    /// Whether the bank changed.
    pub fn changed(&self) -> bool {
        self.entries.iter().any(|e| {
            matches!(
                e.action,
                ImportAction::Added { .. }
                    | ImportAction::Overridden(_)
                    | ImportAction::Merged { .. }
            )
        })
    }

    fn count(&self, pred: impl Fn(&ImportAction) -> bool) -> usize {
        self.entries.iter().filter(|e| pred(&e.action)).count()
    }
}

/// Classify an incoming test against the existing one of the same name.
pub fn classify(existing: &Test, incoming: &Test) -> Option<ConflictKind> {
    if existing.same_content(incoming) {
        None
    } else if existing.questions != incoming.questions {
        Some(ConflictKind::Questions)
    } else {
        Some(ConflictKind::Details)
    }
}

/// Merge `incoming` into `bank` in place.
///
/// New tests get ids counting up from the largest id in the bank. Incoming
/// results are never imported; results live in the degrees file.
pub fn merge_into(bank: &mut Vec<Test>, incoming: Vec<Test>, policy: ConflictPolicy) -> ImportReport {
    let mut next_id = bank.iter().map(|t| t.id).max().unwrap_or(0) + 1;
    let mut report = ImportReport::default();

    for mut test in incoming {
        test.student_degrees.clear();
        let name = test.name.clone();

        let action = match bank.iter_mut().find(|t| t.name == test.name) {
            None => {
                test.id = next_id;
                next_id += 1;
                bank.push(test);
                ImportAction::Added { id: next_id - 1 }
            }
            Some(existing) => match classify(existing, &test) {
                None => ImportAction::Duplicate,
                Some(kind) => resolve(existing, test, kind, policy),
            },
        };

        tracing::info!(test = %name, action = ?action, "import decision");
        report.entries.push(ImportEntry { name, action });
    }
    report
}

fn resolve(existing: &mut Test, incoming: Test, kind: ConflictKind, policy: ConflictPolicy) -> ImportAction {
    match (policy, kind) {
        (ConflictPolicy::Skip, _) | (ConflictPolicy::Merge, ConflictKind::Details) => {
            ImportAction::Skipped(kind)
        }
        (ConflictPolicy::Override, _) => {
            existing.description = incoming.description;
            existing.time_limit_seconds = incoming.time_limit_seconds;
            existing.max_degree = incoming.max_degree;
            existing.questions = incoming.questions;
            ImportAction::Overridden(kind)
        }
        (ConflictPolicy::Merge, ConflictKind::Questions) => {
            let before = existing.questions.len();
            for question in incoming.questions {
                if !existing.questions.contains(&question) {
                    existing.questions.push(question);
                }
            }
            ImportAction::Merged {
                added_questions: existing.questions.len() - before,
            }
        }
    }
}
