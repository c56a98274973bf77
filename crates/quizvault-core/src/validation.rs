//! Issue sets and question-bank validation.
//!
//! The editor keeps, per tab, the set of reasons that currently stop the
//! user from leaving it. [`IssueSet`] is that set: reasons are added and
//! removed as fields change, and navigation is blocked while it is non-empty.

use std::collections::{BTreeSet, HashMap};

use crate::error::ValidationError;
use crate::model::Test;

/// A set of outstanding validation problems.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueSet {
    issues: BTreeSet<ValidationError>,
}

impl IssueSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `issue`. Returns `true` if it was not already present.
    pub fn add(&mut self, issue: ValidationError) -> bool {
        self.issues.insert(issue)
    }

    /// Remove `issue`. Returns `true` if it was present.
    pub fn remove(&mut self, issue: &ValidationError) -> bool {
        self.issues.remove(issue)
    }

    /// Add `issue` if `happened`, remove it otherwise.
    pub fn set(&mut self, issue: ValidationError, happened: bool) {
        if happened {
            self.add(issue);
        } else {
            self.remove(&issue);
        }
    }

    pub fn contains(&self, issue: &ValidationError) -> bool {
        self.issues.contains(issue)
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Whether these issues stop the user from navigating away.
    pub fn blocks_navigation(&self) -> bool {
        !self.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.issues.iter()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// `Ok(())` when empty, otherwise the first issue in declaration order.
    pub fn into_result(self) -> Result<(), ValidationError> {
        match self.issues.into_iter().next() {
            Some(issue) => Err(issue),
            None => Ok(()),
        }
    }

    /// All messages joined with `;`, as shown in the editor's status line.
    pub fn summary(&self) -> String {
        self.issues
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(";")
    }
}

impl Extend<ValidationError> for IssueSet {
    fn extend<T: IntoIterator<Item = ValidationError>>(&mut self, iter: T) {
        self.issues.extend(iter);
    }
}

/// Where in a bank an issue was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankIssue {
    /// Name of the test.
    pub test: String,
    /// Question index, if the issue belongs to a question.
    pub question: Option<usize>,
    pub issue: ValidationError,
}

/// Validate a whole question bank: each test, each question, and name
/// uniqueness across tests.
pub fn validate_bank(tests: &[Test]) -> Vec<BankIssue> {
    let mut found = Vec::new();
    let mut name_counts: HashMap<&str, usize> = HashMap::new();
    for test in tests {
        *name_counts.entry(test.name.as_str()).or_default() += 1;
    }

    for test in tests {
        let mut test_issues = test.issues();
        test_issues.set(ValidationError::DuplicateName, name_counts[test.name.as_str()] > 1);
        found.extend(test_issues.iter().map(|issue| BankIssue {
            test: test.name.clone(),
            question: None,
            issue: issue.clone(),
        }));

        for (index, question) in test.questions.iter().enumerate() {
            found.extend(question.issues().iter().map(|issue| BankIssue {
                test: test.name.clone(),
                question: Some(index),
                issue: issue.clone(),
            }));
        }
    }

    found
}
