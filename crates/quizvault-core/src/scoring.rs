//! Per-question grading and result aggregation.
//!
//! Single-select questions earn the full per-question degree for the correct
//! choice and nothing otherwise. Multi-select questions split the
//! per-question degree evenly between their correct answers; wrong picks
//! neither add nor subtract. A question with nothing selected is
//! [`Degree::Unanswered`], which is never the same as earning zero.

use std::collections::BTreeSet;

use crate::error::ChoiceError;
use crate::model::{Question, QuestionMode};

/// The degree earned on one question.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Degree {
    /// Nothing is selected.
    Unanswered,
    /// Something is selected; `0.0` means answered and fully wrong.
    Earned(f64),
}

impl Degree {
    pub fn is_unanswered(&self) -> bool {
        matches!(self, Degree::Unanswered)
    }

    /// Earned value, with unanswered counting as zero.
    pub fn value(&self) -> f64 {
        match self {
            Degree::Unanswered => 0.0,
            Degree::Earned(d) => *d,
        }
    }

    /// Answered, and worth nothing.
    pub fn is_failed(&self) -> bool {
        matches!(self, Degree::Earned(d) if *d == 0.0)
    }
}

/// Grade a selection of authoring indices against `question`.
///
/// Credit is accumulated in answer order so repeated runs round the same way.
pub fn grade(question: &Question, selected: &BTreeSet<usize>, degree_per_question: f64) -> Degree {
    if selected.is_empty() {
        return Degree::Unanswered;
    }
    match question.mode() {
        QuestionMode::Single => {
            let correct = selected
                .iter()
                .all(|&i| question.answers.get(i).is_some_and(|a| a.is_correct));
            Degree::Earned(if correct { degree_per_question } else { 0.0 })
        }
        QuestionMode::Multi => {
            let correct_count = question.correct_count();
            let mut degree = 0.0;
            for (i, answer) in question.answers.iter().enumerate() {
                if answer.is_correct && selected.contains(&i) {
                    degree += degree_per_question / correct_count as f64;
                }
            }
            Degree::Earned(degree)
        }
    }
}

/// Live selection state of one question, regraded on every choice.
#[derive(Debug, Clone)]
pub struct AnswerSheet {
    question: Question,
    degree_per_question: f64,
    selected: BTreeSet<usize>,
    degree: Degree,
}

impl AnswerSheet {
    pub fn new(question: Question, degree_per_question: f64) -> Self {
        Self {
            question,
            degree_per_question,
            selected: BTreeSet::new(),
            degree: Degree::Unanswered,
        }
    }

    pub fn question(&self) -> &Question {
        &self.question
    }

    pub fn mode(&self) -> QuestionMode {
        self.question.mode()
    }

    pub fn degree(&self) -> Degree {
        self.degree
    }

    pub fn selected(&self) -> &BTreeSet<usize> {
        &self.selected
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.selected.contains(&index)
    }

    /// Whether `index` can currently be chosen.
    ///
    /// Radio buttons are always enabled. Once as many check boxes are
    /// checked as there are correct answers, the unchecked ones are not.
    pub fn is_enabled(&self, index: usize) -> bool {
        if index >= self.question.answers.len() {
            return false;
        }
        match self.mode() {
            QuestionMode::Single => true,
            QuestionMode::Multi => {
                self.selected.contains(&index)
                    || self.selected.len() < self.question.correct_count()
            }
        }
    }

    /// Choose answer `index`: select the radio button, or toggle the check
    /// box. Returns the regraded degree.
    pub fn choose(&mut self, index: usize) -> Result<Degree, ChoiceError> {
        let count = self.question.answers.len();
        if index >= count {
            return Err(ChoiceError::OutOfRange { index, count });
        }
        match self.mode() {
            QuestionMode::Single => {
                self.selected.clear();
                self.selected.insert(index);
            }
            QuestionMode::Multi => {
                if !self.selected.remove(&index) {
                    if !self.is_enabled(index) {
                        return Err(ChoiceError::Disabled(index));
                    }
                    self.selected.insert(index);
                }
            }
        }
        self.degree = grade(&self.question, &self.selected, self.degree_per_question);
        Ok(self.degree)
    }
}

/// The classified result of a whole exam.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    /// Sum of earned degrees, unanswered questions excluded.
    pub total_degree: f64,
    /// Questions answered with zero credit.
    pub failed_at: BTreeSet<usize>,
    /// Questions never answered.
    pub left: BTreeSet<usize>,
    pub question_count: usize,
}

impl Aggregate {
    /// Questions that earned credit: neither failed nor left.
    pub fn credited(&self) -> BTreeSet<usize> {
        (0..self.question_count)
            .filter(|i| !self.failed_at.contains(i) && !self.left.contains(i))
            .collect()
    }
}

/// Sum and classify per-question degrees, left to right.
///
/// # Panics
///
/// Panics if `degrees` is empty: a test always has questions.
pub fn aggregate(degrees: &[Degree]) -> Aggregate {
    assert!(!degrees.is_empty(), "aggregate over zero questions");

    let mut total_degree = 0.0;
    let mut failed_at = BTreeSet::new();
    let mut left = BTreeSet::new();
    for (i, degree) in degrees.iter().enumerate() {
        match degree {
            Degree::Unanswered => {
                left.insert(i);
            }
            Degree::Earned(d) => {
                total_degree += d;
                if *d == 0.0 {
                    failed_at.insert(i);
                }
            }
        }
    }

    Aggregate {
        total_degree,
        failed_at,
        left,
        question_count: degrees.len(),
    }
}

/// Whether any question is still unanswered.
pub fn any_unanswered(degrees: &[Degree]) -> bool {
    degrees.iter().any(Degree::is_unanswered)
}
