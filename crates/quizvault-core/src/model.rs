//! Core data model types for quizvault.
//!
//! A [`Test`] owns its [`Question`]s, which own their [`Answer`]s. Student
//! results ([`StudentDegree`]) are stored separately and linked back to their
//! test by name.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::validation::IssueSet;

/// One choice of a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    /// Text shown next to the radio button or check box.
    #[serde(rename = "string")]
    pub text: String,
    /// Whether selecting this answer earns credit.
    #[serde(rename = "valid")]
    pub is_correct: bool,
}

impl Answer {
    pub fn new(text: impl Into<String>, is_correct: bool) -> Self {
        Self {
            text: text.into(),
            is_correct,
        }
    }

    pub fn correct(text: impl Into<String>) -> Self {
        Self::new(text, true)
    }

    pub fn wrong(text: impl Into<String>) -> Self {
        Self::new(text, false)
    }
}

/// How a question is answered. Always derived from the answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuestionMode {
    /// Exactly one correct answer: radio buttons.
    Single,
    /// Two or more correct answers: check boxes with partial credit.
    Multi,
}

impl fmt::Display for QuestionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionMode::Single => write!(f, "single"),
            QuestionMode::Multi => write!(f, "multi"),
        }
    }
}

/// A question with its ordered answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "crate::records::WireQuestion")]
pub struct Question {
    #[serde(rename = "question")]
    pub prompt: String,
    /// Image file name, resolved by the caller.
    #[serde(rename = "pic")]
    pub image_ref: Option<String>,
    pub answers: Vec<Answer>,
}

impl Question {
    /// Build a question, rejecting it if it violates an invariant.
    pub fn new(
        prompt: impl Into<String>,
        image_ref: Option<String>,
        answers: Vec<Answer>,
    ) -> Result<Self, ValidationError> {
        let question = Self {
            prompt: prompt.into(),
            image_ref,
            answers,
        };
        question.validate()?;
        Ok(question)
    }

    /// Number of answers marked correct.
    pub fn correct_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_correct).count()
    }

    /// Authoring indices of the correct answers, ascending.
    pub fn correct_indices(&self) -> Vec<usize> {
        self.answers
            .iter()
            .enumerate()
            .filter(|(_, a)| a.is_correct)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn mode(&self) -> QuestionMode {
        if self.correct_count() == 1 {
            QuestionMode::Single
        } else {
            QuestionMode::Multi
        }
    }

    /// Every invariant this question currently violates.
    pub fn issues(&self) -> IssueSet {
        let mut issues = IssueSet::new();
        let correct = self.correct_count();
        issues.set(ValidationError::EmptyQuestion, self.prompt.trim().is_empty());
        issues.set(ValidationError::TooFewAnswers, self.answers.len() < 2);
        issues.set(
            ValidationError::EmptyAnswer,
            self.answers.iter().any(|a| a.text.trim().is_empty()),
        );
        issues.set(ValidationError::NoCorrectAnswer, correct == 0);
        issues.set(
            ValidationError::AllAnswersCorrect,
            !self.answers.is_empty() && correct == self.answers.len(),
        );
        issues
    }

    /// The first violated invariant, if any.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.issues().into_result()
    }
}

/// An exam: its questions, time limit and total degree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Test {
    #[serde(default)]
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "time")]
    pub time_limit_seconds: u32,
    pub questions: Vec<Question>,
    /// Total degree, split evenly across the questions.
    #[serde(rename = "degree")]
    pub max_degree: f64,
    /// Results recorded for this test, attached by name after loading.
    #[serde(skip)]
    pub student_degrees: Vec<StudentDegree>,
}

impl Test {
    /// Build a test, rejecting it if it or any of its questions is invalid.
    pub fn new(
        id: u32,
        name: impl Into<String>,
        description: impl Into<String>,
        time_limit_seconds: u32,
        questions: Vec<Question>,
        max_degree: f64,
    ) -> Result<Self, ValidationError> {
        let test = Self {
            id,
            name: name.into(),
            description: description.into(),
            time_limit_seconds,
            questions,
            max_degree,
            student_degrees: Vec::new(),
        };
        test.validate()?;
        Ok(test)
    }

    /// Degree each question is worth.
    ///
    /// # Panics
    ///
    /// Panics if the test has no questions; validated tests always have one.
    pub fn degree_per_question(&self) -> f64 {
        assert!(
            !self.questions.is_empty(),
            "degree_per_question on a test without questions"
        );
        self.max_degree / self.questions.len() as f64
    }

    /// Invariants of the test itself (not of its questions).
    pub fn issues(&self) -> IssueSet {
        let mut issues = IssueSet::new();
        issues.set(ValidationError::NameTooShort, self.name.chars().count() < 3);
        issues.set(ValidationError::NoQuestions, self.questions.is_empty());
        issues.set(
            ValidationError::NonPositiveDegree,
            !(self.max_degree.is_finite() && self.max_degree > 0.0),
        );
        issues.set(ValidationError::NoTimeLimit, self.time_limit_seconds == 0);
        issues
    }

    /// Validate the test and every question in it.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.issues().into_result()?;
        self.questions.iter().try_for_each(Question::validate)
    }

    /// Whether a student with this name and grade already has a result.
    pub fn has_attempt(&self, name: &str, grade: &str) -> bool {
        self.student_degrees
            .iter()
            .any(|d| d.name == name && d.grade == grade)
    }

    /// Equality of everything but the results, used to spot re-imports.
    pub fn same_content(&self, other: &Test) -> bool {
        self.name == other.name
            && self.description == other.description
            && self.time_limit_seconds == other.time_limit_seconds
            && self.max_degree == other.max_degree
            && self.questions == other.questions
    }
}

/// The stored result of one completed exam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentDegree {
    pub name: String,
    pub phone: String,
    pub school: String,
    pub grade: String,
    /// Sum of earned degrees.
    pub degree: f64,
    /// The test's total degree at the time it was taken.
    pub out_of: f64,
    /// Questions answered with zero credit.
    pub failed_at: BTreeSet<usize>,
    /// Questions never answered.
    pub left: BTreeSet<usize>,
    /// Name of the test this result belongs to.
    #[serde(default)]
    pub test: String,
}

/// Details a student enters before starting an exam.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentInfo {
    pub name: String,
    pub school: String,
    pub grade: String,
    pub phone: String,
}

impl StudentInfo {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.split_whitespace().count() < 2 {
            return Err(ValidationError::NameNotFull);
        }
        if self.grade.trim().is_empty() {
            return Err(ValidationError::MissingGrade);
        }
        Ok(())
    }

    /// Title-case the name and prefix the phone number with `phone_prefix`
    /// unless it already carries it.
    pub fn normalized(&self, phone_prefix: &str) -> StudentInfo {
        let phone = self.phone.trim();
        let phone = if phone.is_empty() || phone.starts_with(phone_prefix) {
            phone.to_string()
        } else {
            format!("{phone_prefix}{phone}")
        };
        StudentInfo {
            name: title_case(self.name.trim()),
            school: self.school.trim().to_string(),
            grade: self.grade.trim().to_string(),
            phone,
        }
    }
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
