//! Error types for the codec, the data model, the store and exam sessions.
//!
//! Each layer has its own enum so callers can tell a wrong data file apart
//! from a corrupt one, and a rejected click apart from a lost result.

use std::path::PathBuf;

use thiserror::Error;

/// Failures while turning stored bytes back into records.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The envelope did not authenticate: wrong secret, tampered or
    /// truncated bytes.
    #[error("authentication failed: the data was not produced with this key or was modified")]
    Authentication,

    #[error("derived key was rejected by the cipher")]
    Key,

    /// The payload decrypted fine but is not valid record JSON.
    #[error("malformed record payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// The payload decrypted fine but is not UTF-8 text.
    #[error("record payload is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

impl CodecError {
    /// Returns `true` if the bytes could not be authenticated, as opposed to
    /// authenticating but failing to decode.
    pub fn is_authentication(&self) -> bool {
        matches!(self, CodecError::Authentication)
    }
}

/// An invariant of a test, question, answer or student form was violated.
///
/// The messages are the ones the editor shows next to the offending field.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Error)]
pub enum ValidationError {
    #[error("Test name cannot be less than three characters.")]
    NameTooShort,

    #[error("Test name must be unique (there's already a test with the same name).")]
    DuplicateName,

    #[error("A test must have at least one question.")]
    NoQuestions,

    #[error("A test's degree must be a positive number.")]
    NonPositiveDegree,

    #[error("A test's time limit must be at least one second.")]
    NoTimeLimit,

    #[error("Question cannot be empty.")]
    EmptyQuestion,

    #[error("Number of answers cannot be less than 2.")]
    TooFewAnswers,

    #[error("A question cannot have no correct answers.")]
    NoCorrectAnswer,

    #[error("A question's answers cannot be all correct.")]
    AllAnswersCorrect,

    #[error("A question's answer cannot be empty.")]
    EmptyAnswer,

    #[error("Please enter the full name (at least two words).")]
    NameNotFull,

    #[error("Please choose a grade.")]
    MissingGrade,
}

/// Writing to or reading from the record store failed.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to lock {path}: {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read records from {path}: {source}")]
    Codec {
        path: PathBuf,
        #[source]
        source: CodecError,
    },

    #[error("failed to encode records: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("no result at index {index} ({len} stored)")]
    NoSuchRecord { index: usize, len: usize },
}

impl PersistenceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PersistenceError::Io {
            path: path.into(),
            source,
        }
    }
}

/// The configuration file could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to render config: {0}")]
    Render(#[from] toml::ser::Error),
}

/// A single choice on an answer sheet was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ChoiceError {
    #[error("answer {index} does not exist (question has {count} answers)")]
    OutOfRange { index: usize, count: usize },

    /// Checking this box would select more answers than there are correct ones.
    #[error("answer {0} is disabled until another answer is unchecked")]
    Disabled(usize),
}

/// An exam-session interaction was rejected, or finishing it failed.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("answering is disabled")]
    InputDisabled,

    #[error("question {index} does not exist (test has {count} questions)")]
    NoSuchQuestion { index: usize, count: usize },

    #[error("question {0} was never visited before the time ran out")]
    NotVisited(usize),

    #[error("the session is finished")]
    Finished,

    #[error(transparent)]
    Choice(#[from] ChoiceError),

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("failed to save the result: {0}")]
    Persistence(#[from] PersistenceError),
}
