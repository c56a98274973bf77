//! On-disk record shapes for the question bank and student degrees.
//!
//! The bank is written in one canonical shape, with correctness inlined on
//! each answer. Older banks stored answers as bare strings plus a `valid`
//! list of correct indices; those are migrated while reading and never
//! written back in that form.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::codec::{self, Envelope};
use crate::error::CodecError;
use crate::model::{Answer, Question, StudentDegree, Test};

/// How a question is read from JSON, before migration.
#[derive(Debug, Deserialize)]
pub struct WireQuestion {
    #[serde(alias = "string")]
    question: String,
    #[serde(default)]
    pic: Option<String>,
    answers: WireAnswers,
    /// Correct answer indices, only meaningful for bare-string answers.
    #[serde(default)]
    valid: Option<Vec<usize>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireAnswers {
    Inline(Vec<Answer>),
    Legacy(Vec<String>),
}

/// A legacy `valid` index pointing past the question's answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyIndexError {
    pub index: usize,
    pub count: usize,
}

impl fmt::Display for LegacyIndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "valid answer index {} out of range for {} answers",
            self.index, self.count
        )
    }
}

impl TryFrom<WireQuestion> for Question {
    type Error = LegacyIndexError;

    fn try_from(wire: WireQuestion) -> Result<Self, Self::Error> {
        let answers = match wire.answers {
            WireAnswers::Inline(answers) => answers,
            WireAnswers::Legacy(texts) => {
                let valid = wire.valid.unwrap_or_default();
                let count = texts.len();
                if let Some(&index) = valid.iter().find(|&&i| i >= count) {
                    return Err(LegacyIndexError { index, count });
                }
                texts
                    .into_iter()
                    .enumerate()
                    .map(|(i, text)| Answer::new(text, valid.contains(&i)))
                    .collect()
            }
        };
        Ok(Question {
            prompt: wire.question,
            image_ref: wire.pic,
            answers,
        })
    }
}

/// Whether a record file is encrypted or plain JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    Encrypted,
    Plain,
}

impl RecordFormat {
    /// `.enc` files are encrypted, anything else is plain JSON.
    pub fn from_path(path: &Path) -> Self {
        if path.extension().is_some_and(|ext| ext == "enc") {
            RecordFormat::Encrypted
        } else {
            RecordFormat::Plain
        }
    }
}

/// Serialize records into file bytes.
pub fn encode<T: Serialize>(
    format: RecordFormat,
    envelope: &Envelope,
    records: &[T],
) -> Result<Vec<u8>, CodecError> {
    match format {
        RecordFormat::Encrypted => codec::seal(envelope, records),
        RecordFormat::Plain => Ok(codec::to_payload(records)?.into_bytes()),
    }
}

/// Deserialize file bytes into records. Empty bytes are an empty collection.
pub fn decode<T: DeserializeOwned>(
    format: RecordFormat,
    envelope: &Envelope,
    data: &[u8],
) -> Result<Vec<T>, CodecError> {
    match format {
        RecordFormat::Encrypted => codec::open(envelope, data),
        RecordFormat::Plain => codec::from_payload(&String::from_utf8(data.to_vec())?),
    }
}

pub fn serialize_tests(tests: &[Test]) -> Result<String, serde_json::Error> {
    codec::to_payload(tests)
}

pub fn deserialize_tests(payload: &str) -> Result<Vec<Test>, CodecError> {
    codec::from_payload(payload)
}

pub fn serialize_degrees(degrees: &[StudentDegree]) -> Result<String, serde_json::Error> {
    codec::to_payload(degrees)
}

pub fn deserialize_degrees(payload: &str) -> Result<Vec<StudentDegree>, CodecError> {
    codec::from_payload(payload)
}

/// Attach each degree to the test with the same name.
///
/// Returns the degrees whose test no longer exists.
pub fn attach_degrees(tests: &mut [Test], degrees: Vec<StudentDegree>) -> Vec<StudentDegree> {
    let by_name: HashMap<String, usize> = tests
        .iter()
        .enumerate()
        .map(|(i, t)| (t.name.clone(), i))
        .collect();

    let mut orphans = Vec::new();
    for degree in degrees {
        match by_name.get(&degree.test) {
            Some(&i) => tests[i].student_degrees.push(degree),
            None => orphans.push(degree),
        }
    }
    if !orphans.is_empty() {
        tracing::warn!("{} result(s) refer to tests that no longer exist", orphans.len());
    }
    orphans
}
