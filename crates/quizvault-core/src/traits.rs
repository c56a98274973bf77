//! Seams between the exam session and where results end up.

use std::cell::RefCell;

use crate::error::PersistenceError;
use crate::model::StudentDegree;

/// Somewhere a finished exam's result is appended to.
///
/// Implemented by [`crate::store::RecordStore`] for the encrypted degrees
/// file.
pub trait DegreeSink {
    /// Durably append one result. An error means nothing can be assumed
    /// about the stored state and must reach the operator.
    fn append(&self, degree: &StudentDegree) -> Result<(), PersistenceError>;
}

/// Keeps results in memory. Useful for previews and tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    degrees: RefCell<Vec<StudentDegree>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn degrees(&self) -> Vec<StudentDegree> {
        self.degrees.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.degrees.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.degrees.borrow().is_empty()
    }
}

impl DegreeSink for MemorySink {
    fn append(&self, degree: &StudentDegree) -> Result<(), PersistenceError> {
        self.degrees.borrow_mut().push(degree.clone());
        Ok(())
    }
}

impl<S: DegreeSink + ?Sized> DegreeSink for &S {
    fn append(&self, degree: &StudentDegree) -> Result<(), PersistenceError> {
        (**self).append(degree)
    }
}
