//! quizvault-core: Scoring engine, exam sessions and encrypted record store.
//!
//! This crate defines the exam data model, the grading rules that turn a
//! student's selections into degrees, the session state machine that gates
//! when answers are final, and the encrypted JSON store both record families
//! are kept in.

pub mod codec;
pub mod config;
pub mod error;
pub mod import;
pub mod model;
pub mod records;
pub mod scoring;
pub mod session;
pub mod statistics;
pub mod store;
pub mod traits;
pub mod validation;
