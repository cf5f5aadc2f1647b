//! Core traits and types for FDQ (FDA document Q&A)
//!
//! This crate defines the fundamental traits and types used across the FDQ system.
//! It provides capability-facing interfaces for document fetching and for the
//! external retrieval-QA service, making the pipeline test-friendly and extensible.

pub mod engine;
pub mod error;
pub mod fetcher;
pub mod outcome;

pub use engine::{Answer, AnswerEngine, Citation};
pub use error::{Error, FetchError, QaError, Result};
pub use fetcher::{DocumentFetcher, DocumentKind, DocumentReference, FetchedFile};
pub use outcome::{AbortReason, RunOutcome};
