//! Document acquisition for FDQ
//!
//! This crate turns selected submission-document references into local files:
//! direct PDF downloads, landing-page scraping, the per-run temporary
//! workspace those files live in, and the openFDA metadata lookup that
//! produces the references in the first place.

mod download;
mod openfda;
mod workspace;

pub use download::HttpDocumentFetcher;
pub use openfda::{OpenFdaClient, SubmissionRow};
pub use workspace::Workspace;

// Re-export core types for convenience
pub use fdq_core::{
    DocumentFetcher, DocumentKind, DocumentReference, Error, FetchError, FetchedFile, Result,
};
