//! Error types shared across the FDQ crates

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type used throughout the FDQ crates
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error for FDQ operations
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Qa(#[from] QaError),
}

/// Errors raised while acquiring remote documents
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchError {
    /// The remote endpoint answered with a non-success status
    #[error("{url} answered with status {status}")]
    Unreachable { url: String, status: u16 },

    /// Transport-level failure before a response was obtained
    #[error("network failure while fetching {url}: {message}")]
    Network { url: String, message: String },

    /// The document reference does not hold a parseable URL
    #[error("invalid document URL {url}: {message}")]
    InvalidUrl { url: String, message: String },

    /// A fetched document could not be written to the workspace
    #[error("failed to store fetched document: {0}")]
    Storage(String),
}

/// Errors raised by the retrieval-QA exchange
///
/// A terminal non-success exchange state is not an error: the adapter reports
/// it as a soft-failure [`Answer`](crate::Answer) naming the state.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum QaError {
    /// Network failure or an exhausted polling deadline
    #[error("transport failure during the exchange: {0}")]
    Transport(String),

    /// The answering service returned an unexpected response shape
    #[error("unexpected response from the answering service: {0}")]
    Protocol(String),
}
