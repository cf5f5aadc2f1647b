//! Answer engine trait and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::QaError;
use crate::fetcher::FetchedFile;

/// One citation emitted while rewriting an annotated answer body.
///
/// `marker` is the bracketed integer substituted into the answer text in
/// place of the cited excerpt. Markers are assigned per annotation in the
/// order the service listed them, so repeated citations of the same file
/// still receive a fresh marker at each occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub marker: usize,
    pub source: String,
}

impl fmt::Display for Citation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.marker, self.source)
    }
}

/// A processed answer: rewritten text plus its ordered citations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub citations: Vec<Citation>,
}

impl Answer {
    pub fn new(text: impl Into<String>, citations: Vec<Citation>) -> Self {
        Self {
            text: text.into(),
            citations,
        }
    }

    /// Fixed answer for an exchange that completed without any content
    pub fn without_content() -> Self {
        Self::new(
            "The assistant returned no content for this question.",
            Vec::new(),
        )
    }

    /// Soft-failure answer for an exchange that ended in a terminal
    /// non-success state
    pub fn from_terminal_state(state: &str) -> Self {
        Self::new(
            format!("The exchange did not complete (terminal state: {state})."),
            Vec::new(),
        )
    }
}

/// Trait for the external retrieval-QA capability
///
/// Given a natural-language question and a set of local files, return an
/// answer grounded in those files plus a list of source citations. The
/// retrieval and generation logic lives entirely behind this boundary;
/// implementations manage upload, indexing, the exchange, and cleanup of
/// server-side state, and each call is an independent single-turn exchange.
#[async_trait]
pub trait AnswerEngine: Send + Sync {
    async fn answer(
        &self,
        question: &str,
        files: &[FetchedFile],
    ) -> std::result::Result<Answer, QaError>;
}
