//! Outcome of one orchestration run

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::engine::Answer;
use crate::error::{FetchError, QaError};

/// Why a run aborted before producing an answer.
///
/// Every reason renders a distinct, actionable diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbortReason {
    /// No files could be gathered from the selected references
    NoFiles,
    /// Files were gathered but the question was blank
    MissingQuestion,
    /// A document reference failed to fetch
    Fetch(FetchError),
    /// The retrieval-QA exchange failed
    Qa(QaError),
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoFiles => write!(
                f,
                "no files were found for the selected documents; nothing to ask about"
            ),
            Self::MissingQuestion => write!(
                f,
                "no question was provided; enter a question to run against the documents"
            ),
            Self::Fetch(e) => write!(f, "document fetch failed: {e}"),
            Self::Qa(e) => write!(f, "question answering failed: {e}"),
        }
    }
}

/// Terminal result of a run: an answer with citations, or the reason the
/// run aborted. Either way the workspace has already been cleaned up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    Answered(Answer),
    Aborted(AbortReason),
}

impl RunOutcome {
    pub fn is_answered(&self) -> bool {
        matches!(self, Self::Answered(_))
    }
}
