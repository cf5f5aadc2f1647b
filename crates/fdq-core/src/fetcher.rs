//! Document fetcher trait and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::FetchError;

/// How a document URL is expected to be retrieved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentKind {
    /// The URL points directly at a downloadable file
    Direct,
    /// The URL points at an HTML index page that links to the files
    Landing,
}

impl DocumentKind {
    /// Classify a document URL by its terminal suffix.
    ///
    /// `.pdf` routes to a direct download and `.cfm` (the upstream site's
    /// dynamic index pages) routes to landing-page scraping. Any other suffix
    /// is not handled and yields `None`; callers skip such references without
    /// raising an error.
    pub fn classify(url: &str) -> Option<Self> {
        let path = url
            .split(|c| c == '?' || c == '#')
            .next()
            .unwrap_or(url)
            .to_ascii_lowercase();

        if path.ends_with(".pdf") {
            Some(Self::Direct)
        } else if path.ends_with(".cfm") {
            Some(Self::Landing)
        } else {
            None
        }
    }
}

/// A reference to one remote submission document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentReference {
    url: String,
    kind: DocumentKind,
}

impl DocumentReference {
    /// Create a reference with an explicit kind
    pub fn new(url: impl Into<String>, kind: DocumentKind) -> Self {
        Self {
            url: url.into(),
            kind,
        }
    }

    /// Create a reference by classifying the URL suffix.
    ///
    /// Returns `None` for suffixes the fetcher does not handle.
    pub fn from_url(url: impl Into<String>) -> Option<Self> {
        let url = url.into();
        let kind = DocumentKind::classify(&url)?;
        Some(Self { url, kind })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }
}

/// A document downloaded into the current workspace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchedFile {
    path: PathBuf,
    reference: DocumentReference,
}

impl FetchedFile {
    pub fn new(path: PathBuf, reference: DocumentReference) -> Self {
        Self { path, reference }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn reference(&self) -> &DocumentReference {
        &self.reference
    }

    /// File name of the local copy
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Trait for document fetchers
///
/// A fetcher turns one [`DocumentReference`] into zero or more local files
/// inside `dest`. A landing page with no matching links yields an empty
/// sequence, which is a signal for the caller rather than an error.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch(
        &self,
        reference: &DocumentReference,
        dest: &Path,
    ) -> std::result::Result<Vec<FetchedFile>, FetchError>;
}
