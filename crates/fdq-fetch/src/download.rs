//! HTTP document fetcher implementation

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use scraper::{Html, Selector};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use url::Url;

use fdq_core::{DocumentFetcher, DocumentKind, DocumentReference, FetchError, FetchedFile, Result};

/// File extension a landing-page link must carry to be downloaded
const TARGET_EXTENSION: &str = ".pdf";

/// Fetcher that retrieves documents over HTTP.
///
/// Direct references are streamed straight to disk; landing-page references
/// are scraped for matching links first, each of which is then downloaded.
pub struct HttpDocumentFetcher {
    client: Client,
}

impl HttpDocumentFetcher {
    /// Create a fetcher with a default HTTP client
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| fdq_core::Error::Network(e.to_string()))?;

        Ok(Self { client })
    }

    /// Create a fetcher around an existing HTTP client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Stream one file to `dest`, named from the URL's final path segment
    async fn download_file(
        &self,
        url: &Url,
        dest: &Path,
    ) -> std::result::Result<PathBuf, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::Network {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(FetchError::Unreachable {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let path = dest.join(file_name_from_url(url));
        let mut file = tokio::fs::File::create(&path)
            .await
            .map_err(|e| FetchError::Storage(format!("{}: {e}", path.display())))?;

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| FetchError::Network {
                url: url.to_string(),
                message: e.to_string(),
            })?;
            file.write_all(&chunk)
                .await
                .map_err(|e| FetchError::Storage(format!("{}: {e}", path.display())))?;
        }

        file.flush()
            .await
            .map_err(|e| FetchError::Storage(format!("{}: {e}", path.display())))?;

        debug!(url = %url, path = %path.display(), "downloaded document");
        Ok(path)
    }

    /// Scrape a landing page and download every matching link.
    ///
    /// Per-link failures are logged and skipped; a page with zero matching
    /// links (or where every match fails) yields an empty sequence, which
    /// the caller treats as a signal rather than an error.
    async fn fetch_landing(
        &self,
        url: &Url,
        dest: &Path,
    ) -> std::result::Result<Vec<PathBuf>, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::Network {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(FetchError::Unreachable {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| FetchError::Network {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let links = document_links(&body, url);
        if links.is_empty() {
            debug!(url = %url, "landing page has no matching links");
            return Ok(Vec::new());
        }

        let mut downloaded = Vec::new();
        for link in links {
            match self.download_file(&link, dest).await {
                Ok(path) => downloaded.push(path),
                Err(e) => warn!(url = %link, error = %e, "skipping landing-page link"),
            }
        }

        Ok(downloaded)
    }
}

#[async_trait]
impl DocumentFetcher for HttpDocumentFetcher {
    async fn fetch(
        &self,
        reference: &DocumentReference,
        dest: &Path,
    ) -> std::result::Result<Vec<FetchedFile>, FetchError> {
        let url = Url::parse(reference.url()).map_err(|e| FetchError::InvalidUrl {
            url: reference.url().to_string(),
            message: e.to_string(),
        })?;

        let paths = match reference.kind() {
            DocumentKind::Direct => vec![self.download_file(&url, dest).await?],
            DocumentKind::Landing => self.fetch_landing(&url, dest).await?,
        };

        Ok(paths
            .into_iter()
            .map(|path| FetchedFile::new(path, reference.clone()))
            .collect())
    }
}

/// Enumerate anchors on a landing page and resolve the ones that point at
/// the target extension.
///
/// Relative hrefs are joined against the page URL, never treated as
/// absolute; only the resolved URL's path decides whether a link matches.
fn document_links(html: &str, base: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("a[href]").unwrap();

    document
        .select(&selector)
        .filter_map(|anchor| anchor.value().attr("href"))
        .filter_map(|href| base.join(href).ok())
        .filter(|resolved| {
            resolved
                .path()
                .to_ascii_lowercase()
                .ends_with(TARGET_EXTENSION)
        })
        .collect()
}

/// Name a local file from the URL's final non-empty path segment
fn file_name_from_url(url: &Url) -> String {
    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .unwrap_or("document.pdf")
        .to_string()
}
