//! openFDA drug-submission metadata lookup
//!
//! Upstream collaborator for the pipeline: fetches `drugsfda.json` records
//! for a brand name and flattens the original (`ORIG`) submissions into one
//! row per application document.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use tracing::debug;

use fdq_core::{Error, Result};

const DEFAULT_BASE_URL: &str = "https://api.fda.gov";
const MISSING_FIELD: &str = "N/A";

/// Client for the openFDA drugs@FDA endpoint
pub struct OpenFdaClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

/// One selectable submission document row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRow {
    pub brand_name: String,
    pub generic_name: String,
    pub review_priority: String,
    pub application_number: String,
    pub sponsor_name: String,
    pub document_type: String,
    pub url: String,
}

impl OpenFdaClient {
    /// Create a client, optionally carrying an openFDA API key
    pub fn new(api_key: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
        })
    }

    /// Create a client from environment variables (`FDA_API_KEY` optional)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::new(env::var("FDA_API_KEY").ok())
    }

    /// Override the endpoint base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Look up a brand name and return its original-submission documents.
    ///
    /// Only submissions with `submission_type == "ORIG"` are kept, one row
    /// per application document that carries a URL.
    pub async fn original_submissions(
        &self,
        brand_name: &str,
        limit: u32,
    ) -> Result<Vec<SubmissionRow>> {
        let url = format!("{}/drug/drugsfda.json", self.base_url);
        let search = format!("openfda.brand_name:\"{brand_name}\"");
        let limit = limit.to_string();

        let mut request = self
            .client
            .get(&url)
            .query(&[("search", search.as_str()), ("limit", limit.as_str())]);
        if let Some(key) = &self.api_key {
            request = request.query(&[("api_key", key.as_str())]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::Network(format!(
                "openFDA request failed with status {}",
                response.status()
            )));
        }

        let payload: DrugsFdaResponse = response
            .json()
            .await
            .map_err(|e| Error::Serialization(e.to_string()))?;

        let rows = flatten_original_submissions(payload);
        debug!(brand_name, rows = rows.len(), "openFDA lookup complete");
        Ok(rows)
    }
}

#[derive(Debug, Default, Deserialize)]
struct DrugsFdaResponse {
    #[serde(default)]
    results: Vec<DrugRecord>,
}

#[derive(Debug, Default, Deserialize)]
struct DrugRecord {
    application_number: Option<String>,
    sponsor_name: Option<String>,
    #[serde(default)]
    submissions: Vec<Submission>,
    #[serde(default)]
    openfda: OpenFdaFields,
}

#[derive(Debug, Default, Deserialize)]
struct OpenFdaFields {
    #[serde(default)]
    brand_name: Vec<String>,
    #[serde(default)]
    generic_name: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Submission {
    submission_type: Option<String>,
    review_priority: Option<String>,
    #[serde(default)]
    application_docs: Vec<ApplicationDoc>,
}

#[derive(Debug, Default, Deserialize)]
struct ApplicationDoc {
    url: Option<String>,
    #[serde(rename = "type")]
    doc_type: Option<String>,
}

fn flatten_original_submissions(payload: DrugsFdaResponse) -> Vec<SubmissionRow> {
    let mut rows = Vec::new();

    for record in payload.results {
        let brand_name = join_or_missing(&record.openfda.brand_name);
        let generic_name = join_or_missing(&record.openfda.generic_name);
        let application_number = or_missing(record.application_number.as_deref());
        let sponsor_name = or_missing(record.sponsor_name.as_deref());

        for submission in &record.submissions {
            if submission.submission_type.as_deref() != Some("ORIG") {
                continue;
            }

            for doc in &submission.application_docs {
                let Some(url) = doc.url.as_deref().filter(|u| !u.is_empty()) else {
                    continue;
                };

                rows.push(SubmissionRow {
                    brand_name: brand_name.clone(),
                    generic_name: generic_name.clone(),
                    review_priority: or_missing(submission.review_priority.as_deref()),
                    application_number: application_number.clone(),
                    sponsor_name: sponsor_name.clone(),
                    document_type: or_missing(doc.doc_type.as_deref()),
                    url: url.to_string(),
                });
            }
        }
    }

    rows
}

fn join_or_missing(values: &[String]) -> String {
    if values.is_empty() {
        MISSING_FIELD.to_string()
    } else {
        values.join(", ")
    }
}

fn or_missing(value: Option<&str>) -> String {
    value.unwrap_or(MISSING_FIELD).to_string()
}
