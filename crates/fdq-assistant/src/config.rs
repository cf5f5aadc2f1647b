//! Assistant configuration

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use fdq_core::{Error, Result};

const DEFAULT_API_URL: &str = "https://api.openai.com/v1";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 2;
const DEFAULT_POLL_DEADLINE_SECS: u64 = 300;

/// Configuration for the OpenAI Assistants client.
///
/// The vector-store and assistant identifiers are pre-provisioned
/// server-side resources supplied out-of-band; they are never embedded in
/// source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    pub api_key: String,
    pub vector_store_id: String,
    pub assistant_id: String,
    pub api_url: String,
    /// Delay between polls of indexing batches and runs
    pub poll_interval_secs: u64,
    /// Upper bound on any single poll-until-terminal wait
    pub poll_deadline_secs: u64,
}

impl AssistantConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let api_key = env::var("OPENAI_API_KEY").map_err(|_| {
            Error::Configuration("OPENAI_API_KEY environment variable not found".to_string())
        })?;

        let vector_store_id = env::var("FDQ_VECTOR_STORE_ID").map_err(|_| {
            Error::Configuration("FDQ_VECTOR_STORE_ID environment variable not found".to_string())
        })?;

        let assistant_id = env::var("FDQ_ASSISTANT_ID").map_err(|_| {
            Error::Configuration("FDQ_ASSISTANT_ID environment variable not found".to_string())
        })?;

        let api_url = env::var("OPENAI_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let poll_deadline_secs = match env::var("FDQ_POLL_DEADLINE_SECS") {
            Ok(value) => value.parse().map_err(|_| {
                Error::Configuration(format!("FDQ_POLL_DEADLINE_SECS is not a number: {value}"))
            })?,
            Err(_) => DEFAULT_POLL_DEADLINE_SECS,
        };

        Ok(Self {
            api_key,
            vector_store_id,
            assistant_id,
            api_url,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            poll_deadline_secs,
        })
    }

    /// Create configuration with explicit identifiers
    pub fn new(
        api_key: impl Into<String>,
        vector_store_id: impl Into<String>,
        assistant_id: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            vector_store_id: vector_store_id.into(),
            assistant_id: assistant_id.into(),
            api_url: DEFAULT_API_URL.to_string(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            poll_deadline_secs: DEFAULT_POLL_DEADLINE_SECS,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn poll_deadline(&self) -> Duration {
        Duration::from_secs(self.poll_deadline_secs)
    }
}
