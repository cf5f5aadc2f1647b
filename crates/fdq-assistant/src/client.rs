//! OpenAI Assistants client implementation

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use fdq_core::{Answer, AnswerEngine, FetchedFile, QaError, Result};

use crate::config::AssistantConfig;
use crate::message::MessageList;

#[derive(Debug, Deserialize)]
struct FileObject {
    id: String,
    filename: String,
}

#[derive(Debug, Deserialize)]
struct FileBatch {
    id: String,
    status: String,
}

#[derive(Debug, Deserialize)]
struct ThreadObject {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RunObject {
    id: String,
    status: String,
}

/// Adapter over a pre-provisioned OpenAI assistant with file search.
///
/// Each [`answer`](AnswerEngine::answer) call is an independent single-turn
/// exchange: the supplied files are registered against the configured vector
/// store, the assistant runs once over the question, and every registered
/// file is removed again afterwards regardless of outcome.
pub struct AssistantClient {
    config: AssistantConfig,
    client: Client,
}

impl AssistantClient {
    /// Create a new client from configuration
    pub fn new(config: AssistantConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| fdq_core::Error::Network(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// Create a new client from environment variables
    pub fn from_env() -> Result<Self> {
        let config = AssistantConfig::from_env()?;
        Self::new(config)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.api_url, path)
    }

    fn auth(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.config.api_key)
            .header("OpenAI-Beta", "assistants=v2")
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        context: &str,
    ) -> std::result::Result<T, QaError> {
        let response = request
            .send()
            .await
            .map_err(|e| QaError::Transport(format!("{context}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(QaError::Protocol(format!(
                "{context} failed with status {status}: {body}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| QaError::Protocol(format!("{context}: {e}")))
    }

    /// Upload one local file for assistant use
    async fn upload_file(&self, path: &Path) -> std::result::Result<FileObject, QaError> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_string());

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| QaError::Transport(format!("failed to read {}: {e}", path.display())))?;

        let form = Form::new()
            .text("purpose", "assistants")
            .part("file", Part::bytes(bytes).file_name(file_name));

        let uploaded: FileObject = self
            .send_json(
                self.auth(self.client.post(self.endpoint("/files"))).multipart(form),
                "file upload",
            )
            .await?;

        debug!(file_id = %uploaded.id, filename = %uploaded.filename, "uploaded file");
        Ok(uploaded)
    }

    /// Register uploaded files against the vector store and wait for
    /// indexing to finish.
    ///
    /// A failed or partial indexing outcome is logged, not raised; the
    /// exchange proceeds with whatever was indexed.
    async fn index_files(&self, file_ids: &[String]) -> std::result::Result<(), QaError> {
        let url = self.endpoint(&format!(
            "/vector_stores/{}/file_batches",
            self.config.vector_store_id
        ));
        let batch: FileBatch = self
            .send_json(
                self.auth(self.client.post(url))
                    .json(&json!({ "file_ids": file_ids })),
                "vector-store registration",
            )
            .await?;

        let status = timeout(self.config.poll_deadline(), self.poll_batch(&batch.id))
            .await
            .map_err(|_| {
                QaError::Transport(format!(
                    "indexing did not reach a terminal state within {}s",
                    self.config.poll_deadline_secs
                ))
            })??;

        if status == "completed" {
            debug!(batch_id = %batch.id, "indexing completed");
        } else {
            warn!(batch_id = %batch.id, status = %status, "indexing did not complete");
        }

        Ok(())
    }

    async fn poll_batch(&self, batch_id: &str) -> std::result::Result<String, QaError> {
        let url = self.endpoint(&format!(
            "/vector_stores/{}/file_batches/{batch_id}",
            self.config.vector_store_id
        ));

        loop {
            let batch: FileBatch = self
                .send_json(self.auth(self.client.get(&url)), "indexing poll")
                .await?;

            if batch.status != "in_progress" {
                return Ok(batch.status);
            }

            sleep(self.config.poll_interval()).await;
        }
    }

    /// Point the assistant's file-search tool at the configured vector store
    async fn configure_assistant(&self) -> std::result::Result<(), QaError> {
        let url = self.endpoint(&format!("/assistants/{}", self.config.assistant_id));
        let _: serde_json::Value = self
            .send_json(
                self.auth(self.client.post(url)).json(&json!({
                    "tool_resources": {
                        "file_search": { "vector_store_ids": [self.config.vector_store_id] }
                    }
                })),
                "assistant configuration",
            )
            .await?;

        Ok(())
    }

    /// Create a single-turn thread holding only the question
    async fn create_thread(&self, question: &str) -> std::result::Result<ThreadObject, QaError> {
        self.send_json(
            self.auth(self.client.post(self.endpoint("/threads"))).json(&json!({
                "messages": [{ "role": "user", "content": question }]
            })),
            "thread creation",
        )
        .await
    }

    async fn create_run(&self, thread_id: &str) -> std::result::Result<RunObject, QaError> {
        self.send_json(
            self.auth(
                self.client
                    .post(self.endpoint(&format!("/threads/{thread_id}/runs"))),
            )
            .json(&json!({ "assistant_id": self.config.assistant_id })),
            "run creation",
        )
        .await
    }

    async fn poll_run(
        &self,
        thread_id: &str,
        run_id: &str,
    ) -> std::result::Result<String, QaError> {
        let url = self.endpoint(&format!("/threads/{thread_id}/runs/{run_id}"));

        loop {
            let run: RunObject = self
                .send_json(self.auth(self.client.get(&url)), "run poll")
                .await?;

            match run.status.as_str() {
                "queued" | "in_progress" | "cancelling" => sleep(self.config.poll_interval()).await,
                _ => return Ok(run.status),
            }
        }
    }

    /// Fetch the first assistant message of a completed exchange and rewrite
    /// its annotations into markers and citations.
    async fn collect_answer(
        &self,
        thread_id: &str,
        file_names: &HashMap<String, String>,
    ) -> std::result::Result<Answer, QaError> {
        // The thread is single-turn, so the newest message is the reply.
        let url = self.endpoint(&format!("/threads/{thread_id}/messages?order=desc&limit=1"));
        let messages: MessageList = self
            .send_json(self.auth(self.client.get(&url)), "message retrieval")
            .await?;

        let Some(text) = messages.first_assistant_text() else {
            return Ok(Answer::without_content());
        };

        let mut names = file_names.clone();
        for annotation in &text.annotations {
            if let Some(citation) = &annotation.file_citation {
                if !names.contains_key(&citation.file_id) {
                    names.insert(
                        citation.file_id.clone(),
                        self.resolve_file_name(&citation.file_id).await,
                    );
                }
            }
        }

        Ok(crate::message::rewrite_annotations(
            &text.value,
            &text.annotations,
            &names,
        ))
    }

    /// Display name for a cited file that was not part of this upload batch
    async fn resolve_file_name(&self, file_id: &str) -> String {
        let url = self.endpoint(&format!("/files/{file_id}"));
        match self
            .send_json::<FileObject>(self.auth(self.client.get(&url)), "file lookup")
            .await
        {
            Ok(file) => file.filename,
            Err(e) => {
                warn!(file_id, error = %e, "cannot resolve cited file name");
                file_id.to_string()
            }
        }
    }

    /// Run the exchange proper: upload, index, configure, ask, poll, collect.
    ///
    /// Files uploaded before a failure are pushed into `uploads` so the
    /// caller can always deregister them.
    async fn exchange(
        &self,
        question: &str,
        files: &[FetchedFile],
        uploads: &mut Vec<FileObject>,
    ) -> std::result::Result<Answer, QaError> {
        for file in files {
            uploads.push(self.upload_file(file.path()).await?);
        }

        if !uploads.is_empty() {
            let file_ids: Vec<String> = uploads.iter().map(|file| file.id.clone()).collect();
            self.index_files(&file_ids).await?;
        }

        self.configure_assistant().await?;

        let thread = self.create_thread(question).await?;
        let run = self.create_run(&thread.id).await?;
        info!(thread_id = %thread.id, run_id = %run.id, "exchange started");

        let status = timeout(
            self.config.poll_deadline(),
            self.poll_run(&thread.id, &run.id),
        )
        .await
        .map_err(|_| {
            QaError::Transport(format!(
                "run did not reach a terminal state within {}s",
                self.config.poll_deadline_secs
            ))
        })??;

        if status != "completed" {
            info!(status = %status, "exchange ended without completing");
            return Ok(Answer::from_terminal_state(&status));
        }

        let file_names: HashMap<String, String> = uploads
            .iter()
            .map(|file| (file.id.clone(), file.filename.clone()))
            .collect();

        self.collect_answer(&thread.id, &file_names).await
    }

    /// Remove every uploaded file from the vector store and delete it.
    ///
    /// This is cleanup of shared server-side state; failures are logged and
    /// never raised.
    async fn deregister_files(&self, uploads: &[FileObject]) {
        for file in uploads {
            self.delete(
                self.endpoint(&format!(
                    "/vector_stores/{}/files/{}",
                    self.config.vector_store_id, file.id
                )),
                "vector-store deregistration",
            )
            .await;

            self.delete(self.endpoint(&format!("/files/{}", file.id)), "file deletion")
                .await;
        }
    }

    async fn delete(&self, url: String, context: &str) {
        match self.auth(self.client.delete(&url)).send().await {
            Ok(response) if response.status().is_success() => {
                debug!(context, url = %url, "cleanup call succeeded");
            }
            Ok(response) => {
                warn!(context, url = %url, status = %response.status(), "cleanup call failed");
            }
            Err(e) => {
                warn!(context, url = %url, error = %e, "cleanup call failed");
            }
        }
    }
}

#[async_trait]
impl AnswerEngine for AssistantClient {
    async fn answer(
        &self,
        question: &str,
        files: &[FetchedFile],
    ) -> std::result::Result<Answer, QaError> {
        let mut uploads = Vec::new();
        let result = self.exchange(question, files, &mut uploads).await;

        // Server-side state must not leak between runs, success or not.
        self.deregister_files(&uploads).await;

        result
    }
}
