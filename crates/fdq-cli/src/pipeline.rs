//! Document-QA orchestration pipeline

use std::path::{Path, PathBuf};
use tracing::{info, warn};

use fdq_core::{
    AbortReason, AnswerEngine, DocumentFetcher, DocumentReference, FetchedFile, Result, RunOutcome,
};
use fdq_fetch::Workspace;

/// One-run orchestrator over a fetcher and an answer engine.
///
/// A run acquires a fresh workspace, fetches the selected references in
/// order, performs a single QA exchange, and releases the workspace exactly
/// once on every exit path. Aborts (no files, blank question, fetch or QA
/// failure) still pass through cleanup before the outcome is returned.
pub struct QaPipeline<F: DocumentFetcher, A: AnswerEngine> {
    fetcher: F,
    engine: A,
    workspace_base: PathBuf,
}

impl<F: DocumentFetcher, A: AnswerEngine> QaPipeline<F, A> {
    pub fn new(fetcher: F, engine: A, workspace_base: impl Into<PathBuf>) -> Self {
        Self {
            fetcher,
            engine,
            workspace_base: workspace_base.into(),
        }
    }

    /// Execute one run and return its terminal outcome.
    ///
    /// `Err` is reserved for failures outside the run itself (for example
    /// the workspace cannot be created); everything that happens within the
    /// run surfaces as a [`RunOutcome`].
    pub async fn run(
        &self,
        references: &[DocumentReference],
        question: &str,
    ) -> Result<RunOutcome> {
        let workspace = Workspace::acquire(&self.workspace_base)?;
        let outcome = self.run_stages(workspace.path(), references, question).await;

        if !workspace.release().await {
            warn!("workspace was not fully removed; leftover files may remain");
        }

        outcome
    }

    async fn run_stages(
        &self,
        dest: &Path,
        references: &[DocumentReference],
        question: &str,
    ) -> Result<RunOutcome> {
        let mut files: Vec<FetchedFile> = Vec::new();

        for reference in references {
            match self.fetcher.fetch(reference, dest).await {
                Ok(fetched) => {
                    if fetched.is_empty() {
                        info!(url = %reference.url(), "no files found behind reference");
                    }
                    files.extend(fetched);
                }
                Err(e) => return Ok(RunOutcome::Aborted(AbortReason::Fetch(e))),
            }
        }

        if files.is_empty() {
            return Ok(RunOutcome::Aborted(AbortReason::NoFiles));
        }

        if question.trim().is_empty() {
            return Ok(RunOutcome::Aborted(AbortReason::MissingQuestion));
        }

        info!(files = files.len(), "running QA exchange");
        match self.engine.answer(question, &files).await {
            Ok(answer) => Ok(RunOutcome::Answered(answer)),
            Err(e) => Ok(RunOutcome::Aborted(AbortReason::Qa(e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use fdq_core::{Answer, Citation, FetchError, QaError};

    struct StubFetcher {
        fail: bool,
    }

    #[async_trait]
    impl DocumentFetcher for StubFetcher {
        async fn fetch(
            &self,
            reference: &DocumentReference,
            dest: &Path,
        ) -> std::result::Result<Vec<FetchedFile>, FetchError> {
            if self.fail {
                return Err(FetchError::Unreachable {
                    url: reference.url().to_string(),
                    status: 503,
                });
            }

            let name = reference.url().rsplit('/').next().unwrap().to_string();
            let path = dest.join(name);
            std::fs::write(&path, b"pdf bytes").unwrap();
            Ok(vec![FetchedFile::new(path, reference.clone())])
        }
    }

    struct StubEngine {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl AnswerEngine for StubEngine {
        async fn answer(
            &self,
            _question: &str,
            files: &[FetchedFile],
        ) -> std::result::Result<Answer, QaError> {
            self.calls.fetch_add(1, Ordering::SeqCst);

            if self.fail {
                return Err(QaError::Transport("stub transport failure".to_string()));
            }

            Ok(Answer::new(
                "Answer [0]",
                vec![Citation {
                    marker: 0,
                    source: files[0].file_name(),
                }],
            ))
        }
    }

    fn pipeline(
        base: &Path,
        fetch_fails: bool,
        engine_fails: bool,
    ) -> (QaPipeline<StubFetcher, StubEngine>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let pipeline = QaPipeline::new(
            StubFetcher { fail: fetch_fails },
            StubEngine {
                calls: calls.clone(),
                fail: engine_fails,
            },
            base,
        );
        (pipeline, calls)
    }

    fn workspace_runs_left(base: &Path) -> usize {
        std::fs::read_dir(base).unwrap().count()
    }

    #[tokio::test]
    async fn successful_run_reaches_done_with_the_stubbed_answer() {
        let base = tempfile::tempdir().unwrap();
        let (pipeline, calls) = pipeline(base.path(), false, false);
        let references = vec![DocumentReference::from_url("https://x.test/a.pdf").unwrap()];

        let outcome = pipeline.run(&references, "What is X?").await.unwrap();

        let RunOutcome::Answered(answer) = outcome else {
            panic!("expected an answered run");
        };
        assert_eq!(answer.text, "Answer [0]");
        assert_eq!(answer.citations[0].to_string(), "[0] a.pdf");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(workspace_runs_left(base.path()), 0);
    }

    #[tokio::test]
    async fn empty_selection_aborts_without_touching_the_engine() {
        let base = tempfile::tempdir().unwrap();
        let (pipeline, calls) = pipeline(base.path(), false, false);

        let outcome = pipeline.run(&[], "What is X?").await.unwrap();

        assert_eq!(outcome, RunOutcome::Aborted(AbortReason::NoFiles));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(workspace_runs_left(base.path()), 0);
    }

    #[tokio::test]
    async fn blank_question_aborts_after_fetching() {
        let base = tempfile::tempdir().unwrap();
        let (pipeline, calls) = pipeline(base.path(), false, false);
        let references = vec![DocumentReference::from_url("https://x.test/a.pdf").unwrap()];

        let outcome = pipeline.run(&references, "   ").await.unwrap();

        assert_eq!(outcome, RunOutcome::Aborted(AbortReason::MissingQuestion));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(workspace_runs_left(base.path()), 0);
    }

    #[tokio::test]
    async fn fetch_failure_aborts_with_the_fetch_diagnostic() {
        let base = tempfile::tempdir().unwrap();
        let (pipeline, calls) = pipeline(base.path(), true, false);
        let references = vec![DocumentReference::from_url("https://x.test/a.pdf").unwrap()];

        let outcome = pipeline.run(&references, "What is X?").await.unwrap();

        assert!(matches!(
            outcome,
            RunOutcome::Aborted(AbortReason::Fetch(FetchError::Unreachable { status: 503, .. }))
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(workspace_runs_left(base.path()), 0);
    }

    #[tokio::test]
    async fn qa_failure_aborts_but_still_cleans_up() {
        let base = tempfile::tempdir().unwrap();
        let (pipeline, calls) = pipeline(base.path(), false, true);
        let references = vec![DocumentReference::from_url("https://x.test/a.pdf").unwrap()];

        let outcome = pipeline.run(&references, "What is X?").await.unwrap();

        assert!(matches!(
            outcome,
            RunOutcome::Aborted(AbortReason::Qa(QaError::Transport(_)))
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(workspace_runs_left(base.path()), 0);
    }
}
