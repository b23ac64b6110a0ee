use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::assistants::{
    latest_assistant_message, AssistantPlatform, AssistantTool, BatchStatus, FileBatch, Run,
    RunPhase, RunStatus, ToolResources,
};
use crate::config::{RunConfig, ToolBinding};
use crate::error::{RelayError, Result};

use super::prompt::EXTRACTION_PROMPT;
use super::types::{CreatedResources, Upload};

/// One stage of the extraction workflow, used to label logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    UploadFile,
    CreateVectorStore,
    AttachFile,
    AwaitIndexing,
    BindTool,
    CreateThread,
    PostMessage,
    StartRun,
    PollRun,
    FetchReply,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UploadFile => "upload_file",
            Self::CreateVectorStore => "create_vector_store",
            Self::AttachFile => "attach_file",
            Self::AwaitIndexing => "await_indexing",
            Self::BindTool => "bind_tool",
            Self::CreateThread => "create_thread",
            Self::PostMessage => "post_message",
            Self::StartRun => "start_run",
            Self::PollRun => "poll_run",
            Self::FetchReply => "fetch_reply",
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runs a platform call unless `cancel` fires first, logging failures with the step name.
async fn guarded<T, F>(cancel: &CancellationToken, step: Step, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    debug!(%step, "Starting extraction step");
    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(RelayError::Cancelled),
        result = call => result,
    };
    if let Err(ref e) = result {
        error!(%step, error = %e, "Extraction step failed");
    }
    result
}

async fn pause(interval: Duration, cancel: &CancellationToken) -> Result<()> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(RelayError::Cancelled),
        _ = sleep(interval) => Ok(()),
    }
}

/// Drives one document through upload, indexing, assistant run and reply
/// retrieval on the assistant platform.
#[derive(Clone)]
pub struct ExtractionOrchestrator {
    platform: Arc<dyn AssistantPlatform>,
    assistant_id: String,
    config: RunConfig,
}

impl ExtractionOrchestrator {
    pub fn new(
        platform: Arc<dyn AssistantPlatform>,
        assistant_id: impl Into<String>,
        config: RunConfig,
    ) -> Self {
        Self {
            platform,
            assistant_id: assistant_id.into(),
            config,
        }
    }

    pub fn assistant_id(&self) -> &str {
        &self.assistant_id
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Extract the assistant's reply for `upload`.
    ///
    /// Whatever the outcome, a run left in flight is cancelled and, when
    /// cleanup is enabled, the thread, vector store and file created here are
    /// deleted. Neither affects the returned result.
    pub async fn extract(&self, upload: Upload, cancel: CancellationToken) -> Result<String> {
        let started = Instant::now();
        let mut created = CreatedResources::default();

        let result = self.run_steps(&upload, &cancel, &mut created).await;

        if let (Some(thread_id), Some(run_id)) =
            (created.thread_id.as_deref(), created.active_run_id.as_deref())
        {
            self.cancel_remote_run(thread_id, run_id).await;
        }

        if self.config.cleanup {
            self.cleanup(&created).await;
        }

        match &result {
            Ok(reply) => info!(
                reply_len = reply.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Extraction completed"
            ),
            Err(e) => warn!(
                code = %e.code(),
                error = %e,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Extraction did not complete"
            ),
        }

        result
    }

    async fn run_steps(
        &self,
        upload: &Upload,
        cancel: &CancellationToken,
        created: &mut CreatedResources,
    ) -> Result<String> {
        // Indexing and the run share one polling budget.
        let polling_started = Instant::now();

        let file = guarded(cancel, Step::UploadFile, self.platform.upload_file(upload)).await?;
        debug!(file_id = %file.id, bytes = upload.len(), "Uploaded document");
        created.file_id = Some(file.id.clone());

        let store = guarded(
            cancel,
            Step::CreateVectorStore,
            self.platform.create_vector_store(&upload.file_name),
        )
        .await?;
        debug!(vector_store_id = %store.id, "Created vector store");
        created.vector_store_id = Some(store.id.clone());

        let batch = guarded(
            cancel,
            Step::AttachFile,
            self.platform
                .create_file_batch(&store.id, std::slice::from_ref(&file.id)),
        )
        .await?;
        if self.config.await_indexing {
            self.wait_for_indexing(&store.id, batch, polling_started, cancel)
                .await?;
        }

        let (tool_resources, run_tools) = match self.config.tool_binding {
            ToolBinding::Assistant => {
                guarded(
                    cancel,
                    Step::BindTool,
                    self.platform
                        .bind_assistant_vector_store(&self.assistant_id, &store.id),
                )
                .await?;
                (None, None)
            }
            ToolBinding::Thread => (
                Some(ToolResources::file_search(&store.id)),
                Some(vec![AssistantTool::FileSearch]),
            ),
        };

        let thread = guarded(
            cancel,
            Step::CreateThread,
            self.platform.create_thread(tool_resources),
        )
        .await?;
        debug!(thread_id = %thread.id, "Created thread");
        created.thread_id = Some(thread.id.clone());

        guarded(
            cancel,
            Step::PostMessage,
            self.platform.create_message(&thread.id, EXTRACTION_PROMPT),
        )
        .await?;

        let run = guarded(
            cancel,
            Step::StartRun,
            self.platform
                .create_run(&thread.id, &self.assistant_id, run_tools),
        )
        .await?;
        debug!(run_id = %run.id, status = %run.status, "Started run");
        created.active_run_id = Some(run.id.clone());

        let run = self
            .wait_for_run(&thread.id, run, polling_started, cancel)
            .await?;

        if run.status.phase() == RunPhase::Failed {
            // A run waiting on tool outputs is still live on the platform.
            if run.status != RunStatus::RequiresAction {
                created.active_run_id = None;
            }
            return Err(RelayError::RunFailed {
                run_id: run.id.clone(),
                status: run.status.to_string(),
                last_error: run.last_error_summary(),
            });
        }
        created.active_run_id = None;

        let messages = guarded(
            cancel,
            Step::FetchReply,
            self.platform.list_messages(&thread.id),
        )
        .await?;

        latest_assistant_message(&messages)
            .and_then(|message| message.text())
            .ok_or_else(|| RelayError::InvalidResponse {
                endpoint: "GET /threads/{id}/messages".to_string(),
                message: "thread has no assistant text reply".to_string(),
            })
    }

    /// Poll the run until it reaches a terminal status, the poll timeout
    /// counted from `budget_start` passes or `cancel` fires. The first status
    /// check happens one interval after the run was created.
    async fn wait_for_run(
        &self,
        thread_id: &str,
        mut run: Run,
        budget_start: Instant,
        cancel: &CancellationToken,
    ) -> Result<Run> {
        let started = Instant::now();
        let run_id = run.id.clone();
        let mut polls: u32 = 0;

        while !run.status.is_terminal() {
            if budget_start.elapsed() >= self.config.poll_timeout() {
                return Err(RelayError::RunTimeout {
                    run_id,
                    waited_secs: budget_start.elapsed().as_secs(),
                });
            }

            pause(self.config.poll_interval(), cancel).await?;
            run = guarded(
                cancel,
                Step::PollRun,
                self.platform.retrieve_run(thread_id, &run_id),
            )
            .await?;
            polls += 1;
            debug!(run_id = %run_id, status = %run.status, polls, "Polled run");
        }

        info!(
            run_id = %run_id,
            status = %run.status,
            polls,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Run reached terminal status"
        );
        Ok(run)
    }

    async fn wait_for_indexing(
        &self,
        vector_store_id: &str,
        mut batch: FileBatch,
        budget_start: Instant,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let batch_id = batch.id.clone();

        loop {
            match batch.status {
                BatchStatus::Completed => {
                    debug!(batch_id = %batch_id, "File batch indexed");
                    return Ok(());
                }
                BatchStatus::Failed | BatchStatus::Cancelled => {
                    error!(step = %Step::AwaitIndexing, batch_id = %batch_id, status = batch.status.as_str(), "File batch was not indexed");
                    return Err(RelayError::IndexingFailed {
                        batch_id,
                        status: batch.status.as_str().to_string(),
                    });
                }
                BatchStatus::InProgress | BatchStatus::Unknown => {}
            }

            if budget_start.elapsed() >= self.config.poll_timeout() {
                return Err(RelayError::IndexingTimeout {
                    batch_id,
                    waited_secs: budget_start.elapsed().as_secs(),
                });
            }

            pause(self.config.poll_interval(), cancel).await?;
            batch = guarded(
                cancel,
                Step::AwaitIndexing,
                self.platform.retrieve_file_batch(vector_store_id, &batch_id),
            )
            .await?;
        }
    }

    async fn cancel_remote_run(&self, thread_id: &str, run_id: &str) {
        match self.platform.cancel_run(thread_id, run_id).await {
            Ok(run) => info!(run_id, status = %run.status, "Cancelled unfinished run"),
            Err(e) => warn!(run_id, error = %e, "Failed to cancel unfinished run"),
        }
    }

    /// Best-effort removal of everything this request created.
    async fn cleanup(&self, created: &CreatedResources) {
        if let Some(thread_id) = created.thread_id.as_deref() {
            if let Err(e) = self.platform.delete_thread(thread_id).await {
                warn!(thread_id, error = %e, "Failed to delete thread");
            }
        }
        if let Some(vector_store_id) = created.vector_store_id.as_deref() {
            if let Err(e) = self.platform.delete_vector_store(vector_store_id).await {
                warn!(vector_store_id, error = %e, "Failed to delete vector store");
            }
        }
        if let Some(file_id) = created.file_id.as_deref() {
            if let Err(e) = self.platform.delete_file(file_id).await {
                warn!(file_id, error = %e, "Failed to delete file");
            }
        }
    }
}
