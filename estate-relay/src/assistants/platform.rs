use async_trait::async_trait;

use crate::error::Result;
use crate::extraction::Upload;

use super::types::{
    AssistantTool, FileBatch, FileObject, Run, Thread, ThreadMessage, ToolResources, VectorStore,
};

/// The assistant-platform operations the extraction workflow depends on.
///
/// Every call is a single request with no retry. Implementations report a
/// non-success status as [`RelayError::UpstreamRejected`] and a network
/// failure as [`RelayError::Transport`].
///
/// [`RelayError::UpstreamRejected`]: crate::error::RelayError::UpstreamRejected
/// [`RelayError::Transport`]: crate::error::RelayError::Transport
#[async_trait]
pub trait AssistantPlatform: Send + Sync {
    async fn upload_file(&self, upload: &Upload) -> Result<FileObject>;

    async fn create_vector_store(&self, name: &str) -> Result<VectorStore>;

    async fn create_file_batch(&self, vector_store_id: &str, file_ids: &[String])
        -> Result<FileBatch>;

    async fn retrieve_file_batch(&self, vector_store_id: &str, batch_id: &str)
        -> Result<FileBatch>;

    /// Point the shared assistant's file-search tool at `vector_store_id`.
    async fn bind_assistant_vector_store(
        &self,
        assistant_id: &str,
        vector_store_id: &str,
    ) -> Result<()>;

    async fn create_thread(&self, tool_resources: Option<ToolResources>) -> Result<Thread>;

    async fn create_message(&self, thread_id: &str, content: &str) -> Result<ThreadMessage>;

    async fn create_run(
        &self,
        thread_id: &str,
        assistant_id: &str,
        tools: Option<Vec<AssistantTool>>,
    ) -> Result<Run>;

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run>;

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<Run>;

    /// Messages of a thread, newest first.
    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>>;

    async fn delete_thread(&self, thread_id: &str) -> Result<()>;

    async fn delete_vector_store(&self, vector_store_id: &str) -> Result<()>;

    async fn delete_file(&self, file_id: &str) -> Result<()>;
}
