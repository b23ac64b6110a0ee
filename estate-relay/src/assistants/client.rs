use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::{
    config::PlatformConfig,
    error::{RelayError, Result},
    extraction::Upload,
};

use super::platform::AssistantPlatform;
use super::types::{
    AssistantTool, CreateFileBatchRequest, CreateMessageRequest, CreateRunRequest,
    CreateThreadRequest, CreateVectorStoreRequest, DeletionStatus, FileBatch, FileObject,
    MessageList, ModifyAssistantRequest, Run, Thread, ThreadMessage, ToolResources, VectorStore,
};

const FILE_PURPOSE: &str = "assistants";
const MESSAGE_PAGE_SIZE: u32 = 20;

/// HTTP client for the Assistants v2 REST surface.
#[derive(Debug, Clone)]
pub struct AssistantsClient {
    client: Client,
    api_key: String,
    base_url: String,
    beta_header: String,
}

impl AssistantsClient {
    pub fn new(config: &PlatformConfig) -> Result<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            RelayError::Config("API key required for the assistant platform".to_string())
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RelayError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            beta_header: config.beta_header.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.api_key)
            .header("OpenAI-Beta", &self.beta_header)
    }

    /// Send a request and decode a success body; `endpoint` labels errors and logs.
    async fn send<T: DeserializeOwned>(&self, endpoint: &str, request: RequestBuilder) -> Result<T> {
        debug!(endpoint, "Calling assistant platform");

        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| RelayError::transport(endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());
            warn!(endpoint, %status, body = %body, "Assistant platform rejected request");
            return Err(RelayError::UpstreamRejected {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| RelayError::transport(endpoint, e))?;

        serde_json::from_slice(&bytes).map_err(|e| RelayError::InvalidResponse {
            endpoint: endpoint.to_string(),
            message: format!("Failed to parse response: {e}"),
        })
    }

    async fn delete(&self, endpoint: &str, path: &str) -> Result<()> {
        let status: DeletionStatus = self
            .send(endpoint, self.client.delete(self.url(path)))
            .await?;
        if !status.deleted {
            return Err(RelayError::InvalidResponse {
                endpoint: endpoint.to_string(),
                message: format!("{} was not deleted", status.id),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl AssistantPlatform for AssistantsClient {
    async fn upload_file(&self, upload: &Upload) -> Result<FileObject> {
        let content_type = upload.content_type();
        let part = multipart::Part::bytes(upload.bytes.to_vec())
            .file_name(upload.file_name.clone())
            .mime_str(&content_type)
            .map_err(|e| RelayError::Validation(format!("Invalid content type: {e}")))?;

        let form = multipart::Form::new()
            .text("purpose", FILE_PURPOSE)
            .part("file", part);

        self.send(
            "POST /files",
            self.client.post(self.url("/files")).multipart(form),
        )
        .await
    }

    async fn create_vector_store(&self, name: &str) -> Result<VectorStore> {
        self.send(
            "POST /vector_stores",
            self.client
                .post(self.url("/vector_stores"))
                .json(&CreateVectorStoreRequest { name }),
        )
        .await
    }

    async fn create_file_batch(
        &self,
        vector_store_id: &str,
        file_ids: &[String],
    ) -> Result<FileBatch> {
        self.send(
            "POST /vector_stores/{id}/file_batches",
            self.client
                .post(self.url(&format!("/vector_stores/{vector_store_id}/file_batches")))
                .json(&CreateFileBatchRequest { file_ids }),
        )
        .await
    }

    async fn retrieve_file_batch(&self, vector_store_id: &str, batch_id: &str) -> Result<FileBatch> {
        self.send(
            "GET /vector_stores/{id}/file_batches/{batch_id}",
            self.client.get(self.url(&format!(
                "/vector_stores/{vector_store_id}/file_batches/{batch_id}"
            ))),
        )
        .await
    }

    async fn bind_assistant_vector_store(
        &self,
        assistant_id: &str,
        vector_store_id: &str,
    ) -> Result<()> {
        let _: serde_json::Value = self
            .send(
                "POST /assistants/{id}",
                self.client
                    .post(self.url(&format!("/assistants/{assistant_id}")))
                    .json(&ModifyAssistantRequest {
                        tools: vec![AssistantTool::FileSearch],
                        tool_resources: ToolResources::file_search(vector_store_id),
                    }),
            )
            .await?;
        Ok(())
    }

    async fn create_thread(&self, tool_resources: Option<ToolResources>) -> Result<Thread> {
        self.send(
            "POST /threads",
            self.client
                .post(self.url("/threads"))
                .json(&CreateThreadRequest { tool_resources }),
        )
        .await
    }

    async fn create_message(&self, thread_id: &str, content: &str) -> Result<ThreadMessage> {
        self.send(
            "POST /threads/{id}/messages",
            self.client
                .post(self.url(&format!("/threads/{thread_id}/messages")))
                .json(&CreateMessageRequest {
                    role: "user",
                    content,
                }),
        )
        .await
    }

    async fn create_run(
        &self,
        thread_id: &str,
        assistant_id: &str,
        tools: Option<Vec<AssistantTool>>,
    ) -> Result<Run> {
        self.send(
            "POST /threads/{id}/runs",
            self.client
                .post(self.url(&format!("/threads/{thread_id}/runs")))
                .json(&CreateRunRequest {
                    assistant_id,
                    tools,
                }),
        )
        .await
    }

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run> {
        self.send(
            "GET /threads/{id}/runs/{run_id}",
            self.client
                .get(self.url(&format!("/threads/{thread_id}/runs/{run_id}"))),
        )
        .await
    }

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<Run> {
        self.send(
            "POST /threads/{id}/runs/{run_id}/cancel",
            self.client
                .post(self.url(&format!("/threads/{thread_id}/runs/{run_id}/cancel"))),
        )
        .await
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>> {
        let list: MessageList = self
            .send(
                "GET /threads/{id}/messages",
                self.client.get(self.url(&format!(
                    "/threads/{thread_id}/messages?order=desc&limit={MESSAGE_PAGE_SIZE}"
                ))),
            )
            .await?;
        Ok(list.data)
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<()> {
        self.delete("DELETE /threads/{id}", &format!("/threads/{thread_id}"))
            .await
    }

    async fn delete_vector_store(&self, vector_store_id: &str) -> Result<()> {
        self.delete(
            "DELETE /vector_stores/{id}",
            &format!("/vector_stores/{vector_store_id}"),
        )
        .await
    }

    async fn delete_file(&self, file_id: &str) -> Result<()> {
        self.delete("DELETE /files/{id}", &format!("/files/{file_id}"))
            .await
    }
}
