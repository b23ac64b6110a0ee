use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct FileObject {
    pub id: String,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub bytes: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VectorStore {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    InProgress,
    Completed,
    Cancelled,
    Failed,
    #[serde(other)]
    Unknown,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileBatch {
    pub id: String,
    pub status: BatchStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Thread {
    pub id: String,
}

/// Lifecycle of an assistant run as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Incomplete,
    Expired,
    #[serde(other)]
    Unknown,
}

/// Coarse view of [`RunStatus`] used by the poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Pending,
    Succeeded,
    Failed,
}

impl RunStatus {
    pub fn phase(&self) -> RunPhase {
        match self {
            Self::Completed => RunPhase::Succeeded,
            // No tool outputs are ever submitted, so a run waiting on them is stuck.
            Self::Failed
            | Self::Cancelled
            | Self::Expired
            | Self::Incomplete
            | Self::RequiresAction => RunPhase::Failed,
            Self::Queued | Self::InProgress | Self::Cancelling | Self::Unknown => RunPhase::Pending,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.phase() != RunPhase::Pending
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::InProgress => "in_progress",
            Self::RequiresAction => "requires_action",
            Self::Cancelling => "cancelling",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
            Self::Completed => "completed",
            Self::Incomplete => "incomplete",
            Self::Expired => "expired",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunError {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Run {
    pub id: String,
    pub status: RunStatus,
    #[serde(default)]
    pub last_error: Option<RunError>,
}

impl Run {
    pub fn last_error_summary(&self) -> Option<String> {
        self.last_error
            .as_ref()
            .map(|e| format!("{}: {}", e.code, e.message))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextContent {
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    Text { text: TextContent },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ThreadMessage {
    pub id: String,
    pub role: MessageRole,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub content: Vec<MessageContent>,
}

impl ThreadMessage {
    /// Text parts of the message joined with newlines; `None` when there are none.
    pub fn text(&self) -> Option<String> {
        let parts: Vec<&str> = self
            .content
            .iter()
            .filter_map(|part| match part {
                MessageContent::Text { text } => Some(text.value.as_str()),
                MessageContent::Other => None,
            })
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n"))
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageList {
    pub data: Vec<ThreadMessage>,
}

/// Picks the newest assistant-authored message. Ties on `created_at` (one-second
/// resolution) fall back to list order, which the platform returns newest first.
pub fn latest_assistant_message(messages: &[ThreadMessage]) -> Option<&ThreadMessage> {
    messages
        .iter()
        .enumerate()
        .filter(|(_, m)| m.role == MessageRole::Assistant)
        .max_by(|(ia, a), (ib, b)| a.created_at.cmp(&b.created_at).then(ib.cmp(ia)))
        .map(|(_, m)| m)
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeletionStatus {
    pub id: String,
    pub deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssistantTool {
    FileSearch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSearchResources {
    pub vector_store_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolResources {
    pub file_search: FileSearchResources,
}

impl ToolResources {
    pub fn file_search(vector_store_id: &str) -> Self {
        Self {
            file_search: FileSearchResources {
                vector_store_ids: vec![vector_store_id.to_string()],
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateVectorStoreRequest<'a> {
    pub name: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateFileBatchRequest<'a> {
    pub file_ids: &'a [String],
}

#[derive(Debug, Serialize)]
pub(crate) struct ModifyAssistantRequest {
    pub tools: Vec<AssistantTool>,
    pub tool_resources: ToolResources,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateThreadRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_resources: Option<ToolResources>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateMessageRequest<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateRunRequest<'a> {
    pub assistant_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<AssistantTool>>,
}
