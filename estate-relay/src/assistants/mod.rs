//! Client for the hosted assistant platform (files, vector stores, threads and runs).

mod client;
mod platform;
pub mod types;

pub use client::AssistantsClient;
pub use platform::AssistantPlatform;
pub use types::{
    latest_assistant_message, AssistantTool, BatchStatus, FileBatch, FileObject, MessageRole,
    Run, RunPhase, RunStatus, Thread, ThreadMessage, ToolResources, VectorStore,
};
