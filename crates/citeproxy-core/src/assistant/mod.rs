//! Assistant backend: the remote service that owns threads, runs and files.
//!
//! [`AssistantBackend`] is the seam between the orchestrator and the network;
//! [`AssistantsClient`] is the HTTP implementation.

mod client;
pub mod types;

use async_trait::async_trait;

use crate::error::ProxyResult;

pub use client::{AssistantsClient, ASSISTANTS_BETA_HEADER};
pub use types::{
    Annotation, ChunkContent, CreateRun, FileCitationRef, FileObject, MessageContent, MessageRole,
    MessageText, PageValue, Run, RunError, RunOutcome, RunStatus, RunStep, Thread, ThreadMessage,
};

/// Operations the orchestrator needs from the assistant service.
///
/// Every method maps non-success responses to [`crate::ProxyError::Upstream`].
#[async_trait]
pub trait AssistantBackend: Send + Sync {
    /// Create a thread holding `question` as its only user message.
    async fn create_thread(&self, question: &str) -> ProxyResult<Thread>;

    async fn create_run(&self, thread_id: &str, request: &CreateRun) -> ProxyResult<Run>;

    async fn get_run(&self, thread_id: &str, run_id: &str) -> ProxyResult<Run>;

    /// Steps in API order.
    async fn list_run_steps(&self, thread_id: &str, run_id: &str) -> ProxyResult<Vec<RunStep>>;

    /// Messages in API order (newest first by default).
    async fn list_messages(&self, thread_id: &str) -> ProxyResult<Vec<ThreadMessage>>;

    async fn get_file(&self, file_id: &str) -> ProxyResult<FileObject>;

    async fn get_file_chunk(&self, file_id: &str, chunk_id: &str) -> ProxyResult<ChunkContent>;
}
