//! Wire types for the assistant API (threads, runs, steps, messages, files).
//!
//! Only the fields the proxy reads are modelled; everything else is ignored.

use serde::{Deserialize, Deserializer, Serialize};

/// Paged list envelope (`{"object": "list", "data": [...]}`).
#[derive(Debug, Deserialize)]
pub(crate) struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateThreadRequest<'a> {
    pub messages: Vec<NewMessage<'a>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct NewMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

/// Body of `POST /threads/{thread_id}/runs`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CreateRun {
    pub assistant_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Thread {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Run {
    pub id: String,
    pub status: RunStatus,
    #[serde(default)]
    pub last_error: Option<RunError>,
}

impl Run {
    /// The upstream failure message, if the run reported one.
    pub fn error_message(&self) -> Option<&str> {
        self.last_error
            .as_ref()
            .and_then(|e| e.message.as_deref())
            .filter(|m| !m.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

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

/// What the poll loop should do with a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Pending,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn outcome(self) -> RunOutcome {
        match self {
            RunStatus::Completed => RunOutcome::Completed,
            RunStatus::Cancelled | RunStatus::Failed | RunStatus::Expired => RunOutcome::Failed,
            _ => RunOutcome::Pending,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::RequiresAction => "requires_action",
            RunStatus::Cancelling => "cancelling",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Failed => "failed",
            RunStatus::Completed => "completed",
            RunStatus::Incomplete => "incomplete",
            RunStatus::Expired => "expired",
            RunStatus::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunStep {
    #[serde(default)]
    pub step_details: Option<StepDetails>,
}

impl RunStep {
    /// Citation recorded on the step's first tool call, if any.
    pub fn first_file_citation(&self) -> Option<&FileCitationRef> {
        self.step_details
            .as_ref()?
            .tool_calls
            .first()?
            .file_citation
            .as_ref()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StepDetails {
    #[serde(default, deserialize_with = "null_as_default")]
    pub tool_calls: Vec<ToolCall>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolCall {
    #[serde(default)]
    pub file_citation: Option<FileCitationRef>,
}

/// Document reference carried by a tool call or an annotation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileCitationRef {
    pub file_id: String,
    #[serde(default)]
    pub file_chunk_id: Option<String>,
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
pub struct ThreadMessage {
    pub role: MessageRole,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: Vec<MessageContent>,
}

impl ThreadMessage {
    /// Text blocks in order; image and other block kinds are skipped.
    pub fn text_blocks(&self) -> impl Iterator<Item = &MessageText> {
        self.content.iter().filter_map(|block| match block {
            MessageContent::Text { text } => Some(text),
            MessageContent::Other => None,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    Text { text: MessageText },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageText {
    pub value: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Annotation {
    FileCitation {
        /// Literal token as it appears in the message text.
        text: String,
        file_citation: FileCitationRef,
    },
    #[serde(other)]
    Other,
}

/// `GET /files/{file_id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct FileObject {
    pub filename: String,
}

/// `GET /files/{file_id}/content?chunk_id=...`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkContent {
    #[serde(default)]
    pub page_range: Option<PageRange>,
    #[serde(default)]
    pub page_number: Option<PageValue>,
}

impl ChunkContent {
    /// `page_range.start`, falling back to `page_number`.
    pub fn page(&self) -> Option<&PageValue> {
        self.page_range
            .as_ref()
            .and_then(|r| r.start.as_ref())
            .or(self.page_number.as_ref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageRange {
    #[serde(default)]
    pub start: Option<PageValue>,
}

/// A page as the chunk endpoint reports it: usually an integer, occasionally a
/// float or a string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PageValue {
    Number(serde_json::Number),
    Text(String),
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn terminal_statuses() {
        assert_eq!(RunStatus::Completed.outcome(), RunOutcome::Completed);
        for status in [RunStatus::Cancelled, RunStatus::Failed, RunStatus::Expired] {
            assert_eq!(status.outcome(), RunOutcome::Failed);
        }
        for status in [RunStatus::Queued, RunStatus::InProgress, RunStatus::Incomplete, RunStatus::Unknown] {
            assert_eq!(status.outcome(), RunOutcome::Pending);
        }
    }

    #[test]
    fn unknown_status_does_not_break_decoding() {
        let run: Run = serde_json::from_value(json!({"id": "run_1", "status": "paused_for_lunch"})).unwrap();
        assert_eq!(run.status, RunStatus::Unknown);
        assert_eq!(run.error_message(), None);
    }

    #[test]
    fn failed_run_carries_message() {
        let run: Run = serde_json::from_value(json!({
            "id": "run_1",
            "status": "failed",
            "last_error": {"code": "server_error", "message": "boom"}
        }))
        .unwrap();
        assert_eq!(run.error_message(), Some("boom"));
    }

    #[test]
    fn message_blocks_and_annotations() {
        let msg: ThreadMessage = serde_json::from_value(json!({
            "id": "msg_1",
            "role": "assistant",
            "content": [
                {"type": "image_file", "image_file": {"file_id": "file-img"}},
                {"type": "text", "text": {"value": "See 【4:0†source】", "annotations": [
                    {"type": "file_citation", "text": "【4:0†source】", "start_index": 4, "end_index": 16,
                     "file_citation": {"file_id": "file-abc123"}},
                    {"type": "file_path", "text": "sandbox:/x", "file_path": {"file_id": "file-x"}}
                ]}},
                {"type": "text", "text": {"value": "second", "annotations": null}}
            ]
        }))
        .unwrap();
        assert_eq!(msg.role, MessageRole::Assistant);
        let blocks: Vec<_> = msg.text_blocks().collect();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].annotations.len(), 2);
        assert!(matches!(
            &blocks[0].annotations[0],
            Annotation::FileCitation { text, file_citation }
                if text == "【4:0†source】" && file_citation.file_id == "file-abc123"
        ));
        assert!(matches!(blocks[0].annotations[1], Annotation::Other));
        assert!(blocks[1].annotations.is_empty());
    }

    #[test]
    fn step_citation_uses_first_tool_call_only() {
        let step: RunStep = serde_json::from_value(json!({
            "step_details": {"type": "tool_calls", "tool_calls": [
                {"id": "call_1", "type": "file_search"},
                {"id": "call_2", "file_citation": {"file_id": "file-a", "file_chunk_id": "chunk-9"}}
            ]}
        }))
        .unwrap();
        assert_eq!(step.first_file_citation(), None);

        let step: RunStep = serde_json::from_value(json!({
            "step_details": {"type": "message_creation", "message_creation": {"message_id": "msg_1"}}
        }))
        .unwrap();
        assert_eq!(step.first_file_citation(), None);
    }

    #[test]
    fn chunk_page_prefers_range_start() {
        let chunk: ChunkContent =
            serde_json::from_value(json!({"page_range": {"start": 7, "end": 9}, "page_number": 3})).unwrap();
        assert_eq!(chunk.page(), Some(&PageValue::Number(7u64.into())));
        let chunk: ChunkContent =
            serde_json::from_value(json!({"page_range": {"start": null}, "page_number": 3})).unwrap();
        assert_eq!(chunk.page(), Some(&PageValue::Number(3u64.into())));
        let chunk: ChunkContent = serde_json::from_value(json!({"text": "..."})).unwrap();
        assert_eq!(chunk.page(), None);
    }

    #[test]
    fn chunk_page_accepts_floats_and_strings() {
        let chunk: ChunkContent = serde_json::from_value(json!({"page_range": {"start": 3.0}})).unwrap();
        assert!(matches!(chunk.page(), Some(PageValue::Number(n)) if n.as_f64() == Some(3.0)));
        let chunk: ChunkContent = serde_json::from_value(json!({"page_number": "iv"})).unwrap();
        assert_eq!(chunk.page(), Some(&PageValue::Text("iv".to_string())));
    }

    #[test]
    fn create_run_omits_missing_instructions() {
        let body = CreateRun {
            assistant_id: "asst_1".to_string(),
            instructions: None,
        };
        assert_eq!(serde_json::to_value(&body).unwrap(), json!({"assistant_id": "asst_1"}));
    }
}
