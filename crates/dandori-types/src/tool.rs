use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lifecycle of one backend tool invocation.
/// Only moves forward: Running → Completed or Running → Error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    Running,
    Completed,
    Error,
}

/// One tool invocation observed during a turn.
///
/// `id` is the call identifier issued by the server's `tool_call` event and
/// echoed by the matching `tool_result` — it is the join key, not a
/// store-assigned handle. A local uuid is substituted only when the server
/// omits one, in which case no result can ever match it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolEvent {
    pub id: String,
    pub name: String,
    pub arguments: Value,
    pub status: ToolStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Owning assistant message, by id (weak reference)
    pub message_id: String,
    pub timestamp: DateTime<Utc>,
}

impl ToolEvent {
    pub fn running(
        id: Option<String>,
        name: impl Into<String>,
        arguments: Value,
        message_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            name: name.into(),
            arguments,
            status: ToolStatus::Running,
            result: None,
            error: None,
            message_id: message_id.into(),
            timestamp: Utc::now(),
        }
    }

    /// Synthetic entry recorded when the stream reports a protocol error
    pub fn failed(
        id: Option<String>,
        name: Option<String>,
        error: Option<String>,
        message_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            name: name.unwrap_or_else(|| "error".to_string()),
            arguments: Value::Null,
            status: ToolStatus::Error,
            result: None,
            error,
            message_id: message_id.into(),
            timestamp: Utc::now(),
        }
    }
}
