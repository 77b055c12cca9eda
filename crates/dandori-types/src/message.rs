use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single conversation turn as displayed in the chat.
///
/// An assistant message starts as a streaming placeholder whose `content`
/// grows via appends until a terminal stream event (or the fallback path)
/// finalizes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub is_streaming: bool,
    pub is_error: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMeta>,
    pub timestamp: DateTime<Utc>,
}

/// Response metadata attached by a `message_end` event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            is_streaming: false,
            is_error: false,
            metadata: None,
            timestamp: Utc::now(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    /// Empty assistant message awaiting stream deltas
    pub fn streaming_placeholder() -> Self {
        let mut msg = Self::new(Role::Assistant, "");
        msg.is_streaming = true;
        msg
    }
}

/// One entry of the history payload sent with a chat request.
/// Deliberately just role + content: ids, timestamps, and metadata are
/// stripped before anything goes over the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
}

impl From<&ChatMessage> for HistoryEntry {
    fn from(msg: &ChatMessage) -> Self {
        Self {
            role: msg.role,
            content: msg.content.clone(),
        }
    }
}
