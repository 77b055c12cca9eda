//! Port traits — the boundary between the chat core and the browser.
//!
//! Implementations live in `dandori-platform`; the core only sees these
//! traits, so tests drive the turn runner with scripted mocks.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use dandori_types::message::HistoryEntry;
use dandori_types::Result;

/// One chat request, streaming or not
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub message: String,
    pub history: Vec<HistoryEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<Value>,
}

/// Body of the non-streaming fallback response
#[derive(Debug, Clone, Deserialize)]
pub struct ChatReply {
    pub message: String,
    #[serde(default)]
    pub artifacts: Vec<Value>,
}

#[async_trait(?Send)]
pub trait ChatPort {
    /// Open a streamed chat response. Items are raw text chunks with no
    /// alignment to frame boundaries; the decoder handles framing.
    fn stream_chat(&self, req: ChatRequest) -> Pin<Box<dyn Stream<Item = Result<String>>>>;

    /// Synchronous chat request, used when the stream ends without a
    /// terminal event.
    async fn send_message(&self, req: ChatRequest) -> Result<ChatReply>;
}
