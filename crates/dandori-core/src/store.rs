//! Conversation state for the current chat session.
//!
//! The store exclusively owns the three collections a turn populates:
//! messages, tool events, and recommended-course artifacts. All mutation
//! goes through named operations; the UI observes changes by polling
//! `revision()` each frame, the single-threaded replacement for the
//! original subscriber-based store.

use serde_json::Value;

use dandori_types::course::Artifact;
use dandori_types::message::{ChatMessage, HistoryEntry, Role};
use dandori_types::tool::{ToolEvent, ToolStatus};

#[derive(Default)]
pub struct ChatStore {
    messages: Vec<ChatMessage>,
    tool_events: Vec<ToolEvent>,
    artifacts: Vec<Artifact>,
    is_loading: bool,
    revision: u64,
}

impl ChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    /// Monotonic change counter; bumps on every mutation
    pub fn revision(&self) -> u64 {
        self.revision
    }

    // ─── Messages ────────────────────────────────────────────

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Append a message and return it with its assigned id and timestamp.
    /// Later mutation must go through the returned id.
    pub fn push_message(&mut self, message: ChatMessage) -> ChatMessage {
        self.messages.push(message.clone());
        self.touch();
        message
    }

    /// Mutate a message in place. Returns false when the id is no longer
    /// present, which is how a stale completion from an abandoned turn is
    /// dropped instead of resurrecting cleared state.
    pub fn update_message(&mut self, id: &str, f: impl FnOnce(&mut ChatMessage)) -> bool {
        match self.messages.iter_mut().find(|m| m.id == id) {
            Some(msg) => {
                f(msg);
                self.touch();
                true
            }
            None => false,
        }
    }

    /// Clears messages and the artifacts that referred to them
    pub fn clear_messages(&mut self) {
        self.messages.clear();
        self.artifacts.clear();
        self.touch();
    }

    /// History payload for the next request: the most recent `limit`
    /// user/assistant/system turns, reduced to role + content.
    pub fn history(&self, limit: usize) -> Vec<HistoryEntry> {
        let eligible: Vec<&ChatMessage> = self
            .messages
            .iter()
            .filter(|m| matches!(m.role, Role::User | Role::Assistant | Role::System))
            .collect();
        let start = eligible.len().saturating_sub(limit);
        eligible[start..].iter().map(|m| HistoryEntry::from(*m)).collect()
    }

    // ─── Tool events ─────────────────────────────────────────

    pub fn tool_events(&self) -> &[ToolEvent] {
        &self.tool_events
    }

    pub fn push_tool_event(&mut self, event: ToolEvent) {
        self.tool_events.push(event);
        self.touch();
    }

    /// Settle a running tool event by its call id. A result whose payload
    /// carries an `error` field marks the event failed; anything else
    /// completes it. Unknown ids and already-settled events are no-ops —
    /// status never moves backward.
    pub fn resolve_tool_event(&mut self, id: &str, result: Value) -> bool {
        let Some(event) = self
            .tool_events
            .iter_mut()
            .find(|e| e.id == id && e.status == ToolStatus::Running)
        else {
            return false;
        };
        if let Some(err) = result.get("error") {
            event.status = ToolStatus::Error;
            event.error = Some(match err {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            });
        } else {
            event.status = ToolStatus::Completed;
        }
        event.result = Some(result);
        self.touch();
        true
    }

    pub fn clear_tool_events(&mut self) {
        self.tool_events.clear();
        self.touch();
    }

    // ─── Artifacts ───────────────────────────────────────────

    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    /// Ingest a recommended course, deduplicated by derived id.
    /// The first occurrence wins; a duplicate is a no-op, not an update.
    pub fn push_artifact(&mut self, course: Value) -> bool {
        let artifact = Artifact::from_course(course);
        if self.artifacts.iter().any(|a| a.id == artifact.id) {
            return false;
        }
        self.artifacts.push(artifact);
        self.touch();
        true
    }

    pub fn clear_artifacts(&mut self) {
        self.artifacts.clear();
        self.touch();
    }

    // ─── Loading flag ────────────────────────────────────────

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.is_loading = loading;
        self.touch();
    }

    // ─── Session reset ───────────────────────────────────────

    pub fn reset(&mut self) {
        self.messages.clear();
        self.tool_events.clear();
        self.artifacts.clear();
        self.is_loading = false;
        self.touch();
    }
}
