//! One request/response turn, end to end.
//!
//! Pipeline: submit → open the network stream → decode frames → fold each
//! event into the `ChatStore` → stop at the first terminal event. A stream
//! that ends without one falls back to the plain request endpoint; every
//! failure converts into an error-state message rather than propagating.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;

use dandori_types::event::StreamEvent;
use dandori_types::message::{ChatMessage, MessageMeta};
use dandori_types::tool::ToolEvent;
use dandori_types::Result;

use crate::decode::EventDecoder;
use crate::ports::{ChatPort, ChatRequest};
use crate::store::ChatStore;

/// Context-window bound on the history sent with each request
pub const HISTORY_LIMIT: usize = 10;

/// Shown when the server's `error` event carries no text
pub const ERROR_EVENT_FALLBACK: &str = "I ran into an issue while processing that request.";

/// Shown when the turn itself fails with no usable description
pub const TURN_FAILURE_FALLBACK: &str =
    "I apologize, but I encountered an issue. Please try again.";

/// Run one chat turn against the store.
///
/// The store is only borrowed between suspension points, never across an
/// await, so the UI can keep rendering the in-flight message while the
/// stream is read.
pub async fn run_chat_turn(
    store: &Rc<RefCell<ChatStore>>,
    api: &dyn ChatPort,
    input: &str,
    profile: Option<Value>,
) {
    let (request, assistant_id) = {
        let mut s = store.borrow_mut();
        // History is captured before this turn's user message joins it
        let history = s.history(HISTORY_LIMIT);
        s.push_message(ChatMessage::user(input));
        s.set_loading(true);
        s.clear_tool_events();
        s.clear_artifacts();
        let placeholder = s.push_message(ChatMessage::streaming_placeholder());
        let request = ChatRequest {
            message: input.to_string(),
            history,
            profile,
        };
        (request, placeholder.id)
    };

    log::debug!("chat turn started");

    match consume_stream(store, api, request.clone(), &assistant_id).await {
        Ok(true) => {}
        Ok(false) => {
            // Protocol-incomplete: the source drained with no terminal
            // event. Re-issue the same payload synchronously.
            log::warn!("stream ended without a terminal event, using fallback request");
            match api.send_message(request).await {
                Ok(reply) => {
                    let mut s = store.borrow_mut();
                    s.update_message(&assistant_id, |m| {
                        m.content = reply.message;
                        m.is_streaming = false;
                    });
                    for course in reply.artifacts {
                        s.push_artifact(course);
                    }
                }
                Err(e) => fail_turn(store, &assistant_id, e.to_string()),
            }
        }
        Err(e) => {
            log::warn!("chat stream failed: {}", e);
            fail_turn(store, &assistant_id, e.to_string());
        }
    }

    store.borrow_mut().set_loading(false);
    log::debug!("chat turn finished");
}

/// Drive the decoder until a terminal event or end of source.
/// Returns whether a terminal event was processed.
async fn consume_stream(
    store: &Rc<RefCell<ChatStore>>,
    api: &dyn ChatPort,
    request: ChatRequest,
    assistant_id: &str,
) -> Result<bool> {
    let mut decoder = EventDecoder::new(api.stream_chat(request));
    while let Some(raw) = decoder.next_event().await? {
        let event = StreamEvent::from_raw(raw);
        let terminal = event.is_terminal();
        apply_event(&mut store.borrow_mut(), assistant_id, event);
        if terminal {
            // Remaining frames in the source are intentionally discarded
            return Ok(true);
        }
    }
    Ok(false)
}

/// Fold one decoded event into the store. Exactly one state transition per
/// event, in arrival order.
fn apply_event(store: &mut ChatStore, assistant_id: &str, event: StreamEvent) {
    match event {
        StreamEvent::TextDelta { delta } => {
            store.update_message(assistant_id, |m| m.content.push_str(&delta));
        }
        StreamEvent::ToolCall { id, name, arguments } => {
            store.push_tool_event(ToolEvent::running(id, name, arguments, assistant_id));
        }
        StreamEvent::ToolResult { id, result } => {
            if !store.resolve_tool_event(&id, result) {
                log::debug!("tool result for unknown call id {:?}, ignoring", id);
            }
        }
        StreamEvent::MessageEnd {
            message,
            mode,
            model,
            artifacts,
        } => {
            store.update_message(assistant_id, |m| {
                // Absent or empty final text keeps the accumulated deltas
                if let Some(text) = message.filter(|t| !t.is_empty()) {
                    m.content = text;
                }
                m.is_streaming = false;
                m.metadata = Some(MessageMeta { mode, model });
            });
            for course in artifacts {
                store.push_artifact(course);
            }
        }
        StreamEvent::ErrorEvent { id, name, error } => {
            store.update_message(assistant_id, |m| {
                m.content = error
                    .clone()
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| ERROR_EVENT_FALLBACK.to_string());
                m.is_error = true;
                m.is_streaming = false;
            });
            store.push_tool_event(ToolEvent::failed(id, name, error, assistant_id));
        }
        StreamEvent::Other { event, .. } => {
            log::debug!("ignoring unrecognized stream event {:?}", event);
        }
    }
}

/// Convert any turn-level failure into an error-state message
fn fail_turn(store: &Rc<RefCell<ChatStore>>, assistant_id: &str, detail: String) {
    let text = if detail.is_empty() {
        TURN_FAILURE_FALLBACK.to_string()
    } else {
        detail
    };
    store.borrow_mut().update_message(assistant_id, |m| {
        m.content = text;
        m.is_error = true;
        m.is_streaming = false;
    });
}
