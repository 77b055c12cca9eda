use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A decoded wire frame before classification: the `event:` name plus the
/// payload, parsed as JSON when possible and kept as a raw string otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    pub event: String,
    pub data: Value,
}

/// The recognized stream events, one variant per wire event name.
/// Anything else lands in `Other` and is ignored by the consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    TextDelta {
        delta: String,
    },
    ToolCall {
        id: Option<String>,
        name: String,
        arguments: Value,
    },
    ToolResult {
        id: String,
        result: Value,
    },
    MessageEnd {
        message: Option<String>,
        mode: Option<String>,
        model: Option<String>,
        artifacts: Vec<Value>,
    },
    ErrorEvent {
        id: Option<String>,
        name: Option<String>,
        error: Option<String>,
    },
    Other {
        event: String,
        data: Value,
    },
}

// Payload shapes are permissive: every field defaults, so a sparse or even
// non-object payload degrades to defaults instead of failing the turn.

#[derive(Debug, Default, Deserialize)]
struct TextDeltaPayload {
    #[serde(default)]
    delta: String,
}

#[derive(Debug, Default, Deserialize)]
struct ToolCallPayload {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Debug, Default, Deserialize)]
struct ToolResultPayload {
    #[serde(default)]
    id: String,
    #[serde(default)]
    result: Value,
}

#[derive(Debug, Default, Deserialize)]
struct MessageEndPayload {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    mode: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    artifacts: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorPayload {
    #[serde(default, deserialize_with = "string_or_number")]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Accept both `"id": "t1"` and `"id": 42` — some backends number their
/// error frames.
fn string_or_number<'de, D>(de: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(de)?;
    Ok(value.and_then(|v| match v {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }))
}

fn parse_or_default<T: Default + for<'de> Deserialize<'de>>(data: Value) -> T {
    serde_json::from_value(data).unwrap_or_default()
}

impl StreamEvent {
    /// Classify a decoded frame by its event name.
    pub fn from_raw(raw: RawEvent) -> Self {
        let RawEvent { event, data } = raw;
        match event.as_str() {
            "text_delta" => {
                let p: TextDeltaPayload = parse_or_default(data);
                StreamEvent::TextDelta { delta: p.delta }
            }
            "tool_call" => {
                let p: ToolCallPayload = parse_or_default(data);
                StreamEvent::ToolCall {
                    id: p.id,
                    name: p.name,
                    arguments: p.arguments,
                }
            }
            "tool_result" => {
                let p: ToolResultPayload = parse_or_default(data);
                StreamEvent::ToolResult {
                    id: p.id,
                    result: p.result,
                }
            }
            "message_end" => {
                let p: MessageEndPayload = parse_or_default(data);
                StreamEvent::MessageEnd {
                    message: p.message,
                    mode: p.mode,
                    model: p.model,
                    artifacts: p.artifacts,
                }
            }
            "error" => {
                let p: ErrorPayload = parse_or_default(data);
                StreamEvent::ErrorEvent {
                    id: p.id,
                    name: p.name,
                    error: p.error,
                }
            }
            _ => StreamEvent::Other { event, data },
        }
    }

    /// Terminal events end the turn; nothing after them is processed.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StreamEvent::MessageEnd { .. } | StreamEvent::ErrorEvent { .. }
        )
    }
}
