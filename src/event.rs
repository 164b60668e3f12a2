use serde_json::Value;

use crate::sse::Frame;

/// Frame data as handed to event handlers.
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    Json(Value),
    Text(String),
}

impl EventPayload {
    /// Parse as JSON; anything that is not valid JSON stays opaque text.
    pub fn from_data(data: &str) -> Self {
        match serde_json::from_str::<Value>(data) {
            Ok(value) => EventPayload::Json(value),
            Err(_) => EventPayload::Text(data.to_string()),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            EventPayload::Json(value) => Some(value),
            EventPayload::Text(_) => None,
        }
    }

    /// The JSON-RPC `id` carried by this payload, normalised to a string.
    pub fn rpc_id(&self) -> Option<String> {
        match self.as_json()?.get("id")? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// A frame delivered to handlers and subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamEvent {
    pub event_type: Option<String>,
    pub payload: EventPayload,
}

impl From<&Frame> for StreamEvent {
    fn from(frame: &Frame) -> Self {
        Self {
            event_type: frame.event_type.clone(),
            payload: EventPayload::from_data(&frame.data),
        }
    }
}

/// Why the event stream stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    EndOfStream,
    Error(String),
    Shutdown,
}
