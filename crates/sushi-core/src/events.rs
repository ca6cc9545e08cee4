//! Event emission abstraction.
//!
//! Long-running work reports progress through an `EventSink` so the engine
//! does not depend on any particular frontend.

use std::sync::{Arc, Mutex};

pub const SCAN_STARTED: &str = "scan-started";
pub const SCAN_COMPLETED: &str = "scan-completed";
pub const SCAN_FAILED: &str = "scan-failed";

/// Receives named events with JSON payloads.
pub trait EventSink: Send + Sync {
    fn emit(&self, event_name: &str, payload_json: &str);
}

/// Extension trait for EventSink that provides typed emit functionality.
pub trait EventSinkExt {
    /// Emit an event with a typed payload that will be serialized to JSON.
    fn emit_typed<T: serde::Serialize>(&self, event_name: &str, payload: &T);
}

impl<S: EventSink + ?Sized> EventSinkExt for S {
    fn emit_typed<T: serde::Serialize>(&self, event_name: &str, payload: &T) {
        match serde_json::to_string(payload) {
            Ok(json) => self.emit(event_name, &json),
            Err(e) => {
                tracing::error!("failed to serialize {} payload: {}", event_name, e);
            }
        }
    }
}

/// Shared reference to an EventSink implementation.
pub type SharedEventSink = Arc<dyn EventSink>;

#[derive(Debug, Clone, Default)]
pub struct NoOpEventSink;

impl EventSink for NoOpEventSink {
    fn emit(&self, _event_name: &str, _payload_json: &str) {}
}

/// Writes every event to the log at debug level.
#[derive(Debug, Clone, Default)]
pub struct LoggingEventSink;

impl EventSink for LoggingEventSink {
    fn emit(&self, event_name: &str, payload_json: &str) {
        tracing::debug!(event = event_name, payload = payload_json, "event emitted");
    }
}

/// Keeps emitted events in memory.
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<(String, serde_json::Value)>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far, oldest first.
    pub fn events(&self) -> Vec<(String, serde_json::Value)> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn names(&self) -> Vec<String> {
        self.events().into_iter().map(|(name, _)| name).collect()
    }
}

impl EventSink for RecordingEventSink {
    fn emit(&self, event_name: &str, payload_json: &str) {
        let payload = serde_json::from_str(payload_json)
            .unwrap_or_else(|_| serde_json::Value::String(payload_json.to_string()));
        if let Ok(mut events) = self.events.lock() {
            events.push((event_name.to_string(), payload));
        }
    }
}
