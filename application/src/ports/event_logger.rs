//! Port for structured research event logging.
//!
//! Separate from `tracing`: tracing carries human-readable diagnostics,
//! this port records machine-readable cycle events (one JSON object each).

use serde_json::Value;

/// A structured research event.
pub struct ResearchEvent {
    /// Event type identifier (e.g. "task_outcome", "platform_degraded").
    pub event_type: &'static str,
    /// Event-specific fields.
    pub payload: Value,
}

impl ResearchEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Port for logging research events.
///
/// `log` is synchronous and infallible; write failures are dropped.
pub trait EventLogger: Send + Sync {
    fn log(&self, event: ResearchEvent);
}

/// No-op implementation for tests and when event logging is disabled.
pub struct NoEventLogger;

impl EventLogger for NoEventLogger {
    fn log(&self, _event: ResearchEvent) {}
}
