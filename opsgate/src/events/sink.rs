//! Sinks that receive gate and execution events.

use parking_lot::Mutex;
use uuid::Uuid;

/// Receiver for the events a gate and its executor report.
///
/// Emission happens while a transition is being committed, so sinks must
/// return quickly and must never fail the caller.
pub trait EventSink: Send + Sync {
    /// Records one event. `data` carries the gate label, proposal id and
    /// operation name where they apply.
    fn try_emit(&self, event_type: &str, data: Option<serde_json::Value>);
}

/// Discards every event. Gates and executors start with this sink.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

impl EventSink for NoOpEventSink {
    fn try_emit(&self, _event_type: &str, _data: Option<serde_json::Value>) {}
}

/// One event captured by a [`CollectingEventSink`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedEvent {
    /// Event name, one of the constants in [`crate::events`].
    pub event_type: String,
    /// Payload as emitted.
    pub data: Option<serde_json::Value>,
}

impl RecordedEvent {
    /// Returns the proposal this event refers to, if any.
    #[must_use]
    pub fn proposal_id(&self) -> Option<Uuid> {
        let raw = self.data.as_ref()?.get("proposal_id")?.as_str()?;
        Uuid::parse_str(raw).ok()
    }

    /// Returns a string field of the payload.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&str> {
        self.data.as_ref()?.get(key)?.as_str()
    }
}

/// Keeps every event in emission order, for audits and assertions.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: Mutex<Vec<RecordedEvent>>,
}

impl CollectingEventSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().clone()
    }

    /// Returns the recorded event names in order.
    #[must_use]
    pub fn event_types(&self) -> Vec<String> {
        self.events.lock().iter().map(|e| e.event_type.clone()).collect()
    }

    /// Returns the events with exactly this name.
    #[must_use]
    pub fn events_of_type(&self, event_type: &str) -> Vec<RecordedEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect()
    }

    /// Returns the lifecycle of one proposal, from submission onwards.
    #[must_use]
    pub fn for_proposal(&self, proposal_id: Uuid) -> Vec<RecordedEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.proposal_id() == Some(proposal_id))
            .cloned()
            .collect()
    }

    /// Returns the number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Forgets everything recorded so far.
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl EventSink for CollectingEventSink {
    fn try_emit(&self, event_type: &str, data: Option<serde_json::Value>) {
        self.events.lock().push(RecordedEvent {
            event_type: event_type.to_string(),
            data,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EXECUTION_STARTED, GATE_APPROVED, GATE_SUBMITTED};
    use pretty_assertions::assert_eq;

    fn payload(id: Uuid, tool: &str) -> Option<serde_json::Value> {
        Some(serde_json::json!({"gate": "ops", "proposal_id": id.to_string(), "tool": tool}))
    }

    #[test]
    fn test_noop_sink_accepts_anything() {
        NoOpEventSink.try_emit(GATE_SUBMITTED, None);
        NoOpEventSink.try_emit(GATE_APPROVED, Some(serde_json::json!({"x": 1})));
    }

    #[test]
    fn test_collecting_sink_keeps_order() {
        let sink = CollectingEventSink::new();
        assert!(sink.is_empty());

        let id = Uuid::new_v4();
        sink.try_emit(GATE_SUBMITTED, payload(id, "restart_service"));
        sink.try_emit(GATE_APPROVED, payload(id, "restart_service"));

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.event_types(), vec![GATE_SUBMITTED, GATE_APPROVED]);
        assert_eq!(sink.events()[0].field("tool"), Some("restart_service"));
    }

    #[test]
    fn test_events_of_type_is_exact() {
        let sink = CollectingEventSink::new();
        sink.try_emit(GATE_SUBMITTED, None);
        sink.try_emit(EXECUTION_STARTED, None);
        sink.try_emit(GATE_SUBMITTED, None);

        assert_eq!(sink.events_of_type(GATE_SUBMITTED).len(), 2);
        assert!(sink.events_of_type("gate.").is_empty());

        sink.clear();
        assert!(sink.is_empty());
    }

    #[test]
    fn test_for_proposal_filters_by_id() {
        let sink = CollectingEventSink::new();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        sink.try_emit(GATE_SUBMITTED, payload(first, "scale_cluster"));
        sink.try_emit(GATE_SUBMITTED, payload(second, "restart_service"));
        sink.try_emit(EXECUTION_STARTED, payload(first, "scale_cluster"));
        sink.try_emit(GATE_APPROVED, None);

        let lifecycle = sink.for_proposal(first);
        assert_eq!(lifecycle.len(), 2);
        assert!(lifecycle.iter().all(|e| e.field("tool") == Some("scale_cluster")));
        assert_eq!(lifecycle[1].proposal_id(), Some(first));
    }
}
