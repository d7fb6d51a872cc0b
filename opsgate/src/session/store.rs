//! Session store: one gate per operator.

use super::operator::Session;
use crate::config::GateConfig;
use crate::events::{EventSink, NoOpEventSink};
use crate::toolbelt::ToolbeltRegistry;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Maps session IDs to their sessions.
///
/// A host that re-runs its request handler on every interaction looks the
/// session up here each time and always finds the same gate. Sessions are
/// isolated from one another.
pub struct SessionStore {
    sessions: DashMap<String, Arc<Session>>,
    registry: Arc<ToolbeltRegistry>,
    config: GateConfig,
    event_sink: Arc<dyn EventSink>,
}

impl SessionStore {
    /// Creates an empty store sharing `registry` across sessions.
    #[must_use]
    pub fn new(registry: Arc<ToolbeltRegistry>, config: GateConfig) -> Self {
        Self {
            sessions: DashMap::new(),
            registry,
            config,
            event_sink: Arc::new(NoOpEventSink),
        }
    }

    /// Sets the event sink handed to new sessions.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = sink;
        self
    }

    /// Returns the configuration sessions are created with.
    #[must_use]
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Returns the shared registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<ToolbeltRegistry> {
        &self.registry
    }

    /// Returns the session for `id`, creating it on first use.
    pub fn get_or_create(&self, id: &str) -> Arc<Session> {
        Arc::clone(
            self.sessions
                .entry(id.to_string())
                .or_insert_with(|| {
                    debug!(session_id = %id, "Session created");
                    Arc::new(self.build(id))
                })
                .value(),
        )
    }

    /// Creates a session with a fresh ID.
    pub fn create(&self) -> Arc<Session> {
        self.get_or_create(&Uuid::now_v7().to_string())
    }

    /// Returns the session for `id`, if it exists.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Removes a session.
    pub fn remove(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.remove(id).map(|(_, session)| session)
    }

    /// Returns the IDs of all live sessions.
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        self.sessions.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Returns the number of live sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns true if there are no sessions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drops sessions idle for longer than the configured TTL.
    ///
    /// Only sessions whose gate is idle are reaped. A pending proposal, a
    /// running execution or an unacknowledged resolution keeps its session
    /// alive. Returns the number of sessions removed.
    pub fn reap_expired(&self) -> usize {
        let ttl = self.config.session_ttl();
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| session.idle_for() <= ttl || !session.gate().is_idle());
        let reaped = before.saturating_sub(self.sessions.len());
        if reaped > 0 {
            info!(reaped, remaining = self.sessions.len(), "Reaped idle sessions");
        }
        reaped
    }

    fn build(&self, id: &str) -> Session {
        Session::from_config(id, Arc::clone(&self.registry), &self.config)
            .with_event_sink(Arc::clone(&self.event_sink))
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("sessions", &self.sessions.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
