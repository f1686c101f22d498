//! Pushes terminal notifications to host listeners.

use bridge_traits::{EngineFault, SessionToken};
use core_runtime::events::{BridgeEvent, EventBus, EventEnvelope, EventStream};
use tracing::debug;

/// Fire-and-forget publisher of [`BridgeEvent`]s.
///
/// Emitting never blocks the player. With no listener attached the event is
/// dropped.
#[derive(Debug, Clone)]
pub struct EventEmitter {
    bus: EventBus,
}

impl EventEmitter {
    pub fn new(bus: EventBus) -> Self {
        Self { bus }
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// New listener. Only events emitted after this call are observed.
    pub fn subscribe(&self) -> EventStream {
        EventStream::new(self.bus.subscribe())
    }

    pub fn completion(&self, session: SessionToken) {
        self.emit(EventEnvelope::new(session, BridgeEvent::Completion));
    }

    pub fn error(&self, session: SessionToken, fault: &EngineFault) {
        self.emit(EventEnvelope::new(session, BridgeEvent::error(fault)));
    }

    fn emit(&self, envelope: EventEnvelope) {
        let method = envelope.event.method_name();
        let session = envelope.session;
        match self.bus.emit(envelope) {
            Ok(listeners) => debug!(%session, method, listeners, "Event delivered"),
            Err(_) => debug!(%session, method, "No listeners, event dropped"),
        }
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new(EventBus::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn emits_to_listeners() {
        let emitter = EventEmitter::new(EventBus::new(8));
        let mut stream = emitter.subscribe();

        emitter.completion(SessionToken::new(1));
        emitter.error(SessionToken::new(2), &EngineFault::unknown("boom"));

        let first = stream.recv().await.unwrap();
        assert_eq!(first.event, BridgeEvent::Completion);

        let second = stream.recv().await.unwrap();
        assert_eq!(second.session, SessionToken::new(2));
        assert_eq!(second.event.method_name(), "onError");
    }

    #[test]
    fn no_listener_is_not_an_error() {
        let emitter = EventEmitter::default();
        emitter.completion(SessionToken::new(1));
        assert_eq!(emitter.bus().subscriber_count(), 0);
    }
}
