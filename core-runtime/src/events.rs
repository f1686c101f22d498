//! # Event Bus System
//!
//! Delivers playback notifications to host listeners through
//! `tokio::sync::broadcast`, outside the command/response path.
//!
//! ## Overview
//!
//! The event bus system consists of:
//! - **Event Types**: [`BridgeEvent`] (`Completion` or `Error`) wrapped in an
//!   [`EventEnvelope`] that records which session produced it
//! - **EventBus**: Central broadcast channel for publishing events
//! - **EventStream**: Wrapper for consuming events with filtering
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     emit      ┌───────────┐     subscribe    ┌──────────────┐
//! │ Player actor ├──────────────>│ EventBus  ├─────────────────>│ Host binding │
//! └──────────────┘               │ (broadcast│                  └──────────────┘
//!                                │  channel) │     subscribe    ┌──────────────┐
//!                                │           ├─────────────────>│ Test / IPC   │
//!                                └───────────┘                  └──────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use bridge_traits::SessionToken;
//! use core_runtime::events::{BridgeEvent, EventBus, EventEnvelope};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = EventBus::new(100);
//! let mut stream = event_bus.subscribe();
//!
//! event_bus
//!     .emit(EventEnvelope::new(SessionToken::new(1), BridgeEvent::Completion))
//!     .ok();
//!
//! let envelope = stream.recv().await.unwrap();
//! assert_eq!(envelope.event.method_name(), "onCompletion");
//! # }
//! ```
//!
//! ## Delivery Semantics
//!
//! Delivery is fire-and-forget. Emitting with no subscriber fails with
//! `SendError` and the event is gone; nothing is buffered for late
//! listeners. A subscriber that falls more than the buffer size behind gets
//! `RecvError::Lagged(n)` and keeps receiving newer events. `RecvError::Closed`
//! means every sender was dropped, i.e. the bridge shut down.

use bridge_traits::{EngineFault, SessionToken};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Event Types
// ============================================================================

/// Notification pushed to the host when a session reaches a terminal state.
///
/// Stopping a session never produces an event; the host asked for it and
/// already got its reply.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum BridgeEvent {
    /// The source played through to the end.
    Completion,
    /// The engine reported a failure while preparing or playing.
    Error {
        /// Engine-specific code (the native `what`).
        code: i32,
        /// Secondary engine detail, if the engine provides one.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        extra: Option<i32>,
        /// Human-readable description.
        message: String,
    },
}

impl BridgeEvent {
    /// Builds an `Error` event from an engine fault.
    pub fn error(fault: &EngineFault) -> Self {
        BridgeEvent::Error {
            code: fault.code,
            extra: fault.extra,
            message: fault.message.clone(),
        }
    }

    /// Name of the host callback this event is delivered through.
    pub fn method_name(&self) -> &'static str {
        match self {
            BridgeEvent::Completion => "onCompletion",
            BridgeEvent::Error { .. } => "onError",
        }
    }

    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            BridgeEvent::Completion => "Playback completed",
            BridgeEvent::Error { .. } => "Playback error occurred",
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            BridgeEvent::Completion => EventSeverity::Info,
            BridgeEvent::Error { .. } => EventSeverity::Error,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, BridgeEvent::Error { .. })
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    /// Debug-level events (verbose)
    Debug,
    /// Informational events
    Info,
    /// Warning events
    Warning,
    /// Error events
    Error,
}

/// A [`BridgeEvent`] tagged with the session that produced it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventEnvelope {
    pub session: SessionToken,
    pub event: BridgeEvent,
}

impl EventEnvelope {
    pub fn new(session: SessionToken, event: BridgeEvent) -> Self {
        Self { session, event }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to bridge events.
///
/// Cloning the bus is cheap; all clones publish into the same channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventEnvelope>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of events to buffer per subscriber.
    ///   When a subscriber falls behind by more than this amount, it will
    ///   receive a `RecvError::Lagged` error.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an
    /// error if there are no active subscribers.
    pub fn emit(&self, envelope: EventEnvelope) -> Result<usize, SendError<EventEnvelope>> {
        self.sender.send(envelope)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<EventEnvelope> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

/// Type alias for event filter functions.
type EventFilter = Box<dyn Fn(&EventEnvelope) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with optional filtering.
///
/// # Example
///
/// ```rust
/// use core_runtime::events::{EventBus, EventStream};
///
/// let event_bus = EventBus::new(100);
/// let errors_only = EventStream::new(event_bus.subscribe())
///     .filter(|envelope| envelope.event.is_error());
/// ```
pub struct EventStream {
    receiver: Receiver<EventEnvelope>,
    filter: Option<EventFilter>,
}

impl EventStream {
    /// Creates a new event stream from a receiver.
    pub fn new(receiver: Receiver<EventEnvelope>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Adds a filter function to this stream.
    ///
    /// Only events that match the filter will be returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&EventEnvelope) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, envelope: &EventEnvelope) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(envelope))
    }

    /// Receives the next event that passes the filter (if any).
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<EventEnvelope, RecvError> {
        loop {
            let envelope = self.receiver.recv().await?;
            if self.accepts(&envelope) {
                return Ok(envelope);
            }
        }
    }

    /// Attempts to receive an event without blocking.
    ///
    /// Returns `None` if no events are currently available.
    pub fn try_recv(&mut self) -> Option<Result<EventEnvelope, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(envelope) => {
                    if self.accepts(&envelope) {
                        return Some(Ok(envelope));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
