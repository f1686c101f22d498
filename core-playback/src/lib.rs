//! # Core Playback
//!
//! The bridge's protocol core: the single-slot player state machine, the
//! `audio_player` method channel handler and the event emitter.
//!
//! ## Flow
//!
//! ```text
//! host ──MethodCall──> AudioChannelHandler ──> PlayerHandle ──> player actor ──> PlaybackEngine
//!                                                                   ^                 │
//!                                                                   └─ SignalEnvelope ┘
//! host <──onCompletion / onError── EventEmitter <── player actor
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use core_playback::{spawn_player, AudioChannelHandler, EventEmitter, MethodCall};
//! use core_runtime::events::EventBus;
//!
//! let emitter = EventEmitter::new(EventBus::default());
//! let mut events = emitter.subscribe();
//! let handler = AudioChannelHandler::new(spawn_player(engine, emitter));
//!
//! let reply = handler
//!     .handle(MethodCall::new("play", serde_json::json!({ "path": "/tmp/word.mp3" })))
//!     .await;
//! ```

pub mod channel;
pub mod emitter;
pub mod error;
pub mod player;
pub mod session;

pub use channel::{parse_play_arguments, AudioChannelHandler, MethodCall, MethodResponse};
pub use emitter::EventEmitter;
pub use error::{PlaybackError, Result};
pub use player::{spawn_player, PendingPlay, PlayerHandle, PlayerSnapshot};
pub use session::{PlaybackSession, SessionState};
