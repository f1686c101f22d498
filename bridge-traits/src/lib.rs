//! # Host Bridge Traits
//!
//! Platform abstraction traits that each host platform implements for the
//! audio bridge.
//!
//! ## Overview
//!
//! This crate defines the contract between the bridge core (state machine,
//! command handler, event emitter) and the platform players that actually
//! make sound. The core never talks to a media API directly; it drives a
//! [`PlaybackEngine`](playback::PlaybackEngine) and listens for the
//! token-tagged [`EngineSignal`](playback::EngineSignal)s the engine sends
//! back.
//!
//! ## Traits
//!
//! - [`PlaybackEngine`](playback::PlaybackEngine) - acquire / play / stop / release one source
//! - [`LoggerSink`](logging::LoggerSink) - forward structured logs to host logging
//!
//! ## Platform Implementations
//!
//! | Platform | Implementation Crate | Engine |
//! |----------|---------------------|--------|
//! | Desktop  | `bridge-desktop`    | audio worker thread + output device |
//! | Web      | `bridge-wasm`       | `HTMLAudioElement` and `speechSynthesis` |
//!
//! ## Error Handling
//!
//! Engine calls return [`BridgeError`](error::BridgeError). Failures that
//! happen after a call returned (decoder errors, autoplay rejections, speech
//! errors) travel as [`EngineFault`](playback::EngineFault)s inside an
//! `EngineSignal::Error`.
//!
//! ## Thread Safety
//!
//! On native targets engines must be `Send + Sync`; signal senders are safe
//! to use from plain OS threads. On `wasm32` the bounds are dropped (see
//! [`platform`]).

pub mod error;
pub mod logging;
pub mod platform;
pub mod playback;

pub use error::BridgeError;

pub use logging::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use playback::{
    Accent, EngineFault, EngineSignal, PlaybackEngine, PlaybackRequest, SessionToken,
    SignalEnvelope, SignalSender, SourceKind,
};
