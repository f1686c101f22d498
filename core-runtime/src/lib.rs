//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the audio bridge:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus for host notifications
//!
//! ## Overview
//!
//! Every other core crate depends on this one. It fixes the logging
//! conventions (what may appear in a log line, how events reach a host log
//! sink), the configuration defaults, and the broadcast channel through which
//! `onCompletion`/`onError` notifications leave the bridge.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::BridgeConfig;
pub use error::{Error, Result};
pub use events::{BridgeEvent, EventBus, EventEnvelope, EventStream};
