//! # Bridge Configuration
//!
//! Tunables shared by the service facade and the platform engines.
//!
//! ## Overview
//!
//! [`BridgeConfig`] is plain data: every field has a default, so a host can
//! deserialize a partial JSON document (or pass nothing at all) and get a
//! working bridge. Dependencies such as the playback engine are not part of
//! the config; they are injected through the service builder, which fails
//! fast when none is available.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::config::BridgeConfig;
//!
//! let config = BridgeConfig::from_json(r#"{ "speech": { "rate": 1.1 } }"#).unwrap();
//! assert_eq!(config.channel_name, "audio_player");
//! assert_eq!(config.speech.rate, 1.1);
//! assert_eq!(config.speech.pitch, 1.0);
//! ```

use crate::error::{Error, Result};
use bridge_traits::playback::Accent;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Method channel name the host registers the bridge under.
pub const DEFAULT_CHANNEL_NAME: &str = "audio_player";

/// Top-level bridge configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Name of the host method channel.
    pub channel_name: String,
    /// Per-listener buffer of the event bus. Slow listeners lag past this.
    pub event_buffer_size: usize,
    /// Speech synthesis parameters (browser engine).
    pub speech: SpeechSettings,
    /// Native engine parameters.
    pub native: NativeSettings,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            channel_name: DEFAULT_CHANNEL_NAME.to_string(),
            event_buffer_size: crate::events::DEFAULT_EVENT_BUFFER_SIZE,
            speech: SpeechSettings::default(),
            native: NativeSettings::default(),
        }
    }
}

impl BridgeConfig {
    /// Parses a (possibly partial) JSON document and validates it.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("Invalid bridge config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_channel_name(mut self, name: impl Into<String>) -> Self {
        self.channel_name = name.into();
        self
    }

    pub fn with_event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = size;
        self
    }

    pub fn with_speech(mut self, speech: SpeechSettings) -> Self {
        self.speech = speech;
        self
    }

    pub fn with_native(mut self, native: NativeSettings) -> Self {
        self.native = native;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.channel_name.trim().is_empty() {
            return Err(Error::Config("Channel name cannot be empty".to_string()));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        self.speech.validate()?;
        self.native.validate()
    }
}

/// Parameters applied to every speech utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechSettings {
    /// Speaking rate, 0.1 to 10 (1.0 is normal speed).
    pub rate: f32,
    /// Pitch, 0 to 2.
    pub pitch: f32,
    /// Volume, 0 to 1.
    pub volume: f32,
    /// Accent used when a request carries no hint.
    pub default_accent: Accent,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            // Slightly slower than normal for language learners.
            rate: 0.9,
            pitch: 1.0,
            volume: 1.0,
            default_accent: Accent::American,
        }
    }
}

impl SpeechSettings {
    /// Validates ranges accepted by `SpeechSynthesisUtterance`.
    pub fn validate(&self) -> Result<()> {
        if !(0.1..=10.0).contains(&self.rate) {
            return Err(Error::Config(format!(
                "Speech rate {} is outside 0.1..=10",
                self.rate
            )));
        }
        if !(0.0..=2.0).contains(&self.pitch) {
            return Err(Error::Config(format!(
                "Speech pitch {} is outside 0..=2",
                self.pitch
            )));
        }
        if !(0.0..=1.0).contains(&self.volume) {
            return Err(Error::Config(format!(
                "Speech volume {} is outside 0..=1",
                self.volume
            )));
        }
        Ok(())
    }
}

/// Native audio worker settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NativeSettings {
    /// How often the worker checks whether the current source has drained.
    pub poll_interval_ms: u64,
    /// OS thread name of the audio worker.
    pub thread_name: String,
}

impl Default for NativeSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 50,
            thread_name: "audio-bridge-worker".to_string(),
        }
    }
}

impl NativeSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(Error::Config(
                "Native poll interval must be greater than 0ms".to_string(),
            ));
        }
        if self.poll_interval_ms > 1000 {
            return Err(Error::Config(
                "Native poll interval exceeds maximum of 1000ms".to_string(),
            ));
        }
        if self.thread_name.trim().is_empty() {
            return Err(Error::Config(
                "Native worker thread name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}
