//! Core service façade and bootstrap helpers.
//!
//! This crate wires a platform [`PlaybackEngine`] into the player actor, the
//! `audio_player` method channel and the event bus. Desktop apps typically
//! enable the `desktop-shims` feature (which depends on `bridge-desktop` with
//! `rodio` output), whereas WebAssembly builds enable the `wasm` feature and
//! get the browser engines from `bridge-wasm` plus the `AudioBridge` JS class.
//!
//! ```ignore
//! use core_service::AudioBridgeService;
//! use core_playback::MethodCall;
//!
//! let service = AudioBridgeService::builder().build()?;
//! let mut events = service.subscribe();
//! let reply = service
//!     .call(MethodCall::new("play", serde_json::json!({ "path": "/tmp/word.mp3" })))
//!     .await;
//! ```

pub mod error;
#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
pub mod wasm;

pub use error::{CoreError, Result};

use std::sync::Arc;

use bridge_traits::{PlaybackEngine, PlaybackRequest};
use core_playback::{
    spawn_player, AudioChannelHandler, EventEmitter, MethodCall, MethodResponse, PlaybackError,
    PlayerHandle, PlayerSnapshot,
};
use core_runtime::config::BridgeConfig;
use core_runtime::events::{EventBus, EventStream};
use tracing::{debug, info};

/// Assembles an [`AudioBridgeService`].
#[derive(Default)]
pub struct AudioBridgeBuilder {
    config: BridgeConfig,
    engine: Option<Arc<dyn PlaybackEngine>>,
}

impl AudioBridgeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: BridgeConfig) -> Self {
        self.config = config;
        self
    }

    /// Use `engine` instead of the platform default.
    pub fn engine(mut self, engine: Arc<dyn PlaybackEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Validate the configuration, pick an engine and spawn the player.
    ///
    /// Fails with [`CoreError::CapabilityMissing`] when no engine was supplied
    /// and none is compiled in for this platform. On native targets this
    /// must run inside a Tokio runtime. Opening the default output device
    /// blocks the calling thread until the audio worker has started; on a
    /// multi-threaded runtime other tasks move to another worker meanwhile.
    pub fn build(self) -> Result<AudioBridgeService> {
        self.config.validate()?;

        if !core_async::task::can_spawn() {
            return Err(CoreError::InitializationFailed(
                "No async runtime available to run the player".to_string(),
            ));
        }

        let engine = match self.engine {
            Some(engine) => engine,
            None => default_engine(&self.config)?,
        };

        let emitter = EventEmitter::new(EventBus::new(self.config.event_buffer_size));
        let player = spawn_player(engine.clone(), emitter.clone());
        let handler =
            AudioChannelHandler::new(player).with_default_accent(self.config.speech.default_accent);

        info!(
            channel = %self.config.channel_name,
            engine = engine.name(),
            "Audio bridge ready"
        );

        Ok(AudioBridgeService {
            config: Arc::new(self.config),
            emitter,
            handler,
        })
    }
}

#[cfg(all(feature = "desktop-shims", not(target_arch = "wasm32")))]
fn default_engine(config: &BridgeConfig) -> Result<Arc<dyn PlaybackEngine>> {
    use bridge_desktop::{NativeEngineOptions, NativePlaybackEngine};

    let options = NativeEngineOptions {
        poll_interval: config.native.poll_interval(),
        thread_name: config.native.thread_name.clone(),
    };
    // Opening the output device blocks until the worker thread reports back.
    let engine =
        core_async::task::run_blocking(|| NativePlaybackEngine::with_default_output(options))
            .map_err(|err| CoreError::CapabilityMissing {
                capability: "PlaybackEngine".to_string(),
                message: err.to_string(),
            })?;
    Ok(Arc::new(engine))
}

#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
fn default_engine(config: &BridgeConfig) -> Result<Arc<dyn PlaybackEngine>> {
    use bridge_wasm::{SpeechOptions, WebPlaybackEngine};

    let speech = SpeechOptions {
        rate: config.speech.rate,
        pitch: config.speech.pitch,
        volume: config.speech.volume,
    };
    Ok(Arc::new(WebPlaybackEngine::new(speech)))
}

#[cfg(not(any(
    all(feature = "desktop-shims", not(target_arch = "wasm32")),
    all(feature = "wasm", target_arch = "wasm32")
)))]
fn default_engine(_config: &BridgeConfig) -> Result<Arc<dyn PlaybackEngine>> {
    Err(CoreError::CapabilityMissing {
        capability: "PlaybackEngine".to_string(),
        message: "No engine supplied and no platform engine compiled in. \
                  Enable `desktop-shims` or `wasm`, or call `AudioBridgeBuilder::engine`."
            .to_string(),
    })
}

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct AudioBridgeService {
    config: Arc<BridgeConfig>,
    emitter: EventEmitter,
    handler: AudioChannelHandler,
}

impl AudioBridgeService {
    pub fn builder() -> AudioBridgeBuilder {
        AudioBridgeBuilder::new()
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Name of the method channel this service answers on.
    pub fn channel_name(&self) -> &str {
        &self.config.channel_name
    }

    pub fn handler(&self) -> &AudioChannelHandler {
        &self.handler
    }

    pub fn player(&self) -> &PlayerHandle {
        self.handler.player()
    }

    /// Listen for `onCompletion` / `onError`. Events emitted before
    /// subscribing are not replayed.
    pub fn subscribe(&self) -> EventStream {
        self.emitter.subscribe()
    }

    /// Answer one method-channel call.
    pub async fn call(&self, call: MethodCall) -> MethodResponse {
        self.handler.handle(call).await
    }

    /// [`call`](Self::call) for hosts that speak JSON over IPC. A payload
    /// that is not a method call gets an `INVALID_ARGUMENT` reply.
    pub async fn call_json(&self, payload: &str) -> Result<String> {
        let response = match serde_json::from_str::<MethodCall>(payload) {
            Ok(call) => self.call(call).await,
            Err(err) => {
                debug!(error = %err, "Malformed method call");
                MethodResponse::error(
                    PlaybackError::INVALID_ARGUMENT,
                    format!("Malformed method call: {}", err),
                )
            }
        };
        Ok(serde_json::to_string(&response)?)
    }

    /// Typed `play`, bypassing argument parsing.
    pub async fn play(&self, request: PlaybackRequest) -> Result<bool> {
        Ok(self.player().play(request).await?)
    }

    pub async fn stop(&self) -> Result<bool> {
        Ok(self.player().stop().await?)
    }

    pub async fn snapshot(&self) -> Result<PlayerSnapshot> {
        Ok(self.player().snapshot().await?)
    }

    /// Release any session and stop the player. Later calls reply
    /// `PLAYER_UNAVAILABLE`, except `stop` which still succeeds.
    pub async fn shutdown(&self) -> Result<()> {
        Ok(self.player().shutdown().await?)
    }
}
