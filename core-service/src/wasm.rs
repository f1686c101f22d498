//! WebAssembly bindings for the audio bridge
//!
//! Exposes an `AudioBridge` class to JavaScript. Listener registration
//! replaces the old `window.flutterAudioCompletion` /
//! `window.flutterAudioError` globals.
//!
//! ```js
//! const bridge = new AudioBridge({ speech: { rate: 0.9 } });
//! bridge.onCompletion(() => console.log("done"));
//! bridge.onError(({ what, message }) => console.warn(what, message));
//! await bridge.play({ text: "colour", accent: "british" });
//! ```

use crate::AudioBridgeService;
use core_playback::{MethodCall, MethodResponse};
use core_runtime::config::BridgeConfig;
use core_runtime::events::{BridgeEvent, EventEnvelope, RecvError};
use serde::Serialize;
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::warn;
use wasm_bindgen::prelude::*;

/// Enable Rust logging to browser console
/// Call this once at startup to see tracing logs in DevTools
#[wasm_bindgen(js_name = enableConsoleLogging)]
pub fn enable_console_logging() {
    use bridge_traits::logging::LogLevel;
    use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};

    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Debug);

    let _ = init_logging(config);
}

#[derive(Default)]
struct Listeners {
    completion: RefCell<Option<js_sys::Function>>,
    error: RefCell<Option<js_sys::Function>>,
}

impl Listeners {
    fn dispatch(&self, envelope: &EventEnvelope) {
        let call = MethodCall::from(envelope);
        let result = match &envelope.event {
            BridgeEvent::Completion => match self.completion.borrow().as_ref() {
                Some(listener) => listener.call0(&JsValue::NULL),
                None => return,
            },
            BridgeEvent::Error { .. } => match self.error.borrow().as_ref() {
                Some(listener) => to_js(&call.arguments)
                    .and_then(|payload| listener.call1(&JsValue::NULL, &payload)),
                None => return,
            },
        };

        if let Err(err) = result {
            warn!(event = %call.method, error = ?err, "Listener threw");
        }
    }
}

/// Audio bridge handle for JavaScript hosts.
#[wasm_bindgen(js_name = AudioBridge)]
pub struct JsAudioBridge {
    service: AudioBridgeService,
    listeners: Rc<Listeners>,
}

#[wasm_bindgen(js_class = AudioBridge)]
impl JsAudioBridge {
    /// Create a bridge. `config` is an optional `BridgeConfig` object; missing
    /// fields take their defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> std::result::Result<JsAudioBridge, JsValue> {
        let config = if config.is_undefined() || config.is_null() {
            BridgeConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| JsValue::from_str(&format!("Invalid bridge config: {}", e)))?
        };

        let service = AudioBridgeService::builder()
            .config(config)
            .build()
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        let listeners = Rc::new(Listeners::default());
        let mut events = service.subscribe();
        let pump_listeners = Rc::clone(&listeners);
        core_async::task::spawn_detached(async move {
            loop {
                match events.recv().await {
                    Ok(envelope) => pump_listeners.dispatch(&envelope),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Event listener fell behind");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        Ok(Self { service, listeners })
    }

    /// Start playback. Resolves with `true` once audio is playing and
    /// rejects with `{ status, code, message }` otherwise.
    pub async fn play(&self, args: JsValue) -> std::result::Result<JsValue, JsValue> {
        let arguments = from_js(args)?;
        let response = self.service.handler().handle_play(&arguments).await;
        settle(response)
    }

    /// Stop playback. Always resolves with `true`.
    pub async fn stop(&self) -> std::result::Result<JsValue, JsValue> {
        settle(self.service.handler().handle_stop().await)
    }

    /// Generic method-channel entry point. Resolves with the full response
    /// object, including `error` and `notImplemented` replies.
    pub async fn invoke(
        &self,
        method: String,
        args: JsValue,
    ) -> std::result::Result<JsValue, JsValue> {
        let call = MethodCall::new(method, from_js(args)?);
        to_js(&self.service.call(call).await)
    }

    /// Register the completion listener, or clear it with `null`.
    #[wasm_bindgen(js_name = onCompletion)]
    pub fn on_completion(&self, listener: Option<js_sys::Function>) {
        *self.listeners.completion.borrow_mut() = listener;
    }

    /// Register the error listener, or clear it with `null`. It receives
    /// `{ what, extra, message }`.
    #[wasm_bindgen(js_name = onError)]
    pub fn on_error(&self, listener: Option<js_sys::Function>) {
        *self.listeners.error.borrow_mut() = listener;
    }

    /// Current player state, for debugging.
    pub async fn state(&self) -> std::result::Result<JsValue, JsValue> {
        let snapshot = self
            .service
            .snapshot()
            .await
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        to_js(&snapshot)
    }

    /// Release any playback and stop the player.
    pub async fn shutdown(&self) -> std::result::Result<(), JsValue> {
        self.service
            .shutdown()
            .await
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }
}

fn from_js(args: JsValue) -> std::result::Result<Value, JsValue> {
    if args.is_undefined() || args.is_null() {
        return Ok(Value::Null);
    }
    serde_wasm_bindgen::from_value(args)
        .map_err(|e| JsValue::from_str(&format!("Invalid arguments: {}", e)))
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> std::result::Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

fn settle(response: MethodResponse) -> std::result::Result<JsValue, JsValue> {
    match response {
        MethodResponse::Success { result } => to_js(&result),
        other => Err(to_js(&other)?),
    }
}
