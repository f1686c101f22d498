//! Error types for WebAssembly bridge implementations

use bridge_traits::error::BridgeError;
use thiserror::Error;
use wasm_bindgen::{JsCast, JsValue};

/// Result type for WebAssembly bridge operations
pub type WasmResult<T> = Result<T, WasmError>;

/// Errors that can occur in WebAssembly bridge implementations
#[derive(Error, Debug)]
pub enum WasmError {
    /// JavaScript error from web-sys
    #[error("JavaScript error: {0}")]
    JavaScript(String),

    /// The browser lacks an API the engine needs
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Playback was rejected by the browser (autoplay policy, bad source)
    #[error("Playback rejected: {0}")]
    Rejected(String),
}

impl From<WasmError> for BridgeError {
    fn from(err: WasmError) -> Self {
        match err {
            WasmError::Unsupported(msg) => BridgeError::NotAvailable(msg),
            other => BridgeError::OperationFailed(other.to_string()),
        }
    }
}

impl From<JsValue> for WasmError {
    fn from(js_value: JsValue) -> Self {
        WasmError::JavaScript(js_message(&js_value))
    }
}

/// Best-effort human readable text for a thrown JS value.
pub(crate) fn js_message(js_value: &JsValue) -> String {
    if let Some(msg) = js_value.as_string() {
        msg
    } else if let Some(error) = js_value.dyn_ref::<js_sys::Error>() {
        error.message().into()
    } else {
        format!("{:?}", js_value)
    }
}
