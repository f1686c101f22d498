//! WebAssembly Bridge Implementations
//!
//! Browser implementation of the `PlaybackEngine` contract defined in
//! `bridge-traits`, built on `web-sys` and `wasm-bindgen`.
//!
//! # Platform Support
//!
//! This crate is designed exclusively for the `wasm32-unknown-unknown` target.
//! It will not compile for native targets.
//!
//! # Implementations
//!
//! - `WebPlaybackEngine`: routes speech requests to `SpeechSynthesisEngine`
//!   and everything else to `HtmlAudioEngine`
//! - `HtmlAudioEngine`: one `HTMLAudioElement` per session
//! - `SpeechSynthesisEngine`: Web Speech API with configurable voice settings
//!
//! # Examples
//!
//! ```ignore
//! use bridge_wasm::{SpeechOptions, WebPlaybackEngine};
//! use std::sync::Arc;
//!
//! let engine = Arc::new(WebPlaybackEngine::new(SpeechOptions {
//!     rate: 1.0,
//!     ..SpeechOptions::default()
//! }));
//! ```

#![cfg(target_arch = "wasm32")]

pub mod audio_element;
pub mod engine;
pub mod error;
pub mod speech;

// Re-export commonly used types
pub use audio_element::HtmlAudioEngine;
pub use engine::WebPlaybackEngine;
pub use error::{WasmError, WasmResult};
pub use speech::{SpeechOptions, SpeechSynthesisEngine};
