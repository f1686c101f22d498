//! Workspace placeholder crate.
//!
//! Re-exports the service facade so host applications can depend on
//! `audio-bridge-workspace` and pick a platform through features
//! (`desktop-shims` for the native engine, `wasm` for the browser engines)
//! without wiring each crate individually.

#[cfg(feature = "service")]
pub use core_playback::{MethodCall, MethodResponse, PlaybackError};
#[cfg(feature = "service")]
pub use core_service::{AudioBridgeBuilder, AudioBridgeService, CoreError};
