//! # Desktop Bridge Implementations
//!
//! Native [`PlaybackEngine`](bridge_traits::PlaybackEngine) for desktop
//! platforms (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - [`NativePlaybackEngine`] runs a dedicated audio worker thread that owns
//!   the output device. Acquisition resolves the source and decodes it on that
//!   thread, then reports `Ready` or `Error` back to the player.
//! - [`OutputDevice`] / [`OutputVoice`] abstract the actual audio output so
//!   the worker can be driven by fakes in tests.
//! - [`source::resolve`] turns file paths and `data:` URIs into something a
//!   device can open. Remote URLs and speech are not handled natively.
//!
//! ## Feature Flags
//!
//! - `rodio-output`: Enable the `rodio` output device and
//!   [`NativePlaybackEngine::with_default_output`]
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{NativeEngineOptions, NativePlaybackEngine};
//! use std::sync::Arc;
//!
//! let engine = Arc::new(NativePlaybackEngine::with_default_output(
//!     NativeEngineOptions::default(),
//! )?);
//! ```

mod engine;
mod output;
pub mod source;

pub use engine::{NativeEngineOptions, NativePlaybackEngine};
pub use output::{OutputDevice, OutputVoice};
pub use source::{resolve, ResolvedSource};

#[cfg(feature = "rodio-output")]
pub use output::{RodioOutput, RodioVoice};
