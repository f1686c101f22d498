//! Thread-safety bounds that differ per target.
//!
//! Native engines are shared between the player actor and host threads, so
//! they must be `Send + Sync`. Browser engines hold `web_sys` handles and JS
//! closures, which are neither; on `wasm32` everything runs on one thread and
//! the bounds collapse to nothing.

/// `Send + Sync` on native targets, no bound on `wasm32`.
#[cfg(not(target_arch = "wasm32"))]
pub trait PlatformSendSync: Send + Sync {}

#[cfg(not(target_arch = "wasm32"))]
impl<T> PlatformSendSync for T where T: Send + Sync {}

#[cfg(target_arch = "wasm32")]
pub trait PlatformSendSync {}

#[cfg(target_arch = "wasm32")]
impl<T> PlatformSendSync for T {}
