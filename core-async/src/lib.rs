//! Runtime-agnostic async layer for the audio bridge.
//!
//! Bridge crates spawn their background actors and pass messages through this
//! crate instead of depending on a specific executor:
//! - Native platforms (desktop): tasks run on the ambient Tokio runtime
//! - WebAssembly: tasks run on the browser event loop via `spawn_local`
//!
//! # Modules
//!
//! - `task`: detached task spawning
//! - `sync`: message channels that behave identically on every target
//!
//! # Examples
//!
//! ```rust
//! use core_async::sync::oneshot;
//! use core_async::task;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let (tx, rx) = oneshot::channel();
//! task::spawn_detached(async move {
//!     let _ = tx.send(42);
//! });
//! assert_eq!(rx.await.unwrap(), 42);
//! # }
//! ```

pub mod sync;
pub mod task;

pub use task::spawn_detached;
