//! Task spawning.
//!
//! - On native platforms: `tokio::spawn` on the current runtime
//! - On WASM: `wasm_bindgen_futures::spawn_local`
//!
//! Only detached spawning is exposed. Callers that need to observe completion
//! send themselves a message over a [`oneshot`](crate::sync::oneshot) channel,
//! which works the same way on both targets.

use std::future::Future;

#[cfg(not(target_arch = "wasm32"))]
/// Spawns a detached task on the ambient Tokio runtime.
///
/// # Panics
///
/// Panics when called outside a Tokio runtime, like `tokio::spawn`.
pub fn spawn_detached<F>(future: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    drop(tokio::spawn(future));
}

#[cfg(target_arch = "wasm32")]
/// Spawns a detached task on the browser event loop.
pub fn spawn_detached<F>(future: F)
where
    F: Future<Output = ()> + 'static,
{
    wasm_bindgen_futures::spawn_local(future);
}

/// Returns `true` when a task can be spawned from the current context.
///
/// Always `true` on WASM. On native targets this checks for an entered Tokio
/// runtime, which lets library code fall back to synchronous cleanup on drop
/// paths that may run after the runtime is gone.
pub fn can_spawn() -> bool {
    #[cfg(not(target_arch = "wasm32"))]
    {
        tokio::runtime::Handle::try_current().is_ok()
    }

    #[cfg(target_arch = "wasm32")]
    {
        true
    }
}

/// Runs a blocking call from synchronous code that may sit on a runtime
/// worker.
///
/// On a multi-threaded Tokio runtime the worker hands its other tasks off
/// first (`block_in_place`). A current-thread runtime cannot do that, so the
/// call runs inline and stalls that runtime until it returns.
#[cfg(not(target_arch = "wasm32"))]
pub fn run_blocking<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    use tokio::runtime::{Handle, RuntimeFlavor};

    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(f)
        }
        _ => f(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::oneshot;

    #[tokio::test]
    async fn spawned_task_runs_to_completion() {
        let (tx, rx) = oneshot::channel();
        spawn_detached(async move {
            tx.send("done").ok();
        });
        assert_eq!(rx.await.unwrap(), "done");
    }

    #[test]
    fn can_spawn_requires_runtime() {
        assert!(!can_spawn());
        let rt = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        rt.block_on(async {
            assert!(can_spawn());
        });
    }

    #[test]
    fn run_blocking_works_with_and_without_a_runtime() {
        assert_eq!(run_blocking(|| 1), 1);

        let rt = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        assert_eq!(rt.block_on(async { run_blocking(|| 2) }), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn run_blocking_keeps_other_tasks_running() {
        let (tx, rx) = std::sync::mpsc::channel();
        spawn_detached(async move {
            tx.send("ran").ok();
        });

        // Only returns once the spawned task ran on another worker.
        let got = run_blocking(|| rx.recv_timeout(std::time::Duration::from_secs(2)));
        assert_eq!(got, Ok("ran"));
    }
}
