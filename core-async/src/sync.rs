//! Message-passing primitives.
//!
//! Both targets use the executor-independent channels from `futures::channel`
//! so that the same sender type can be handed to a Tokio task, a native audio
//! worker thread, or a JavaScript callback closure.
//!
//! ## Native
//! - Senders are `Send + Sync` and may be used from plain OS threads
//!   (`unbounded_send` never blocks and never needs a runtime)
//!
//! ## WASM
//! - Same API; everything runs on the single browser thread

pub use futures::channel::{mpsc, oneshot};

/// Unbounded multi-producer, single-consumer channel.
///
/// Unbounded delivery is what callback-driven producers need: a media callback
/// cannot await back-pressure, it can only enqueue and return.
pub fn unbounded<T>() -> (mpsc::UnboundedSender<T>, mpsc::UnboundedReceiver<T>) {
    mpsc::unbounded()
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn unbounded_send_from_os_thread() {
        let (tx, mut rx) = unbounded::<u32>();

        let worker = std::thread::spawn(move || {
            for i in 0..3 {
                tx.unbounded_send(i).unwrap();
            }
        });
        worker.join().unwrap();

        assert_eq!(rx.next().await, Some(0));
        assert_eq!(rx.next().await, Some(1));
        assert_eq!(rx.next().await, Some(2));
        assert_eq!(rx.next().await, None);
    }

    #[tokio::test]
    async fn oneshot_reports_dropped_sender() {
        let (tx, rx) = oneshot::channel::<()>();
        drop(tx);
        assert!(rx.await.is_err());
    }
}
