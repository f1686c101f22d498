//! Native playback engine: a dedicated audio worker thread owning the
//! output device.
//!
//! The player actor never blocks on audio work. `acquire` only enqueues a
//! command; the worker resolves and decodes the source, then reports `Ready`
//! or `Error` through the session's [`SignalSender`]. While a voice is
//! playing the worker wakes every poll interval to check whether it has
//! drained and reports `Finished` once.

use crate::output::{OutputDevice, OutputVoice};
use crate::source;
use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result};
use bridge_traits::{EngineFault, PlaybackEngine, PlaybackRequest, SessionToken, SignalSender};
use core_async::sync::oneshot;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Mutex;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Worker thread settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeEngineOptions {
    pub poll_interval: Duration,
    pub thread_name: String,
}

impl Default for NativeEngineOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(50),
            thread_name: "audio-bridge-worker".to_string(),
        }
    }
}

enum WorkerCommand {
    Acquire {
        request: PlaybackRequest,
        signals: SignalSender,
    },
    Play {
        token: SessionToken,
        reply: oneshot::Sender<()>,
    },
    Stop {
        token: SessionToken,
    },
    Release {
        token: SessionToken,
    },
    Shutdown,
}

/// [`PlaybackEngine`] backed by a native output device.
pub struct NativePlaybackEngine {
    commands: mpsc::Sender<WorkerCommand>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl NativePlaybackEngine {
    /// Spawn the worker and open the device on it.
    ///
    /// `open_device` runs on the worker thread, since platform output
    /// streams are usually not `Send`. Blocks until the device is open.
    pub fn spawn<D, F>(options: NativeEngineOptions, open_device: F) -> Result<Self>
    where
        D: OutputDevice + 'static,
        F: FnOnce() -> std::result::Result<D, EngineFault> + Send + 'static,
    {
        let (commands_tx, commands_rx) = mpsc::channel();
        let (init_tx, init_rx) = mpsc::channel::<std::result::Result<(), EngineFault>>();
        let poll_interval = options.poll_interval;

        let worker = thread::Builder::new()
            .name(options.thread_name.clone())
            .spawn(move || {
                let device = match open_device() {
                    Ok(device) => {
                        let _ = init_tx.send(Ok(()));
                        device
                    }
                    Err(fault) => {
                        let _ = init_tx.send(Err(fault));
                        return;
                    }
                };
                Worker::new(device, poll_interval).run(commands_rx);
            })?;

        match init_rx.recv() {
            Ok(Ok(())) => {
                info!(thread = %options.thread_name, "Audio worker started");
                Ok(Self {
                    commands: commands_tx,
                    worker: Mutex::new(Some(worker)),
                })
            }
            Ok(Err(fault)) => {
                let _ = worker.join();
                Err(BridgeError::NotAvailable(fault.message))
            }
            Err(_) => {
                let _ = worker.join();
                Err(BridgeError::EngineClosed(
                    "Audio worker exited during initialization".to_string(),
                ))
            }
        }
    }

    /// Engine on the system's default output device.
    #[cfg(feature = "rodio-output")]
    pub fn with_default_output(options: NativeEngineOptions) -> Result<Self> {
        Self::spawn(options, crate::output::RodioOutput::open_default)
    }

    fn send(&self, command: WorkerCommand) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| BridgeError::EngineClosed("Audio worker is not running".to_string()))
    }

    /// Stop the worker and wait for it to exit. Called on drop.
    pub fn shutdown(&self) {
        let _ = self.commands.send(WorkerCommand::Shutdown);
        let handle = match self.worker.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = handle {
            if handle.join().is_err() {
                warn!("Audio worker panicked");
            }
        }
    }
}

impl Drop for NativePlaybackEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[async_trait]
impl PlaybackEngine for NativePlaybackEngine {
    fn name(&self) -> &'static str {
        "native"
    }

    async fn acquire(&self, request: PlaybackRequest, signals: SignalSender) -> Result<()> {
        if !source::is_supported(request.kind()) {
            return Err(BridgeError::NotAvailable(format!(
                "{:?} sources are not supported by the native engine",
                request.kind()
            )));
        }
        self.send(WorkerCommand::Acquire { request, signals })
    }

    async fn play(&self, token: SessionToken) -> Result<()> {
        let (reply, done) = oneshot::channel();
        self.send(WorkerCommand::Play { token, reply })?;
        done.await
            .map_err(|_| BridgeError::EngineClosed("Audio worker stopped".to_string()))
    }

    async fn stop(&self, token: SessionToken) -> Result<()> {
        self.send(WorkerCommand::Stop { token })
    }

    async fn release(&self, token: SessionToken) -> Result<()> {
        self.send(WorkerCommand::Release { token })
    }
}

struct Active<V> {
    token: SessionToken,
    voice: V,
    signals: SignalSender,
    playing: bool,
}

struct Worker<D: OutputDevice> {
    device: D,
    poll_interval: Duration,
    current: Option<Active<D::Voice>>,
}

impl<D: OutputDevice> Worker<D> {
    fn new(device: D, poll_interval: Duration) -> Self {
        Self {
            device,
            poll_interval,
            current: None,
        }
    }

    fn run(mut self, commands: mpsc::Receiver<WorkerCommand>) {
        loop {
            match commands.recv_timeout(self.poll_interval) {
                Ok(WorkerCommand::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                Ok(command) => self.handle(command),
                Err(RecvTimeoutError::Timeout) => {}
            }
            self.check_finished();
        }

        if let Some(mut active) = self.current.take() {
            active.voice.stop();
        }
        debug!("Audio worker exiting");
    }

    fn handle(&mut self, command: WorkerCommand) {
        match command {
            WorkerCommand::Acquire { request, signals } => self.acquire(request, signals),
            WorkerCommand::Play { token, reply } => {
                match self.current.as_mut() {
                    Some(active) if active.token == token => {
                        active.voice.start();
                        active.playing = true;
                    }
                    _ => debug!(session = %token, "Play for a session the worker does not hold"),
                }
                let _ = reply.send(());
            }
            WorkerCommand::Stop { token } => {
                if let Some(active) = self.current.as_mut().filter(|a| a.token == token) {
                    active.voice.stop();
                    active.playing = false;
                }
            }
            WorkerCommand::Release { token } => {
                if self.current.as_ref().map(|a| a.token) == Some(token) {
                    if let Some(mut active) = self.current.take() {
                        active.voice.stop();
                    }
                }
            }
            WorkerCommand::Shutdown => {}
        }
    }

    fn acquire(&mut self, request: PlaybackRequest, signals: SignalSender) {
        let token = signals.token();

        // The player releases before acquiring; anything left over is stale.
        if let Some(mut previous) = self.current.take() {
            debug!(session = %previous.token, "Dropping leftover voice");
            previous.voice.stop();
        }

        match source::resolve(&request).and_then(|resolved| self.device.open(resolved)) {
            Ok(voice) => {
                self.current = Some(Active {
                    token,
                    voice,
                    signals: signals.clone(),
                    playing: false,
                });
                signals.ready();
            }
            Err(fault) => {
                debug!(session = %token, %fault, "Source could not be opened");
                signals.error(fault);
            }
        }
    }

    fn check_finished(&mut self) {
        if let Some(active) = self.current.as_mut() {
            if active.playing && active.voice.is_finished() {
                active.playing = false;
                active.signals.finished();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ResolvedSource;
    use bridge_traits::{EngineSignal, SignalEnvelope};
    use core_async::sync::{mpsc as async_mpsc, unbounded};
    use futures::StreamExt;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct Probe {
        log: Arc<Mutex<Vec<String>>>,
        drained: Arc<AtomicBool>,
    }

    impl Probe {
        fn log(&self) -> Vec<String> {
            self.log.lock().unwrap().clone()
        }
    }

    struct FakeDevice {
        probe: Probe,
    }

    struct FakeVoice {
        probe: Probe,
        started: bool,
    }

    impl OutputDevice for FakeDevice {
        type Voice = FakeVoice;

        fn open(&mut self, source: ResolvedSource) -> std::result::Result<FakeVoice, EngineFault> {
            self.probe.log.lock().unwrap().push(format!("open {:?}", source));
            Ok(FakeVoice {
                probe: self.probe.clone(),
                started: false,
            })
        }
    }

    impl OutputVoice for FakeVoice {
        fn start(&mut self) {
            self.started = true;
            self.probe.log.lock().unwrap().push("start".into());
        }

        fn stop(&mut self) {
            self.probe.log.lock().unwrap().push("stop".into());
        }

        fn is_finished(&self) -> bool {
            self.started && self.probe.drained.load(Ordering::SeqCst)
        }
    }

    fn engine() -> (NativePlaybackEngine, Probe) {
        let probe = Probe::default();
        let device_probe = probe.clone();
        let options = NativeEngineOptions {
            poll_interval: Duration::from_millis(5),
            thread_name: "test-audio-worker".into(),
        };
        let engine =
            NativePlaybackEngine::spawn(options, move || Ok(FakeDevice { probe: device_probe }))
                .unwrap();
        (engine, probe)
    }

    async fn next_signal(rx: &mut async_mpsc::UnboundedReceiver<SignalEnvelope>) -> SignalEnvelope {
        tokio::time::timeout(Duration::from_secs(2), rx.next())
            .await
            .expect("worker sent no signal")
            .expect("signal channel closed")
    }

    const WAV: &str = "data:audio/wav;base64,UklGRg==";

    #[tokio::test]
    async fn ready_play_and_finish() {
        let (engine, probe) = engine();
        let (tx, mut rx) = unbounded();
        let token = SessionToken::new(1);

        engine
            .acquire(PlaybackRequest::audio(WAV), SignalSender::new(token, tx))
            .await
            .unwrap();
        let ready = next_signal(&mut rx).await;
        assert_eq!(ready.token, token);
        assert_eq!(ready.signal, EngineSignal::Ready);

        engine.play(token).await.unwrap();
        probe.drained.store(true, Ordering::SeqCst);
        assert_eq!(next_signal(&mut rx).await.signal, EngineSignal::Finished);

        engine.release(token).await.unwrap();
        drop(engine);
        assert_eq!(
            probe.log(),
            vec![
                format!("open {:?}", ResolvedSource::Bytes(b"RIFF".to_vec())),
                "start".to_string(),
                "stop".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn unreadable_sources_report_errors() {
        let (engine, _probe) = engine();
        let (tx, mut rx) = unbounded();

        engine
            .acquire(
                PlaybackRequest::audio("/no/such/file.mp3"),
                SignalSender::new(SessionToken::new(1), tx.clone()),
            )
            .await
            .unwrap();
        match next_signal(&mut rx).await.signal {
            EngineSignal::Error(fault) => assert_eq!(fault.code, EngineFault::IO),
            other => panic!("expected error, got {:?}", other),
        }

        engine
            .acquire(
                PlaybackRequest::audio("data:audio/mpeg;base64,%%%"),
                SignalSender::new(SessionToken::new(2), tx),
            )
            .await
            .unwrap();
        match next_signal(&mut rx).await.signal {
            EngineSignal::Error(fault) => assert_eq!(fault.code, EngineFault::MALFORMED),
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn unsupported_kinds_fail_synchronously() {
        let (engine, _probe) = engine();
        let (tx, _rx) = unbounded();

        let err = engine
            .acquire(
                PlaybackRequest::audio("https://example.com/a.mp3"),
                SignalSender::new(SessionToken::new(1), tx),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::NotAvailable(_)));
    }

    #[tokio::test]
    async fn stopped_voice_never_finishes() {
        let (engine, probe) = engine();
        let (tx, mut rx) = unbounded();
        let token = SessionToken::new(3);

        engine
            .acquire(PlaybackRequest::audio(WAV), SignalSender::new(token, tx))
            .await
            .unwrap();
        next_signal(&mut rx).await;
        engine.play(token).await.unwrap();
        engine.stop(token).await.unwrap();
        probe.drained.store(true, Ordering::SeqCst);

        // Round-trip through the worker, then a few polls.
        engine.play(SessionToken::new(99)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(rx.try_next().is_err(), "no signal expected");
    }

    #[test]
    fn device_failure_surfaces_from_spawn() {
        let result = NativePlaybackEngine::spawn(NativeEngineOptions::default(), || {
            Err::<FakeDevice, _>(EngineFault::unknown("no output device"))
        });
        assert!(matches!(result, Err(BridgeError::NotAvailable(msg)) if msg == "no output device"));
    }

    #[tokio::test]
    async fn commands_fail_after_shutdown() {
        let (engine, _probe) = engine();
        engine.shutdown();
        assert!(matches!(
            engine.play(SessionToken::new(1)).await,
            Err(BridgeError::EngineClosed(_))
        ));
    }
}
