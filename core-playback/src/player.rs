//! # Player State Machine
//!
//! One actor task owns the playback slot. Host commands (through a
//! [`PlayerHandle`]) and engine signals (through the [`SignalSender`] handed
//! to the engine on acquire) arrive as messages and are applied one at a
//! time, so a `stop` racing an engine callback is serialized and exactly one
//! terminal transition wins.
//!
//! ```text
//!   play ──> Preparing ──Ready──> Playing ──Finished──> Completed ─┐
//!               │                    │                             │
//!               ├────────Error───────┴──────────────> Errored ─────┼─> release ─> Idle
//!               └────────stop / replace──────────────> Stopped ────┘
//! ```
//!
//! Every session gets a fresh [`SessionToken`]. Signals tagged with anything
//! but the current token are dropped, which keeps late callbacks from a
//! stopped player out of the next session.

use crate::emitter::EventEmitter;
use crate::error::{PlaybackError, Result};
use crate::session::{PlayReply, PlaybackSession, SessionState};
use bridge_traits::{
    EngineFault, EngineSignal, PlaybackEngine, PlaybackRequest, SessionToken, SignalEnvelope,
    SignalSender,
};
use core_async::sync::{mpsc, oneshot, unbounded};
use core_runtime::logging::redact_source;
use futures::StreamExt;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Point-in-time view of the player, for host diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerSnapshot {
    pub state: SessionState,
    pub session: Option<SessionToken>,
    /// Redacted form of the current source.
    pub source: Option<String>,
    pub pending_reply: bool,
}

impl PlayerSnapshot {
    fn idle() -> Self {
        Self {
            state: SessionState::Idle,
            session: None,
            source: None,
            pending_reply: false,
        }
    }
}

enum Command {
    Play {
        request: PlaybackRequest,
        reply: PlayReply,
    },
    Stop {
        reply: oneshot::Sender<()>,
    },
    Snapshot {
        reply: oneshot::Sender<PlayerSnapshot>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Outcome of a `play` that has been accepted but not yet answered.
///
/// Resolves once the engine is ready (`Ok(true)`), fails, or the session is
/// stopped or replaced first (`Err(Cancelled)`).
#[derive(Debug)]
pub struct PendingPlay {
    rx: oneshot::Receiver<Result<bool>>,
}

impl PendingPlay {
    pub async fn outcome(self) -> Result<bool> {
        self.rx.await.map_err(|_| PlaybackError::PlayerClosed)?
    }
}

/// Cloneable front door to a player actor.
///
/// When the last handle is dropped the actor releases whatever it still
/// holds and exits.
#[derive(Debug, Clone)]
pub struct PlayerHandle {
    commands: mpsc::UnboundedSender<Command>,
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Command::Play { .. } => "Play",
            Command::Stop { .. } => "Stop",
            Command::Snapshot { .. } => "Snapshot",
            Command::Shutdown { .. } => "Shutdown",
        };
        f.write_str(name)
    }
}

impl PlayerHandle {
    /// Queue a `play` and return without waiting for the engine.
    ///
    /// An empty source fails here with `InvalidArgument`; the player and the
    /// engine never see it.
    pub fn start(&self, request: PlaybackRequest) -> Result<PendingPlay> {
        if !request.has_source() {
            return Err(PlaybackError::InvalidArgument(
                "Source is required".to_string(),
            ));
        }

        let (reply, rx) = oneshot::channel();
        self.send(Command::Play { request, reply })?;
        Ok(PendingPlay { rx })
    }

    /// Start playback and wait until it has actually begun.
    pub async fn play(&self, request: PlaybackRequest) -> Result<bool> {
        self.start(request)?.outcome().await
    }

    /// Stop whatever is playing. Succeeds when nothing is, including after
    /// the player has shut down.
    pub async fn stop(&self) -> Result<bool> {
        let (reply, rx) = oneshot::channel();
        let delivered = match self.send(Command::Stop { reply }) {
            Ok(()) => rx.await.is_ok(),
            Err(_) => false,
        };
        if !delivered {
            debug!("Stop after the player shut down");
        }
        Ok(true)
    }

    pub async fn snapshot(&self) -> Result<PlayerSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Snapshot { reply })?;
        rx.await.map_err(|_| PlaybackError::PlayerClosed)
    }

    /// Release any session without emitting events and end the actor.
    pub async fn shutdown(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Shutdown { reply })?;
        rx.await.map_err(|_| PlaybackError::PlayerClosed)
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    fn send(&self, command: Command) -> Result<()> {
        self.commands
            .unbounded_send(command)
            .map_err(|_| PlaybackError::PlayerClosed)
    }
}

/// Spawn a player actor driving `engine` and return its handle.
///
/// On native targets this must be called from within a Tokio runtime.
pub fn spawn_player(engine: Arc<dyn PlaybackEngine>, emitter: EventEmitter) -> PlayerHandle {
    let (commands_tx, commands_rx) = unbounded();
    let (signals_tx, signals_rx) = unbounded();

    info!(engine = engine.name(), "Starting audio player");
    let actor = PlayerActor {
        engine,
        emitter,
        session: None,
        last_token: SessionToken::new(0),
        signals: signals_tx,
    };
    core_async::spawn_detached(actor.run(commands_rx, signals_rx));

    PlayerHandle {
        commands: commands_tx,
    }
}

struct PlayerActor {
    engine: Arc<dyn PlaybackEngine>,
    emitter: EventEmitter,
    session: Option<PlaybackSession>,
    last_token: SessionToken,
    signals: mpsc::UnboundedSender<SignalEnvelope>,
}

impl PlayerActor {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut signals: mpsc::UnboundedReceiver<SignalEnvelope>,
    ) {
        loop {
            // Signals first: anything an engine reported before a command
            // was sent is applied before that command.
            futures::select_biased! {
                envelope = signals.next() => {
                    if let Some(envelope) = envelope {
                        self.on_signal(envelope).await;
                    }
                }
                command = commands.next() => match command {
                    Some(Command::Play { request, reply }) => self.start(request, reply).await,
                    Some(Command::Stop { reply }) => {
                        self.stop().await;
                        let _ = reply.send(());
                    }
                    Some(Command::Snapshot { reply }) => {
                        let _ = reply.send(self.snapshot());
                    }
                    Some(Command::Shutdown { reply }) => {
                        self.teardown("shutdown").await;
                        let _ = reply.send(());
                        break;
                    }
                    None => {
                        self.teardown("all handles dropped").await;
                        break;
                    }
                },
            }
        }
        info!("Audio player stopped");
    }

    fn snapshot(&self) -> PlayerSnapshot {
        match &self.session {
            Some(session) => PlayerSnapshot {
                state: session.state(),
                session: Some(session.token()),
                source: Some(redact_source(session.request())),
                pending_reply: session.has_pending_reply(),
            },
            None => PlayerSnapshot::idle(),
        }
    }

    #[instrument(skip_all, fields(kind = ?request.kind()))]
    async fn start(&mut self, request: PlaybackRequest, reply: PlayReply) {
        // A play over a live session is a restart, even for the same source.
        self.teardown("replaced").await;

        let token = self.last_token.next();
        self.last_token = token;
        info!(session = %token, source = %redact_source(&request), "Acquiring source");

        self.session = Some(PlaybackSession::new(token, request.clone(), Some(reply)));
        let signals = SignalSender::new(token, self.signals.clone());

        if let Err(err) = self.engine.acquire(request, signals).await {
            warn!(session = %token, error = %err, "Engine refused source");
            let fault = EngineFault::from(&err);
            self.fail(PlaybackError::AcquisitionFailed(fault.clone()), fault)
                .await;
        }
    }

    async fn stop(&mut self) {
        if self.session.is_none() {
            debug!("Stop with no active session");
            return;
        }
        self.teardown("stopped").await;
    }

    async fn on_signal(&mut self, envelope: SignalEnvelope) {
        let current = self.session.as_ref().map(PlaybackSession::token);
        if current != Some(envelope.token) {
            debug!(
                session = %envelope.token,
                signal = ?envelope.signal,
                "Discarding signal from stale session"
            );
            return;
        }

        match envelope.signal {
            EngineSignal::Ready => self.on_ready().await,
            EngineSignal::Finished => self.on_finished().await,
            EngineSignal::Error(fault) => {
                warn!(session = %envelope.token, %fault, "Engine reported an error");
                self.fail(PlaybackError::EngineFailure(fault.clone()), fault)
                    .await;
            }
        }
    }

    async fn on_ready(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let token = session.token();
        if !session.mark_playing() {
            debug!(session = %token, state = ?session.state(), "Ignoring repeated ready");
            return;
        }

        match self.engine.play(token).await {
            Ok(()) => {
                info!(session = %token, "Playback started");
                if let Some(session) = self.session.as_mut() {
                    session.resolve(Ok(true));
                }
            }
            Err(err) => {
                warn!(session = %token, error = %err, "Engine failed to start playback");
                let fault = EngineFault::from(&err);
                self.fail(PlaybackError::AcquisitionFailed(fault.clone()), fault)
                    .await;
            }
        }
    }

    async fn on_finished(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        let token = session.token();

        // Sources shorter than the engine's prepare step can finish before
        // ready was observed; the play still started.
        if session.state() == SessionState::Preparing {
            session.resolve(Ok(true));
        }

        if session.finish(SessionState::Completed) {
            info!(session = %token, "Playback completed");
            self.emitter.completion(token);
        }
        self.release(&mut session).await;
    }

    /// Errored transition: one `onError`, one failed reply, one release.
    async fn fail(&mut self, reply: PlaybackError, fault: EngineFault) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        let token = session.token();

        if session.finish(SessionState::Errored) {
            self.emitter.error(token, &fault);
            session.resolve(Err(reply));
        }
        self.release(&mut session).await;
    }

    /// Stopped transition. Emits nothing; a waiting `play` gets `Cancelled`.
    async fn teardown(&mut self, reason: &'static str) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        let token = session.token();

        if session.finish(SessionState::Stopped) {
            info!(session = %token, reason, "Stopping playback");
            session.cancel_pending();
            if let Err(err) = self.engine.stop(token).await {
                warn!(session = %token, error = %err, "Engine stop failed");
            }
        }
        self.release(&mut session).await;
    }

    async fn release(&mut self, session: &mut PlaybackSession) {
        if !session.mark_released() {
            return;
        }
        let token = session.token();
        match self.engine.release(token).await {
            Ok(()) => debug!(session = %token, "Released engine resources"),
            Err(err) => warn!(session = %token, error = %err, "Engine release failed"),
        }
    }
}
