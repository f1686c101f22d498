//! The single playback slot and its lifecycle.

use crate::error::{PlaybackError, Result};
use bridge_traits::{PlaybackRequest, SessionToken};
use core_async::sync::oneshot;
use serde::{Deserialize, Serialize};

/// Where a session is in its lifecycle. `Idle` means no session exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Preparing,
    Playing,
    Completed,
    Errored,
    Stopped,
}

impl SessionState {
    /// Preparing or Playing.
    pub fn is_live(&self) -> bool {
        matches!(self, SessionState::Preparing | SessionState::Playing)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Completed | SessionState::Errored | SessionState::Stopped
        )
    }
}

/// Reply channel of the `play` call that created a session.
pub(crate) type PlayReply = oneshot::Sender<Result<bool>>;

/// The active playback resource.
///
/// A session enters exactly one terminal state; [`finish`](Self::finish)
/// refuses every transition after the first. Release is tracked separately
/// so that it runs once even when several paths try to clean up.
#[derive(Debug)]
pub struct PlaybackSession {
    token: SessionToken,
    request: PlaybackRequest,
    state: SessionState,
    pending: Option<PlayReply>,
    released: bool,
}

impl PlaybackSession {
    pub(crate) fn new(token: SessionToken, request: PlaybackRequest, reply: Option<PlayReply>) -> Self {
        Self {
            token,
            request,
            state: SessionState::Preparing,
            pending: reply,
            released: false,
        }
    }

    pub fn token(&self) -> SessionToken {
        self.token
    }

    pub fn request(&self) -> &PlaybackRequest {
        &self.request
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether the `play` call that started this session is still waiting.
    pub fn has_pending_reply(&self) -> bool {
        self.pending.is_some()
    }

    /// Preparing → Playing. Returns `false` from any other state.
    pub(crate) fn mark_playing(&mut self) -> bool {
        if self.state == SessionState::Preparing {
            self.state = SessionState::Playing;
            true
        } else {
            false
        }
    }

    /// Move to `terminal`. Only the first call from a live state succeeds.
    pub(crate) fn finish(&mut self, terminal: SessionState) -> bool {
        if self.state.is_live() && terminal.is_terminal() {
            self.state = terminal;
            true
        } else {
            false
        }
    }

    /// Answer the pending `play` call, if it is still waiting.
    pub(crate) fn resolve(&mut self, outcome: Result<bool>) {
        if let Some(reply) = self.pending.take() {
            // The caller may have given up waiting; nothing to do then.
            let _ = reply.send(outcome);
        }
    }

    /// Answer a still-waiting `play` with `Cancelled`.
    pub(crate) fn cancel_pending(&mut self) {
        if self.pending.is_some() {
            self.resolve(Err(PlaybackError::Cancelled));
        }
    }

    /// Returns `true` exactly once; the caller then releases the engine.
    pub(crate) fn mark_released(&mut self) -> bool {
        !std::mem::replace(&mut self.released, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> (PlaybackSession, oneshot::Receiver<Result<bool>>) {
        let (tx, rx) = oneshot::channel();
        let session = PlaybackSession::new(
            SessionToken::new(1),
            PlaybackRequest::audio("/tmp/a.mp3"),
            Some(tx),
        );
        (session, rx)
    }

    #[test]
    fn starts_preparing() {
        let (session, _rx) = session();
        assert_eq!(session.state(), SessionState::Preparing);
        assert!(session.has_pending_reply());
        assert_eq!(session.request().source(), "/tmp/a.mp3");
    }

    #[test]
    fn exactly_one_terminal_transition() {
        let (mut session, _rx) = session();
        assert!(session.mark_playing());
        assert!(!session.mark_playing());

        assert!(session.finish(SessionState::Completed));
        assert!(!session.finish(SessionState::Errored));
        assert!(!session.finish(SessionState::Stopped));
        assert_eq!(session.state(), SessionState::Completed);
    }

    #[test]
    fn release_is_idempotent() {
        let (mut session, _rx) = session();
        assert!(session.mark_released());
        assert!(!session.mark_released());
    }

    #[tokio::test]
    async fn pending_reply_resolves_once() {
        let (mut session, rx) = session();
        session.resolve(Ok(true));
        session.cancel_pending();
        assert!(!session.has_pending_reply());
        assert!(rx.await.unwrap().unwrap());
    }

    #[tokio::test]
    async fn cancel_answers_with_cancelled() {
        let (mut session, rx) = session();
        session.cancel_pending();
        assert!(rx.await.unwrap().unwrap_err().is_cancelled());
    }

    #[test]
    fn state_predicates() {
        assert!(SessionState::Preparing.is_live());
        assert!(!SessionState::Idle.is_live());
        assert!(SessionState::Stopped.is_terminal());
        assert!(!SessionState::Playing.is_terminal());
    }
}
