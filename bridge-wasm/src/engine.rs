//! Browser [`PlaybackEngine`] routing requests by source kind.

use crate::audio_element::HtmlAudioEngine;
use crate::speech::{SpeechOptions, SpeechSynthesisEngine};
use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::{PlaybackEngine, PlaybackRequest, SessionToken, SignalSender, SourceKind};
use std::cell::Cell;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Audio,
    Speech,
}

/// Text goes to `speechSynthesis`; every other source to an
/// `HTMLAudioElement`.
pub struct WebPlaybackEngine {
    audio: HtmlAudioEngine,
    speech: SpeechSynthesisEngine,
    active: Cell<Option<(SessionToken, Route)>>,
}

impl WebPlaybackEngine {
    pub fn new(speech: SpeechOptions) -> Self {
        Self {
            audio: HtmlAudioEngine::new(),
            speech: SpeechSynthesisEngine::new(speech),
            active: Cell::new(None),
        }
    }

    fn route_of(&self, token: SessionToken) -> Option<Route> {
        match self.active.get() {
            Some((active, route)) if active == token => Some(route),
            _ => None,
        }
    }
}

impl Default for WebPlaybackEngine {
    fn default() -> Self {
        Self::new(SpeechOptions::default())
    }
}

#[async_trait(?Send)]
impl PlaybackEngine for WebPlaybackEngine {
    fn name(&self) -> &'static str {
        "web"
    }

    async fn acquire(&self, request: PlaybackRequest, signals: SignalSender) -> BridgeResult<()> {
        let token = signals.token();
        let route = match request.kind() {
            SourceKind::Speech => Route::Speech,
            _ => Route::Audio,
        };

        match route {
            Route::Speech => self.speech.acquire(&request, signals)?,
            Route::Audio => self.audio.acquire(&request, signals)?,
        }
        self.active.set(Some((token, route)));
        Ok(())
    }

    async fn play(&self, token: SessionToken) -> BridgeResult<()> {
        match self.route_of(token) {
            Some(Route::Audio) => self.audio.play(token).await,
            // Already speaking since acquire.
            Some(Route::Speech) | None => Ok(()),
        }
    }

    async fn stop(&self, token: SessionToken) -> BridgeResult<()> {
        match self.route_of(token) {
            Some(Route::Audio) => self.audio.stop(token),
            Some(Route::Speech) => self.speech.stop(token),
            None => {}
        }
        Ok(())
    }

    async fn release(&self, token: SessionToken) -> BridgeResult<()> {
        match self.route_of(token) {
            Some(Route::Audio) => self.audio.release(token),
            Some(Route::Speech) => self.speech.release(token),
            None => return Ok(()),
        }
        self.active.set(None);
        Ok(())
    }
}
