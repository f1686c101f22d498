//! Web Speech API (`speechSynthesis`) playback for text requests.
//!
//! Speaking starts as soon as the utterance is queued, so `acquire` already
//! speaks and `play` has nothing left to do. `start` maps to `Ready`, `end` to
//! `Finished` and `error` to `Error`.

use crate::error::WasmError;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::{Accent, EngineFault, PlaybackRequest, SessionToken, SignalSender};
use std::cell::RefCell;
use tracing::debug;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{
    Event, SpeechSynthesis, SpeechSynthesisErrorCode, SpeechSynthesisErrorEvent,
    SpeechSynthesisUtterance,
};

/// Voice parameters applied to every utterance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeechOptions {
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl Default for SpeechOptions {
    fn default() -> Self {
        Self {
            rate: 0.9,
            pitch: 1.0,
            volume: 1.0,
        }
    }
}

struct Utterance {
    token: SessionToken,
    utterance: SpeechSynthesisUtterance,
    _on_start: Closure<dyn FnMut(Event)>,
    _on_end: Closure<dyn FnMut(Event)>,
    _on_error: Closure<dyn FnMut(SpeechSynthesisErrorEvent)>,
}

impl Utterance {
    fn detach(&self) {
        self.utterance.set_onstart(None);
        self.utterance.set_onend(None);
        self.utterance.set_onerror(None);
    }
}

pub struct SpeechSynthesisEngine {
    options: SpeechOptions,
    current: RefCell<Option<Utterance>>,
}

impl SpeechSynthesisEngine {
    pub fn new(options: SpeechOptions) -> Self {
        Self {
            options,
            current: RefCell::new(None),
        }
    }

    pub fn options(&self) -> SpeechOptions {
        self.options
    }

    /// Whether this browser exposes `speechSynthesis` at all.
    pub fn is_available() -> bool {
        synthesis().is_ok()
    }

    pub fn acquire(&self, request: &PlaybackRequest, signals: SignalSender) -> BridgeResult<()> {
        let synth = synthesis()?;
        let token = signals.token();

        if let Some(previous) = self.current.borrow_mut().take() {
            previous.detach();
        }
        synth.cancel();

        let utterance =
            SpeechSynthesisUtterance::new_with_text(request.source()).map_err(WasmError::from)?;
        let accent = request.accent().unwrap_or(Accent::American);
        utterance.set_lang(accent.language_tag());
        utterance.set_rate(self.options.rate);
        utterance.set_pitch(self.options.pitch);
        utterance.set_volume(self.options.volume);

        let on_start = {
            let signals = signals.clone();
            Closure::wrap(Box::new(move |_: Event| {
                signals.ready();
            }) as Box<dyn FnMut(Event)>)
        };
        let on_end = {
            let signals = signals.clone();
            Closure::wrap(Box::new(move |_: Event| {
                signals.finished();
            }) as Box<dyn FnMut(Event)>)
        };
        let on_error = Closure::wrap(Box::new(move |event: SpeechSynthesisErrorEvent| {
            signals.error(speech_fault(event.error()));
        }) as Box<dyn FnMut(SpeechSynthesisErrorEvent)>);

        utterance.set_onstart(Some(on_start.as_ref().unchecked_ref()));
        utterance.set_onend(Some(on_end.as_ref().unchecked_ref()));
        utterance.set_onerror(Some(on_error.as_ref().unchecked_ref()));

        synth.speak(&utterance);
        debug!(session = %token, lang = accent.language_tag(), "Utterance queued");

        *self.current.borrow_mut() = Some(Utterance {
            token,
            utterance,
            _on_start: on_start,
            _on_end: on_end,
            _on_error: on_error,
        });
        Ok(())
    }

    pub fn stop(&self, token: SessionToken) {
        if self.holds(token) {
            if let Ok(synth) = synthesis() {
                synth.cancel();
            }
        }
    }

    pub fn release(&self, token: SessionToken) {
        if !self.holds(token) {
            return;
        }
        if let Some(current) = self.current.borrow_mut().take() {
            current.detach();
            if let Ok(synth) = synthesis() {
                synth.cancel();
            }
            debug!(session = %token, "Utterance released");
        }
    }

    fn holds(&self, token: SessionToken) -> bool {
        self.current.borrow().as_ref().map(|u| u.token) == Some(token)
    }
}

impl Default for SpeechSynthesisEngine {
    fn default() -> Self {
        Self::new(SpeechOptions::default())
    }
}

fn synthesis() -> Result<SpeechSynthesis, WasmError> {
    let window = web_sys::window()
        .ok_or_else(|| WasmError::Unsupported("No window object available".to_string()))?;
    window
        .speech_synthesis()
        .map_err(|_| WasmError::Unsupported("Web Speech API is not supported".to_string()))
}

pub(crate) fn speech_fault(code: SpeechSynthesisErrorCode) -> EngineFault {
    let message = format!("Speech synthesis error: {:?}", code);
    match code {
        SpeechSynthesisErrorCode::LanguageUnavailable
        | SpeechSynthesisErrorCode::VoiceUnavailable
        | SpeechSynthesisErrorCode::NotAllowed => EngineFault::unsupported(message),
        SpeechSynthesisErrorCode::AudioBusy
        | SpeechSynthesisErrorCode::AudioHardware
        | SpeechSynthesisErrorCode::Network
        | SpeechSynthesisErrorCode::SynthesisUnavailable => EngineFault::io(message),
        SpeechSynthesisErrorCode::TextTooLong | SpeechSynthesisErrorCode::InvalidArgument => {
            EngineFault::malformed(message)
        }
        _ => EngineFault::unknown(message),
    }
}
