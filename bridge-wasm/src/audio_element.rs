//! `HTMLAudioElement` playback for file, URL and `data:` URI sources.
//!
//! One element is created per session. `canplaythrough` maps to `Ready`,
//! `ended` to `Finished` and `error` to `Error`. Event handlers are Rust
//! closures owned by the slot; they are detached from the element before
//! being dropped so a late browser event never calls into freed memory.

use crate::error::{js_message, WasmError};
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::{EngineFault, PlaybackRequest, SessionToken, SignalSender};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::{debug, warn};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Event, HtmlAudioElement, MediaError};

type Handler = Closure<dyn FnMut(Event)>;

struct AudioSlot {
    token: SessionToken,
    element: HtmlAudioElement,
    _handlers: [Handler; 3],
}

impl AudioSlot {
    fn detach(&self) {
        self.element.set_oncanplaythrough(None);
        self.element.set_onended(None);
        self.element.set_onerror(None);
    }
}

/// Plays audio through a fresh `HTMLAudioElement` per session.
#[derive(Default)]
pub struct HtmlAudioEngine {
    slot: RefCell<Option<AudioSlot>>,
}

impl HtmlAudioEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the element and start loading. `Ready` follows once the
    /// browser can play the source through.
    pub fn acquire(&self, request: &PlaybackRequest, signals: SignalSender) -> BridgeResult<()> {
        let token = signals.token();
        if let Some(previous) = self.current_token() {
            self.release(previous);
        }

        let element = HtmlAudioElement::new().map_err(WasmError::from)?;
        element.set_preload("auto");

        // Browsers fire canplaythrough again after seeks; report it once.
        let ready_sent = Rc::new(Cell::new(false));
        let on_ready = {
            let signals = signals.clone();
            let ready_sent = ready_sent.clone();
            Closure::wrap(Box::new(move |_: Event| {
                if !ready_sent.replace(true) {
                    signals.ready();
                }
            }) as Box<dyn FnMut(Event)>)
        };
        let on_ended = {
            let signals = signals.clone();
            Closure::wrap(Box::new(move |_: Event| {
                signals.finished();
            }) as Box<dyn FnMut(Event)>)
        };
        let on_error = Closure::wrap(Box::new(move |event: Event| {
            let media_error = event
                .target()
                .and_then(|target| target.dyn_into::<HtmlAudioElement>().ok())
                .and_then(|element| element.error());
            signals.error(media_fault(media_error.as_ref()));
        }) as Box<dyn FnMut(Event)>);

        element.set_oncanplaythrough(Some(on_ready.as_ref().unchecked_ref()));
        element.set_onended(Some(on_ended.as_ref().unchecked_ref()));
        element.set_onerror(Some(on_error.as_ref().unchecked_ref()));

        element.set_src(request.source().trim());
        element.load();

        *self.slot.borrow_mut() = Some(AudioSlot {
            token,
            element,
            _handlers: [on_ready, on_ended, on_error],
        });
        debug!(session = %token, "Audio element loading");
        Ok(())
    }

    /// Start playback and wait for the browser to accept it.
    pub async fn play(&self, token: SessionToken) -> BridgeResult<()> {
        let element = match self.slot.borrow().as_ref() {
            Some(slot) if slot.token == token => slot.element.clone(),
            _ => return Ok(()),
        };

        let promise = element.play().map_err(WasmError::from)?;
        JsFuture::from(promise)
            .await
            .map(|_| ())
            .map_err(|err| WasmError::Rejected(js_message(&err)).into())
    }

    pub fn stop(&self, token: SessionToken) {
        if let Some(slot) = self.slot.borrow().as_ref().filter(|s| s.token == token) {
            if let Err(err) = slot.element.pause() {
                warn!(session = %token, error = %js_message(&err), "Failed to pause audio");
            }
        }
    }

    pub fn release(&self, token: SessionToken) {
        let mut slot = self.slot.borrow_mut();
        if slot.as_ref().map(|s| s.token) != Some(token) {
            return;
        }
        if let Some(slot) = slot.take() {
            slot.detach();
            let _ = slot.element.pause();
            // Dropping the src and reloading aborts any pending network fetch.
            slot.element.remove_attribute("src").ok();
            slot.element.load();
            debug!(session = %token, "Audio element released");
        }
    }

    fn current_token(&self) -> Option<SessionToken> {
        self.slot.borrow().as_ref().map(|s| s.token)
    }
}

/// Fault for an element `error` event, keeping the raw `MediaError` code as
/// `extra`.
pub fn media_fault(error: Option<&MediaError>) -> EngineFault {
    match error {
        Some(error) => {
            let code = error.code();
            let detail = error.message();
            let message = if detail.is_empty() {
                media_error_text(code).to_string()
            } else {
                detail
            };
            fault_for_media_code(code, message)
        }
        None => EngineFault::unknown("Audio element reported an error"),
    }
}

/// Map a `MediaError` code onto the shared fault codes.
pub fn fault_for_media_code(code: u16, message: impl Into<String>) -> EngineFault {
    let fault = match code {
        MediaError::MEDIA_ERR_NETWORK => EngineFault::io(message),
        MediaError::MEDIA_ERR_DECODE => EngineFault::malformed(message),
        MediaError::MEDIA_ERR_SRC_NOT_SUPPORTED => EngineFault::unsupported(message),
        _ => EngineFault::unknown(message),
    };
    fault.with_extra(i32::from(code))
}

fn media_error_text(code: u16) -> &'static str {
    match code {
        MediaError::MEDIA_ERR_ABORTED => "Audio loading was aborted",
        MediaError::MEDIA_ERR_NETWORK => "Network error while loading audio",
        MediaError::MEDIA_ERR_DECODE => "Audio could not be decoded",
        MediaError::MEDIA_ERR_SRC_NOT_SUPPORTED => "Audio source is not supported",
        _ => "Unknown audio error",
    }
}
