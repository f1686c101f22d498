//! Playback engine contract and the types exchanged across it.
//!
//! The bridge core drives exactly one [`PlaybackEngine`] at a time. An engine
//! wraps a platform player (a native output device, an `HTMLAudioElement`,
//! the Web Speech API) and reports progress back as token-tagged
//! [`EngineSignal`]s instead of invoking host callbacks directly. Every
//! session the core starts gets a fresh [`SessionToken`]; signals carrying an
//! older token are discarded by the core, which is how late callbacks from a
//! stopped or replaced player are kept from leaking into the next session.

use crate::{
    error::{BridgeError, Result},
    platform::PlatformSendSync,
};
use core_async::sync::mpsc::UnboundedSender;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Generation number identifying one playback session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(u64);

impl SessionToken {
    /// Wrap a raw generation value.
    pub const fn new(generation: u64) -> Self {
        Self(generation)
    }

    /// Raw generation value.
    pub fn get(&self) -> u64 {
        self.0
    }

    /// The token that follows this one.
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Pronunciation hint for speech sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accent {
    #[default]
    American,
    British,
}

impl Accent {
    /// Parse a host-supplied hint. Anything that is not recognisably British
    /// falls back to American English.
    pub fn parse(hint: &str) -> Self {
        match hint.trim().to_ascii_lowercase().as_str() {
            "british" | "uk" | "gb" | "en-gb" | "en_gb" => Accent::British,
            _ => Accent::American,
        }
    }

    /// BCP 47 language tag understood by speech engines.
    pub fn language_tag(&self) -> &'static str {
        match self {
            Accent::American => "en-US",
            Accent::British => "en-GB",
        }
    }
}

/// How an engine should interpret [`PlaybackRequest::source`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Filesystem path, optionally prefixed with `file://`.
    File,
    /// Remote or object URL (`http(s)://`, `blob:`).
    Url,
    /// Inline `data:` URI carrying base64 audio.
    DataUri,
    /// Literal text to be synthesized.
    Speech,
}

impl SourceKind {
    /// Classify an audio source string. Speech is never inferred; it has to
    /// be requested explicitly with [`PlaybackRequest::speech`].
    pub fn detect(source: &str) -> Self {
        let lowered = source.trim_start().to_ascii_lowercase();
        if lowered.starts_with("data:") {
            SourceKind::DataUri
        } else if lowered.starts_with("http://")
            || lowered.starts_with("https://")
            || lowered.starts_with("blob:")
        {
            SourceKind::Url
        } else {
            SourceKind::File
        }
    }
}

/// One "play this" request. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackRequest {
    source: String,
    kind: SourceKind,
    accent: Option<Accent>,
}

impl PlaybackRequest {
    /// Audio request; the kind is detected from the source string.
    pub fn audio(source: impl Into<String>) -> Self {
        let source = source.into();
        let kind = SourceKind::detect(&source);
        Self {
            source,
            kind,
            accent: None,
        }
    }

    /// Speech request for the given text.
    pub fn speech(text: impl Into<String>) -> Self {
        Self {
            source: text.into(),
            kind: SourceKind::Speech,
            accent: None,
        }
    }

    /// Attach an accent hint.
    pub fn with_accent(mut self, accent: Accent) -> Self {
        self.accent = Some(accent);
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    pub fn accent(&self) -> Option<Accent> {
        self.accent
    }

    /// `false` for empty or whitespace-only sources.
    pub fn has_source(&self) -> bool {
        !self.source.trim().is_empty()
    }
}

/// Failure reported by an engine, in the engine's own vocabulary.
///
/// Codes follow the native media player convention (`what`/`extra`), so a
/// host that already understands those values can keep switching on them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineFault {
    pub code: i32,
    pub extra: Option<i32>,
    pub message: String,
}

impl EngineFault {
    pub const UNKNOWN: i32 = 1;
    pub const IO: i32 = -1004;
    pub const MALFORMED: i32 = -1007;
    pub const UNSUPPORTED: i32 = -1010;

    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            extra: None,
            message: message.into(),
        }
    }

    pub fn with_extra(mut self, extra: i32) -> Self {
        self.extra = Some(extra);
        self
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(Self::UNKNOWN, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(Self::IO, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(Self::MALFORMED, message)
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(Self::UNSUPPORTED, message)
    }
}

impl fmt::Display for EngineFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.extra {
            Some(extra) => write!(f, "{} (what={}, extra={})", self.message, self.code, extra),
            None => write!(f, "{} (what={})", self.message, self.code),
        }
    }
}

impl std::error::Error for EngineFault {}

impl From<&BridgeError> for EngineFault {
    fn from(err: &BridgeError) -> Self {
        match err {
            BridgeError::NotAvailable(_) => EngineFault::unsupported(err.to_string()),
            BridgeError::Io(_) => EngineFault::io(err.to_string()),
            _ => EngineFault::unknown(err.to_string()),
        }
    }
}

/// Asynchronous progress report from an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineSignal {
    /// The source is loaded and playback can begin (or has begun, for
    /// engines that cannot separate the two).
    Ready,
    /// Playback reached the end of the source.
    Finished,
    /// The engine gave up on the source. Always terminal.
    Error(EngineFault),
}

impl EngineSignal {
    pub fn is_terminal(&self) -> bool {
        matches!(self, EngineSignal::Finished | EngineSignal::Error(_))
    }
}

/// A signal tagged with the session it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalEnvelope {
    pub token: SessionToken,
    pub signal: EngineSignal,
}

/// Callback endpoint handed to an engine for one session.
///
/// Cloneable and safe to move into platform callbacks (worker threads, JS
/// closures). Sending never blocks; it fails only once the player is gone.
#[derive(Debug, Clone)]
pub struct SignalSender {
    token: SessionToken,
    tx: UnboundedSender<SignalEnvelope>,
}

impl SignalSender {
    pub fn new(token: SessionToken, tx: UnboundedSender<SignalEnvelope>) -> Self {
        Self { token, tx }
    }

    /// Session this sender reports for.
    pub fn token(&self) -> SessionToken {
        self.token
    }

    /// Enqueue a signal. Returns `false` when nobody is listening anymore.
    pub fn send(&self, signal: EngineSignal) -> bool {
        self.tx
            .unbounded_send(SignalEnvelope {
                token: self.token,
                signal,
            })
            .is_ok()
    }

    pub fn ready(&self) -> bool {
        self.send(EngineSignal::Ready)
    }

    pub fn finished(&self) -> bool {
        self.send(EngineSignal::Finished)
    }

    pub fn error(&self, fault: EngineFault) -> bool {
        self.send(EngineSignal::Error(fault))
    }
}

/// Platform playback engine.
///
/// The engine holds at most one source at a time, identified by the token of
/// the last successful [`acquire`](PlaybackEngine::acquire). Calls carrying
/// any other token must be treated as no-ops, and `stop`/`release` must be
/// idempotent: the core may call them for a session the engine already gave
/// up on.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait PlaybackEngine: PlatformSendSync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Start loading `request`. Returning `Ok` means the engine accepted the
    /// source; `Ready` or `Error` follows later through `signals`. Returning
    /// `Err` means nothing was acquired and no signal will follow.
    async fn acquire(&self, request: PlaybackRequest, signals: SignalSender) -> Result<()>;

    /// Begin audible playback of an acquired source.
    async fn play(&self, token: SessionToken) -> Result<()>;

    /// Halt playback without releasing the source.
    async fn stop(&self, token: SessionToken) -> Result<()>;

    /// Drop every resource held for `token`.
    async fn release(&self, token: SessionToken) -> Result<()>;
}
