//! # Method Channel Handler
//!
//! Translates host method calls into player operations and player events
//! back into host method calls.
//!
//! | Method | Arguments | Reply |
//! |--------|-----------|-------|
//! | `play` | one of `path`, `source`, `url`, `base64Audio`, `text`; optional `accent` | `true` once audible |
//! | `stop` | none | `true` |
//! | other  | - | `notImplemented` |
//!
//! Outbound notifications are `onCompletion` (no arguments) and `onError`
//! (`{what, extra, message}`), produced from [`BridgeEvent`]s with
//! `MethodCall::from`.

use crate::error::{PlaybackError, Result};
use crate::player::PlayerHandle;
use bridge_traits::{Accent, PlaybackRequest};
use core_runtime::events::{BridgeEvent, EventEnvelope};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

/// Keys that carry an audio source, in lookup order.
const AUDIO_KEYS: &[&str] = &["path", "source", "url", "base64Audio"];
const TEXT_KEY: &str = "text";
const ACCENT_KEY: &str = "accent";

/// Media type assumed for bare base64 payloads.
const DEFAULT_DATA_MIME: &str = "audio/mpeg";

/// A method invocation crossing the channel in either direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    pub method: String,
    #[serde(default)]
    pub arguments: Value,
}

impl MethodCall {
    pub fn new(method: impl Into<String>, arguments: Value) -> Self {
        Self {
            method: method.into(),
            arguments,
        }
    }

    /// String argument by key, if present.
    pub fn argument(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(Value::as_str)
    }
}

impl From<&BridgeEvent> for MethodCall {
    fn from(event: &BridgeEvent) -> Self {
        match event {
            BridgeEvent::Completion => MethodCall::new(event.method_name(), Value::Null),
            BridgeEvent::Error {
                code,
                extra,
                message,
            } => MethodCall::new(
                event.method_name(),
                json!({ "what": code, "extra": extra, "message": message }),
            ),
        }
    }
}

impl From<&EventEnvelope> for MethodCall {
    fn from(envelope: &EventEnvelope) -> Self {
        MethodCall::from(&envelope.event)
    }
}

/// Reply to a [`MethodCall`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum MethodResponse {
    Success {
        result: Value,
    },
    Error {
        code: String,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        details: Option<Value>,
    },
    /// The method is unknown. Distinct from an error so hosts can fall back.
    NotImplemented,
}

impl MethodResponse {
    pub fn success(result: impl Into<Value>) -> Self {
        MethodResponse::Success {
            result: result.into(),
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        MethodResponse::Error {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn from_error(err: &PlaybackError) -> Self {
        let details = err
            .fault()
            .map(|fault| json!({ "what": fault.code, "extra": fault.extra }));
        MethodResponse::Error {
            code: err.code().to_string(),
            message: err.to_string(),
            details,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, MethodResponse::Success { .. })
    }

    /// Error code, for error replies.
    pub fn error_code(&self) -> Option<&str> {
        match self {
            MethodResponse::Error { code, .. } => Some(code),
            _ => None,
        }
    }
}

/// Build a [`PlaybackRequest`] from `play` arguments.
///
/// Audio keys win over `text`. A key that is present but empty counts as
/// missing. Bare base64 payloads are wrapped into a `data:` URI.
pub fn parse_play_arguments(arguments: &Value, default_accent: Accent) -> Result<PlaybackRequest> {
    let accent = arguments
        .get(ACCENT_KEY)
        .and_then(Value::as_str)
        .map(Accent::parse);

    let audio = AUDIO_KEYS.iter().find_map(|key| {
        arguments
            .get(*key)
            .and_then(Value::as_str)
            .filter(|value| !value.trim().is_empty())
            .map(|value| (*key, value))
    });

    if let Some((key, value)) = audio {
        let source = if key == "base64Audio" && !value.trim_start().starts_with("data:") {
            format!("data:{};base64,{}", DEFAULT_DATA_MIME, value.trim())
        } else {
            value.to_string()
        };
        let request = PlaybackRequest::audio(source);
        return Ok(match accent {
            Some(accent) => request.with_accent(accent),
            None => request,
        });
    }

    if let Some(text) = arguments
        .get(TEXT_KEY)
        .and_then(Value::as_str)
        .filter(|text| !text.trim().is_empty())
    {
        return Ok(PlaybackRequest::speech(text).with_accent(accent.unwrap_or(default_accent)));
    }

    Err(PlaybackError::InvalidArgument("Path is required".to_string()))
}

/// Serves the `audio_player` method channel.
#[derive(Debug, Clone)]
pub struct AudioChannelHandler {
    player: PlayerHandle,
    default_accent: Accent,
}

impl AudioChannelHandler {
    pub fn new(player: PlayerHandle) -> Self {
        Self {
            player,
            default_accent: Accent::default(),
        }
    }

    /// Accent used for speech requests that carry no `accent` argument.
    pub fn with_default_accent(mut self, accent: Accent) -> Self {
        self.default_accent = accent;
        self
    }

    pub fn player(&self) -> &PlayerHandle {
        &self.player
    }

    /// Dispatch one host call.
    pub async fn handle(&self, call: MethodCall) -> MethodResponse {
        match call.method.as_str() {
            "play" => self.handle_play(&call.arguments).await,
            "stop" => self.handle_stop().await,
            other => {
                debug!(method = other, "Method not implemented");
                MethodResponse::NotImplemented
            }
        }
    }

    /// `play`: replies once playback has begun or failed to.
    pub async fn handle_play(&self, arguments: &Value) -> MethodResponse {
        let request = match parse_play_arguments(arguments, self.default_accent) {
            Ok(request) => request,
            Err(err) => {
                debug!(error = %err, "Rejected play arguments");
                return MethodResponse::from_error(&err);
            }
        };

        match self.player.play(request).await {
            Ok(started) => MethodResponse::success(started),
            Err(err) => MethodResponse::from_error(&err),
        }
    }

    /// `stop`: always succeeds.
    pub async fn handle_stop(&self) -> MethodResponse {
        match self.player.stop().await {
            Ok(stopped) => MethodResponse::success(stopped),
            Err(err) => {
                warn!(error = %err, "Stop failed");
                MethodResponse::success(true)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::SourceKind;

    #[test]
    fn parses_native_path() {
        let request = parse_play_arguments(&json!({ "path": "/sdcard/a.mp3" }), Accent::American)
            .unwrap();
        assert_eq!(request.source(), "/sdcard/a.mp3");
        assert_eq!(request.kind(), SourceKind::File);
        assert_eq!(request.accent(), None);
    }

    #[test]
    fn wraps_bare_base64() {
        let request =
            parse_play_arguments(&json!({ "base64Audio": "SUQzBAAA" }), Accent::American).unwrap();
        assert_eq!(request.source(), "data:audio/mpeg;base64,SUQzBAAA");
        assert_eq!(request.kind(), SourceKind::DataUri);

        let request = parse_play_arguments(
            &json!({ "base64Audio": "data:audio/wav;base64,UklG" }),
            Accent::American,
        )
        .unwrap();
        assert_eq!(request.source(), "data:audio/wav;base64,UklG");
    }

    #[test]
    fn speech_uses_accent_or_default() {
        let request = parse_play_arguments(
            &json!({ "text": "colour", "accent": "british" }),
            Accent::American,
        )
        .unwrap();
        assert_eq!(request.kind(), SourceKind::Speech);
        assert_eq!(request.accent(), Some(Accent::British));

        let request = parse_play_arguments(&json!({ "text": "color" }), Accent::British).unwrap();
        assert_eq!(request.accent(), Some(Accent::British));
    }

    #[test]
    fn audio_keys_win_over_text() {
        let request = parse_play_arguments(
            &json!({ "text": "hello", "url": "https://x/a.mp3" }),
            Accent::American,
        )
        .unwrap();
        assert_eq!(request.kind(), SourceKind::Url);
    }

    #[test]
    fn missing_or_empty_source_is_invalid() {
        for arguments in [
            Value::Null,
            json!({}),
            json!({ "path": "" }),
            json!({ "path": 42 }),
            json!({ "text": "   " }),
        ] {
            let err = parse_play_arguments(&arguments, Accent::American).unwrap_err();
            assert_eq!(err.code(), "INVALID_ARGUMENT");
            assert_eq!(err.to_string(), "Path is required");
        }
    }

    #[test]
    fn events_become_method_calls() {
        let call = MethodCall::from(&BridgeEvent::Completion);
        assert_eq!(call.method, "onCompletion");
        assert_eq!(call.arguments, Value::Null);

        let call = MethodCall::from(&BridgeEvent::Error {
            code: 1,
            extra: Some(-19),
            message: "Audio playback error: what=1, extra=-19".to_string(),
        });
        assert_eq!(call.method, "onError");
        assert_eq!(call.arguments["what"], 1);
        assert_eq!(call.arguments["extra"], -19);
        assert_eq!(call.argument("message"), Some("Audio playback error: what=1, extra=-19"));
    }

    #[test]
    fn response_wire_format() {
        let json = serde_json::to_value(MethodResponse::success(true)).unwrap();
        assert_eq!(json, json!({ "status": "success", "result": true }));

        let json = serde_json::to_value(MethodResponse::NotImplemented).unwrap();
        assert_eq!(json, json!({ "status": "notImplemented" }));

        let response = MethodResponse::from_error(&PlaybackError::Cancelled);
        assert_eq!(response.error_code(), Some("PLAY_CANCELLED"));
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("details").is_none());

        let call: MethodCall = serde_json::from_str(r#"{ "method": "stop" }"#).unwrap();
        assert_eq!(call.arguments, Value::Null);
    }
}
