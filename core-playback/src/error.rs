//! # Playback Error Types
//!
//! Errors surfaced to the host through `play`/`stop` replies. Each variant
//! maps to a stable wire code via [`PlaybackError::code`].

use bridge_traits::{error::BridgeError, EngineFault};
use thiserror::Error;

/// Errors that can occur during playback operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// The request carried no usable source.
    #[error("{0}")]
    InvalidArgument(String),

    /// The engine refused the source, or failed when asked to start it.
    #[error("Failed to play audio: {}", .0.message)]
    AcquisitionFailed(EngineFault),

    /// The engine reported a failure on its own while preparing or playing.
    #[error("Audio playback error: {0}")]
    EngineFailure(EngineFault),

    /// The session was stopped or replaced before it became ready.
    #[error("Playback was cancelled before it started")]
    Cancelled,

    /// The player actor is gone (shut down or every handle dropped).
    #[error("Audio player is not running")]
    PlayerClosed,

    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),
}

impl PlaybackError {
    pub const INVALID_ARGUMENT: &'static str = "INVALID_ARGUMENT";
    pub const PLAY_ERROR: &'static str = "PLAY_ERROR";
    pub const PLAY_CANCELLED: &'static str = "PLAY_CANCELLED";
    pub const PLAYER_UNAVAILABLE: &'static str = "PLAYER_UNAVAILABLE";

    /// Wire code reported to the host in an error reply.
    pub fn code(&self) -> &'static str {
        match self {
            PlaybackError::InvalidArgument(_) => Self::INVALID_ARGUMENT,
            PlaybackError::AcquisitionFailed(_)
            | PlaybackError::EngineFailure(_)
            | PlaybackError::Bridge(_) => Self::PLAY_ERROR,
            PlaybackError::Cancelled => Self::PLAY_CANCELLED,
            PlaybackError::PlayerClosed => Self::PLAYER_UNAVAILABLE,
        }
    }

    /// Engine fault behind this error, if any.
    pub fn fault(&self) -> Option<&EngineFault> {
        match self {
            PlaybackError::AcquisitionFailed(fault) | PlaybackError::EngineFailure(fault) => {
                Some(fault)
            }
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, PlaybackError::Cancelled)
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_host_contract() {
        assert_eq!(
            PlaybackError::InvalidArgument("Path is required".into()).code(),
            "INVALID_ARGUMENT"
        );
        assert_eq!(
            PlaybackError::AcquisitionFailed(EngineFault::io("gone")).code(),
            "PLAY_ERROR"
        );
        assert_eq!(
            PlaybackError::EngineFailure(EngineFault::unknown("x")).code(),
            "PLAY_ERROR"
        );
        assert_eq!(PlaybackError::Cancelled.code(), "PLAY_CANCELLED");
        assert_eq!(PlaybackError::PlayerClosed.code(), "PLAYER_UNAVAILABLE");
    }

    #[test]
    fn messages() {
        let err = PlaybackError::AcquisitionFailed(EngineFault::io("No such file"));
        assert_eq!(err.to_string(), "Failed to play audio: No such file");
        assert_eq!(err.fault().map(|f| f.code), Some(EngineFault::IO));

        let err = PlaybackError::InvalidArgument("Path is required".into());
        assert_eq!(err.to_string(), "Path is required");
        assert!(err.fault().is_none());
    }
}
