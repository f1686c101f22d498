//! Integration tests for logging system

use async_trait::async_trait;
use bridge_traits::error::Result as SinkResult;
use bridge_traits::logging::{LogEntry, LogLevel, LoggerSink};
use bridge_traits::playback::PlaybackRequest;
use core_runtime::logging::{init_logging, redact_source, strip_path, LogFormat, LoggingConfig};
use core_runtime::Error;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct RecordingSink {
    entries: Mutex<Vec<LogEntry>>,
}

#[async_trait]
impl LoggerSink for RecordingSink {
    async fn log(&self, entry: LogEntry) -> SinkResult<()> {
        self.entries.lock().unwrap().push(entry);
        Ok(())
    }

    fn min_level(&self) -> LogLevel {
        LogLevel::Info
    }
}

// Global subscriber can only be installed once per process, so the whole
// lifecycle lives in one test.
#[test]
fn test_logging_initialization_and_sink_forwarding() {
    let sink = Arc::new(RecordingSink::default());
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Debug)
        .with_logger_sink(sink.clone());

    init_logging(config).expect("first initialization succeeds");

    let request = PlaybackRequest::audio("data:audio/wav;base64,UklGRiQAAABXQVZF");
    tracing::info!(
        target: "core_playback::player",
        source = %redact_source(&request),
        "Starting playback"
    );
    tracing::debug!(target: "core_playback::player", "below sink level");
    tracing::info!(target: "some_other_crate", "filtered out by default directives");

    {
        let entries = sink.entries.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "Starting playback");
        let source = entries[0].fields.get("source").unwrap();
        assert!(source.starts_with("data:audio/wav;base64,"));
        assert!(!source.contains("UklGR"));
    }

    let second = init_logging(LoggingConfig::default());
    assert!(matches!(second, Err(Error::Logging(_))));
}

#[test]
fn test_path_stripping() {
    // Unix paths
    assert_eq!(strip_path("/home/user/music/song.mp3"), "song.mp3");
    assert_eq!(strip_path("/var/log/app.log"), "app.log");

    // Windows paths
    assert_eq!(strip_path("C:\\Users\\John\\Music\\song.mp3"), "song.mp3");
    assert_eq!(strip_path("D:\\data\\file.txt"), "file.txt");

    // Already basename
    assert_eq!(strip_path("filename.txt"), "filename.txt");

    // Edge cases
    assert_eq!(strip_path("/var/log/"), "");
    assert_eq!(strip_path(""), "");
}

#[test]
fn test_speech_text_never_logged() {
    let request = PlaybackRequest::speech("my secret sentence");
    let redacted = redact_source(&request);
    assert!(!redacted.contains("secret"));
    assert_eq!(redacted, "[speech: 18 chars]");
}

#[test]
fn test_config_chaining() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Warn)
        .with_spans(false)
        .with_target(false)
        .with_thread_info(true);

    assert_eq!(config.format, LogFormat::Compact);
    assert_eq!(config.level, LogLevel::Warn);
    assert!(!config.enable_spans);
    assert!(!config.display_target);
    assert!(config.display_thread_info);
}
