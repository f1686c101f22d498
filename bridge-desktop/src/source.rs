//! Turns a [`PlaybackRequest`] into something an output device can open.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bridge_traits::{EngineFault, PlaybackRequest, SourceKind};
use std::path::{Path, PathBuf};

/// A source ready to be handed to an output device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedSource {
    /// Existing file on the local filesystem.
    File(PathBuf),
    /// Encoded audio held in memory (from a `data:` URI).
    Bytes(Vec<u8>),
}

/// Whether the native engine can play this kind of source at all.
pub fn is_supported(kind: SourceKind) -> bool {
    matches!(kind, SourceKind::File | SourceKind::DataUri)
}

/// Resolve a request. Runs on the audio worker.
pub fn resolve(request: &PlaybackRequest) -> Result<ResolvedSource, EngineFault> {
    match request.kind() {
        SourceKind::File => resolve_file(request.source()),
        SourceKind::DataUri => decode_data_uri(request.source()).map(ResolvedSource::Bytes),
        SourceKind::Url => Err(EngineFault::unsupported(
            "Remote URLs are not supported by the native engine",
        )),
        SourceKind::Speech => Err(EngineFault::unsupported(
            "Speech synthesis is not available on this platform",
        )),
    }
}

fn resolve_file(source: &str) -> Result<ResolvedSource, EngineFault> {
    let trimmed = source.trim();
    let path = Path::new(trimmed.strip_prefix("file://").unwrap_or(trimmed));

    match std::fs::metadata(path) {
        Ok(metadata) if metadata.is_file() => Ok(ResolvedSource::File(path.to_path_buf())),
        Ok(_) => Err(EngineFault::io(format!(
            "Not a regular file: {}",
            file_name(path)
        ))),
        Err(err) => Err(EngineFault::io(format!(
            "Cannot open {}: {}",
            file_name(path),
            err
        ))),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Decode the payload of a base64 `data:` URI.
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>, EngineFault> {
    let (header, payload) = uri
        .trim()
        .split_once(',')
        .ok_or_else(|| EngineFault::malformed("Data URI has no payload"))?;

    if !header.to_ascii_lowercase().ends_with(";base64") {
        return Err(EngineFault::malformed("Data URI is not base64 encoded"));
    }

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| EngineFault::malformed(format!("Invalid base64 audio: {}", e)))?;

    if bytes.is_empty() {
        return Err(EngineFault::malformed("Data URI payload is empty"));
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_file(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("{}-{}", std::process::id(), name));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"RIFF").unwrap();
        path
    }

    #[test]
    fn resolves_existing_file_with_and_without_scheme() {
        let path = temp_file("resolve.wav");
        let plain = PlaybackRequest::audio(path.to_string_lossy().to_string());
        assert_eq!(resolve(&plain).unwrap(), ResolvedSource::File(path.clone()));

        let with_scheme = PlaybackRequest::audio(format!("file://{}", path.display()));
        assert_eq!(resolve(&with_scheme).unwrap(), ResolvedSource::File(path.clone()));

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn missing_file_is_an_io_fault() {
        let request = PlaybackRequest::audio("/definitely/not/here/word.mp3");
        let fault = resolve(&request).unwrap_err();
        assert_eq!(fault.code, EngineFault::IO);
        assert!(fault.message.contains("word.mp3"));
        assert!(!fault.message.contains("/definitely"));
    }

    #[test]
    fn decodes_data_uri() {
        let request = PlaybackRequest::audio("data:audio/wav;base64,UklGRg==");
        assert_eq!(
            resolve(&request).unwrap(),
            ResolvedSource::Bytes(b"RIFF".to_vec())
        );
    }

    #[test]
    fn rejects_malformed_data_uris() {
        for uri in [
            "data:audio/wav;base64",
            "data:audio/wav,UklGRg==",
            "data:audio/wav;base64,***",
            "data:audio/wav;base64,",
        ] {
            let fault = decode_data_uri(uri).unwrap_err();
            assert_eq!(fault.code, EngineFault::MALFORMED, "{}", uri);
        }
    }

    #[test]
    fn urls_and_speech_are_unsupported() {
        assert!(!is_supported(SourceKind::Url));
        assert!(!is_supported(SourceKind::Speech));
        assert!(is_supported(SourceKind::DataUri));

        let fault = resolve(&PlaybackRequest::speech("hello")).unwrap_err();
        assert_eq!(fault.code, EngineFault::UNSUPPORTED);
    }
}
