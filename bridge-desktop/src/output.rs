//! Audio output abstraction used by the worker thread.
//!
//! The device is created on the worker and never leaves it, so neither trait
//! requires `Send`. The `rodio` implementation is behind the `rodio-output`
//! feature; tests use in-memory fakes.

use crate::source::ResolvedSource;
use bridge_traits::EngineFault;

/// An opened output that can load one source at a time.
pub trait OutputDevice {
    type Voice: OutputVoice;

    /// Decode `source` and prepare it paused.
    fn open(&mut self, source: ResolvedSource) -> Result<Self::Voice, EngineFault>;
}

/// One loaded source.
pub trait OutputVoice {
    /// Begin audible playback.
    fn start(&mut self);

    /// Halt playback. The voice may not be restarted afterwards.
    fn stop(&mut self);

    /// `true` once every sample has been played.
    fn is_finished(&self) -> bool;
}

#[cfg(feature = "rodio-output")]
pub use self::rodio_output::{RodioOutput, RodioVoice};

#[cfg(feature = "rodio-output")]
mod rodio_output {
    use super::{OutputDevice, OutputVoice};
    use crate::source::ResolvedSource;
    use bridge_traits::EngineFault;
    use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
    use std::fs::File;
    use std::io::{BufReader, Cursor};

    /// The system's default output device.
    pub struct RodioOutput {
        // Dropping the stream silences every sink created from it.
        _stream: OutputStream,
        handle: OutputStreamHandle,
    }

    impl RodioOutput {
        pub fn open_default() -> Result<Self, EngineFault> {
            let (stream, handle) = OutputStream::try_default().map_err(|e| {
                EngineFault::unknown(format!("Failed to open audio output: {}", e))
            })?;
            Ok(Self {
                _stream: stream,
                handle,
            })
        }
    }

    impl OutputDevice for RodioOutput {
        type Voice = RodioVoice;

        fn open(&mut self, source: ResolvedSource) -> Result<RodioVoice, EngineFault> {
            let sink = Sink::try_new(&self.handle)
                .map_err(|e| EngineFault::unknown(format!("Failed to create audio sink: {}", e)))?;
            sink.pause();

            match source {
                ResolvedSource::File(path) => {
                    let file = File::open(&path)
                        .map_err(|e| EngineFault::io(format!("Failed to open audio file: {}", e)))?;
                    let decoder = Decoder::new(BufReader::new(file)).map_err(|e| {
                        EngineFault::malformed(format!("Failed to decode audio: {}", e))
                    })?;
                    sink.append(decoder);
                }
                ResolvedSource::Bytes(bytes) => {
                    let decoder = Decoder::new(Cursor::new(bytes)).map_err(|e| {
                        EngineFault::malformed(format!("Failed to decode audio: {}", e))
                    })?;
                    sink.append(decoder);
                }
            }

            Ok(RodioVoice { sink })
        }
    }

    pub struct RodioVoice {
        sink: Sink,
    }

    impl OutputVoice for RodioVoice {
        fn start(&mut self) {
            self.sink.play();
        }

        fn stop(&mut self) {
            self.sink.stop();
        }

        fn is_finished(&self) -> bool {
            self.sink.empty()
        }
    }
}
