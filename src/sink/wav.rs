//! WAV sink implementation.

use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::chunk::CHUNK_SIZE;
use crate::format::f64_to_int;
use crate::{Format, SinkError, Streamer};

/// A sink that encodes a stream as integer PCM WAV.
///
/// The bit depth is `format.precision * 8`. Stereo formats write one frame
/// per pair; mono formats write the average of left and right. The header is
/// completed by [`finalize`](Self::finalize).
///
/// # Example
///
/// ```no_run
/// use mic_stream::{Microphone, WavSink};
///
/// let (mut mic, format) = Microphone::open_default(44100, 2)?;
/// let mut sink = WavSink::create("recording.wav", format)?;
/// mic.start()?;
/// sink.drain(&mut mic)?;
/// sink.finalize()?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct WavSink<W: Write + Seek = BufWriter<File>> {
    writer: WavWriter<W>,
    format: Format,
    frames_written: u64,
}

impl WavSink<BufWriter<File>> {
    /// Creates (or truncates) a WAV file at `path`.
    ///
    /// # Errors
    ///
    /// Returns `FileError` if the file can't be created, or
    /// `UnsupportedPrecision` for precisions outside 1-4 bytes.
    pub fn create(path: impl AsRef<Path>, format: Format) -> Result<Self, SinkError> {
        let path = path.as_ref();
        let spec = wav_spec(format)?;
        let file = File::create(path).map_err(|e| SinkError::file_error(path, e))?;
        tracing::debug!(path = %path.display(), ?format, "Created WAV file");
        Self::with_spec(BufWriter::new(file), format, spec)
    }
}

impl<W: Write + Seek> WavSink<W> {
    /// Creates a sink writing to `writer`.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedPrecision` for precisions outside 1-4 bytes, or
    /// `Encode` if the header can't be written.
    pub fn new(writer: W, format: Format) -> Result<Self, SinkError> {
        let spec = wav_spec(format)?;
        Self::with_spec(writer, format, spec)
    }

    fn with_spec(writer: W, format: Format, spec: WavSpec) -> Result<Self, SinkError> {
        Ok(Self {
            writer: WavWriter::new(writer, spec)?,
            format,
            frames_written: 0,
        })
    }

    /// Pulls from `streamer` until it reports the end, writing every filled
    /// pair. Returns the number of frames written by this call.
    ///
    /// Blocks as long as the streamer does. A stream ending with an error
    /// still returns `Ok`; check [`Streamer::err`] to tell the cases apart.
    ///
    /// # Errors
    ///
    /// Returns `Encode` if writing a frame fails.
    pub fn drain<S: Streamer + ?Sized>(&mut self, streamer: &mut S) -> Result<u64, SinkError> {
        let mut block = [[0.0; 2]; CHUNK_SIZE];
        let mut frames = 0;
        loop {
            let (n, ok) = streamer.stream(&mut block);
            self.write_pairs(&block[..n])?;
            frames += n as u64;
            if !ok || n == 0 {
                break;
            }
        }

        if let Some(e) = streamer.err() {
            tracing::debug!(error = %e, frames, "Stream ended with error");
        }
        Ok(frames)
    }

    /// Writes stereo pairs as frames.
    ///
    /// # Errors
    ///
    /// Returns `Encode` if the encoder rejects a sample.
    pub fn write_pairs(&mut self, pairs: &[[f64; 2]]) -> Result<(), SinkError> {
        let bits = self.format.bits_per_sample();
        for &[left, right] in pairs {
            if self.format.channels == 1 {
                self.writer.write_sample(f64_to_int((left + right) / 2.0, bits))?;
            } else {
                self.writer.write_sample(f64_to_int(left, bits))?;
                self.writer.write_sample(f64_to_int(right, bits))?;
            }
        }
        self.frames_written += pairs.len() as u64;
        Ok(())
    }

    /// Returns the total number of frames written.
    #[must_use]
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Completes the WAV header and flushes the writer.
    ///
    /// # Errors
    ///
    /// Returns `Encode` if the header can't be updated.
    pub fn finalize(self) -> Result<u64, SinkError> {
        self.writer.finalize()?;
        tracing::info!(
            frames = self.frames_written,
            duration_s = self.format.duration(self.frames_written).as_secs_f64(),
            "WAV finalized"
        );
        Ok(self.frames_written)
    }
}

fn wav_spec(format: Format) -> Result<WavSpec, SinkError> {
    if !(1..=4).contains(&format.precision) {
        return Err(SinkError::UnsupportedPrecision(format.precision));
    }
    Ok(WavSpec {
        channels: format.channels,
        sample_rate: format.sample_rate,
        bits_per_sample: format.bits_per_sample(),
        sample_format: SampleFormat::Int,
    })
}
