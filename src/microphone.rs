//! Microphone stream: exact-size reads over fixed-size device chunks.

use crate::chunk::{ChannelLayout, Chunk, CHUNK_SIZE};
use crate::source::{AudioDevice, DeviceSession, InputStream, StreamControl};
use crate::{Format, MicStreamError, StreamConfig, Streamer};

/// A pull-based stereo sample stream over an [`InputStream`].
///
/// Every [`read`](Self::read) blocks until the destination is completely
/// filled, fetching as many chunks from the source as needed. The first
/// failed fetch is latched: from then on every read returns `(0, false)`
/// without touching the source, and [`last_error`](Self::last_error)
/// reports the failure.
///
/// A `Microphone` has a single reader. To stop capture from another thread
/// while a read is blocked, use [`Microphone::control`].
///
/// # Example
///
/// ```
/// use mic_stream::{ChannelLayout, Microphone, MockSource};
///
/// let mut mic = Microphone::with_source(MockSource::ramp(ChannelLayout::Mono), 16000, 1)?;
/// mic.start()?;
///
/// let mut pairs = vec![[0.0; 2]; 600];
/// assert_eq!(mic.read(&mut pairs), (600, true));
/// assert_eq!(pairs[599], [599.0, 599.0]);
/// # Ok::<(), mic_stream::MicStreamError>(())
/// ```
pub struct Microphone<S = DeviceSession> {
    source: S,
    chunk: Chunk,
    /// Frames of `chunk` already handed out; `CHUNK_SIZE` means drained.
    cursor: usize,
    err: Option<MicStreamError>,
    format: Format,
}

impl Microphone<DeviceSession> {
    /// Opens the default input device at `sample_rate` with `channels`
    /// channels and returns the stream with its format.
    ///
    /// # Errors
    ///
    /// Returns `InvalidChannelCount` unless `channels` is 1 or 2, without
    /// touching the device; otherwise any error from opening the device.
    pub fn open_default(sample_rate: u32, channels: u16) -> Result<(Self, Format), MicStreamError> {
        let config = StreamConfig::new(sample_rate, channels);
        let session = DeviceSession::open_default(&config)?;
        let mic = Self::from_session(session, &config)?;
        let format = mic.format;
        Ok((mic, format))
    }

    /// Opens `device` with the given configuration.
    ///
    /// # Errors
    ///
    /// See [`DeviceSession::open`].
    pub fn open(device: &AudioDevice, config: &StreamConfig) -> Result<Self, MicStreamError> {
        let session = DeviceSession::open(device, config)?;
        Self::from_session(session, config)
    }

    fn from_session(session: DeviceSession, config: &StreamConfig) -> Result<Self, MicStreamError> {
        Self::with_source(session, config.sample_rate, config.channels)
    }

    /// Returns a handle that starts, stops and closes capture from any thread.
    ///
    /// Stopping or closing through it releases a read blocked in a fetch.
    #[must_use]
    pub fn control(&self) -> StreamControl {
        self.source.control()
    }
}

impl<S: InputStream> Microphone<S> {
    /// Wraps an input stream that delivers `channels`-channel chunks.
    ///
    /// # Errors
    ///
    /// Returns `InvalidChannelCount` unless `channels` is 1 or 2, and
    /// `ChannelMismatch` if the source's own layout has a different count.
    pub fn with_source(source: S, sample_rate: u32, channels: u16) -> Result<Self, MicStreamError> {
        let layout = ChannelLayout::try_from(channels)?;
        if source.layout() != layout {
            return Err(MicStreamError::ChannelMismatch {
                requested: channels,
                native: source.layout().into(),
            });
        }
        Ok(Self {
            source,
            chunk: Chunk::new(layout),
            // Start drained so the first read fetches.
            cursor: CHUNK_SIZE,
            err: None,
            format: Format::new(sample_rate, layout),
        })
    }

    /// Returns the stream's format.
    #[must_use]
    pub fn format(&self) -> Format {
        self.format
    }

    /// Borrows the underlying input stream.
    #[must_use]
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Begins capture.
    ///
    /// # Errors
    ///
    /// Passes through the source's error.
    pub fn start(&mut self) -> Result<(), MicStreamError> {
        self.source.start()
    }

    /// Pauses capture without releasing the stream.
    ///
    /// # Errors
    ///
    /// Passes through the source's error; after `close` this usually fails
    /// and can be ignored.
    pub fn stop(&mut self) -> Result<(), MicStreamError> {
        self.source.stop()
    }

    /// Releases the stream.
    ///
    /// # Errors
    ///
    /// Passes through the source's error.
    pub fn close(&mut self) -> Result<(), MicStreamError> {
        self.source.close()
    }

    /// Fills `samples` completely with stereo pairs.
    ///
    /// Blocks until every pair is filled and returns `(samples.len(), true)`.
    /// If a fetch fails, the failure is latched and `(0, false)` is returned;
    /// pairs already written during this call are not reported. An empty
    /// destination returns `(0, true)` without fetching.
    pub fn read(&mut self, samples: &mut [[f64; 2]]) -> (usize, bool) {
        if self.err.is_some() {
            return (0, false);
        }

        let mut filled = self.drain_into(samples);
        while filled < samples.len() {
            if let Err(e) = self.source.read(&mut self.chunk) {
                tracing::warn!(error = %e, "Fetch failed; stream is now terminal");
                self.err = Some(e);
                return (0, false);
            }
            self.cursor = 0;
            filled += self.drain_into(&mut samples[filled..]);
        }

        (samples.len(), true)
    }

    /// Returns the error latched by a failed fetch, if any.
    #[must_use]
    pub fn last_error(&self) -> Option<&MicStreamError> {
        self.err.as_ref()
    }

    /// Copies buffered pairs from the cursor into the front of `dest`.
    fn drain_into(&mut self, dest: &mut [[f64; 2]]) -> usize {
        let n = (CHUNK_SIZE - self.cursor).min(dest.len());
        self.chunk.copy_pairs(self.cursor, &mut dest[..n]);
        self.cursor += n;
        n
    }
}

impl<S: InputStream> Streamer for Microphone<S> {
    fn stream(&mut self, samples: &mut [[f64; 2]]) -> (usize, bool) {
        self.read(samples)
    }

    fn err(&self) -> Option<&MicStreamError> {
        self.last_error()
    }
}
