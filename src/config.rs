//! Configuration types for microphone streams.

use std::time::Duration;

use crate::chunk::CHUNK_SIZE;

/// Configuration for opening a device session.
///
/// Use [`StreamConfig::default()`] for sensible defaults, or customize as needed.
///
/// # Example
///
/// ```
/// use mic_stream::StreamConfig;
/// use std::time::Duration;
///
/// let config = StreamConfig {
///     poll_interval: Duration::from_millis(5),
///     ..StreamConfig::new(16000, 1)
/// };
/// assert_eq!(config.channels, 1);
/// ```
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Requested sample rate in Hz.
    ///
    /// Default: 44100
    pub sample_rate: u32,

    /// Number of input channels (1 = mono, 2 = stereo).
    ///
    /// Default: 2
    pub channels: u16,

    /// Capacity of the capture ring buffer, in chunks.
    ///
    /// This absorbs callback bursts while the reader is busy. If it fills,
    /// newest audio is dropped and a warning is logged on the next fetch.
    /// Default: 64
    pub ring_buffer_chunks: usize,

    /// Upper bound on how long a blocked fetch sleeps before re-checking the
    /// buffer and the stream state.
    ///
    /// Default: 20ms
    pub poll_interval: Duration,
}

impl StreamConfig {
    /// Creates a config for the given rate and channel count with default tuning.
    #[must_use]
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
            ..Self::default()
        }
    }

    /// Sets the ring buffer capacity in chunks.
    #[must_use]
    pub fn with_ring_buffer_chunks(mut self, chunks: usize) -> Self {
        self.ring_buffer_chunks = chunks.max(1);
        self
    }

    /// Sets the fetch poll interval.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Ring buffer capacity in interleaved samples.
    pub(crate) fn ring_buffer_capacity(&self, channels: usize) -> usize {
        self.ring_buffer_chunks.max(1) * CHUNK_SIZE * channels
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 2,
            ring_buffer_chunks: 64,
            poll_interval: Duration::from_millis(20),
        }
    }
}
