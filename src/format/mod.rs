//! Stream format descriptor and native sample conversion.

mod convert;

pub use convert::{i16_to_f32, u16_to_f32};
pub(crate) use convert::f64_to_int;

use std::time::Duration;

use crate::chunk::ChannelLayout;

/// Precision, in bytes per sample, advertised for microphone streams.
///
/// The device does not report its real precision; 3 bytes (24-bit) is the
/// highest integer precision common WAV writers accept.
pub const DEFAULT_PRECISION: u16 = 3;

/// Output contract of a stream, fixed for its lifetime.
///
/// # Example
///
/// ```
/// use mic_stream::{ChannelLayout, Format};
/// use std::time::Duration;
///
/// let format = Format::new(44100, ChannelLayout::Stereo);
/// assert_eq!(format.channels, 2);
/// assert_eq!(format.frames_for(Duration::from_secs(1)), 44100);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Format {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Number of channels (1 = mono, 2 = stereo).
    pub channels: u16,
    /// Bytes per sample when the stream is persisted.
    pub precision: u16,
}

impl Format {
    /// Creates a format with the default precision.
    #[must_use]
    pub fn new(sample_rate: u32, layout: ChannelLayout) -> Self {
        Self {
            sample_rate,
            channels: layout.into(),
            precision: DEFAULT_PRECISION,
        }
    }

    /// Returns bits per sample derived from the precision.
    #[must_use]
    pub fn bits_per_sample(&self) -> u16 {
        self.precision * 8
    }

    /// Returns the duration of `frames` stereo pairs.
    #[must_use]
    pub fn duration(&self, frames: u64) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(frames as f64 / f64::from(self.sample_rate))
    }

    /// Returns the number of frames covering `duration`.
    #[must_use]
    pub fn frames_for(&self, duration: Duration) -> u64 {
        (f64::from(self.sample_rate) * duration.as_secs_f64()).round() as u64
    }
}
