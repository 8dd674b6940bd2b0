//! Mock input stream for testing without hardware.

use crate::chunk::{ChannelLayout, Chunk, CHUNK_SIZE};
use crate::source::InputStream;
use crate::MicStreamError;

/// Signal produced by a [`MockSource`].
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    /// Running frame index: channel 0 carries `i`, channel 1 carries `-i`.
    Ramp,
    /// All zeros.
    Silence,
    /// A unit-amplitude sine wave on every channel.
    Sine {
        /// Frequency in Hz.
        frequency: f64,
        /// Sample rate the wave is generated at.
        sample_rate: u32,
    },
}

/// A scripted input stream that generates synthetic chunks.
///
/// This allows exercising a [`Microphone`](crate::Microphone) without audio
/// hardware. Like a device session, it only delivers chunks between
/// `start` and `stop`; a `read` outside that window fails with
/// `NotRunning`. Every `read` on an open mock counts as a fetch, including
/// failed ones.
///
/// # Example
///
/// ```
/// use mic_stream::{ChannelLayout, Microphone, MicStreamError, MockSource};
///
/// let source = MockSource::ramp(ChannelLayout::Stereo)
///     .fail_after(1, MicStreamError::Backend("unplugged".into()));
/// let mut mic = Microphone::with_source(source, 44100, 2)?;
/// mic.start()?;
///
/// let mut pairs = vec![[0.0; 2]; 100];
/// assert_eq!(mic.read(&mut pairs), (100, true));
/// assert_eq!(pairs[99], [99.0, -99.0]);
/// # Ok::<(), MicStreamError>(())
/// ```
pub struct MockSource {
    layout: ChannelLayout,
    signal: Signal,
    next_frame: u64,
    fetches: usize,
    failure: Option<(usize, MicStreamError)>,
    running: bool,
    closed: bool,
}

impl MockSource {
    /// Creates a mock source generating `signal`.
    #[must_use]
    pub fn new(layout: ChannelLayout, signal: Signal) -> Self {
        Self {
            layout,
            signal,
            next_frame: 0,
            fetches: 0,
            failure: None,
            running: false,
            closed: false,
        }
    }

    /// Creates a mock source whose samples count the frame index.
    #[must_use]
    pub fn ramp(layout: ChannelLayout) -> Self {
        Self::new(layout, Signal::Ramp)
    }

    /// Creates a silent mock source.
    #[must_use]
    pub fn silence(layout: ChannelLayout) -> Self {
        Self::new(layout, Signal::Silence)
    }

    /// Creates a mock source generating a sine wave.
    #[must_use]
    pub fn sine(layout: ChannelLayout, frequency: f64, sample_rate: u32) -> Self {
        Self::new(
            layout,
            Signal::Sine {
                frequency,
                sample_rate,
            },
        )
    }

    /// Creates a mock source whose every fetch fails with `error`.
    #[must_use]
    pub fn failing(layout: ChannelLayout, error: MicStreamError) -> Self {
        Self::silence(layout).fail_after(0, error)
    }

    /// Lets `fetches` fetches succeed, then fails every later one with `error`.
    #[must_use]
    pub fn fail_after(mut self, fetches: usize, error: MicStreamError) -> Self {
        self.failure = Some((fetches, error));
        self
    }

    /// Returns the number of fetches attempted so far.
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetches
    }

    /// Returns `true` between `start` and `stop`.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Returns `true` once `close` has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn sample(&self, frame: u64, channel: usize) -> f32 {
        match self.signal {
            Signal::Ramp if channel == 0 => frame as f32,
            Signal::Ramp => -(frame as f32),
            Signal::Silence => 0.0,
            Signal::Sine {
                frequency,
                sample_rate,
            } => {
                let t = frame as f64 / f64::from(sample_rate);
                (2.0 * std::f64::consts::PI * frequency * t).sin() as f32
            }
        }
    }
}

impl InputStream for MockSource {
    fn layout(&self) -> ChannelLayout {
        self.layout
    }

    fn start(&mut self) -> Result<(), MicStreamError> {
        if self.closed {
            return Err(MicStreamError::Closed);
        }
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), MicStreamError> {
        if self.closed {
            return Err(MicStreamError::Closed);
        }
        self.running = false;
        Ok(())
    }

    fn read(&mut self, chunk: &mut Chunk) -> Result<(), MicStreamError> {
        if self.closed {
            return Err(MicStreamError::Closed);
        }
        self.fetches += 1;
        if !self.running {
            return Err(MicStreamError::NotRunning);
        }
        if let Some((succeed, error)) = &self.failure {
            if self.fetches > *succeed {
                return Err(error.clone());
            }
        }

        for channel in 0..self.layout.count() {
            for i in 0..CHUNK_SIZE {
                chunk.channel_mut(channel)[i] =
                    self.sample(self.next_frame + i as u64, channel);
            }
        }
        self.next_frame += CHUNK_SIZE as u64;
        Ok(())
    }

    fn close(&mut self) -> Result<(), MicStreamError> {
        if self.closed {
            return Err(MicStreamError::Closed);
        }
        self.running = false;
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ramp_fills_consecutive_frames() {
        let mut mock = MockSource::ramp(ChannelLayout::Stereo);
        let mut chunk = Chunk::new(ChannelLayout::Stereo);
        mock.start().unwrap();

        mock.read(&mut chunk).unwrap();
        assert_eq!(chunk.pair(0), [0.0, 0.0]);
        assert_eq!(chunk.pair(511), [511.0, -511.0]);

        mock.read(&mut chunk).unwrap();
        assert_eq!(chunk.pair(0), [512.0, -512.0]);
        assert_eq!(mock.fetch_count(), 2);
    }

    #[test]
    fn test_sine_has_both_polarities() {
        let mut mock = MockSource::sine(ChannelLayout::Mono, 440.0, 16000);
        let mut chunk = Chunk::new(ChannelLayout::Mono);
        mock.start().unwrap();
        mock.read(&mut chunk).unwrap();

        assert!(chunk.channel(0).iter().any(|&s| s > 0.5));
        assert!(chunk.channel(0).iter().any(|&s| s < -0.5));
    }

    #[test]
    fn test_fail_after_counts_failed_fetches() {
        let error = MicStreamError::Backend("boom".to_string());
        let mut mock = MockSource::ramp(ChannelLayout::Mono).fail_after(1, error.clone());
        let mut chunk = Chunk::new(ChannelLayout::Mono);
        mock.start().unwrap();

        assert!(mock.read(&mut chunk).is_ok());
        assert_eq!(mock.read(&mut chunk), Err(error.clone()));
        assert_eq!(mock.read(&mut chunk), Err(error));
        assert_eq!(mock.fetch_count(), 3);
    }

    #[test]
    fn test_read_requires_start() {
        let mut mock = MockSource::ramp(ChannelLayout::Stereo);
        let mut chunk = Chunk::new(mock.layout());
        assert_eq!(mock.read(&mut chunk), Err(MicStreamError::NotRunning));

        mock.start().unwrap();
        mock.read(&mut chunk).unwrap();
        assert_eq!(chunk.pair(1), [1.0, -1.0]);

        mock.stop().unwrap();
        assert_eq!(mock.read(&mut chunk), Err(MicStreamError::NotRunning));
        assert_eq!(mock.fetch_count(), 3);
    }

    #[test]
    fn test_lifecycle() {
        let mut mock = MockSource::silence(ChannelLayout::Mono);
        mock.start().unwrap();
        assert!(mock.is_running());
        mock.stop().unwrap();
        assert!(!mock.is_running());
        mock.close().unwrap();
        assert!(mock.is_closed());

        assert_eq!(mock.stop(), Err(MicStreamError::Closed));
        let mut chunk = Chunk::new(ChannelLayout::Mono);
        assert_eq!(mock.read(&mut chunk), Err(MicStreamError::Closed));
        assert_eq!(mock.fetch_count(), 0);
    }
}
