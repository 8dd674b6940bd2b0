//! Pull-based stereo sample stream consumed by encoders.

use crate::MicStreamError;

/// A source of stereo sample pairs pulled by the consumer.
///
/// `stream` fills `samples` from the front and returns how many pairs were
/// written and whether the stream can continue. Once it returns `false` the
/// stream is drained; `err` then tells an error apart from a clean end.
pub trait Streamer {
    /// Fills `samples` with the next pairs.
    fn stream(&mut self, samples: &mut [[f64; 2]]) -> (usize, bool);

    /// Returns the error that ended the stream, if any.
    fn err(&self) -> Option<&MicStreamError>;
}

impl<T: Streamer + ?Sized> Streamer for &mut T {
    fn stream(&mut self, samples: &mut [[f64; 2]]) -> (usize, bool) {
        (**self).stream(samples)
    }

    fn err(&self) -> Option<&MicStreamError> {
        (**self).err()
    }
}
