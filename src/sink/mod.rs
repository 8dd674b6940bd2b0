//! Destinations that drain a [`Streamer`](crate::Streamer).
//!
//! - [`WavSink`]: encodes the stream into a WAV file or any seekable writer

mod wav;

pub use wav::WavSink;
