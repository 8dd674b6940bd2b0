//! Error types for mic-stream.
//!
//! Errors are split into two categories:
//! - **Stream errors** ([`MicStreamError`]): raised by the device session. A
//!   failure during a fetch is latched by the [`Microphone`](crate::Microphone)
//!   and reported by every later read.
//! - **Sink errors** ([`SinkError`]): raised while encoding a drained stream.

use std::path::PathBuf;

/// Errors raised while opening, controlling or reading an input stream.
///
/// The type is `Clone` and `PartialEq` so the latched error of a failed
/// stream can be handed out repeatedly and compared in tests.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MicStreamError {
    /// The requested channel count is not mono or stereo.
    #[error("invalid channel count {channels}: expected 1 or 2")]
    InvalidChannelCount {
        /// The rejected channel count.
        channels: u16,
    },

    /// No default input device is configured on this system.
    #[error("no default input device configured")]
    NoDefaultDevice,

    /// The requested audio device was not found.
    #[error("device not found: {name}")]
    DeviceNotFound {
        /// Name of the device that wasn't found.
        name: String,
    },

    /// The requested channel count differs from the source's own layout.
    #[error("requested {requested} channels but the source delivers {native}")]
    ChannelMismatch {
        /// The channel count asked for.
        requested: u16,
        /// The channel count the source fills per chunk.
        native: u16,
    },

    /// The device only offers sample formats this crate cannot read.
    #[error("unsupported sample format: {format}")]
    UnsupportedFormat {
        /// The format that wasn't supported.
        format: String,
    },

    /// The requested sample rate is not supported by the device.
    #[error("sample rate {requested}Hz not supported (available: {available:?})")]
    UnsupportedSampleRate {
        /// The requested sample rate.
        requested: u32,
        /// Sample rate bounds the device advertises for the channel count.
        available: Vec<u32>,
    },

    /// An error from the underlying audio library (cpal).
    #[error("audio backend error: {0}")]
    Backend(String),

    /// Capture is not running and no complete chunk is buffered.
    #[error("stream is not running")]
    NotRunning,

    /// The stream has been closed.
    #[error("stream is closed")]
    Closed,
}

impl MicStreamError {
    /// Wraps any backend error by its display text.
    pub(crate) fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }

    /// Returns `true` for errors caused by stopping or closing the stream
    /// rather than by a device failure.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        matches!(self, Self::NotRunning | Self::Closed)
    }
}

/// Errors that can occur while writing a drained stream to a sink.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// File I/O error.
    #[error("file error: {path}: {source}")]
    FileError {
        /// Path to the file.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The format's precision can't be encoded as integer PCM.
    #[error("unsupported precision: {0} bytes per sample (expected 1-4)")]
    UnsupportedPrecision(u16),

    /// The WAV encoder rejected a write.
    #[error("encode failed: {0}")]
    Encode(#[from] hound::Error),
}

impl SinkError {
    /// Creates a file error for the given path.
    pub fn file_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileError {
            path: path.into(),
            source,
        }
    }
}
