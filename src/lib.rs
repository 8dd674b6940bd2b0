//! # mic-stream
//!
//! **Note:** This crate is under active development. The API may change before 1.0.
//!
//! Blocking, pull-based microphone capture.
//!
//! `mic-stream` turns a cpal input device into a [`Streamer`]: a source of
//! stereo `f64` pairs that fills any caller-sized buffer completely, however
//! the device happens to chunk its audio. A device failure is latched, so a
//! consumer draining the stream sees a clean end and can ask why.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mic_stream::{Microphone, WavSink};
//!
//! let (mut mic, format) = Microphone::open_default(44100, 2)?;
//!
//! // Stop from another thread (e.g. a Ctrl-C handler) to end the recording.
//! let control = mic.control();
//!
//! let mut sink = WavSink::create("recording.wav", format)?;
//! mic.start()?;
//! sink.drain(&mut mic)?;   // blocks until `control.stop()` / `control.close()`
//! sink.finalize()?;
//!
//! if let Some(err) = mic.last_error() {
//!     tracing::info!(%err, "capture ended");
//! }
//! # drop(control);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - **cpal thread**: owns the stream; its callback pushes interleaved
//!   samples into a lock-free ring buffer and never blocks
//! - **Device session**: [`DeviceSession`] blocks until a whole
//!   [`CHUNK_SIZE`] chunk is buffered and de-interleaves it
//! - **Microphone**: [`Microphone`] hands chunk columns out as stereo pairs,
//!   fetching again whenever the current chunk is drained
//!
//! Tests swap the device session for a [`MockSource`].

// unsafe_code lint is configured in Cargo.toml as "deny"
#![warn(missing_docs)]
// Audio code requires intentional numeric casts between sample formats
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    clippy::cast_lossless
)]
// unwrap/expect are for tests only
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]
// These doc lints are too strict for internal implementation details
#![allow(clippy::missing_panics_doc, clippy::missing_errors_doc)]

mod chunk;
mod config;
mod error;
pub mod format;
mod microphone;
mod pipeline;
mod sink;
pub mod source;
mod streamer;

pub use chunk::{ChannelLayout, Chunk, CHUNK_SIZE};
pub use config::StreamConfig;
pub use error::{MicStreamError, SinkError};
pub use format::Format;
pub use microphone::Microphone;
pub use sink::WavSink;
pub use source::{
    default_input_device_name, list_input_devices, AudioDevice, DeviceSession, InputStream,
    MockSource, Signal, StreamControl,
};
pub use streamer::Streamer;
