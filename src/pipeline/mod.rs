//! Capture pipeline internals.
//!
//! The audio callback runs on a backend thread and never blocks; the reader
//! blocks in [`CaptureBuffer::fetch`] until a whole chunk is available.

mod ring_buffer;

pub(crate) use ring_buffer::{
    create_capture_buffer, CaptureBuffer, CaptureProducer, CaptureState, StreamState,
};
