//! Device sessions: the capability that fills a [`Chunk`] per fetch.
//!
//! [`DeviceSession`] wraps a cpal input stream; [`MockSource`] is a scripted
//! stand-in for tests. Both implement [`InputStream`], which is all the
//! [`Microphone`](crate::Microphone) needs.

mod device;
mod mock;

pub use device::{AudioDevice, DeviceSession, StreamControl};
pub use mock::{MockSource, Signal};

use cpal::traits::{DeviceTrait, HostTrait};

use crate::chunk::{ChannelLayout, Chunk};
use crate::MicStreamError;

/// A native input stream delivering fixed-size chunks.
///
/// `read` is the only operation allowed to block. Implementations must make
/// `stop` and `close` (or an equivalent cross-thread handle) release a
/// blocked `read`.
pub trait InputStream: Send {
    /// Returns the layout of the chunks `read` fills.
    fn layout(&self) -> ChannelLayout;

    /// Begins capture.
    fn start(&mut self) -> Result<(), MicStreamError>;

    /// Pauses capture without releasing resources.
    fn stop(&mut self) -> Result<(), MicStreamError>;

    /// Blocks until the next [`CHUNK_SIZE`](crate::CHUNK_SIZE) frames are
    /// available and overwrites `chunk` with them.
    fn read(&mut self, chunk: &mut Chunk) -> Result<(), MicStreamError>;

    /// Releases the native stream.
    fn close(&mut self) -> Result<(), MicStreamError>;
}

impl<S: InputStream + ?Sized> InputStream for Box<S> {
    fn layout(&self) -> ChannelLayout {
        (**self).layout()
    }

    fn start(&mut self) -> Result<(), MicStreamError> {
        (**self).start()
    }

    fn stop(&mut self) -> Result<(), MicStreamError> {
        (**self).stop()
    }

    fn read(&mut self, chunk: &mut Chunk) -> Result<(), MicStreamError> {
        (**self).read(chunk)
    }

    fn close(&mut self) -> Result<(), MicStreamError> {
        (**self).close()
    }
}

/// Lists all available input devices.
///
/// # Errors
///
/// Returns an error if the audio host cannot be accessed.
pub fn list_input_devices() -> Result<Vec<String>, MicStreamError> {
    let host = cpal::default_host();
    let devices = host.input_devices().map_err(MicStreamError::backend)?;

    Ok(devices.filter_map(|d| d.name().ok()).collect())
}

/// Gets the name of the default input device, if any.
pub fn default_input_device_name() -> Option<String> {
    cpal::default_host()
        .default_input_device()
        .and_then(|d| d.name().ok())
}
