//! cpal device wrapper and hardware device session.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig as CpalStreamConfig};

use crate::chunk::{ChannelLayout, Chunk};
use crate::format::{i16_to_f32, u16_to_f32};
use crate::pipeline::{
    create_capture_buffer, CaptureBuffer, CaptureProducer, CaptureState, StreamState,
};
use crate::source::InputStream;
use crate::{MicStreamError, StreamConfig};

/// Native sample formats we can read, in order of preference.
const SUPPORTED_FORMATS: [SampleFormat; 3] =
    [SampleFormat::F32, SampleFormat::I16, SampleFormat::U16];

/// Wrapper around a cpal audio input device.
///
/// This handles device selection and format negotiation. Open a
/// [`DeviceSession`] on it to capture.
#[must_use]
pub struct AudioDevice {
    device: Device,
}

impl AudioDevice {
    /// Opens the default input device.
    ///
    /// # Errors
    ///
    /// Returns `NoDefaultDevice` if no default input device is configured.
    pub fn open_default() -> Result<Self, MicStreamError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(MicStreamError::NoDefaultDevice)?;

        Ok(Self { device })
    }

    /// Opens a specific input device by name.
    ///
    /// # Errors
    ///
    /// Returns `DeviceNotFound` if no device with the given name exists.
    pub fn open_by_name(name: &str) -> Result<Self, MicStreamError> {
        let host = cpal::default_host();
        let devices = host.input_devices().map_err(MicStreamError::backend)?;

        for device in devices {
            if let Ok(device_name) = device.name() {
                if device_name == name {
                    return Ok(Self { device });
                }
            }
        }

        Err(MicStreamError::DeviceNotFound {
            name: name.to_string(),
        })
    }

    /// Returns the device name.
    pub fn name(&self) -> String {
        self.device.name().unwrap_or_else(|_| "unknown".to_string())
    }

    /// Returns the device's default capture format (sample rate, channels).
    pub fn native_config(&self) -> Result<(u32, u16), MicStreamError> {
        let config = self
            .device
            .default_input_config()
            .map_err(MicStreamError::backend)?;
        Ok((config.sample_rate().0, config.channels()))
    }

    /// Picks the native sample format to capture `channels` at `sample_rate`.
    fn negotiate(&self, sample_rate: u32, channels: u16) -> Result<SampleFormat, MicStreamError> {
        let ranges: Vec<_> = self
            .device
            .supported_input_configs()
            .map_err(MicStreamError::backend)?
            .filter(|range| range.channels() == channels)
            .collect();

        if ranges.is_empty() {
            return Err(MicStreamError::UnsupportedFormat {
                format: format!("{channels}-channel input"),
            });
        }

        let covering: Vec<_> = ranges
            .iter()
            .filter(|range| {
                range.min_sample_rate().0 <= sample_rate && sample_rate <= range.max_sample_rate().0
            })
            .collect();

        if covering.is_empty() {
            let mut available: Vec<u32> = ranges
                .iter()
                .flat_map(|range| [range.min_sample_rate().0, range.max_sample_rate().0])
                .collect();
            available.sort_unstable();
            available.dedup();
            return Err(MicStreamError::UnsupportedSampleRate {
                requested: sample_rate,
                available,
            });
        }

        SUPPORTED_FORMATS
            .into_iter()
            .find(|format| covering.iter().any(|range| range.sample_format() == *format))
            .ok_or_else(|| MicStreamError::UnsupportedFormat {
                format: format!("{:?}", covering[0].sample_format()),
            })
    }
}

/// Reply channel for a control command.
type Reply = mpsc::SyncSender<Result<(), MicStreamError>>;

/// Commands executed by the thread that owns the cpal stream.
enum Command {
    Play(Reply),
    Pause(Reply),
    Close(Reply),
}

/// Cross-thread handle that starts, stops and closes a [`DeviceSession`].
///
/// `stop` and `close` wake a reader blocked in a fetch, so this is what a
/// signal handler should hold.
///
/// # Example
///
/// ```no_run
/// use mic_stream::Microphone;
///
/// let (mut mic, _format) = Microphone::open_default(44100, 2)?;
/// let control = mic.control();
/// std::thread::spawn(move || {
///     std::thread::sleep(std::time::Duration::from_secs(5));
///     let _ = control.stop();
///     let _ = control.close();
/// });
/// mic.start()?;
/// let mut pairs = vec![[0.0; 2]; 1024];
/// while mic.read(&mut pairs).1 {}
/// # Ok::<(), mic_stream::MicStreamError>(())
/// ```
#[derive(Clone)]
pub struct StreamControl {
    state: Arc<CaptureState>,
    commands: mpsc::Sender<Command>,
}

impl StreamControl {
    /// Begins hardware capture.
    ///
    /// # Errors
    ///
    /// Returns `Closed` after `close`, or the backend error if the stream
    /// refuses to play.
    pub fn start(&self) -> Result<(), MicStreamError> {
        if self.state.current() == StreamState::Closed {
            return Err(MicStreamError::Closed);
        }
        self.send(Command::Play)?;
        self.state.transition(StreamState::Running);
        tracing::info!("Capture started");
        Ok(())
    }

    /// Pauses capture. A reader blocked in a fetch returns.
    ///
    /// # Errors
    ///
    /// Returns `Closed` if the stream was already closed.
    pub fn stop(&self) -> Result<(), MicStreamError> {
        // Release the reader before waiting on the backend.
        self.state.transition(StreamState::Stopped);
        self.send(Command::Pause)?;
        tracing::info!("Capture stopped");
        Ok(())
    }

    /// Releases the native stream. A reader blocked in a fetch returns.
    ///
    /// # Errors
    ///
    /// Returns `Closed` if the stream was already closed.
    pub fn close(&self) -> Result<(), MicStreamError> {
        self.state.transition(StreamState::Closed);
        self.send(Command::Close)?;
        tracing::info!("Input stream closed");
        Ok(())
    }

    /// Returns `true` while capture is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state.current() == StreamState::Running
    }

    fn send(&self, command: fn(Reply) -> Command) -> Result<(), MicStreamError> {
        let (reply_tx, reply_rx) = mpsc::sync_channel(1);
        self.commands
            .send(command(reply_tx))
            .map_err(|_| MicStreamError::Closed)?;
        reply_rx.recv().map_err(|_| MicStreamError::Closed)?
    }
}

/// A cpal input stream delivering fixed-size chunks.
///
/// The cpal stream lives on a dedicated thread (cpal streams are not `Send`);
/// its callback feeds a ring buffer that [`read`](InputStream::read) drains
/// one chunk at a time. Dropping the session closes it.
pub struct DeviceSession {
    buffer: CaptureBuffer,
    control: StreamControl,
    layout: ChannelLayout,
    sample_rate: u32,
}

impl DeviceSession {
    /// Opens an input stream on `device`.
    ///
    /// The channel count is validated before the device is touched.
    ///
    /// # Errors
    ///
    /// - `InvalidChannelCount` unless `config.channels` is 1 or 2
    /// - `UnsupportedSampleRate` / `UnsupportedFormat` if the device can't
    ///   capture the requested configuration
    /// - `Backend` if cpal fails to build the stream
    pub fn open(device: &AudioDevice, config: &StreamConfig) -> Result<Self, MicStreamError> {
        let layout = ChannelLayout::try_from(config.channels)?;
        let sample_format = device.negotiate(config.sample_rate, config.channels)?;
        tracing::debug!(
            device = %device.name(),
            ?sample_format,
            "Negotiated native sample format"
        );

        let state = Arc::new(CaptureState::new());
        let (producer, buffer) = create_capture_buffer(
            config.ring_buffer_capacity(layout.count()),
            layout,
            config.poll_interval,
            Arc::clone(&state),
        );

        let cpal_config = CpalStreamConfig {
            channels: config.channels,
            sample_rate: cpal::SampleRate(config.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };
        let commands = spawn_stream_thread(
            device.device.clone(),
            cpal_config,
            sample_format,
            producer,
            Arc::clone(&state),
        )?;

        tracing::info!(
            device = %device.name(),
            sample_rate = config.sample_rate,
            channels = config.channels,
            "Opened input stream"
        );

        Ok(Self {
            buffer,
            control: StreamControl { state, commands },
            layout,
            sample_rate: config.sample_rate,
        })
    }

    /// Opens an input stream on the default input device.
    ///
    /// # Errors
    ///
    /// Returns `InvalidChannelCount` before looking up the device, then any
    /// error from [`AudioDevice::open_default`] or [`DeviceSession::open`].
    pub fn open_default(config: &StreamConfig) -> Result<Self, MicStreamError> {
        ChannelLayout::try_from(config.channels)?;
        let device = AudioDevice::open_default()?;
        Self::open(&device, config)
    }

    /// Returns a handle that controls this session from any thread.
    #[must_use]
    pub fn control(&self) -> StreamControl {
        self.control.clone()
    }

    /// Returns the sample rate in Hz.
    #[must_use]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Returns the number of captured frames waiting to be fetched.
    #[must_use]
    pub fn buffered_frames(&self) -> usize {
        self.buffer.available() / self.layout.count()
    }
}

impl InputStream for DeviceSession {
    fn layout(&self) -> ChannelLayout {
        self.layout
    }

    fn start(&mut self) -> Result<(), MicStreamError> {
        self.control.start()
    }

    fn stop(&mut self) -> Result<(), MicStreamError> {
        self.control.stop()
    }

    fn read(&mut self, chunk: &mut Chunk) -> Result<(), MicStreamError> {
        self.buffer.fetch(chunk)
    }

    fn close(&mut self) -> Result<(), MicStreamError> {
        self.control.close()
    }
}

impl Drop for DeviceSession {
    fn drop(&mut self) {
        if self.control.state.current() != StreamState::Closed {
            let _ = self.control.close();
        }
    }
}

/// Builds the cpal stream on its own thread and serves control commands.
///
/// Returns once the stream is built, with the build error if it failed.
fn spawn_stream_thread(
    device: Device,
    config: CpalStreamConfig,
    sample_format: SampleFormat,
    producer: CaptureProducer,
    state: Arc<CaptureState>,
) -> Result<mpsc::Sender<Command>, MicStreamError> {
    let (ready_tx, ready_rx) = mpsc::sync_channel(1);
    let (command_tx, command_rx) = mpsc::channel::<Command>();

    thread::Builder::new()
        .name("mic-stream".to_string())
        .spawn(move || {
            let stream = match build_stream(&device, &config, sample_format, producer, &state) {
                Ok(stream) => {
                    let _ = ready_tx.send(Ok(()));
                    stream
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };

            let mut close_reply = None;
            for command in command_rx {
                match command {
                    Command::Play(reply) => {
                        let _ = reply.send(stream.play().map_err(MicStreamError::backend));
                    }
                    Command::Pause(reply) => {
                        let _ = reply.send(stream.pause().map_err(MicStreamError::backend));
                    }
                    Command::Close(reply) => {
                        close_reply = Some(reply);
                        break;
                    }
                }
            }

            // Dropping the stream releases the device.
            drop(stream);
            state.transition(StreamState::Closed);
            if let Some(reply) = close_reply {
                let _ = reply.send(Ok(()));
            }
        })
        .map_err(MicStreamError::backend)?;

    ready_rx
        .recv()
        .map_err(|_| MicStreamError::backend("stream thread exited before the stream was built"))??;

    Ok(command_tx)
}

fn build_stream(
    device: &Device,
    config: &CpalStreamConfig,
    sample_format: SampleFormat,
    mut producer: CaptureProducer,
    state: &Arc<CaptureState>,
) -> Result<Stream, MicStreamError> {
    let error_state = Arc::clone(state);
    let on_error = move |err: cpal::StreamError| {
        tracing::error!("Audio stream error: {}", err);
        error_state.fail(err.to_string());
    };

    let stream = match sample_format {
        SampleFormat::F32 => device.build_input_stream(
            config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| producer.push_slice(data),
            on_error,
            None,
        ),
        SampleFormat::I16 => device.build_input_stream(
            config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                producer.push_iter(data.iter().map(|&s| i16_to_f32(s)));
            },
            on_error,
            None,
        ),
        SampleFormat::U16 => device.build_input_stream(
            config,
            move |data: &[u16], _: &cpal::InputCallbackInfo| {
                producer.push_iter(data.iter().map(|&s| u16_to_f32(s)));
            },
            on_error,
            None,
        ),
        format => {
            return Err(MicStreamError::UnsupportedFormat {
                format: format!("{format:?}"),
            });
        }
    };

    stream.map_err(MicStreamError::backend)
}
