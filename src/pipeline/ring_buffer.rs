//! Ring buffer between the audio callback and the blocking fetch.
//!
//! The callback side ([`CaptureProducer`]) never blocks: it pushes what fits
//! and counts the rest as dropped. The reader side ([`CaptureBuffer`]) waits
//! on a condition variable until a whole chunk is buffered or the stream
//! leaves the running state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};

use crate::chunk::{ChannelLayout, Chunk, CHUNK_SIZE};
use crate::MicStreamError;

/// Lifecycle of a capture stream as seen by the reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum StreamState {
    /// Opened, never started.
    Idle,
    Running,
    Stopped,
    Closed,
    /// The backend reported an error.
    Failed(String),
}

/// State shared by the callback, the control handle and the reader.
pub(crate) struct CaptureState {
    state: Mutex<StreamState>,
    ready: Condvar,
    dropped_samples: AtomicU64,
}

impl CaptureState {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StreamState::Idle),
            ready: Condvar::new(),
            dropped_samples: AtomicU64::new(0),
        }
    }

    /// Moves to `next` and wakes any blocked reader.
    ///
    /// `Closed` and `Failed` are final; later transitions are ignored.
    pub fn transition(&self, next: StreamState) {
        let mut state = self.state.lock();
        if matches!(*state, StreamState::Closed | StreamState::Failed(_)) {
            return;
        }
        *state = next;
        drop(state);
        self.ready.notify_all();
    }

    pub fn fail(&self, reason: impl Into<String>) {
        self.transition(StreamState::Failed(reason.into()));
    }

    pub fn current(&self) -> StreamState {
        self.state.lock().clone()
    }

    /// Wakes the reader without changing state.
    fn notify(&self) {
        self.ready.notify_one();
    }
}

/// Callback side of the capture buffer.
pub(crate) struct CaptureProducer {
    producer: HeapProd<f32>,
    state: Arc<CaptureState>,
}

impl CaptureProducer {
    /// Pushes interleaved f32 samples, dropping what doesn't fit.
    pub fn push_slice(&mut self, samples: &[f32]) {
        let pushed = self.producer.push_slice(samples);
        self.record_drops(samples.len() - pushed);
        self.state.notify();
    }

    /// Pushes samples converted on the fly, dropping what doesn't fit.
    pub fn push_iter(&mut self, samples: impl Iterator<Item = f32>) {
        let mut dropped = 0;
        for sample in samples {
            if self.producer.try_push(sample).is_err() {
                dropped += 1;
            }
        }
        self.record_drops(dropped);
        self.state.notify();
    }

    fn record_drops(&self, dropped: usize) {
        if dropped > 0 {
            self.state
                .dropped_samples
                .fetch_add(dropped as u64, Ordering::Relaxed);
        }
    }
}

/// Reader side of the capture buffer.
pub(crate) struct CaptureBuffer {
    consumer: HeapCons<f32>,
    state: Arc<CaptureState>,
    scratch: Vec<f32>,
    poll_interval: Duration,
}

impl CaptureBuffer {
    /// Blocks until one chunk is buffered and de-interleaves it into `chunk`.
    ///
    /// A chunk that was fully captured before `stop` is still delivered.
    ///
    /// # Errors
    ///
    /// - `Closed` once the stream is closed
    /// - `Backend` once the callback reported a failure
    /// - `NotRunning` if capture is not running and no full chunk is buffered
    pub fn fetch(&mut self, chunk: &mut Chunk) -> Result<(), MicStreamError> {
        let needed = self.scratch.len();
        let mut state = self.state.state.lock();
        loop {
            match &*state {
                StreamState::Closed => return Err(MicStreamError::Closed),
                StreamState::Failed(reason) => return Err(MicStreamError::Backend(reason.clone())),
                _ => {}
            }
            if self.consumer.occupied_len() >= needed {
                break;
            }
            if *state != StreamState::Running {
                return Err(MicStreamError::NotRunning);
            }
            // The callback notifies without the lock, so a wake-up can be
            // missed; the timeout bounds how long that costs.
            self.state.ready.wait_for(&mut state, self.poll_interval);
        }
        drop(state);

        self.report_drops();
        let popped = self.consumer.pop_slice(&mut self.scratch);
        debug_assert_eq!(popped, needed);
        chunk.fill_interleaved(&self.scratch);
        Ok(())
    }

    /// Returns the number of samples currently buffered.
    pub fn available(&self) -> usize {
        self.consumer.occupied_len()
    }

    fn report_drops(&self) {
        let dropped = self.state.dropped_samples.swap(0, Ordering::Relaxed);
        if dropped > 0 {
            tracing::warn!(
                dropped_samples = dropped,
                "Capture buffer overflowed - reader is slower than the device"
            );
        }
    }
}

/// Creates a capture buffer pair.
///
/// Returns a producer (for the audio callback) and a `CaptureBuffer` (for the
/// reader), both bound to `state`.
pub(crate) fn create_capture_buffer(
    capacity: usize,
    layout: ChannelLayout,
    poll_interval: Duration,
    state: Arc<CaptureState>,
) -> (CaptureProducer, CaptureBuffer) {
    let chunk_samples = CHUNK_SIZE * layout.count();
    let ring_buffer = HeapRb::<f32>::new(capacity.max(chunk_samples));
    let (producer, consumer) = ring_buffer.split();

    (
        CaptureProducer {
            producer,
            state: Arc::clone(&state),
        },
        CaptureBuffer {
            consumer,
            state,
            scratch: vec![0.0; chunk_samples],
            poll_interval,
        },
    )
}
