//! Integration tests for mic-stream.
//!
//! Note: Tests that require actual audio hardware are marked with
//! `#[ignore]` and should be run manually.

use std::io::Cursor;
use std::thread;
use std::time::Duration;

use mic_stream::{
    ChannelLayout, Format, MicStreamError, Microphone, MockSource, StreamConfig, Streamer,
    WavSink, CHUNK_SIZE,
};

/// Wraps `source` and starts capture.
fn started(source: MockSource, sample_rate: u32, channels: u16) -> Microphone<MockSource> {
    let mut mic = Microphone::with_source(source, sample_rate, channels).unwrap();
    mic.start().unwrap();
    mic
}

/// Reads three consecutive blocks of `size` pairs and checks the ramp never
/// skips, repeats or reorders a frame.
fn assert_ramp_continuity(size: usize) {
    let mut mic = started(MockSource::ramp(ChannelLayout::Stereo), 44100, 2);

    for call in 0..3 {
        let mut pairs = vec![[0.0; 2]; size];
        assert_eq!(mic.read(&mut pairs), (size, true));

        for (j, pair) in pairs.iter().enumerate() {
            let expected = (call * size + j) as f64;
            assert!((pair[0] - expected).abs() < 0.001, "left at {call}/{j}");
            assert!((pair[1] + expected).abs() < 0.001, "right at {call}/{j}");
        }
    }
}

#[test]
fn test_read_same_size_as_chunk() {
    assert_ramp_continuity(CHUNK_SIZE);
}

#[test]
fn test_read_smaller_than_chunk() {
    assert_ramp_continuity(100);
}

#[test]
fn test_read_between_one_and_two_chunks() {
    assert_ramp_continuity(CHUNK_SIZE + 100);
}

#[test]
fn test_read_double_chunk() {
    assert_ramp_continuity(CHUNK_SIZE * 2);
}

#[test]
fn test_read_odd_size() {
    assert_ramp_continuity(333);
}

#[test]
fn test_mono_and_stereo_channel_mapping() {
    let mut mono = started(MockSource::ramp(ChannelLayout::Mono), 44100, 1);
    let mut stereo = started(MockSource::ramp(ChannelLayout::Stereo), 44100, 2);

    let mut pairs = vec![[0.0; 2]; 600];
    assert_eq!(mono.read(&mut pairs), (600, true));
    assert!(pairs.iter().all(|p| p[0] == p[1]));

    assert_eq!(stereo.read(&mut pairs), (600, true));
    assert!(pairs.iter().skip(1).all(|p| p[0] == -p[1] && p[0] > 0.0));
}

#[test]
fn test_invalid_channel_counts_rejected() {
    for channels in [0u16, 3, 6] {
        let source = MockSource::ramp(ChannelLayout::Stereo);
        assert_eq!(
            Microphone::with_source(source, 44100, channels).err(),
            Some(MicStreamError::InvalidChannelCount { channels })
        );
    }
}

#[test]
fn test_channel_count_must_match_source_layout() {
    let stereo = Microphone::with_source(MockSource::ramp(ChannelLayout::Stereo), 44100, 1);
    assert_eq!(
        stereo.err(),
        Some(MicStreamError::ChannelMismatch {
            requested: 1,
            native: 2
        })
    );

    let mono = Microphone::with_source(MockSource::ramp(ChannelLayout::Mono), 44100, 2);
    assert_eq!(
        mono.err(),
        Some(MicStreamError::ChannelMismatch {
            requested: 2,
            native: 1
        })
    );
}

#[test]
fn test_read_before_start_ends_stream() {
    let source = MockSource::ramp(ChannelLayout::Stereo);
    let mut mic = Microphone::with_source(source, 44100, 2).unwrap();
    let mut pairs = vec![[0.0; 2]; 100];

    assert_eq!(mic.read(&mut pairs), (0, false));
    assert!(mic.last_error().is_some_and(MicStreamError::is_shutdown));
    assert_eq!(mic.source().fetch_count(), 1);
}

#[test]
fn test_open_default_rejects_channels_without_device() {
    // Must fail on the channel count even on machines without audio hardware.
    assert_eq!(
        Microphone::open_default(44100, 5).err(),
        Some(MicStreamError::InvalidChannelCount { channels: 5 })
    );
}

#[test]
fn test_fetch_schedule_for_small_reads() {
    let mut mic = started(MockSource::ramp(ChannelLayout::Stereo), 44100, 2);
    let mut pairs = vec![[0.0; 2]; 100];

    for _ in 0..5 {
        mic.read(&mut pairs);
    }
    assert_eq!(mic.source().fetch_count(), 1);

    mic.read(&mut pairs);
    assert_eq!(mic.source().fetch_count(), 2);
    assert_eq!(pairs[0], [500.0, -500.0]);
}

#[test]
fn test_large_read_fetches_twice() {
    let mut mic = started(MockSource::ramp(ChannelLayout::Stereo), 44100, 2);
    let mut pairs = vec![[0.0; 2]; 1024];

    assert_eq!(mic.read(&mut pairs), (1024, true));
    assert_eq!(mic.source().fetch_count(), 2);
}

#[test]
fn test_error_on_first_fetch_is_sticky() {
    let error = MicStreamError::Backend("error for testing".to_string());
    let source = MockSource::failing(ChannelLayout::Stereo, error.clone());
    let mut mic = started(source, 44100, 2);
    let mut pairs = vec![[0.0; 2]; 100];

    assert!(mic.last_error().is_none());
    assert_eq!(mic.read(&mut pairs), (0, false));
    assert_eq!(mic.last_error(), Some(&error));

    assert_eq!(mic.read(&mut pairs), (0, false));
    assert_eq!(mic.last_error(), Some(&error));
    assert_eq!(mic.source().fetch_count(), 1);

    let mut big = vec![[0.0; 2]; CHUNK_SIZE * 3];
    assert_eq!(mic.read(&mut big), (0, false));
    assert_eq!(mic.source().fetch_count(), 1);
}

#[test]
fn test_zero_length_read() {
    let mut mic = started(MockSource::ramp(ChannelLayout::Mono), 44100, 1);
    assert_eq!(mic.read(&mut []), (0, true));
    assert_eq!(mic.source().fetch_count(), 0);
}

#[test]
fn test_drain_failing_stream_into_wav() {
    let source = MockSource::sine(ChannelLayout::Stereo, 440.0, 16000)
        .fail_after(4, MicStreamError::Closed);
    let mut mic = started(source, 16000, 2);
    let format = mic.format();

    let mut cursor = Cursor::new(Vec::new());
    let mut sink = WavSink::new(&mut cursor, format).unwrap();
    let frames = sink.drain(&mut mic).unwrap();
    sink.finalize().unwrap();

    // Every full block before the failing fetch is kept.
    assert_eq!(frames, (CHUNK_SIZE * 4) as u64);
    assert!(mic.err().is_some_and(MicStreamError::is_shutdown));

    cursor.set_position(0);
    let mut reader = hound::WavReader::new(cursor).unwrap();
    assert_eq!(reader.spec().sample_rate, 16000);
    assert_eq!(reader.spec().channels, 2);
    assert_eq!(reader.duration(), (CHUNK_SIZE * 4) as u32);
    assert!(reader.samples::<i32>().any(|s| s.unwrap() > 0));
}

#[test]
fn test_wav_file_round_trip() {
    use tempfile::tempdir;

    let dir = tempdir().unwrap();
    let path = dir.path().join("test_output.wav");

    let source = MockSource::sine(ChannelLayout::Mono, 440.0, 8000)
        .fail_after(2, MicStreamError::NotRunning);
    let mut mic = started(source, 8000, 1);

    let mut sink = WavSink::create(&path, mic.format()).unwrap();
    sink.drain(&mut mic).unwrap();
    assert_eq!(sink.finalize().unwrap(), (CHUNK_SIZE * 2) as u64);

    let data = std::fs::read(&path).unwrap();
    assert_eq!(&data[0..4], b"RIFF");
    assert_eq!(&data[8..12], b"WAVE");

    let reader = hound::WavReader::open(&path).unwrap();
    assert_eq!(reader.spec().channels, 1);
    assert_eq!(reader.spec().bits_per_sample, 24);
    assert_eq!(reader.duration(), (CHUNK_SIZE * 2) as u32);
}

#[test]
fn test_format_matches_request() {
    let mic = Microphone::with_source(MockSource::silence(ChannelLayout::Mono), 22050, 1).unwrap();
    assert_eq!(mic.format(), Format::new(22050, ChannelLayout::Mono));
    assert_eq!(mic.format().frames_for(Duration::from_secs(2)), 44100);
}

/// This test requires actual audio hardware and should be run manually.
#[test]
#[ignore = "requires audio hardware"]
fn test_real_capture_stops_from_other_thread() {
    let device = mic_stream::AudioDevice::open_default().unwrap();
    let config = StreamConfig::new(44100, 2);
    let mut mic = Microphone::open(&device, &config).unwrap();
    let control = mic.control();

    mic.start().unwrap();
    let stopper = thread::spawn(move || {
        thread::sleep(Duration::from_millis(500));
        control.stop().unwrap();
        control.close().unwrap();
    });

    let mut pairs = vec![[0.0; 2]; 4410];
    let mut reads = 0;
    while mic.read(&mut pairs).1 {
        reads += 1;
    }
    stopper.join().unwrap();

    assert!(reads > 0, "Should have captured some audio");
    assert!(mic.last_error().is_some_and(MicStreamError::is_shutdown));
}
