//! Microphone recording example.
//!
//! Records the default input device to a WAV file until Ctrl-C.
//!
//! Run with: cargo run --example record -- <output file>

use mic_stream::{Microphone, WavSink};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for debug output
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("mic_stream=info".parse()?))
        .init();

    let Some(mut filename) = std::env::args().nth(1) else {
        println!("missing required argument: output file name");
        return Ok(());
    };
    if !filename.ends_with(".wav") {
        filename.push_str(".wav");
    }

    let (mut mic, format) = Microphone::open_default(44100, 2)?;
    let mut sink = WavSink::create(&filename, format)?;

    // Stop the stream when the user presses Ctrl-C. This releases the
    // blocked read below, which ends the drain.
    let control = mic.control();
    std::thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_io()
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => {
                tracing::error!("failed to start signal runtime: {e}");
                return;
            }
        };
        if runtime.block_on(tokio::signal::ctrl_c()).is_ok() {
            let _ = control.stop();
            let _ = control.close();
        }
    });

    println!("Recording to {filename}. Press Ctrl-C to stop.");
    mic.start()?;

    let frames = sink.drain(&mut mic)?;
    sink.finalize()?;

    if let Some(err) = mic.last_error().filter(|e| !e.is_shutdown()) {
        eprintln!("Capture failed: {err}");
    }
    println!(
        "Saved {filename} ({:.1}s)",
        format.duration(frames).as_secs_f64()
    );

    Ok(())
}
