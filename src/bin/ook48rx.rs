//! Offline OOK48 receiver.
//!
//! Runs a WAV recording (9216 Hz mono, as produced by ook48sim) through the
//! full engine, synthesising the PPS at each one-second boundary, and prints
//! the telemetry lines a host would see on the serial link.
//!
//! Usage:
//!   cargo run --bin ook48rx -- <input.wav>

use rustyook48::constants::{ADC_MIDSCALE, OOK48, OVERSAMPLE};
use rustyook48::telemetry::format_event;
use rustyook48::{Engine, Event, Settings};

fn main() {
    rustyook48::tracing_init::init_tracing();

    let path = match std::env::args().nth(1) {
        Some(path) => path,
        None => {
            eprintln!("Usage: ook48rx <input.wav>");
            std::process::exit(1);
        }
    };

    let mut reader = match hound::WavReader::open(&path) {
        Ok(reader) => reader,
        Err(reason) => {
            eprintln!("Error opening {}: {}", path, reason);
            std::process::exit(1);
        }
    };
    let spec = reader.spec();
    if spec.sample_rate != OOK48.sample_rate || spec.channels != 1 {
        eprintln!(
            "Expected {} Hz mono, got {} Hz x{}",
            OOK48.sample_rate, spec.sample_rate, spec.channels
        );
        std::process::exit(1);
    }

    let samples: Vec<f32> = reader
        .samples::<i16>()
        .map(|s| s.unwrap_or(0) as f32 / 32768.0)
        .collect();

    let (mut engine, rx) = Engine::new(Settings::default());

    let mut adc_frame = Vec::with_capacity(OOK48.adc_frame_len());
    let mut second = 0u32;
    for (index, chunk) in samples.chunks_exact(OOK48.num_samples).enumerate() {
        // 9 frames per second; the PPS leads the first
        if index % 9 == 0 {
            engine.on_pps(
                (second / 3600 % 24) as u8,
                (second / 60 % 60) as u8,
                (second % 60) as u8,
            );
            second += 1;
        }

        adc_frame.clear();
        for &sample in chunk {
            let adc = (ADC_MIDSCALE + sample * ADC_MIDSCALE).clamp(0.0, 4095.0) as u16;
            for _ in 0..OVERSAMPLE {
                adc_frame.push(adc);
            }
        }
        engine.ingest_frame(&adc_frame);

        while let Ok(event) = rx.try_recv() {
            // The waterfall stream floods a terminal; keep the decode lines
            if matches!(event, Event::DrawSpectrum(_) | Event::GenPlot) {
                continue;
            }
            if let Some(line) = format_event(&event) {
                println!("{}", line);
            }
        }
    }
}
