//! Beacon mode loopbacks: pack → encode → interleave → tone frames → full
//! engine receive chain → Fano decode → unpack.

use crossbeam::channel::Receiver;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustyook48::beacon::tables::{FANO_DELTA, FANO_MAXCYCLES_PER_BIT, JT4_INFO_BITS, TAIL_BITS};
use rustyook48::beacon::unpack::{pack_jt4, unpack_jt4, JT4_ALPHABET};
use rustyook48::beacon::{encode_frame, fano, BeaconMode};
use rustyook48::constants::{JT4G, PI4};
use rustyook48::settings::AppMode;
use rustyook48::simulation::adc_tone_frame;
use rustyook48::{Engine, Event, Settings};

/// Run a full tone-label frame through the engine's receive chain as FSK
/// audio, collecting every event on the way.
fn receive_frame(
    engine: &mut Engine,
    rx: &Receiver<Event>,
    params: &rustyook48::constants::ModeParams,
    symbols: &[u8],
    events: &mut Vec<Event>,
) {
    engine.on_pps(11, 42, 0);
    // The frame spanning the PPS edge is discarded by the cache reset
    engine.ingest_frame(&adc_tone_frame(params, params.tone0, 400.0));
    drain(rx, events);

    for &symbol in symbols {
        let bin = params.tone0 + symbol as usize * params.tone_spacing;
        engine.ingest_frame(&adc_tone_frame(params, bin, 400.0));
        drain(rx, events);
    }
    // Pad the rest of the cache; tone 0 labels do not disturb the search
    for _ in symbols.len()..params.cache_size {
        engine.ingest_frame(&adc_tone_frame(params, params.tone0, 400.0));
        drain(rx, events);
    }
}

fn drain(rx: &Receiver<Event>, events: &mut Vec<Event>) {
    while let Ok(event) = rx.try_recv() {
        match event {
            Event::DrawSpectrum(_) | Event::GenPlot => {}
            other => events.push(other),
        }
    }
}

#[test]
fn test_jt4_end_to_end_over_the_air() {
    let settings = Settings {
        app: AppMode::Jt4,
        ..Settings::default()
    };
    let (mut engine, rx) = Engine::new(settings);

    let symbols = encode_frame(BeaconMode::Jt4, "G4EML IO91WM").unwrap();
    let mut events = Vec::new();
    receive_frame(&mut engine, &rx, &JT4G, &symbols, &mut events);

    let report = events
        .iter()
        .find_map(|e| match e {
            Event::JtMessage(report) => Some(report),
            _ => None,
        })
        .unwrap_or_else(|| panic!("no JT decode in {:?}", events));
    assert_eq!(report.text, "G4EML IO91WM");
    assert_eq!((report.hours, report.minutes), (11, 42));
    assert!(report.snr_db > 5.0);
}

#[test]
fn test_pi4_end_to_end_over_the_air() {
    let settings = Settings {
        app: AppMode::Pi4,
        ..Settings::default()
    };
    let (mut engine, rx) = Engine::new(settings);

    let symbols = encode_frame(BeaconMode::Pi4, "PI4TEST").unwrap();
    let mut events = Vec::new();
    receive_frame(&mut engine, &rx, &PI4, &symbols, &mut events);

    let report = events
        .iter()
        .find_map(|e| match e {
            Event::PiMessage(report) => Some(report),
            _ => None,
        })
        .unwrap_or_else(|| panic!("no PI decode in {:?}", events));
    assert_eq!(report.text, "PI4TEST");
}

#[test]
fn test_fano_loopback_over_random_payloads() {
    // Any 13-character JT4 payload drawn from the alphabet survives
    // encode → {0,255} symbols → sequential decode with zero bit errors
    let mut rng = StdRng::seed_from_u64(0x4A54_3447);
    let alphabet: Vec<char> = JT4_ALPHABET.chars().collect();

    for _ in 0..10 {
        let message: String = (0..13)
            .map(|_| alphabet[rng.random_range(0..alphabet.len())])
            .collect();
        let payload = pack_jt4(&message).unwrap();

        let mut bits: Vec<u8> = (0..72).map(|i| (payload[i / 8] >> (7 - i % 8)) & 1).collect();
        bits.extend_from_slice(&[0u8; TAIL_BITS]);
        let soft: Vec<u8> = fano::encode(&bits).iter().map(|&b| b * 255).collect();

        let result = fano::decode(&soft, JT4_INFO_BITS, FANO_DELTA, FANO_MAXCYCLES_PER_BIT)
            .expect("clean loopback must decode");
        assert!(result.metric >= 0);
        assert_eq!(&result.data[..9], &payload);
        assert_eq!(unpack_jt4(&result.data).unwrap(), message);
    }
}

#[test]
fn test_minute_of_noise_stays_silent() {
    let settings = Settings {
        app: AppMode::Jt4,
        ..Settings::default()
    };
    let (mut engine, rx) = Engine::new(settings);

    let mut rng = StdRng::seed_from_u64(7);
    let mut events = Vec::new();
    engine.on_pps(3, 0, 0);
    for _ in 0..=JT4G.cache_size {
        let bin = rng.random_range(0..JT4G.num_bins);
        engine.ingest_frame(&adc_tone_frame(&JT4G, bin, 300.0));
        drain(&rx, &mut events);
    }
    assert!(
        !events.iter().any(|e| matches!(e, Event::JtMessage(_))),
        "noise minute must not decode: {:?}",
        events
    );
}
