//! OOK48 encode→decode round trips through the full engine.

use crossbeam::channel::Receiver;
use rustyook48::constants::OOK48;
use rustyook48::ook48::tables::{char_index, encode_char, ENCODE4FROM8};
use rustyook48::ook48::{compile_message, KeyStream};
use rustyook48::simulation::{adc_silence_frame, adc_tone_frame};
use rustyook48::{Engine, Event, Settings};

/// Feed one transmitted character into the engine: PPS, the spanning frame,
/// then the 8 keyed symbol frames. Decoded characters are drained into
/// `text` as they appear so the bounded dispatch queue never backs up.
fn feed_character(
    engine: &mut Engine,
    rx: &Receiver<Event>,
    word: u8,
    second: u8,
    text: &mut String,
) {
    engine.on_pps(12, 0, second);
    engine.ingest_frame(&adc_silence_frame(&OOK48));
    for bit in 0..8 {
        let frame = if word & (0x80 >> bit) != 0 {
            adc_tone_frame(&OOK48, OOK48.tone0, 600.0)
        } else {
            adc_silence_frame(&OOK48)
        };
        engine.ingest_frame(&frame);
        drain_into(rx, text);
    }
}

fn drain_into(rx: &Receiver<Event>, text: &mut String) {
    while let Ok(event) = rx.try_recv() {
        if let Event::Message(ch) = event {
            text.push(ch);
        }
    }
}

#[test]
fn test_printable_span_round_trips_uppercased() {
    // Every character in 0x20..0x5F survives the air interface
    let (mut engine, rx) = Engine::new(Settings::default());
    let mut expected = String::new();
    let mut decoded = String::new();
    for (i, ch) in (0x20u8..0x5F).enumerate() {
        feed_character(&mut engine, &rx, encode_char(ch), (i % 60) as u8, &mut decoded);
        expected.push(ch as char);
    }
    assert_eq!(decoded, expected);
}

#[test]
fn test_lowercase_decodes_as_uppercase() {
    let (mut engine, rx) = Engine::new(Settings::default());
    let mut decoded = String::new();
    for (i, ch) in (b'a'..=b'e').enumerate() {
        feed_character(&mut engine, &rx, encode_char(ch), i as u8, &mut decoded);
    }
    assert_eq!(decoded, "ABCDE");
}

#[test]
fn test_cq_test_message_sequence() {
    // The compiled byte stream for "CQ TEST" maps through alphabet indices
    // 36,50,1,53,38,52,53 and terminates with index 0
    let bytes = compile_message("CQ TEST\r", "");
    let indices: Vec<usize> = bytes
        .iter()
        .map(|b| ENCODE4FROM8.iter().position(|e| e == b).unwrap())
        .collect();
    assert_eq!(indices, vec![36, 50, 1, 53, 38, 52, 53, 0]);
    assert_eq!(
        indices,
        "CQ TEST\r"
            .bytes()
            .map(char_index)
            .collect::<Vec<usize>>()
    );

    // And the whole message survives the air interface
    let (mut engine, rx) = Engine::new(Settings::default());
    let mut decoded = String::new();
    for (i, &word) in bytes.iter().enumerate() {
        feed_character(&mut engine, &rx, word, i as u8, &mut decoded);
    }
    assert_eq!(decoded, "CQ TEST\r");
}

#[test]
fn test_half_rate_key_stream_repeats_and_combines() {
    // Transmit side: each byte appears twice
    let bytes = compile_message("CQ\r", "");
    let mut stream = KeyStream::new(bytes.clone(), true);
    let mut sent_bytes = Vec::new();
    'outer: loop {
        let mut word = 0u8;
        for _ in 0..8 {
            match stream.next_bit() {
                Some(tick) => word = (word << 1) | tick.key_down as u8,
                None => break 'outer,
            }
        }
        sent_bytes.push(word);
    }
    assert_eq!(
        sent_bytes,
        vec![bytes[0], bytes[0], bytes[1], bytes[1], bytes[2], bytes[2]]
    );

    // Receive side: the even/odd second pair combines into one character
    let settings = Settings {
        half_rate: true,
        ..Settings::default()
    };
    let (mut engine, rx) = Engine::new(settings);
    let mut decoded = String::new();
    for (second, &word) in sent_bytes.iter().enumerate() {
        feed_character(&mut engine, &rx, word, second as u8, &mut decoded);
    }
    assert_eq!(decoded, "CQ\r");
}

#[test]
fn test_flat_symbols_surface_the_unknown_codepoint() {
    let (mut engine, rx) = Engine::new(Settings::default());
    // All eight symbols keyed identically: nothing to choose between
    let mut decoded = String::new();
    feed_character(&mut engine, &rx, 0xFF, 0, &mut decoded);
    assert_eq!(decoded, "\u{7e}");
}
