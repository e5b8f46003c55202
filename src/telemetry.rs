//! Outbound serial line protocol.
//!
//! Pure formatting from dispatch events (and host-side status) to the
//! ASCII line telemetry. Lines carry no terminator here; the serial writer
//! appends `\n`.

use crate::constants::UNKNOWN_CHAR;
use crate::dispatch::{BeaconReport, Event};

/// Format a dispatch event as a telemetry line. Returns `None` for events
/// that have no serial representation.
pub fn format_event(event: &Event) -> Option<String> {
    match event {
        Event::GenPlot => None,
        Event::DrawSpectrum(row) => Some(format!("WF:{}", join_bytes(row))),
        Event::Message(ch) => Some(format!("MSG:{}", message_token(*ch))),
        Event::TxMessage(ch) => Some(format!("TX:{}", message_token(*ch))),
        Event::SoftMagnitudes(soft) => Some(format!("SFT:{}", join_floats(soft))),
        Event::JtMessage(report) => Some(format!("JT:{}", beacon_payload(report))),
        Event::PiMessage(report) => Some(format!("PI:{}", beacon_payload(report))),
        Event::MorseMessage(ch) => Some(format!("MCH:{}", morse_token(*ch))),
        Event::MorseLocked(wpm) => Some(format!("MLS:{:.1}", wpm)),
        Event::MorseLost => Some("MLS:LOST".to_string()),
        Event::RedLine => Some("MRK:RED".to_string()),
        Event::CyanLine => Some("MRK:CYN".to_string()),
        Event::Error(reason) => Some(format!("ERR:{}", reason)),
    }
}

fn message_token(ch: char) -> String {
    match ch {
        '\r' => "<CR>".to_string(),
        UNKNOWN_CHAR => "<UNK>".to_string(),
        ch => ch.to_string(),
    }
}

fn morse_token(ch: char) -> String {
    match ch {
        ' ' => "<SP>".to_string(),
        UNKNOWN_CHAR => "<UNK>".to_string(),
        ch => ch.to_string(),
    }
}

fn beacon_payload(report: &BeaconReport) -> String {
    format!(
        "{:02}:{:02},{:.1},{}",
        report.hours, report.minutes, report.snr_db, report.text
    )
}

fn join_bytes(row: &[u8]) -> String {
    row.iter()
        .map(|b| b.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn join_floats(values: &[f32]) -> String {
    values
        .iter()
        .map(|v| format!("{:.1}", v))
        .collect::<Vec<_>>()
        .join(",")
}

/// Boot banner.
pub fn format_ready(firmware: &str, morse_wpm: u8) -> String {
    format!("RDY:fw={};morsewpm={}", firmware, morse_wpm)
}

/// 1 Hz status line from the dispatch context.
#[allow(clippy::too_many_arguments)]
pub fn format_status(
    hours: u8,
    minutes: u8,
    seconds: u8,
    lat: f64,
    lon: f64,
    locator: &str,
    transmitting: bool,
    audio_level: u8,
) -> String {
    format!(
        "STA:{:02}:{:02}:{:02},{:.4},{:.4},{},{},{}",
        hours,
        minutes,
        seconds,
        lat,
        lon,
        locator,
        transmitting as u8,
        audio_level
    )
}

/// Command acknowledgement echo.
pub fn format_ack(line: &str) -> String {
    format!("ACK:{}", line)
}

/// TX/RX waterfall annotations issued on mode changes.
pub fn format_mark_tx() -> String {
    "MRK:TX".to_string()
}

pub fn format_mark_rx() -> String {
    "MRK:RX".to_string()
}
