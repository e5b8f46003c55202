//! Cross-context event dispatch.
//!
//! The DSP context publishes small tagged events into a bounded lock-free
//! queue; the dispatch context drains it and talks to the outside world.
//! The producer never blocks: when the consumer stalls, events are dropped
//! and counted instead of holding up the sample cadence.

use crossbeam::channel::{bounded, Receiver, Sender, TrySendError};
use tracing::warn;

/// Queue depth; a few seconds of events at the worst-case rate.
pub const QUEUE_DEPTH: usize = 64;

/// Beacon decode report published at end of minute.
#[derive(Debug, Clone, PartialEq)]
pub struct BeaconReport {
    pub hours: u8,
    pub minutes: u8,
    pub snr_db: f32,
    pub text: String,
}

/// Everything the DSP context tells the dispatch context.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Start-of-second redraw hint for the renderer.
    GenPlot,
    /// One waterfall pixel row.
    DrawSpectrum(Vec<u8>),
    /// OOK48 decoded character.
    Message(char),
    /// OOK48 character echoed while transmitting.
    TxMessage(char),
    /// OOK48 soft magnitudes, published before the hard decision.
    SoftMagnitudes([f32; 8]),
    JtMessage(BeaconReport),
    PiMessage(BeaconReport),
    MorseMessage(char),
    MorseLocked(f32),
    MorseLost,
    /// Waterfall annotation: second boundary.
    RedLine,
    /// Waterfall annotation: end of frame.
    CyanLine,
    /// Decode error surfaced to the host.
    Error(String),
}

/// Producer half owned by the DSP context.
pub struct Dispatcher {
    tx: Sender<Event>,
    dropped: u64,
}

impl Dispatcher {
    pub fn new() -> (Dispatcher, Receiver<Event>) {
        let (tx, rx) = bounded(QUEUE_DEPTH);
        (Dispatcher { tx, dropped: 0 }, rx)
    }

    /// Non-blocking publish; drops on a full queue.
    pub fn send(&mut self, event: Event) {
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                self.dropped += 1;
                warn!(dropped = self.dropped, ?event, "dispatch queue full");
            }
            Err(TrySendError::Disconnected(_)) => {}
        }
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

/// Scale one magnitude window into an 8-bit waterfall row. Gain rides a
/// slow peak so a strong station does not blank the display.
pub struct WaterfallScaler {
    peak: f32,
}

impl WaterfallScaler {
    pub fn new() -> Self {
        WaterfallScaler { peak: 1.0 }
    }

    pub fn scale_row(&mut self, magnitudes: &[f32]) -> Vec<u8> {
        let frame_peak = magnitudes.iter().fold(0.0f32, |a, &m| a.max(m));
        self.peak = (self.peak * 0.95).max(frame_peak).max(1e-6);
        magnitudes
            .iter()
            .map(|&m| ((m / self.peak) * 255.0).clamp(0.0, 255.0) as u8)
            .collect()
    }
}

impl Default for WaterfallScaler {
    fn default() -> Self {
        WaterfallScaler::new()
    }
}
