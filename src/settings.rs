//! Runtime settings record.
//!
//! Owned by the dispatch context and snapshotted into the DSP engine on mode
//! change, so the decoders never observe a half-updated record.

use crate::constants::{ModeParams, JT4G, MORSE, OOK48, PI4};

/// OOK48 per-slot scalar selection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeMode {
    /// Peak magnitude across the tone window.
    Normal,
    /// Single best bin, chosen by largest max-min swing over the frame.
    Alt,
    /// Wideband power sum, for rain-scatter smeared signals.
    Rainscatter,
}

impl DecodeMode {
    pub fn from_index(n: u8) -> Option<Self> {
        match n {
            0 => Some(DecodeMode::Normal),
            1 => Some(DecodeMode::Alt),
            2 => Some(DecodeMode::Rainscatter),
            _ => None,
        }
    }
}

/// Active application mode. Changing it reboots the DSP engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    Ook48,
    Jt4,
    Pi4,
    Morse,
}

impl AppMode {
    pub fn from_index(n: u8) -> Option<Self> {
        match n {
            0 => Some(AppMode::Ook48),
            1 => Some(AppMode::Jt4),
            2 => Some(AppMode::Pi4),
            3 => Some(AppMode::Morse),
            _ => None,
        }
    }

    /// DSP front-end geometry for this mode.
    pub fn params(&self) -> &'static ModeParams {
        match self {
            AppMode::Ook48 => &OOK48,
            AppMode::Jt4 => &JT4G,
            AppMode::Pi4 => &PI4,
            AppMode::Morse => &MORSE,
        }
    }
}

/// The full settings record. Defaults on boot; not persisted.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Canned transmit messages, slots 0-9.
    pub message_slots: [String; 10],
    /// Maidenhead locator length: 6, 8 or 10 characters.
    pub locator_length: u8,
    pub decode_mode: DecodeMode,
    /// TX keying leads the second by this many milliseconds.
    pub tx_advance_ms: u16,
    /// RX capture is delayed behind the PPS edge by this many milliseconds.
    pub rx_retard_ms: u16,
    /// Send every character twice and combine on receive.
    pub half_rate: bool,
    pub app: AppMode,
    pub morse_wpm: u8,
    /// Soft-gap gate threshold for the OOK48 decoder.
    pub confidence_threshold: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            message_slots: Default::default(),
            locator_length: 6,
            decode_mode: DecodeMode::Normal,
            tx_advance_ms: 0,
            rx_retard_ms: 0,
            half_rate: false,
            app: AppMode::Ook48,
            morse_wpm: 12,
            confidence_threshold: 0.180,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.app, AppMode::Ook48);
        assert_eq!(s.decode_mode, DecodeMode::Normal);
        assert!(!s.half_rate);
        assert!((s.confidence_threshold - 0.180).abs() < 1e-6);
    }

    #[test]
    fn test_app_mode_round_trip() {
        for n in 0..4u8 {
            assert!(AppMode::from_index(n).is_some());
        }
        assert!(AppMode::from_index(4).is_none());
        assert!(DecodeMode::from_index(3).is_none());
    }
}
