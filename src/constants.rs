//! Fixed DSP parameters for the four operating modes.
//!
//! These numbers are part of the wire contract: the tone placement and cache
//! geometry must match the transmitting stations exactly.

/// ADC readings averaged into one decimated sample.
pub const OVERSAMPLE: usize = 8;

/// Mid-scale of the 12-bit unipolar ADC front-end.
pub const ADC_MIDSCALE: f32 = 2048.0;

/// EMA coefficient for the audio level meter.
pub const AUDIO_LEVEL_ALPHA: f32 = 0.4;

/// Free-run safety: reset the cache write index after this long without a
/// sample frame.
pub const FREE_RUN_RESET_MS: u32 = 250;

/// OOK48 key cadence, one symbol every 1/9 s.
pub const SYMBOL_PERIOD_US: u64 = 111_111;

/// Reserved codepoint surfaced when the soft-decision gate rejects a frame.
pub const UNKNOWN_CHAR: char = '\u{7e}';

/// DSP front-end geometry for one operating mode.
///
/// `tone0` and `tone_spacing` are bin indices relative to the magnitude
/// window (i.e. after `start_bin` has been subtracted), not absolute FFT bins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeParams {
    /// Decimated sample rate in Hz.
    pub sample_rate: u32,
    /// FFT length (decimated samples per frame).
    pub num_samples: usize,
    /// Width of the magnitude window copied out of the FFT.
    pub num_bins: usize,
    /// First FFT bin of the magnitude window.
    pub start_bin: usize,
    /// Centre bin of tone 0, window-relative.
    pub tone0: usize,
    /// Bin distance between adjacent 4-FSK tones (0 for single-tone modes).
    pub tone_spacing: usize,
    /// Search half-width around each tone centre.
    pub tone_tolerance: usize,
    /// Symbol slots captured before an end-of-frame event fires.
    pub cache_size: usize,
    /// Symbols actually consumed by the frame decoder (beacon modes search
    /// the sync vector inside the larger cache).
    pub symbol_count: usize,
}

impl ModeParams {
    /// Expected ADC-side frame length (pre-decimation).
    pub fn adc_frame_len(&self) -> usize {
        self.num_samples * OVERSAMPLE
    }

    /// One FFT frame in milliseconds; equals the symbol period for the
    /// synchronous modes.
    pub fn frame_period_ms(&self) -> f32 {
        self.num_samples as f32 / self.sample_rate as f32 * 1000.0
    }

    /// Frames per second seen by the streaming decoders.
    pub fn frame_rate(&self) -> f32 {
        self.sample_rate as f32 / self.num_samples as f32
    }
}

/// OOK48: 9 symbols/s, one character per 8 symbols. The cache holds 8 slots,
/// or 16 when half-rate combining is enabled.
pub const OOK48: ModeParams = ModeParams {
    sample_rate: 9_216,
    num_samples: 1_024,
    num_bins: 68,
    start_bin: 55,
    tone0: 34,
    tone_spacing: 0,
    tone_tolerance: 11,
    cache_size: 8,
    symbol_count: 8,
};

/// Cache depth when OOK48 half-rate combining is active.
pub const OOK48_HALF_RATE_CACHE: usize = 16;

/// JT4G: 4.375 baud 4-FSK, 207-symbol frame inside a 240-slot cache.
pub const JT4G: ModeParams = ModeParams {
    sample_rate: 4_480,
    num_samples: 1_024,
    num_bins: 343,
    start_bin: 114,
    tone0: 69,
    tone_spacing: 72,
    tone_tolerance: 22,
    cache_size: 240,
    symbol_count: 207,
};

/// PI4: 6 baud 4-FSK, 146-symbol frame inside a 180-slot cache.
pub const PI4: ModeParams = ModeParams {
    sample_rate: 6_144,
    num_samples: 1_024,
    num_bins: 167,
    start_bin: 83,
    tone0: 31,
    tone_spacing: 39,
    tone_tolerance: 12,
    cache_size: 180,
    symbol_count: 146,
};

/// Morse: asynchronous, one magnitude sample per 256-point FFT (~36 fps).
pub const MORSE: ModeParams = ModeParams {
    sample_rate: 9_216,
    num_samples: 256,
    num_bins: 128,
    start_bin: 0,
    tone0: 22,
    tone_spacing: 0,
    tone_tolerance: 3,
    cache_size: 0,
    symbol_count: 0,
};
