//! 4-FSK tone detection for the beacon modes.
//!
//! Each symbol period, the strongest bin near each of the four tone centres
//! is compared against a noise reference taken just outside the tolerance
//! band; the tone with the best S/N wins.

/// One symbol decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneDecision {
    /// Winning tone 0..=3; sync bit in bit 0, data bit in bit 1.
    pub tone: u8,
    /// S/N of the winning tone in dB.
    pub snr_db: f32,
}

/// Noise reference bins taken on each side of the tolerance band.
const NOISE_BINS_PER_SIDE: usize = 4;

/// Classify one magnitude window into a tone label.
///
/// `tone0` and `spacing` are window-relative bin indices.
pub fn tone_detect(
    magnitudes: &[f32],
    tone0: usize,
    spacing: usize,
    tolerance: usize,
) -> ToneDecision {
    let mut best_tone = 0u8;
    let mut best_sn = f32::MIN;
    let mut best_snr_db = 0.0f32;

    for k in 0..4usize {
        let centre = tone0 + k * spacing;
        let lo = centre.saturating_sub(tolerance);
        let hi = (centre + tolerance).min(magnitudes.len() - 1);

        let mut peak = 0.0f32;
        for &m in &magnitudes[lo..=hi] {
            peak = peak.max(m);
        }

        // Mean of four bins immediately outside the band on each side
        let mut noise = 0.0f32;
        let mut count = 0usize;
        for offset in 1..=NOISE_BINS_PER_SIDE {
            if lo >= offset {
                noise += magnitudes[lo - offset];
                count += 1;
            }
            if hi + offset < magnitudes.len() {
                noise += magnitudes[hi + offset];
                count += 1;
            }
        }
        let noise = if count > 0 { noise / count as f32 } else { 0.0 };

        let sn = if noise > 0.0 { peak / noise } else { peak };
        if sn > best_sn {
            best_sn = sn;
            best_tone = k as u8;
            best_snr_db = if sn > 0.0 { 10.0 * sn.log10() } else { -99.0 };
        }
    }

    ToneDecision {
        tone: best_tone,
        snr_db: best_snr_db,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{JT4G, PI4};

    fn window_with_tone(params: &crate::constants::ModeParams, tone: usize, level: f32) -> Vec<f32> {
        let mut mags = vec![1.0f32; params.num_bins];
        mags[params.tone0 + tone * params.tone_spacing] = level;
        mags
    }

    #[test]
    fn test_each_tone_is_detected() {
        for tone in 0..4 {
            let mags = window_with_tone(&JT4G, tone, 50.0);
            let decision = tone_detect(&mags, JT4G.tone0, JT4G.tone_spacing, JT4G.tone_tolerance);
            assert_eq!(decision.tone, tone as u8);
            assert!(decision.snr_db > 10.0);
        }
    }

    #[test]
    fn test_offset_within_tolerance_still_detects() {
        let mut mags = vec![1.0f32; PI4.num_bins];
        mags[PI4.tone0 + 2 * PI4.tone_spacing + PI4.tone_tolerance - 1] = 40.0;
        let decision = tone_detect(&mags, PI4.tone0, PI4.tone_spacing, PI4.tone_tolerance);
        assert_eq!(decision.tone, 2);
    }

    #[test]
    fn test_sync_and_data_bit_split() {
        for (tone, sync, data) in [(0u8, 0, 0), (1, 1, 0), (2, 0, 1), (3, 1, 1)] {
            assert_eq!(tone & 1, sync);
            assert_eq!(tone >> 1, data);
        }
    }
}
