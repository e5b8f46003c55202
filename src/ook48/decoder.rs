//! OOK48 receive side.
//!
//! At end of frame the decoder reduces the cached tone window to one scalar
//! per symbol slot, optionally folds the half-rate repeat, gates on the
//! soft gap between the 4th and 5th ranked values, and finally looks the
//! hard 4-of-8 decision up in the inverse alphabet.

use crate::settings::DecodeMode;
use crate::tone_cache::ToneCache;

use super::tables::DECODE4FROM8;

/// Result of one frame decode. Low confidence is not a failure; an invalid
/// weight-4 word is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ook48Outcome {
    Decoded(char),
    LowConfidence,
    InvalidCode,
}

#[derive(Debug, Clone)]
pub struct FrameDecode {
    /// Per-slot scalars after combining, published before the hard decision.
    pub soft: [f32; 8],
    pub confidence: f32,
    pub outcome: Ook48Outcome,
}

pub struct Ook48Decoder {
    pub decode_mode: DecodeMode,
    pub confidence_threshold: f32,
    pub half_rate: bool,
    tone0: usize,
    tolerance: usize,
}

impl Ook48Decoder {
    pub fn new(
        decode_mode: DecodeMode,
        confidence_threshold: f32,
        half_rate: bool,
        tone0: usize,
        tolerance: usize,
    ) -> Self {
        Ook48Decoder {
            decode_mode,
            confidence_threshold,
            half_rate,
            tone0,
            tolerance,
        }
    }

    /// Decode a full cache (8 slots, or 16 under half-rate).
    pub fn decode_frame(&self, cache: &ToneCache) -> FrameDecode {
        let slots = if self.half_rate { 16 } else { 8 };
        let lo = self.tone0 - self.tolerance;
        let hi = self.tone0 + self.tolerance;

        let mut t = [0.0f32; 16];
        match self.decode_mode {
            DecodeMode::Normal => {
                for (i, slot) in t.iter_mut().enumerate().take(slots) {
                    let col = cache.column(i);
                    *slot = col[lo..hi].iter().fold(0.0f32, |a, &m| a.max(m));
                }
            }
            DecodeMode::Alt => {
                // Single best bin: widest magnitude swing across the frame
                let mut best_bin = lo;
                let mut best_swing = f32::MIN;
                for bin in lo..hi {
                    let mut max = f32::MIN;
                    let mut min = f32::MAX;
                    for slot in 0..slots {
                        let m = cache.magnitude(bin, slot);
                        max = max.max(m);
                        min = min.min(m);
                    }
                    if max - min > best_swing {
                        best_swing = max - min;
                        best_bin = bin;
                    }
                }
                for (i, slot) in t.iter_mut().enumerate().take(slots) {
                    *slot = cache.magnitude(best_bin, i);
                }
            }
            DecodeMode::Rainscatter => {
                for (i, slot) in t.iter_mut().enumerate().take(slots) {
                    *slot = cache.column(i).iter().sum();
                }
            }
        }

        if self.half_rate {
            for i in 0..8 {
                t[i] += t[i + 8];
            }
        }

        let mut soft = [0.0f32; 8];
        soft.copy_from_slice(&t[..8]);

        let confidence = confidence_of(&soft);
        let outcome = if confidence < self.confidence_threshold {
            Ook48Outcome::LowConfidence
        } else {
            hard_decode(&soft)
        };

        FrameDecode {
            soft,
            confidence,
            outcome,
        }
    }
}

/// Soft gap between ranks 3 and 4, normalised by the full range.
fn confidence_of(t: &[f32; 8]) -> f32 {
    let mut sorted = *t;
    sorted.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    let range = sorted[0] - sorted[7];
    if range > 0.0 {
        (sorted[3] - sorted[4]) / range
    } else {
        0.0
    }
}

/// Pick the four largest slots (first maximum wins on ties), build the
/// received word MSB-first, and consult the inverse alphabet.
fn hard_decode(t: &[f32; 8]) -> Ook48Outcome {
    let mut taken = [false; 8];
    let mut dec = 0u8;
    for _ in 0..4 {
        let mut best = None;
        let mut best_value = f32::MIN;
        for (i, &v) in t.iter().enumerate() {
            if !taken[i] && v > best_value {
                best_value = v;
                best = Some(i);
            }
        }
        let i = best.expect("slot scan over 8 entries");
        taken[i] = true;
        dec |= 0x80 >> i;
    }

    match DECODE4FROM8[dec as usize] {
        0 => Ook48Outcome::InvalidCode,
        ch => Ook48Outcome::Decoded(ch as char),
    }
}
