//! Test-signal synthesis.
//!
//! Keyed tones and Gaussian noise shaped like the ADC front-end sees them.
//! Used by the unit and integration tests and by the sim binary; never by
//! the receive path itself.

use rand::prelude::*;
use rand_distr::{Distribution, Normal};

use crate::constants::{ModeParams, ADC_MIDSCALE, OVERSAMPLE};

/// Audio-rate tone frequency for a window-relative bin.
pub fn bin_frequency(params: &ModeParams, window_bin: usize) -> f32 {
    (params.start_bin + window_bin) as f32 * params.sample_rate as f32
        / params.num_samples as f32
}

/// One oversampled ADC frame carrying a tone at the given window bin.
pub fn adc_tone_frame(params: &ModeParams, window_bin: usize, amplitude: f32) -> Vec<u16> {
    let freq = bin_frequency(params, window_bin);
    let mut frame = Vec::with_capacity(params.adc_frame_len());
    for i in 0..params.num_samples {
        let t = i as f32 / params.sample_rate as f32;
        let s = ADC_MIDSCALE + amplitude * (2.0 * std::f32::consts::PI * freq * t).sin();
        let s = s.clamp(0.0, 4095.0) as u16;
        for _ in 0..OVERSAMPLE {
            frame.push(s);
        }
    }
    frame
}

/// One key-up ADC frame at mid-scale.
pub fn adc_silence_frame(params: &ModeParams) -> Vec<u16> {
    vec![ADC_MIDSCALE as u16; params.adc_frame_len()]
}

/// Mix Gaussian noise into an ADC frame.
pub fn add_noise(frame: &mut [u16], sigma: f32, rng: &mut impl Rng) {
    let normal = Normal::new(0.0f32, sigma).unwrap();
    for sample in frame.iter_mut() {
        let noisy = *sample as f32 + normal.sample(rng);
        *sample = noisy.clamp(0.0, 4095.0) as u16;
    }
}

/// Audio-rate waveform for a keyed bit stream (one bit per symbol period),
/// used for WAV output. Phase is continuous across symbols.
pub fn keyed_waveform(
    bits: &[bool],
    samples_per_symbol: usize,
    freq_hz: f32,
    sample_rate: f32,
    amplitude: f32,
) -> Vec<f32> {
    let mut samples = Vec::with_capacity(bits.len() * samples_per_symbol);
    let step = 2.0 * std::f32::consts::PI * freq_hz / sample_rate;
    let mut phase = 0.0f32;
    for &bit in bits {
        for _ in 0..samples_per_symbol {
            samples.push(if bit { amplitude * phase.sin() } else { 0.0 });
            phase += step;
            if phase > 2.0 * std::f32::consts::PI {
                phase -= 2.0 * std::f32::consts::PI;
            }
        }
    }
    samples
}

/// Gaussian noise for WAV mixing.
pub fn white_noise(samples: usize, sigma: f32, rng: &mut impl Rng) -> Vec<f32> {
    let normal = Normal::new(0.0f32, sigma).unwrap();
    (0..samples).map(|_| normal.sample(rng)).collect()
}
