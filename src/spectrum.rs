//! Sample ingest and spectrum engine.
//!
//! Takes one oversampled ADC frame, decimates it by block averaging, removes
//! the mid-scale bias, applies a Hann window and produces the mode's
//! magnitude window from a forward FFT. Also maintains the audio level
//! metric used by the 1 Hz status line.

use std::sync::Arc;

use rustfft::num_complex::Complex32;
use rustfft::{Fft, FftPlanner};
use snafu::Snafu;

use crate::constants::{ModeParams, ADC_MIDSCALE, AUDIO_LEVEL_ALPHA, OVERSAMPLE};

#[derive(Debug, Snafu)]
pub enum SpectrumError {
    /// A partial DMA frame arrived; the caller must skip it without
    /// advancing the cache pointer.
    #[snafu(display("Short ingest frame: got {got} samples, expected {expected}"))]
    ShortFrame { got: usize, expected: usize },
}

pub struct SpectrumEngine {
    params: &'static ModeParams,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    buffer: Vec<Complex32>,
    scratch: Vec<Complex32>,
    audio_level: f32,
}

impl SpectrumEngine {
    pub fn new(params: &'static ModeParams) -> Self {
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(params.num_samples);
        let scratch = vec![Complex32::new(0.0, 0.0); fft.get_inplace_scratch_len()];

        // Hann window over the decimated frame
        let n = params.num_samples;
        let window = (0..n)
            .map(|i| {
                let phase = 2.0 * std::f32::consts::PI * i as f32 / (n as f32 - 1.0);
                0.5 * (1.0 - phase.cos())
            })
            .collect();

        SpectrumEngine {
            params,
            fft,
            window,
            buffer: vec![Complex32::new(0.0, 0.0); n],
            scratch,
            audio_level: 0.0,
        }
    }

    /// Process one oversampled ADC frame into the mode's magnitude window.
    ///
    /// `magnitudes` is cleared and filled with `num_bins` values taken from
    /// `start_bin` upward.
    pub fn process(
        &mut self,
        adc_frame: &[u16],
        magnitudes: &mut Vec<f32>,
    ) -> Result<(), SpectrumError> {
        let expected = self.params.adc_frame_len();
        if adc_frame.len() != expected {
            return Err(SpectrumError::ShortFrame {
                got: adc_frame.len(),
                expected,
            });
        }

        // Decimate by block averaging, remove DC bias, track the frame peak
        let mut peak = 0.0f32;
        for (i, block) in adc_frame.chunks_exact(OVERSAMPLE).enumerate() {
            let sum: u32 = block.iter().map(|&s| s as u32).sum();
            let sample = sum as f32 / OVERSAMPLE as f32 - ADC_MIDSCALE;
            peak = peak.max(sample.abs());
            self.buffer[i] = Complex32::new(sample * self.window[i], 0.0);
        }

        let new_level = (peak / ADC_MIDSCALE * 100.0).clamp(0.0, 100.0);
        self.audio_level += AUDIO_LEVEL_ALPHA * (new_level - self.audio_level);

        self.fft
            .process_with_scratch(&mut self.buffer, &mut self.scratch);

        magnitudes.clear();
        magnitudes.extend(
            self.buffer[self.params.start_bin..self.params.start_bin + self.params.num_bins]
                .iter()
                .map(|c| c.norm()),
        );
        Ok(())
    }

    /// Smoothed audio level, 0-100.
    pub fn audio_level(&self) -> u8 {
        self.audio_level.round() as u8
    }
}
