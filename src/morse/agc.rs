//! Envelope tracking for the CW decoder.
//!
//! Peak: asymmetric hold with a slow decay that speeds up once the signal
//! has been below the peak for a while (key-up between elements must not
//! collapse it, a finished over should). Noise: 20th-percentile histogram
//! over a sliding window, with a slow-rising minimum floor underneath so a
//! long dash train cannot drag the floor up to the mark level.

/// Frames of slow decay before the peak releases faster.
const SLOW_DECAY_FRAMES: u32 = 120;
const SLOW_DECAY: f32 = 0.9995;
const FAST_DECAY: f32 = 0.985;

/// Sliding window feeding the noise histogram.
const NOISE_WINDOW: usize = 128;
const HISTOGRAM_BINS: usize = 256;
const NOISE_PERCENTILE: f32 = 0.20;

/// Per-update rise rate of the minimum floor.
const FLOOR_RISE: f32 = 0.001;

pub struct Agc {
    peak: f32,
    frames_below: u32,
    window: [f32; NOISE_WINDOW],
    window_head: usize,
    window_count: usize,
    /// Histogram full-scale, locked on the first nonzero magnitude.
    scale: f32,
    short_term: f32,
    floor_min: f32,
}

impl Agc {
    pub fn new() -> Self {
        Agc {
            peak: 0.0,
            frames_below: 0,
            window: [0.0; NOISE_WINDOW],
            window_head: 0,
            window_count: 0,
            scale: 0.0,
            short_term: 0.0,
            floor_min: 0.0,
        }
    }

    pub fn push(&mut self, magnitude: f32) {
        if magnitude >= self.peak {
            self.peak = magnitude;
            self.frames_below = 0;
        } else {
            self.frames_below += 1;
            let decay = if self.frames_below <= SLOW_DECAY_FRAMES {
                SLOW_DECAY
            } else {
                FAST_DECAY
            };
            self.peak *= decay;
        }

        if self.scale == 0.0 && magnitude > 0.0 {
            self.scale = magnitude * 8.0;
        }

        self.window[self.window_head] = magnitude;
        self.window_head = (self.window_head + 1) % NOISE_WINDOW;
        self.window_count = (self.window_count + 1).min(NOISE_WINDOW);
    }

    /// Rebuild the percentile floor from the window. Called on the Schmitt
    /// refresh cadence rather than every frame.
    pub fn refresh_noise(&mut self) {
        if self.scale <= 0.0 || self.window_count == 0 {
            return;
        }
        let mut histogram = [0u32; HISTOGRAM_BINS];
        for i in 0..self.window_count {
            let m = self.window[i];
            let bin = ((m / self.scale * HISTOGRAM_BINS as f32) as usize).min(HISTOGRAM_BINS - 1);
            histogram[bin] += 1;
        }
        let target = (NOISE_PERCENTILE * self.window_count as f32) as u32;
        let mut cumulative = 0u32;
        for (bin, &count) in histogram.iter().enumerate() {
            cumulative += count;
            if cumulative > target {
                self.short_term = (bin + 1) as f32 / HISTOGRAM_BINS as f32 * self.scale;
                break;
            }
        }
        if self.floor_min == 0.0 {
            self.floor_min = self.short_term;
        } else if self.short_term > self.floor_min {
            self.floor_min += FLOOR_RISE * (self.short_term - self.floor_min);
        }
    }

    pub fn peak(&self) -> f32 {
        self.peak
    }

    pub fn noise(&self) -> f32 {
        self.short_term.max(self.floor_min)
    }

    pub fn reset(&mut self) {
        *self = Agc::new();
    }
}

impl Default for Agc {
    fn default() -> Self {
        Agc::new()
    }
}
