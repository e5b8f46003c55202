//! Two-threshold slicer turning the magnitude stream into a key-down bit.

/// Envelope history needed before the slicer may produce output.
const MIN_ENVELOPE_FRAMES: u64 = 20;

/// Minimum peak-to-noise ratio for a usable envelope.
const MIN_SNR: f32 = 6.0;

/// Hysteresis as a fraction of the envelope swing.
const HYSTERESIS: f32 = 0.12;

pub struct Schmitt {
    lo: f32,
    hi: f32,
    valid: bool,
    state: bool,
}

impl Schmitt {
    pub fn new() -> Self {
        Schmitt {
            lo: 0.0,
            hi: 0.0,
            valid: false,
            state: false,
        }
    }

    /// Recompute thresholds from the envelope; called every 8 frames.
    pub fn update_thresholds(&mut self, peak: f32, noise: f32, envelope_frames: u64) {
        self.valid =
            envelope_frames >= MIN_ENVELOPE_FRAMES && noise > 0.0 && peak / noise >= MIN_SNR;
        if self.valid {
            let mid = (peak + noise) / 2.0;
            let h = HYSTERESIS * (peak - noise);
            self.lo = mid - h;
            self.hi = mid + h;
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Slice one magnitude. `None` until the envelope is usable.
    pub fn slice(&mut self, magnitude: f32) -> Option<bool> {
        if !self.valid {
            return None;
        }
        if self.state {
            if magnitude < self.lo {
                self.state = false;
            }
        } else if magnitude > self.hi {
            self.state = true;
        }
        Some(self.state)
    }

    pub fn reset(&mut self) {
        *self = Schmitt::new();
    }
}

impl Default for Schmitt {
    fn default() -> Self {
        Schmitt::new()
    }
}
