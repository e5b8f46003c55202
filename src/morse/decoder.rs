//! Streaming CW decoder state machine.
//!
//! One magnitude sample per FFT frame comes in; AGC and the Schmitt slicer
//! turn it into a key-down bit, transitions become runs, and the machine
//! moves between two phases: `Acquire` collects runs and watches for a
//! credible WPM estimate, `Locked` tracks the unit length with a small PLL
//! and emits characters. Loss of signal or a wandering unit estimate drops
//! it back to `Acquire`.

use tracing::debug;

use super::agc::Agc;
use super::runs::{morphological_clean, Run, RunRing, RunState};
use super::schmitt::Schmitt;
use super::table;
use super::wpm::{dit_frames, estimate};

/// Decoder output stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MorseEvent {
    Char(char),
    WordSep,
    Locked(f32),
    Lost,
}

/// Acquire ring: ~11 s of runs at 36 fps.
const RING_CAPACITY: usize = 400;
/// Estimation cadence, in completed runs.
const ESTIMATE_EVERY_RUNS: u32 = 6;
/// Marks needed in the ring before estimating.
const MIN_MARKS: usize = 20;
/// Estimator confidence needed to lock.
const LOCK_CONFIDENCE: f32 = 0.65;
/// Glitch threshold as a fraction of the mid-scan dit length.
const MORPH_DIT_FRACTION: f32 = 0.38;
/// Schmitt/noise refresh cadence in frames.
const THRESHOLD_REFRESH_FRAMES: u64 = 8;

/// Spaces at or above this many units separate words.
const WORD_GAP_UNITS: f32 = 5.5;
/// Spaces at or above this many units separate characters.
const CHAR_GAP_UNITS: f32 = 3.0;
/// Marks up to this many units are dots.
const DOT_MAX_UNITS: f32 = 1.5;
/// Unit PLL gains.
const MARK_EMA: f32 = 0.12;
const SPACE_EMA: f32 = 0.06;
/// Longest symbol tracked.
const SYMBOL_CAP: usize = 7;
/// Consecutive silence, in units, that declares the signal lost.
const LOSS_SPACE_UNITS: f32 = 60.0;
/// Unit estimate survival band relative to the locked dit length.
const UNIT_BAND_LO: f32 = 0.60;
const UNIT_BAND_HI: f32 = 1.55;

const WPM_SCAN_MIN: f32 = 5.0;
const WPM_SCAN_MAX: f32 = 40.0;

/// Unit-length PLL and symbol assembler for the locked phase.
struct Tracker {
    unit_est: f32,
    unit_min: f32,
    unit_max: f32,
    symbol: String,
    emitted_since_sep: bool,
}

impl Tracker {
    fn new(unit_frames: f32) -> Self {
        Tracker {
            unit_est: unit_frames,
            unit_min: UNIT_BAND_LO * unit_frames,
            unit_max: UNIT_BAND_HI * unit_frames,
            symbol: String::with_capacity(SYMBOL_CAP),
            emitted_since_sep: false,
        }
    }

    /// Process one completed run. Returns `false` when the unit estimate has
    /// wandered out of the survival band.
    fn on_run(&mut self, run: Run, events: &mut Vec<MorseEvent>) -> bool {
        let len = run.len as f32;
        match run.state {
            RunState::Mark => {
                let units = len / self.unit_est;
                let target = if units <= DOT_MAX_UNITS {
                    if self.symbol.len() < SYMBOL_CAP {
                        self.symbol.push('.');
                    }
                    1.0
                } else {
                    if self.symbol.len() < SYMBOL_CAP {
                        self.symbol.push('-');
                    }
                    3.0
                };
                self.unit_est += MARK_EMA * (len / target - self.unit_est);
            }
            RunState::Space => {
                let units = len / self.unit_est;
                if units >= WORD_GAP_UNITS {
                    self.flush_symbol(events);
                    if self.emitted_since_sep {
                        events.push(MorseEvent::WordSep);
                        self.emitted_since_sep = false;
                    }
                } else if units >= CHAR_GAP_UNITS {
                    self.flush_symbol(events);
                } else {
                    self.unit_est += SPACE_EMA * (len - self.unit_est);
                }
            }
        }
        self.unit_est >= self.unit_min && self.unit_est <= self.unit_max
    }

    /// Frame-level gap handling while a space run is still open, so the
    /// last character of an over does not wait for the next key-down.
    /// Idempotent: the flush is a no-op once the symbol is gone and the
    /// separator is guarded by `emitted_since_sep`.
    fn on_space_frames(&mut self, len: u32, events: &mut Vec<MorseEvent>) {
        let units = len as f32 / self.unit_est;
        if units >= WORD_GAP_UNITS {
            self.flush_symbol(events);
            if self.emitted_since_sep {
                events.push(MorseEvent::WordSep);
                self.emitted_since_sep = false;
            }
        } else if units >= CHAR_GAP_UNITS {
            self.flush_symbol(events);
        }
    }

    fn flush_symbol(&mut self, events: &mut Vec<MorseEvent>) {
        if self.symbol.is_empty() {
            return;
        }
        let ch = table::lookup(&self.symbol).unwrap_or('?');
        events.push(MorseEvent::Char(ch));
        self.symbol.clear();
        self.emitted_since_sep = true;
    }
}

enum Phase {
    Acquire,
    Locked(Tracker),
}

pub struct MorseDecoder {
    frame_rate: f32,
    agc: Agc,
    schmitt: Schmitt,
    frames: u64,
    current_bit: Option<bool>,
    run_len: u32,
    ring: RunRing,
    runs_since_estimate: u32,
    phase: Phase,
    space_frames: u32,
}

impl MorseDecoder {
    pub fn new(frame_rate: f32) -> Self {
        MorseDecoder {
            frame_rate,
            agc: Agc::new(),
            schmitt: Schmitt::new(),
            frames: 0,
            current_bit: None,
            run_len: 0,
            ring: RunRing::new(RING_CAPACITY),
            runs_since_estimate: 0,
            phase: Phase::Acquire,
            space_frames: 0,
        }
    }

    pub fn is_locked(&self) -> bool {
        matches!(self.phase, Phase::Locked(_))
    }

    /// Current unit estimate in frames; 0 while acquiring.
    pub fn unit_estimate(&self) -> f32 {
        match &self.phase {
            Phase::Locked(t) => t.unit_est,
            Phase::Acquire => 0.0,
        }
    }

    /// Feed one tone-bin magnitude; decoded events append to `events`.
    pub fn push(&mut self, magnitude: f32, events: &mut Vec<MorseEvent>) {
        self.frames += 1;
        self.agc.push(magnitude);
        if self.frames % THRESHOLD_REFRESH_FRAMES == 0 {
            self.agc.refresh_noise();
            self.schmitt
                .update_thresholds(self.agc.peak(), self.agc.noise(), self.frames);
        }

        // An unusable envelope reads as key-up
        let bit = self.schmitt.slice(magnitude).unwrap_or(false);

        match self.current_bit {
            Some(prev) if prev == bit => self.run_len += 1,
            Some(prev) => {
                let run = Run {
                    state: if prev { RunState::Mark } else { RunState::Space },
                    len: self.run_len,
                };
                self.on_completed_run(run, events);
                self.current_bit = Some(bit);
                self.run_len = 1;
            }
            None => {
                self.current_bit = Some(bit);
                self.run_len = 1;
            }
        }

        if bit {
            self.space_frames = 0;
        } else {
            self.space_frames += 1;
        }

        let mut lost = false;
        if let Phase::Locked(tracker) = &mut self.phase {
            if !bit {
                tracker.on_space_frames(self.run_len, events);
                if self.space_frames as f32 > LOSS_SPACE_UNITS * tracker.unit_est {
                    lost = true;
                }
            }
        }
        if lost {
            debug!(space_frames = self.space_frames, "carrier lost");
            events.push(MorseEvent::Lost);
            self.drop_to_acquire();
        }
    }

    fn on_completed_run(&mut self, run: Run, events: &mut Vec<MorseEvent>) {
        match std::mem::replace(&mut self.phase, Phase::Acquire) {
            Phase::Acquire => {
                self.ring.push(run);
                self.runs_since_estimate += 1;
                if self.runs_since_estimate >= ESTIMATE_EVERY_RUNS {
                    self.runs_since_estimate = 0;
                    self.try_lock(events);
                }
            }
            Phase::Locked(mut tracker) => {
                if tracker.on_run(run, events) {
                    self.phase = Phase::Locked(tracker);
                } else {
                    debug!("unit estimate out of band");
                    events.push(MorseEvent::Lost);
                    self.drop_to_acquire();
                }
            }
        }
    }

    fn try_lock(&mut self, events: &mut Vec<MorseEvent>) {
        let marks = (0..self.ring.len())
            .filter(|&i| self.ring.get(i).state == RunState::Mark)
            .count();
        if marks < MIN_MARKS {
            return;
        }

        let mut runs = self.ring.snapshot();
        let mid_wpm = (WPM_SCAN_MIN + WPM_SCAN_MAX) / 2.0;
        let min_run = (MORPH_DIT_FRACTION * dit_frames(mid_wpm, self.frame_rate)).round() as u32;
        morphological_clean(&mut runs, min_run.max(1));

        let Some(est) = estimate(&runs, WPM_SCAN_MIN, WPM_SCAN_MAX, self.frame_rate) else {
            return;
        };
        if est.confidence < LOCK_CONFIDENCE {
            return;
        }

        debug!(wpm = est.wpm, confidence = est.confidence, "locked");
        events.push(MorseEvent::Locked(est.wpm));
        let mut tracker = Tracker::new(est.unit_frames);
        // Replay the buffered runs to recover characters already received
        for run in runs {
            tracker.on_run(run, events);
        }
        self.ring.clear();
        self.space_frames = 0;
        self.phase = Phase::Locked(tracker);
    }

    fn drop_to_acquire(&mut self) {
        self.phase = Phase::Acquire;
        self.ring.clear();
        self.runs_since_estimate = 0;
        self.space_frames = 0;
    }
}
