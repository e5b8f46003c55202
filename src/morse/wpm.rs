//! WPM estimation over a cleaned run buffer.
//!
//! Scans candidate speeds on a 0.5 WPM grid and scores each by how well the
//! run lengths quantise to 1/3/7 units, how many marks land on the dit/dah
//! histogram peaks, and how few sub-dit fragments remain.

use super::runs::{Run, RunState};

/// Dit length in frames for a speed (PARIS timing).
pub fn dit_frames(wpm: f32, frame_rate: f32) -> f32 {
    1.2 / wpm * frame_rate
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WpmEstimate {
    pub wpm: f32,
    /// Unit length actually used for scoring, in frames.
    pub unit_frames: f32,
    /// Fraction of marks on the dit/dah histogram peaks.
    pub confidence: f32,
    pub score: f32,
}

/// Score every candidate speed and return the best. `None` until the buffer
/// holds enough marks to mean anything.
pub fn estimate(
    runs: &[Run],
    wpm_min: f32,
    wpm_max: f32,
    frame_rate: f32,
) -> Option<WpmEstimate> {
    let mark_count = runs.iter().filter(|r| r.state == RunState::Mark).count();
    if mark_count == 0 || runs.is_empty() {
        return None;
    }

    let mut best: Option<WpmEstimate> = None;
    let steps = ((wpm_max - wpm_min) / 0.5) as usize;

    for step in 0..=steps {
        let wpm = wpm_min + step as f32 * 0.5;
        let uf = dit_frames(wpm, frame_rate).round();
        if uf < 1.0 {
            continue;
        }

        let mut penalty = 0.0f32;
        let mut total_weight = 0.0f32;
        let mut sub_count = 0usize;
        let mut hits = 0usize;

        for run in runs {
            let len = run.len as f32;
            if len < 0.5 * uf {
                sub_count += 1;
                continue;
            }
            let units = len / uf;
            let (error, base_weight) = match run.state {
                RunState::Mark => ((units - 1.0).abs().min((units - 3.0).abs()), 1.0),
                RunState::Space => {
                    if units >= 6.0 {
                        ((units - 7.0).abs(), 0.15)
                    } else {
                        ((units - 1.0).abs().min((units - 3.0).abs()), 0.30)
                    }
                }
            };
            let weight = base_weight * len.min(10.0 * uf);
            penalty += error * weight;
            total_weight += weight;

            if run.state == RunState::Mark
                && ((len - uf).abs() <= 0.35 * uf || (len - 3.0 * uf).abs() <= 0.35 * uf)
            {
                hits += 1;
            }
        }

        if total_weight <= 0.0 {
            continue;
        }
        let sub_fraction = sub_count as f32 / runs.len() as f32;
        let confidence = hits as f32 / mark_count as f32;
        let score = -penalty / total_weight + 0.40 * confidence - 1.5 * sub_fraction;

        let candidate = WpmEstimate {
            wpm,
            unit_frames: uf,
            confidence,
            score,
        };
        // Candidates sharing a rounded unit length tie on score; prefer the
        // speed whose true dit length sits closest to that unit
        let better = match best {
            None => true,
            Some(b) => {
                score > b.score
                    || (score == b.score
                        && (dit_frames(wpm, frame_rate) - uf).abs()
                            < (dit_frames(b.wpm, frame_rate) - b.unit_frames).abs())
            }
        };
        if better {
            best = Some(candidate);
        }
    }

    best
}
