//! Run-length bookkeeping for the CW decoder.
//!
//! Runs are (state, length) pairs emitted on every slicer transition. The
//! acquire phase collects them in a fixed ring (~11 s at 36 fps) and cleans
//! them with an iterative morphological filter before WPM estimation: glitch
//! runs shorter than a fraction of a dit merge into the larger neighbour,
//! then same-state neighbours coalesce, until stable.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Mark,
    Space,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    pub state: RunState,
    pub len: u32,
}

/// Fixed-capacity overwriting ring of runs.
pub struct RunRing {
    data: Vec<Run>,
    head: usize,
    count: usize,
}

impl RunRing {
    pub fn new(capacity: usize) -> Self {
        RunRing {
            data: vec![
                Run {
                    state: RunState::Space,
                    len: 0
                };
                capacity
            ],
            head: 0,
            count: 0,
        }
    }

    pub fn push(&mut self, run: Run) {
        let slot = (self.head + self.count) % self.data.len();
        self.data[slot] = run;
        if self.count < self.data.len() {
            self.count += 1;
        } else {
            self.head = (self.head + 1) % self.data.len();
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn get(&self, i: usize) -> Run {
        debug_assert!(i < self.count);
        self.data[(self.head + i) % self.data.len()]
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.count = 0;
    }

    /// Oldest-first snapshot for offline cleanup and estimation.
    pub fn snapshot(&self) -> Vec<Run> {
        (0..self.count).map(|i| self.get(i)).collect()
    }
}

/// Merge glitches shorter than `min_run` into the larger neighbour and
/// coalesce same-state neighbours, iterating until stable.
pub fn morphological_clean(runs: &mut Vec<Run>, min_run: u32) {
    loop {
        coalesce(runs);
        let Some(i) = runs.iter().position(|r| r.len < min_run) else {
            break;
        };
        if runs.len() < 2 {
            break;
        }
        let absorbed = runs[i].len;
        let target = if i == 0 {
            1
        } else if i == runs.len() - 1 {
            i - 1
        } else if runs[i - 1].len >= runs[i + 1].len {
            i - 1
        } else {
            i + 1
        };
        runs[target].len += absorbed;
        runs.remove(i);
    }
}

fn coalesce(runs: &mut Vec<Run>) {
    let mut i = 0;
    while i + 1 < runs.len() {
        if runs[i].state == runs[i + 1].state {
            runs[i].len += runs[i + 1].len;
            runs.remove(i + 1);
        } else {
            i += 1;
        }
    }
}
