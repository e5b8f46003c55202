//! CW transmit keyer.
//!
//! Compiles text (or the alignment-dash carrier) into a key-line timeline in
//! milliseconds, standard 1/3/7 element timing at the configured WPM.

use super::table::pattern_for;

/// One key-line segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeySegment {
    pub key_down: bool,
    pub duration_ms: u32,
}

/// Dit duration at a given speed.
pub fn dit_ms(wpm: u8) -> u32 {
    1200 / wpm.max(1) as u32
}

/// Key a text message. Unknown characters are dropped; spaces become word
/// gaps.
pub fn key_text(text: &str, wpm: u8) -> Vec<KeySegment> {
    let dit = dit_ms(wpm);
    let mut timeline: Vec<KeySegment> = Vec::new();

    let push = |down: bool, units: u32, timeline: &mut Vec<KeySegment>| {
        let duration_ms = units * dit;
        if let Some(last) = timeline.last_mut() {
            if last.key_down == down {
                last.duration_ms += duration_ms;
                return;
            }
        }
        timeline.push(KeySegment {
            key_down: down,
            duration_ms,
        });
    };

    for word in text.split_whitespace() {
        if let Some(last) = timeline.last() {
            if !last.key_down {
                // Stretch the trailing character gap to a word gap
                push(false, 4, &mut timeline);
            }
        }
        for ch in word.chars() {
            let Some(pattern) = pattern_for(ch) else {
                continue;
            };
            for element in pattern.chars() {
                let units = if element == '-' { 3 } else { 1 };
                push(true, units, &mut timeline);
                push(false, 1, &mut timeline);
            }
            // Element gap already present; extend to a character gap
            push(false, 2, &mut timeline);
        }
    }
    timeline
}

/// Continuous dashes for spectrum alignment: `count` dashes with element
/// gaps.
pub fn alignment_dashes(wpm: u8, count: usize) -> Vec<KeySegment> {
    let dit = dit_ms(wpm);
    let mut timeline = Vec::with_capacity(count * 2);
    for _ in 0..count {
        timeline.push(KeySegment {
            key_down: true,
            duration_ms: 3 * dit,
        });
        timeline.push(KeySegment {
            key_down: false,
            duration_ms: dit,
        });
    }
    timeline
}
