//! Beacon frame alignment: sync search, bit extraction, interleaving.
//!
//! The receive cache holds more symbols than one frame, so the known sync
//! vector is slid across every candidate start position and the alignment
//! with the fewest mismatches wins. Data bits then come from bit 1 of each
//! label, scattered back through the mode's interleave permutation.

use bitvec::prelude::*;

/// Best sync alignment found in a label buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncAlignment {
    pub start: usize,
    pub mismatches: usize,
}

/// Slide `sync` across `labels` and count sync-bit mismatches at each start.
/// Returns `None` when the buffer is shorter than one frame.
pub fn find_sync(labels: &[u8], sync: &[u8]) -> Option<SyncAlignment> {
    if labels.len() < sync.len() {
        return None;
    }
    let mut best = SyncAlignment {
        start: 0,
        mismatches: usize::MAX,
    };
    for start in 0..=labels.len() - sync.len() {
        let mut mismatches = 0;
        for (s, &expected) in sync.iter().enumerate() {
            if labels[start + s] & 1 != expected {
                mismatches += 1;
            }
        }
        if mismatches < best.mismatches {
            best = SyncAlignment { start, mismatches };
        }
    }
    Some(best)
}

/// Extract data bits (bit 1 of each label) starting at the aligned frame.
/// `skip_first` drops the leading known-zero slot of modes whose frame
/// carries one more symbol than coded bits.
pub fn extract_bits(labels: &[u8], start: usize, bit_count: usize, skip_first: bool) -> Vec<u8> {
    let offset = if skip_first { 1 } else { 0 };
    (0..bit_count)
        .map(|i| (labels[start + i + offset] >> 1) & 1)
        .collect()
}

/// Receive direction: scatter the received bits through the permutation.
pub fn deinterleave(bits: &[u8], table: &[usize]) -> Vec<u8> {
    debug_assert_eq!(bits.len(), table.len());
    let mut out = vec![0u8; bits.len()];
    for (i, &bit) in bits.iter().enumerate() {
        out[table[i]] = bit;
    }
    out
}

/// Transmit direction: read the coded stream through the permutation.
pub fn interleave(bits: &BitSlice<u8, Msb0>, table: &[usize]) -> Vec<u8> {
    debug_assert_eq!(bits.len(), table.len());
    table.iter().map(|&i| bits[i] as u8).collect()
}

/// Transmit direction: combine interleaved data bits with the sync vector
/// into tone labels. When the frame has one more symbol than data bits, the
/// first symbol carries sync only.
pub fn build_symbols(coded: &[u8], sync: &[u8]) -> Vec<u8> {
    let lead = sync.len() - coded.len();
    debug_assert!(lead <= 1);
    let mut symbols = Vec::with_capacity(sync.len());
    for (i, &s) in sync.iter().enumerate() {
        let data = if i < lead { 0 } else { coded[i - lead] };
        symbols.push(s | (data << 1));
    }
    symbols
}
