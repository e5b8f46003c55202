//! Rate-1/2 K=32 convolutional code and Fano sequential decoder.
//!
//! The decoder walks a node array, one node per hypothesis bit, with a
//! moving threshold: step forward while the running metric stays above it,
//! tighten it on first visits, back up and try the alternate branch when the
//! metric falls below, and relax the threshold when no back move is
//! possible. The last 31 bits are a known zero tail, so tail nodes carry a
//! single branch.

use super::tables::{METTAB, PARTAB, POLY1, POLY2, TAIL_BITS};

/// Channel symbol pair generated by the encoder state: parity of the two
/// polynomial taps, first polynomial in the high bit.
#[inline]
fn channel_pair(encstate: u32) -> usize {
    let mut a = encstate & POLY1;
    a ^= a >> 16;
    let hi = PARTAB[((a ^ (a >> 8)) & 0xFF) as usize] as usize;
    let mut b = encstate & POLY2;
    b ^= b >> 16;
    let lo = PARTAB[((b ^ (b >> 8)) & 0xFF) as usize] as usize;
    (hi << 1) | lo
}

/// Convolutionally encode a stream of info bits (values 0/1), two coded
/// bits out per bit in. The caller supplies the zero tail.
pub fn encode(info_bits: &[u8]) -> Vec<u8> {
    let mut state = 0u32;
    let mut coded = Vec::with_capacity(info_bits.len() * 2);
    for &bit in info_bits {
        state = (state << 1) | bit as u32;
        let pair = channel_pair(state);
        coded.push((pair >> 1) as u8);
        coded.push((pair & 1) as u8);
    }
    coded
}

#[derive(Clone, Copy, Default)]
struct Node {
    encstate: u32,
    gamma: i64,
    /// Branch metrics for the four possible channel symbol pairs.
    metrics: [i64; 4],
    /// Sorted metrics of the two one-step hypotheses.
    tm: [i64; 2],
    /// Hypothesis currently pursued: 0 = best, 1 = alternate.
    hyp: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanoResult {
    /// Decoded bytes, one per 8 hypothesis bits (the trailing partial byte
    /// of the tail is dropped).
    pub data: Vec<u8>,
    /// Final path metric; negative means the path never fit the symbols.
    pub metric: i64,
    pub cycles: u64,
}

/// Sequentially decode `2 * nbits` soft symbols. Returns `None` when the
/// cycle budget (`maxcycles_per_bit * nbits`) is exhausted.
pub fn decode(
    symbols: &[u8],
    nbits: usize,
    delta: i32,
    maxcycles_per_bit: u64,
) -> Option<FanoResult> {
    debug_assert_eq!(symbols.len(), 2 * nbits);
    debug_assert!(nbits > TAIL_BITS);

    let tail = nbits - TAIL_BITS;
    let delta = delta as i64;
    let mut nodes = vec![Node::default(); nbits + 1];

    for (k, node) in nodes.iter_mut().enumerate().take(nbits) {
        let s0 = symbols[2 * k] as usize;
        let s1 = symbols[2 * k + 1] as usize;
        node.metrics = [
            (METTAB[0][s0] + METTAB[0][s1]) as i64,
            (METTAB[0][s0] + METTAB[1][s1]) as i64,
            (METTAB[1][s0] + METTAB[0][s1]) as i64,
            (METTAB[1][s0] + METTAB[1][s1]) as i64,
        ];
    }

    // Root node: sort the two branch hypotheses. The 0- and 1-branch channel
    // pairs are complements because both polynomial LSBs are set.
    let lsym = channel_pair(0);
    let m0 = nodes[0].metrics[lsym];
    let m1 = nodes[0].metrics[3 ^ lsym];
    if m0 > m1 {
        nodes[0].tm = [m0, m1];
    } else {
        nodes[0].tm = [m1, m0];
        nodes[0].encstate = 1;
    }

    let mut t: i64 = 0;
    let mut np = 0usize;
    let max_total = maxcycles_per_bit.saturating_mul(nbits as u64);
    let mut cycles: u64 = 0;

    while cycles < max_total {
        cycles += 1;
        let ngamma = nodes[np].gamma + nodes[np].tm[nodes[np].hyp];

        if ngamma >= t {
            // Tighten only on the first visit to this node
            if nodes[np].gamma < t + delta {
                while ngamma >= t + delta {
                    t += delta;
                }
            }
            nodes[np + 1].gamma = ngamma;
            nodes[np + 1].encstate = nodes[np].encstate << 1;
            np += 1;

            if np == nbits {
                let metric = nodes[np].gamma;
                let mut data = Vec::with_capacity(nbits / 8);
                for byte in 0..nbits / 8 {
                    data.push(nodes[7 + 8 * byte].encstate as u8);
                }
                return Some(FanoResult {
                    data,
                    metric,
                    cycles,
                });
            }

            let lsym = channel_pair(nodes[np].encstate);
            if np >= tail {
                // Tail bits are known zero: single branch
                nodes[np].tm[0] = nodes[np].metrics[lsym];
            } else {
                let m0 = nodes[np].metrics[lsym];
                let m1 = nodes[np].metrics[3 ^ lsym];
                if m0 > m1 {
                    nodes[np].tm = [m0, m1];
                } else {
                    nodes[np].tm = [m1, m0];
                    nodes[np].encstate |= 1;
                }
            }
            nodes[np].hyp = 0;
        } else {
            loop {
                if np == 0 || nodes[np - 1].gamma < t {
                    // No back branch either: relax the threshold and retry
                    // the best branch from here
                    t -= delta;
                    if nodes[np].hyp != 0 {
                        nodes[np].hyp = 0;
                        nodes[np].encstate ^= 1;
                    }
                    break;
                }
                np -= 1;
                if np < tail && nodes[np].hyp != 1 {
                    nodes[np].hyp = 1;
                    nodes[np].encstate ^= 1;
                    break;
                }
            }
        }
    }

    None
}
