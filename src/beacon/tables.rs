//! Beacon mode wire constants.
//!
//! Sync vectors, interleave permutations, the convolutional polynomials and
//! the branch metric table. All of these are frozen: a transmitter and a
//! receiver that disagree on any entry simply never decode each other.

use lazy_static::lazy_static;

/// Layland-Lushbaugh rate-1/2 K=32 polynomials.
pub const POLY1: u32 = 0xF2D0_5351;
pub const POLY2: u32 = 0xE461_3C47;

/// Encoder tail of known zero bits.
pub const TAIL_BITS: usize = 31;

/// JT4 frame: 207 symbols, 206 coded data bits, 103 hypothesis bits.
pub const JT4_SYMBOLS: usize = 207;
pub const JT4_DATA_BITS: usize = 206;
pub const JT4_INFO_BITS: usize = 103;

/// PI4 frame: 146 symbols, all carrying data, 73 hypothesis bits.
pub const PI4_SYMBOLS: usize = 146;
pub const PI4_DATA_BITS: usize = 146;
pub const PI4_INFO_BITS: usize = 73;

/// Fano threshold step.
pub const FANO_DELTA: i32 = 60;

/// Fano cycle budget per hypothesis bit.
pub const FANO_MAXCYCLES_PER_BIT: u64 = 20_000;

/// JT4 pseudo-random sync vector, one bit per symbol.
pub const JT4_SYNC: [u8; JT4_SYMBOLS] = [
    1, 0, 0, 0, 0, 0, 1, 0, 0, 1, 0, 1, 1, 0, 1, 0, 1, 0, 1, 0, 1, 1, 1, 0, 1, 1, 1, 0, 1, 1, 1, 0,
    1, 0, 0, 0, 1, 0, 1, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 0, 0,
    0, 0, 0, 0, 0, 0, 1, 0, 1, 1, 0, 0, 1, 0, 0, 1, 1, 0, 0, 1, 0, 1, 1, 1, 1, 1, 0, 0, 0, 1, 1, 0,
    1, 0, 0, 1, 1, 1, 1, 0, 1, 0, 1, 0, 0, 1, 0, 1, 1, 1, 0, 0, 0, 1, 1, 0, 0, 0, 1, 0, 0, 0, 0, 1,
    0, 1, 0, 0, 1, 0, 1, 0, 0, 1, 1, 0, 1, 0, 0, 1, 0, 1, 1, 1, 1, 0, 0, 1, 1, 1, 1, 0, 1, 1, 1, 0,
    1, 0, 0, 0, 0, 1, 1, 0, 0, 0, 0, 0, 1, 1, 1, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 1, 0, 1, 0, 1,
    0, 0, 1, 1, 0, 0, 1, 1, 0, 0, 0, 1, 1, 0, 0,
];

/// PI4 pseudo-random sync vector.
pub const PI4_SYNC: [u8; PI4_SYMBOLS] = [
    0, 0, 1, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1, 1, 1, 1, 1, 1, 0, 1, 0, 1, 1, 1, 1, 1, 0, 0, 1, 0, 0, 1,
    1, 0, 0, 1, 0, 0, 0, 0, 0, 1, 1, 1, 0, 0, 1, 0, 0, 0, 0, 1, 1, 0, 1, 1, 1, 0, 1, 1, 1, 1, 0, 1,
    0, 1, 1, 1, 0, 0, 0, 1, 1, 1, 0, 1, 1, 1, 1, 0, 1, 1, 1, 1, 0, 1, 1, 1, 0, 0, 1, 0, 0, 1, 1, 0,
    0, 1, 1, 0, 0, 0, 1, 1, 0, 0, 0, 0, 1, 1, 1, 1, 1, 0, 1, 0, 0, 0, 0, 1, 0, 0, 1, 0, 0, 0, 1, 1,
    1, 0, 0, 1, 0, 1, 1, 0, 0, 1, 1, 0, 1, 1, 0, 1, 0, 1,
];

/// JT4 bit interleave: the 8-bit bit-reversed addresses below 206, in
/// generation order. Transmit reads the coded stream through this table;
/// receive scatters through it.
pub const JT4_INTERLEAVE: [usize; JT4_DATA_BITS] = [
      0, 128,  64, 192,  32, 160,  96,  16, 144,  80,  48, 176, 112,   8, 136,  72,
    200,  40, 168, 104,  24, 152,  88,  56, 184, 120,   4, 132,  68, 196,  36, 164,
    100,  20, 148,  84,  52, 180, 116,  12, 140,  76, 204,  44, 172, 108,  28, 156,
     92,  60, 188, 124,   2, 130,  66, 194,  34, 162,  98,  18, 146,  82,  50, 178,
    114,  10, 138,  74, 202,  42, 170, 106,  26, 154,  90,  58, 186, 122,   6, 134,
     70, 198,  38, 166, 102,  22, 150,  86,  54, 182, 118,  14, 142,  78,  46, 174,
    110,  30, 158,  94,  62, 190, 126,   1, 129,  65, 193,  33, 161,  97,  17, 145,
     81,  49, 177, 113,   9, 137,  73, 201,  41, 169, 105,  25, 153,  89,  57, 185,
    121,   5, 133,  69, 197,  37, 165, 101,  21, 149,  85,  53, 181, 117,  13, 141,
     77, 205,  45, 173, 109,  29, 157,  93,  61, 189, 125,   3, 131,  67, 195,  35,
    163,  99,  19, 147,  83,  51, 179, 115,  11, 139,  75, 203,  43, 171, 107,  27,
    155,  91,  59, 187, 123,   7, 135,  71, 199,  39, 167, 103,  23, 151,  87,  55,
    183, 119,  15, 143,  79,  47, 175, 111,  31, 159,  95,  63, 191, 127,
];

/// PI4 bit interleave: bit-reversed addresses below 146.
pub const PI4_INTERLEAVE: [usize; PI4_DATA_BITS] = [
      0, 128,  64,  32,  96,  16, 144,  80,  48, 112,   8, 136,  72,  40, 104,  24,
     88,  56, 120,   4, 132,  68,  36, 100,  20,  84,  52, 116,  12, 140,  76,  44,
    108,  28,  92,  60, 124,   2, 130,  66,  34,  98,  18,  82,  50, 114,  10, 138,
     74,  42, 106,  26,  90,  58, 122,   6, 134,  70,  38, 102,  22,  86,  54, 118,
     14, 142,  78,  46, 110,  30,  94,  62, 126,   1, 129,  65,  33,  97,  17, 145,
     81,  49, 113,   9, 137,  73,  41, 105,  25,  89,  57, 121,   5, 133,  69,  37,
    101,  21,  85,  53, 117,  13, 141,  77,  45, 109,  29,  93,  61, 125,   3, 131,
     67,  35,  99,  19,  83,  51, 115,  11, 139,  75,  43, 107,  27,  91,  59, 123,
      7, 135,  71,  39, 103,  23,  87,  55, 119,  15, 143,  79,  47, 111,  31,  95,
     63, 127,
];

/// Branch metric table for 8-bit soft symbols, rows indexed by the
/// hypothesis bit. Log-likelihood construction over an asymmetric channel
/// model (the key-down level sits closer to full scale than key-up sits to
/// zero, with a wider spread), rate-1/2 bias folded in, clamped to
/// [-99, 20]. The rows are deliberately not mirror images; both ends of
/// the link carry this exact data.
pub const METTAB: [[i32; 256]; 2] = [
    [
         10,   10,   10,   10,   10,   10,   10,   10,   10,   10,   10,   10,   10,   10,   10,   10,
         10,   10,    9,    9,    9,    9,    9,    9,    9,    9,    9,    9,    9,    9,    9,    9,
          9,    9,    9,    9,    9,    9,    9,    9,    9,    9,    9,    9,    9,    9,    9,    9,
          9,    9,    9,    9,    9,    8,    8,    8,    8,    8,    8,    8,    8,    8,    8,    8,
          8,    8,    8,    7,    7,    7,    7,    7,    7,    7,    7,    7,    7,    6,    6,    6,
          6,    6,    6,    6,    5,    5,    5,    5,    5,    4,    4,    4,    4,    4,    3,    3,
          3,    3,    2,    2,    2,    1,    1,    1,    1,    0,    0,   -1,   -1,   -1,   -2,   -2,
         -3,   -3,   -3,   -4,   -4,   -5,   -5,   -6,   -7,   -7,   -8,   -8,   -9,  -10,  -10,  -11,
        -12,  -12,  -13,  -14,  -14,  -15,  -16,  -17,  -18,  -18,  -19,  -20,  -21,  -22,  -23,  -24,
        -25,  -26,  -27,  -28,  -29,  -30,  -31,  -32,  -33,  -34,  -35,  -36,  -37,  -39,  -40,  -41,
        -42,  -43,  -45,  -46,  -47,  -48,  -50,  -51,  -52,  -53,  -55,  -56,  -57,  -59,  -60,  -62,
        -63,  -64,  -66,  -67,  -69,  -70,  -71,  -73,  -74,  -76,  -77,  -79,  -80,  -82,  -83,  -85,
        -86,  -88,  -89,  -91,  -92,  -94,  -95,  -97,  -98,  -99,  -99,  -99,  -99,  -99,  -99,  -99,
        -99,  -99,  -99,  -99,  -99,  -99,  -99,  -99,  -99,  -99,  -99,  -99,  -99,  -99,  -99,  -99,
        -99,  -99,  -99,  -99,  -99,  -99,  -99,  -99,  -99,  -99,  -99,  -99,  -99,  -99,  -99,  -99,
        -99,  -99,  -99,  -99,  -99,  -99,  -99,  -99,  -99,  -99,  -99,  -99,  -99,  -99,  -99,  -99,
    ],
    [
        -99,  -99,  -99,  -99,  -99,  -99,  -99,  -99,  -99,  -99,  -99,  -99,  -99,  -99,  -99,  -99,
        -99,  -99,  -99,  -99,  -99,  -99,  -99,  -99,  -99,  -99,  -99,  -99,  -98,  -97,  -96,  -95,
        -95,  -94,  -93,  -92,  -91,  -90,  -89,  -88,  -87,  -86,  -86,  -85,  -84,  -83,  -82,  -81,
        -80,  -79,  -78,  -77,  -76,  -75,  -74,  -73,  -72,  -71,  -70,  -69,  -69,  -68,  -67,  -66,
        -65,  -64,  -63,  -62,  -61,  -60,  -59,  -58,  -57,  -56,  -55,  -54,  -53,  -52,  -51,  -50,
        -49,  -48,  -47,  -46,  -45,  -44,  -43,  -42,  -41,  -40,  -40,  -39,  -38,  -37,  -36,  -35,
        -34,  -33,  -32,  -31,  -30,  -29,  -29,  -28,  -27,  -26,  -25,  -24,  -23,  -22,  -22,  -21,
        -20,  -19,  -18,  -18,  -17,  -16,  -15,  -15,  -14,  -13,  -13,  -12,  -11,  -10,  -10,   -9,
         -9,   -8,   -7,   -7,   -6,   -6,   -5,   -5,   -4,   -4,   -3,   -3,   -2,   -2,   -1,   -1,
          0,    0,    1,    1,    1,    2,    2,    2,    3,    3,    3,    4,    4,    4,    4,    5,
          5,    5,    5,    5,    6,    6,    6,    6,    6,    7,    7,    7,    7,    7,    7,    7,
          8,    8,    8,    8,    8,    8,    8,    8,    8,    8,    9,    9,    9,    9,    9,    9,
          9,    9,    9,    9,    9,    9,    9,    9,    9,    9,    9,    9,    9,    9,   10,   10,
         10,   10,   10,   10,   10,   10,   10,   10,   10,   10,   10,   10,   10,   10,   10,   10,
         10,   10,   10,   10,   10,   10,   10,   10,   10,   10,   10,   10,   10,   10,   10,   10,
         10,   10,   10,   10,   10,   10,   10,   10,   10,   10,   10,   10,   10,   10,   10,   10,
    ],
];

lazy_static! {
    /// Byte parity lookup used by the encoder hot path.
    pub static ref PARTAB: [u8; 256] = {
        let mut table = [0u8; 256];
        for (i, entry) in table.iter_mut().enumerate() {
            *entry = (i.count_ones() & 1) as u8;
        }
        table
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interleave_tables_are_permutations() {
        for (table, len) in [
            (&JT4_INTERLEAVE[..], JT4_DATA_BITS),
            (&PI4_INTERLEAVE[..], PI4_DATA_BITS),
        ] {
            let mut seen = vec![false; len];
            for &i in table {
                assert!(i < len);
                assert!(!seen[i], "duplicate index {}", i);
                seen[i] = true;
            }
        }
    }

    #[test]
    fn test_interleave_is_bit_reversal() {
        // Entry k is the k-th 8-bit bit-reversed address below the limit
        fn bitrev8(mut i: usize) -> usize {
            let mut n = 0;
            for _ in 0..8 {
                n = (n << 1) | (i & 1);
                i >>= 1;
            }
            n
        }
        let expected: Vec<usize> = (0..256).map(bitrev8).filter(|&m| m < 206).collect();
        assert_eq!(&JT4_INTERLEAVE[..], &expected[..]);
        let expected: Vec<usize> = (0..256).map(bitrev8).filter(|&m| m < 146).collect();
        assert_eq!(&PI4_INTERLEAVE[..], &expected[..]);
    }

    #[test]
    fn test_sync_vectors_are_balanced() {
        let ones: usize = JT4_SYNC.iter().map(|&b| b as usize).sum();
        assert!(ones > 70 && ones < 137, "JT4 sync ones = {}", ones);
        let ones: usize = PI4_SYNC.iter().map(|&b| b as usize).sum();
        assert!(ones > 50 && ones < 96, "PI4 sync ones = {}", ones);
    }

    #[test]
    fn test_metric_table_rewards_confident_symbols() {
        assert!(METTAB[0][0] > 0);
        assert!(METTAB[1][255] > 0);
        assert!(METTAB[0][255] < -50);
        assert!(METTAB[1][0] < -50);
        // The midpoint must cost, never pay: an erasure carries no information
        assert!(METTAB[0][128] < 0);
        assert!(METTAB[1][128] < 0);
    }

    #[test]
    fn test_metric_table_is_not_symmetric() {
        // The channel model is skewed: the 1-row must not be the mirrored
        // 0-row.
        let mirrored: Vec<i32> = METTAB[0].iter().rev().copied().collect();
        assert_ne!(&METTAB[1][..], &mirrored[..]);
        let differing = METTAB[1]
            .iter()
            .zip(mirrored.iter())
            .filter(|(a, b)| a != b)
            .count();
        assert!(differing > 100, "only {} entries differ", differing);
    }

    #[test]
    fn test_parity_table() {
        assert_eq!(PARTAB[0], 0);
        assert_eq!(PARTAB[1], 1);
        assert_eq!(PARTAB[3], 0);
        assert_eq!(PARTAB[255], 0);
        assert_eq!(PARTAB[254], 1);
    }

    #[test]
    fn test_polynomials_have_odd_parity_lsb() {
        // Both polynomials must have their LSB set: the decoder relies on the
        // 0- and 1-branch channel pairs being complements.
        assert_eq!(POLY1 & 1, 1);
        assert_eq!(POLY2 & 1, 1);
    }

    #[test]
    fn test_frame_geometry() {
        assert_eq!(JT4_DATA_BITS, 2 * JT4_INFO_BITS);
        assert_eq!(PI4_DATA_BITS, 2 * PI4_INFO_BITS);
        assert_eq!(JT4_SYMBOLS, JT4_DATA_BITS + 1);
        assert_eq!(PI4_SYMBOLS, PI4_DATA_BITS);
        assert_eq!(JT4_INFO_BITS, 72 + TAIL_BITS);
        assert_eq!(PI4_INFO_BITS, 42 + TAIL_BITS);
    }
}
