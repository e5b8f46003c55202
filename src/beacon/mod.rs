//! JT4G and PI4 beacon decode/encode pipelines.
//!
//! Both modes share the tone detector, the sync-search/de-interleave
//! framing and the Fano machinery; they differ in frame geometry, sync
//! vector, interleave table and payload packing.

pub mod fano;
pub mod framing;
pub mod tables;
pub mod tone;
pub mod unpack;

use bitvec::prelude::*;
use tracing::debug;

use tables::{
    FANO_DELTA, FANO_MAXCYCLES_PER_BIT, JT4_DATA_BITS, JT4_INFO_BITS, JT4_INTERLEAVE, JT4_SYNC,
    PI4_DATA_BITS, PI4_INFO_BITS, PI4_INTERLEAVE, PI4_SYNC, TAIL_BITS,
};
pub use tone::{tone_detect, ToneDecision};
use unpack::RadixError;

/// Reject an alignment with more sync errors than this fraction of the
/// vector.
const MAX_SYNC_ERROR_FRACTION: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeaconMode {
    Jt4,
    Pi4,
}

impl BeaconMode {
    fn sync(&self) -> &'static [u8] {
        match self {
            BeaconMode::Jt4 => &JT4_SYNC,
            BeaconMode::Pi4 => &PI4_SYNC,
        }
    }

    fn interleave(&self) -> &'static [usize] {
        match self {
            BeaconMode::Jt4 => &JT4_INTERLEAVE,
            BeaconMode::Pi4 => &PI4_INTERLEAVE,
        }
    }

    fn data_bits(&self) -> usize {
        match self {
            BeaconMode::Jt4 => JT4_DATA_BITS,
            BeaconMode::Pi4 => PI4_DATA_BITS,
        }
    }

    fn info_bits(&self) -> usize {
        match self {
            BeaconMode::Jt4 => JT4_INFO_BITS,
            BeaconMode::Pi4 => PI4_INFO_BITS,
        }
    }

    /// JT4 frames carry one leading sync-only symbol.
    fn skip_first(&self) -> bool {
        matches!(self, BeaconMode::Jt4)
    }
}

/// End-of-minute decode result. Absence of a message is not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum BeaconOutcome {
    Message { text: String, snr_db: f32 },
    NoSync { mismatches: usize },
    FanoTimeout,
}

pub struct BeaconDecoder {
    mode: BeaconMode,
    snr_peak_db: f32,
}

impl BeaconDecoder {
    pub fn new(mode: BeaconMode) -> Self {
        BeaconDecoder {
            mode,
            snr_peak_db: -99.0,
        }
    }

    pub fn mode(&self) -> BeaconMode {
        self.mode
    }

    /// Track the best per-symbol S/N seen this frame; reported with the
    /// decoded message.
    pub fn note_snr(&mut self, snr_db: f32) {
        self.snr_peak_db = self.snr_peak_db.max(snr_db);
    }

    /// Run the full pipeline over a frame's worth of tone labels.
    pub fn decode(&mut self, labels: &[u8]) -> BeaconOutcome {
        let snr_db = self.snr_peak_db;
        self.snr_peak_db = -99.0;

        let sync = self.mode.sync();
        let alignment = match framing::find_sync(labels, sync) {
            Some(a) => a,
            None => {
                return BeaconOutcome::NoSync {
                    mismatches: usize::MAX,
                }
            }
        };
        if alignment.mismatches > sync.len() / MAX_SYNC_ERROR_FRACTION {
            debug!(
                mismatches = alignment.mismatches,
                start = alignment.start,
                "no acceptable sync alignment"
            );
            return BeaconOutcome::NoSync {
                mismatches: alignment.mismatches,
            };
        }

        let bits = framing::extract_bits(
            labels,
            alignment.start,
            self.mode.data_bits(),
            self.mode.skip_first(),
        );
        let deinterleaved = framing::deinterleave(&bits, self.mode.interleave());
        let soft: Vec<u8> = deinterleaved.iter().map(|&b| b * 255).collect();

        let result = match fano::decode(
            &soft,
            self.mode.info_bits(),
            FANO_DELTA,
            FANO_MAXCYCLES_PER_BIT,
        ) {
            Some(r) if r.metric >= 0 => r,
            _ => return BeaconOutcome::FanoTimeout,
        };
        debug!(
            metric = result.metric,
            cycles = result.cycles,
            "sequential decode converged"
        );

        let text = match self.mode {
            BeaconMode::Jt4 => unpack::unpack_jt4(&result.data),
            BeaconMode::Pi4 => unpack::unpack_pi4(&result.data),
        };
        match text {
            Ok(text) => BeaconOutcome::Message {
                text: text.trim_end().to_string(),
                snr_db,
            },
            Err(_) => BeaconOutcome::FanoTimeout,
        }
    }
}

/// Transmit side: pack a message and build the full tone-label frame.
/// Shared by the loopback tests and the sim binary.
pub fn encode_frame(mode: BeaconMode, message: &str) -> Result<Vec<u8>, RadixError> {
    let (payload, payload_bits): (Vec<u8>, usize) = match mode {
        BeaconMode::Jt4 => (unpack::pack_jt4(message)?.to_vec(), 72),
        BeaconMode::Pi4 => (unpack::pack_pi4(message)?.to_vec(), 42),
    };

    let mut info = Vec::with_capacity(mode.info_bits());
    for i in 0..payload_bits {
        info.push((payload[i / 8] >> (7 - i % 8)) & 1);
    }
    info.extend_from_slice(&[0u8; TAIL_BITS]);

    let coded = fano::encode(&info);
    let mut coded_bits = bitvec![u8, Msb0; 0; coded.len()];
    for (i, &b) in coded.iter().enumerate() {
        coded_bits.set(i, b != 0);
    }

    let tx = framing::interleave(&coded_bits, mode.interleave());
    Ok(framing::build_symbols(&tx, mode.sync()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jt4_frame_loopback() {
        let frame = encode_frame(BeaconMode::Jt4, "G4EML IO91WM").unwrap();
        assert_eq!(frame.len(), 207);

        let mut decoder = BeaconDecoder::new(BeaconMode::Jt4);
        decoder.note_snr(12.5);
        match decoder.decode(&frame) {
            BeaconOutcome::Message { text, snr_db } => {
                assert_eq!(text, "G4EML IO91WM");
                assert!((snr_db - 12.5).abs() < 1e-6);
            }
            other => panic!("expected message, got {:?}", other),
        }
    }

    #[test]
    fn test_pi4_frame_loopback_with_cache_padding() {
        let frame = encode_frame(BeaconMode::Pi4, "PI4TEST").unwrap();
        assert_eq!(frame.len(), 146);

        // Frame sits inside a larger cache with noise labels around it
        let mut labels = vec![0u8; 180];
        for (i, &s) in frame.iter().enumerate() {
            labels[21 + i] = s;
        }
        let mut decoder = BeaconDecoder::new(BeaconMode::Pi4);
        match decoder.decode(&labels) {
            BeaconOutcome::Message { text, .. } => assert_eq!(text, "PI4TEST"),
            other => panic!("expected message, got {:?}", other),
        }
    }

    #[test]
    fn test_random_labels_report_no_sync() {
        // Alternating labels correlate poorly with either sync vector
        let labels: Vec<u8> = (0..240).map(|i| (i % 4) as u8).collect();
        let mut decoder = BeaconDecoder::new(BeaconMode::Jt4);
        assert!(matches!(
            decoder.decode(&labels),
            BeaconOutcome::NoSync { .. }
        ));
    }

    #[test]
    fn test_label_errors_within_fec_budget_still_decode() {
        let mut frame = encode_frame(BeaconMode::Jt4, "CQ BEACON 73").unwrap();
        // Flip the data bit of a few well-separated symbols
        for i in [30usize, 95, 160] {
            frame[i] ^= 0b10;
        }
        let mut decoder = BeaconDecoder::new(BeaconMode::Jt4);
        match decoder.decode(&frame) {
            BeaconOutcome::Message { text, .. } => assert_eq!(text, "CQ BEACON 73"),
            other => panic!("expected message, got {:?}", other),
        }
    }
}
