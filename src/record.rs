//! Fixed-width little-endian framing for one (Allocation, Statistics) pair.
//!
//! Layout: five `f32` statistics in order `{gain, cagr_percent, variance,
//! stddev, sharpe}` followed by `A` `i32` weights. No headers, no
//! separators — the reader must know `A` out-of-band.

use crate::allocation::Allocation;
use crate::error::PortfolioError;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Statistics {
    pub gain: f32,
    pub cagr_percent: f32,
    pub variance: f32,
    pub stddev: f32,
    pub sharpe: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub allocation: Allocation,
    pub statistics: Statistics,
}

pub const STATS_FLOATS: usize = 5;

pub fn frame_size(assets: usize) -> usize {
    STATS_FLOATS * 4 + assets * 4
}

pub fn encode(record: &Record, out: &mut Vec<u8>) {
    let s = &record.statistics;
    out.extend_from_slice(&s.gain.to_le_bytes());
    out.extend_from_slice(&s.cagr_percent.to_le_bytes());
    out.extend_from_slice(&s.variance.to_le_bytes());
    out.extend_from_slice(&s.stddev.to_le_bytes());
    out.extend_from_slice(&s.sharpe.to_le_bytes());
    for w in record.allocation.iter() {
        out.extend_from_slice(&w.to_le_bytes());
    }
}

pub fn decode(bytes: &[u8], assets: usize) -> Result<Record, PortfolioError> {
    let expected = frame_size(assets);
    if bytes.len() != expected {
        return Err(PortfolioError::FramingError {
            len: bytes.len(),
            frame_size: expected,
        });
    }
    let f32_at = |o: usize| f32::from_le_bytes(bytes[o..o + 4].try_into().unwrap());
    let statistics = Statistics {
        gain: f32_at(0),
        cagr_percent: f32_at(4),
        variance: f32_at(8),
        stddev: f32_at(12),
        sharpe: f32_at(16),
    };
    let mut weights = Vec::with_capacity(assets);
    for i in 0..assets {
        let o = 20 + i * 4;
        weights.push(i32::from_le_bytes(bytes[o..o + 4].try_into().unwrap()));
    }
    Ok(Record {
        allocation: Allocation(weights),
        statistics,
    })
}

/// Decodes a concatenation of frames, validating that the total length is
/// an exact multiple of one frame's size.
pub fn decode_stream(bytes: &[u8], assets: usize) -> Result<Vec<Record>, PortfolioError> {
    let fs = frame_size(assets);
    if fs == 0 || bytes.len() % fs != 0 {
        return Err(PortfolioError::FramingError {
            len: bytes.len(),
            frame_size: fs,
        });
    }
    bytes.chunks_exact(fs).map(|c| decode(c, assets)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(assets: usize, seed: i32) -> Record {
        Record {
            allocation: Allocation((0..assets).map(|i| (i as i32 * 7 + seed) % 101).collect()),
            statistics: Statistics {
                gain: 1.234 + seed as f32,
                cagr_percent: 5.6,
                variance: 0.002,
                stddev: 0.04275,
                sharpe: 1.35,
            },
        }
    }

    #[test]
    fn round_trip_preserves_value_within_epsilon() {
        let a = 6;
        let r = sample(a, 3);
        let mut bytes = Vec::new();
        encode(&r, &mut bytes);
        assert_eq!(bytes.len(), frame_size(a));
        let back = decode(&bytes, a).unwrap();
        assert_eq!(back.allocation.0, r.allocation.0);
        assert!((back.statistics.gain - r.statistics.gain).abs() < 1e-5);
        assert!((back.statistics.sharpe - r.statistics.sharpe).abs() < 1e-5);
    }

    #[test]
    fn s5_misaligned_length_is_framing_error() {
        let a = 5;
        let fs = frame_size(a);
        let bytes = vec![0u8; 3 * fs + 7];
        assert!(matches!(
            decode_stream(&bytes, a),
            Err(PortfolioError::FramingError { .. })
        ));
    }

    #[test]
    fn s6_batch_round_trip() {
        let a = 4;
        let records: Vec<Record> = (0..100).map(|i| sample(a, i)).collect();
        let mut bytes = Vec::new();
        for r in &records {
            encode(r, &mut bytes);
        }
        let decoded = decode_stream(&bytes, a).unwrap();
        assert_eq!(decoded.len(), records.len());
        for (orig, back) in records.iter().zip(decoded.iter()) {
            assert_eq!(orig.allocation.0, back.allocation.0);
            assert!((orig.statistics.gain - back.statistics.gain).abs() < 1e-5);
            assert!((orig.statistics.cagr_percent - back.statistics.cagr_percent).abs() < 1e-5);
        }
    }

    #[test]
    fn frame_size_matches_formula() {
        assert_eq!(frame_size(3), 20 + 4 * 3);
    }
}
