//! Face-descriptor comparison.
//!
//! Descriptors are fixed-length numeric vectors produced by an external
//! face-embedding model; this module only compares them. Matching is a plain
//! Euclidean-distance check against a fixed threshold.

use thiserror::Error;

/// Maximum Euclidean distance at which two descriptors count as the same face.
pub const MATCH_THRESHOLD: f64 = 0.6;

/// Probe and candidate descriptors must have the same dimensionality.
/// A mismatch is a caller error, not a failed match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("descriptor length mismatch: probe has {probe} values, candidate has {candidate}")]
pub struct DimensionMismatch {
    pub probe: usize,
    pub candidate: usize,
}

pub fn euclidean_distance(a: &[f64], b: &[f64]) -> Result<f64, DimensionMismatch> {
    if a.len() != b.len() {
        return Err(DimensionMismatch {
            probe: a.len(),
            candidate: b.len(),
        });
    }
    let sum: f64 = a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum();
    Ok(sum.sqrt())
}

/// Whether `candidate` is within [`MATCH_THRESHOLD`] of `probe`.
pub fn within_threshold(probe: &[f64], candidate: &[f64]) -> Result<bool, DimensionMismatch> {
    Ok(euclidean_distance(probe, candidate)? <= MATCH_THRESHOLD)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_of_identical_vectors_is_zero() {
        let v = vec![0.1, -0.2, 0.3];
        assert_eq!(euclidean_distance(&v, &v).unwrap(), 0.0);
    }

    #[test]
    fn distance_matches_hand_computation() {
        let a = [0.0, 0.0];
        let b = [3.0, 4.0];
        assert!((euclidean_distance(&a, &b).unwrap() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn threshold_is_inclusive() {
        let a = [0.0];
        let b = [MATCH_THRESHOLD];
        assert!(within_threshold(&a, &b).unwrap());
        let c = [MATCH_THRESHOLD + 1e-9];
        assert!(!within_threshold(&a, &c).unwrap());
    }

    #[test]
    fn mismatched_lengths_are_an_error() {
        let err = euclidean_distance(&[1.0, 2.0], &[1.0]).unwrap_err();
        assert_eq!(
            err,
            DimensionMismatch {
                probe: 2,
                candidate: 1
            }
        );
    }
}
