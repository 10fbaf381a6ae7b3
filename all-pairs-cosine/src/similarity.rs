//! Cosine similarity on binary vectors and the bounds derived from it.
//!
//! All threshold comparisons in this crate go through [`required_overlap`], so that
//! a pair at exactly the threshold is judged identically by every pruning step and
//! by the final verification.
use std::cmp::Ordering;

use crate::errors::{AllPairsError, Result};
use crate::FeatureId;

/// Checks that `threshold` is in the range of (0,1].
pub fn validate_threshold(threshold: f64) -> Result<()> {
    if threshold > 0. && threshold <= 1. {
        Ok(())
    } else {
        Err(AllPairsError::input(format!(
            "The similarity threshold must be in (0,1], but got {threshold}."
        )))
    }
}

/// Gets the overlap that two records of lengths `len_x` and `len_y` must reach,
/// i.e., `threshold * sqrt(len_x * len_y)` in double precision.
///
/// A pair is similar iff its overlap is no less than the returned value.
#[inline(always)]
pub fn required_overlap(threshold: f64, len_x: usize, len_y: usize) -> f64 {
    threshold * (len_x as f64 * len_y as f64).sqrt()
}

/// Checks if `overlap` shared features are enough for records of lengths `len_x` and `len_y`.
#[inline(always)]
pub fn reaches_threshold(overlap: usize, threshold: f64, len_x: usize, len_y: usize) -> bool {
    overlap as f64 >= required_overlap(threshold, len_x, len_y)
}

/// Gets the position from which the features of a record of length `len` are indexed.
///
/// The returned `p` is the largest integer strictly less than `threshold * len`.
/// Any later record `z` (with `|z| >= len`) similar to this record shares at least
/// `threshold * len > p` features with it, so at least one of them is in the indexed suffix.
#[inline(always)]
pub fn index_position(threshold: f64, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let bound = (threshold * len as f64).ceil() as usize;
    bound.saturating_sub(1).min(len - 1)
}

/// Counts the common elements of two strictly ascending sequences.
pub fn intersection_size(xs: &[FeatureId], ys: &[FeatureId]) -> usize {
    let (mut i, mut j) = (0, 0);
    let mut overlap = 0;
    while i < xs.len() && j < ys.len() {
        match xs[i].cmp(&ys[j]) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                overlap += 1;
                i += 1;
                j += 1;
            }
        }
    }
    overlap
}

/// Computes the cosine similarity of two binary vectors given as ascending feature ids.
///
/// # Examples
///
/// ```
/// use all_pairs_cosine::similarity::cosine;
///
/// assert_eq!(cosine(&[0, 1], &[0, 1, 2, 3, 4, 5, 6, 7]), 0.5);
/// assert_eq!(cosine(&[], &[0]), 0.);
/// ```
pub fn cosine(xs: &[FeatureId], ys: &[FeatureId]) -> f64 {
    if xs.is_empty() || ys.is_empty() {
        return 0.;
    }
    intersection_size(xs, ys) as f64 / (xs.len() as f64 * ys.len() as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_threshold() {
        assert!(validate_threshold(0.5).is_ok());
        assert!(validate_threshold(1.).is_ok());
        assert!(validate_threshold(0.).is_err());
        assert!(validate_threshold(-0.1).is_err());
        assert!(validate_threshold(1.01).is_err());
        assert!(validate_threshold(f64::NAN).is_err());
    }

    #[test]
    fn test_index_position() {
        assert_eq!(index_position(1., 10), 9);
        assert_eq!(index_position(0.5, 2), 0);
        assert_eq!(index_position(0.5, 3), 1);
        assert_eq!(index_position(0.1, 10), 0);
        assert_eq!(index_position(0.8, 4), 3);
        assert_eq!(index_position(0.01, 1), 0);
        assert_eq!(index_position(0.3, 0), 0);
    }

    #[test]
    fn test_index_position_keeps_a_shared_feature() {
        // Exhaustively checks that the unindexed prefix alone never reaches the threshold.
        for t in 1..=100 {
            let threshold = t as f64 / 100.;
            for len in 1..200 {
                let p = index_position(threshold, len);
                assert!(p < len);
                for other in len..len + 20 {
                    assert!(!reaches_threshold(p, threshold, len, other));
                }
            }
        }
    }

    #[test]
    fn test_inclusive_threshold() {
        assert!(reaches_threshold(2, 0.5, 2, 8));
        assert!(reaches_threshold(10, 1., 10, 10));
        assert!(!reaches_threshold(9, 1., 10, 10));
        assert!(reaches_threshold(3, 0.8, 4, 3));
        assert!(!reaches_threshold(2, 0.8, 3, 3));
    }

    #[test]
    fn test_intersection_size() {
        assert_eq!(intersection_size(&[0, 1, 2, 3], &[1, 2, 3]), 3);
        assert_eq!(intersection_size(&[0, 2, 4], &[1, 3, 5]), 0);
        assert_eq!(intersection_size(&[], &[1, 3, 5]), 0);
        assert_eq!(intersection_size(&[5, 9, 11], &[1, 5, 11, 20]), 2);
    }

    #[test]
    fn test_cosine() {
        assert_eq!(cosine(&[0, 1, 2], &[0, 1, 2]), 1.);
        assert_eq!(cosine(&[0, 1, 2], &[1, 2, 3]), 2. / 3.);
        assert_eq!(cosine(&[0], &[1]), 0.);
    }
}
