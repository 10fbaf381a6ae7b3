//! Probing of one record against the partial index.
use std::io;

use crate::candidates::CandidateMap;
use crate::errors::{AllPairsError, Result};
use crate::index::{PartialIndex, Posting};
use crate::similarity::{intersection_size, reaches_threshold, required_overlap};
use crate::stats::Statistics;
use crate::store::RecordStore;
use crate::{FeatureId, RecordId};

/// Finder of the indexed records similar to a query record.
///
/// The candidate accumulators are kept as scratch space across queries,
/// so that a steady-state query allocates nothing.
#[derive(Clone, Debug)]
pub struct Matcher {
    threshold: f64,
    candidates: CandidateMap,
}

impl Matcher {
    /// Creates an instance for a threshold in (0,1].
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            candidates: CandidateMap::new(),
        }
    }

    /// Gets the similarity threshold.
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Emits every pair `(x, rid)` such that `x` is in `index` and
    /// the cosine similarity of `x` and `features` reaches the threshold.
    ///
    /// `features` must not be shorter than any indexed record.
    /// Postings of records too short to pair with `features` are dropped from `index`,
    /// since later queries are no shorter.
    pub fn find_matches<F>(
        &mut self,
        rid: RecordId,
        features: &[FeatureId],
        index: &mut PartialIndex,
        store: &RecordStore,
        stats: &mut Statistics,
        mut emit: F,
    ) -> Result<()>
    where
        F: FnMut(RecordId, RecordId) -> io::Result<()>,
    {
        self.candidates.clear();
        if features.is_empty() {
            return Ok(());
        }
        self.generate_candidates(features, index, store);
        let result = self.verify_candidates(rid, features, store, stats, &mut emit);
        self.candidates.clear();
        result
    }

    // Scans the features from the last to the first, so that the shared features
    // not yet seen for a candidate are no larger than the current one.
    fn generate_candidates(
        &mut self,
        features: &[FeatureId],
        index: &mut PartialIndex,
        store: &RecordStore,
    ) {
        let len_y = features.len();
        for (j, &feature) in features.iter().enumerate().rev() {
            let num_too_short = index
                .postings(feature)
                .iter()
                .take_while(|p| {
                    let len_x = store.record(p.rid).features.len();
                    (len_x as f64) < required_overlap(self.threshold, len_x, len_y)
                })
                .count();
            if num_too_short != 0 {
                index.advance_head(feature, num_too_short);
            }

            for &Posting { rid: x, pos: k } in index.postings(feature) {
                if self.candidates.get(x).is_some() {
                    self.candidates.add(x, 1);
                    continue;
                }
                // No shared feature above this one, so at most min(j,k)+1 are left.
                let bound = j.min(k as usize) + 1;
                let len_x = store.record(x).features.len();
                if reaches_threshold(bound, self.threshold, len_x, len_y) {
                    self.candidates.add(x, 1);
                }
            }
        }
    }

    fn verify_candidates<F>(
        &self,
        rid: RecordId,
        features: &[FeatureId],
        store: &RecordStore,
        stats: &mut Statistics,
        emit: &mut F,
    ) -> Result<()>
    where
        F: FnMut(RecordId, RecordId) -> io::Result<()>,
    {
        let len_y = features.len();
        for (x, score) in self.candidates.iter() {
            stats.candidates_considered += 1;
            let record = store.record(x);
            let len_x = record.features.len();
            let score = score as usize;
            // The unindexed prefix can only meet the features of y not hit in the suffix.
            let upper = score + record.prefix_len.min(len_y - score);
            if !reaches_threshold(upper, self.threshold, len_x, len_y) {
                continue;
            }
            stats.intersections_performed += 1;
            let overlap = intersection_size(record.features, features);
            if reaches_threshold(overlap, self.threshold, len_x, len_y) {
                stats.similar_pairs += 1;
                emit(x, rid).map_err(AllPairsError::Output)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::index_position;

    struct Fixture {
        matcher: Matcher,
        index: PartialIndex,
        store: RecordStore,
        stats: Statistics,
    }

    impl Fixture {
        fn new(threshold: f64, max_feature_id: FeatureId) -> Self {
            Self {
                matcher: Matcher::new(threshold),
                index: PartialIndex::new(max_feature_id),
                store: RecordStore::new(),
                stats: Statistics::default(),
            }
        }

        fn match_and_index(&mut self, features: &[FeatureId]) -> Vec<(RecordId, RecordId)> {
            let rid = self.store.end_rid();
            let mut matched = vec![];
            self.matcher
                .find_matches(
                    rid,
                    features,
                    &mut self.index,
                    &self.store,
                    &mut self.stats,
                    |x, y| {
                        matched.push((x, y));
                        Ok(())
                    },
                )
                .unwrap();
            let p = index_position(self.matcher.threshold(), features.len());
            for (k, &f) in features.iter().enumerate().skip(p) {
                self.index.append(f, rid, k as u32);
            }
            self.store.push(rid, features, p);
            matched.sort_unstable();
            matched
        }
    }

    #[test]
    fn test_identical_records() {
        let mut fx = Fixture::new(1., 10);
        assert_eq!(fx.match_and_index(&[0, 1, 2]), vec![]);
        assert_eq!(fx.match_and_index(&[0, 1, 2]), vec![(0, 1)]);
        assert_eq!(fx.match_and_index(&[0, 1, 3]), vec![]);
        assert_eq!(fx.match_and_index(&[0, 1, 2]), vec![(0, 3), (1, 3)]);
        assert_eq!(fx.stats.similar_pairs, 3);
    }

    #[test]
    fn test_inclusive_threshold() {
        let mut fx = Fixture::new(0.5, 10);
        fx.match_and_index(&[0, 1]);
        assert_eq!(fx.match_and_index(&[0, 1, 2, 3, 4, 5, 6, 7]), vec![(0, 1)]);
    }

    #[test]
    fn test_prefix_overlap_is_verified() {
        // With t=0.5 and |x|=3, the first feature of x is not indexed.
        let mut fx = Fixture::new(0.5, 10);
        fx.match_and_index(&[0, 5, 9]);
        assert_eq!(fx.match_and_index(&[0, 5, 7]), vec![(0, 1)]);
        assert_eq!(fx.match_and_index(&[1, 2, 9]), vec![]);
    }

    #[test]
    fn test_too_short_postings_are_dropped() {
        let mut fx = Fixture::new(0.9, 20);
        fx.match_and_index(&[10]);
        assert_eq!(fx.index.postings(10).len(), 1);
        fx.match_and_index(&[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
        assert!(fx.index.postings(10).iter().all(|p| p.rid != 0));
    }

    #[test]
    fn test_empty_query() {
        let mut fx = Fixture::new(0.1, 4);
        fx.match_and_index(&[1]);
        let mut matched = vec![];
        fx.matcher
            .find_matches(1, &[], &mut fx.index, &fx.store, &mut fx.stats, |x, y| {
                matched.push((x, y));
                Ok(())
            })
            .unwrap();
        assert!(matched.is_empty());
    }

    #[test]
    fn test_sink_failure() {
        let mut fx = Fixture::new(0.5, 4);
        fx.match_and_index(&[1, 2]);
        let result = fx.matcher.find_matches(
            1,
            &[1, 2],
            &mut fx.index,
            &fx.store,
            &mut fx.stats,
            |_, _| Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed")),
        );
        assert!(matches!(result, Err(AllPairsError::Output(_))));
        assert!(fx.matcher.candidates.is_empty());
    }

    #[test]
    fn test_counters() {
        let mut fx = Fixture::new(0.5, 10);
        fx.match_and_index(&[0, 1, 2]);
        fx.match_and_index(&[2, 3, 4]);
        fx.match_and_index(&[0, 1, 2, 4]);
        let stats = fx.stats;
        assert!(stats.similar_pairs <= stats.intersections_performed);
        assert!(stats.intersections_performed <= stats.candidates_considered);
        assert_eq!(stats.similar_pairs, 2);
    }
}
