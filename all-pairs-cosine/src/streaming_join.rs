//! All-pair similarity search over a stream of records within a posting budget.
use std::io;

use crate::data_source::DataSource;
use crate::errors::{AllPairsError, Result};
use crate::index::PartialIndex;
use crate::matcher::Matcher;
use crate::similarity::{index_position, validate_threshold};
use crate::stats::Statistics;
use crate::store::RecordStore;
use crate::{FeatureId, RecordId};

/// All-pair similarity search with a dynamic partial inverted index,
/// streaming over records of non-decreasing length.
///
/// Each record is matched against the index and then the suffix of it is indexed.
/// When indexing a record would exceed the posting budget, the current pass stops
/// indexing and only matches the rest of the stream; the next pass rewinds the data
/// source to that record and starts over with a fresh index.
/// Every pair is thus found in the pass that indexes its left-side record.
///
/// # Examples
///
/// ```
/// use all_pairs_cosine::data_source::MemoryDataSource;
/// use all_pairs_cosine::StreamingJoiner;
///
/// let mut data = MemoryDataSource::new(vec![vec![0, 1, 2], vec![0, 1, 2], vec![3, 4, 5]]);
/// let mut joiner = StreamingJoiner::new(0.5, 5, 1000).unwrap();
/// let results = joiner.similar_pairs(&mut data).unwrap();
/// assert_eq!(results, vec![(0, 1)]);
/// assert_eq!(joiner.stats().similar_pairs, 1);
/// ```
pub struct StreamingJoiner {
    max_feature_id: FeatureId,
    max_features_in_ram: usize,
    matcher: Matcher,
    index: PartialIndex,
    store: RecordStore,
    stats: Statistics,
    num_passes: usize,
    shows_progress: bool,
}

impl StreamingJoiner {
    /// Creates an instance.
    ///
    /// # Arguments
    ///
    /// * `threshold` - Cosine similarity threshold in the range of (0,1].
    /// * `max_feature_id` - Upper bound of feature ids in input records.
    /// * `max_features_in_ram` - Upper bound of the number of postings in the index (must be more than 0).
    pub fn new(
        threshold: f64,
        max_feature_id: FeatureId,
        max_features_in_ram: usize,
    ) -> Result<Self> {
        validate_threshold(threshold)?;
        if max_features_in_ram == 0 {
            return Err(AllPairsError::input(
                "The number of features in RAM must not be 0.",
            ));
        }
        Ok(Self {
            max_feature_id,
            max_features_in_ram,
            matcher: Matcher::new(threshold),
            index: PartialIndex::new(max_feature_id),
            store: RecordStore::new(),
            stats: Statistics::default(),
            num_passes: 0,
            shows_progress: false,
        })
    }

    /// Prints the progress with stderr?
    pub const fn shows_progress(mut self, yes: bool) -> Self {
        self.shows_progress = yes;
        self
    }

    /// Finds all similar pairs in `data`, passing each pair `(x, y)` with `x < y` to `emit`.
    ///
    /// The statistics keep what was counted until an error, if any.
    pub fn run<D, F>(&mut self, data: &mut D, mut emit: F) -> Result<()>
    where
        D: DataSource + ?Sized,
        F: FnMut(RecordId, RecordId) -> io::Result<()>,
    {
        let threshold = self.matcher.threshold();
        if self.shows_progress {
            eprintln!(
                "[StreamingJoiner::run] threshold={threshold}, max_feature_id={}, max_features_in_ram={}",
                self.max_feature_id, self.max_features_in_ram
            );
        }

        let mut features = vec![];
        let mut pass_start = 0;
        loop {
            self.num_passes += 1;
            self.index.clear();
            self.store.reset(pass_start);
            if self.shows_progress {
                eprintln!(
                    "[StreamingJoiner::run] Pass {} from record {pass_start}",
                    self.num_passes
                );
            }

            let mut boundary = None;
            let mut expected_rid = pass_start;
            let mut prev_len = 0;
            while let Some(rid) = data.next_record(&mut features)? {
                self.validate_record(rid, expected_rid, &features, prev_len)?;
                expected_rid += 1;
                prev_len = features.len();
                if self.shows_progress && (rid + 1) % 100000 == 0 {
                    eprintln!(
                        "[StreamingJoiner::run] Processed {} records, #postings={}, #pairs={}",
                        rid + 1,
                        self.index.total_postings(),
                        self.stats.similar_pairs
                    );
                }

                self.matcher.find_matches(
                    rid,
                    &features,
                    &mut self.index,
                    &self.store,
                    &mut self.stats,
                    &mut emit,
                )?;
                if boundary.is_some() {
                    continue;
                }

                let prefix_len = index_position(threshold, features.len());
                let suffix_len = features.len() - prefix_len;
                if self.index.total_postings() + suffix_len > self.max_features_in_ram {
                    if self.index.total_postings() == 0 {
                        return Err(AllPairsError::resource(format!(
                            "Record {rid} needs {suffix_len} postings, exceeding the limit of {}.",
                            self.max_features_in_ram
                        )));
                    }
                    if self.shows_progress {
                        eprintln!(
                            "[StreamingJoiner::run] Flushing at record {rid} with #postings={}",
                            self.index.total_postings()
                        );
                    }
                    boundary = Some(rid);
                    continue;
                }
                self.index_record(rid, &features, prefix_len);
            }

            if self.shows_progress {
                eprintln!(
                    "[StreamingJoiner::run] Pass {} indexed {} records, #pairs={}",
                    self.num_passes,
                    self.store.num_records(),
                    self.stats.similar_pairs
                );
            }
            match boundary {
                Some(rid) => {
                    data.rewind(rid)?;
                    pass_start = rid;
                }
                None => break,
            }
        }

        self.index.clear();
        self.store.reset(0);
        if self.shows_progress {
            eprintln!("[StreamingJoiner::run] Done");
            eprintln!(
                "[StreamingJoiner::run] #matched={}",
                self.stats.similar_pairs
            );
        }
        Ok(())
    }

    /// Finds all similar pairs in `data`, returning them in the order of emission.
    pub fn similar_pairs<D>(&mut self, data: &mut D) -> Result<Vec<(RecordId, RecordId)>>
    where
        D: DataSource + ?Sized,
    {
        let mut matched = vec![];
        self.run(data, |x, y| {
            matched.push((x, y));
            Ok(())
        })?;
        Ok(matched)
    }

    /// Gets the statistics accumulated over all the runs of this instance.
    pub const fn stats(&self) -> Statistics {
        self.stats
    }

    /// Gets the number of passes over the data source.
    pub const fn num_passes(&self) -> usize {
        self.num_passes
    }

    /// Gets the similarity threshold.
    pub const fn threshold(&self) -> f64 {
        self.matcher.threshold()
    }

    /// Gets the memory usage in bytes.
    pub fn memory_in_bytes(&self) -> usize {
        self.index.memory_in_bytes() + self.store.memory_in_bytes()
    }

    fn index_record(&mut self, rid: RecordId, features: &[FeatureId], prefix_len: usize) {
        for (pos, &feature) in features.iter().enumerate().skip(prefix_len) {
            self.index.append(feature, rid, pos as u32);
        }
        self.store.push(rid, features, prefix_len);
    }

    fn validate_record(
        &self,
        rid: RecordId,
        expected_rid: RecordId,
        features: &[FeatureId],
        prev_len: usize,
    ) -> Result<()> {
        if rid != expected_rid {
            return Err(AllPairsError::data(format!(
                "Expected record {expected_rid}, but got {rid}."
            )));
        }
        if features.len() < prev_len {
            return Err(AllPairsError::data(format!(
                "Record {rid} has {} features, fewer than the previous record of {prev_len}. Records must be in non-decreasing length.",
                features.len()
            )));
        }
        if features.windows(2).any(|w| w[0] >= w[1]) {
            return Err(AllPairsError::data(format!(
                "Features of record {rid} are not strictly ascending."
            )));
        }
        if let Some(&last) = features.last() {
            if last > self.max_feature_id {
                return Err(AllPairsError::data(format!(
                    "Record {rid} has feature id {last}, exceeding the maximum {}.",
                    self.max_feature_id
                )));
            }
        }
        Ok(())
    }
}
