//! An exhaustive approach of all-pair similarity search on binary vectors.
use crate::errors::{AllPairsError, Result};
use crate::similarity::{intersection_size, reaches_threshold, validate_threshold};
use crate::{FeatureId, RecordId};

/// An exhaustive approach of all-pair similarity search on binary vectors.
pub struct SimpleJoiner {
    records: Vec<Vec<FeatureId>>,
    shows_progress: bool,
}

impl Default for SimpleJoiner {
    fn default() -> Self {
        Self::new()
    }
}

impl SimpleJoiner {
    /// Creates an empty instance.
    pub const fn new() -> Self {
        Self {
            records: vec![],
            shows_progress: false,
        }
    }

    /// Prints the progress with stderr?
    pub const fn shows_progress(mut self, yes: bool) -> Self {
        self.shows_progress = yes;
        self
    }

    /// Appends a record of strictly ascending feature ids.
    /// If the features are not strictly ascending, an error is returned.
    pub fn add<I>(&mut self, record: I) -> Result<()>
    where
        I: IntoIterator<Item = FeatureId>,
    {
        let record: Vec<_> = record.into_iter().collect();
        if record.windows(2).any(|w| w[0] >= w[1]) {
            return Err(AllPairsError::input(format!(
                "Features of record {} must be strictly ascending.",
                self.records.len()
            )));
        }
        self.records.push(record);
        Ok(())
    }

    /// Finds all similar pairs whose cosine similarity is no less than `threshold`,
    /// returning pairs of the left-side id and the right-side id in ascending order.
    pub fn similar_pairs(&self, threshold: f64) -> Result<Vec<(RecordId, RecordId)>> {
        validate_threshold(threshold)?;
        if self.shows_progress {
            eprintln!(
                "[SimpleJoiner::similar_pairs] #records={}",
                self.num_records()
            );
        }

        let mut matched = vec![];
        for i in 0..self.records.len() {
            if self.shows_progress && (i + 1) % 10000 == 0 {
                eprintln!(
                    "[SimpleJoiner::similar_pairs] Processed {}/{}...",
                    i + 1,
                    self.records.len()
                );
            }
            let xs = &self.records[i];
            for j in i + 1..self.records.len() {
                let ys = &self.records[j];
                let overlap = intersection_size(xs, ys);
                if overlap != 0 && reaches_threshold(overlap, threshold, xs.len(), ys.len()) {
                    matched.push((i as RecordId, j as RecordId));
                }
            }
        }
        if self.shows_progress {
            eprintln!("[SimpleJoiner::similar_pairs] Done");
            eprintln!("[SimpleJoiner::similar_pairs] #matched={}", matched.len());
        }
        Ok(matched)
    }

    /// Gets the number of stored records.
    pub fn num_records(&self) -> usize {
        self.records.len()
    }

    /// Gets the memory usage in bytes.
    pub fn memory_in_bytes(&self) -> usize {
        self.records
            .iter()
            .map(|r| r.len() * std::mem::size_of::<FeatureId>())
            .sum()
    }
}
