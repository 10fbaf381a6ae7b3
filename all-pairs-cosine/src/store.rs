//! Storage of the full feature sequences of indexed records.
use crate::{FeatureId, RecordId};

/// A record in [`RecordStore`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StoredRecord<'a> {
    /// All the features in ascending order.
    pub features: &'a [FeatureId],
    /// Length of the prefix that is not in the index.
    pub prefix_len: usize,
}

/// Owner of the records indexed in the current pass.
///
/// The records of one pass have consecutive ids starting at [`Self::base_rid()`],
/// so that the features are packed into one array addressed by offsets.
#[derive(Clone, Debug)]
pub struct RecordStore {
    base_rid: RecordId,
    offsets: Vec<usize>,
    prefix_lens: Vec<u32>,
    features: Vec<FeatureId>,
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            base_rid: 0,
            offsets: vec![0],
            prefix_lens: vec![],
            features: vec![],
        }
    }

    /// Drops all the records and restarts at `base_rid`, retaining the allocated capacity.
    pub fn reset(&mut self, base_rid: RecordId) {
        self.base_rid = base_rid;
        self.offsets.truncate(1);
        self.prefix_lens.clear();
        self.features.clear();
    }

    /// Appends the record `rid` whose first `prefix_len` features are not indexed.
    ///
    /// # Panics
    ///
    /// Panics if `rid` is not [`Self::end_rid()`] or `prefix_len` exceeds the record length.
    pub fn push(&mut self, rid: RecordId, features: &[FeatureId], prefix_len: usize) {
        assert_eq!(rid, self.end_rid(), "records must be stored consecutively");
        assert!(prefix_len <= features.len());
        self.features.extend_from_slice(features);
        self.offsets.push(self.features.len());
        self.prefix_lens.push(prefix_len as u32);
    }

    /// Gets the record `rid`.
    ///
    /// # Panics
    ///
    /// Panics if `rid` is not stored.
    #[inline(always)]
    pub fn record(&self, rid: RecordId) -> StoredRecord<'_> {
        let i = (rid - self.base_rid) as usize;
        StoredRecord {
            features: &self.features[self.offsets[i]..self.offsets[i + 1]],
            prefix_len: self.prefix_lens[i] as usize,
        }
    }

    /// Gets the smallest record id in the store.
    pub const fn base_rid(&self) -> RecordId {
        self.base_rid
    }

    /// Gets the record id following the last stored one.
    pub fn end_rid(&self) -> RecordId {
        self.base_rid + self.prefix_lens.len() as RecordId
    }

    /// Gets the number of stored records.
    pub fn num_records(&self) -> usize {
        self.prefix_lens.len()
    }

    /// Checks if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.prefix_lens.is_empty()
    }

    /// Gets the memory usage in bytes.
    pub fn memory_in_bytes(&self) -> usize {
        self.offsets.capacity() * std::mem::size_of::<usize>()
            + self.prefix_lens.capacity() * std::mem::size_of::<u32>()
            + self.features.capacity() * std::mem::size_of::<FeatureId>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_record() {
        let mut store = RecordStore::new();
        store.reset(5);
        store.push(5, &[1, 2, 3], 1);
        store.push(6, &[], 0);
        store.push(7, &[0, 9], 1);
        assert_eq!(store.num_records(), 3);
        assert_eq!(store.end_rid(), 8);
        assert_eq!(
            store.record(5),
            StoredRecord {
                features: &[1, 2, 3],
                prefix_len: 1
            }
        );
        assert!(store.record(6).features.is_empty());
        assert_eq!(store.record(7).features, &[0, 9]);
        assert_eq!(store.record(7).prefix_len, 1);
    }

    #[test]
    fn test_reset() {
        let mut store = RecordStore::new();
        store.push(0, &[1, 2], 0);
        store.reset(10);
        assert!(store.is_empty());
        assert_eq!(store.base_rid(), 10);
        assert_eq!(store.end_rid(), 10);
        store.push(10, &[4], 0);
        assert_eq!(store.record(10).features, &[4]);
    }

    #[test]
    #[should_panic]
    fn test_record_before_base() {
        let mut store = RecordStore::new();
        store.reset(3);
        store.push(3, &[1], 0);
        store.record(2);
    }

    #[test]
    #[should_panic]
    fn test_non_consecutive_push() {
        let mut store = RecordStore::new();
        store.push(1, &[1], 0);
    }
}
