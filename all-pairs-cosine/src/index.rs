//! Partial inverted index over the indexed suffixes of records.
use crate::{FeatureId, RecordId};

/// An entry in a posting list: the record and the position of the feature in it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Posting {
    /// Record containing the feature.
    pub rid: RecordId,
    /// Position of the feature within the record.
    pub pos: u32,
}

#[derive(Clone, Debug, Default)]
struct PostingList {
    postings: Vec<Posting>,
    // Postings before `head` are dropped by minimum-size pruning.
    head: usize,
}

/// Inverted index mapping feature ids to posting lists ordered by record id.
///
/// Feature ids are bounded by `max_feature_id`, so the lists are kept in a
/// direct-indexed array. Only the lists touched since the last [`Self::clear()`]
/// are visited when clearing.
#[derive(Clone, Debug)]
pub struct PartialIndex {
    lists: Vec<PostingList>,
    touched: Vec<FeatureId>,
    total_postings: usize,
}

impl PartialIndex {
    /// Creates an empty index for feature ids in `[0, max_feature_id]`.
    pub fn new(max_feature_id: FeatureId) -> Self {
        Self {
            lists: vec![PostingList::default(); max_feature_id as usize + 1],
            touched: vec![],
            total_postings: 0,
        }
    }

    /// Appends a posting `(rid, pos)` to the list of `feature`.
    ///
    /// # Panics
    ///
    /// Panics if `feature` exceeds the bound given in [`Self::new()`]. In debug builds,
    /// also panics if `rid` does not exceed the last record id in the list.
    pub fn append(&mut self, feature: FeatureId, rid: RecordId, pos: u32) {
        let list = &mut self.lists[feature as usize];
        debug_assert!(
            list.postings.last().map_or(true, |last| last.rid < rid),
            "postings must be appended in increasing record id"
        );
        if list.postings.is_empty() {
            self.touched.push(feature);
        }
        list.postings.push(Posting { rid, pos });
        self.total_postings += 1;
    }

    /// Gets the live postings of `feature`, which is empty for unseen features.
    #[inline(always)]
    pub fn postings(&self, feature: FeatureId) -> &[Posting] {
        match self.lists.get(feature as usize) {
            Some(list) => &list.postings[list.head..],
            None => &[],
        }
    }

    /// Drops the first `n` live postings of `feature`.
    ///
    /// The dropped postings stay counted in [`Self::total_postings()`]
    /// because their memory is released only by [`Self::clear()`].
    #[inline(always)]
    pub fn advance_head(&mut self, feature: FeatureId, n: usize) {
        let list = &mut self.lists[feature as usize];
        list.head = (list.head + n).min(list.postings.len());
    }

    /// Gets the bytes of a posting list header, allocated for every feature id.
    pub const fn bytes_per_feature() -> usize {
        std::mem::size_of::<PostingList>()
    }

    /// Gets the bytes of a posting.
    pub const fn bytes_per_posting() -> usize {
        std::mem::size_of::<Posting>()
    }

    /// Gets the number of postings appended since the last [`Self::clear()`].
    pub const fn total_postings(&self) -> usize {
        self.total_postings
    }

    /// Drops all postings, retaining the allocated capacity.
    pub fn clear(&mut self) {
        for &feature in &self.touched {
            let list = &mut self.lists[feature as usize];
            list.postings.clear();
            list.head = 0;
        }
        self.touched.clear();
        self.total_postings = 0;
    }

    /// Gets the memory usage in bytes.
    pub fn memory_in_bytes(&self) -> usize {
        let postings: usize = self
            .touched
            .iter()
            .map(|&f| self.lists[f as usize].postings.capacity())
            .sum();
        self.lists.len() * std::mem::size_of::<PostingList>()
            + postings * std::mem::size_of::<Posting>()
            + self.touched.capacity() * std::mem::size_of::<FeatureId>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_scan() {
        let mut index = PartialIndex::new(4);
        index.append(1, 0, 0);
        index.append(3, 0, 1);
        index.append(1, 2, 0);
        assert_eq!(index.total_postings(), 3);
        assert_eq!(
            index.postings(1),
            &[Posting { rid: 0, pos: 0 }, Posting { rid: 2, pos: 0 }]
        );
        assert_eq!(index.postings(3), &[Posting { rid: 0, pos: 1 }]);
        assert!(index.postings(0).is_empty());
        assert!(index.postings(100).is_empty());
    }

    #[test]
    fn test_advance_head() {
        let mut index = PartialIndex::new(2);
        index.append(2, 0, 0);
        index.append(2, 1, 0);
        index.append(2, 5, 3);
        index.advance_head(2, 2);
        assert_eq!(index.postings(2), &[Posting { rid: 5, pos: 3 }]);
        index.advance_head(2, 10);
        assert!(index.postings(2).is_empty());
        assert_eq!(index.total_postings(), 3);
    }

    #[test]
    fn test_clear() {
        let mut index = PartialIndex::new(3);
        index.append(0, 0, 0);
        index.append(3, 1, 2);
        index.advance_head(3, 1);
        index.clear();
        assert_eq!(index.total_postings(), 0);
        assert!(index.postings(0).is_empty());
        assert!(index.postings(3).is_empty());
        index.append(3, 7, 0);
        assert_eq!(index.postings(3), &[Posting { rid: 7, pos: 0 }]);
    }

    #[test]
    #[should_panic]
    #[cfg(debug_assertions)]
    fn test_unordered_append() {
        let mut index = PartialIndex::new(1);
        index.append(1, 3, 0);
        index.append(1, 2, 0);
    }
}
