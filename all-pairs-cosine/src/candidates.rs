//! Scratch accumulators of partial overlaps, valid during one query.
use hashbrown::HashMap;

use crate::RecordId;

/// Mapping from candidate record ids to accumulated overlaps.
///
/// Entries live only while one record is queried. The populated record ids are kept
/// in a scratch vector, so that [`Self::clear()`] costs time proportional to the
/// number of populated entries and the allocations are reused across queries.
#[derive(Clone, Debug, Default)]
pub struct CandidateMap {
    // rid -> (accumulator, slot in `touched`)
    scores: HashMap<RecordId, (u32, usize)>,
    touched: Vec<RecordId>,
}

impl CandidateMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `delta` to the accumulator of `rid`, creating the entry if absent.
    #[inline(always)]
    pub fn add(&mut self, rid: RecordId, delta: u32) {
        let touched = &mut self.touched;
        let (score, _) = self.scores.entry(rid).or_insert_with(|| {
            touched.push(rid);
            (0, touched.len() - 1)
        });
        *score += delta;
    }

    /// Gets the accumulator of `rid`, or `None` if it has not been added since the last clear.
    ///
    /// An entry added with a zero delta is present with `Some(0)`.
    #[inline(always)]
    pub fn get(&self, rid: RecordId) -> Option<u32> {
        self.scores.get(&rid).map(|&(score, _)| score)
    }

    /// Removes the entry of `rid`, returning its accumulator.
    pub fn erase(&mut self, rid: RecordId) -> Option<u32> {
        let (score, slot) = self.scores.remove(&rid)?;
        self.touched.swap_remove(slot);
        if let Some(&moved) = self.touched.get(slot) {
            if let Some((_, moved_slot)) = self.scores.get_mut(&moved) {
                *moved_slot = slot;
            }
        }
        Some(score)
    }

    /// Gets the number of populated entries.
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// Checks if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Iterates over the populated entries.
    ///
    /// Entries are visited in the order they were created unless some were erased.
    pub fn iter(&self) -> impl Iterator<Item = (RecordId, u32)> + '_ {
        self.touched
            .iter()
            .filter_map(|&rid| self.scores.get(&rid).map(|&(score, _)| (rid, score)))
    }

    /// Removes all entries, retaining the allocated capacity.
    pub fn clear(&mut self) {
        for rid in self.touched.drain(..) {
            self.scores.remove(&rid);
        }
    }
}
