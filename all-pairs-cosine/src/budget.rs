//! Derivation of the posting budget from a memory budget in bytes.
use crate::errors::{AllPairsError, Result};
use crate::index::PartialIndex;
use crate::FeatureId;

/// Default memory budget, 4 GiB.
pub const DEFAULT_MEMORY_BYTES: u64 = 1 << 32;

/// Default upper bound of feature ids.
pub const DEFAULT_MAX_FEATURE_ID: FeatureId = 3_072_241;

const GIB: u64 = 1 << 30;

// Memory consumed besides the index per GiB of budget,
// calibrated with 600,000 feature ids and 120,000,000 postings in 1 GiB.
const OVERHEAD_PER_GIB: u64 = 99_341_824;

/// Memory budget of the index.
///
/// # Examples
///
/// ```
/// use all_pairs_cosine::budget::MemoryBudget;
///
/// let budget = MemoryBudget::new(1 << 30, 600_000);
/// assert!(budget.max_features_in_ram().unwrap() > 100_000_000);
/// assert!(MemoryBudget::new(1 << 20, 600_000).max_features_in_ram().is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemoryBudget {
    bytes: u64,
    max_feature_id: FeatureId,
}

impl Default for MemoryBudget {
    fn default() -> Self {
        Self::new(DEFAULT_MEMORY_BYTES, DEFAULT_MAX_FEATURE_ID)
    }
}

impl MemoryBudget {
    /// Creates a budget of `bytes` for feature ids in `[0, max_feature_id]`.
    pub const fn new(bytes: u64, max_feature_id: FeatureId) -> Self {
        Self {
            bytes,
            max_feature_id,
        }
    }

    /// Gets the budget in bytes.
    pub const fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Gets the upper bound of feature ids.
    pub const fn max_feature_id(&self) -> FeatureId {
        self.max_feature_id
    }

    /// Gets the overhead reserved besides the index.
    pub const fn overhead_bytes(&self) -> u64 {
        (self.bytes as u128 * OVERHEAD_PER_GIB as u128 / GIB as u128) as u64
    }

    /// Computes the number of postings fitting in the budget after the posting list
    /// headers of all feature ids and the overhead.
    ///
    /// Returns an error if no posting fits.
    pub fn max_features_in_ram(&self) -> Result<usize> {
        let headers = (self.max_feature_id as u64 + 1) * PartialIndex::bytes_per_feature() as u64;
        let reserved = headers + self.overhead_bytes();
        let available = self.bytes.saturating_sub(reserved);
        let num_postings = available / PartialIndex::bytes_per_posting() as u64;
        if num_postings == 0 {
            return Err(AllPairsError::input(format!(
                "The memory budget of {} bytes cannot hold the index for {} feature ids.",
                self.bytes, self.max_feature_id
            )));
        }
        Ok(usize::try_from(num_postings).unwrap_or(usize::MAX))
    }
}
