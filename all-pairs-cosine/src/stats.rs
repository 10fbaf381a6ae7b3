//! Counters reported by the joiners.

/// Statistics of a similarity join.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Statistics {
    /// Number of similar pairs emitted.
    pub similar_pairs: u64,
    /// Number of candidates that survived candidate generation.
    pub candidates_considered: u64,
    /// Number of full intersections computed for verification.
    pub intersections_performed: u64,
}
