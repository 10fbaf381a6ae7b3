//! Sources of records consumed by the joiners.
//!
//! A source yields records in the order of arrival, each a strictly ascending
//! sequence of feature ids, with non-decreasing lengths. Record ids are the
//! arrival ordinals starting at 0.
pub mod binary;
pub mod memory;
pub mod text;

pub use binary::BinaryDataSource;
pub use memory::MemoryDataSource;
pub use text::TextDataSource;

use crate::errors::Result;
use crate::{FeatureId, RecordId};

/// Lazy sequence of records that can be repositioned.
pub trait DataSource {
    /// Reads the next record into `features`, returning its record id,
    /// or `None` at the end of the sequence.
    ///
    /// The content of `features` is unspecified after `None` or an error.
    fn next_record(&mut self, features: &mut Vec<FeatureId>) -> Result<Option<RecordId>>;

    /// Repositions the sequence to yield the records starting at `rid`.
    ///
    /// Returns an error if the source cannot go back to `rid`.
    fn rewind(&mut self, rid: RecordId) -> Result<()>;
}

impl<D> DataSource for &mut D
where
    D: DataSource + ?Sized,
{
    fn next_record(&mut self, features: &mut Vec<FeatureId>) -> Result<Option<RecordId>> {
        (**self).next_record(features)
    }

    fn rewind(&mut self, rid: RecordId) -> Result<()> {
        (**self).rewind(rid)
    }
}

impl<D> DataSource for Box<D>
where
    D: DataSource + ?Sized,
{
    fn next_record(&mut self, features: &mut Vec<FeatureId>) -> Result<Option<RecordId>> {
        (**self).next_record(features)
    }

    fn rewind(&mut self, rid: RecordId) -> Result<()> {
        (**self).rewind(rid)
    }
}
