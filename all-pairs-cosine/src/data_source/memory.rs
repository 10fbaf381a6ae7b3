//! Records held in memory.
use crate::data_source::DataSource;
use crate::errors::{AllPairsError, Result};
use crate::{FeatureId, RecordId};

/// A [`DataSource`] over records held in memory.
///
/// # Examples
///
/// ```
/// use all_pairs_cosine::data_source::{DataSource, MemoryDataSource};
///
/// let mut data = MemoryDataSource::new(vec![vec![0, 1], vec![1, 2, 3]]);
/// let mut features = vec![];
/// assert_eq!(data.next_record(&mut features).unwrap(), Some(0));
/// assert_eq!(features, vec![0, 1]);
/// data.rewind(1).unwrap();
/// assert_eq!(data.next_record(&mut features).unwrap(), Some(1));
/// assert_eq!(data.next_record(&mut features).unwrap(), None);
/// ```
#[derive(Clone, Debug, Default)]
pub struct MemoryDataSource {
    records: Vec<Vec<FeatureId>>,
    cursor: usize,
}

impl MemoryDataSource {
    /// Creates an instance yielding `records` in the given order.
    pub fn new(records: Vec<Vec<FeatureId>>) -> Self {
        Self { records, cursor: 0 }
    }

    /// Creates an instance from records in any order,
    /// sorting them by length (stable for equal lengths) and the features in each record.
    pub fn from_unsorted<I, R>(records: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = FeatureId>,
    {
        let mut records: Vec<Vec<FeatureId>> = records
            .into_iter()
            .map(|r| {
                let mut r: Vec<_> = r.into_iter().collect();
                r.sort_unstable();
                r.dedup();
                r
            })
            .collect();
        records.sort_by_key(|r| r.len());
        Self::new(records)
    }

    /// Gets the records.
    pub fn records(&self) -> &[Vec<FeatureId>] {
        &self.records
    }

    /// Gets the number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Checks if there is no record.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl DataSource for MemoryDataSource {
    fn next_record(&mut self, features: &mut Vec<FeatureId>) -> Result<Option<RecordId>> {
        match self.records.get(self.cursor) {
            Some(record) => {
                features.clear();
                features.extend_from_slice(record);
                let rid = self.cursor as RecordId;
                self.cursor += 1;
                Ok(Some(rid))
            }
            None => Ok(None),
        }
    }

    fn rewind(&mut self, rid: RecordId) -> Result<()> {
        let rid = rid as usize;
        if rid > self.records.len() {
            return Err(AllPairsError::data(format!(
                "Cannot rewind to record {rid} of {} records.",
                self.records.len()
            )));
        }
        self.cursor = rid;
        Ok(())
    }
}
