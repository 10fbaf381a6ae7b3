//! Conversion of an undirected graph into records of neighborhoods.
//!
//! Each node becomes a record whose features are its neighbors. Feature ids are
//! assigned by ascending degree starting at 1, and records are ordered by length,
//! ready to be written in the binary record format.
use std::io::{BufRead, Write};

use hashbrown::HashMap;

use crate::data_source::binary::write_record;
use crate::errors::{AllPairsError, Result};
use crate::FeatureId;

/// Neighborhood records of an undirected graph.
///
/// # Examples
///
/// ```
/// use all_pairs_cosine::edge_list::NeighborhoodRecords;
///
/// let records = NeighborhoodRecords::from_edges([(10, 20), (10, 30), (20, 30), (30, 40)]);
/// // Degrees: 40 -> 1, 10 -> 2, 20 -> 2, 30 -> 3.
/// assert_eq!(records.max_feature_id(), 4);
/// assert_eq!(records.records()[0], (40, vec![4]));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NeighborhoodRecords {
    // Pairs of the original node id and its features.
    records: Vec<(u32, Vec<FeatureId>)>,
    max_feature_id: FeatureId,
}

impl NeighborhoodRecords {
    /// Builds the records from a text edge list with one edge `u v` per line.
    ///
    /// Empty lines, lines starting with `#`, and lines of less than two columns are skipped.
    pub fn from_reader<R>(rdr: R) -> Result<Self>
    where
        R: BufRead,
    {
        let mut edges = vec![];
        for (i, line) in rdr.lines().enumerate() {
            let line = line.map_err(|e| {
                AllPairsError::data(format!("I/O failure at line {}: {e}", i + 1))
            })?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut cols = line.split_whitespace();
            let (u, v) = match (cols.next(), cols.next()) {
                (Some(u), Some(v)) => (u, v),
                _ => continue,
            };
            let parse = |s: &str| {
                s.parse::<u32>().map_err(|_| {
                    AllPairsError::data(format!("Invalid node id {s:?} at line {}.", i + 1))
                })
            };
            edges.push((parse(u)?, parse(v)?));
        }
        Ok(Self::from_edges(edges))
    }

    /// Builds the records from undirected edges. Duplicated edges are merged.
    pub fn from_edges<I>(edges: I) -> Self
    where
        I: IntoIterator<Item = (u32, u32)>,
    {
        let mut adjacency: HashMap<u32, Vec<u32>> = HashMap::new();
        for (u, v) in edges {
            adjacency.entry(u).or_default().push(v);
            if u != v {
                adjacency.entry(v).or_default().push(u);
            }
        }
        let mut nodes: Vec<(u32, Vec<u32>)> = adjacency
            .into_iter()
            .map(|(node, mut neighbors)| {
                neighbors.sort_unstable();
                neighbors.dedup();
                (node, neighbors)
            })
            .collect();
        // The least frequent neighbor gets the smallest feature id.
        nodes.sort_unstable_by_key(|(node, neighbors)| (neighbors.len(), *node));

        let feature_ids: HashMap<u32, FeatureId> = nodes
            .iter()
            .enumerate()
            .map(|(i, &(node, _))| (node, i as FeatureId + 1))
            .collect();
        let records = nodes
            .into_iter()
            .map(|(node, neighbors)| {
                let mut features: Vec<_> = neighbors.iter().map(|nb| feature_ids[nb]).collect();
                features.sort_unstable();
                (node, features)
            })
            .collect();
        Self {
            records,
            max_feature_id: feature_ids.len() as FeatureId,
        }
    }

    /// Gets the pairs of the original node id and its features in non-decreasing length.
    pub fn records(&self) -> &[(u32, Vec<FeatureId>)] {
        &self.records
    }

    /// Gets the largest feature id, equal to the number of nodes.
    pub const fn max_feature_id(&self) -> FeatureId {
        self.max_feature_id
    }

    /// Gets the number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Checks if there is no record.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Writes the records in the binary record format, storing the original node ids.
    pub fn write_binary<W>(&self, mut wtr: W) -> std::io::Result<()>
    where
        W: Write,
    {
        for (node, features) in &self.records {
            write_record(&mut wtr, *node, features)?;
        }
        wtr.flush()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::data_source::{BinaryDataSource, DataSource};

    #[test]
    fn test_from_reader() {
        let text = "# comment\n\n1 2\n1 3\n2\t3\n3 4\n1 2\nbroken\n";
        let records = NeighborhoodRecords::from_reader(Cursor::new(text)).unwrap();
        // Degrees: 4 -> 1, 1 -> 2, 2 -> 2, 3 -> 3.
        // Feature ids: 4 -> 1, 1 -> 2, 2 -> 3, 3 -> 4.
        assert_eq!(
            records.records(),
            &[
                (4, vec![4]),
                (1, vec![3, 4]),
                (2, vec![2, 4]),
                (3, vec![1, 2, 3]),
            ]
        );
        assert_eq!(records.max_feature_id(), 4);
    }

    #[test]
    fn test_invalid_node() {
        assert!(NeighborhoodRecords::from_reader(Cursor::new("1 x\n")).is_err());
    }

    #[test]
    fn test_self_loop() {
        let records = NeighborhoodRecords::from_edges([(5, 5), (5, 6)]);
        // Degrees: 6 -> 1, 5 -> 2.
        assert_eq!(records.records(), &[(6, vec![2]), (5, vec![1, 2])]);
    }

    #[test]
    fn test_write_binary() {
        let records = NeighborhoodRecords::from_edges([(1, 2), (2, 3)]);
        let mut buf = vec![];
        records.write_binary(&mut buf).unwrap();

        let mut data = BinaryDataSource::new(Cursor::new(buf));
        let stored_ids = data.stored_ids().unwrap();
        let mut features = vec![];
        let mut decoded = vec![];
        while let Some(rid) = data.next_record(&mut features).unwrap() {
            decoded.push((stored_ids[rid as usize], features.clone()));
        }
        assert_eq!(decoded, records.records());
    }
}
