//! This library provides an all pairs similarity search (or *similarity self-join*)
//! on sparse binary vectors in the cosine space.
//! The algorithm employs the [dynamic partial inverted index of AllPairs](https://doi.org/10.1145/1242572.1242591),
//! streaming over records sorted by length and rebuilding the index in multiple passes
//! when it does not fit in a given number of postings.
#![deny(missing_docs)]

pub mod budget;
pub mod candidates;
pub mod data_source;
pub mod edge_list;
pub mod errors;
pub mod index;
pub mod matcher;
pub mod similarity;
pub mod simple_join;
pub mod stats;
pub mod store;
pub mod streaming_join;

pub use simple_join::SimpleJoiner;
pub use stats::Statistics;
pub use streaming_join::StreamingJoiner;

/// Identifier of a record, the ordinal of its arrival.
pub type RecordId = u32;

/// Identifier of a feature, a dimension of binary vectors.
pub type FeatureId = u32;
