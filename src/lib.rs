//! # Dynamic GBWT: an incrementally extensible Graph BWT
//!
//! This crate implements the GBWT, a run-length compressed index over a
//! collection of paths in a graph, together with the incremental construction
//! algorithm. It is based on the [Simple-SDS](https://github.com/jltsiren/simple-sds)
//! library for succinct data structures.
//!
//! A path is a sequence of unsigned integer node identifiers terminated by
//! the endmarker `0`. Sequences are inserted into a mutable
//! [`DynamicGBWT`], which can be converted into the compressed read-only
//! [`GBWT`] for querying and serialization. Both forms support:
//!
//! * following a sequence with the LF mapping, one position or an offset
//!   range at a time;
//! * mapping selected BWT positions back to sequence identifiers with
//!   document array samples.
//!
//! # References
//!
//! Jouni Sirén, Erik Garrison, Adam M. Novak, Benedict Paten, and Richard Durbin:
//! **Haplotype-aware graph indexes**.\
//! Bioinformatics 36(2):400-407, 2020.
//! DOI: [10.1093/bioinformatics/btz575](https://doi.org/10.1093/bioinformatics/btz575)
//!
//! # Examples
//!
//! ```
//! use gbwt_dynamic::{DynamicGBWT, GBWT};
//!
//! // Build an index of two paths.
//! let mut dynamic = DynamicGBWT::default();
//! dynamic.insert(&[1, 2, 4, 0, 1, 3, 4, 0]);
//! let index = GBWT::from(&dynamic);
//!
//! assert_eq!(index.sequences(), 2);
//! let path: Vec<usize> = index.sequence(1).collect();
//! assert_eq!(path, vec![1, 3, 4]);
//! ```

pub mod bwt;
pub mod dynamic;
pub mod gbwt;
pub mod headers;
pub mod record;
pub mod samples;
pub mod support;

//-----------------------------------------------------------------------------

pub use crate::dynamic::DynamicGBWT;
pub use crate::gbwt::{GBWT, SequenceIter};
pub use crate::record::DynamicRecord;

//-----------------------------------------------------------------------------

/// Node identifier `0` is used for marking the end of a sequence and does not exist in the graph.
pub const ENDMARKER: usize = 0;

/// A sequence is sampled once every this many positions.
pub const SAMPLE_INTERVAL: usize = 1024;

/// Default insertion batch size in nodes.
pub const INSERT_BATCH_SIZE: usize = 100_000_000;

/// Default merge batch size in sequences.
pub const MERGE_BATCH_SIZE: usize = 2000;

//-----------------------------------------------------------------------------
