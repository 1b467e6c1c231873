//! The BWT stored as an array of compressed node records.
//!
//! # Examples
//!
//! ```
//! use gbwt_dynamic::{DynamicGBWT, GBWT};
//!
//! let mut dynamic = DynamicGBWT::default();
//! dynamic.insert(&[3, 5, 0, 3, 7, 0]);
//! let index = GBWT::from(&dynamic);
//!
//! let bwt = index.as_ref();
//! assert_eq!(bwt.len(), 6);
//!
//! // Node 3 is record 1 with the alphabet offset of 2.
//! let record = bwt.record(1).unwrap();
//! assert_eq!(record.id(), 1);
//! assert_eq!(record.outdegree(), 2);
//! assert_eq!(record.successor(1), 7);
//! assert_eq!(record.len(), 2);
//! assert_eq!(record.lf(0), Some((5, 0)));
//!
//! // Determine the length of the BWT by iterating over the records.
//! let bwt_len = bwt.iter().fold(0, |len, record| len + record.len());
//! assert_eq!(bwt_len, 6);
//! ```

use crate::ENDMARKER;
use crate::record::DynamicRecord;
use crate::support::{ByteCodeIter, RLE, RLEIter};
use crate::support;

use simple_sds::ops::{BitVec, Select};
use simple_sds::serialize::Serialize;
use simple_sds::sparse_vector::{SparseVector, SparseBuilder};

use std::convert::TryFrom;
use std::io::{Error, ErrorKind};
use std::iter::FusedIterator;
use std::ops::Range;
use std::io;


//-----------------------------------------------------------------------------

/// The BWT encoded as a vector of bytes.
///
/// The encoding consists of `self.len()` concatenated node records, with a
/// sparse bitmap marking the starting offset of each record.
/// Record identifiers are characters in the effective alphabet `0..self.len()`, but they are not necessarily the same as the node identifiers.
/// There may be empty records that do not correspond to any node in the graph.
/// See module-level documentation for an example.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BWT {
    index: SparseVector,
    data: Vec<u8>,
}

impl BWT {
    /// Returns the number of records in the BWT.
    #[inline]
    pub fn len(&self) -> usize {
        self.index.count_ones()
    }

    /// Returns `true` if the BWT is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the `i`th record, or [`None`] if the record is empty or does not exist.
    pub fn record(&self, i: usize) -> Option<Record<'_>> {
        if i >= self.len() {
            return None;
        }
        let mut iter = self.index.select_iter(i);
        let (_, start) = iter.next().unwrap();
        let limit = if i + 1 < self.len() { iter.next().unwrap().1 } else { self.data.len() };
        Record::new(i, &self.data[start..limit])
    }

    /// Returns an iterator over the records in the BWT.
    ///
    /// Note that the iterator skips empty records.
    pub fn iter(&self) -> RecordIter<'_> {
        RecordIter {
            parent: self,
            next: 0,
        }
    }
}

impl Serialize for BWT {
    fn serialize_header<T: io::Write>(&self, _: &mut T) -> io::Result<()> {
        Ok(())
    }

    fn serialize_body<T: io::Write>(&self, writer: &mut T) -> io::Result<()> {
        self.index.serialize(writer)?;
        self.data.serialize(writer)?;
        Ok(())
    }

    fn load<T: io::Read>(reader: &mut T) -> io::Result<Self> {
        let index = SparseVector::load(reader)?;
        let data = Vec::<u8>::load(reader)?;
        if index.len() != data.len() {
            return Err(Error::new(ErrorKind::InvalidData, "BWT: Index / data length mismatch"));
        }
        Ok(BWT {
            index,
            data,
        })
    }

    fn size_in_elements(&self) -> usize {
        self.index.size_in_elements() + self.data.size_in_elements()
    }
}

impl From<&[DynamicRecord]> for BWT {
    fn from(records: &[DynamicRecord]) -> Self {
        // Find the starting offsets and compress the records. The outgoing
        // edges must be sorted, as the destination nodes are gap-encoded.
        let mut offsets: Vec<usize> = Vec::with_capacity(records.len());
        let mut encoder = RLE::new(0);
        for record in records {
            offsets.push(encoder.len());
            encoder.write_int(record.outdegree());
            let mut prev = 0;
            for outrank in 0..record.outdegree() {
                encoder.write_int(record.successor(outrank) - prev);
                prev = record.successor(outrank);
                encoder.write_int(record.offset(outrank));
            }
            encoder.set_sigma(record.outdegree());
            for run in record.body.iter() {
                encoder.write(run.0 as usize, run.1 as usize);
            }
        }

        // Compress the offsets.
        let mut builder = SparseBuilder::new(encoder.len(), offsets.len()).unwrap();
        for offset in offsets.iter() {
            unsafe { builder.set_unchecked(*offset); }
        }

        BWT {
            index: SparseVector::try_from(builder).unwrap(),
            data: Vec::<u8>::from(encoder),
        }
    }
}

//-----------------------------------------------------------------------------

/// An iterator over the records in [`BWT`].
///
/// The type of `Item` is [`Record`].
/// Note that the iterator skips empty records.
/// See module-level documentation for an example.
#[derive(Clone, Debug)]
pub struct RecordIter<'a> {
    parent: &'a BWT,
    // The first index we have not visited.
    next: usize,
}

impl<'a> Iterator for RecordIter<'a> {
    type Item = Record<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.next < self.parent.len() {
            let result = self.parent.record(self.next);
            self.next += 1;
            if result.is_some() {
                return result;
            }
        }
        None
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.parent.len() - self.next))
    }
}

impl<'a> FusedIterator for RecordIter<'a> {}

//-----------------------------------------------------------------------------

/// A partially decompressed node record.
///
/// The outgoing edges are decompressed when the record is created, while the
/// BWT slice is decoded run by run during each query.
/// See module-level documentation for an example.
#[derive(Clone, Debug)]
pub struct Record<'a> {
    id: usize,
    edges: Vec<(usize, usize)>,
    bwt: &'a [u8],
}

impl<'a> Record<'a> {
    /// Returns a record corresponding to the byte slice, or [`None`] if the record would be empty.
    pub fn new(id: usize, bytes: &'a [u8]) -> Option<Self> {
        if bytes.is_empty() {
            return None;
        }

        // Determine the outdegree.
        let mut iter = ByteCodeIter::new(bytes);
        let sigma = iter.next().unwrap();
        if sigma == 0 {
            return None;
        }

        // Decompress the edges.
        let mut edges: Vec<(usize, usize)> = Vec::with_capacity(sigma);
        let mut prev = 0;
        for _ in 0..sigma {
            let node = iter.next().unwrap() + prev;
            prev = node;
            let offset = iter.next().unwrap();
            edges.push((node, offset));
        }

        Some(Record {
            id,
            edges,
            bwt: &bytes[iter.offset()..],
        })
    }

    /// Returns the identifier of the record.
    #[inline]
    pub fn id(&self) -> usize {
        self.id
    }

    /// Returns the outdegree of the node.
    #[inline]
    pub fn outdegree(&self) -> usize {
        self.edges.len()
    }

    /// Returns the successor node of rank `i`.
    ///
    /// # Panics
    ///
    /// May panic if `i >= self.outdegree()`.
    #[inline]
    pub fn successor(&self, i: usize) -> usize {
        self.edges[i].0
    }

    /// Returns the BWT offset in the successor node for the edge of rank `i`.
    ///
    /// # Panics
    ///
    /// May panic if `i >= self.outdegree()`.
    #[inline]
    pub fn offset(&self, i: usize) -> usize {
        self.edges[i].1
    }

    /// Returns an iterator over the runs in the BWT slice of the record.
    pub fn run_iter(&self) -> RLEIter<'a> {
        RLEIter::new(self.bwt, self.outdegree())
    }

    /// Returns the length of the BWT slice.
    ///
    /// This is somewhat slow, as it requires iterating over the run-length encoded slice.
    /// Note that the length is always non-zero.
    pub fn len(&self) -> usize {
        self.run_iter().map(|(_, len)| len).sum()
    }

    /// Returns the number of runs in the BWT slice.
    ///
    /// This is somewhat slow, as it requires iterating over the run-length encoded slice.
    pub fn runs(&self) -> usize {
        self.run_iter().count()
    }

    /// Decompresses the record as a vector of (successor node, offset in successor) pairs.
    pub fn decompress(&self) -> Vec<(usize, usize)> {
        let mut edges = self.edges.clone();
        let mut result: Vec<(usize, usize)> = Vec::new();
        for (rank, len) in self.run_iter() {
            for _ in 0..len {
                result.push(edges[rank]);
                edges[rank].1 += 1;
            }
        }
        result
    }

    /// Returns the successor node at offset `i` in the record, or [`ENDMARKER`] if there is no such offset.
    pub fn node_at(&self, i: usize) -> usize {
        let mut offset = 0;
        for (rank, len) in self.run_iter() {
            offset += len;
            if offset > i {
                return self.successor(rank);
            }
        }
        ENDMARKER
    }

    /// Follows the sequence at offset `i` and returns (successor node, offset in successor).
    ///
    /// The successor may be the endmarker; the offset is then not a valid
    /// position in the endmarker record. Returns [`None`] if offset `i` does
    /// not exist.
    pub fn lf(&self, i: usize) -> Option<(usize, usize)> {
        let mut edges = self.edges.clone();
        let mut offset = 0;
        for (rank, len) in self.run_iter() {
            if offset + len > i {
                edges[rank].1 += i - offset;
                return Some(edges[rank]);
            }
            edges[rank].1 += len;
            offset += len;
        }
        None
    }

    /// Returns the offset in the record of node `to` that offset `i` maps to
    /// under LF, or [`None`] if there is no edge to that node.
    ///
    /// If `i` is past the end of the record, the result is the offset right
    /// after the occurrences mapped from this record.
    pub fn lf_to(&self, i: usize, to: usize) -> Option<usize> {
        let outrank = self.edge_to(to)?;
        let mut result = self.offset(outrank);
        let mut offset = 0;
        for (rank, len) in self.run_iter() {
            if rank == outrank {
                result += len;
            }
            offset += len;
            if offset >= i {
                if rank == outrank {
                    result -= offset - i;
                }
                break;
            }
        }
        Some(result)
    }

    // Returns the rank of the edge to the given node.
    // The edges are sorted by the destination, so we can use binary search.
    fn edge_to(&self, node: usize) -> Option<usize> {
        self.edges.binary_search_by_key(&node, |edge| edge.0).ok()
    }

    /// Follows all sequences in the offset range to the given node.
    ///
    /// Returns a semiopen offset range in the destination node, or [`None`] if
    /// the input range is empty, the destination is the endmarker, or no
    /// sequences in the range continue with the given node.
    ///
    /// # Arguments
    ///
    /// * `range`: Offset range in the record.
    /// * `node`: Destination node.
    pub fn follow(&self, range: &Range<usize>, node: usize) -> Option<Range<usize>> {
        if range.is_empty() || node == ENDMARKER {
            return None;
        }
        let rank = self.edge_to(node)?;

        let mut result = self.offset(rank)..self.offset(rank);
        let mut offset = 0;
        for (c, len) in self.run_iter() {
            if c == rank {
                let run = offset..offset + len;
                result.start += support::intersect(&run, &(0..range.start)).len();
                result.end += support::intersect(&run, &(0..range.end)).len();
            }
            offset += len;
            if offset >= range.end {
                break;
            }
        }

        if result.is_empty() { None } else { Some(result) }
    }
}

//-----------------------------------------------------------------------------
