//! GBWT: a run-length encoded BWT index storing paths as sequences of node identifiers.
//!
//! The GBWT was originally described in:
//!
//! > Sirén, Garrison, Novak, Paten, Durbin: **Haplotype-aware graph indexes**.
//! > Bioinformatics, 2020. DOI: [10.1093/bioinformatics/btz575](https://doi.org/10.1093/bioinformatics/btz575)
//!
//! This module contains the compressed read-only index. Indexes are built by
//! inserting sequences into a [`DynamicGBWT`] and converting the result.

use crate::ENDMARKER;
use crate::bwt::{BWT, Record};
use crate::dynamic::DynamicGBWT;
use crate::headers::{Header, GBWTPayload};
use crate::samples::Samples;

use simple_sds::serialize::Serialize;

use std::io::{Error, ErrorKind};
use std::iter::FusedIterator;
use std::ops::Range;
use std::io;

#[cfg(test)]
mod tests;

//-----------------------------------------------------------------------------

/// The compressed GBWT index.
///
/// The index stores integer sequences. Each integer is assumed to be a node
/// identifier, and each sequence is interpreted as a path in a graph. The
/// index consists of the header, the node records concatenated in a [`BWT`],
/// and the document array [`Samples`] that map selected BWT positions back to
/// sequence identifiers.
///
/// Queries are read-only and reentrant: any number of threads may query the
/// same index concurrently.
///
/// # Examples
///
/// ```
/// use gbwt_dynamic::{DynamicGBWT, GBWT};
///
/// let mut dynamic = DynamicGBWT::default();
/// dynamic.insert(&[3, 5, 0, 3, 7, 0]);
/// let index = GBWT::from(&dynamic);
///
/// // Statistics.
/// assert_eq!(index.len(), 6);
/// assert_eq!(index.sequences(), 2);
/// assert_eq!(index.alphabet_size(), 8);
/// assert_eq!(index.alphabet_offset(), 2);
///
/// // Extract the sequences.
/// let first: Vec<usize> = index.sequence(0).collect();
/// assert_eq!(first, vec![3, 5]);
/// let second: Vec<usize> = index.sequence(1).collect();
/// assert_eq!(second, vec![3, 7]);
///
/// // The endmarker rows identify the sequences.
/// assert_eq!(index.try_locate(0, 0), Some(0));
/// assert_eq!(index.try_locate(0, 1), Some(1));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GBWT {
    header: Header<GBWTPayload>,
    bwt: BWT,
    samples: Samples,
    endmarker: Vec<(usize, usize)>,
}

//-----------------------------------------------------------------------------

/// Index statistics.
impl GBWT {
    /// Returns the total length of the sequences in the index, including the endmarkers.
    #[inline]
    pub fn len(&self) -> usize {
        self.header.payload().size
    }

    /// Returns `true` if the index is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of sequences in the index.
    #[inline]
    pub fn sequences(&self) -> usize {
        self.header.payload().sequences
    }

    /// Returns the size of the alphabet.
    #[inline]
    pub fn alphabet_size(&self) -> usize {
        self.header.payload().alphabet_size
    }

    /// Returns the alphabet offset for the effective alphabet.
    #[inline]
    pub fn alphabet_offset(&self) -> usize {
        self.header.payload().offset
    }

    /// Returns the size of the effective alphabet, including the endmarker.
    #[inline]
    pub fn effective_size(&self) -> usize {
        self.alphabet_size() - self.alphabet_offset()
    }

    /// Returns the smallest node identifier in the effective alphabet.
    #[inline]
    pub fn first_node(&self) -> usize {
        self.alphabet_offset() + 1
    }

    /// Returns `true` if node identifier `id` is in the effective alphabet.
    #[inline]
    pub fn has_node(&self, id: usize) -> bool {
        id > self.alphabet_offset() && id < self.alphabet_size()
    }

    /// Returns `true` if the index has a record for the given node.
    ///
    /// This is the precondition for all queries; it holds for the endmarker
    /// and for the effective alphabet.
    #[inline]
    pub fn contains(&self, node: usize) -> bool {
        node == ENDMARKER || self.has_node(node)
    }

    /// Returns the total number of runs in the records.
    pub fn runs(&self) -> usize {
        self.bwt.iter().map(|record| record.runs()).sum()
    }

    /// Returns a reference to the document array samples.
    #[inline]
    pub fn samples(&self) -> &Samples {
        &self.samples
    }

    // Converts node id to record id.
    #[inline]
    fn node_to_record(&self, node: usize) -> usize {
        if node == ENDMARKER { 0 } else { node - self.alphabet_offset() }
    }
}

//-----------------------------------------------------------------------------

/// Queries.
impl GBWT {
    /// Returns the record for the given node, or [`None`] if there is no such
    /// record or the record is empty.
    pub fn record(&self, node: usize) -> Option<Record<'_>> {
        if !self.contains(node) {
            return None;
        }
        self.bwt.record(self.node_to_record(node))
    }

    /// Follows the sequence at offset `i` of node `node` and returns
    /// (successor node, offset in successor), or [`None`] if the position does
    /// not exist.
    ///
    /// The successor may be the endmarker; see [`Record::lf`].
    pub fn lf(&self, node: usize, i: usize) -> Option<(usize, usize)> {
        self.record(node)?.lf(i)
    }

    /// Returns the offset in node `to` that offset `i` of node `node` maps to
    /// under LF, or [`None`] if there is no edge between the nodes.
    pub fn lf_to(&self, node: usize, i: usize, to: usize) -> Option<usize> {
        self.record(node)?.lf_to(i, to)
    }

    /// Follows all sequences in the offset range of node `node` to node `to`.
    ///
    /// Returns a semiopen offset range in the destination node; see
    /// [`Record::follow`].
    pub fn follow(&self, node: usize, range: &Range<usize>, to: usize) -> Option<Range<usize>> {
        self.record(node)?.follow(range, to)
    }

    /// Returns the sampled sequence identifier at offset `i` of node `node`,
    /// or [`None`] if the position does not carry a sample.
    pub fn try_locate(&self, node: usize, i: usize) -> Option<usize> {
        if !self.contains(node) {
            return None;
        }
        self.samples.try_locate(self.node_to_record(node), i)
    }
}

//-----------------------------------------------------------------------------

/// Sequence navigation.
impl GBWT {
    /// Returns the first position of sequence `id`, or [`None`] if there is no
    /// such sequence.
    ///
    /// The return value is a pair (node identifier, offset in node). For an
    /// empty sequence, the node is the endmarker.
    pub fn start(&self, id: usize) -> Option<(usize, usize)> {
        self.endmarker.get(id).copied()
    }

    /// Follows the sequence forward and returns the next position, or
    /// [`None`] if the sequence ends.
    ///
    /// The argument and the return value are pairs (node identifier, offset in node).
    pub fn forward(&self, pos: (usize, usize)) -> Option<(usize, usize)> {
        // This also catches the endmarker.
        if !self.has_node(pos.0) {
            return None;
        }
        let next = self.bwt.record(self.node_to_record(pos.0))?.lf(pos.1)?;
        if next.0 == ENDMARKER { None } else { Some(next) }
    }

    /// Returns an iterator over sequence `id`.
    ///
    /// The iterator will be empty if there is no such sequence.
    pub fn sequence(&self, id: usize) -> SequenceIter<'_> {
        SequenceIter {
            parent: self,
            next: self.start(id),
        }
    }
}

//-----------------------------------------------------------------------------

impl Serialize for GBWT {
    fn serialize_header<T: io::Write>(&self, writer: &mut T) -> io::Result<()> {
        self.header.serialize(writer)
    }

    fn serialize_body<T: io::Write>(&self, writer: &mut T) -> io::Result<()> {
        self.bwt.serialize(writer)?;
        self.samples.serialize(writer)?;
        Ok(())
    }

    fn load<T: io::Read>(reader: &mut T) -> io::Result<Self> {
        let header = Header::<GBWTPayload>::load(reader)?;
        if let Err(msg) = header.validate() {
            return Err(Error::new(ErrorKind::InvalidData, msg));
        }

        let bwt = BWT::load(reader)?;
        let samples = Samples::load(reader)?;

        // Decompress the endmarker, as the record can be poorly compressible.
        let endmarker = match bwt.record(ENDMARKER) {
            Some(record) => record.decompress(),
            None => Vec::new(),
        };

        Ok(GBWT {
            header,
            bwt,
            samples,
            endmarker,
        })
    }

    fn size_in_elements(&self) -> usize {
        self.header.size_in_elements() + self.bwt.size_in_elements() + self.samples.size_in_elements()
    }
}

impl From<&DynamicGBWT> for GBWT {
    fn from(source: &DynamicGBWT) -> Self {
        let mut header = *source.header();
        header.update();
        let bwt = BWT::from(source.records());
        let samples = Samples::from(source.records());
        let endmarker = match bwt.record(ENDMARKER) {
            Some(record) => record.decompress(),
            None => Vec::new(),
        };
        GBWT {
            header,
            bwt,
            samples,
            endmarker,
        }
    }
}

impl AsRef<BWT> for GBWT {
    #[inline]
    fn as_ref(&self) -> &BWT {
        &self.bwt
    }
}

//-----------------------------------------------------------------------------

/// An iterator over a sequence in [`GBWT`].
///
/// The type of `Item` is [`usize`]. The iterator yields the node identifiers
/// on the path and stops before the endmarker.
///
/// # Examples
///
/// ```
/// use gbwt_dynamic::{DynamicGBWT, GBWT};
///
/// let mut dynamic = DynamicGBWT::default();
/// dynamic.insert(&[3, 5, 4, 0]);
/// let index = GBWT::from(&dynamic);
///
/// let path: Vec<usize> = index.sequence(0).collect();
/// assert_eq!(path, vec![3, 5, 4]);
/// ```
#[derive(Clone, Debug)]
pub struct SequenceIter<'a> {
    parent: &'a GBWT,
    // The next position.
    next: Option<(usize, usize)>,
}

impl<'a> Iterator for SequenceIter<'a> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        let pos = self.next?;
        if pos.0 == ENDMARKER {
            self.next = None;
            return None;
        }
        self.next = self.parent.forward(pos);
        Some(pos.0)
    }
}

impl<'a> FusedIterator for SequenceIter<'a> {}

//-----------------------------------------------------------------------------
