//! Document array samples for mapping BWT positions to sequence identifiers.

use crate::record::DynamicRecord;

use simple_sds::bit_vector::BitVector;
use simple_sds::int_vector::IntVector;
use simple_sds::ops::{Vector, Access, Push, BitVec, Rank, Select};
use simple_sds::raw_vector::{RawVector, AccessRaw};
use simple_sds::serialize::Serialize;
use simple_sds::sparse_vector::{SparseVector, SparseBuilder};
use simple_sds::bits;

use std::convert::TryFrom;
use std::io::{Error, ErrorKind};
use std::io;


//-----------------------------------------------------------------------------

/// Sequence identifier samples at selected BWT positions.
///
/// The samples are stored in the concatenated coordinate space of the records
/// that contain at least one sample. A dense bitmap `sampled_records` marks
/// those records, a sparse bitmap `bwt_ranges` marks the start of the
/// coordinate range of each sampled record, and a sparse bitmap
/// `sampled_offsets` marks the positions that carry a sample. The sample
/// values are in a packed integer array in the same order.
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
/// // Every sequence is sampled at its row of the endmarker record.
/// assert_eq!(index.try_locate(0, 0), Some(0));
/// assert_eq!(index.try_locate(0, 1), Some(1));
/// assert_eq!(index.try_locate(3, 0), None);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Samples {
    sampled_records: BitVector,
    bwt_ranges: SparseVector,
    sampled_offsets: SparseVector,
    array: IntVector,
}

impl Samples {
    /// Returns the number of samples.
    #[inline]
    pub fn len(&self) -> usize {
        self.array.len()
    }

    /// Returns `true` if there are no samples.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of records with at least one sample.
    #[inline]
    pub fn sampled_records(&self) -> usize {
        self.sampled_records.count_ones()
    }

    /// Returns the sequence identifier at offset `i` of record `record`, or
    /// [`None`] if the position does not carry a sample.
    ///
    /// The caller must ensure that `i` is a valid offset in the record.
    pub fn try_locate(&self, record: usize, i: usize) -> Option<usize> {
        if record >= self.sampled_records.len() || !self.sampled_records.get(record) {
            return None;
        }
        let record_rank = self.sampled_records.rank(record);
        let (_, start) = self.bwt_ranges.select_iter(record_rank).next().unwrap();
        if start + i >= self.sampled_offsets.len() || !self.sampled_offsets.get(start + i) {
            return None;
        }
        Some(self.array.get(self.sampled_offsets.rank(start + i)) as usize)
    }

    // Returns all samples as (record identifier, offset in the record,
    // sequence identifier), sorted by the position.
    pub(crate) fn extract(&self) -> Vec<(usize, usize, usize)> {
        let mut result: Vec<(usize, usize, usize)> = Vec::with_capacity(self.len());
        let mut records = self.sampled_records.one_iter();
        let mut ranges = self.bwt_ranges.one_iter();
        let mut curr: Option<(usize, usize)> = None;
        let mut next_range = ranges.next();
        for (rank, pos) in self.sampled_offsets.one_iter() {
            while let Some((_, start)) = next_range {
                if pos < start {
                    break;
                }
                curr = Some((records.next().unwrap().1, start));
                next_range = ranges.next();
            }
            let (record, start) = curr.unwrap();
            result.push((record, pos - start, self.array.get(rank) as usize));
        }
        result
    }
}

//-----------------------------------------------------------------------------

impl Serialize for Samples {
    fn serialize_header<T: io::Write>(&self, _: &mut T) -> io::Result<()> {
        Ok(())
    }

    fn serialize_body<T: io::Write>(&self, writer: &mut T) -> io::Result<()> {
        self.sampled_records.serialize(writer)?;
        self.bwt_ranges.serialize(writer)?;
        self.sampled_offsets.serialize(writer)?;
        self.array.serialize(writer)?;
        Ok(())
    }

    fn load<T: io::Read>(reader: &mut T) -> io::Result<Self> {
        let mut sampled_records = BitVector::load(reader)?;
        sampled_records.enable_rank();
        let bwt_ranges = SparseVector::load(reader)?;
        let sampled_offsets = SparseVector::load(reader)?;
        let array = IntVector::load(reader)?;
        if bwt_ranges.len() != sampled_offsets.len() {
            return Err(Error::new(ErrorKind::InvalidData, "Samples: Bitmap length mismatch"));
        }
        if bwt_ranges.count_ones() != sampled_records.count_ones() {
            return Err(Error::new(ErrorKind::InvalidData, "Samples: Sampled record count mismatch"));
        }
        if sampled_offsets.count_ones() != array.len() {
            return Err(Error::new(ErrorKind::InvalidData, "Samples: Sample count mismatch"));
        }
        Ok(Samples {
            sampled_records,
            bwt_ranges,
            sampled_offsets,
            array,
        })
    }

    fn size_in_elements(&self) -> usize {
        self.sampled_records.size_in_elements()
            + self.bwt_ranges.size_in_elements()
            + self.sampled_offsets.size_in_elements()
            + self.array.size_in_elements()
    }
}

impl From<&[DynamicRecord]> for Samples {
    fn from(records: &[DynamicRecord]) -> Self {
        // Determine the statistics and mark the sampled records.
        let mut offsets = 0;
        let mut sample_count = 0;
        let mut sampled = RawVector::with_len(records.len(), false);
        for (i, record) in records.iter().enumerate() {
            if record.samples() > 0 {
                offsets += record.len();
                sample_count += record.samples();
                sampled.set_bit(i, true);
            }
        }
        let mut sampled_records = BitVector::from(sampled);
        sampled_records.enable_rank();

        // Build the bitmaps over the concatenated record coordinates.
        let mut range_builder = SparseBuilder::new(offsets, sampled_records.count_ones()).unwrap();
        let mut offset_builder = SparseBuilder::new(offsets, sample_count).unwrap();
        let mut offset = 0;
        let mut max_sample: u64 = 0;
        for record in records.iter().filter(|record| record.samples() > 0) {
            unsafe { range_builder.set_unchecked(offset); }
            for sample in record.ids.iter() {
                unsafe { offset_builder.set_unchecked(offset + sample.0 as usize); }
                max_sample = std::cmp::max(max_sample, sample.1 as u64);
            }
            offset += record.len();
        }

        // Store the samples.
        let mut array = IntVector::with_capacity(sample_count, bits::bit_len(max_sample)).unwrap();
        for record in records.iter().filter(|record| record.samples() > 0) {
            for sample in record.ids.iter() {
                array.push(sample.1 as u64);
            }
        }

        Samples {
            sampled_records,
            bwt_ranges: SparseVector::try_from(range_builder).unwrap(),
            sampled_offsets: SparseVector::try_from(offset_builder).unwrap(),
            array,
        }
    }
}

//-----------------------------------------------------------------------------
