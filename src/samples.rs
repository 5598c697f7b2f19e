//! Document-array samples: a sparse map from BWT positions to sequence identifiers.
//!
//! [`DASamples`] anchors [`crate::algorithms::locate`] queries.
//! A sampled position answers a locate query immediately; from any other position the query
//! walks forward with the LF-mapping until it reaches a sample.
//!
//! # Examples
//!
//! ```
//! use pathbwt::{DynamicGBWT, DASamples};
//!
//! let paths = vec![
//!     vec![2, 4],
//!     vec![2, 6],
//! ];
//! let dynamic = DynamicGBWT::from_paths(&paths, false, DynamicGBWT::SAMPLE_INTERVAL);
//! let samples = DASamples::from(&dynamic);
//!
//! // The last position of each sequence is always sampled.
//! assert_eq!(samples.len(), 2);
//! ```

use crate::dynamic::{DynamicGBWT, DynamicRecord};

use simple_sds::bit_vector::BitVector;
use simple_sds::int_vector::IntVector;
use simple_sds::ops::{Vector, Access, Push, BitVec, Rank, Select, PredSucc};
use simple_sds::raw_vector::{RawVector, AccessRaw};
use simple_sds::serialize::Serialize;
use simple_sds::sparse_vector::{SparseVector, SparseBuilder};
use simple_sds::bits;

use std::convert::TryFrom;
use std::io::{Error, ErrorKind};
use std::io;


//-----------------------------------------------------------------------------

/// Document-array samples over a record array.
///
/// The structure consists of four parts:
///
/// * `sampled_records`: a bitvector with rank support over all records; bit `v` is set if
///   record `v` contains at least one sample;
/// * `bwt_ranges`: a sparse bitvector over the concatenated bodies of the sampled records,
///   marking the start of each sampled record;
/// * `sampled_offsets`: a sparse bitvector over the same universe, marking the sampled
///   positions;
/// * `array`: a packed vector of sequence identifiers in sample rank order.
///
/// Records without samples do not contribute to the offset universe, which keeps the sparse
/// bitvectors small.
/// The structure is immutable; it is rebuilt from the dynamic records whenever the index
/// changes.
#[derive(Clone, Debug, PartialEq)]
pub struct DASamples {
    sampled_records: BitVector,
    bwt_ranges: SparseVector,
    sampled_offsets: SparseVector,
    array: IntVector,
}

impl DASamples {
    /// Returns the number of records covered by the structure.
    #[inline]
    pub fn records(&self) -> usize {
        self.sampled_records.len()
    }

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

    /// Returns `true` if the given record contains samples.
    pub fn is_sampled(&self, record: usize) -> bool {
        record < self.records() && self.sampled_records.get(record)
    }

    /// Returns the sequence identifier sampled at the given position, or [`None`] if the
    /// position is not sampled.
    ///
    /// # Arguments
    ///
    /// * `record`: Record identifier.
    /// * `offset`: Offset in the record body.
    pub fn try_locate(&self, record: usize, offset: usize) -> Option<usize> {
        if !self.is_sampled(record) {
            return None;
        }
        let global = self.start(record) + offset;
        if global >= self.sampled_offsets.len() {
            return None;
        }
        let mut iter = self.sampled_offsets.predecessor(global);
        if let Some((rank, value)) = iter.next() {
            if value == global {
                return Some(self.array.get(rank) as usize);
            }
        }
        None
    }

    /// Returns the first sample in the record at `offset` or later, or [`None`] if there is no
    /// such sample.
    ///
    /// The return value is a pair (offset in the record body, sequence identifier).
    ///
    /// # Arguments
    ///
    /// * `record`: Record identifier.
    /// * `offset`: Offset in the record body.
    pub fn next_sample(&self, record: usize, offset: usize) -> Option<(usize, usize)> {
        if !self.is_sampled(record) {
            return None;
        }
        let record_rank = self.sampled_records.rank(record);
        let start = self.record_start(record_rank);
        if start + offset >= self.sampled_offsets.len() {
            return None;
        }
        let mut iter = self.sampled_offsets.successor(start + offset);
        if let Some((rank, value)) = iter.next() {
            if value < self.record_limit(record_rank) {
                return Some((value - start, self.array.get(rank) as usize));
            }
        }
        None
    }

    // Offset of the record body in the concatenation of sampled record bodies.
    // Assumes that the record has samples.
    fn start(&self, record: usize) -> usize {
        self.record_start(self.sampled_records.rank(record))
    }

    // As `start`, but indexed by the rank of the record among sampled records.
    fn record_start(&self, record_rank: usize) -> usize {
        let mut iter = self.bwt_ranges.select_iter(record_rank);
        iter.next().unwrap().1
    }

    // Upper bound for the body range of a record, given its rank among sampled records.
    fn record_limit(&self, record_rank: usize) -> usize {
        if record_rank + 1 < self.bwt_ranges.count_ones() {
            let mut iter = self.bwt_ranges.select_iter(record_rank + 1);
            iter.next().unwrap().1
        } else {
            self.bwt_ranges.len()
        }
    }
}

impl From<&[DynamicRecord]> for DASamples {
    fn from(records: &[DynamicRecord]) -> Self {
        // Statistics for the sampled records.
        let mut record_count = 0;
        let mut bwt_offsets = 0;
        let mut sample_count = 0;
        let mut max_sequence = 0;
        for record in records.iter() {
            if record.samples() > 0 {
                record_count += 1;
                bwt_offsets += record.len();
                sample_count += record.samples();
                for i in 0..record.samples() {
                    max_sequence = std::cmp::max(max_sequence, record.sample(i).1);
                }
            }
        }

        let mut sampled_records = RawVector::with_len(records.len(), false);
        let mut range_builder = SparseBuilder::new(bwt_offsets, record_count).unwrap();
        let mut offset_builder = SparseBuilder::new(bwt_offsets, sample_count).unwrap();
        let width = bits::bit_len(max_sequence as u64);
        let mut array = IntVector::with_capacity(sample_count, width).unwrap();

        let mut offset = 0;
        for (id, record) in records.iter().enumerate() {
            if record.samples() == 0 {
                continue;
            }
            sampled_records.set_bit(id, true);
            unsafe { range_builder.set_unchecked(offset); }
            for i in 0..record.samples() {
                let (sample_offset, sequence) = record.sample(i);
                unsafe { offset_builder.set_unchecked(offset + sample_offset); }
                array.push(sequence as u64);
            }
            offset += record.len();
        }

        let mut sampled_records = BitVector::from(sampled_records);
        sampled_records.enable_rank();
        DASamples {
            sampled_records,
            bwt_ranges: SparseVector::try_from(range_builder).unwrap(),
            sampled_offsets: SparseVector::try_from(offset_builder).unwrap(),
            array,
        }
    }
}

impl From<&DynamicGBWT> for DASamples {
    fn from(index: &DynamicGBWT) -> Self {
        DASamples::from(index.records())
    }
}

impl Serialize for DASamples {
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
        if bwt_ranges.count_ones() != sampled_records.count_ones() {
            return Err(Error::new(ErrorKind::InvalidData, "DASamples: Sampled record count mismatch"));
        }
        if sampled_offsets.count_ones() != array.len() {
            return Err(Error::new(ErrorKind::InvalidData, "DASamples: Sample count mismatch"));
        }
        if bwt_ranges.len() != sampled_offsets.len() {
            return Err(Error::new(ErrorKind::InvalidData, "DASamples: Offset universe mismatch"));
        }
        Ok(DASamples {
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

//-----------------------------------------------------------------------------
