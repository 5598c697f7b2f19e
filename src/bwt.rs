//! The BWT stored as an array of compressed node records.
//!
//! [`BWT`] concatenates the byte encodings of all node records and indexes their starting
//! offsets with a sparse bitvector.
//! [`Record`] is a borrowed view of a single record that decompresses the edge list eagerly and
//! scans the run-length encoded body lazily.
//! [`DecompressedRecord`] materializes the body for fast sequential traversal.
//!
//! # Examples
//!
//! ```
//! use pathbwt::bwt::{BWT, BWTBuilder, Pos};
//!
//! // A small index over record identifiers 0..8, where record 0 is the endmarker.
//! let mut builder = BWTBuilder::new();
//! builder.append(&[(1, 0)], &[(0, 3)]);
//! builder.append(&[(2, 0), (3, 0)], &[(0, 2), (1, 1)]);
//! builder.append(&[(4, 0), (5, 0)], &[(0, 1), (1, 1)]);
//! builder.append(&[(4, 1)], &[(0, 1)]);
//! builder.append(&[(5, 1), (6, 0)], &[(1, 1), (0, 1)]);
//! builder.append(&[(7, 0)], &[(0, 2)]);
//! builder.append(&[(7, 2)], &[(0, 1)]);
//! builder.append(&[(0, 0)], &[(0, 3)]);
//!
//! let bwt = BWT::from(builder);
//! assert_eq!(bwt.len(), 8);
//!
//! let record = bwt.record(2).unwrap();
//! assert_eq!(record.id(), 2);
//! assert_eq!(record.outdegree(), 2);
//! assert_eq!(record.successor(1), 5);
//! assert_eq!(record.offset(1), 0);
//! assert_eq!(record.len(), 2);
//! assert_eq!(record.lf(1), Some(Pos::new(5, 0)));
//! assert_eq!(record.follow(&(0..2), 5), Some(0..1));
//!
//! // Determine the length of the BWT by iterating over the records.
//! let bwt_len = bwt.iter().fold(0, |len, record| len + record.len());
//! assert_eq!(bwt_len, 17);
//! ```

use crate::support::{ByteCodeIter, RLE, RLEIter};
use crate::ENDMARKER;
use crate::support;

use simple_sds::sparse_vector::{SparseVector, SparseBuilder};
use simple_sds::ops::{BitVec, Select};
use simple_sds::serialize::Serialize;

use std::cmp::Ordering;
use std::convert::TryFrom;
use std::io::{Error, ErrorKind};
use std::iter::FusedIterator;
use std::ops::Range;
use std::{cmp, io};


//-----------------------------------------------------------------------------

/// A BWT position: an oriented node and an offset in the record of that node.
///
/// Sequence navigation and [`crate::algorithms::locate`] operate on positions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pos {
    /// Oriented node identifier.
    pub node: usize,
    /// Offset in the record body.
    pub offset: usize,
}

impl Pos {
    /// Creates a new position.
    #[inline]
    pub fn new(node: usize, offset: usize) -> Self {
        Pos { node, offset }
    }
}

impl From<(usize, usize)> for Pos {
    #[inline]
    fn from(value: (usize, usize)) -> Self {
        Pos::new(value.0, value.1)
    }
}

impl From<Pos> for (usize, usize) {
    #[inline]
    fn from(value: Pos) -> Self {
        (value.node, value.offset)
    }
}

//-----------------------------------------------------------------------------

/// The BWT encoded as a vector of bytes.
///
/// The encoding consists of `self.len()` concatenated node records.
/// Record identifiers are characters in the effective alphabet `0..self.len()`; the successor
/// values stored inside the records are node identifiers, which may differ from record
/// identifiers by an alphabet offset.
/// There may be empty records that do not correspond to any node in the graph.
/// See the module-level documentation for an example.
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

    /// Returns the `i`th record, or `None` if the record is empty or does not exist.
    pub fn record(&self, i: usize) -> Option<Record> {
        if i >= self.len() {
            return None;
        }
        let (start, limit) = self.range(i);
        Record::new(i, &self.data[start..limit])
    }

    /// Returns `true` if the `i`th record is empty or does not exist.
    ///
    /// This only peeks at the first byte of the record.
    pub fn is_empty_record(&self, i: usize) -> bool {
        if i >= self.len() {
            return true;
        }
        let (start, _) = self.range(i);
        self.data[start] == 0
    }

    /// Returns an iterator over the records in the BWT.
    ///
    /// Note that the iterator skips empty records.
    pub fn iter(&self) -> RecordIter {
        RecordIter {
            parent: self,
            next: 0,
        }
    }

    /// Merges the source BWTs into a single record array.
    ///
    /// Records are copied in destination order: the `i`th destination record is the next unused
    /// record of source `origins[i]`.
    /// The caller is responsible for rewriting the successor values inside the records to the
    /// merged node numbering before the merge; this function only moves bytes.
    ///
    /// # Panics
    ///
    /// Panics if `origins` refers to more records than a source contains.
    pub fn merge(sources: &[&BWT], origins: &[usize]) -> BWT {
        let mut next: Vec<usize> = vec![0; sources.len()];
        let mut offsets: Vec<usize> = Vec::with_capacity(origins.len());
        let mut data: Vec<u8> = Vec::new();
        for &origin in origins.iter() {
            let source = sources[origin];
            let record = next[origin];
            assert!(record < source.len(), "BWT: Source {} ran out of records", origin);
            next[origin] += 1;
            let (start, limit) = source.range(record);
            offsets.push(data.len());
            data.extend_from_slice(&source.data[start..limit]);
        }
        BWT::from_parts(&offsets, data)
    }

    // Byte range of record `i`, which must exist.
    fn range(&self, i: usize) -> (usize, usize) {
        let mut iter = self.index.select_iter(i);
        let (_, start) = iter.next().unwrap();
        let limit = if i + 1 < self.len() { iter.next().unwrap().1 } else { self.data.len() };
        (start, limit)
    }

    // Builds the record array from start offsets and concatenated record bytes.
    pub(crate) fn from_parts(offsets: &[usize], data: Vec<u8>) -> BWT {
        let mut builder = SparseBuilder::new(data.len(), offsets.len()).unwrap();
        for offset in offsets.iter() {
            unsafe { builder.set_unchecked(*offset); }
        }
        BWT {
            index: SparseVector::try_from(builder).unwrap(),
            data,
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

impl From<BWTBuilder> for BWT {
    fn from(source: BWTBuilder) -> Self {
        BWT::from_parts(&source.offsets, Vec::<u8>::from(source.encoder))
    }
}

//-----------------------------------------------------------------------------

/// A structure for building the BWT by appending raw node records.
///
/// This is mostly intended for testing; whole indexes are built through
/// [`crate::DynamicGBWT`].
/// See the module-level documentation for an example.
#[derive(Clone, Debug, Default)]
pub struct BWTBuilder {
    offsets: Vec<usize>,
    encoder: RLE,
}

impl BWTBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        BWTBuilder::default()
    }

    /// Returns the number of records.
    #[inline]
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Returns `true` if the builder is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends a new record to the BWT.
    ///
    /// The record consists of a list of edges and a list of runs.
    /// Each edge is a pair (successor node, offset in the successor), with the successors in
    /// sorted order.
    /// Each run is a pair `(rank, len)`, with `rank < edges.len()` and `len > 0`.
    pub fn append(&mut self, edges: &[(usize, usize)], runs: &[(usize, usize)]) {
        self.offsets.push(self.encoder.len());
        self.encoder.write_int(edges.len());
        let mut prev = 0;
        for (node, offset) in edges {
            self.encoder.write_int(*node - prev);
            self.encoder.write_int(*offset);
            prev = *node;
        }
        self.encoder.set_sigma(edges.len());
        for (rank, len) in runs {
            self.encoder.write(*rank, *len);
        }
    }
}

//-----------------------------------------------------------------------------

/// An iterator over the records in [`BWT`].
///
/// The type of `Item` is [`Record`].
/// Note that the iterator skips empty records.
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
/// The edge list is materialized; the body remains run-length encoded, and every query scans it
/// from the start.
/// [`Record::len`] and [`Record::runs`] are therefore linear in the number of runs.
/// See the module-level documentation for an example.
#[derive(Clone, Debug)]
pub struct Record<'a> {
    id: usize,
    edges: Vec<(usize, usize)>,
    bwt: &'a [u8],
}

impl<'a> Record<'a> {
    /// Returns a record corresponding to the byte slice, or `None` if the record would be empty.
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

    /// Returns the BWT offset in the successor of rank `i`.
    ///
    /// # Panics
    ///
    /// May panic if `i >= self.outdegree()`.
    #[inline]
    pub fn offset(&self, i: usize) -> usize {
        self.edges[i].1
    }

    /// Returns `true` if the record has an edge to the given node.
    pub fn has_edge(&self, node: usize) -> bool {
        self.edge_to(node).is_some()
    }

    /// Returns the length of the record body.
    ///
    /// This is somewhat slow, as it scans the run-length encoded body.
    /// Note that the length is always non-zero.
    pub fn len(&self) -> usize {
        let mut result = 0;
        for (_, len) in RLEIter::with_sigma(self.bwt, self.edges.len()) {
            result += len;
        }
        result
    }

    /// Returns the number of runs in the record body.
    ///
    /// This is somewhat slow, as it scans the run-length encoded body.
    pub fn runs(&self) -> usize {
        RLEIter::with_sigma(self.bwt, self.edges.len()).count()
    }

    /// Returns the successor node at offset `i` in the record body, or [`None`] if there is no
    /// such offset.
    ///
    /// The successor may be the endmarker.
    pub fn node_at(&self, i: usize) -> Option<usize> {
        let mut offset = 0;
        for (rank, len) in RLEIter::with_sigma(self.bwt, self.edges.len()) {
            offset += len;
            if offset > i {
                return Some(self.successor(rank));
            }
        }
        None
    }

    /// Follows the sequence at offset `i` and returns the position in the successor.
    ///
    /// Returns [`None`] if the sequence ends or offset `i` does not exist.
    pub fn lf(&self, i: usize) -> Option<Pos> {
        let mut edges = self.edges.clone();
        let mut offset = 0;
        for (rank, len) in RLEIter::with_sigma(self.bwt, self.edges.len()) {
            if offset + len > i {
                if self.successor(rank) == ENDMARKER {
                    return None;
                } else {
                    edges[rank].1 += i - offset;
                    return Some(Pos::from(edges[rank]));
                }
            }
            edges[rank].1 += len;
            offset += len;
        }
        None
    }

    /// Returns the offset in the given node that the sequence at offset `i` would have after
    /// taking the edge to that node.
    ///
    /// This is the LF-mapping restricted to one character: the result is the offset of the
    /// `i`th occurrence boundary of `node` in the record body.
    /// Unlike [`Record::lf`], the symbol at offset `i` does not have to be `node`, and `i` may
    /// be one past the end of the body.
    /// Returns [`None`] if there is no edge to `node` or `node` is the endmarker.
    pub fn lf_to(&self, i: usize, node: usize) -> Option<usize> {
        if node == ENDMARKER {
            return None;
        }
        let rank = self.edge_to(node)?;
        let mut result = self.offset(rank);
        let mut offset = 0;
        for (c, len) in RLEIter::with_sigma(self.bwt, self.edges.len()) {
            if offset >= i {
                break;
            }
            if c == rank {
                result += cmp::min(len, i - offset);
            }
            offset += len;
        }
        Some(result)
    }

    /// Returns the predecessor node for the sequence at offset `i` in the other orientation of
    /// this node.
    ///
    /// This query assumes that the index is bidirectional.
    /// Returns [`None`] if the predecessor or the offset does not exist.
    pub fn predecessor_at(&self, i: usize) -> Option<usize> {
        // Determine the number of sequences going to each successor node.
        let mut edges: Vec<(usize, usize)> = Vec::with_capacity(self.edges.len());
        for rank in 0..self.edges.len() {
            edges.push((self.successor(rank), 0));
        }
        for (rank, len) in RLEIter::with_sigma(self.bwt, self.edges.len()) {
            edges[rank].1 += len;
        }

        // Flip the successor nodes to make them the predecessors of the other orientation of
        // this node.
        for rank in 0..edges.len() {
            if edges[rank].0 != ENDMARKER {
                edges[rank].0 = support::flip_node(edges[rank].0);
            }
        }

        // Handle the special case where the predecessors are now in the wrong order because they
        // contain both orientations of the same node.
        for rank in 1..edges.len() {
            if support::node_id(edges[rank - 1].0) == support::node_id(edges[rank].0) {
                edges.swap(rank - 1, rank);
            }
        }

        // Find the predecessor, if it exists.
        let mut offset = 0;
        for (id, count) in edges {
            offset += count;
            if offset > i {
                if id == ENDMARKER {
                    return None;
                }
                return Some(id);
            }
        }

        None
    }

    // Returns the rank of the edge to the given node.
    fn edge_to(&self, node: usize) -> Option<usize> {
        let mut low = 0;
        let mut high = self.outdegree();
        while low < high {
            let mid = low + (high - low) / 2;
            match node.cmp(&self.edges[mid].0) {
                Ordering::Less => high = mid,
                Ordering::Equal => return Some(mid),
                Ordering::Greater => low = mid + 1,
            }
        }
        None
    }

    /// Returns the offset for which [`Record::lf`] would return `pos`, or [`None`] if no such
    /// offset exists.
    pub fn offset_to(&self, pos: Pos) -> Option<usize> {
        if pos.node == ENDMARKER {
            return None;
        }
        let outrank = self.edge_to(pos.node)?;

        // Rank of `pos.node` so far.
        let mut succ_rank = self.offset(outrank);
        if succ_rank > pos.offset {
            return None;
        }

        // Find the occurrence of `pos.node` of rank `pos.offset - succ_rank`.
        let mut offset = 0;
        for (c, len) in RLEIter::with_sigma(self.bwt, self.outdegree()) {
            offset += len;
            if c != outrank {
                continue;
            }
            succ_rank += len;
            if succ_rank > pos.offset {
                return Some(offset - (succ_rank - pos.offset));
            }
        }

        None
    }

    /// Follows all sequences in the offset range to the given node.
    ///
    /// Returns a semiopen offset range in the destination node, or [`None`] if no such sequences
    /// exist.
    /// See also [`Record::bd_follow`].
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
        for (c, len) in RLEIter::with_sigma(self.bwt, self.outdegree()) {
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

    /// Follows all sequences in the offset range to the given node.
    ///
    /// This query assumes that the index is bidirectional.
    /// Returns a semiopen offset range in the destination node, or [`None`] if no such sequences
    /// exist.
    /// The second return value is the number of occurrences of nodes `v` in the query range such
    /// that [`support::flip_node`]`(v) < `[`support::flip_node`]`(node)`.
    /// This information can be used for updating the reverse range in bidirectional search.
    /// See also [`Record::follow`].
    ///
    /// # Arguments
    ///
    /// * `range`: Offset range in the record.
    /// * `node`: Destination node.
    pub fn bd_follow(&self, range: &Range<usize>, node: usize) -> Option<(Range<usize>, usize)> {
        if range.is_empty() || node == ENDMARKER {
            return None;
        }
        let rank = self.edge_to(node)?;
        let reverse = support::flip_node(node);

        let mut result = self.offset(rank)..self.offset(rank);
        let mut count = 0;
        let mut offset = 0;
        for (c, len) in RLEIter::with_sigma(self.bwt, self.outdegree()) {
            let run = offset..offset + len;
            if c == rank {
                result.start += support::intersect(&run, &(0..range.start)).len();
                result.end += support::intersect(&run, &(0..range.end)).len();
            }
            if support::flip_node(self.successor(c)) < reverse {
                count += support::intersect(&run, range).len();
            }
            offset += len;
            if offset >= range.end {
                break;
            }
        }

        if result.is_empty() { None } else { Some((result, count)) }
    }
}

//-----------------------------------------------------------------------------

/// A record decompressed into an edge array.
///
/// `body[i]` is the position [`DecompressedRecord::lf`] would return for offset `i`, making
/// sequential traversal a plain array lookup.
/// `after` stores, for each outgoing edge, the successor position past the last occurrence in
/// this record.
/// There is no support for pattern search; use [`Record`] for that.
///
/// # Examples
///
/// ```
/// use pathbwt::bwt::{BWT, BWTBuilder, DecompressedRecord, Pos};
///
/// let mut builder = BWTBuilder::new();
/// builder.append(&[(1, 2), (2, 0)], &[(0, 1), (1, 2), (0, 1)]);
/// builder.append(&[(0, 0)], &[(0, 1)]);
/// builder.append(&[(0, 0)], &[(0, 1)]);
/// let bwt = BWT::from(builder);
///
/// let record = DecompressedRecord::from(&bwt.record(0).unwrap());
/// assert_eq!(record.len(), 4);
/// assert_eq!(record.lf(0), Some(Pos::new(1, 2)));
/// assert_eq!(record.lf(1), Some(Pos::new(2, 0)));
/// assert_eq!(record.node_at(2), 2);
/// assert_eq!(record.offset_after(0), 4);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DecompressedRecord {
    outgoing: Vec<(usize, usize)>,
    after: Vec<(usize, usize)>,
    body: Vec<(usize, usize)>,
}

impl DecompressedRecord {
    /// Returns the length of the record body.
    #[inline]
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Returns `true` if the record is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the outdegree of the node.
    #[inline]
    pub fn outdegree(&self) -> usize {
        self.outgoing.len()
    }

    /// Returns the number of runs in the record body.
    pub fn runs(&self) -> usize {
        let mut result = 0;
        let mut prev = None;
        for (node, _) in self.body.iter() {
            if Some(node) != prev {
                result += 1;
                prev = Some(node);
            }
        }
        result
    }

    /// Returns the successor node of rank `i`.
    ///
    /// # Panics
    ///
    /// May panic if `i >= self.outdegree()`.
    #[inline]
    pub fn successor(&self, i: usize) -> usize {
        self.outgoing[i].0
    }

    /// Returns the BWT offset in the successor of rank `i`.
    ///
    /// # Panics
    ///
    /// May panic if `i >= self.outdegree()`.
    #[inline]
    pub fn offset(&self, i: usize) -> usize {
        self.outgoing[i].1
    }

    /// Returns the BWT offset in the successor of rank `i` past the last occurrence in this
    /// record.
    ///
    /// # Panics
    ///
    /// May panic if `i >= self.outdegree()`.
    #[inline]
    pub fn offset_after(&self, i: usize) -> usize {
        self.after[i].1
    }

    /// Returns the successor node at offset `i` in the record body.
    ///
    /// # Panics
    ///
    /// May panic if `i >= self.len()`.
    #[inline]
    pub fn node_at(&self, i: usize) -> usize {
        self.body[i].0
    }

    /// Follows the sequence at offset `i` and returns the position in the successor.
    ///
    /// Returns [`None`] if the sequence ends or offset `i` does not exist.
    pub fn lf(&self, i: usize) -> Option<Pos> {
        if i >= self.len() || self.body[i].0 == ENDMARKER {
            return None;
        }
        Some(Pos::from(self.body[i]))
    }

    // Builds the record from materialized parts.
    pub(crate) fn from_parts(
        outgoing: Vec<(usize, usize)>,
        after: Vec<(usize, usize)>,
        body: Vec<(usize, usize)>,
    ) -> Self {
        DecompressedRecord {
            outgoing,
            after,
            body,
        }
    }
}

impl<'a> From<&Record<'a>> for DecompressedRecord {
    fn from(source: &Record<'a>) -> Self {
        let outgoing = source.edges.clone();
        let mut after = source.edges.clone();
        let mut body: Vec<(usize, usize)> = Vec::new();
        for (rank, len) in RLEIter::with_sigma(source.bwt, source.edges.len()) {
            for _ in 0..len {
                body.push(after[rank]);
                after[rank].1 += 1;
            }
        }
        DecompressedRecord {
            outgoing,
            after,
            body,
        }
    }
}

//-----------------------------------------------------------------------------
