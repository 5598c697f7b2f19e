//! The compressed index: a run-length encoded FM-index storing paths as node sequences.
//!
//! [`GBWT`] packs the node records into a [`BWT`] record array, keeps the document-array
//! samples for `locate` queries, and caches the endmarker record in decompressed form.
//! It is built by compressing a [`crate::DynamicGBWT`] and is immutable afterwards, which makes
//! read-only queries freely parallel.
//!
//! # Examples
//!
//! ```
//! use pathbwt::{GBWT, DynamicGBWT};
//! use pathbwt::support;
//!
//! let paths = vec![
//!     vec![support::encode_node(1, false), support::encode_node(2, false), support::encode_node(4, false)],
//!     vec![support::encode_node(1, false), support::encode_node(3, false), support::encode_node(4, false)],
//! ];
//! let dynamic = DynamicGBWT::from_paths(&paths, true, DynamicGBWT::SAMPLE_INTERVAL);
//! let index = GBWT::from(&dynamic);
//!
//! // A bidirectional index stores each path in both orientations.
//! assert!(index.is_bidirectional());
//! assert_eq!(index.sequences(), 4);
//!
//! // Search for the subpath (1, forward), (2, forward).
//! let state = index.find(support::encode_node(1, false)).unwrap();
//! let state = index.extend(&state, support::encode_node(2, false)).unwrap();
//! assert_eq!(state.len(), 1);
//!
//! // Extract path 0 in forward orientation.
//! let path: Vec<usize> = index.sequence(support::encode_path(0, false)).collect();
//! assert_eq!(path, paths[0]);
//! ```

use crate::{ENDMARKER, SOURCE_KEY, SOURCE_VALUE};
use crate::bwt::{BWT, DecompressedRecord, Pos, Record};
use crate::dynamic::DynamicGBWT;
use crate::headers::{Header, GBWTPayload};
use crate::samples::DASamples;
use crate::support::{RLE, Tags};
use crate::support;

use simple_sds::serialize::Serialize;

use std::io::{Error, ErrorKind};
use std::iter::FusedIterator;
use std::ops::Range;
use std::io;


//-----------------------------------------------------------------------------

/// The compressed index storing a collection of paths space-efficiently.
///
/// Each integer in a stored sequence is an oriented node identifier, and each sequence is a path
/// in a graph.
/// If the index is not bidirectional, node and sequence identifiers correspond directly to node
/// and path identifiers in the original graph.
///
/// In a bidirectional index, each node (path) in the original graph becomes two nodes
/// (sequences) in the index: one for the forward orientation and one for the reverse
/// orientation.
/// A reverse path visits the other orientation of each node on the path in reverse order.
/// The following functions map between the identifiers used by the index and the graph:
///
/// * [`support::encode_node`], [`support::flip_node`], [`support::node_id`], and
///   [`support::node_is_reverse`] for node identifiers.
/// * [`support::encode_path`], [`support::flip_path`], [`support::path_id`], and
///   [`support::path_is_reverse`] for sequence / path identifiers.
///
/// See the module-level documentation for an example.
#[derive(Clone, Debug, PartialEq)]
pub struct GBWT {
    header: Header<GBWTPayload>,
    tags: Tags,
    bwt: BWT,
    samples: DASamples,
    endmarker: DecompressedRecord,
}

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

    /// Returns the alphabet offset: node identifiers in `1..offset + 1` are not used.
    #[inline]
    pub fn alphabet_offset(&self) -> usize {
        self.header.payload().offset
    }

    /// Returns the size of the effective alphabet.
    #[inline]
    pub fn effective_size(&self) -> usize {
        self.alphabet_size() - self.alphabet_offset()
    }

    /// Returns the smallest node identifier in the effective alphabet.
    #[inline]
    pub fn first_node(&self) -> usize {
        self.alphabet_offset() + 1
    }

    /// Returns `true` if node identifier `node` is in the effective alphabet.
    #[inline]
    pub fn has_node(&self, node: usize) -> bool {
        node > self.alphabet_offset() && node < self.alphabet_size()
    }

    /// Returns `true` if the index is bidirectional.
    #[inline]
    pub fn is_bidirectional(&self) -> bool {
        self.header.is_set(GBWTPayload::FLAG_BIDIRECTIONAL)
    }

    /// Returns the number of occurrences of the given node (the length of its record body).
    ///
    /// This is somewhat slow, as it scans the run-length encoded record.
    pub fn node_size(&self, node: usize) -> usize {
        match self.record(node) {
            Some(record) => record.len(),
            None => 0,
        }
    }

    /// Returns the tags stored in the index.
    #[inline]
    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    /// Returns the document-array samples.
    #[inline]
    pub fn samples(&self) -> &DASamples {
        &self.samples
    }

    /// Returns the record of the given node, or [`None`] if the record is empty or missing.
    ///
    /// The endmarker record is `self.record(ENDMARKER)`.
    pub fn record(&self, node: usize) -> Option<Record> {
        if node != ENDMARKER && !self.has_node(node) {
            return None;
        }
        self.bwt.record(self.node_to_record(node))
    }

    // Converts node id to record id.
    #[inline]
    fn node_to_record(&self, node: usize) -> usize {
        if node == ENDMARKER { 0 } else { node - self.alphabet_offset() }
    }
}

//-----------------------------------------------------------------------------

/// Sequence navigation.
impl GBWT {
    /// Returns the first position in sequence `id`, or [`None`] if no such sequence exists.
    pub fn start(&self, id: usize) -> Option<Pos> {
        if id >= self.sequences() {
            return None;
        }
        self.endmarker.lf(id)
    }

    /// Follows the sequence forward and returns the next position, or [`None`] if the sequence
    /// ends.
    pub fn forward(&self, pos: Pos) -> Option<Pos> {
        // This also catches the endmarker.
        if pos.node < self.first_node() {
            return None;
        }
        self.record(pos.node)?.lf(pos.offset)
    }

    /// Follows the sequence backward and returns the previous position, or [`None`] if no such
    /// position exists.
    ///
    /// # Panics
    ///
    /// Panics if the index is not bidirectional.
    pub fn backward(&self, pos: Pos) -> Option<Pos> {
        assert!(self.is_bidirectional(), "Following sequences backward requires a bidirectional index");
        // This also catches the endmarker.
        if pos.node < self.first_node() {
            return None;
        }
        let reverse_record = self.record(support::flip_node(pos.node))?;
        let predecessor = reverse_record.predecessor_at(pos.offset)?;
        let pred_record = self.record(predecessor)?;
        let offset = pred_record.offset_to(pos)?;
        Some(Pos::new(predecessor, offset))
    }

    /// Returns an iterator over sequence `id`.
    ///
    /// The iterator will be empty if no such sequence exists.
    pub fn sequence(&self, id: usize) -> SequenceIter {
        SequenceIter {
            parent: self,
            next: self.start(id),
        }
    }
}

//-----------------------------------------------------------------------------

/// Subpath search.
impl GBWT {
    /// Returns a search state for all occurrences of the given node, or [`None`] if no such node
    /// exists.
    pub fn find(&self, node: usize) -> Option<SearchState> {
        // This also catches the endmarker.
        if node < self.first_node() {
            return None;
        }
        let record = self.record(node)?;
        Some(SearchState {
            node,
            range: 0..record.len(),
        })
    }

    /// Extends the search by the given node forward and returns the new search state, or
    /// [`None`] if no such extensions exist.
    ///
    /// Assume that the current search state corresponds to a set of substring occurrences ending
    /// with the same node.
    /// This method takes all of those substrings that continue with the given node, extends them
    /// with that node, and returns the new search state.
    ///
    /// # Arguments
    ///
    /// * `state`: A search state corresponding to a set of substring occurrences.
    /// * `node`: Node to extend the substrings with.
    pub fn extend(&self, state: &SearchState, node: usize) -> Option<SearchState> {
        // This also catches the endmarker.
        if node < self.first_node() {
            return None;
        }
        let record = self.record(state.node)?;
        let range = record.follow(&state.range, node)?;
        Some(SearchState {
            node,
            range,
        })
    }

    /// Returns a bidirectional search state for all occurrences of the given node, or [`None`]
    /// if no such node exists.
    ///
    /// # Panics
    ///
    /// Panics if the index is not bidirectional.
    pub fn bd_find(&self, node: usize) -> Option<BidirectionalState> {
        assert!(self.is_bidirectional(), "Bidirectional search requires a bidirectional index");
        let forward = self.find(node)?;
        let reverse = SearchState {
            node: support::flip_node(forward.node),
            range: forward.range.clone(),
        };
        Some(BidirectionalState {
            forward,
            reverse,
        })
    }

    /// Extends the search by the given node forward and returns the new search state, or
    /// [`None`] if no such extensions exist.
    ///
    /// Assume that the current search state corresponds to a set of substring occurrences ending
    /// with the same node.
    /// This method takes all of those substrings that continue with the given node, extends them
    /// with that node, and returns the new search state.
    ///
    /// # Arguments
    ///
    /// * `state`: A bidirectional search state corresponding to a set of substring occurrences.
    /// * `node`: Node to extend the substrings with.
    ///
    /// # Panics
    ///
    /// Panics if the index is not bidirectional.
    pub fn extend_forward(&self, state: &BidirectionalState, node: usize) -> Option<BidirectionalState> {
        assert!(self.is_bidirectional(), "Bidirectional search requires a bidirectional index");
        // This also catches the endmarker.
        if node < self.first_node() {
            return None;
        }
        let record = self.record(state.forward.node)?;
        let (range, offset) = record.bd_follow(&state.forward.range, node)?;
        let forward = SearchState {
            node,
            range,
        };
        let pos = state.reverse.range.start + offset;
        let reverse = SearchState {
            node: state.reverse.node,
            range: pos..pos + forward.len(),
        };
        Some(BidirectionalState {
            forward,
            reverse,
        })
    }

    /// Extends the search by the given node backward and returns the new search state, or
    /// [`None`] if no such extensions exist.
    ///
    /// Assume that the current search state corresponds to a set of substring occurrences
    /// starting with the same node.
    /// This method takes all of those substrings that are preceded by the given node, extends
    /// them with that node, and returns the new search state.
    ///
    /// # Arguments
    ///
    /// * `state`: A bidirectional search state corresponding to a set of substring occurrences.
    /// * `node`: Node to extend the substrings with.
    ///
    /// # Panics
    ///
    /// Panics if the index is not bidirectional.
    pub fn extend_backward(&self, state: &BidirectionalState, node: usize) -> Option<BidirectionalState> {
        let result = self.extend_forward(&state.flip(), support::flip_node(node))?;
        Some(result.flip())
    }

    /// Returns the sequence identifier sampled at the given position, or [`None`] if the
    /// position is not sampled.
    ///
    /// See [`crate::algorithms::locate`] for resolving unsampled positions.
    pub fn try_locate(&self, pos: Pos) -> Option<usize> {
        if !self.has_node(pos.node) {
            return None;
        }
        self.samples.try_locate(self.node_to_record(pos.node), pos.offset)
    }
}

//-----------------------------------------------------------------------------

impl From<&DynamicGBWT> for GBWT {
    fn from(source: &DynamicGBWT) -> Self {
        let mut header = Header::<GBWTPayload>::new();
        header.payload_mut().sequences = source.sequences();
        header.payload_mut().size = source.len();
        header.payload_mut().offset = source.alphabet_offset();
        header.payload_mut().alphabet_size = source.alphabet_size();
        if source.is_bidirectional() {
            header.set(GBWTPayload::FLAG_BIDIRECTIONAL);
        }

        let mut tags = Tags::new();
        tags.insert(SOURCE_KEY, SOURCE_VALUE);

        // Write the records and remember their start offsets.
        let mut offsets: Vec<usize> = Vec::with_capacity(source.records().len());
        let mut encoder = RLE::new();
        for record in source.records() {
            offsets.push(encoder.len());
            record.write_bwt(&mut encoder);
        }
        let bwt = BWT::from_parts(&offsets, Vec::<u8>::from(encoder));

        let samples = DASamples::from(source.records());

        // Decompress the endmarker, as the record can be poorly compressible.
        let endmarker = match bwt.record(ENDMARKER) {
            Some(record) => DecompressedRecord::from(&record),
            None => DecompressedRecord::default(),
        };

        GBWT {
            header,
            tags,
            bwt,
            samples,
            endmarker,
        }
    }
}

impl Serialize for GBWT {
    fn serialize_header<T: io::Write>(&self, writer: &mut T) -> io::Result<()> {
        self.header.serialize(writer)
    }

    fn serialize_body<T: io::Write>(&self, writer: &mut T) -> io::Result<()> {
        self.tags.serialize(writer)?;
        self.bwt.serialize(writer)?;
        self.samples.serialize(writer)?;
        Ok(())
    }

    fn load<T: io::Read>(reader: &mut T) -> io::Result<Self> {
        let header = Header::<GBWTPayload>::load(reader)?;
        if let Err(msg) = header.validate() {
            return Err(Error::new(ErrorKind::InvalidData, msg));
        }

        let mut tags = Tags::load(reader)?;
        tags.insert(SOURCE_KEY, SOURCE_VALUE);

        let bwt = BWT::load(reader)?;
        let samples = DASamples::load(reader)?;
        if !samples.is_empty() && samples.records() != bwt.len() {
            return Err(Error::new(ErrorKind::InvalidData, "GBWT: Sample / record count mismatch"));
        }

        // Decompress the endmarker, as the record can be poorly compressible.
        let endmarker = match bwt.record(ENDMARKER) {
            Some(record) => DecompressedRecord::from(&record),
            None => DecompressedRecord::default(),
        };

        Ok(GBWT {
            header,
            tags,
            bwt,
            samples,
            endmarker,
        })
    }

    fn size_in_elements(&self) -> usize {
        self.header.size_in_elements()
            + self.tags.size_in_elements()
            + self.bwt.size_in_elements()
            + self.samples.size_in_elements()
    }
}

//-----------------------------------------------------------------------------

/// A state of unidirectional search.
///
/// The state consists of the last matched node identifier and an offset range in the record of
/// that node.
/// This information is equivalent to a BWT range in a normal FM-index.
///
/// Note that because `SearchState` contains a [`Range`], which does not implement [`Copy`],
/// states must often be passed by reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchState {
    /// Node identifier for the last matched node.
    pub node: usize,
    /// Offset range in the record of the node.
    pub range: Range<usize>,
}

impl SearchState {
    /// Returns the number of matching substring occurrences (the length of the offset range).
    #[inline]
    pub fn len(&self) -> usize {
        self.range.len()
    }

    /// Returns `true` if there are no matching substring occurrences.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

/// A state of bidirectional search in a bidirectional index.
///
/// The state consists of forward and reverse search states.
/// It usually corresponds to all occurrences of a substring `pattern`.
/// The forward state is then the search state for `pattern`, while the reverse state is for the
/// reverse pattern obtained with [`support::reverse_path`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BidirectionalState {
    /// Search state for the forward pattern.
    pub forward: SearchState,
    /// Search state for the reverse pattern.
    pub reverse: SearchState,
}

impl BidirectionalState {
    /// Returns the number of matching substring occurrences (the length of the offset range).
    #[inline]
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    /// Returns `true` if there are no matching substring occurrences.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Returns a new search state with the forward and reverse states flipped.
    pub fn flip(&self) -> BidirectionalState {
        BidirectionalState {
            forward: self.reverse.clone(),
            reverse: self.forward.clone(),
        }
    }
}

//-----------------------------------------------------------------------------

/// An iterator over a sequence in [`GBWT`].
///
/// The type of `Item` is [`usize`].
///
/// # Examples
///
/// ```
/// use pathbwt::{GBWT, DynamicGBWT};
///
/// let paths = vec![vec![2, 4, 6]];
/// let dynamic = DynamicGBWT::from_paths(&paths, false, DynamicGBWT::SAMPLE_INTERVAL);
/// let index = GBWT::from(&dynamic);
///
/// let path: Vec<usize> = index.sequence(0).collect();
/// assert_eq!(path, paths[0]);
/// ```
#[derive(Clone, Debug)]
pub struct SequenceIter<'a> {
    parent: &'a GBWT,
    // The next position.
    next: Option<Pos>,
}

impl<'a> Iterator for SequenceIter<'a> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        let pos = self.next?;
        self.next = self.parent.forward(pos);
        Some(pos.node)
    }
}

impl<'a> FusedIterator for SequenceIter<'a> {}

//-----------------------------------------------------------------------------
