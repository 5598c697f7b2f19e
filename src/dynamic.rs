//! Mutable node records and the mutable index container.
//!
//! [`DynamicRecord`] is the editable form of a node record: plain vectors for the incoming and
//! outgoing edges, the run-length encoded body, and the document-array samples.
//! It supports the same LF-mapping queries as the compressed [`crate::bwt::Record`], as well as
//! the edits needed during construction and merging.
//! [`DynamicGBWT`] stores one dynamic record per character of the effective alphabet and answers
//! the same queries as the compressed [`crate::GBWT`].
//!
//! # Examples
//!
//! ```
//! use pathbwt::{DynamicGBWT, GBWT, algorithms};
//! use pathbwt::support;
//!
//! // Two paths over nodes 1 and 2 in forward orientation.
//! let paths = vec![
//!     vec![support::encode_node(1, false), support::encode_node(2, false)],
//!     vec![support::encode_node(1, false), support::encode_node(2, false)],
//! ];
//! let dynamic = DynamicGBWT::from_paths(&paths, false, DynamicGBWT::SAMPLE_INTERVAL);
//! assert_eq!(dynamic.sequences(), 2);
//!
//! let state = algorithms::find(&dynamic, [2, 4].iter().copied()).unwrap();
//! assert_eq!(state.len(), 2);
//!
//! // The compressed index answers the same queries.
//! let index = GBWT::from(&dynamic);
//! assert_eq!(algorithms::extract(&index, 0), paths[0]);
//! ```

use crate::bwt::{DecompressedRecord, Pos};
use crate::gbwt::{SearchState, BidirectionalState};
use crate::support::RLE;
use crate::ENDMARKER;
use crate::support;

use std::cmp::Ordering;
use std::ops::Range;
use std::cmp;


//-----------------------------------------------------------------------------

/// A mutable node record.
///
/// The record stores:
///
/// * `incoming`: pairs (predecessor node, number of occurrences from that predecessor), sorted
///   by predecessor;
/// * `outgoing`: pairs (successor node, BWT offset in the successor), sorted by successor after
///   [`DynamicRecord::recode`];
/// * the body as runs (outrank, length), where the outrank is the position of the edge in the
///   outgoing list;
/// * document-array samples as pairs (body offset, sequence identifier), sorted by offset.
///
/// The sum of the incoming counts and the sum of the run lengths both equal the body length.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DynamicRecord {
    body_size: usize,
    incoming: Vec<(usize, usize)>,
    outgoing: Vec<(usize, usize)>,
    body: Vec<(usize, usize)>,
    ids: Vec<(usize, usize)>,
}

/// Statistics and construction.
impl DynamicRecord {
    /// Creates an empty record.
    pub fn new() -> Self {
        DynamicRecord::default()
    }

    /// Creates a record from its parts.
    ///
    /// The body length is the sum of the run lengths.
    ///
    /// # Arguments
    ///
    /// * `incoming`: Incoming edges sorted by predecessor.
    /// * `outgoing`: Outgoing edges.
    /// * `body`: Runs of outranks over the outgoing edges.
    /// * `ids`: Samples sorted by body offset.
    pub fn from_parts(
        incoming: Vec<(usize, usize)>,
        outgoing: Vec<(usize, usize)>,
        body: Vec<(usize, usize)>,
        ids: Vec<(usize, usize)>,
    ) -> Self {
        let body_size = body.iter().map(|(_, len)| len).sum();
        DynamicRecord {
            body_size,
            incoming,
            outgoing,
            body,
            ids,
        }
    }

    /// Returns the length of the record body.
    #[inline]
    pub fn len(&self) -> usize {
        self.body_size
    }

    /// Returns `true` if the record is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the indegree of the node.
    #[inline]
    pub fn indegree(&self) -> usize {
        self.incoming.len()
    }

    /// Returns the outdegree of the node.
    #[inline]
    pub fn outdegree(&self) -> usize {
        self.outgoing.len()
    }

    /// Returns the number of runs in the body.
    #[inline]
    pub fn runs(&self) -> usize {
        self.body.len()
    }

    /// Returns the number of document-array samples in the record.
    #[inline]
    pub fn samples(&self) -> usize {
        self.ids.len()
    }

    /// Clears the record.
    pub fn clear(&mut self) {
        *self = DynamicRecord::new();
    }

    /// Appends a run to the body, merging it with the last run if the outranks match.
    ///
    /// Does nothing if `len == 0`.
    pub fn push_run(&mut self, outrank: usize, len: usize) {
        if len == 0 {
            return;
        }
        self.body_size += len;
        if let Some(last) = self.body.last_mut() {
            if last.0 == outrank {
                last.1 += len;
                return;
            }
        }
        self.body.push((outrank, len));
    }

    /// Adds a document-array sample at the given body offset.
    ///
    /// # Panics
    ///
    /// Panics if the offset is not past all existing samples.
    pub fn add_sample(&mut self, offset: usize, sequence: usize) {
        if let Some(last) = self.ids.last() {
            assert!(last.0 < offset, "DynamicRecord: Samples must be added in sorted order");
        }
        self.ids.push((offset, sequence));
    }
}

/// Outgoing edges.
impl DynamicRecord {
    /// Returns the successor node of outrank `i`.
    ///
    /// # Panics
    ///
    /// May panic if `i >= self.outdegree()`.
    #[inline]
    pub fn successor(&self, i: usize) -> usize {
        self.outgoing[i].0
    }

    /// Returns the BWT offset in the successor of outrank `i`.
    ///
    /// # Panics
    ///
    /// May panic if `i >= self.outdegree()`.
    #[inline]
    pub fn offset(&self, i: usize) -> usize {
        self.outgoing[i].1
    }

    /// Returns `true` if the record has an edge to the given node.
    pub fn has_edge(&self, node: usize) -> bool {
        self.edge_to(node).is_some()
    }

    /// Returns the outrank of the edge to the given node, or [`None`] if there is no such edge.
    ///
    /// Assumes that the outgoing edges are sorted; see [`DynamicRecord::edge_to_linear`] for the
    /// unsorted case.
    pub fn edge_to(&self, node: usize) -> Option<usize> {
        let mut low = 0;
        let mut high = self.outdegree();
        while low < high {
            let mid = low + (high - low) / 2;
            match node.cmp(&self.outgoing[mid].0) {
                Ordering::Less => high = mid,
                Ordering::Equal => return Some(mid),
                Ordering::Greater => low = mid + 1,
            }
        }
        None
    }

    /// Returns the outrank of the edge to the given node, or [`None`] if there is no such edge.
    ///
    /// This version works when the outgoing edges have not been sorted with
    /// [`DynamicRecord::recode`].
    pub fn edge_to_linear(&self, node: usize) -> Option<usize> {
        self.outgoing.iter().position(|(successor, _)| *successor == node)
    }

    /// Sorts the outgoing edges by successor node and rewrites the body outranks to match.
    pub fn recode(&mut self) {
        if self.outgoing.windows(2).all(|pair| pair[0].0 < pair[1].0) {
            return;
        }
        // Replace the outranks with successor nodes, sort, and map the nodes back.
        for run in self.body.iter_mut() {
            run.0 = self.outgoing[run.0].0;
        }
        self.outgoing.sort_unstable();
        for i in 0..self.body.len() {
            let rank = self.edge_to(self.body[i].0).unwrap();
            self.body[i].0 = rank;
        }
    }

    /// Removes outgoing edges with no occurrences in the body and recodes the record.
    pub fn remove_unused_edges(&mut self) {
        let mut counts: Vec<usize> = vec![0; self.outdegree()];
        for (rank, len) in self.body.iter() {
            counts[*rank] += len;
        }
        if counts.iter().all(|&count| count > 0) {
            return;
        }

        // Map the old outranks to the new ones and drop the unused edges.
        let mut new_rank: Vec<usize> = vec![0; self.outdegree()];
        let mut used = 0;
        for rank in 0..self.outdegree() {
            new_rank[rank] = used;
            if counts[rank] > 0 {
                self.outgoing[used] = self.outgoing[rank];
                used += 1;
            }
        }
        self.outgoing.truncate(used);
        for run in self.body.iter_mut() {
            run.0 = new_rank[run.0];
        }
        self.recode();
    }
}

/// Incoming edges.
impl DynamicRecord {
    /// Returns the predecessor node of inrank `i`.
    ///
    /// # Panics
    ///
    /// May panic if `i >= self.indegree()`.
    #[inline]
    pub fn predecessor(&self, i: usize) -> usize {
        self.incoming[i].0
    }

    /// Returns the number of occurrences coming from the predecessor of inrank `i`.
    ///
    /// # Panics
    ///
    /// May panic if `i >= self.indegree()`.
    #[inline]
    pub fn count(&self, i: usize) -> usize {
        self.incoming[i].1
    }

    /// Returns the total number of occurrences coming from predecessors smaller than `from`.
    pub fn count_before(&self, from: usize) -> usize {
        self.incoming.iter().take_while(|(node, _)| *node < from).map(|(_, count)| count).sum()
    }

    /// Returns the total number of occurrences coming from predecessors up to and including `from`.
    pub fn count_until(&self, from: usize) -> usize {
        self.incoming.iter().take_while(|(node, _)| *node <= from).map(|(_, count)| count).sum()
    }

    /// Increments the count of the incoming edge from the given node.
    ///
    /// Inserts a new edge with count 1 if there is no edge from the node.
    pub fn increment(&mut self, from: usize) {
        match self.incoming.binary_search_by(|(node, _)| node.cmp(&from)) {
            Ok(inrank) => self.incoming[inrank].1 += 1,
            Err(inrank) => self.incoming.insert(inrank, (from, 1)),
        }
    }

    /// Adds a new incoming edge, keeping the edges sorted by predecessor.
    ///
    /// # Panics
    ///
    /// Panics if there already is an edge from the same predecessor.
    pub fn add_incoming(&mut self, edge: (usize, usize)) {
        match self.incoming.binary_search_by(|(node, _)| node.cmp(&edge.0)) {
            Ok(_) => panic!("DynamicRecord: Duplicate incoming edge from node {}", edge.0),
            Err(inrank) => self.incoming.insert(inrank, edge),
        }
    }
}

/// LF-mapping and related queries.
impl DynamicRecord {
    /// Follows the sequence at offset `i` and returns the position in the successor.
    ///
    /// Returns [`None`] if the sequence ends or offset `i` does not exist.
    pub fn lf(&self, i: usize) -> Option<Pos> {
        self.run_lf(i).map(|(pos, _)| pos)
    }

    /// As [`DynamicRecord::lf`], but also returns the last offset of the run containing `i`.
    pub fn run_lf(&self, i: usize) -> Option<(Pos, usize)> {
        if i >= self.len() {
            return None;
        }
        let mut edges = self.outgoing.clone();
        let mut offset = 0;
        for (rank, len) in self.body.iter().copied() {
            if offset + len > i {
                if self.successor(rank) == ENDMARKER {
                    return None;
                }
                edges[rank].1 += i - offset;
                return Some((Pos::from(edges[rank]), offset + len - 1));
            }
            edges[rank].1 += len;
            offset += len;
        }
        None
    }

    /// Returns the successor node at offset `i` in the record body, or [`None`] if there is no
    /// such offset.
    ///
    /// The successor may be the endmarker.
    pub fn node_at(&self, i: usize) -> Option<usize> {
        let mut offset = 0;
        for (rank, len) in self.body.iter() {
            offset += len;
            if offset > i {
                return Some(self.successor(*rank));
            }
        }
        None
    }

    /// Returns the offset in the given node that the sequence at offset `i` would have after
    /// taking the edge to that node.
    ///
    /// Unlike [`DynamicRecord::lf`], the symbol at offset `i` does not have to be `node`, and
    /// `i` may be one past the end of the body.
    /// Returns [`None`] if there is no edge to `node` or `node` is the endmarker.
    pub fn lf_to(&self, i: usize, node: usize) -> Option<usize> {
        if node == ENDMARKER {
            return None;
        }
        let rank = self.edge_to(node)?;
        let mut result = self.offset(rank);
        let mut offset = 0;
        for (c, len) in self.body.iter().copied() {
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

    /// Follows all sequences in the offset range to the given node.
    ///
    /// Returns a semiopen offset range in the destination node, or [`None`] if no such sequences
    /// exist.
    /// See also [`DynamicRecord::bd_follow`].
    pub fn follow(&self, range: &Range<usize>, node: usize) -> Option<Range<usize>> {
        if range.is_empty() || node == ENDMARKER {
            return None;
        }
        let rank = self.edge_to(node)?;

        let mut result = self.offset(rank)..self.offset(rank);
        let mut offset = 0;
        for (c, len) in self.body.iter().copied() {
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
    /// that [`support::flip_node`]`(v) < `[`support::flip_node`]`(node)`, which is the amount the
    /// reverse range moves in bidirectional search.
    /// See also [`DynamicRecord::follow`].
    pub fn bd_follow(&self, range: &Range<usize>, node: usize) -> Option<(Range<usize>, usize)> {
        if range.is_empty() || node == ENDMARKER {
            return None;
        }
        let rank = self.edge_to(node)?;
        let reverse = support::flip_node(node);

        let mut result = self.offset(rank)..self.offset(rank);
        let mut count = 0;
        let mut offset = 0;
        for (c, len) in self.body.iter().copied() {
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

/// Samples and serialization.
impl DynamicRecord {
    /// Returns the sample of rank `i` as a pair (body offset, sequence identifier).
    ///
    /// # Panics
    ///
    /// May panic if `i >= self.samples()`.
    #[inline]
    pub fn sample(&self, i: usize) -> (usize, usize) {
        self.ids[i]
    }

    /// Returns the first sample at body offset `i` or later, or [`None`] if there is no such
    /// sample.
    pub fn next_sample(&self, i: usize) -> Option<(usize, usize)> {
        let rank = self.ids.partition_point(|(offset, _)| *offset < i);
        self.ids.get(rank).copied()
    }

    /// Returns the sequence identifier sampled at body offset `i`, or [`None`] if the offset is
    /// not sampled.
    pub fn sampled_at(&self, i: usize) -> Option<usize> {
        match self.ids.binary_search_by(|(offset, _)| offset.cmp(&i)) {
            Ok(rank) => Some(self.ids[rank].1),
            Err(_) => None,
        }
    }

    /// Writes the compressed representation of the record.
    ///
    /// The encoding is a [`crate::support::ByteCode`] outdegree, the outgoing edges as pairs
    /// (successor delta, offset), and the body runs with alphabet size `self.outdegree()`.
    /// An empty record is encoded as a single 0-byte.
    /// The outgoing edges must be sorted; see [`DynamicRecord::recode`].
    pub fn write_bwt(&self, encoder: &mut RLE) {
        encoder.write_int(self.outdegree());
        let mut prev = 0;
        for (node, offset) in self.outgoing.iter() {
            encoder.write_int(*node - prev);
            encoder.write_int(*offset);
            prev = *node;
        }
        encoder.set_sigma(self.outdegree());
        for (rank, len) in self.body.iter() {
            encoder.write(*rank, *len);
        }
    }
}

impl From<&DynamicRecord> for DecompressedRecord {
    fn from(source: &DynamicRecord) -> Self {
        let mut after = source.outgoing.clone();
        let mut body: Vec<(usize, usize)> = Vec::with_capacity(source.len());
        for (rank, len) in source.body.iter().copied() {
            for _ in 0..len {
                body.push(after[rank]);
                after[rank].1 += 1;
            }
        }
        DecompressedRecord::from_parts(source.outgoing.clone(), after, body)
    }
}

//-----------------------------------------------------------------------------

/// The mutable index: a vector of dynamic records.
///
/// `DynamicGBWT` answers the same queries as the compressed [`crate::GBWT`] and implements
/// [`crate::algorithms::PathIndex`].
/// It is intended for construction and merging; compress the final index with
/// [`crate::GBWT::from`].
///
/// The container is not safe for concurrent mutation.
/// A construction stage must ensure at most one writer per record.
///
/// See the module-level documentation for an example.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DynamicGBWT {
    sequences: usize,
    total_size: usize,
    offset: usize,
    alphabet_size: usize,
    bidirectional: bool,
    records: Vec<DynamicRecord>,
}

/// Index statistics.
impl DynamicGBWT {
    /// Default document-array sample interval for [`DynamicGBWT::from_paths`].
    pub const SAMPLE_INTERVAL: usize = 1024;

    /// Returns the total length of the sequences in the index, including the endmarkers.
    #[inline]
    pub fn len(&self) -> usize {
        self.total_size
    }

    /// Returns `true` if the index is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of sequences in the index.
    #[inline]
    pub fn sequences(&self) -> usize {
        self.sequences
    }

    /// Returns the size of the alphabet.
    #[inline]
    pub fn alphabet_size(&self) -> usize {
        self.alphabet_size
    }

    /// Returns the alphabet offset: node identifiers in `1..offset + 1` are not used.
    #[inline]
    pub fn alphabet_offset(&self) -> usize {
        self.offset
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
        self.bidirectional
    }

    /// Returns the record of the given node, or [`None`] if the node is not in the effective
    /// alphabet.
    ///
    /// The endmarker record is `self.record(ENDMARKER)`.
    pub fn record(&self, node: usize) -> Option<&DynamicRecord> {
        if node != ENDMARKER && !self.has_node(node) {
            return None;
        }
        self.records.get(self.node_to_record(node))
    }

    // The records in effective alphabet order.
    pub(crate) fn records(&self) -> &[DynamicRecord] {
        &self.records
    }

    // Converts node id to record id.
    #[inline]
    fn node_to_record(&self, node: usize) -> usize {
        if node == ENDMARKER { 0 } else { node - self.alphabet_offset() }
    }
}

/// Sequence navigation and search.
impl DynamicGBWT {
    /// Returns the first position in sequence `id`, or [`None`] if no such sequence exists.
    pub fn start(&self, id: usize) -> Option<Pos> {
        if id >= self.sequences() {
            return None;
        }
        self.records[0].lf(id)
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

    /// Returns a search state for all occurrences of the given node, or [`None`] if no such node
    /// exists.
    pub fn find(&self, node: usize) -> Option<SearchState> {
        // This also catches the endmarker.
        if node < self.first_node() {
            return None;
        }
        let record = self.record(node)?;
        if record.is_empty() {
            return None;
        }
        Some(SearchState {
            node,
            range: 0..record.len(),
        })
    }

    /// Extends the search by the given node forward and returns the new search state, or
    /// [`None`] if no such extensions exist.
    ///
    /// See [`crate::GBWT::extend`].
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
    /// See [`crate::GBWT::extend_forward`].
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
    /// # Panics
    ///
    /// Panics if the index is not bidirectional.
    pub fn extend_backward(&self, state: &BidirectionalState, node: usize) -> Option<BidirectionalState> {
        let result = self.extend_forward(&state.flip(), support::flip_node(node))?;
        Some(result.flip())
    }

    /// Returns the sequence identifier sampled at the given position, or [`None`] if the
    /// position is not sampled.
    pub fn try_locate(&self, pos: Pos) -> Option<usize> {
        self.record(pos.node)?.sampled_at(pos.offset)
    }
}

/// Construction.
impl DynamicGBWT {
    /// Builds an index over the given paths.
    ///
    /// Each path is a sequence of oriented node identifiers without the endmarker.
    /// In a bidirectional index, path `i` becomes sequences `2 * i` (forward) and `2 * i + 1`
    /// (reverse), and the node identifiers must come from [`support::encode_node`].
    /// Empty paths are stored as empty sequences.
    ///
    /// Sequence position `i` of a length-`L` path is sampled for `locate` queries when
    /// `(i + 1) % sample_interval == 0` or `i == L - 1`.
    /// The last position of every sequence is always sampled, which bounds the work done by
    /// [`crate::algorithms::locate`].
    ///
    /// This builds the records directly with quadratic sorting of reverse prefixes.
    /// It is intended for tests and small indexes; no incremental construction algorithms have
    /// been implemented.
    ///
    /// # Panics
    ///
    /// Panics if a path contains the endmarker or `sample_interval == 0`.
    pub fn from_paths<P: AsRef<[usize]>>(paths: &[P], bidirectional: bool, sample_interval: usize) -> Self {
        assert!(sample_interval > 0, "DynamicGBWT: Sample interval must be non-zero");
        let mut seqs: Vec<Vec<usize>> = Vec::new();
        for path in paths.iter() {
            let path = path.as_ref();
            assert!(!path.contains(&ENDMARKER), "DynamicGBWT: Paths must not contain the endmarker");
            seqs.push(path.to_vec());
            if bidirectional {
                seqs.push(support::reverse_path(path));
            }
        }

        // Determine the alphabet.
        let min_node = seqs.iter().flatten().min().copied();
        let offset = min_node.map_or(0, |node| node - 1);
        let alphabet_size = seqs.iter().flatten().max().map_or(1, |node| node + 1);
        let total_size = seqs.iter().map(|seq| seq.len() + 1).sum();

        // Collect the occurrences of each record. Sequence position `len` is the endmarker cell
        // that precedes the first node in BWT order.
        let effective = alphabet_size - offset;
        let mut occurrences: Vec<Vec<(usize, usize)>> = vec![Vec::new(); effective];
        for (id, seq) in seqs.iter().enumerate() {
            occurrences[0].push((id, seq.len()));
            for (i, node) in seq.iter().enumerate() {
                occurrences[node - offset].push((id, i));
            }
        }

        // Sort the occurrences of each node by their reverse prefixes. The endmarker cells are
        // already in sequence order, which is where prefix queries expect them.
        for record in occurrences.iter_mut().skip(1) {
            record.sort_by(|a, b| Self::reverse_prefix_cmp(&seqs, *a, *b));
        }

        // Remember the BWT offset of every cell for the sample and edge computations.
        let mut cell_offsets: Vec<Vec<usize>> = seqs.iter().map(|seq| vec![0; seq.len() + 1]).collect();
        for cells in occurrences.iter() {
            for (row, (id, i)) in cells.iter().enumerate() {
                cell_offsets[*id][*i] = row;
            }
        }

        // Build the bodies and the outgoing edge lists.
        let mut records: Vec<DynamicRecord> = vec![DynamicRecord::new(); effective];
        for (r, cells) in occurrences.iter().enumerate() {
            let mut outgoing: Vec<(usize, usize)> = Vec::new();
            let mut successors: Vec<usize> = Vec::with_capacity(cells.len());
            for (id, i) in cells.iter() {
                let seq = &seqs[*id];
                let successor = if *i + 1 < seq.len() {
                    seq[*i + 1]
                } else if *i < seq.len() {
                    ENDMARKER
                } else if seq.is_empty() {
                    ENDMARKER
                } else {
                    // The endmarker cell precedes the first node in BWT order.
                    seq[0]
                };
                successors.push(successor);
                if outgoing.iter().all(|(node, _)| *node != successor) {
                    outgoing.push((successor, 0));
                }
            }
            outgoing.sort_unstable();
            let record = &mut records[r];
            record.outgoing = outgoing;
            for successor in successors.iter() {
                let rank = record.edge_to(*successor).unwrap();
                record.push_run(rank, 1);
            }
        }

        // Incoming edges: the cell at sequence position `i > 0` comes from the node at `i - 1`,
        // the cell at position 0 comes from the endmarker, and the endmarker cell comes from the
        // last node of the sequence.
        for seq in seqs.iter() {
            for i in 0..seq.len() + 1 {
                let record = if i < seq.len() { seq[i] - offset } else { 0 };
                let predecessor = if i == 0 {
                    ENDMARKER
                } else if i == seq.len() {
                    seq[seq.len() - 1]
                } else {
                    seq[i - 1]
                };
                records[record].increment(predecessor);
            }
        }

        // Outgoing offsets: the number of rows in the successor coming from smaller
        // predecessors.
        for r in 0..records.len() {
            let node = if r == 0 { ENDMARKER } else { r + offset };
            for rank in 0..records[r].outdegree() {
                let successor = records[r].successor(rank);
                let successor_record = if successor == ENDMARKER { 0 } else { successor - offset };
                let before = records[successor_record].count_before(node);
                records[r].outgoing[rank].1 = before;
            }
        }

        // Document-array samples.
        let mut samples: Vec<Vec<(usize, usize)>> = vec![Vec::new(); effective];
        for (id, seq) in seqs.iter().enumerate() {
            for i in 0..seq.len() {
                if (i + 1) % sample_interval == 0 || i == seq.len() - 1 {
                    let record = seq[i] - offset;
                    samples[record].push((cell_offsets[id][i], id));
                }
            }
        }
        for (r, mut ids) in samples.into_iter().enumerate() {
            ids.sort_unstable();
            records[r].ids = ids;
        }

        DynamicGBWT {
            sequences: seqs.len(),
            total_size,
            offset,
            alphabet_size,
            bidirectional,
            records,
        }
    }

    // Compares two cells of the same record by the reverse prefixes preceding them.
    // The virtual endmarker at the start of sequence `id` compares as a unique smallest symbol
    // ordered by `id`.
    fn reverse_prefix_cmp(seqs: &[Vec<usize>], a: (usize, usize), b: (usize, usize)) -> Ordering {
        let (a_seq, a_pos) = a;
        let (b_seq, b_pos) = b;
        let mut k = 1;
        loop {
            let x = if k <= a_pos { Some(seqs[a_seq][a_pos - k]) } else { None };
            let y = if k <= b_pos { Some(seqs[b_seq][b_pos - k]) } else { None };
            match (x, y) {
                (None, None) => return a_seq.cmp(&b_seq),
                (None, Some(_)) => return Ordering::Less,
                (Some(_), None) => return Ordering::Greater,
                (Some(x), Some(y)) => {
                    if x != y {
                        return x.cmp(&y);
                    }
                }
            }
            k += 1;
        }
    }
}

//-----------------------------------------------------------------------------
