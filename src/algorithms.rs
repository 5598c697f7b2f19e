//! High-level search algorithms over an index of paths.
//!
//! The algorithms are generic over the [`PathIndex`] capability, which both the compressed
//! [`GBWT`] and the mutable [`DynamicGBWT`] provide.
//! Invalid parameters and missing matches yield [`None`] or empty results; nothing panics.
//!
//! # Examples
//!
//! ```
//! use pathbwt::{GBWT, DynamicGBWT, algorithms};
//! use pathbwt::bwt::Pos;
//!
//! let paths = vec![
//!     vec![2, 4, 8],
//!     vec![2, 6, 8],
//! ];
//! let dynamic = DynamicGBWT::from_paths(&paths, false, DynamicGBWT::SAMPLE_INTERVAL);
//! let index = GBWT::from(&dynamic);
//!
//! // Find all occurrences of the pattern [2, 4].
//! let state = algorithms::find(&index, [2, 4].iter().copied()).unwrap();
//! assert_eq!(state.len(), 1);
//!
//! // The match belongs to sequence 0.
//! let pos = Pos::new(state.node, state.range.start);
//! assert_eq!(algorithms::locate(&index, pos), Some(0));
//!
//! // Extract the other path.
//! assert_eq!(algorithms::extract(&index, 1), paths[1]);
//! ```

use crate::bwt::Pos;
use crate::dynamic::DynamicGBWT;
use crate::gbwt::{GBWT, SearchState};
use crate::ENDMARKER;

#[cfg(test)]
mod tests;

//-----------------------------------------------------------------------------

/// The query capability shared by the index containers.
///
/// An implementation provides record lookup by node, the LF-mapping on positions and search
/// states, and sampled `locate` answers.
/// The search algorithms in this module are written against this trait, so they run unchanged
/// over the compressed [`GBWT`] and the mutable [`DynamicGBWT`].
pub trait PathIndex {
    /// Returns `true` if the node is in the effective alphabet.
    fn has_node(&self, node: usize) -> bool;

    /// Returns the number of occurrences of the node (the length of its record body).
    fn node_size(&self, node: usize) -> usize;

    /// Returns the number of sequences in the index.
    fn sequences(&self) -> usize;

    /// Returns the first position in the sequence, or [`None`] if no such sequence exists.
    fn start(&self, sequence: usize) -> Option<Pos>;

    /// Follows the sequence forward by one step, or returns [`None`] if the sequence ends.
    fn forward(&self, pos: Pos) -> Option<Pos>;

    /// Takes all occurrences in the state that continue with the node and returns the new state,
    /// or [`None`] if there are none.
    fn extend(&self, state: &SearchState, node: usize) -> Option<SearchState>;

    /// Returns the sequence identifier sampled at the position, or [`None`] if the position is
    /// not sampled.
    fn try_locate(&self, pos: Pos) -> Option<usize>;
}

impl PathIndex for GBWT {
    fn has_node(&self, node: usize) -> bool {
        self.has_node(node)
    }

    fn node_size(&self, node: usize) -> usize {
        self.node_size(node)
    }

    fn sequences(&self) -> usize {
        self.sequences()
    }

    fn start(&self, sequence: usize) -> Option<Pos> {
        self.start(sequence)
    }

    fn forward(&self, pos: Pos) -> Option<Pos> {
        self.forward(pos)
    }

    fn extend(&self, state: &SearchState, node: usize) -> Option<SearchState> {
        self.extend(state, node)
    }

    fn try_locate(&self, pos: Pos) -> Option<usize> {
        self.try_locate(pos)
    }
}

impl PathIndex for DynamicGBWT {
    fn has_node(&self, node: usize) -> bool {
        self.has_node(node)
    }

    fn node_size(&self, node: usize) -> usize {
        self.record(node).map_or(0, |record| record.len())
    }

    fn sequences(&self) -> usize {
        self.sequences()
    }

    fn start(&self, sequence: usize) -> Option<Pos> {
        self.start(sequence)
    }

    fn forward(&self, pos: Pos) -> Option<Pos> {
        self.forward(pos)
    }

    fn extend(&self, state: &SearchState, node: usize) -> Option<SearchState> {
        self.extend(state, node)
    }

    fn try_locate(&self, pos: Pos) -> Option<usize> {
        self.try_locate(pos)
    }
}

//-----------------------------------------------------------------------------

/// Extends the search state with the given pattern and returns the new state, or [`None`] if
/// there are no matches.
///
/// Extension stops as soon as the state becomes empty or a pattern node is missing from the
/// index.
pub fn extend<I, P>(index: &I, state: &SearchState, pattern: P) -> Option<SearchState>
where
    I: PathIndex,
    P: IntoIterator<Item = usize>,
{
    let mut state = state.clone();
    for node in pattern {
        if state.is_empty() || !index.has_node(node) {
            return None;
        }
        state = index.extend(&state, node)?;
    }
    if state.is_empty() { None } else { Some(state) }
}

/// Returns a search state for all occurrences of the pattern, or [`None`] if there are no
/// matches.
///
/// An empty pattern yields [`None`].
pub fn find<I, P>(index: &I, pattern: P) -> Option<SearchState>
where
    I: PathIndex,
    P: IntoIterator<Item = usize>,
{
    let mut pattern = pattern.into_iter();
    let first = pattern.next()?;
    if !index.has_node(first) || index.node_size(first) == 0 {
        return None;
    }
    let state = SearchState {
        node: first,
        range: 0..index.node_size(first),
    };
    extend(index, &state, pattern)
}

/// Returns a search state for all sequences starting with the pattern, or [`None`] if there are
/// no matches.
///
/// Unlike [`find`], the matches are anchored at the start of a sequence.
/// An empty pattern yields the state of all sequence starts.
pub fn prefix<I, P>(index: &I, pattern: P) -> Option<SearchState>
where
    I: PathIndex,
    P: IntoIterator<Item = usize>,
{
    if index.sequences() == 0 {
        return None;
    }
    let state = SearchState {
        node: ENDMARKER,
        range: 0..index.sequences(),
    };
    extend(index, &state, pattern)
}

/// Returns the identifier of the sequence at the given BWT position, or [`None`] if the position
/// is invalid.
///
/// The query follows the sequence forward until it reaches a document-array sample.
/// Every sequence has a sample at its last position, so the walk always terminates.
pub fn locate<I: PathIndex>(index: &I, pos: Pos) -> Option<usize> {
    if !index.has_node(pos.node) || pos.offset >= index.node_size(pos.node) {
        return None;
    }
    let mut pos = pos;
    loop {
        if let Some(result) = index.try_locate(pos) {
            return Some(result);
        }
        pos = index.forward(pos)?;
    }
}

/// Returns the sequence with the given identifier as a vector of oriented nodes.
///
/// The result is empty if there is no such sequence.
pub fn extract<I: PathIndex>(index: &I, sequence: usize) -> Vec<usize> {
    let mut result = Vec::new();
    if sequence >= index.sequences() {
        return result;
    }
    let mut pos = index.start(sequence);
    while let Some(p) = pos {
        result.push(p.node);
        pos = index.forward(p);
    }
    result
}

//-----------------------------------------------------------------------------
