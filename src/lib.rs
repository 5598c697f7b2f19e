//! # pathbwt: a graph BWT for path collections
//!
//! This crate implements a run-length encoded FM-index for large collections of paths in a
//! bidirected sequence graph, based on the [Simple-SDS](https://github.com/jltsiren/simple-sds)
//! succinct data structure library.
//! Each path is a sequence of oriented nodes, and the index supports:
//!
//! * finding all paths containing a given node sequence ([`algorithms::find`]);
//! * anchoring matches at sequence starts ([`algorithms::prefix`]);
//! * mapping a match to the identifier of its sequence ([`algorithms::locate`]);
//! * extracting a stored path by its identifier ([`algorithms::extract`]).
//!
//! The data structure is the GBWT:
//!
//! > Jouni Sirén, Erik Garrison, Adam M. Novak, Benedict Paten, and Richard Durbin:
//! > **Haplotype-aware graph indexes**.\
//! > Bioinformatics 36(2):400-407, 2020.
//! > DOI: [10.1093/bioinformatics/btz575](https://doi.org/10.1093/bioinformatics/btz575)
//!
//! The index exists in two forms with the same query interface
//! ([`algorithms::PathIndex`]): the mutable [`DynamicGBWT`] used during construction and
//! merging, and the compressed [`GBWT`] used for queries.
//! See the module documentation of [`bwt`], [`dynamic`], and [`samples`] for the underlying
//! structures.

pub mod algorithms;
pub mod bwt;
pub mod dynamic;
pub mod gbwt;
pub mod headers;
pub mod samples;
pub mod support;

// Shared internal code for the binaries.
#[cfg(feature = "binaries")]
#[doc(hidden)]
pub mod internal;

//-----------------------------------------------------------------------------

pub use crate::algorithms::PathIndex;
pub use crate::bwt::{BWT, Pos};
pub use crate::dynamic::{DynamicGBWT, DynamicRecord};
pub use crate::gbwt::{GBWT, SearchState, BidirectionalState};
pub use crate::samples::DASamples;

//-----------------------------------------------------------------------------

/// Node identifier `0` is used for terminating sequences and does not exist in the graph.
pub const ENDMARKER: usize = 0;

/// Key of the source tag.
pub const SOURCE_KEY: &str = "source";

/// Value of the source tag.
pub const SOURCE_VALUE: &str = "pathbwt";

//-----------------------------------------------------------------------------
