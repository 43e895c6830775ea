//! End-to-end search.
//!
//! The [`Finder`] wires geocoding, discovery, ranking, identifier
//! resolution and menu verification into one sequential search that stops
//! at the first verified location.

pub mod finder;

pub use finder::{Finder, SearchStage};
