//! Domain types for the search pipeline.

pub mod config;
pub mod geo;
pub mod location;
pub mod outcome;
