//! Core trait abstractions.

pub mod device;
pub mod fetcher;
pub mod identity;
pub mod strategy;
