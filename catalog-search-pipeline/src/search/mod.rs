//! Search module for the catalog search pipeline.
//!
//! Runs queries against the store and shapes the hits for callers. The
//! query DSL itself is built by the repository crate.

mod assembler;
mod partition;

pub use assembler::SearchService;
pub use partition::{partition, single, SearchResults};
