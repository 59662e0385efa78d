//! Requirement resolution engine: specifier merging, round-based fixpoint
//! pinning, and pruning of unsafe, orphaned and constraint-only packages.

pub mod cache;
pub mod conflict;
pub mod error;
pub mod graph;
pub mod index;
pub mod merge;
pub mod provider;
pub mod prune;
pub mod resolver;
pub mod working_set;

pub use error::ResolveError;
pub use prune::Resolution;
pub use resolver::{resolve, Resolver};
