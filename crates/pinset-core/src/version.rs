//! Package versions.
//!
//! Versions follow the PEP 440 scheme and are parsed and ordered by
//! `pep440_rs`: epochs dominate, trailing release zeros are insignificant,
//! `.devN` < `aN` < `bN` < `rcN` < final < `.postN`, and a `+local` label
//! is only a final tie-break.

pub use pep440_rs::{Version, VersionParseError};
