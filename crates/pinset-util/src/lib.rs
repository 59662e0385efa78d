//! Shared utilities for pinset.
//!
//! This crate provides cross-cutting concerns used by the other pinset
//! crates: the unified error type and terminal status/progress output.

pub mod errors;
pub mod progress;
