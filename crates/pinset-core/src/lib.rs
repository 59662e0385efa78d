//! Core data types for pinset.
//!
//! This crate defines the requirement model the resolver works on:
//! normalized package names, versions, version specifiers, requirements,
//! pins, and resolver configuration.
//!
//! This crate is intentionally free of resolution logic and I/O beyond
//! reading its configuration file.

pub mod config;
pub mod name;
pub mod pin;
pub mod requirement;
pub mod specifier;
pub mod version;
