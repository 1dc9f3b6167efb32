//! Shared utilities.
//!
//! - [`path`]: path normalization and specifier resolution
//! - [`hash`]: content hashing for fingerprints and freshness

pub mod hash;
pub mod path;
