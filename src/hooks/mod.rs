//! Hook system for CSS post-processing.
//!
//! This module provides:
//! - `runner`: Hook execution utilities (environment variables, piped commands)
//! - `css`: `processCss` implementations (closures, external commands)

pub mod css;
mod runner;

pub use runner::*;
