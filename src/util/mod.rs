//! Utility types and functions for FDMD.
//!
//! - [`Error`] / [`Result`] - Error handling
//! - Math type re-exports from glam and transform composition helpers

mod error;
mod math;

pub use error::*;
pub use math::*;
