//! Low-level FDMD binary format: tag tables and byte streams.

mod reader;
mod tags;
mod writer;

pub use reader::*;
pub use tags::*;
pub use writer::*;
