//! Byte-oriented mesh sinks and sources.

pub mod stl;

pub use stl::{read_stl, write_stl};
