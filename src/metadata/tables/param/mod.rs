//! The Param table (0x08): names and attributes of method parameters.

mod raw;

pub use raw::*;
