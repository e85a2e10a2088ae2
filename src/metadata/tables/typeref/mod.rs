//! The TypeRef table (0x01): types defined in other modules or assemblies.

mod raw;

pub use raw::*;
