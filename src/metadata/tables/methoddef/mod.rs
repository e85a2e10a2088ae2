//! The MethodDef table (0x06): method definitions and the RVA of their bodies.

mod raw;

pub use raw::*;
