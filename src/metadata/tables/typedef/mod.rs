//! The TypeDef table (0x02): types defined in this module.
//!
//! `field_list` and `method_list` start runs in the Field and MethodDef tables; a run ends where
//! the next row's run begins.

mod raw;

pub use raw::*;
