//! The Module table (0x00): the identity of the current module.
//!
//! A valid image carries exactly one row, holding the module name and its MVID.

mod raw;

pub use raw::*;
