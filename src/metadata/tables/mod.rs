//! Metadata tables of the `#~` stream (ECMA-335 II.22).
//!
//! Five tables are decoded into rows: Module, TypeRef, TypeDef, MethodDef and Param. Every
//! other table is accounted for by its row size only, which is all that is needed to find
//! where the next table starts.

mod methoddef;
mod module;
mod param;
mod typedef;
mod typeref;
mod types;

pub use methoddef::*;
pub use module::*;
pub use param::*;
pub use typedef::*;
pub use typeref::*;
pub use types::*;
