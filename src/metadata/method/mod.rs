//! Method body location.
//!
//! Every MethodDef row of code type IL with a non-zero RVA points at a method header followed by
//! the CIL code. Native, OPTIL and runtime methods are skipped whatever their RVA.
//! [`locate_bodies`] resolves each RVA, decodes the header and records the code range. A
//! method that cannot be located is recorded as a [`MethodFailure`] and does not prevent the
//! others from being located.
//!
//! # References
//! - ECMA-335 6th Edition, Partition II, Section 25.4 - Common Intermediate Language Physical Layout

mod body;
mod types;

use std::ops::Range;

use crate::{
    file::File,
    metadata::{
        tables::{MetadataTable, MethodDefRaw},
        token::Token,
    },
    Error, Result,
};

pub use body::MethodBody;
pub use types::*;

/// The located code of one method
#[derive(Debug, Clone)]
pub struct MethodCode {
    /// MethodDef row id
    pub rid: u32,
    /// MethodDef token
    pub token: Token,
    /// RVA of the method header
    pub rva: u32,
    /// The decoded header
    pub body: MethodBody,
}

impl MethodCode {
    /// Image range of the code bytes
    #[must_use]
    pub fn code_range(&self) -> Range<usize> {
        self.body.code_range()
    }
}

/// A method whose body could not be located or scanned
#[derive(Debug)]
pub struct MethodFailure {
    /// MethodDef row id
    pub rid: u32,
    /// MethodDef token
    pub token: Token,
    /// What went wrong
    pub error: Error,
}

/// Result of locating the bodies of all MethodDef rows
#[derive(Debug, Default)]
pub struct MethodBodies {
    /// Methods with a decodable body, in row order
    pub bodies: Vec<MethodCode>,
    /// Methods whose body could not be located
    pub failures: Vec<MethodFailure>,
    /// Number of methods with RVA 0 or a code type other than IL
    pub without_body: usize,
}

/// Locate the body of a single method
///
/// Returns `Ok(None)` for a method without a CIL body.
///
/// # Errors
/// Returns [`crate::Error::UnmappedRva`] if no section covers the RVA, and any error of
/// [`MethodBody::read`]
pub fn locate_body(file: &File, method: &MethodDefRaw) -> Result<Option<MethodCode>> {
    if !method.has_body() {
        if method.rva != 0 {
            log::debug!(
                "Method {} (token {:#010x}) at RVA {:#x} has code type {:?}, skipped",
                method.rid,
                method.token.value(),
                method.rva,
                method.code_type()
            );
        }
        return Ok(None);
    }

    let offset = file.rva_to_offset(method.rva)?;
    let body = MethodBody::read(file.data(), offset)?;

    Ok(Some(MethodCode {
        rid: method.rid,
        token: method.token,
        rva: method.rva,
        body,
    }))
}

/// Locate the bodies of every row in `methods`
#[must_use]
pub fn locate_bodies(file: &File, methods: &MetadataTable<MethodDefRaw>) -> MethodBodies {
    let mut result = MethodBodies::default();

    for method in methods {
        match locate_body(file, method) {
            Ok(Some(code)) => result.bodies.push(code),
            Ok(None) => result.without_body += 1,
            Err(error) => {
                log::warn!(
                    "Method {} (token {:#010x}) at RVA {:#x} has no usable body - {}",
                    method.rid,
                    method.token.value(),
                    method.rva,
                    error
                );
                result.failures.push(MethodFailure {
                    rid: method.rid,
                    token: method.token,
                    error,
                });
            }
        }
    }

    log::debug!(
        "Located {} method bodies, {} without body, {} failed",
        result.bodies.len(),
        result.without_body,
        result.failures.len()
    );

    result
}
