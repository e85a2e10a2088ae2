//! Error types for image decoding and string redaction.
//!
//! All fallible operations in this crate return [`crate::Result`], an alias over [`Error`].
//! Structural problems (headers, metadata root, tables schema) abort a parse through `?`,
//! while per-method problems are collected into a [`crate::redaction::ScanReport`] instead.
//!
//! Two helper macros keep error construction short at the call sites:
//!
//! - `malformed_error!` builds [`Error::Malformed`] and records the source location
//! - `out_of_bounds_error!` builds [`Error::OutOfBounds`] from an offset, the needed byte count
//!   and the available byte count

use thiserror::Error;

/// Creates an [`Error::Malformed`] carrying the source file and line of the call site.
///
/// ```rust, ignore
/// return Err(malformed_error!("Invalid signature - {:#x}", signature));
/// ```
macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// Creates an [`Error::OutOfBounds`] for a read of `needed` bytes at `offset` from a buffer
/// holding `available` bytes.
macro_rules! out_of_bounds_error {
    ($offset:expr, $needed:expr, $available:expr) => {
        crate::Error::OutOfBounds {
            offset: $offset,
            needed: $needed,
            available: $available,
        }
    };
}

/// The generic error type covering every failure this crate can report.
#[derive(Error, Debug)]
pub enum Error {
    /// A read or seek would have gone past the end of the underlying buffer.
    #[error("Out of bound read at offset {offset:#x} - needed {needed} bytes, {available} available")]
    OutOfBounds {
        /// Offset the read started at
        offset: usize,
        /// Number of bytes the read required
        needed: usize,
        /// Total length of the buffer that was read from
        available: usize,
    },

    /// The input violates the expected format (bad signature, inconsistent length fields,
    /// stream overrun, ...).
    ///
    /// The source location of the check that failed is captured to ease diagnosis.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// Description of the violated constraint
        message: String,
        /// Source file of the check
        file: &'static str,
        /// Source line of the check
        line: u32,
    },

    /// No section of the image covers the requested relative virtual address.
    #[error("RVA {rva:#010x} is not covered by any section")]
    UnmappedRva {
        /// The address that could not be resolved
        rva: u32,
    },

    /// The first byte of a method body is neither a tiny nor a fat header.
    #[error("Invalid method header {value:#04x} at offset {offset:#x}")]
    InvalidMethodHeader {
        /// File offset of the header byte
        offset: usize,
        /// The offending header byte
        value: u8,
    },

    /// A table is present in the tables stream whose row layout is unknown, so nothing that
    /// follows it can be located.
    #[error("Table {0:#04x} is present but its row layout is unknown")]
    UnsupportedTable(u8),

    /// The image is a valid PE file but carries no CLI header.
    #[error("This file type is not supported")]
    NotSupported,

    /// Provided input was empty.
    #[error("Provided input was empty")]
    Empty,

    /// Reading or writing a file failed.
    #[error("{0}")]
    FileError(#[from] std::io::Error),
}
