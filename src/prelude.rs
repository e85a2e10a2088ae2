//! # dotredact Prelude
//!
//! The types needed to load an image, scan it and write a redacted copy.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all dotredact operations
pub use crate::Error;

/// The result type used throughout dotredact
pub use crate::Result;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// A loaded managed image
pub use crate::CilImage;

/// Low-level file parsing utilities
pub use crate::{File, Parser};

// ================================================================================================
// Metadata
// ================================================================================================

/// Metadata token type for referencing table entries and `#US` entries
pub use crate::metadata::token::Token;

/// Metadata heaps
pub use crate::metadata::streams::{Blob, Guid, Strings, UserStringEntry, UserStrings};

/// Tables schema and row types
pub use crate::metadata::tables::{
    MetadataTable, MethodDefRaw, MethodImplCodeType, ModuleRaw, ParamRaw, TableId, TypeDefRaw,
    TypeRefRaw,
};

/// Method bodies
pub use crate::metadata::method::{MethodBodies, MethodBody, MethodCode, MethodFailure};

// ================================================================================================
// Scanning and Redaction
// ================================================================================================

/// Instruction decoding
pub use crate::disassembler::{decode_instruction, scan_ldstr, Instruction, LdstrSite};

/// Scanning and redaction
pub use crate::redaction::{
    redact, redact_where, scan, RedactedImage, ScanConfig, ScanReport, StringLoad,
};
