// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
//#![deny(unsafe_code)]
// - 'file/physical.rs' uses mmap to map a file into memory

//! # dotredact
//!
//! Locate and redact the string literals of .NET PE executables.
//!
//! `dotredact` reads a managed PE image, walks the COFF/PE headers into the CLI metadata,
//! decodes the `#~` tables stream, locates every method body and scans the CIL bytecode for
//! `ldstr` instructions. The `#US` heap entries they load can be reported, and overwritten in
//! a copy of the image without moving any other byte of the file.
//!
//! ## Pipeline
//!
//! 1. [`File`] - PE/COFF headers, section table and RVA to file offset translation
//! 2. [`metadata::cor20header`] - the CLI header
//! 3. [`metadata::root`] - the metadata root and its stream headers
//! 4. [`TablesHeader`] - the tables schema, with typed rows for Module, TypeRef, TypeDef,
//!    MethodDef and Param
//! 5. [`metadata::method`] - tiny and fat method headers
//! 6. [`disassembler`] - opcode table and `ldstr` scanner
//! 7. [`redaction`] - scan reports and in-place redaction of `#US` payloads
//!
//! Steps 1 to 4 run when a [`CilImage`] is loaded and abort the load on any structural error.
//! Problems with individual methods are collected instead, see [`redaction::ScanReport`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dotredact::prelude::*;
//!
//! let image = CilImage::from_file("HelloWorld.exe".as_ref())?;
//! let config = ScanConfig::default();
//!
//! let report = scan(&image, &config);
//! for load in report.unique() {
//!     println!("#US {:#x}: {}", load.us_offset, load.value);
//! }
//!
//! let redacted = redact(&image, &report, &config)?;
//! assert_eq!(redacted.data().len(), image.data().len());
//! redacted.write_to("HelloWorld.redacted.exe".as_ref())?;
//! # Ok::<(), dotredact::Error>(())
//! ```
//!
//! ## Logging
//!
//! The library logs through the [`log`](https://docs.rs/log) facade and never installs a
//! logger. Stream and table layout decisions are logged at `debug`, skipped methods at `warn`
//! and scan and redaction summaries at `info`.

#[macro_use]
pub(crate) mod error;

/// PE file access, byte cursor and PE/COFF headers
pub mod file;

/// Convenient re-exports of the most commonly used types.
///
/// ```rust,no_run
/// use dotredact::prelude::*;
///
/// let image = CilImage::from_file("HelloWorld.exe".as_ref())?;
/// let report = scan(&image, &ScanConfig::sequential());
/// println!("{} string loads", report.loads.len());
/// # Ok::<(), dotredact::Error>(())
/// ```
pub mod prelude;

/// CIL opcode table and instruction decoding
pub mod disassembler;

/// CLI header, metadata root, streams, tables and method bodies
pub mod metadata;

/// String load scanning and in-place `#US` redaction
pub mod redaction;

/// `dotredact` Result type.
///
/// A type alias for `std::result::Result<T, Error>` where the error type is always
/// [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `dotredact` Error type.
///
/// ```rust,no_run
/// use dotredact::{CilImage, Error};
///
/// match CilImage::from_file("HelloWorld.exe".as_ref()) {
///     Ok(image) => println!("Loaded {:?}", image),
///     Err(Error::NotSupported) => println!("Not a managed image"),
///     Err(Error::Malformed { message, .. }) => println!("Malformed: {}", message),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
pub use error::Error;

/// A loaded managed image, see [`metadata::cilimage::CilImage`]
pub use metadata::cilimage::CilImage;

/// Metadata streams and heaps
pub use metadata::streams::{Blob, Guid, StreamHeader, Strings, TablesHeader, UserStrings};

/// Low-level file and byte parsing
pub use file::{parser::Parser, File};
