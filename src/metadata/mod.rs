//! CLI metadata of a managed image.
//!
//! - [`cilimage`] - the loaded image, tying the pieces below together
//! - [`cor20header`] - the CLI header found through the CLR runtime header directory
//! - [`root`] - the metadata root and its stream headers
//! - [`streams`] - the heaps and the `#~` tables stream
//! - [`tables`] - the tables schema and the decoded row types
//! - [`method`] - method header decoding and body location
//! - [`token`] - metadata tokens
//!
//! # Examples
//!
//! ```rust,no_run
//! use dotredact::CilImage;
//!
//! let image = CilImage::from_file("tests/samples/HelloWorld.exe".as_ref())?;
//! println!("Module: {}", image.module_name()?);
//! println!("Methods: {}", image.tables().method_def.row_count());
//! # Ok::<(), dotredact::Error>(())
//! ```

/// The loaded image
pub mod cilimage;
/// The CLI header
pub mod cor20header;
/// Method bodies
pub mod method;
/// The metadata root
pub mod root;
/// Metadata streams
pub mod streams;
/// Metadata tables
pub mod tables;
/// Metadata tokens
pub mod token;
