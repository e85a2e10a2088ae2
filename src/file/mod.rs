//! Access to the raw bytes of a PE image and its decoded headers.
//!
//! [`File`] is the entry point for everything that follows. It owns the input through a
//! [`Backend`], which is either a read-only memory mapping of a file on disk or an owned
//! buffer, decodes the PE/COFF headers once at load time and translates RVAs into file
//! offsets.
//!
//! The bytes held by a [`File`] are never modified. Redaction works on a separate copy, see
//! [`crate::redaction::RedactedImage`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use dotredact::File;
//! use std::path::Path;
//!
//! let file = File::from_file(Path::new("HelloWorld.exe"))?;
//! let text = file.section_by_name(".text").expect("no .text section");
//! println!("{} bytes of code at {:#x}", text.size_of_raw_data, text.pointer_to_raw_data);
//! # Ok::<(), dotredact::Error>(())
//! ```

pub mod io;
pub mod parser;
pub mod pe;

mod memory;
mod physical;

use std::path::Path;

use crate::{Error, Result};
use memory::Memory;
use pe::{DataDirectory, PeHeaders, SectionHeader};
use physical::Physical;

/// Read-only storage for the bytes of an image
pub trait Backend: Send + Sync {
    /// Returns a sub-slice of the data
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the range is not fully inside the data
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]>;

    /// All bytes of the image
    fn data(&self) -> &[u8];

    /// Length of the image in bytes
    fn len(&self) -> usize;
}

/// A loaded PE image together with its decoded headers
pub struct File {
    data: Box<dyn Backend>,
    headers: PeHeaders,
}

impl File {
    /// Memory-map and decode the image at `file`
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file can not be read, and any header decoding
    /// error otherwise
    pub fn from_file(file: &Path) -> Result<File> {
        let input = Physical::new(file)?;

        Self::load(input)
    }

    /// Decode an image that is already in memory
    ///
    /// # Errors
    /// Returns [`crate::Error::Empty`] for an empty buffer, and any header decoding error
    /// otherwise
    pub fn from_mem(data: Vec<u8>) -> Result<File> {
        let input = Memory::new(data);

        Self::load(input)
    }

    fn load<T: Backend + 'static>(data: T) -> Result<File> {
        if data.len() == 0 {
            return Err(Error::Empty);
        }

        let headers = PeHeaders::parse(data.data())?;

        Ok(File {
            data: Box::new(data),
            headers,
        })
    }

    /// Length of the image in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the image holds no bytes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All bytes of the image
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.data.data()
    }

    /// A bounds-checked sub-slice of the image
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the range is not fully inside the image
    pub fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        self.data.data_slice(offset, len)
    }

    /// The decoded PE/COFF headers
    #[must_use]
    pub fn headers(&self) -> &PeHeaders {
        &self.headers
    }

    /// Preferred load address of the image
    #[must_use]
    pub fn imagebase(&self) -> u64 {
        self.headers.optional.image_base
    }

    /// Iterate over the section headers
    pub fn sections(&self) -> impl Iterator<Item = &SectionHeader> {
        self.headers.sections.iter()
    }

    /// Look up a section by name
    #[must_use]
    pub fn section_by_name(&self, name: &str) -> Option<&SectionHeader> {
        self.headers.sections.by_name(name)
    }

    /// The CLR runtime header directory, `None` for native images
    #[must_use]
    pub fn clr(&self) -> Option<DataDirectory> {
        self.headers.optional.clr_runtime_header()
    }

    /// Translate an RVA into an offset that is guaranteed to lie inside the image
    ///
    /// # Errors
    /// Returns [`crate::Error::UnmappedRva`] if no section covers `rva`, and
    /// [`crate::Error::OutOfBounds`] if the covering section points past the end of the file
    pub fn rva_to_offset(&self, rva: u32) -> Result<usize> {
        let offset = self.headers.sections.rva_to_offset(rva)?;
        if offset >= self.len() {
            return Err(out_of_bounds_error!(offset, 1, self.len()));
        }

        Ok(offset)
    }

    /// Resolve `rva` and return `len` bytes from there
    ///
    /// # Errors
    /// See [`File::rva_to_offset`] and [`File::data_slice`]
    pub fn rva_slice(&self, rva: u32, len: usize) -> Result<&[u8]> {
        let offset = self.rva_to_offset(rva)?;
        self.data_slice(offset, len)
    }
}

impl std::fmt::Debug for File {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("File")
            .field("len", &self.len())
            .field("headers", &self.headers)
            .finish()
    }
}
