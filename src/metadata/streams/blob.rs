//! The `#Blob` heap: compressed-length-prefixed byte sequences addressed by byte offset.

use crate::{file::parser::Parser, Result};

/// View over the `#Blob` heap
pub struct Blob<'a> {
    data: &'a [u8],
}

impl<'a> Blob<'a> {
    /// Wrap the heap bytes, which must start with the empty blob
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for an empty heap or a non-zero first byte
    pub fn from(data: &'a [u8]) -> Result<Blob<'a>> {
        if data.first() != Some(&0) {
            return Err(malformed_error!("Invalid memory for #Blob heap"));
        }

        Ok(Blob { data })
    }

    /// Get the blob whose length prefix starts at byte offset `index`
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the prefix or content run past the heap, and
    /// [`crate::Error::Malformed`] for an invalid length prefix
    pub fn get(&self, index: usize) -> Result<&'a [u8]> {
        let mut parser = Parser::new(self.data);
        parser.seek(index)?;

        let len = parser.read_compressed_uint()? as usize;
        parser.take(len)
    }
}
