//! Cursor-based reader over an immutable byte slice.
//!
//! [`Parser`] is the single way headers, metadata structures and heap entries are read in
//! this crate. It keeps a position into the slice, checks every access against the slice
//! length and reports overruns as [`crate::Error::OutOfBounds`] instead of panicking.
//!
//! # Examples
//!
//! ```rust
//! use dotredact::Parser;
//!
//! let data = [0x4D, 0x5A, 0x90, 0x00, 0x03, 0x00, 0x00, 0x00];
//! let mut parser = Parser::new(&data);
//!
//! assert_eq!(parser.take(2)?, b"MZ");
//! assert_eq!(parser.peek_le::<u16>()?, 0x0090);
//! assert_eq!(parser.read_le::<u16>()?, 0x0090);
//! assert_eq!(parser.read_le::<u32>()?, 3);
//! # Ok::<(), dotredact::Error>(())
//! ```

use crate::{
    file::io::{read_le_at, read_le_at_dyn, CilIO},
    Result,
};

/// A bounds-checked sequential reader.
///
/// The parser never copies the underlying data; [`Parser::take`] hands out sub-slices that
/// borrow from the original buffer.
pub struct Parser<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> Parser<'a> {
    /// Create a new parser positioned at the start of `data`
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Parser { data, position: 0 }
    }

    /// Total length of the underlying data
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the underlying data is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns true if at least one more byte can be read
    #[must_use]
    pub fn has_more_data(&self) -> bool {
        self.position < self.data.len()
    }

    /// Move the cursor to `pos`
    ///
    /// Seeking to exactly the end of the data is allowed, nothing can be read from there.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `pos` lies past the end of the data
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(out_of_bounds_error!(pos, 0, self.data.len()));
        }

        self.position = pos;
        Ok(())
    }

    /// Move the cursor forward by `step` bytes
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if fewer than `step` bytes remain
    pub fn advance_by(&mut self, step: usize) -> Result<()> {
        self.ensure_remaining(step)?;
        self.position += step;
        Ok(())
    }

    /// Current cursor position
    #[must_use]
    pub fn pos(&self) -> usize {
        self.position
    }

    /// The complete underlying data, independent of the cursor
    #[must_use]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Number of bytes left after the cursor
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Verify that at least `needed` bytes can be read
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] otherwise
    pub fn ensure_remaining(&self, needed: usize) -> Result<()> {
        if self.remaining() < needed {
            return Err(out_of_bounds_error!(self.position, needed, self.data.len()));
        }
        Ok(())
    }

    /// Return the next `n` bytes and advance past them
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if fewer than `n` bytes remain
    pub fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        self.ensure_remaining(n)?;

        let slice = &self.data[self.position..self.position + n];
        self.position += n;
        Ok(slice)
    }

    /// Look at the byte under the cursor without consuming it
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] at the end of the data
    pub fn peek_byte(&self) -> Result<u8> {
        self.peek_le::<u8>()
    }

    /// Read a little-endian `T` without moving the cursor
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the value does not fit in the remaining data
    pub fn peek_le<T: CilIO>(&self) -> Result<T> {
        let mut temp_position = self.position;
        read_le_at::<T>(self.data, &mut temp_position)
    }

    /// Read a little-endian `T` and advance past it
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the value does not fit in the remaining data
    pub fn read_le<T: CilIO>(&mut self) -> Result<T> {
        read_le_at::<T>(self.data, &mut self.position)
    }

    /// Read a 2-byte or 4-byte little-endian index, depending on `is_large`
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the value does not fit in the remaining data
    pub fn read_index(&mut self, is_large: bool) -> Result<u32> {
        read_le_at_dyn(self.data, &mut self.position, is_large)
    }

    /// Advance the cursor to the next multiple of `alignment`
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the padding runs past the end of the data
    pub fn align(&mut self, alignment: usize) -> Result<()> {
        let padding = (alignment - (self.position % alignment)) % alignment;
        self.advance_by(padding)
    }

    /// Read an ECMA-335 compressed unsigned integer (II.23.2)
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] on truncated input and [`crate::Error::Malformed`]
    /// if the first byte does not start a valid 1, 2 or 4 byte encoding
    pub fn read_compressed_uint(&mut self) -> Result<u32> {
        let first_byte = self.read_le::<u8>()?;

        // 1-byte encoding: 0xxxxxxx
        if (first_byte & 0x80) == 0 {
            return Ok(u32::from(first_byte));
        }

        // 2-byte encoding: 10xxxxxx xxxxxxxx
        if (first_byte & 0xC0) == 0x80 {
            let second_byte = self.read_le::<u8>()?;
            return Ok(((u32::from(first_byte) & 0x3F) << 8) | u32::from(second_byte));
        }

        // 4-byte encoding: 110xxxxx xxxxxxxx xxxxxxxx xxxxxxxx
        if (first_byte & 0xE0) == 0xC0 {
            let rest = self.take(3)?;
            return Ok(((u32::from(first_byte) & 0x1F) << 24)
                | (u32::from(rest[0]) << 16)
                | (u32::from(rest[1]) << 8)
                | u32::from(rest[2]));
        }

        Err(malformed_error!(
            "Invalid compressed uint - {:#04x} at offset {}",
            first_byte,
            self.position - 1
        ))
    }

    /// Read a NUL-terminated UTF-8 string, consuming the terminator
    ///
    /// A string running to the end of the data without a terminator is accepted.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the bytes are not valid UTF-8
    pub fn read_string_utf8(&mut self) -> Result<&'a str> {
        let start = self.position;
        let rest = &self.data[start.min(self.data.len())..];
        let length = rest.iter().position(|&b| b == 0).unwrap_or(rest.len());

        self.position = start + length;
        if self.position < self.data.len() {
            self.position += 1;
        }

        std::str::from_utf8(&rest[..length]).map_err(|e| {
            malformed_error!(
                "Invalid UTF-8 string at offset {}-{}: {}",
                start,
                start + length,
                e
            )
        })
    }
}
