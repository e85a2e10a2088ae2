//! The `#US` heap: string literals referenced by `ldstr`.
//!
//! Each entry is an ECMA-335 compressed unsigned integer `L`, followed by `L - 1` bytes of
//! UTF-16LE code units and one trailing flag byte. The flag is 1 if any code unit has a
//! non-zero high byte or a low byte in one of the ranges 0x01-0x08, 0x0E-0x1F, 0x27, 0x2D or
//! 0x7F, and 0 otherwise. The entry at offset 0 is the empty entry with `L == 0`.
//!
//! [`UserStringEntry`] keeps the position of the prefix, payload and flag within the heap, so
//! that the payload can be overwritten without moving anything else.

use std::ops::Range;

use widestring::U16String;

use crate::{file::parser::Parser, Result};

/// One decoded `#US` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserStringEntry<'a> {
    /// Offset of the entry (its length prefix) within the heap
    pub offset: usize,
    /// Size of the compressed length prefix, 1, 2 or 4
    pub prefix_len: usize,
    /// The declared length, UTF-16 payload plus the flag byte
    pub length: u32,
    /// The UTF-16LE payload bytes
    pub payload: &'a [u8],
    /// The trailing flag byte, absent for the empty entry
    pub flag: Option<u8>,
}

impl UserStringEntry<'_> {
    /// Heap-relative range of the UTF-16 payload bytes
    #[must_use]
    pub fn payload_range(&self) -> Range<usize> {
        let start = self.offset + self.prefix_len;
        start..start + self.payload.len()
    }

    /// Total number of heap bytes occupied by this entry, prefix and flag included
    #[must_use]
    pub fn total_len(&self) -> usize {
        self.prefix_len + self.length as usize
    }

    /// Number of UTF-16 code units in the payload
    #[must_use]
    pub fn char_count(&self) -> usize {
        self.payload.len() / 2
    }

    /// The payload as UTF-16 code units
    #[must_use]
    pub fn code_units(&self) -> Vec<u16> {
        self.payload
            .chunks_exact(2)
            .map(|unit| u16::from_le_bytes([unit[0], unit[1]]))
            .collect()
    }

    /// Decode the payload, replacing unpaired surrogates
    #[must_use]
    pub fn to_string_lossy(&self) -> String {
        U16String::from_vec(self.code_units()).to_string_lossy()
    }
}

/// View over the `#US` heap
pub struct UserStrings<'a> {
    data: &'a [u8],
}

impl<'a> UserStrings<'a> {
    /// Wrap the heap bytes, which must start with the empty entry
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for an empty heap or a non-zero first byte
    pub fn from(data: &'a [u8]) -> Result<UserStrings<'a>> {
        if data.first() != Some(&0) {
            return Err(malformed_error!("Provided #US heap is empty or invalid"));
        }

        Ok(UserStrings { data })
    }

    /// Size of the heap in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the heap holds no bytes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Decode the entry whose length prefix starts at byte offset `offset`
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the entry runs past the heap, and
    /// [`crate::Error::Malformed`] for an invalid prefix or an even, non-zero length
    pub fn get(&self, offset: usize) -> Result<UserStringEntry<'a>> {
        let mut parser = Parser::new(self.data);
        parser.seek(offset)?;

        // A 111xxxxx first byte has no encoding (II.23.2) and is Malformed, whatever follows it
        let length = parser.read_compressed_uint()?;
        let prefix_len = parser.pos() - offset;

        if length == 0 {
            return Ok(UserStringEntry {
                offset,
                prefix_len,
                length,
                payload: &[],
                flag: None,
            });
        }

        if length % 2 == 0 {
            return Err(malformed_error!(
                "#US entry at offset {} has an even length of {}",
                offset,
                length
            ));
        }

        let payload = parser.take(length as usize - 1)?;
        let flag = parser.read_le::<u8>()?;

        Ok(UserStringEntry {
            offset,
            prefix_len,
            length,
            payload,
            flag: Some(flag),
        })
    }

    /// Iterate over all entries in heap order
    #[must_use]
    pub fn iter(&self) -> UserStringsIterator<'_, 'a> {
        UserStringsIterator {
            heap: self,
            position: 0,
        }
    }
}

/// Sequential iterator over the entries of a `#US` heap
///
/// Trailing zero padding decodes as empty entries. Iteration stops after the first error.
pub struct UserStringsIterator<'h, 'a> {
    heap: &'h UserStrings<'a>,
    position: usize,
}

impl<'a> Iterator for UserStringsIterator<'_, 'a> {
    type Item = Result<UserStringEntry<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.heap.data.len() {
            return None;
        }

        match self.heap.get(self.position) {
            Ok(entry) => {
                self.position += entry.total_len();
                Some(Ok(entry))
            }
            Err(error) => {
                self.position = self.heap.data.len();
                Some(Err(error))
            }
        }
    }
}

/// Compute the trailing flag byte for a sequence of UTF-16 code units
#[must_use]
pub fn user_string_flag(units: &[u16]) -> u8 {
    let special = units.iter().any(|&unit| {
        unit > 0xFF || matches!(unit, 0x01..=0x08 | 0x0E..=0x1F | 0x27 | 0x2D | 0x7F)
    });

    u8::from(special)
}
