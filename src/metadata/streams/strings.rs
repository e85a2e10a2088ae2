//! The `#Strings` heap: NUL-terminated UTF-8 identifiers addressed by byte offset.

use std::{ffi::CStr, str};

use crate::Result;

/// View over the `#Strings` heap
pub struct Strings<'a> {
    data: &'a [u8],
}

impl<'a> Strings<'a> {
    /// Wrap the heap bytes, which must start with the empty string
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for an empty heap or a non-zero first byte
    pub fn from(data: &'a [u8]) -> Result<Strings<'a>> {
        if data.first() != Some(&0) {
            return Err(malformed_error!("Provided #Strings heap is empty or invalid"));
        }

        Ok(Strings { data })
    }

    /// Get the string starting at byte offset `index`
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] for an index past the heap, and
    /// [`crate::Error::Malformed`] for an unterminated or non UTF-8 string
    pub fn get(&self, index: usize) -> Result<&'a str> {
        if index >= self.data.len() {
            return Err(out_of_bounds_error!(index, 1, self.data.len()));
        }

        CStr::from_bytes_until_nul(&self.data[index..])
            .ok()
            .and_then(|result| result.to_str().ok())
            .ok_or_else(|| malformed_error!("Invalid string at index - {}", index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn crafted() {
        let data = b"\0<Module>\0HelloWorld.exe\0Program\0Main\0System\0Console\0WriteLine\0";
        let strings = Strings::from(data).unwrap();

        assert_eq!(strings.get(0).unwrap(), "");
        assert_eq!(strings.get(1).unwrap(), "<Module>");
        assert_eq!(strings.get(10).unwrap(), "HelloWorld.exe");
        assert_eq!(strings.get(25).unwrap(), "Program");
        assert_eq!(strings.get(33).unwrap(), "Main");
        // Offsets may point into the middle of another string
        assert_eq!(strings.get(36).unwrap(), "n");
    }

    #[test]
    fn invalid() {
        assert!(Strings::from(&[]).is_err());
        assert!(Strings::from(b"abc\0").is_err());

        let strings = Strings::from(b"\0abc").unwrap();
        assert!(matches!(strings.get(1), Err(Error::Malformed { .. })));
        assert!(matches!(strings.get(4), Err(Error::OutOfBounds { .. })));
    }
}
