//! Stream headers of the metadata root (ECMA-335 II.24.2.2).

use crate::{file::parser::Parser, Result};

/// Longest stream name including its NUL terminator
pub const MAX_STREAM_NAME: usize = 32;

/// Location and name of one metadata stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamHeader {
    /// Offset of the stream relative to the metadata root
    pub offset: u32,
    /// Size of the stream in bytes
    pub size: u32,
    /// Name of the stream, e.g. `#~` or `#US`
    pub name: String,
    /// Absolute file offset of the stream, filled in once the metadata root has been placed
    /// in the image
    pub file_offset: usize,
}

impl StreamHeader {
    /// Decode one stream header at the parser position
    ///
    /// The name is NUL-terminated and padded to the next 4-byte boundary; the parser is left
    /// after the padding.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] on truncated input and [`crate::Error::Malformed`]
    /// if the name is not terminated within 32 bytes or is not valid UTF-8
    pub fn read(parser: &mut Parser) -> Result<StreamHeader> {
        let offset = parser.read_le::<u32>()?;
        let size = parser.read_le::<u32>()?;

        let name_start = parser.pos();
        let window = &parser.data()[name_start..(name_start + MAX_STREAM_NAME).min(parser.len())];
        let Some(name_len) = window.iter().position(|&b| b == 0) else {
            if window.len() < MAX_STREAM_NAME {
                return Err(out_of_bounds_error!(name_start, MAX_STREAM_NAME, parser.len()));
            }
            return Err(malformed_error!(
                "Stream name at offset {} is not terminated within {} bytes",
                name_start,
                MAX_STREAM_NAME
            ));
        };

        let name = std::str::from_utf8(&window[..name_len])
            .map_err(|_| malformed_error!("Stream name at offset {} is not valid UTF-8", name_start))?
            .to_string();

        parser.advance_by(name_len + 1)?;
        parser.align(4)?;

        Ok(StreamHeader {
            offset,
            size,
            name,
            file_offset: 0,
        })
    }
}
