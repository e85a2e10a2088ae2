//! Decoding of tiny and fat method headers (ECMA-335 II.25.4).
//!
//! A tiny header is a single byte: the low two bits are `0b10` and the upper six bits hold the
//! code size. A fat header is at least 12 bytes: a 12-bit flags field, a 4-bit header size in
//! dwords, the max stack depth, a 32-bit code size and the local variable signature token.

use std::ops::Range;

use crate::{
    file::io::read_le_at,
    metadata::method::{MethodBodyFlags, FAT_HEADER_SIZE, METHOD_HEADER_FORMAT_MASK},
    Error, Result,
};

/// A decoded method header and the location of the code it describes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodBody {
    /// Offset of the header within the image
    pub offset: usize,
    /// Size of the code in bytes
    pub size_code: usize,
    /// Size of the header in bytes, 1 for tiny headers
    pub size_header: usize,
    /// Maximum evaluation stack depth; 8 for tiny headers
    pub max_stack: usize,
    /// StandAloneSig token of the locals signature, 0 if there are none
    pub local_var_sig_token: u32,
    /// Header flags, format bits included
    pub flags: MethodBodyFlags,
    /// Set for the fat header format
    pub is_fat: bool,
}

impl MethodBody {
    /// Decode the header at `offset` of the image `data`
    ///
    /// # Errors
    /// - [`crate::Error::InvalidMethodHeader`] for an unknown format or a fat header shorter
    ///   than 12 bytes
    /// - [`crate::Error::OutOfBounds`] if the header or the code it announces runs past `data`
    pub fn read(data: &[u8], offset: usize) -> Result<MethodBody> {
        let mut cursor = offset;
        let first_byte = read_le_at::<u8>(data, &mut cursor)?;

        let body = match first_byte & METHOD_HEADER_FORMAT_MASK {
            0b10 => MethodBody {
                offset,
                size_code: usize::from(first_byte >> 2),
                size_header: 1,
                max_stack: 8,
                local_var_sig_token: 0,
                flags: MethodBodyFlags::TINY_FORMAT,
                is_fat: false,
            },
            0b11 => {
                let mut cursor = offset;
                let flags_and_size = read_le_at::<u16>(data, &mut cursor)?;
                let size_header = usize::from(flags_and_size >> 12) * 4;
                if size_header < FAT_HEADER_SIZE {
                    return Err(Error::InvalidMethodHeader {
                        offset,
                        value: first_byte,
                    });
                }

                let max_stack = usize::from(read_le_at::<u16>(data, &mut cursor)?);
                let size_code = read_le_at::<u32>(data, &mut cursor)? as usize;
                let local_var_sig_token = read_le_at::<u32>(data, &mut cursor)?;

                MethodBody {
                    offset,
                    size_code,
                    size_header,
                    max_stack,
                    local_var_sig_token,
                    flags: MethodBodyFlags::from_bits_truncate(flags_and_size & 0x0FFF),
                    is_fat: true,
                }
            }
            _ => {
                return Err(Error::InvalidMethodHeader {
                    offset,
                    value: first_byte,
                })
            }
        };

        let code = body.code_range();
        if code.end > data.len() || code.end < code.start {
            return Err(out_of_bounds_error!(code.start, body.size_code, data.len()));
        }

        Ok(body)
    }

    /// Image range of the code bytes following the header
    #[must_use]
    pub fn code_range(&self) -> Range<usize> {
        let start = self.offset.saturating_add(self.size_header);
        start..start.saturating_add(self.size_code)
    }

    /// Total size of header and code
    #[must_use]
    pub fn size(&self) -> usize {
        self.size_header + self.size_code
    }

    /// Returns true if the locals are zero-initialized
    #[must_use]
    pub fn is_init_local(&self) -> bool {
        self.flags.contains(MethodBodyFlags::INIT_LOCALS)
    }

    /// Returns true if data sections follow the code
    #[must_use]
    pub fn has_more_sections(&self) -> bool {
        self.is_fat && self.flags.contains(MethodBodyFlags::MORE_SECTS)
    }
}
