//! The metadata root (ECMA-335 II.24.2.1).
//!
//! The root sits at the RVA given by the CLI header and lists the metadata streams. Stream
//! offsets in the root are relative to the root itself; [`Root::resolve_streams`] turns them
//! into absolute file offsets once the root has been placed within the image.

use crate::{
    file::parser::Parser,
    metadata::streams::StreamHeader,
    Result,
};

/// Signature of the metadata root, `BSJB`
pub const CIL_HEADER_MAGIC: u32 = 0x424A_5342;

/// The decoded metadata root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Root {
    /// Magic signature, always [`CIL_HEADER_MAGIC`]
    pub signature: u32,
    /// Major version, 1
    pub major_version: u16,
    /// Minor version, 1
    pub minor_version: u16,
    /// Reserved, 0
    pub reserved: u32,
    /// Declared length of the version string buffer, including padding
    pub length: u32,
    /// Runtime version string without its terminator, e.g. `v4.0.30319`
    pub version: String,
    /// Reserved, 0
    pub flags: u16,
    /// Number of streams
    pub stream_number: u16,
    /// The stream headers, in the order they appear in the root
    pub stream_headers: Vec<StreamHeader>,
}

impl Root {
    /// Decode the metadata root at the start of `data`, which must cover the complete
    /// metadata (`meta_data_size` bytes)
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] on truncated input and [`crate::Error::Malformed`]
    /// for a bad signature, a version string that disagrees with its declared length, or a
    /// stream that extends past the metadata
    pub fn read(data: &[u8]) -> Result<Root> {
        let mut parser = Parser::new(data);

        let signature = parser.read_le::<u32>()?;
        if signature != CIL_HEADER_MAGIC {
            return Err(malformed_error!(
                "CIL_HEADER_MAGIC does not match - expected {:#010x}, found {:#010x}",
                CIL_HEADER_MAGIC,
                signature
            ));
        }

        let major_version = parser.read_le::<u16>()?;
        let minor_version = parser.read_le::<u16>()?;
        let reserved = parser.read_le::<u32>()?;
        let length = parser.read_le::<u32>()?;

        let version_bytes = parser.take(length as usize)?;
        let Some(terminator) = version_bytes.iter().position(|&b| b == 0) else {
            return Err(malformed_error!(
                "Version string is not terminated within its declared length of {}",
                length
            ));
        };
        if version_bytes[terminator..].iter().any(|&b| b != 0) {
            return Err(malformed_error!(
                "Version string ends at {} but its declared length is {}",
                terminator,
                length
            ));
        }
        let version = std::str::from_utf8(&version_bytes[..terminator])
            .map_err(|_| malformed_error!("Version string is not valid UTF-8"))?
            .to_string();

        parser.align(4)?;
        let flags = parser.read_le::<u16>()?;
        let stream_number = parser.read_le::<u16>()?;
        if stream_number == 0 {
            return Err(malformed_error!("Metadata root declares no streams"));
        }

        let mut stream_headers = Vec::with_capacity(usize::from(stream_number));
        for _ in 0..stream_number {
            let stream = StreamHeader::read(&mut parser)?;

            let Some(stream_end) = stream.offset.checked_add(stream.size) else {
                return Err(malformed_error!(
                    "Stream offset and size cause integer overflow - {} + {}",
                    stream.offset,
                    stream.size
                ));
            };
            if stream_end as usize > data.len() {
                return Err(malformed_error!(
                    "Stream {} ends at {:#x}, past the metadata size of {:#x}",
                    stream.name,
                    stream_end,
                    data.len()
                ));
            }

            log::debug!(
                "Stream {} at metadata offset {:#x}, {} bytes",
                stream.name,
                stream.offset,
                stream.size
            );
            stream_headers.push(stream);
        }

        Ok(Root {
            signature,
            major_version,
            minor_version,
            reserved,
            length,
            version,
            flags,
            stream_number,
            stream_headers,
        })
    }

    /// Fill in [`StreamHeader::file_offset`] for every stream, translating
    /// `metadata_rva + offset` through `resolve`
    ///
    /// # Errors
    /// Propagates the first failure of `resolve`
    pub fn resolve_streams<F>(&mut self, metadata_rva: u32, resolve: F) -> Result<()>
    where
        F: Fn(u32) -> Result<usize>,
    {
        for stream in &mut self.stream_headers {
            let Some(rva) = metadata_rva.checked_add(stream.offset) else {
                return Err(malformed_error!(
                    "Stream {} RVA overflows - {:#x} + {:#x}",
                    stream.name,
                    metadata_rva,
                    stream.offset
                ));
            };
            stream.file_offset = resolve(rva)?;
        }

        Ok(())
    }

    /// Look up a stream by name
    #[must_use]
    pub fn stream(&self, name: &str) -> Option<&StreamHeader> {
        self.stream_headers.iter().find(|stream| stream.name == name)
    }

    /// The stream holding the metadata tables, `#~` or the uncompressed `#-`
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] unless exactly one of the two is present
    pub fn tables_stream(&self) -> Result<&StreamHeader> {
        match (self.stream("#~"), self.stream("#-")) {
            (Some(stream), None) | (None, Some(stream)) => Ok(stream),
            (None, None) => Err(malformed_error!(
                "Metadata root has neither a #~ nor a #- stream"
            )),
            (Some(_), Some(_)) => Err(malformed_error!(
                "Metadata root has both a #~ and a #- stream"
            )),
        }
    }
}
