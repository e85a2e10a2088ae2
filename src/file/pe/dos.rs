//! The MS-DOS stub header at the very start of every PE image.

use crate::{file::parser::Parser, Result};

/// `MZ`
pub const DOS_MAGIC: u16 = 0x5A4D;
/// `PE\0\0`
pub const PE_SIGNATURE: u32 = 0x0000_4550;
/// Size of the DOS header that precedes the stub program
pub const DOS_HEADER_SIZE: usize = 128;

/// The fields of the DOS header the loader still cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DosHeader {
    /// Magic number, always `MZ`
    pub e_magic: u16,
    /// File offset of the `PE\0\0` signature
    pub e_lfanew: u32,
}

impl DosHeader {
    /// Decode the 128-byte DOS header at the parser position
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if fewer than 128 bytes are available, and
    /// [`crate::Error::Malformed`] if the `MZ` magic is missing
    pub fn read(parser: &mut Parser) -> Result<DosHeader> {
        let start = parser.pos();
        let header = parser.take(DOS_HEADER_SIZE)?;

        let mut stub = Parser::new(header);
        let e_magic = stub.read_le::<u16>()?;
        if e_magic != DOS_MAGIC {
            return Err(malformed_error!(
                "Invalid DOS magic at offset {} - expected {:#06x}, found {:#06x}",
                start,
                DOS_MAGIC,
                e_magic
            ));
        }

        stub.seek(60)?;
        let e_lfanew = stub.read_le::<u32>()?;

        Ok(DosHeader { e_magic, e_lfanew })
    }
}

/// Check the `PE\0\0` signature at the parser position and step over it
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the signature is truncated, and
/// [`crate::Error::Malformed`] if any of its four bytes differ
pub fn read_pe_signature(parser: &mut Parser) -> Result<()> {
    let offset = parser.pos();
    let signature = parser.read_le::<u32>()?;
    if signature != PE_SIGNATURE {
        return Err(malformed_error!(
            "Invalid PE signature at offset {} - expected {:#010x}, found {:#010x}",
            offset,
            PE_SIGNATURE,
            signature
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn stub(e_lfanew: u32) -> Vec<u8> {
        let mut data = vec![0u8; DOS_HEADER_SIZE];
        data[0] = b'M';
        data[1] = b'Z';
        data[60..64].copy_from_slice(&e_lfanew.to_le_bytes());
        data
    }

    #[test]
    fn crafted() {
        let data = stub(0x80);
        let mut parser = Parser::new(&data);

        let header = DosHeader::read(&mut parser).unwrap();
        assert_eq!(header.e_magic, DOS_MAGIC);
        assert_eq!(header.e_lfanew, 0x80);
        assert_eq!(parser.pos(), DOS_HEADER_SIZE);
    }

    #[test]
    fn truncated() {
        let data = stub(0x80);
        let mut parser = Parser::new(&data[..127]);

        assert!(matches!(
            DosHeader::read(&mut parser),
            Err(Error::OutOfBounds {
                offset: 0,
                needed: 128,
                available: 127
            })
        ));
    }

    #[test]
    fn bad_magic() {
        let mut data = stub(0x80);
        data[1] = b'X';

        assert!(matches!(
            DosHeader::read(&mut Parser::new(&data)),
            Err(Error::Malformed { .. })
        ));
    }

    #[test]
    fn signature() {
        let data = *b"PE\0\0";
        let mut parser = Parser::new(&data);
        read_pe_signature(&mut parser).unwrap();
        assert_eq!(parser.pos(), 4);

        for index in 0..4 {
            let mut flipped = data;
            flipped[index] ^= 0xFF;
            assert!(matches!(
                read_pe_signature(&mut Parser::new(&flipped)),
                Err(Error::Malformed { .. })
            ));
        }

        assert!(matches!(
            read_pe_signature(&mut Parser::new(b"PE")),
            Err(Error::OutOfBounds { .. })
        ));
    }
}
