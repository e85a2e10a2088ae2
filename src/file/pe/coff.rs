//! COFF file header.

use bitflags::bitflags;

use crate::{file::parser::Parser, Result};

/// On-disk size of the COFF file header
pub const COFF_HEADER_SIZE: usize = 20;

bitflags! {
    /// Image characteristics stored in the COFF header
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CoffCharacteristics: u16 {
        /// Base relocations have been removed
        const RELOCS_STRIPPED = 0x0001;
        /// The image is valid and can be run
        const EXECUTABLE_IMAGE = 0x0002;
        /// COFF line numbers have been removed
        const LINE_NUMS_STRIPPED = 0x0004;
        /// COFF symbol table entries for local symbols have been removed
        const LOCAL_SYMS_STRIPPED = 0x0008;
        /// Aggressively trim the working set
        const AGGRESSIVE_WS_TRIM = 0x0010;
        /// The application can handle addresses above 2 GiB
        const LARGE_ADDRESS_AWARE = 0x0020;
        /// Little endian
        const BYTES_REVERSED_LO = 0x0080;
        /// The machine is based on a 32-bit word architecture
        const MACHINE_32BIT = 0x0100;
        /// Debugging information has been removed
        const DEBUG_STRIPPED = 0x0200;
        /// Copy to swap when run from removable media
        const REMOVABLE_RUN_FROM_SWAP = 0x0400;
        /// Copy to swap when run from network media
        const NET_RUN_FROM_SWAP = 0x0800;
        /// The image is a system file
        const SYSTEM = 0x1000;
        /// The image is a dynamic-link library
        const DLL = 0x2000;
        /// Uniprocessor machines only
        const UP_SYSTEM_ONLY = 0x4000;
        /// Big endian
        const BYTES_REVERSED_HI = 0x8000;
    }
}

/// The COFF file header following the `PE\0\0` signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoffHeader {
    /// Target machine (`0x14C` for i386, `0x8664` for AMD64, ...)
    pub machine: u16,
    /// Number of entries in the section table
    pub number_of_sections: u16,
    /// Link time, seconds since 1970
    pub time_date_stamp: u32,
    /// File offset of the COFF symbol table, zero for images
    pub pointer_to_symbol_table: u32,
    /// Number of entries in the COFF symbol table
    pub number_of_symbols: u32,
    /// Size of the optional header that follows
    pub size_of_optional_header: u16,
    /// Image characteristics
    pub characteristics: CoffCharacteristics,
}

impl CoffHeader {
    /// Decode the 20-byte COFF header at the parser position
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] on truncated input
    pub fn read(parser: &mut Parser) -> Result<CoffHeader> {
        Ok(CoffHeader {
            machine: parser.read_le::<u16>()?,
            number_of_sections: parser.read_le::<u16>()?,
            time_date_stamp: parser.read_le::<u32>()?,
            pointer_to_symbol_table: parser.read_le::<u32>()?,
            number_of_symbols: parser.read_le::<u32>()?,
            size_of_optional_header: parser.read_le::<u16>()?,
            characteristics: CoffCharacteristics::from_bits_retain(parser.read_le::<u16>()?),
        })
    }

    /// Returns true if the image is a DLL
    #[must_use]
    pub fn is_dll(&self) -> bool {
        self.characteristics.contains(CoffCharacteristics::DLL)
    }
}
