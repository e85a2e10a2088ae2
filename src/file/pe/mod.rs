//! PE/COFF header decoding.
//!
//! The headers are read in a single forward pass:
//!
//! 1. [`DosHeader`] - the 128-byte stub header, providing `e_lfanew`
//! 2. the `PE\0\0` signature at `e_lfanew`
//! 3. [`CoffHeader`] - the 20-byte file header
//! 4. [`OptionalHeader`] - PE32 or PE32+, including the data directories
//! 5. [`SectionTable`] - `number_of_sections` 40-byte entries
//!
//! [`SectionTable::rva_to_offset`] then maps relative virtual addresses back to file offsets
//! for every later stage.

mod coff;
mod dos;
mod optional;
mod section;

pub use coff::{CoffCharacteristics, CoffHeader, COFF_HEADER_SIZE};
pub use dos::{DosHeader, DOS_HEADER_SIZE, DOS_MAGIC, PE_SIGNATURE};
pub use optional::{
    DataDirectory, DataDirectoryType, OptionalHeader, MAX_DATA_DIRECTORIES, PE32_MAGIC,
    PE32_PLUS_MAGIC,
};
pub use section::{SectionCharacteristics, SectionHeader, SectionTable, SECTION_HEADER_SIZE};

use crate::{file::parser::Parser, Result};

/// All decoded headers of a PE image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeHeaders {
    /// The DOS stub header
    pub dos: DosHeader,
    /// The COFF file header
    pub coff: CoffHeader,
    /// The optional header and data directories
    pub optional: OptionalHeader,
    /// The section table
    pub sections: SectionTable,
}

impl PeHeaders {
    /// Decode the headers of the image in `data`
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] for truncated headers and [`crate::Error::Malformed`]
    /// for a bad DOS magic, PE signature or optional header magic
    pub fn parse(data: &[u8]) -> Result<PeHeaders> {
        let mut parser = Parser::new(data);

        let dos = DosHeader::read(&mut parser)?;
        parser.seek(dos.e_lfanew as usize)?;
        dos::read_pe_signature(&mut parser)?;

        let coff = CoffHeader::read(&mut parser)?;
        let optional = OptionalHeader::read(&mut parser, usize::from(coff.size_of_optional_header))?;
        let sections = SectionTable::read(&mut parser, coff.number_of_sections)?;

        log::debug!(
            "PE headers: machine {:#06x}, {} sections, optional header magic {:#05x}",
            coff.machine,
            sections.len(),
            optional.magic
        );

        Ok(PeHeaders {
            dos,
            coff,
            optional,
            sections,
        })
    }
}
