//! Section headers and RVA resolution.

use bitflags::bitflags;

use crate::{file::parser::Parser, Error, Result};

/// On-disk size of a section header
pub const SECTION_HEADER_SIZE: usize = 40;

bitflags! {
    /// Flags describing the content and memory protection of a section
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SectionCharacteristics: u32 {
        /// Section contains executable code
        const CNT_CODE = 0x0000_0020;
        /// Section contains initialized data
        const CNT_INITIALIZED_DATA = 0x0000_0040;
        /// Section contains uninitialized data
        const CNT_UNINITIALIZED_DATA = 0x0000_0080;
        /// Section can be discarded
        const MEM_DISCARDABLE = 0x0200_0000;
        /// Section can be shared
        const MEM_SHARED = 0x1000_0000;
        /// Section can be executed
        const MEM_EXECUTE = 0x2000_0000;
        /// Section can be read
        const MEM_READ = 0x4000_0000;
        /// Section can be written
        const MEM_WRITE = 0x8000_0000;
    }
}

/// A single entry of the section table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionHeader {
    /// Raw, NUL padded section name
    pub name: [u8; 8],
    /// Size of the section once loaded
    pub virtual_size: u32,
    /// RVA of the section once loaded
    pub virtual_address: u32,
    /// Size of the section data in the file
    pub size_of_raw_data: u32,
    /// File offset of the section data
    pub pointer_to_raw_data: u32,
    /// File offset of the relocation entries
    pub pointer_to_relocations: u32,
    /// File offset of the line number entries
    pub pointer_to_linenumbers: u32,
    /// Number of relocation entries
    pub number_of_relocations: u16,
    /// Number of line number entries
    pub number_of_linenumbers: u16,
    /// Content and protection flags
    pub characteristics: SectionCharacteristics,
}

impl SectionHeader {
    /// Decode one 40-byte section header
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] on truncated input
    pub fn read(parser: &mut Parser) -> Result<SectionHeader> {
        let mut name = [0u8; 8];
        name.copy_from_slice(parser.take(8)?);

        Ok(SectionHeader {
            name,
            virtual_size: parser.read_le::<u32>()?,
            virtual_address: parser.read_le::<u32>()?,
            size_of_raw_data: parser.read_le::<u32>()?,
            pointer_to_raw_data: parser.read_le::<u32>()?,
            pointer_to_relocations: parser.read_le::<u32>()?,
            pointer_to_linenumbers: parser.read_le::<u32>()?,
            number_of_relocations: parser.read_le::<u16>()?,
            number_of_linenumbers: parser.read_le::<u16>()?,
            characteristics: SectionCharacteristics::from_bits_retain(parser.read_le::<u32>()?),
        })
    }

    /// The section name without its NUL padding
    #[must_use]
    pub fn name(&self) -> &str {
        let len = self.name.iter().position(|&c| c == 0).unwrap_or(8);
        std::str::from_utf8(&self.name[..len]).unwrap_or("")
    }

    /// Returns true if `rva` lies within `[virtual_address, virtual_address + virtual_size)`
    #[must_use]
    pub fn contains_rva(&self, rva: u32) -> bool {
        match self.virtual_address.checked_add(self.virtual_size) {
            Some(end) => self.virtual_address <= rva && rva < end,
            None => self.virtual_address <= rva,
        }
    }
}

/// The ordered list of section headers of an image
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionTable {
    sections: Vec<SectionHeader>,
}

impl SectionTable {
    /// Decode exactly `count` section headers at the parser position
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the table is truncated
    pub fn read(parser: &mut Parser, count: u16) -> Result<SectionTable> {
        parser.ensure_remaining(usize::from(count) * SECTION_HEADER_SIZE)?;

        let mut sections = Vec::with_capacity(usize::from(count));
        for _ in 0..count {
            sections.push(SectionHeader::read(parser)?);
        }

        Ok(SectionTable { sections })
    }

    /// Number of sections
    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Returns true if the image has no sections
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Iterate over the sections in table order
    pub fn iter(&self) -> std::slice::Iter<'_, SectionHeader> {
        self.sections.iter()
    }

    /// Find a section by name, e.g. `.text`
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&SectionHeader> {
        self.sections.iter().find(|section| section.name() == name)
    }

    /// Find the section whose virtual range covers `rva`
    #[must_use]
    pub fn containing(&self, rva: u32) -> Option<&SectionHeader> {
        self.sections.iter().find(|section| section.contains_rva(rva))
    }

    /// Translate an RVA into a file offset
    ///
    /// The covering section is the one with `virtual_address <= rva < virtual_address +
    /// virtual_size`, the result is `pointer_to_raw_data + (rva - virtual_address)`. The
    /// zero-filled tail of a section whose `virtual_size` exceeds `size_of_raw_data` has no
    /// bytes in the file and does not resolve.
    ///
    /// # Errors
    /// Returns [`crate::Error::UnmappedRva`] if no section covers `rva` with file data
    pub fn rva_to_offset(&self, rva: u32) -> Result<usize> {
        let Some(section) = self.containing(rva) else {
            return Err(Error::UnmappedRva { rva });
        };

        let delta = rva - section.virtual_address;
        if delta >= section.size_of_raw_data {
            log::debug!(
                "RVA {:#x} falls into the virtual tail of section {} ({:#x} raw bytes)",
                rva,
                section.name(),
                section.size_of_raw_data
            );
            return Err(Error::UnmappedRva { rva });
        }

        Ok(section.pointer_to_raw_data as usize + delta as usize)
    }
}
