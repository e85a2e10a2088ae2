//! PE optional header, including the data directory array.
//!
//! Both the PE32 (`0x10B`) and PE32+ (`0x20B`) layouts are supported. They differ in the
//! width of the image base and the stack/heap reservation fields, and PE32 carries an
//! additional `base_of_data` field. The data directories that follow are identical.

use crate::{file::parser::Parser, Result};

/// Magic of a PE32 optional header
pub const PE32_MAGIC: u16 = 0x10B;
/// Magic of a PE32+ optional header
pub const PE32_PLUS_MAGIC: u16 = 0x20B;
/// Maximum number of data directories in an optional header
pub const MAX_DATA_DIRECTORIES: usize = 16;

/// One RVA/size pair from the data directory array
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DataDirectory {
    /// RVA of the described structure
    pub virtual_address: u32,
    /// Size in bytes of the described structure
    pub size: u32,
}

impl DataDirectory {
    /// Returns true if the directory does not point anywhere
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.virtual_address == 0 || self.size == 0
    }
}

/// Well-known positions in the data directory array
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum DataDirectoryType {
    /// Export table
    ExportTable = 0,
    /// Import table
    ImportTable = 1,
    /// Resource table
    ResourceTable = 2,
    /// Exception table
    ExceptionTable = 3,
    /// Attribute certificate table
    CertificateTable = 4,
    /// Base relocation table
    BaseRelocationTable = 5,
    /// Debug data
    Debug = 6,
    /// Reserved, must be zero
    Architecture = 7,
    /// Global pointer register value
    GlobalPtr = 8,
    /// Thread local storage table
    TlsTable = 9,
    /// Load configuration table
    LoadConfigTable = 10,
    /// Bound import table
    BoundImport = 11,
    /// Import address table
    ImportAddressTable = 12,
    /// Delay import descriptor
    DelayImportDescriptor = 13,
    /// CLI header of a managed image
    ClrRuntimeHeader = 14,
    /// Reserved, must be zero
    Reserved = 15,
}

/// The standard COFF fields and the Windows specific fields of the optional header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionalHeader {
    /// `0x10B` for PE32, `0x20B` for PE32+
    pub magic: u16,
    /// Linker major version
    pub major_linker_version: u8,
    /// Linker minor version
    pub minor_linker_version: u8,
    /// Sum of all code sections
    pub size_of_code: u32,
    /// Sum of all initialized data sections
    pub size_of_initialized_data: u32,
    /// Sum of all uninitialized data sections
    pub size_of_uninitialized_data: u32,
    /// RVA of the entry point
    pub address_of_entry_point: u32,
    /// RVA of the first code section
    pub base_of_code: u32,
    /// RVA of the first data section, PE32 only
    pub base_of_data: Option<u32>,
    /// Preferred load address
    pub image_base: u64,
    /// Alignment of sections in memory
    pub section_alignment: u32,
    /// Alignment of section raw data in the file
    pub file_alignment: u32,
    /// Required subsystem major version
    pub major_subsystem_version: u16,
    /// Required subsystem minor version
    pub minor_subsystem_version: u16,
    /// Size of the image in memory
    pub size_of_image: u32,
    /// Combined size of all headers, rounded up to `file_alignment`
    pub size_of_headers: u32,
    /// Image checksum
    pub check_sum: u32,
    /// Subsystem required to run the image
    pub subsystem: u16,
    /// DLL characteristics
    pub dll_characteristics: u16,
    /// Number of data directories that were present on disk
    pub number_of_rva_and_sizes: u32,
    /// The data directories, missing ones are zeroed
    pub data_directories: [DataDirectory; MAX_DATA_DIRECTORIES],
}

impl OptionalHeader {
    /// Decode an optional header of `size` bytes at the parser position
    ///
    /// On success the parser is positioned directly after the optional header, where the
    /// section table begins.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] on truncated input and [`crate::Error::Malformed`]
    /// for an unknown magic or a header too small to hold its directories
    pub fn read(parser: &mut Parser, size: usize) -> Result<OptionalHeader> {
        let start = parser.pos();
        let header = parser.take(size)?;
        let mut parser = Parser::new(header);

        let magic = parser.read_le::<u16>()?;
        let is_plus = match magic {
            PE32_MAGIC => false,
            PE32_PLUS_MAGIC => true,
            _ => {
                return Err(malformed_error!(
                    "Invalid optional header magic at offset {} - {:#06x}",
                    start,
                    magic
                ))
            }
        };

        let major_linker_version = parser.read_le::<u8>()?;
        let minor_linker_version = parser.read_le::<u8>()?;
        let size_of_code = parser.read_le::<u32>()?;
        let size_of_initialized_data = parser.read_le::<u32>()?;
        let size_of_uninitialized_data = parser.read_le::<u32>()?;
        let address_of_entry_point = parser.read_le::<u32>()?;
        let base_of_code = parser.read_le::<u32>()?;
        let base_of_data = if is_plus {
            None
        } else {
            Some(parser.read_le::<u32>()?)
        };

        let image_base = if is_plus {
            parser.read_le::<u64>()?
        } else {
            u64::from(parser.read_le::<u32>()?)
        };
        let section_alignment = parser.read_le::<u32>()?;
        let file_alignment = parser.read_le::<u32>()?;
        // Operating system and image versions
        parser.advance_by(8)?;
        let major_subsystem_version = parser.read_le::<u16>()?;
        let minor_subsystem_version = parser.read_le::<u16>()?;
        // Win32VersionValue
        parser.advance_by(4)?;
        let size_of_image = parser.read_le::<u32>()?;
        let size_of_headers = parser.read_le::<u32>()?;
        let check_sum = parser.read_le::<u32>()?;
        let subsystem = parser.read_le::<u16>()?;
        let dll_characteristics = parser.read_le::<u16>()?;
        // Stack and heap reserve / commit
        parser.advance_by(if is_plus { 32 } else { 16 })?;
        // LoaderFlags
        parser.advance_by(4)?;
        let number_of_rva_and_sizes = parser.read_le::<u32>()?;

        let directory_count = (number_of_rva_and_sizes as usize).min(MAX_DATA_DIRECTORIES);
        if parser.remaining() < directory_count * 8 {
            return Err(malformed_error!(
                "Optional header of {} bytes can not hold {} data directories",
                size,
                number_of_rva_and_sizes
            ));
        }

        let mut data_directories = [DataDirectory::default(); MAX_DATA_DIRECTORIES];
        for directory in data_directories.iter_mut().take(directory_count) {
            directory.virtual_address = parser.read_le::<u32>()?;
            directory.size = parser.read_le::<u32>()?;
        }

        Ok(OptionalHeader {
            magic,
            major_linker_version,
            minor_linker_version,
            size_of_code,
            size_of_initialized_data,
            size_of_uninitialized_data,
            address_of_entry_point,
            base_of_code,
            base_of_data,
            image_base,
            section_alignment,
            file_alignment,
            major_subsystem_version,
            minor_subsystem_version,
            size_of_image,
            size_of_headers,
            check_sum,
            subsystem,
            dll_characteristics,
            number_of_rva_and_sizes,
            data_directories,
        })
    }

    /// Returns true for a PE32+ (64-bit) header
    #[must_use]
    pub fn is_pe32_plus(&self) -> bool {
        self.magic == PE32_PLUS_MAGIC
    }

    /// Get a data directory by type, `None` if it is empty
    #[must_use]
    pub fn directory(&self, dir_type: DataDirectoryType) -> Option<DataDirectory> {
        let directory = self.data_directories[dir_type as usize];
        (!directory.is_empty()).then_some(directory)
    }

    /// The CLI header directory of a managed image
    #[must_use]
    pub fn clr_runtime_header(&self) -> Option<DataDirectory> {
        self.directory(DataDirectoryType::ClrRuntimeHeader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn pe32_header() -> Vec<u8> {
        #[rustfmt::skip]
        let mut header = vec![
            0x0B, 0x01,             // magic
            0x30, 0x00,             // linker version
            0x00, 0x04, 0x00, 0x00, // size_of_code
            0x00, 0x02, 0x00, 0x00, // size_of_initialized_data
            0x00, 0x00, 0x00, 0x00, // size_of_uninitialized_data
            0x7E, 0x23, 0x00, 0x00, // address_of_entry_point
            0x00, 0x20, 0x00, 0x00, // base_of_code
            0x00, 0x40, 0x00, 0x00, // base_of_data
            0x00, 0x00, 0x40, 0x00, // image_base
            0x00, 0x20, 0x00, 0x00, // section_alignment
            0x00, 0x02, 0x00, 0x00, // file_alignment
            0x04, 0x00, 0x00, 0x00, // os version
            0x00, 0x00, 0x00, 0x00, // image version
            0x04, 0x00, 0x00, 0x00, // subsystem version
            0x00, 0x00, 0x00, 0x00, // win32_version_value
            0x00, 0x80, 0x00, 0x00, // size_of_image
            0x00, 0x02, 0x00, 0x00, // size_of_headers
            0x00, 0x00, 0x00, 0x00, // check_sum
            0x03, 0x00,             // subsystem
            0x60, 0x85,             // dll_characteristics
            0x00, 0x00, 0x10, 0x00, // size_of_stack_reserve
            0x00, 0x10, 0x00, 0x00, // size_of_stack_commit
            0x00, 0x00, 0x10, 0x00, // size_of_heap_reserve
            0x00, 0x10, 0x00, 0x00, // size_of_heap_commit
            0x00, 0x00, 0x00, 0x00, // loader_flags
            0x10, 0x00, 0x00, 0x00, // number_of_rva_and_sizes
        ];
        header.resize(224, 0);

        // Import table
        header[104..112].copy_from_slice(&[0x2C, 0x23, 0x00, 0x00, 0x4F, 0x00, 0x00, 0x00]);
        // CLR runtime header
        header[208..216].copy_from_slice(&[0x08, 0x20, 0x00, 0x00, 0x48, 0x00, 0x00, 0x00]);
        header
    }

    #[test]
    fn crafted_pe32() {
        let data = pe32_header();
        let mut parser = Parser::new(&data);

        let header = OptionalHeader::read(&mut parser, 224).unwrap();
        assert_eq!(parser.pos(), 224);
        assert!(!header.is_pe32_plus());
        assert_eq!(header.major_linker_version, 0x30);
        assert_eq!(header.size_of_code, 0x400);
        assert_eq!(header.address_of_entry_point, 0x237E);
        assert_eq!(header.base_of_data, Some(0x4000));
        assert_eq!(header.image_base, 0x40_0000);
        assert_eq!(header.file_alignment, 0x200);
        assert_eq!(header.subsystem, 3);
        assert_eq!(header.number_of_rva_and_sizes, 16);

        let import = header.directory(DataDirectoryType::ImportTable).unwrap();
        assert_eq!(import.virtual_address, 0x232C);
        assert_eq!(import.size, 0x4F);

        let clr = header.clr_runtime_header().unwrap();
        assert_eq!(clr.virtual_address, 0x2008);
        assert_eq!(clr.size, 72);

        assert!(header.directory(DataDirectoryType::ExportTable).is_none());
    }

    #[test]
    fn crafted_pe32_plus() {
        let mut data = vec![0u8; 240];
        data[0..2].copy_from_slice(&PE32_PLUS_MAGIC.to_le_bytes());
        data[24..32].copy_from_slice(&0x1_4000_0000u64.to_le_bytes());
        // number_of_rva_and_sizes
        data[108..112].copy_from_slice(&16u32.to_le_bytes());
        // CLR runtime header
        data[224..232].copy_from_slice(&[0x08, 0x20, 0x00, 0x00, 0x48, 0x00, 0x00, 0x00]);

        let header = OptionalHeader::read(&mut Parser::new(&data), 240).unwrap();
        assert!(header.is_pe32_plus());
        assert_eq!(header.base_of_data, None);
        assert_eq!(header.image_base, 0x1_4000_0000);
        assert_eq!(header.clr_runtime_header().unwrap().virtual_address, 0x2008);
    }

    #[test]
    fn invalid() {
        let mut data = pe32_header();
        data[0] = 0x07;
        assert!(matches!(
            OptionalHeader::read(&mut Parser::new(&data), 224),
            Err(Error::Malformed { .. })
        ));

        let data = pe32_header();
        assert!(matches!(
            OptionalHeader::read(&mut Parser::new(&data[..100]), 224),
            Err(Error::OutOfBounds { .. })
        ));
        assert!(matches!(
            OptionalHeader::read(&mut Parser::new(&data), 200),
            Err(Error::Malformed { .. })
        ));
    }
}
