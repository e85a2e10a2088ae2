//! The `#~` stream: header, row counts and table data (ECMA-335 II.24.2.6).
//!
//! The stream starts with a 24 byte header followed by one `u32` row count per table present in
//! the `valid` mask, in ascending table id order. The tables themselves follow back to back in
//! the same order, each `row_count * row_size` bytes long. Because nothing records where a
//! table starts, every present table has to be sized to find the next one.

use strum::IntoEnumIterator;

use crate::{
    file::parser::Parser,
    metadata::tables::{
        MetadataTable, MethodDefRaw, ModuleRaw, ParamRaw, RowReadable, TableId, TableInfo,
        TypeDefRaw, TypeRefRaw,
    },
    Error, Result,
};

/// Size of the fixed part of the `#~` header
pub const TABLES_HEADER_SIZE: usize = 24;

/// Heap-size flag signalling four extra bytes after the row counts
const HEAP_SIZES_EXTRA_DATA: u8 = 0x40;

/// Position and dimensions of one present table within the `#~` stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableLayout {
    /// The table
    pub id: TableId,
    /// Offset of the first row, relative to the start of the stream
    pub offset: usize,
    /// Number of rows
    pub row_count: u32,
    /// Size of one row in bytes
    pub row_size: u32,
}

impl TableLayout {
    /// Total size of the table in bytes
    #[must_use]
    pub fn size(&self) -> usize {
        self.row_count as usize * self.row_size as usize
    }
}

/// The decoded `#~` stream
pub struct TablesHeader {
    /// Reserved, shall be zero
    pub reserved: u32,
    /// Major schema version
    pub major_version: u8,
    /// Minor schema version
    pub minor_version: u8,
    /// Heap index width flags
    pub heap_sizes: u8,
    /// Bit-vector of present tables
    pub valid: u64,
    /// Bit-vector of sorted tables
    pub sorted: u64,
    /// Row count per table id; 0 for absent tables
    pub row_counts: [u32; 64],
    /// Column widths derived from `heap_sizes` and `row_counts`
    pub info: TableInfo,
    /// Every present table, in stream order
    pub layout: Vec<TableLayout>,
    /// Decoded Module rows
    pub module: MetadataTable<ModuleRaw>,
    /// Decoded TypeRef rows
    pub type_ref: MetadataTable<TypeRefRaw>,
    /// Decoded TypeDef rows
    pub type_def: MetadataTable<TypeDefRaw>,
    /// Decoded MethodDef rows
    pub method_def: MetadataTable<MethodDefRaw>,
    /// Decoded Param rows
    pub param: MetadataTable<ParamRaw>,
}

impl TablesHeader {
    /// Decode the `#~` stream held by `data`, which must be exactly the stream's bytes
    ///
    /// # Errors
    /// - [`crate::Error::OutOfBounds`] if the header or row counts are truncated
    /// - [`crate::Error::UnsupportedTable`] if `valid` marks a table past 0x2C
    /// - [`crate::Error::Malformed`] if the tables run past the end of the stream, or for an
    ///   empty `valid` mask
    pub fn from(data: &[u8]) -> Result<TablesHeader> {
        let mut parser = Parser::new(data);

        let reserved = parser.read_le::<u32>()?;
        let major_version = parser.read_le::<u8>()?;
        let minor_version = parser.read_le::<u8>()?;
        let heap_sizes = parser.read_le::<u8>()?;
        parser.advance_by(1)?;
        let valid = parser.read_le::<u64>()?;
        let sorted = parser.read_le::<u64>()?;

        if valid == 0 {
            return Err(malformed_error!("No valid rows in any of the tables"));
        }

        let mut row_counts = [0u32; 64];
        for (bit, count) in row_counts.iter_mut().enumerate() {
            if valid & (1u64 << bit) == 0 {
                continue;
            }

            if bit > TableId::GenericParamConstraint as usize {
                return Err(Error::UnsupportedTable(bit as u8));
            }

            *count = parser.read_le::<u32>()?;
        }

        if heap_sizes & HEAP_SIZES_EXTRA_DATA != 0 {
            parser.advance_by(4)?;
        }

        let info = TableInfo::new(heap_sizes, &row_counts);

        let mut layout = Vec::with_capacity(valid.count_ones() as usize);
        let mut offset = parser.pos();
        for id in TableId::iter() {
            if valid & (1u64 << id as u8) == 0 {
                continue;
            }

            let row_count = row_counts[id as usize];
            let row_size = info.row_size(id);
            let end = (row_count as usize)
                .checked_mul(row_size as usize)
                .and_then(|size| size.checked_add(offset))
                .filter(|end| *end <= data.len())
                .ok_or_else(|| {
                    malformed_error!(
                        "Table {:?} with {} rows of {} bytes at offset {} overruns the #~ stream of {} bytes",
                        id,
                        row_count,
                        row_size,
                        offset,
                        data.len()
                    )
                })?;

            log::debug!(
                "Table {:?}: {} rows of {} bytes at offset {:#x}",
                id,
                row_count,
                row_size,
                offset
            );

            layout.push(TableLayout {
                id,
                offset,
                row_count,
                row_size,
            });
            offset = end;
        }

        let mut header = TablesHeader {
            reserved,
            major_version,
            minor_version,
            heap_sizes,
            valid,
            sorted,
            row_counts,
            module: MetadataTable::empty(&info),
            type_ref: MetadataTable::empty(&info),
            type_def: MetadataTable::empty(&info),
            method_def: MetadataTable::empty(&info),
            param: MetadataTable::empty(&info),
            info,
            layout,
        };

        header.module = header.read_table(data)?;
        header.type_ref = header.read_table(data)?;
        header.type_def = header.read_table(data)?;
        header.method_def = header.read_table(data)?;
        header.param = header.read_table(data)?;

        Ok(header)
    }

    fn read_table<T: RowReadable>(&self, data: &[u8]) -> Result<MetadataTable<T>> {
        match self.table_layout(T::TABLE_ID) {
            Some(layout) => {
                MetadataTable::new(&data[layout.offset..], layout.row_count, &self.info)
            }
            None => Ok(MetadataTable::empty(&self.info)),
        }
    }

    /// Number of tables present in the stream
    #[must_use]
    pub fn table_count(&self) -> u32 {
        self.valid.count_ones()
    }

    /// Returns true if `table` is present in the `valid` mask
    #[must_use]
    pub fn has_table(&self, table: TableId) -> bool {
        self.valid & (1u64 << table as u8) != 0
    }

    /// Layout of `table`, if present
    #[must_use]
    pub fn table_layout(&self, table: TableId) -> Option<&TableLayout> {
        self.layout.iter().find(|layout| layout.id == table)
    }

    /// Offset just past the last table, relative to the start of the stream
    #[must_use]
    pub fn tables_end(&self) -> usize {
        self.layout
            .last()
            .map_or(TABLES_HEADER_SIZE, |layout| layout.offset + layout.size())
    }
}
