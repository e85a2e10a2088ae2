use strum::IntoEnumIterator;

use crate::{
    metadata::tables::types::{CodedIndexType, TableId},
    Result,
};

/// Row count of one table and the index width it implies
#[derive(Clone, Copy, Default, PartialEq, Debug)]
pub struct TableRowInfo {
    /// Number of rows in the table
    pub rows: u32,
    /// Set if simple indexes into this table are 4 bytes wide
    pub is_large: bool,
}

impl TableRowInfo {
    /// Create the entry for a table with `rows` rows
    #[must_use]
    pub fn new(rows: u32) -> Self {
        Self {
            rows,
            is_large: rows > u32::from(u16::MAX),
        }
    }
}

/// Column widths of the `#~` schema, derived from the heap-size flags and the row counts
///
/// Every width is computed from these inputs when asked for. The row layout of all 45 known
/// tables is available through [`TableInfo::row_size`], so that tables which are not decoded
/// can still be skipped exactly.
#[derive(Clone, Default, Debug)]
pub struct TableInfo {
    rows: Vec<TableRowInfo>,
    is_large_index_str: bool,
    is_large_index_guid: bool,
    is_large_index_blob: bool,
}

impl TableInfo {
    /// Build the schema from the `heap_sizes` byte and the per-table row counts, indexed by
    /// table id
    #[must_use]
    pub fn new(heap_sizes: u8, row_counts: &[u32]) -> Self {
        let rows = TableId::iter()
            .map(|id| TableRowInfo::new(row_counts.get(id as usize).copied().unwrap_or(0)))
            .collect();

        TableInfo {
            rows,
            is_large_index_str: heap_sizes & 0x01 != 0,
            is_large_index_guid: heap_sizes & 0x02 != 0,
            is_large_index_blob: heap_sizes & 0x04 != 0,
        }
    }

    #[cfg(test)]
    pub(crate) fn new_test(
        valid_tables: &[(TableId, u32)],
        large_str: bool,
        large_blob: bool,
        large_guid: bool,
    ) -> Self {
        let mut row_counts = [0u32; 64];
        for (id, rows) in valid_tables {
            row_counts[*id as usize] = *rows;
        }

        let heap_sizes =
            u8::from(large_str) | (u8::from(large_guid) << 1) | (u8::from(large_blob) << 2);
        TableInfo::new(heap_sizes, &row_counts)
    }

    /// Row count and index width of `table`
    #[must_use]
    pub fn get(&self, table: TableId) -> &TableRowInfo {
        &self.rows[table as usize]
    }

    /// Number of rows in `table`
    #[must_use]
    pub fn rows(&self, table: TableId) -> u32 {
        self.rows[table as usize].rows
    }

    /// Returns true if simple indexes into `table` are 4 bytes wide
    #[must_use]
    pub fn is_large(&self, table: TableId) -> bool {
        self.rows[table as usize].is_large
    }

    /// Returns true if `#Strings` indexes are 4 bytes wide
    #[must_use]
    pub fn is_large_str(&self) -> bool {
        self.is_large_index_str
    }

    /// Returns true if `#GUID` indexes are 4 bytes wide
    #[must_use]
    pub fn is_large_guid(&self) -> bool {
        self.is_large_index_guid
    }

    /// Returns true if `#Blob` indexes are 4 bytes wide
    #[must_use]
    pub fn is_large_blob(&self) -> bool {
        self.is_large_index_blob
    }

    /// Width of a `#Strings` index
    #[must_use]
    pub fn str_bytes(&self) -> u32 {
        if self.is_large_index_str {
            4
        } else {
            2
        }
    }

    /// Width of a `#GUID` index
    #[must_use]
    pub fn guid_bytes(&self) -> u32 {
        if self.is_large_index_guid {
            4
        } else {
            2
        }
    }

    /// Width of a `#Blob` index
    #[must_use]
    pub fn blob_bytes(&self) -> u32 {
        if self.is_large_index_blob {
            4
        } else {
            2
        }
    }

    /// Width of a simple index into `table`
    #[must_use]
    pub fn table_index_bytes(&self, table: TableId) -> u32 {
        if self.is_large(table) {
            4
        } else {
            2
        }
    }

    /// Width of a coded index of kind `coded_index_type`
    ///
    /// The index is 2 bytes wide if every candidate table has fewer than
    /// `2^(16 - tag_bits)` rows, and 4 bytes otherwise.
    #[must_use]
    pub fn coded_index_bytes(&self, coded_index_type: CodedIndexType) -> u32 {
        let limit = 1u32 << (16 - coded_index_type.tag_bits());
        let max_rows = coded_index_type
            .targets()
            .iter()
            .flatten()
            .map(|table| self.rows(*table))
            .max()
            .unwrap_or(0);

        if max_rows < limit {
            2
        } else {
            4
        }
    }

    /// Split a raw coded index into its table and row
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the tag is reserved or has no table
    pub fn decode_coded_index(
        &self,
        value: u32,
        coded_index_type: CodedIndexType,
    ) -> Result<(TableId, u32)> {
        let tag_bits = coded_index_type.tag_bits();
        let tag = value & ((1 << tag_bits) - 1);
        let row = value >> tag_bits;

        match coded_index_type.targets().get(tag as usize) {
            Some(Some(table)) => Ok((*table, row)),
            _ => Err(malformed_error!(
                "Invalid tag {} in {:?} coded index {:#x}",
                tag,
                coded_index_type,
                value
            )),
        }
    }

    /// Size in bytes of one row of `table` (ECMA-335 II.22)
    #[must_use]
    pub fn row_size(&self, table: TableId) -> u32 {
        use CodedIndexType as Ci;

        let s = self.str_bytes();
        let g = self.guid_bytes();
        let b = self.blob_bytes();
        let idx = |id: TableId| self.table_index_bytes(id);
        let ci = |kind: CodedIndexType| self.coded_index_bytes(kind);

        match table {
            TableId::Module => 2 + s + g + g + g,
            TableId::TypeRef => ci(Ci::ResolutionScope) + s + s,
            TableId::TypeDef => {
                4 + s + s + ci(Ci::TypeDefOrRef) + idx(TableId::Field) + idx(TableId::MethodDef)
            }
            TableId::FieldPtr => idx(TableId::Field),
            TableId::Field => 2 + s + b,
            TableId::MethodPtr => idx(TableId::MethodDef),
            TableId::MethodDef => 4 + 2 + 2 + s + b + idx(TableId::Param),
            TableId::ParamPtr => idx(TableId::Param),
            TableId::Param => 2 + 2 + s,
            TableId::InterfaceImpl => idx(TableId::TypeDef) + ci(Ci::TypeDefOrRef),
            TableId::MemberRef => ci(Ci::MemberRefParent) + s + b,
            TableId::Constant => 2 + ci(Ci::HasConstant) + b,
            TableId::CustomAttribute => {
                ci(Ci::HasCustomAttribute) + ci(Ci::CustomAttributeType) + b
            }
            TableId::FieldMarshal => ci(Ci::HasFieldMarshal) + b,
            TableId::DeclSecurity => 2 + ci(Ci::HasDeclSecurity) + b,
            TableId::ClassLayout => 2 + 4 + idx(TableId::TypeDef),
            TableId::FieldLayout => 4 + idx(TableId::Field),
            TableId::StandAloneSig => b,
            TableId::EventMap => idx(TableId::TypeDef) + idx(TableId::Event),
            TableId::EventPtr => idx(TableId::Event),
            TableId::Event => 2 + s + ci(Ci::TypeDefOrRef),
            TableId::PropertyMap => idx(TableId::TypeDef) + idx(TableId::Property),
            TableId::PropertyPtr => idx(TableId::Property),
            TableId::Property => 2 + s + b,
            TableId::MethodSemantics => 2 + idx(TableId::MethodDef) + ci(Ci::HasSemantics),
            TableId::MethodImpl => idx(TableId::TypeDef) + 2 * ci(Ci::MethodDefOrRef),
            TableId::ModuleRef => s,
            TableId::TypeSpec => b,
            TableId::ImplMap => 2 + ci(Ci::MemberForwarded) + s + idx(TableId::ModuleRef),
            TableId::FieldRVA => 4 + idx(TableId::Field),
            TableId::EncLog => 8,
            TableId::EncMap => 4,
            TableId::Assembly => 4 + 8 + 4 + b + s + s,
            TableId::AssemblyProcessor => 4,
            TableId::AssemblyOS => 12,
            TableId::AssemblyRef => 8 + 4 + b + s + s + b,
            TableId::AssemblyRefProcessor => 4 + idx(TableId::AssemblyRef),
            TableId::AssemblyRefOS => 12 + idx(TableId::AssemblyRef),
            TableId::File => 4 + s + b,
            TableId::ExportedType => 8 + s + s + ci(Ci::Implementation),
            TableId::ManifestResource => 8 + s + ci(Ci::Implementation),
            TableId::NestedClass => 2 * idx(TableId::TypeDef),
            TableId::GenericParam => 4 + ci(Ci::TypeOrMethodDef) + s,
            TableId::MethodSpec => ci(Ci::MethodDefOrRef) + b,
            TableId::GenericParamConstraint => {
                idx(TableId::GenericParam) + ci(Ci::TypeDefOrRef)
            }
        }
    }
}
