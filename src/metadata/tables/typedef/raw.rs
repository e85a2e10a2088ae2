use crate::{
    file::io::{read_le_at, read_le_at_dyn},
    metadata::{
        streams::Strings,
        tables::{CodedIndex, CodedIndexType, MetadataTable, RowReadable, TableId, TableInfo},
        token::Token,
    },
    Result,
};

/// A row of the TypeDef table, with heap and table indexes left unresolved
#[derive(Clone, Debug)]
pub struct TypeDefRaw {
    /// 1-based row id
    pub rid: u32,
    /// Token of this row
    pub token: Token,
    /// Offset of the row within the table data
    pub offset: usize,
    /// `TypeAttributes` bitmask
    pub flags: u32,
    /// `#Strings` index of the type name
    pub type_name: u32,
    /// `#Strings` index of the namespace
    pub type_namespace: u32,
    /// The base type, a TypeDef, TypeRef or TypeSpec; row 0 if there is none
    pub extends: CodedIndex,
    /// First row of this type's run in the Field table
    pub field_list: u32,
    /// First row of this type's run in the MethodDef table
    pub method_list: u32,
}

impl TypeDefRaw {
    /// Resolve the namespace-qualified name, `Namespace.Name` or just `Name`
    ///
    /// # Errors
    /// Returns an error if either index does not address a valid string
    pub fn full_name(&self, strings: &Strings) -> Result<String> {
        let name = strings.get(self.type_name as usize)?;
        let namespace = strings.get(self.type_namespace as usize)?;

        if namespace.is_empty() {
            Ok(name.to_string())
        } else {
            Ok(format!("{namespace}.{name}"))
        }
    }

    /// Row ids of the methods owned by this type
    ///
    /// The run ends at the next row's `method_list`, or after the last method for the last type.
    #[must_use]
    pub fn method_range(
        &self,
        table: &MetadataTable<TypeDefRaw>,
        method_count: u32,
    ) -> std::ops::Range<u32> {
        let start = self.method_list.max(1);
        let end = match table.get(self.rid + 1) {
            Some(next) => next.method_list,
            None => method_count + 1,
        };

        start..end.max(start).min(method_count + 1)
    }
}

impl RowReadable for TypeDefRaw {
    const TABLE_ID: TableId = TableId::TypeDef;

    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfo) -> Result<Self> {
        Ok(TypeDefRaw {
            rid,
            token: Token::new(TableId::TypeDef.token_type() | rid),
            offset: *offset,
            flags: read_le_at::<u32>(data, offset)?,
            type_name: read_le_at_dyn(data, offset, sizes.is_large_str())?,
            type_namespace: read_le_at_dyn(data, offset, sizes.is_large_str())?,
            extends: CodedIndex::read(data, offset, sizes, CodedIndexType::TypeDefOrRef)?,
            field_list: read_le_at_dyn(data, offset, sizes.is_large(TableId::Field))?,
            method_list: read_le_at_dyn(data, offset, sizes.is_large(TableId::MethodDef))?,
        })
    }
}
