use crate::{
    file::io::read_le_at_dyn,
    metadata::{
        streams::Strings,
        tables::{CodedIndex, CodedIndexType, RowReadable, TableId, TableInfo},
        token::Token,
    },
    Result,
};

/// A row of the TypeRef table, with heap indexes left unresolved
#[derive(Clone, Debug)]
pub struct TypeRefRaw {
    /// 1-based row id
    pub rid: u32,
    /// Token of this row
    pub token: Token,
    /// Offset of the row within the table data
    pub offset: usize,
    /// Where the type is defined: a Module, ModuleRef, AssemblyRef or enclosing TypeRef
    pub resolution_scope: CodedIndex,
    /// `#Strings` index of the type name
    pub type_name: u32,
    /// `#Strings` index of the namespace
    pub type_namespace: u32,
}

impl TypeRefRaw {
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
}

impl RowReadable for TypeRefRaw {
    const TABLE_ID: TableId = TableId::TypeRef;

    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfo) -> Result<Self> {
        Ok(TypeRefRaw {
            rid,
            token: Token::new(TableId::TypeRef.token_type() | rid),
            offset: *offset,
            resolution_scope: CodedIndex::read(
                data,
                offset,
                sizes,
                CodedIndexType::ResolutionScope,
            )?,
            type_name: read_le_at_dyn(data, offset, sizes.is_large_str())?,
            type_namespace: read_le_at_dyn(data, offset, sizes.is_large_str())?,
        })
    }
}
