use crate::{
    file::io::{read_le_at, read_le_at_dyn},
    metadata::{
        streams::Strings,
        tables::{RowReadable, TableId, TableInfo},
        token::Token,
    },
    Result,
};

/// A row of the Param table, with the name index left unresolved
#[derive(Clone, Debug)]
pub struct ParamRaw {
    /// 1-based row id
    pub rid: u32,
    /// Token of this row
    pub token: Token,
    /// Offset of the row within the table data
    pub offset: usize,
    /// `ParamAttributes` bitmask
    pub flags: u32,
    /// Position in the signature, 0 for the return value
    pub sequence: u32,
    /// `#Strings` index of the parameter name
    pub name: u32,
}

impl ParamRaw {
    /// Resolve the parameter name, empty for unnamed parameters
    ///
    /// # Errors
    /// Returns an error if the index does not address a valid string
    pub fn name<'a>(&self, strings: &Strings<'a>) -> Result<&'a str> {
        strings.get(self.name as usize)
    }
}

impl RowReadable for ParamRaw {
    const TABLE_ID: TableId = TableId::Param;

    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfo) -> Result<Self> {
        Ok(ParamRaw {
            rid,
            token: Token::new(TableId::Param.token_type() | rid),
            offset: *offset,
            flags: u32::from(read_le_at::<u16>(data, offset)?),
            sequence: u32::from(read_le_at::<u16>(data, offset)?),
            name: read_le_at_dyn(data, offset, sizes.is_large_str())?,
        })
    }
}
