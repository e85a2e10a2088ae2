use crate::{
    file::io::{read_le_at, read_le_at_dyn},
    metadata::{
        streams::{Guid, Strings},
        tables::{RowReadable, TableId, TableInfo},
        token::Token,
    },
    Result,
};

/// A row of the Module table, with heap indexes left unresolved
#[derive(Clone, Debug)]
pub struct ModuleRaw {
    /// 1-based row id
    pub rid: u32,
    /// Token of this row
    pub token: Token,
    /// Offset of the row within the table data
    pub offset: usize,
    /// Reserved, shall be zero
    pub generation: u32,
    /// `#Strings` index of the module name
    pub name: u32,
    /// `#GUID` index of the module version id
    pub mvid: u32,
    /// `#GUID` index, reserved
    pub encid: u32,
    /// `#GUID` index, reserved
    pub encbaseid: u32,
}

impl ModuleRaw {
    /// Resolve the module name
    ///
    /// # Errors
    /// Returns an error if the index does not address a valid string
    pub fn name<'a>(&self, strings: &Strings<'a>) -> Result<&'a str> {
        strings.get(self.name as usize)
    }

    /// Resolve the module version id
    ///
    /// # Errors
    /// Returns an error if the index is past the end of the `#GUID` heap
    pub fn mvid(&self, guids: &Guid) -> Result<uguid::Guid> {
        guids.get(self.mvid as usize)
    }
}

impl RowReadable for ModuleRaw {
    const TABLE_ID: TableId = TableId::Module;

    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfo) -> Result<Self> {
        Ok(ModuleRaw {
            rid,
            token: Token::new(TableId::Module.token_type() | rid),
            offset: *offset,
            generation: u32::from(read_le_at::<u16>(data, offset)?),
            name: read_le_at_dyn(data, offset, sizes.is_large_str())?,
            mvid: read_le_at_dyn(data, offset, sizes.is_large_guid())?,
            encid: read_le_at_dyn(data, offset, sizes.is_large_guid())?,
            encbaseid: read_le_at_dyn(data, offset, sizes.is_large_guid())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::tables::MetadataTable;

    #[test]
    fn crafted_short() {
        #[rustfmt::skip]
        let data = vec![
            0x01, 0x01, // generation
            0x02, 0x02, // name
            0x03, 0x03, // mvid
            0x04, 0x04, // encid
            0x05, 0x05, // encbaseid
        ];

        let sizes = TableInfo::new_test(&[(TableId::Module, 1)], false, false, false);
        let table = MetadataTable::<ModuleRaw>::new(&data, 1, &sizes).unwrap();
        assert_eq!(table.row_size(), 10);

        let row = table.get(1).unwrap();
        assert_eq!(row.rid, 1);
        assert_eq!(row.token.value(), 0x00000001);
        assert_eq!(row.offset, 0);
        assert_eq!(row.generation, 0x0101);
        assert_eq!(row.name, 0x0202);
        assert_eq!(row.mvid, 0x0303);
        assert_eq!(row.encid, 0x0404);
        assert_eq!(row.encbaseid, 0x0505);
    }

    #[test]
    fn crafted_long() {
        #[rustfmt::skip]
        let data = vec![
            0x01, 0x01,             // generation
            0x02, 0x02, 0x02, 0x02, // name
            0x03, 0x03, 0x03, 0x03, // mvid
            0x04, 0x04, 0x04, 0x04, // encid
            0x05, 0x05, 0x05, 0x05, // encbaseid
        ];

        let sizes = TableInfo::new_test(&[(TableId::Module, 1)], true, true, true);
        let table = MetadataTable::<ModuleRaw>::new(&data, 1, &sizes).unwrap();
        assert_eq!(table.row_size(), 18);

        let row = table.get(1).unwrap();
        assert_eq!(row.generation, 0x0101);
        assert_eq!(row.name, 0x02020202);
        assert_eq!(row.mvid, 0x03030303);
        assert_eq!(row.encid, 0x04040404);
        assert_eq!(row.encbaseid, 0x05050505);
    }

    #[test]
    fn truncated() {
        let data = [0x00, 0x00, 0x01, 0x00, 0x01];
        let sizes = TableInfo::new_test(&[(TableId::Module, 1)], false, false, false);
        assert!(MetadataTable::<ModuleRaw>::new(&data, 1, &sizes).is_err());
    }
}
