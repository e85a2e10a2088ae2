use bitflags::bitflags;

use crate::{
    file::io::{read_le_at, read_le_at_dyn},
    metadata::{
        streams::{Blob, Strings},
        tables::{RowReadable, TableId, TableInfo},
        token::Token,
    },
    Result,
};

/// Bitmask for `CodeTypeMask` extraction
pub const METHOD_IMPL_CODE_TYPE_MASK: u16 = 0x0003;

bitflags! {
    /// The `CodeTypeMask` field of `MethodImplAttributes`
    ///
    /// The field is a 2-bit value, not a set of flags: compare with `==`, since
    /// `RUNTIME.contains(NATIVE)` holds.
    #[derive(PartialEq, Eq, Debug, Clone, Copy)]
    pub struct MethodImplCodeType: u16 {
        /// Method impl is IL
        const IL = 0x0000;
        /// Method impl is native
        const NATIVE = 0x0001;
        /// Method impl is OPTIL
        const OPTIL = 0x0002;
        /// Method impl is provided by the runtime
        const RUNTIME = 0x0003;
    }
}

impl MethodImplCodeType {
    /// Extract the code type from raw implementation flags
    #[must_use]
    pub fn from_impl_flags(flags: u16) -> Self {
        Self::from_bits_truncate(flags & METHOD_IMPL_CODE_TYPE_MASK)
    }
}

bitflags! {
    /// `MethodImplAttributes` (ECMA-335 II.23.1.11) without the code type
    #[derive(PartialEq, Eq, Debug, Clone, Copy)]
    pub struct MethodImplFlags: u16 {
        /// Method is unmanaged
        const UNMANAGED = 0x0004;
        /// Method cannot be inlined
        const NO_INLINING = 0x0008;
        /// Method is defined, used in a forwarded reference
        const FORWARD_REF = 0x0010;
        /// Method is single-threaded through the body
        const SYNCHRONIZED = 0x0020;
        /// Method will not be optimized
        const NO_OPTIMIZATION = 0x0040;
        /// Method signature is not to be mangled for HRESULT conversion
        const PRESERVE_SIG = 0x0080;
        /// Method should be inlined if possible
        const AGGRESSIVE_INLINING = 0x0100;
        /// Reserved for internal use
        const INTERNAL_CALL = 0x1000;
    }
}

bitflags! {
    /// A subset of `MethodAttributes` (ECMA-335 II.23.1.10)
    #[derive(PartialEq, Eq, Debug, Clone, Copy)]
    pub struct MethodFlags: u16 {
        /// Defined on the type rather than per instance
        const STATIC = 0x0010;
        /// Cannot be overridden
        const FINAL = 0x0020;
        /// Virtual method
        const VIRTUAL = 0x0040;
        /// Method hides by name and signature
        const HIDE_BY_SIG = 0x0080;
        /// Method does not provide an implementation
        const ABSTRACT = 0x0400;
        /// Method is special, see the name
        const SPECIAL_NAME = 0x0800;
        /// Implementation is forwarded through PInvoke
        const PINVOKE_IMPL = 0x2000;
        /// Runtime should check the name encoding
        const RT_SPECIAL_NAME = 0x1000;
    }
}

/// A row of the MethodDef table, with heap and table indexes left unresolved
#[derive(Clone, Debug)]
pub struct MethodDefRaw {
    /// 1-based row id
    pub rid: u32,
    /// Token of this row
    pub token: Token,
    /// Offset of the row within the table data
    pub offset: usize,
    /// RVA of the method body, 0 if the method has none
    pub rva: u32,
    /// `MethodImplAttributes` bitmask
    pub impl_flags: u16,
    /// `MethodAttributes` bitmask
    pub flags: u16,
    /// `#Strings` index of the method name
    pub name: u32,
    /// `#Blob` index of the method signature
    pub signature: u32,
    /// First row of this method's run in the Param table
    pub param_list: u32,
}

impl MethodDefRaw {
    /// Resolve the method name
    ///
    /// # Errors
    /// Returns an error if the index does not address a valid string
    pub fn name<'a>(&self, strings: &Strings<'a>) -> Result<&'a str> {
        strings.get(self.name as usize)
    }

    /// The method signature blob
    ///
    /// # Errors
    /// Returns an error if the index does not address a valid blob
    pub fn signature<'a>(&self, blobs: &Blob<'a>) -> Result<&'a [u8]> {
        blobs.get(self.signature as usize)
    }

    /// Returns true if the row declares a CIL method body
    ///
    /// Native, OPTIL and runtime methods may carry a non-zero RVA, which never points at a CIL
    /// method header.
    #[must_use]
    pub fn has_body(&self) -> bool {
        self.rva != 0 && self.code_type() == MethodImplCodeType::IL
    }

    /// The code type of the implementation
    #[must_use]
    pub fn code_type(&self) -> MethodImplCodeType {
        MethodImplCodeType::from_impl_flags(self.impl_flags)
    }

    /// The implementation attributes, code type excluded
    #[must_use]
    pub fn impl_flags(&self) -> MethodImplFlags {
        MethodImplFlags::from_bits_retain(self.impl_flags & !METHOD_IMPL_CODE_TYPE_MASK)
    }

    /// The method attributes
    #[must_use]
    pub fn flags(&self) -> MethodFlags {
        MethodFlags::from_bits_retain(self.flags)
    }
}

impl RowReadable for MethodDefRaw {
    const TABLE_ID: TableId = TableId::MethodDef;

    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfo) -> Result<Self> {
        Ok(MethodDefRaw {
            rid,
            token: Token::new(TableId::MethodDef.token_type() | rid),
            offset: *offset,
            rva: read_le_at::<u32>(data, offset)?,
            impl_flags: read_le_at::<u16>(data, offset)?,
            flags: read_le_at::<u16>(data, offset)?,
            name: read_le_at_dyn(data, offset, sizes.is_large_str())?,
            signature: read_le_at_dyn(data, offset, sizes.is_large_blob())?,
            param_list: read_le_at_dyn(data, offset, sizes.is_large(TableId::Param))?,
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
            0x50, 0x20, 0x00, 0x00, // rva
            0x00, 0x00,             // impl_flags
            0x96, 0x00,             // flags
            0x21, 0x00,             // name
            0x0A, 0x00,             // signature
            0x01, 0x00,             // param_list

            0x00, 0x00, 0x00, 0x00, // rva
            0x03, 0x10,             // impl_flags
            0xC6, 0x05,             // flags
            0x26, 0x00,             // name
            0x01, 0x00,             // signature
            0x02, 0x00,             // param_list
        ];

        let sizes = TableInfo::new_test(
            &[(TableId::MethodDef, 2), (TableId::Param, 1)],
            false,
            false,
            false,
        );
        let table = MetadataTable::<MethodDefRaw>::new(&data, 2, &sizes).unwrap();
        assert_eq!(table.row_size(), 14);

        let main = table.get(1).unwrap();
        assert_eq!(main.token.value(), 0x06000001);
        assert_eq!(main.rva, 0x2050);
        assert!(main.has_body());
        assert_eq!(main.impl_flags, 0);
        assert_eq!(main.code_type(), MethodImplCodeType::IL);
        assert_eq!(main.flags, 0x0096);
        assert!(main.flags().contains(MethodFlags::STATIC | MethodFlags::HIDE_BY_SIG));
        assert_eq!(main.name, 0x21);
        assert_eq!(main.signature, 0x0A);
        assert_eq!(main.param_list, 1);

        let external = table.get(2).unwrap();
        assert_eq!(external.offset, 14);
        assert!(!external.has_body());
        assert_eq!(external.code_type(), MethodImplCodeType::RUNTIME);
        assert_eq!(external.impl_flags(), MethodImplFlags::INTERNAL_CALL);
        assert!(external.flags().contains(MethodFlags::ABSTRACT));
        assert!(table.get(3).is_none());
        assert!(table.get(0).is_none());
    }

    #[test]
    fn crafted_long() {
        #[rustfmt::skip]
        let data = vec![
            0x50, 0x20, 0x00, 0x00, // rva
            0x00, 0x00,             // impl_flags
            0x96, 0x00,             // flags
            0x21, 0x00, 0x01, 0x00, // name
            0x0A, 0x00, 0x02, 0x00, // signature
            0x01, 0x00, 0x03, 0x00, // param_list
        ];

        let sizes = TableInfo::new_test(
            &[(TableId::MethodDef, 1), (TableId::Param, 0x10000)],
            true,
            true,
            true,
        );
        let table = MetadataTable::<MethodDefRaw>::new(&data, 1, &sizes).unwrap();
        assert_eq!(table.row_size(), 20);

        let row = table.get(1).unwrap();
        assert_eq!(row.rva, 0x2050);
        assert_eq!(row.name, 0x00010021);
        assert_eq!(row.signature, 0x0002000A);
        assert_eq!(row.param_list, 0x00030001);
    }

    #[test]
    fn code_type() {
        assert_eq!(MethodImplCodeType::from_impl_flags(0x0000), MethodImplCodeType::IL);
        assert_eq!(MethodImplCodeType::from_impl_flags(0x0001), MethodImplCodeType::NATIVE);
        assert_eq!(MethodImplCodeType::from_impl_flags(0x0006), MethodImplCodeType::OPTIL);
        assert_eq!(MethodImplCodeType::from_impl_flags(0x1003), MethodImplCodeType::RUNTIME);

        let sizes = TableInfo::new_test(&[(TableId::MethodDef, 1)], false, false, false);
        #[rustfmt::skip]
        let data = [
            0x00, 0x30, 0x00, 0x00, // rva
            0x05, 0x00,             // impl_flags, native and unmanaged
            0x16, 0x20,             // flags
            0x00, 0x00, 0x00, 0x00, 0x01, 0x00,
        ];
        let table = MetadataTable::<MethodDefRaw>::new(&data, 1, &sizes).unwrap();
        let native = table.get(1).unwrap();
        assert_eq!(native.rva, 0x3000);
        assert_eq!(native.code_type(), MethodImplCodeType::NATIVE);
        assert_eq!(native.impl_flags(), MethodImplFlags::UNMANAGED);
        assert!(!native.has_body());
    }

    #[test]
    fn name() {
        let strings = Strings::from(b"\0Main\0").unwrap();
        let sizes = TableInfo::new_test(&[(TableId::MethodDef, 1)], false, false, false);

        #[rustfmt::skip]
        let data = [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x00];
        let table = MetadataTable::<MethodDefRaw>::new(&data, 1, &sizes).unwrap();
        assert_eq!(table.get(1).unwrap().name(&strings).unwrap(), "Main");
    }
}
