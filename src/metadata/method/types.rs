//! Method header flags (ECMA-335 II.25.4).

use bitflags::bitflags;

/// Mask of the two low bits selecting the header format
pub const METHOD_HEADER_FORMAT_MASK: u8 = 0b11;

/// Size of a fat method header in bytes
pub const FAT_HEADER_SIZE: usize = 12;

bitflags! {
    #[derive(PartialEq, Eq, Debug, Clone, Copy)]
    /// Flags that a method header can have
    pub struct MethodBodyFlags: u16 {
        /// Tiny method header format
        const TINY_FORMAT = 0x2;
        /// Fat method header format
        const FAT_FORMAT = 0x3;
        /// Fat header only, more data sections follow the code
        const MORE_SECTS = 0x8;
        /// Fat header only, locals are zero-initialized
        const INIT_LOCALS = 0x10;
    }
}
