//! The CIL opcode table (ECMA-335 III.1.2).
//!
//! Opcodes are one byte, or two bytes when prefixed with `0xFE`. Each defined opcode maps to
//! its mnemonic and the kind of operand that follows it, which fixes the operand size for
//! everything except `switch`.

/// Prefix byte of the two-byte opcodes
pub const OPCODE_PREFIX_FE: u8 = 0xFE;

/// Opcode of `ldstr`
pub const OPCODE_LDSTR: u8 = 0x72;

/// Opcode of `switch`
pub const OPCODE_SWITCH: u8 = 0x45;

/// The kind of operand following an opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandType {
    /// No operand
    None,
    /// Signed 8-bit immediate
    Int8,
    /// Unsigned 8-bit immediate, usually an argument or local index
    UInt8,
    /// Unsigned 16-bit immediate, usually an argument or local index
    UInt16,
    /// Signed 32-bit immediate
    Int32,
    /// Signed 64-bit immediate
    Int64,
    /// 32-bit IEEE float
    Float32,
    /// 64-bit IEEE float
    Float64,
    /// Metadata token
    Token,
    /// Signed 8-bit branch offset
    BranchTarget8,
    /// Signed 32-bit branch offset
    BranchTarget32,
    /// A u32 count followed by that many signed 32-bit branch offsets
    Switch,
}

impl OperandType {
    /// Operand size in bytes, `None` for the variable-length `switch` table
    #[must_use]
    pub fn size(self) -> Option<usize> {
        match self {
            OperandType::None => Some(0),
            OperandType::Int8 | OperandType::UInt8 | OperandType::BranchTarget8 => Some(1),
            OperandType::UInt16 => Some(2),
            OperandType::Int32
            | OperandType::Float32
            | OperandType::Token
            | OperandType::BranchTarget32 => Some(4),
            OperandType::Int64 | OperandType::Float64 => Some(8),
            OperandType::Switch => None,
        }
    }
}

/// Static information on one defined opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeInfo {
    /// `0xFE` for two-byte opcodes, 0 otherwise
    pub prefix: u8,
    /// The opcode byte, the second byte for two-byte opcodes
    pub opcode: u8,
    /// The ILAsm mnemonic
    pub mnemonic: &'static str,
    /// The operand following the opcode
    pub operand: OperandType,
}

impl OpcodeInfo {
    /// Number of bytes taken by the opcode itself
    #[must_use]
    pub fn opcode_len(&self) -> usize {
        if self.prefix == OPCODE_PREFIX_FE {
            2
        } else {
            1
        }
    }
}

/// Look up a one-byte opcode
///
/// Returns `None` for undefined opcodes and for the `0xFE` prefix itself.
#[must_use]
pub fn opcode(value: u8) -> Option<OpcodeInfo> {
    use OperandType::{
        BranchTarget32 as Br32, BranchTarget8 as Br8, Float32, Float64, Int32, Int64, Int8,
        None as No, Switch, Token as Tok, UInt8,
    };

    let (mnemonic, operand) = match value {
        0x00 => ("nop", No),
        0x01 => ("break", No),
        0x02 => ("ldarg.0", No),
        0x03 => ("ldarg.1", No),
        0x04 => ("ldarg.2", No),
        0x05 => ("ldarg.3", No),
        0x06 => ("ldloc.0", No),
        0x07 => ("ldloc.1", No),
        0x08 => ("ldloc.2", No),
        0x09 => ("ldloc.3", No),
        0x0A => ("stloc.0", No),
        0x0B => ("stloc.1", No),
        0x0C => ("stloc.2", No),
        0x0D => ("stloc.3", No),
        0x0E => ("ldarg.s", UInt8),
        0x0F => ("ldarga.s", UInt8),
        0x10 => ("starg.s", UInt8),
        0x11 => ("ldloc.s", UInt8),
        0x12 => ("ldloca.s", UInt8),
        0x13 => ("stloc.s", UInt8),
        0x14 => ("ldnull", No),
        0x15 => ("ldc.i4.m1", No),
        0x16 => ("ldc.i4.0", No),
        0x17 => ("ldc.i4.1", No),
        0x18 => ("ldc.i4.2", No),
        0x19 => ("ldc.i4.3", No),
        0x1A => ("ldc.i4.4", No),
        0x1B => ("ldc.i4.5", No),
        0x1C => ("ldc.i4.6", No),
        0x1D => ("ldc.i4.7", No),
        0x1E => ("ldc.i4.8", No),
        0x1F => ("ldc.i4.s", Int8),
        0x20 => ("ldc.i4", Int32),
        0x21 => ("ldc.i8", Int64),
        0x22 => ("ldc.r4", Float32),
        0x23 => ("ldc.r8", Float64),
        0x25 => ("dup", No),
        0x26 => ("pop", No),
        0x27 => ("jmp", Tok),
        0x28 => ("call", Tok),
        0x29 => ("calli", Tok),
        0x2A => ("ret", No),
        0x2B => ("br.s", Br8),
        0x2C => ("brfalse.s", Br8),
        0x2D => ("brtrue.s", Br8),
        0x2E => ("beq.s", Br8),
        0x2F => ("bge.s", Br8),
        0x30 => ("bgt.s", Br8),
        0x31 => ("ble.s", Br8),
        0x32 => ("blt.s", Br8),
        0x33 => ("bne.un.s", Br8),
        0x34 => ("bge.un.s", Br8),
        0x35 => ("bgt.un.s", Br8),
        0x36 => ("ble.un.s", Br8),
        0x37 => ("blt.un.s", Br8),
        0x38 => ("br", Br32),
        0x39 => ("brfalse", Br32),
        0x3A => ("brtrue", Br32),
        0x3B => ("beq", Br32),
        0x3C => ("bge", Br32),
        0x3D => ("bgt", Br32),
        0x3E => ("ble", Br32),
        0x3F => ("blt", Br32),
        0x40 => ("bne.un", Br32),
        0x41 => ("bge.un", Br32),
        0x42 => ("bgt.un", Br32),
        0x43 => ("ble.un", Br32),
        0x44 => ("blt.un", Br32),
        0x45 => ("switch", Switch),
        0x46 => ("ldind.i1", No),
        0x47 => ("ldind.u1", No),
        0x48 => ("ldind.i2", No),
        0x49 => ("ldind.u2", No),
        0x4A => ("ldind.i4", No),
        0x4B => ("ldind.u4", No),
        0x4C => ("ldind.i8", No),
        0x4D => ("ldind.i", No),
        0x4E => ("ldind.r4", No),
        0x4F => ("ldind.r8", No),
        0x50 => ("ldind.ref", No),
        0x51 => ("stind.ref", No),
        0x52 => ("stind.i1", No),
        0x53 => ("stind.i2", No),
        0x54 => ("stind.i4", No),
        0x55 => ("stind.i8", No),
        0x56 => ("stind.r4", No),
        0x57 => ("stind.r8", No),
        0x58 => ("add", No),
        0x59 => ("sub", No),
        0x5A => ("mul", No),
        0x5B => ("div", No),
        0x5C => ("div.un", No),
        0x5D => ("rem", No),
        0x5E => ("rem.un", No),
        0x5F => ("and", No),
        0x60 => ("or", No),
        0x61 => ("xor", No),
        0x62 => ("shl", No),
        0x63 => ("shr", No),
        0x64 => ("shr.un", No),
        0x65 => ("neg", No),
        0x66 => ("not", No),
        0x67 => ("conv.i1", No),
        0x68 => ("conv.i2", No),
        0x69 => ("conv.i4", No),
        0x6A => ("conv.i8", No),
        0x6B => ("conv.r4", No),
        0x6C => ("conv.r8", No),
        0x6D => ("conv.u4", No),
        0x6E => ("conv.u8", No),
        0x6F => ("callvirt", Tok),
        0x70 => ("cpobj", Tok),
        0x71 => ("ldobj", Tok),
        0x72 => ("ldstr", Tok),
        0x73 => ("newobj", Tok),
        0x74 => ("castclass", Tok),
        0x75 => ("isinst", Tok),
        0x76 => ("conv.r.un", No),
        0x79 => ("unbox", Tok),
        0x7A => ("throw", No),
        0x7B => ("ldfld", Tok),
        0x7C => ("ldflda", Tok),
        0x7D => ("stfld", Tok),
        0x7E => ("ldsfld", Tok),
        0x7F => ("ldsflda", Tok),
        0x80 => ("stsfld", Tok),
        0x81 => ("stobj", Tok),
        0x82 => ("conv.ovf.i1.un", No),
        0x83 => ("conv.ovf.i2.un", No),
        0x84 => ("conv.ovf.i4.un", No),
        0x85 => ("conv.ovf.i8.un", No),
        0x86 => ("conv.ovf.u1.un", No),
        0x87 => ("conv.ovf.u2.un", No),
        0x88 => ("conv.ovf.u4.un", No),
        0x89 => ("conv.ovf.u8.un", No),
        0x8A => ("conv.ovf.i.un", No),
        0x8B => ("conv.ovf.u.un", No),
        0x8C => ("box", Tok),
        0x8D => ("newarr", Tok),
        0x8E => ("ldlen", No),
        0x8F => ("ldelema", Tok),
        0x90 => ("ldelem.i1", No),
        0x91 => ("ldelem.u1", No),
        0x92 => ("ldelem.i2", No),
        0x93 => ("ldelem.u2", No),
        0x94 => ("ldelem.i4", No),
        0x95 => ("ldelem.u4", No),
        0x96 => ("ldelem.i8", No),
        0x97 => ("ldelem.i", No),
        0x98 => ("ldelem.r4", No),
        0x99 => ("ldelem.r8", No),
        0x9A => ("ldelem.ref", No),
        0x9B => ("stelem.i", No),
        0x9C => ("stelem.i1", No),
        0x9D => ("stelem.i2", No),
        0x9E => ("stelem.i4", No),
        0x9F => ("stelem.i8", No),
        0xA0 => ("stelem.r4", No),
        0xA1 => ("stelem.r8", No),
        0xA2 => ("stelem.ref", No),
        0xA3 => ("ldelem", Tok),
        0xA4 => ("stelem", Tok),
        0xA5 => ("unbox.any", Tok),
        0xB3 => ("conv.ovf.i1", No),
        0xB4 => ("conv.ovf.u1", No),
        0xB5 => ("conv.ovf.i2", No),
        0xB6 => ("conv.ovf.u2", No),
        0xB7 => ("conv.ovf.i4", No),
        0xB8 => ("conv.ovf.u4", No),
        0xB9 => ("conv.ovf.i8", No),
        0xBA => ("conv.ovf.u8", No),
        0xC2 => ("refanyval", Tok),
        0xC3 => ("ckfinite", No),
        0xC6 => ("mkrefany", Tok),
        0xD0 => ("ldtoken", Tok),
        0xD1 => ("conv.u2", No),
        0xD2 => ("conv.u1", No),
        0xD3 => ("conv.i", No),
        0xD4 => ("conv.ovf.i", No),
        0xD5 => ("conv.ovf.u", No),
        0xD6 => ("add.ovf", No),
        0xD7 => ("add.ovf.un", No),
        0xD8 => ("mul.ovf", No),
        0xD9 => ("mul.ovf.un", No),
        0xDA => ("sub.ovf", No),
        0xDB => ("sub.ovf.un", No),
        0xDC => ("endfinally", No),
        0xDD => ("leave", Br32),
        0xDE => ("leave.s", Br8),
        0xDF => ("stind.i", No),
        0xE0 => ("conv.u", No),
        _ => return None,
    };

    Some(OpcodeInfo {
        prefix: 0,
        opcode: value,
        mnemonic,
        operand,
    })
}

/// Look up a two-byte opcode by the byte following the `0xFE` prefix
#[must_use]
pub fn opcode_fe(value: u8) -> Option<OpcodeInfo> {
    use OperandType::{None as No, Token as Tok, UInt16, UInt8};

    let (mnemonic, operand) = match value {
        0x00 => ("arglist", No),
        0x01 => ("ceq", No),
        0x02 => ("cgt", No),
        0x03 => ("cgt.un", No),
        0x04 => ("clt", No),
        0x05 => ("clt.un", No),
        0x06 => ("ldftn", Tok),
        0x07 => ("ldvirtftn", Tok),
        0x09 => ("ldarg", UInt16),
        0x0A => ("ldarga", UInt16),
        0x0B => ("starg", UInt16),
        0x0C => ("ldloc", UInt16),
        0x0D => ("ldloca", UInt16),
        0x0E => ("stloc", UInt16),
        0x0F => ("localloc", No),
        0x11 => ("endfilter", No),
        0x12 => ("unaligned.", UInt8),
        0x13 => ("volatile.", No),
        0x14 => ("tail.", No),
        0x15 => ("initobj", Tok),
        0x16 => ("constrained.", Tok),
        0x17 => ("cpblk", No),
        0x18 => ("initblk", No),
        0x19 => ("no.", UInt8),
        0x1A => ("rethrow", No),
        0x1C => ("sizeof", Tok),
        0x1D => ("refanytype", No),
        0x1E => ("readonly.", No),
        _ => return None,
    };

    Some(OpcodeInfo {
        prefix: OPCODE_PREFIX_FE,
        opcode: value,
        mnemonic,
        operand,
    })
}
