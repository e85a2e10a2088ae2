//! Linear decoding of CIL instruction streams.
//!
//! Instructions are decoded front to back, using the opcode table to step over every operand.
//! Staying aligned on instruction boundaries is what makes the `ldstr` scan trustworthy: a
//! `0x72` byte inside another instruction's operand is never mistaken for an opcode.
//!
//! # Example
//!
//! ```rust
//! use dotredact::{disassembler::decode_stream, Parser};
//!
//! let code = [0x72, 0x01, 0x00, 0x00, 0x70, 0x2A]; // ldstr, ret
//! let mut parser = Parser::new(&code);
//! let instructions = decode_stream(&mut parser)?;
//!
//! assert_eq!(instructions.len(), 2);
//! assert_eq!(instructions[0].mnemonic(), "ldstr");
//! # Ok::<(), dotredact::Error>(())
//! ```

use crate::{
    disassembler::{
        opcode, opcode_fe, Instruction, Operand, OperandType, OPCODE_LDSTR, OPCODE_PREFIX_FE,
    },
    file::parser::Parser,
    metadata::token::Token,
    Result,
};

/// Size of the `switch` case count and of each of its targets
const SWITCH_ENTRY_SIZE: usize = 4;

/// An `ldstr` instruction found in a code stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LdstrSite {
    /// Offset of the `ldstr` opcode within the code
    pub offset: usize,
    /// The string token operand
    pub token: Token,
}

/// Decode the instruction at the parser position and advance past it
///
/// # Errors
/// Returns [`crate::Error::Malformed`] for an undefined opcode, and
/// [`crate::Error::OutOfBounds`] if the opcode or its operand is cut off by the end of the data
pub fn decode_instruction(parser: &mut Parser) -> Result<Instruction> {
    let offset = parser.pos();
    let first_byte = parser.read_le::<u8>()?;

    let info = if first_byte == OPCODE_PREFIX_FE {
        let second_byte = parser.read_le::<u8>()?;
        match opcode_fe(second_byte) {
            Some(info) => info,
            None => {
                return Err(malformed_error!(
                    "Undefined opcode FE {:02X} at offset {:#x}",
                    second_byte,
                    offset
                ))
            }
        }
    } else {
        match opcode(first_byte) {
            Some(info) => info,
            None => {
                return Err(malformed_error!(
                    "Undefined opcode {:02X} at offset {:#x}",
                    first_byte,
                    offset
                ))
            }
        }
    };

    let operand = match info.operand {
        OperandType::None => Operand::None,
        OperandType::Int8 => Operand::Immediate(i64::from(parser.read_le::<i8>()?)),
        OperandType::UInt8 => Operand::Immediate(i64::from(parser.read_le::<u8>()?)),
        OperandType::UInt16 => Operand::Immediate(i64::from(parser.read_le::<u16>()?)),
        OperandType::Int32 => Operand::Immediate(i64::from(parser.read_le::<i32>()?)),
        OperandType::Int64 => Operand::Immediate(parser.read_le::<i64>()?),
        OperandType::Float32 => {
            Operand::Float(f64::from(f32::from_bits(parser.read_le::<u32>()?)))
        }
        OperandType::Float64 => Operand::Float(f64::from_bits(parser.read_le::<u64>()?)),
        OperandType::Token => Operand::Token(Token::new(parser.read_le::<u32>()?)),
        OperandType::BranchTarget8 => Operand::Target(i32::from(parser.read_le::<i8>()?)),
        OperandType::BranchTarget32 => Operand::Target(parser.read_le::<i32>()?),
        OperandType::Switch => {
            let case_count = parser.read_le::<u32>()? as usize;
            let table_size = case_count
                .checked_mul(SWITCH_ENTRY_SIZE)
                .ok_or_else(|| out_of_bounds_error!(parser.pos(), usize::MAX, parser.len()))?;
            parser.ensure_remaining(table_size)?;

            let mut targets = Vec::with_capacity(case_count);
            for _ in 0..case_count {
                targets.push(parser.read_le::<i32>()?);
            }

            Operand::Switch(targets)
        }
    };

    Ok(Instruction {
        offset,
        size: parser.pos() - offset,
        info,
        operand,
    })
}

/// Decode every instruction from the parser position to the end of the data
///
/// # Errors
/// Returns the first error of [`decode_instruction`]
pub fn decode_stream(parser: &mut Parser) -> Result<Vec<Instruction>> {
    let mut instructions = Vec::new();

    while parser.has_more_data() {
        instructions.push(decode_instruction(parser)?);
    }

    Ok(instructions)
}

/// Find every `ldstr` instruction in `code`
///
/// The whole code is decoded. Operands are skipped rather than materialized, except for the
/// `ldstr` tokens themselves.
///
/// # Errors
/// Returns [`crate::Error::Malformed`] for an undefined opcode and
/// [`crate::Error::OutOfBounds`] for an operand cut off by the end of the code
pub fn scan_ldstr(code: &[u8]) -> Result<Vec<LdstrSite>> {
    let mut parser = Parser::new(code);
    let mut sites = Vec::new();

    while parser.has_more_data() {
        let offset = parser.pos();
        let first_byte = parser.peek_byte()?;

        if first_byte == OPCODE_LDSTR {
            parser.advance_by(1)?;
            sites.push(LdstrSite {
                offset,
                token: Token::new(parser.read_le::<u32>()?),
            });
            continue;
        }

        let info = if first_byte == OPCODE_PREFIX_FE {
            parser.advance_by(1)?;
            opcode_fe(parser.read_le::<u8>()?)
        } else {
            parser.advance_by(1)?;
            opcode(first_byte)
        };

        let Some(info) = info else {
            // Undefined opcodes get their diagnostics from the full decoder
            parser.seek(offset)?;
            decode_instruction(&mut parser)?;
            continue;
        };

        match info.operand.size() {
            Some(size) => parser.advance_by(size)?,
            None => {
                let case_count = parser.read_le::<u32>()? as usize;
                let table_size = case_count
                    .checked_mul(SWITCH_ENTRY_SIZE)
                    .ok_or_else(|| out_of_bounds_error!(parser.pos(), usize::MAX, code.len()))?;
                parser.advance_by(table_size)?;
            }
        }
    }

    Ok(sites)
}
