use std::fmt;

use crate::{disassembler::OpcodeInfo, metadata::token::Token};

/// The decoded operand of an instruction
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// The instruction takes no operand
    None,
    /// An integer immediate or an argument/local index
    Immediate(i64),
    /// A floating point immediate
    Float(f64),
    /// A metadata token
    Token(Token),
    /// A branch offset relative to the next instruction
    Target(i32),
    /// The branch offsets of a `switch` table
    Switch(Vec<i32>),
}

/// A single decoded CIL instruction
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    /// Offset of the first opcode byte within the decoded code
    pub offset: usize,
    /// Total size, opcode and operand
    pub size: usize,
    /// The opcode table entry
    pub info: OpcodeInfo,
    /// The operand
    pub operand: Operand,
}

impl Instruction {
    /// The ILAsm mnemonic
    #[must_use]
    pub fn mnemonic(&self) -> &'static str {
        self.info.mnemonic
    }

    /// The token operand, if the instruction carries one
    #[must_use]
    pub fn token(&self) -> Option<Token> {
        match self.operand {
            Operand::Token(token) => Some(token),
            _ => None,
        }
    }

    /// Offset of the instruction that follows this one
    #[must_use]
    pub fn next_offset(&self) -> usize {
        self.offset + self.size
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IL_{:04x}: {}", self.offset, self.info.mnemonic)?;

        match &self.operand {
            Operand::None => Ok(()),
            Operand::Immediate(value) => write!(f, " {value}"),
            Operand::Float(value) => write!(f, " {value}"),
            Operand::Token(token) => write!(f, " {:#010x}", token.value()),
            Operand::Target(delta) => write!(
                f,
                " IL_{:04x}",
                (self.next_offset() as i64).wrapping_add(i64::from(*delta))
            ),
            Operand::Switch(targets) => write!(f, " ({} targets)", targets.len()),
        }
    }
}
