//! CIL instruction decoding.
//!
//! The decoder walks method code linearly with a complete opcode table, one-byte opcodes and
//! the `0xFE`-prefixed set, so that every operand is stepped over and decoding stays on
//! instruction boundaries.
//!
//! # Key Types
//! - [`OpcodeInfo`] - mnemonic and operand kind of a defined opcode
//! - [`Instruction`] - a decoded instruction with its operand
//! - [`LdstrSite`] - an `ldstr` found by [`scan_ldstr`]
//!
//! # Main Functions
//! - [`decode_instruction`] - decode a single instruction
//! - [`decode_stream`] - decode a whole code buffer
//! - [`scan_ldstr`] - collect the `ldstr` instructions of a code buffer
//!
//! # Example
//! ```rust
//! use dotredact::disassembler::scan_ldstr;
//!
//! let code = [0x00, 0x72, 0x01, 0x00, 0x00, 0x70, 0x2A]; // nop, ldstr, ret
//! let sites = scan_ldstr(&code)?;
//! assert_eq!(sites[0].offset, 1);
//! assert_eq!(sites[0].token.value(), 0x7000_0001);
//! # Ok::<(), dotredact::Error>(())
//! ```

mod decoder;
mod instruction;
mod opcodes;

pub use decoder::{decode_instruction, decode_stream, scan_ldstr, LdstrSite};
pub use instruction::{Instruction, Operand};
pub use opcodes::*;
