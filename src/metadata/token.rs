//! Metadata tokens.
//!
//! A token is a 32-bit value whose top byte names a metadata table (or the `#US` heap) and
//! whose low 24 bits are a 1-based row number (or a heap byte offset).

use std::fmt;

/// Top byte of a token that refers into the `#US` heap
pub const USER_STRING_TABLE: u8 = 0x70;

/// A metadata token as found in CIL instruction operands and table rows
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Token(pub u32);

impl Token {
    /// Create a token from its raw value
    #[must_use]
    pub fn new(value: u32) -> Self {
        Token(value)
    }

    /// Create a token for `row` in the table `table`
    #[must_use]
    pub fn from_parts(table: u8, row: u32) -> Self {
        Token((u32::from(table) << 24) | (row & 0x00FF_FFFF))
    }

    /// The raw token value
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }

    /// The table (or heap) selector in the top byte
    #[must_use]
    pub fn table(&self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// The row number, or heap offset for user-string tokens
    #[must_use]
    pub fn row(&self) -> u32 {
        self.0 & 0x00FF_FFFF
    }

    /// Returns true if this token refers into the `#US` heap
    #[must_use]
    pub fn is_user_string(&self) -> bool {
        self.table() == USER_STRING_TABLE
    }

    /// Returns true for the all-zero token
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }
}

impl From<u32> for Token {
    fn from(value: u32) -> Self {
        Token(value)
    }
}

impl From<Token> for u32 {
    fn from(token: Token) -> Self {
        token.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Token(0x{:08x}, table: 0x{:02x}, row: {})",
            self.0,
            self.table(),
            self.row()
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parts() {
        let token = Token::new(0x0600_0001);
        assert_eq!(token.table(), 0x06);
        assert_eq!(token.row(), 1);
        assert!(!token.is_user_string());

        let token = Token(0x7000_0001);
        assert!(token.is_user_string());
        assert_eq!(token.row(), 1);

        assert_eq!(Token::from_parts(0x0A, 0x0D), Token(0x0A00_000D));
        assert_eq!(Token::from_parts(0x70, 0x0123_4567).row(), 0x23_4567);
        assert!(Token(0).is_null());
    }

    #[test]
    fn formatting() {
        let token = Token(0x7000_0001);
        assert_eq!(format!("{token}"), "0x70000001");
        assert_eq!(
            format!("{token:?}"),
            "Token(0x70000001, table: 0x70, row: 1)"
        );
        assert_eq!(u32::from(token), 0x7000_0001);
    }
}
