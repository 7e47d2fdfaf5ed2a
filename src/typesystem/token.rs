//! Identity tokens for types and conversion operators.
//!
//! Every entity registered in a [`crate::typesystem::TypeUniverse`] is addressed by a [`Token`].
//! Tokens follow the familiar metadata layout: the high byte names the table the entity
//! lives in, the low 24 bits are the row inside that table.
//!
//! | Table | Entities |
//! |-------|----------|
//! | [`Token::TYPE_DEF`] (`0x02`) | Declared types (primitives, classes, structs, interfaces, ...) |
//! | [`Token::TYPE_SPEC`] (`0x1B`) | Constructed types (optionals, arrays, generic instances) |
//! | [`Token::OPERATOR`] (`0x06`) | Declared user conversion operators |
//!
//! Two descriptors denote the same type if and only if their tokens are equal, which is what
//! the identity rule of the classifier relies on.

use std::fmt;

/// A token identifying a type or operator inside a type universe.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Token(pub u32);

impl Token {
    /// Table byte for declared types
    pub const TYPE_DEF: u8 = 0x02;
    /// Table byte for declared conversion operators
    pub const OPERATOR: u8 = 0x06;
    /// Table byte for constructed types
    pub const TYPE_SPEC: u8 = 0x1B;

    /// Creates a new token from a raw 32-bit value
    #[must_use]
    pub fn new(value: u32) -> Self {
        Token(value)
    }

    /// Creates a token from a table byte and a row index
    #[must_use]
    pub fn from_parts(table: u8, row: u32) -> Self {
        Token((u32::from(table) << 24) | (row & 0x00FF_FFFF))
    }

    /// Returns the raw token value
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Extracts the table type from the token (high byte)
    #[must_use]
    pub fn table(&self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Extracts the row index from the token (low 24 bits)
    #[must_use]
    pub fn row(&self) -> u32 {
        self.0 & 0x00FF_FFFF
    }

    /// Returns true if this is a null token (value 0)
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// Returns true if the token addresses a constructed type
    #[must_use]
    pub fn is_constructed(&self) -> bool {
        self.table() == Self::TYPE_SPEC
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
