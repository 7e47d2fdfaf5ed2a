//! The numeric conversion table.
//!
//! For every ordered pair of [`NumericKind`]s this module decides whether the conversion is
//! the identity, an implicit (widening) conversion or an explicit (narrowing) one, and which
//! low-level cast performs it. The table is total: there is no pair without an outcome.
//!
//! # Implicit Conversions
//!
//! | From | To |
//! |------|----|
//! | `SByte` | `Int16`, `Int32`, `Int64`, `Single`, `Double`, `Decimal` |
//! | `Byte` | `Int16`, `UInt16`, `Int32`, `UInt32`, `Int64`, `UInt64`, `Char`, `Single`, `Double`, `Decimal` |
//! | `Int16` | `Int32`, `Int64`, `Single`, `Double`, `Decimal` |
//! | `UInt16` | `Int32`, `UInt32`, `Int64`, `UInt64`, `Char`, `Single`, `Double`, `Decimal` |
//! | `Int32` | `Int64`, `Single`, `Double`, `Decimal` |
//! | `UInt32` | `Int64`, `UInt64`, `Single`, `Double`, `Decimal` |
//! | `Int64`, `UInt64` | `Single`, `Double`, `Decimal` |
//! | `Char` | `UInt16`, `Int32`, `UInt32`, `Int64`, `UInt64`, `Single`, `Double`, `Decimal` |
//! | `Single` | `Double` |
//!
//! Every other off-diagonal pair is explicit. Because `Char` and `UInt16` convert implicitly
//! into each other, the implicit relation is a preorder rather than a strict partial order.

use std::fmt;

use crate::typesystem::NumericKind;

/// How two numeric kinds relate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NumericRelation {
    /// Same kind
    Identity,
    /// Widening, never loses information about magnitude
    Implicit,
    /// Narrowing or sign-changing, may lose information
    Explicit,
}

/// The low-level operation performing a numeric conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CastOp {
    /// No operation
    Identity,
    /// Widen a signed integer, replicating the sign bit
    SignExtend,
    /// Widen an unsigned integer, filling with zeros
    ZeroExtend,
    /// Same width, reinterpret the bits with the other signedness
    Reinterpret,
    /// Keep the low bits of a wider integer
    Truncate,
    /// Integer to floating point
    IntToFloat {
        /// The source is treated as unsigned (`conv.r.un`)
        unsigned_source: bool,
    },
    /// Floating point to integer, rounding toward zero
    FloatToInt,
    /// `Single` to `Double`
    FloatWiden,
    /// `Double` to `Single`, rounding to nearest
    FloatNarrow,
    /// Integer to decimal, exact
    IntToDecimal,
    /// Floating point to decimal, rounding to the float's significant digits
    FloatToDecimal,
    /// Decimal to integer, truncating toward zero
    DecimalToInt,
    /// Decimal to floating point, rounding to nearest
    DecimalToFloat,
}

/// A concrete numeric cast between two kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NumericCast {
    /// Source kind
    pub from: NumericKind,
    /// Target kind
    pub to: NumericKind,
    /// Operation performing the cast
    pub op: CastOp,
}

impl NumericCast {
    /// Determine the cast between two kinds
    #[must_use]
    pub fn new(from: NumericKind, to: NumericKind) -> Self {
        NumericCast {
            from,
            to,
            op: cast_op(from, to),
        }
    }

    /// Check if some source value falls outside the target range, so that a checked
    /// conversion can fail
    #[must_use]
    pub fn can_overflow(&self) -> bool {
        match self.op {
            CastOp::Identity
            | CastOp::ZeroExtend
            | CastOp::IntToFloat { .. }
            | CastOp::FloatWiden
            | CastOp::FloatNarrow
            | CastOp::IntToDecimal
            | CastOp::DecimalToFloat => false,
            CastOp::SignExtend | CastOp::Reinterpret | CastOp::Truncate => {
                match (self.from.integral_range(), self.to.integral_range()) {
                    (Some((from_min, from_max)), Some((to_min, to_max))) => {
                        from_min < to_min || from_max > to_max
                    }
                    _ => true,
                }
            }
            CastOp::FloatToInt | CastOp::FloatToDecimal | CastOp::DecimalToInt => true,
        }
    }

    /// The CLR instruction sequence performing this cast, with or without overflow checking
    #[must_use]
    pub fn mnemonic(&self, checked: bool) -> String {
        let to = self.to.instruction_suffix();
        match self.op {
            CastOp::Identity => "nop".to_string(),
            CastOp::SignExtend | CastOp::ZeroExtend | CastOp::Reinterpret | CastOp::Truncate => {
                if checked && self.can_overflow() {
                    let un = if self.from.is_unsigned_integral() { ".un" } else { "" };
                    format!("conv.ovf.{to}{un}")
                } else {
                    format!("conv.{to}")
                }
            }
            CastOp::IntToFloat {
                unsigned_source: true,
            } => format!("conv.r.un; conv.{to}"),
            CastOp::IntToFloat {
                unsigned_source: false,
            }
            | CastOp::FloatWiden
            | CastOp::FloatNarrow => format!("conv.{to}"),
            CastOp::FloatToInt => {
                if checked {
                    format!("conv.ovf.{to}")
                } else {
                    format!("conv.{to}")
                }
            }
            CastOp::IntToDecimal => "call System.Decimal::op_Implicit".to_string(),
            CastOp::FloatToDecimal | CastOp::DecimalToInt | CastOp::DecimalToFloat => {
                "call System.Decimal::op_Explicit".to_string()
            }
        }
    }
}

impl fmt::Display for NumericCast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} ({})", self.from, self.to, self.mnemonic(true))
    }
}

/// Result of a numeric table lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NumericConversion {
    /// Identity, implicit or explicit
    pub relation: NumericRelation,
    /// The cast to perform
    pub cast: NumericCast,
}

/// Look up the conversion between two numeric kinds
#[must_use]
pub fn numeric_conversion(from: NumericKind, to: NumericKind) -> NumericConversion {
    let relation = if from == to {
        NumericRelation::Identity
    } else if is_implicit_numeric(from, to) {
        NumericRelation::Implicit
    } else {
        NumericRelation::Explicit
    };

    NumericConversion {
        relation,
        cast: NumericCast::new(from, to),
    }
}

/// Check if `from` widens implicitly to `to` (false on the diagonal)
#[must_use]
pub fn is_implicit_numeric(from: NumericKind, to: NumericKind) -> bool {
    use NumericKind::{Char, Decimal, I1, I2, I4, I8, R4, R8, U1, U2, U4, U8};

    match from {
        I1 => matches!(to, I2 | I4 | I8 | R4 | R8 | Decimal),
        U1 => matches!(to, I2 | U2 | I4 | U4 | I8 | U8 | Char | R4 | R8 | Decimal),
        I2 => matches!(to, I4 | I8 | R4 | R8 | Decimal),
        U2 => matches!(to, I4 | U4 | I8 | U8 | Char | R4 | R8 | Decimal),
        I4 => matches!(to, I8 | R4 | R8 | Decimal),
        U4 => matches!(to, I8 | U8 | R4 | R8 | Decimal),
        I8 | U8 => matches!(to, R4 | R8 | Decimal),
        Char => matches!(to, U2 | I4 | U4 | I8 | U8 | R4 | R8 | Decimal),
        R4 => matches!(to, R8),
        R8 | Decimal => false,
    }
}

fn cast_op(from: NumericKind, to: NumericKind) -> CastOp {
    if from == to {
        return CastOp::Identity;
    }

    match (from, to) {
        (NumericKind::Decimal, to) if to.is_integral() => CastOp::DecimalToInt,
        (NumericKind::Decimal, _) => CastOp::DecimalToFloat,
        (from, NumericKind::Decimal) if from.is_integral() => CastOp::IntToDecimal,
        (_, NumericKind::Decimal) => CastOp::FloatToDecimal,
        (NumericKind::R4, NumericKind::R8) => CastOp::FloatWiden,
        (NumericKind::R8, NumericKind::R4) => CastOp::FloatNarrow,
        (from, to) if from.is_floating() && to.is_integral() => CastOp::FloatToInt,
        (from, to) if from.is_integral() && to.is_floating() => CastOp::IntToFloat {
            unsigned_source: from.is_unsigned_integral(),
        },
        (from, to) => {
            if to.bit_width() > from.bit_width() {
                if from.is_signed() {
                    CastOp::SignExtend
                } else {
                    CastOp::ZeroExtend
                }
            } else if to.bit_width() == from.bit_width() {
                CastOp::Reinterpret
            } else {
                CastOp::Truncate
            }
        }
    }
}
