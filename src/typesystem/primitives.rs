//! Numeric kinds and the well-known types every universe starts with.
//!
//! [`NumericKind`] enumerates the twelve numeric kinds the conversion engine reasons about:
//! four signed and four unsigned integer widths, the 16-bit character kind (which converts
//! like an unsigned 16-bit integer), the two IEEE floating kinds and the 96-bit scaled decimal.
//!
//! [`WellKnown`] names the framework types the classifier needs to recognize by identity,
//! such as the universal object type, the value-type base and the generic list-interface
//! family used by the array rules.

use strum::{EnumCount, EnumIter, IntoStaticStr};

/// The numeric kinds participating in numeric conversions
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, EnumCount, IntoStaticStr,
    strum::Display,
)]
pub enum NumericKind {
    /// Signed 8-bit integer (`System.SByte`)
    #[strum(serialize = "SByte")]
    I1,
    /// Signed 16-bit integer (`System.Int16`)
    #[strum(serialize = "Int16")]
    I2,
    /// Signed 32-bit integer (`System.Int32`)
    #[strum(serialize = "Int32")]
    I4,
    /// Signed 64-bit integer (`System.Int64`)
    #[strum(serialize = "Int64")]
    I8,
    /// Unsigned 8-bit integer (`System.Byte`)
    #[strum(serialize = "Byte")]
    U1,
    /// Unsigned 16-bit integer (`System.UInt16`)
    #[strum(serialize = "UInt16")]
    U2,
    /// Unsigned 32-bit integer (`System.UInt32`)
    #[strum(serialize = "UInt32")]
    U4,
    /// Unsigned 64-bit integer (`System.UInt64`)
    #[strum(serialize = "UInt64")]
    U8,
    /// UTF-16 code unit (`System.Char`)
    #[strum(serialize = "Char")]
    Char,
    /// 32-bit IEEE float (`System.Single`)
    #[strum(serialize = "Single")]
    R4,
    /// 64-bit IEEE float (`System.Double`)
    #[strum(serialize = "Double")]
    R8,
    /// 96-bit scaled decimal (`System.Decimal`)
    #[strum(serialize = "Decimal")]
    Decimal,
}

impl NumericKind {
    /// Width of the representation in bits (decimal reports its 128-bit storage size)
    #[must_use]
    pub fn bit_width(&self) -> u32 {
        match self {
            NumericKind::I1 | NumericKind::U1 => 8,
            NumericKind::I2 | NumericKind::U2 | NumericKind::Char => 16,
            NumericKind::I4 | NumericKind::U4 | NumericKind::R4 => 32,
            NumericKind::I8 | NumericKind::U8 | NumericKind::R8 => 64,
            NumericKind::Decimal => 128,
        }
    }

    /// Check if this kind is an integer kind (character included)
    #[must_use]
    pub fn is_integral(&self) -> bool {
        !matches!(
            self,
            NumericKind::R4 | NumericKind::R8 | NumericKind::Decimal
        )
    }

    /// Check if this kind is one of the IEEE floating kinds
    #[must_use]
    pub fn is_floating(&self) -> bool {
        matches!(self, NumericKind::R4 | NumericKind::R8)
    }

    /// Check if this kind can represent negative values
    #[must_use]
    pub fn is_signed(&self) -> bool {
        matches!(
            self,
            NumericKind::I1
                | NumericKind::I2
                | NumericKind::I4
                | NumericKind::I8
                | NumericKind::R4
                | NumericKind::R8
                | NumericKind::Decimal
        )
    }

    /// Check if this is an unsigned integer kind (character included)
    #[must_use]
    pub fn is_unsigned_integral(&self) -> bool {
        self.is_integral() && !self.is_signed()
    }

    /// Inclusive value range of an integral kind, `None` for floating and decimal kinds
    #[must_use]
    pub fn integral_range(&self) -> Option<(i128, i128)> {
        match self {
            NumericKind::I1 => Some((i128::from(i8::MIN), i128::from(i8::MAX))),
            NumericKind::I2 => Some((i128::from(i16::MIN), i128::from(i16::MAX))),
            NumericKind::I4 => Some((i128::from(i32::MIN), i128::from(i32::MAX))),
            NumericKind::I8 => Some((i128::from(i64::MIN), i128::from(i64::MAX))),
            NumericKind::U1 => Some((0, i128::from(u8::MAX))),
            NumericKind::U2 | NumericKind::Char => Some((0, i128::from(u16::MAX))),
            NumericKind::U4 => Some((0, i128::from(u32::MAX))),
            NumericKind::U8 => Some((0, i128::from(u64::MAX))),
            NumericKind::R4 | NumericKind::R8 | NumericKind::Decimal => None,
        }
    }

    /// The simple CLR name of the kind (e.g. `Int32`)
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.into()
    }

    /// The full CLR name of the kind (e.g. `System.Int32`)
    #[must_use]
    pub fn fullname(&self) -> String {
        format!("System.{}", self.name())
    }

    /// The instruction suffix used when rendering conversion mnemonics
    #[must_use]
    pub fn instruction_suffix(&self) -> &'static str {
        match self {
            NumericKind::I1 => "i1",
            NumericKind::I2 => "i2",
            NumericKind::I4 => "i4",
            NumericKind::I8 => "i8",
            NumericKind::U1 => "u1",
            NumericKind::U2 | NumericKind::Char => "u2",
            NumericKind::U4 => "u4",
            NumericKind::U8 => "u8",
            NumericKind::R4 => "r4",
            NumericKind::R8 => "r8",
            NumericKind::Decimal => "decimal",
        }
    }
}

/// Framework types pre-registered in every universe and recognized by identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumCount)]
pub enum WellKnown {
    /// `System.Object`, the root of every reference type
    Object,
    /// `System.ValueType`, the base of all value types
    ValueType,
    /// `System.Enum`, the base of all enumerations
    Enum,
    /// `System.String`
    String,
    /// `System.Boolean`
    Boolean,
    /// `System.Array`, the base of all array types
    Array,
    /// `System.Delegate`
    Delegate,
    /// `System.MulticastDelegate`, the base of all delegate types
    MulticastDelegate,
    /// `System.Nullable`1`, the optional wrapper definition
    Nullable,
    /// `System.IComparable`
    IComparable,
    /// `System.IConvertible`
    IConvertible,
    /// `System.IFormattable`
    IFormattable,
    /// `System.ICloneable`
    ICloneable,
    /// `System.Collections.IEnumerable`
    IEnumerable,
    /// `System.Collections.ICollection`
    ICollection,
    /// `System.Collections.IList`
    IList,
    /// `System.Collections.Generic.IEnumerable`1`
    IEnumerableT,
    /// `System.Collections.Generic.ICollection`1`
    ICollectionT,
    /// `System.Collections.Generic.IList`1`
    IListT,
    /// `System.Collections.Generic.IReadOnlyCollection`1`
    IReadOnlyCollectionT,
    /// `System.Collections.Generic.IReadOnlyList`1`
    IReadOnlyListT,
}

impl WellKnown {
    /// Namespace of the well-known type
    #[must_use]
    pub fn namespace(&self) -> &'static str {
        match self {
            WellKnown::IEnumerable | WellKnown::ICollection | WellKnown::IList => {
                "System.Collections"
            }
            WellKnown::IEnumerableT
            | WellKnown::ICollectionT
            | WellKnown::IListT
            | WellKnown::IReadOnlyCollectionT
            | WellKnown::IReadOnlyListT => "System.Collections.Generic",
            _ => "System",
        }
    }

    /// Simple name of the well-known type
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            WellKnown::Object => "Object",
            WellKnown::ValueType => "ValueType",
            WellKnown::Enum => "Enum",
            WellKnown::String => "String",
            WellKnown::Boolean => "Boolean",
            WellKnown::Array => "Array",
            WellKnown::Delegate => "Delegate",
            WellKnown::MulticastDelegate => "MulticastDelegate",
            WellKnown::Nullable => "Nullable`1",
            WellKnown::IComparable => "IComparable",
            WellKnown::IConvertible => "IConvertible",
            WellKnown::IFormattable => "IFormattable",
            WellKnown::ICloneable => "ICloneable",
            WellKnown::IEnumerable => "IEnumerable",
            WellKnown::ICollection => "ICollection",
            WellKnown::IList => "IList",
            WellKnown::IEnumerableT => "IEnumerable`1",
            WellKnown::ICollectionT => "ICollection`1",
            WellKnown::IListT => "IList`1",
            WellKnown::IReadOnlyCollectionT => "IReadOnlyCollection`1",
            WellKnown::IReadOnlyListT => "IReadOnlyList`1",
        }
    }

    /// The full name (Namespace.Name) of the well-known type
    #[must_use]
    pub fn fullname(&self) -> String {
        format!("{}.{}", self.namespace(), self.name())
    }

    /// Check if this is one of the generic list-interface definitions arrays convert to
    #[must_use]
    pub fn is_list_family(&self) -> bool {
        matches!(
            self,
            WellKnown::IEnumerableT
                | WellKnown::ICollectionT
                | WellKnown::IListT
                | WellKnown::IReadOnlyCollectionT
                | WellKnown::IReadOnlyListT
        )
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn test_numeric_kind_count() {
        assert_eq!(NumericKind::COUNT, 12);
        assert_eq!(NumericKind::iter().count(), 12);
    }

    #[test]
    fn test_numeric_kind_classification() {
        assert!(NumericKind::Char.is_integral());
        assert!(NumericKind::Char.is_unsigned_integral());
        assert!(!NumericKind::Char.is_signed());
        assert!(NumericKind::R8.is_floating());
        assert!(!NumericKind::Decimal.is_floating());
        assert!(!NumericKind::Decimal.is_integral());
        assert!(NumericKind::Decimal.is_signed());
        assert_eq!(NumericKind::Char.bit_width(), NumericKind::U2.bit_width());
    }

    #[test]
    fn test_numeric_kind_ranges() {
        assert_eq!(NumericKind::I1.integral_range(), Some((-128, 127)));
        assert_eq!(
            NumericKind::U8.integral_range(),
            Some((0, i128::from(u64::MAX)))
        );
        assert_eq!(NumericKind::R4.integral_range(), None);
    }

    #[test]
    fn test_numeric_kind_names() {
        assert_eq!(NumericKind::I4.to_string(), "Int32");
        assert_eq!(NumericKind::U1.fullname(), "System.Byte");
        assert_eq!(NumericKind::Char.instruction_suffix(), "u2");
    }

    #[test]
    fn test_well_known_names() {
        assert_eq!(WellKnown::Object.fullname(), "System.Object");
        assert_eq!(
            WellKnown::IListT.fullname(),
            "System.Collections.Generic.IList`1"
        );
        assert!(WellKnown::IReadOnlyListT.is_list_family());
        assert!(!WellKnown::IList.is_list_family());
        assert_eq!(WellKnown::iter().count(), WellKnown::COUNT);
    }
}
