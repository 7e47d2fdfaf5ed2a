use bitflags::bitflags;

use crate::typesystem::NumericKind;

/// The category of a type, as seen by the conversion rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeFlavor {
    /// One of the numeric kinds, `System.Char` included
    Numeric(NumericKind),
    /// `System.Boolean`
    Boolean,
    /// An enumeration with its underlying integral kind
    Enum {
        /// The integral kind the enumeration is stored as
        underlying: NumericKind,
    },
    /// `Nullable<T>` over a value type; the inner type is the descriptor's element
    Optional,
    /// An array of the descriptor's element type
    Array {
        /// Number of dimensions (1 for vectors)
        rank: u32,
    },
    /// A user-declared value type
    Struct,
    /// A reference type declared as class (also `System.ValueType`, `System.Enum`, ...)
    Class,
    /// An interface
    Interface,
    /// A delegate type
    Delegate,
    /// `System.Object`
    Object,
    /// `System.String`
    String,
    /// Anything the conversion rules never look into (pointers, generic parameters, ...)
    Other,
}

impl TypeFlavor {
    /// Check if values of this flavor are stored inline (value types)
    #[must_use]
    pub fn is_value_kind(&self) -> bool {
        matches!(
            self,
            TypeFlavor::Numeric(_)
                | TypeFlavor::Boolean
                | TypeFlavor::Enum { .. }
                | TypeFlavor::Optional
                | TypeFlavor::Struct
        )
    }

    /// Check if values of this flavor are references
    #[must_use]
    pub fn is_reference_kind(&self) -> bool {
        matches!(
            self,
            TypeFlavor::Array { .. }
                | TypeFlavor::Class
                | TypeFlavor::Interface
                | TypeFlavor::Delegate
                | TypeFlavor::Object
                | TypeFlavor::String
        )
    }

    /// The numeric kind a value of this flavor converts as, enums yielding their underlying kind
    #[must_use]
    pub fn numeric_kind(&self) -> Option<NumericKind> {
        match self {
            TypeFlavor::Numeric(kind) => Some(*kind),
            TypeFlavor::Enum { underlying } => Some(*underlying),
            _ => None,
        }
    }

    /// Check if this is the character flavor
    #[must_use]
    pub fn is_character(&self) -> bool {
        matches!(self, TypeFlavor::Numeric(NumericKind::Char))
    }

    /// Check if this is an enumeration
    #[must_use]
    pub fn is_enum(&self) -> bool {
        matches!(self, TypeFlavor::Enum { .. })
    }

    /// Check if this is the optional wrapper
    #[must_use]
    pub fn is_optional(&self) -> bool {
        matches!(self, TypeFlavor::Optional)
    }

    /// Check if this is an interface
    #[must_use]
    pub fn is_interface(&self) -> bool {
        matches!(self, TypeFlavor::Interface)
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    /// Type attributes relevant to conversions
    pub struct TypeFlags: u32 {
        /// Type is abstract
        const ABSTRACT = 0x0080;
        /// Type cannot be derived from
        const SEALED = 0x0100;
        /// Type is an open generic definition with parameters
        const GENERIC_DEFINITION = 0x1000_0000;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    /// Generic parameter attributes
    pub struct GenericParamFlags: u32 {
        /// The parameter is covariant (`out T`)
        const COVARIANT = 0x0001;
        /// The parameter is contravariant (`in T`)
        const CONTRAVARIANT = 0x0002;
    }
}

/// The declared variance of a generic parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variance {
    /// Arguments must match exactly
    Invariant,
    /// Arguments may convert in the same direction as the constructed type
    Covariant,
    /// Arguments may convert in the opposite direction
    Contravariant,
}

/// A generic parameter declared by a generic type definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericParam {
    /// Name of the parameter (e.g. `T`)
    pub name: String,
    /// Declared attributes
    pub flags: GenericParamFlags,
}

impl GenericParam {
    /// Create a new generic parameter
    pub fn new(name: impl Into<String>, flags: GenericParamFlags) -> Self {
        GenericParam {
            name: name.into(),
            flags,
        }
    }

    /// The declared variance of this parameter
    #[must_use]
    pub fn variance(&self) -> Variance {
        if self.flags.contains(GenericParamFlags::COVARIANT) {
            Variance::Covariant
        } else if self.flags.contains(GenericParamFlags::CONTRAVARIANT) {
            Variance::Contravariant
        } else {
            Variance::Invariant
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flavor_kinds() {
        assert!(TypeFlavor::Numeric(NumericKind::I4).is_value_kind());
        assert!(TypeFlavor::Optional.is_value_kind());
        assert!(!TypeFlavor::Optional.is_reference_kind());
        assert!(TypeFlavor::Array { rank: 1 }.is_reference_kind());
        assert!(TypeFlavor::Object.is_reference_kind());
        assert!(!TypeFlavor::Other.is_value_kind());
        assert!(!TypeFlavor::Other.is_reference_kind());
    }

    #[test]
    fn test_flavor_numeric_kind() {
        let flavor = TypeFlavor::Enum {
            underlying: NumericKind::U1,
        };
        assert_eq!(flavor.numeric_kind(), Some(NumericKind::U1));
        assert!(flavor.is_enum());
        assert!(TypeFlavor::Numeric(NumericKind::Char).is_character());
        assert_eq!(TypeFlavor::Boolean.numeric_kind(), None);
    }

    #[test]
    fn test_generic_param_variance() {
        assert_eq!(
            GenericParam::new("T", GenericParamFlags::COVARIANT).variance(),
            Variance::Covariant
        );
        assert_eq!(
            GenericParam::new("T", GenericParamFlags::CONTRAVARIANT).variance(),
            Variance::Contravariant
        );
        assert_eq!(
            GenericParam::new("T", GenericParamFlags::empty()).variance(),
            Variance::Invariant
        );
    }
}
