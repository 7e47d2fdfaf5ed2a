//! Type descriptors and the type universe the conversion engine reasons over.
//!
//! This module provides the normalized view of types that conversion rules query: the
//! category of a type, its base type, the interfaces it implements, the element of arrays
//! and optionals, and the arguments of generic instantiations. Descriptors are immutable;
//! the universe that owns them is append-only.
//!
//! # Key Components
//!
//! - [`TypeDesc`]: Immutable descriptor of a single type
//! - [`TypeUniverse`]: Concurrent registry of all descriptors and declared conversion operators
//! - [`TypeBuilder`]: Fluent construction of classes, structs, interfaces, enums and delegates
//! - [`NumericKind`]: The numeric kinds the numeric conversion table covers
//! - [`UserConversionOperator`]: A declared `op_Implicit` / `op_Explicit`
//!
//! # Examples
//!
//! ```rust
//! use dotconv::typesystem::{TypeBuilder, TypeUniverse, WellKnown};
//!
//! let universe = TypeUniverse::new();
//! let shape = TypeBuilder::new(&universe)
//!     .class("Geometry", "Shape")
//!     .build()?;
//! let circle = TypeBuilder::new(&universe)
//!     .class("Geometry", "Circle")
//!     .extends(shape.token)
//!     .sealed()
//!     .build()?;
//!
//! assert!(universe.is_subclass_of(&circle, &shape));
//! assert!(universe.is_subclass_of(&circle, &universe.well_known(WellKnown::Object)));
//! # Ok::<(), dotconv::Error>(())
//! ```

mod base;
mod builder;
mod operators;
mod primitives;
mod token;
mod universe;

use std::{fmt, sync::Arc};

pub use base::{GenericParam, GenericParamFlags, TypeFlags, TypeFlavor, Variance};
pub use builder::TypeBuilder;
pub use operators::{ConvertFn, UserConversionOperator, UserOperatorRc};
pub use primitives::{NumericKind, WellKnown};
pub use token::Token;
pub use universe::TypeUniverse;

/// Reference to a `TypeDesc`
pub type TypeDescRc = Arc<TypeDesc>;

/// An immutable type descriptor.
///
/// Relationships to other types are expressed through tokens and resolved through the owning
/// [`TypeUniverse`], so descriptors never hold references into each other.
#[derive(Debug, Clone)]
pub struct TypeDesc {
    /// Identity of the type; equal tokens denote the same type
    pub token: Token,
    /// Namespace of the type (may be empty)
    pub namespace: String,
    /// Simple name of the type
    pub name: String,
    /// Category of the type
    pub flavor: TypeFlavor,
    /// Declared attributes
    pub flags: TypeFlags,
    /// The base class, absent for `System.Object` and interfaces
    pub base: Option<Token>,
    /// Directly implemented (or, for interfaces, inherited) interfaces
    pub interfaces: Vec<Token>,
    /// Element type of arrays and inner type of optionals
    pub element: Option<Token>,
    /// The generic definition this type instantiates
    pub generic_definition: Option<Token>,
    /// Generic arguments of an instantiation, in parameter order
    pub generic_args: Vec<Token>,
    /// Generic parameters of a definition, in declaration order
    pub generic_params: Vec<GenericParam>,
}

impl TypeDesc {
    /// Create a new descriptor without relationships
    pub fn new(
        token: Token,
        namespace: impl Into<String>,
        name: impl Into<String>,
        flavor: TypeFlavor,
        flags: TypeFlags,
    ) -> Self {
        TypeDesc {
            token,
            namespace: namespace.into(),
            name: name.into(),
            flavor,
            flags,
            base: None,
            interfaces: Vec::new(),
            element: None,
            generic_definition: None,
            generic_args: Vec::new(),
            generic_params: Vec::new(),
        }
    }

    /// The full name (Namespace.Name) of the type
    #[must_use]
    pub fn fullname(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    /// Check if values of this type are stored inline
    #[must_use]
    pub fn is_value_type(&self) -> bool {
        self.flavor.is_value_kind()
    }

    /// Check if values of this type are references
    #[must_use]
    pub fn is_reference_type(&self) -> bool {
        self.flavor.is_reference_kind()
    }

    /// Check if this type is an interface
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.flavor.is_interface()
    }

    /// Check if this type is the optional wrapper over a value type
    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.flavor.is_optional()
    }

    /// Check if this type is an enumeration
    #[must_use]
    pub fn is_enum(&self) -> bool {
        self.flavor.is_enum()
    }

    /// Check if no type can derive from this one
    ///
    /// Value types, strings and arrays are sealed regardless of their declared flags.
    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.flags.contains(TypeFlags::SEALED)
            || self.flavor.is_value_kind()
            || matches!(self.flavor, TypeFlavor::String | TypeFlavor::Array { .. })
    }

    /// Check if this type is an instantiation of a generic definition
    #[must_use]
    pub fn is_generic_instance(&self) -> bool {
        self.generic_definition.is_some()
    }

    /// Check if this type is an open generic definition
    #[must_use]
    pub fn is_generic_definition(&self) -> bool {
        self.flags.contains(TypeFlags::GENERIC_DEFINITION)
    }

    /// The numeric kind values of this type convert as, if any
    #[must_use]
    pub fn numeric_kind(&self) -> Option<NumericKind> {
        self.flavor.numeric_kind()
    }

    /// Array rank, if this is an array
    #[must_use]
    pub fn array_rank(&self) -> Option<u32> {
        match self.flavor {
            TypeFlavor::Array { rank } => Some(rank),
            _ => None,
        }
    }
}

impl PartialEq for TypeDesc {
    fn eq(&self, other: &Self) -> bool {
        self.token == other.token
    }
}

impl Eq for TypeDesc {}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fullname())
    }
}
