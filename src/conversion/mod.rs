//! Conversion classification.
//!
//! Given a source and a target [`crate::typesystem::TypeDesc`], the classifier decides whether
//! a conversion exists and how it is performed. The answer is a [`Classification`]: either a
//! [`ConversionPlan`] tagged with a [`ConversionKind`], no conversion, or an ambiguity between
//! several user-defined operators.
//!
//! # Precedence
//!
//! Rules are tried in a fixed order and the first match wins:
//!
//! 1. Identity
//! 2. Numeric and enumeration conversions, including optional wrapping and unwrapping
//! 3. Boxing of value types to `System.Object`, `System.ValueType`, `System.Enum` and
//!    implemented interfaces
//! 4. Unboxing, the mirror of boxing
//! 5. Implicit, then explicit reference conversions
//! 6. User-defined conversion operators
//! 7. Host converters registered with the engine
//!
//! Rules 1 to 5 form the *standard* conversions, which are also used by the user-defined
//! resolver to relate operator signatures to the requested types.
//!
//! # Key Components
//!
//! - [`numeric`]: The numeric conversion table
//! - [`reference`]: The reference conversion lattice and variance checks
//! - [`Classifier`]: The precedence-ordered decision procedure
//! - [`user_defined`]: Most-specific operator resolution
//! - [`host`]: Host-registered converters and providers

pub mod host;
pub mod numeric;
pub mod reference;
pub mod user_defined;

mod classifier;

use std::{fmt, sync::Arc};

use strum::{Display, EnumIter};

pub use classifier::{classify_standard, Classifier};
pub use host::{ConverterProvider, HostConversion, HostRegistry};
pub use numeric::{numeric_conversion, CastOp, NumericCast, NumericConversion, NumericRelation};
pub use user_defined::{OperatorCache, UserDefinedConversion};

use crate::typesystem::{TypeDescRc, UserOperatorRc};

/// Wrapping and unwrapping of optionals around a value conversion
#[derive(Debug, Clone)]
pub struct NullableConversion {
    /// The source is optional and is unwrapped first
    pub unwrap_input: bool,
    /// The target is optional and the result is wrapped last
    pub wrap_output: bool,
    /// The conversion between the unwrapped types
    pub underlying: Box<ConversionKind>,
}

impl NullableConversion {
    /// Check if an empty source produces an empty result instead of failing
    #[must_use]
    pub fn propagates_empty(&self) -> bool {
        self.unwrap_input && self.wrap_output
    }
}

/// The tag of a [`ConversionKind`], without payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum ConversionCategory {
    /// See [`ConversionKind::Identity`]
    Identity,
    /// See [`ConversionKind::ImplicitNumeric`]
    ImplicitNumeric,
    /// See [`ConversionKind::ExplicitNumeric`]
    ExplicitNumeric,
    /// See [`ConversionKind::Enum`]
    Enum,
    /// See [`ConversionKind::ImplicitNullable`]
    ImplicitNullable,
    /// See [`ConversionKind::ExplicitNullable`]
    ExplicitNullable,
    /// See [`ConversionKind::Box`]
    Box,
    /// See [`ConversionKind::Unbox`]
    Unbox,
    /// See [`ConversionKind::ImplicitReference`]
    ImplicitReference,
    /// See [`ConversionKind::ExplicitReference`]
    ExplicitReference,
    /// See [`ConversionKind::UserDefined`]
    UserDefined,
    /// See [`ConversionKind::Host`]
    Host,
}

/// How a conversion is performed
#[derive(Debug, Clone)]
pub enum ConversionKind {
    /// Source and target are the same type
    Identity,
    /// Widening numeric conversion
    ImplicitNumeric(NumericCast),
    /// Narrowing or sign-changing numeric conversion
    ExplicitNumeric(NumericCast),
    /// Conversion where at least one side is an enumeration
    Enum(NumericCast),
    /// Implicit conversion involving optionals
    ImplicitNullable(NullableConversion),
    /// Explicit conversion involving optionals
    ExplicitNullable(NullableConversion),
    /// Value type to reference type
    Box,
    /// Reference type to value type
    Unbox,
    /// Reference conversion that always succeeds
    ImplicitReference,
    /// Reference conversion checked at runtime
    ExplicitReference,
    /// Conversion through a declared conversion operator
    UserDefined(UserDefinedConversion),
    /// Conversion through a host-registered converter
    Host(HostConversion),
}

impl ConversionKind {
    /// Check if the conversion may be applied without an explicit cast
    #[must_use]
    pub fn is_implicit(&self) -> bool {
        match self {
            ConversionKind::Identity
            | ConversionKind::ImplicitNumeric(_)
            | ConversionKind::ImplicitNullable(_)
            | ConversionKind::Box
            | ConversionKind::ImplicitReference => true,
            ConversionKind::UserDefined(conversion) => conversion.is_implicit,
            ConversionKind::ExplicitNumeric(_)
            | ConversionKind::Enum(_)
            | ConversionKind::ExplicitNullable(_)
            | ConversionKind::Unbox
            | ConversionKind::ExplicitReference
            | ConversionKind::Host(_) => false,
        }
    }

    /// The category tag of this conversion
    #[must_use]
    pub fn category(&self) -> ConversionCategory {
        match self {
            ConversionKind::Identity => ConversionCategory::Identity,
            ConversionKind::ImplicitNumeric(_) => ConversionCategory::ImplicitNumeric,
            ConversionKind::ExplicitNumeric(_) => ConversionCategory::ExplicitNumeric,
            ConversionKind::Enum(_) => ConversionCategory::Enum,
            ConversionKind::ImplicitNullable(_) => ConversionCategory::ImplicitNullable,
            ConversionKind::ExplicitNullable(_) => ConversionCategory::ExplicitNullable,
            ConversionKind::Box => ConversionCategory::Box,
            ConversionKind::Unbox => ConversionCategory::Unbox,
            ConversionKind::ImplicitReference => ConversionCategory::ImplicitReference,
            ConversionKind::ExplicitReference => ConversionCategory::ExplicitReference,
            ConversionKind::UserDefined(_) => ConversionCategory::UserDefined,
            ConversionKind::Host(_) => ConversionCategory::Host,
        }
    }
}

/// A classified conversion between two specific types
#[derive(Debug, Clone)]
pub struct ConversionPlan {
    /// Type converted from
    pub source: TypeDescRc,
    /// Type converted to
    pub target: TypeDescRc,
    /// How the conversion is performed
    pub kind: ConversionKind,
}

impl ConversionPlan {
    /// Create a new plan
    #[must_use]
    pub fn new(source: TypeDescRc, target: TypeDescRc, kind: ConversionKind) -> Self {
        ConversionPlan {
            source,
            target,
            kind,
        }
    }

    /// Check if the conversion may be applied without an explicit cast
    #[must_use]
    pub fn is_implicit(&self) -> bool {
        self.kind.is_implicit()
    }

    /// The category tag of this plan
    #[must_use]
    pub fn category(&self) -> ConversionCategory {
        self.kind.category()
    }
}

impl fmt::Display for ConversionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} [{}]",
            self.source.fullname(),
            self.target.fullname(),
            self.category()
        )
    }
}

/// Outcome of classifying a (source, target) pair
#[derive(Debug, Clone)]
pub enum Classification {
    /// A conversion exists
    Convertible(Arc<ConversionPlan>),
    /// No rule applies
    NoConversion,
    /// Several user-defined operators are equally specific
    Ambiguous(Vec<UserOperatorRc>),
}

impl Classification {
    /// Check if a conversion exists
    #[must_use]
    pub fn is_convertible(&self) -> bool {
        matches!(self, Classification::Convertible(_))
    }

    /// Check if resolution was ambiguous
    #[must_use]
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Classification::Ambiguous(_))
    }

    /// The plan, if a conversion exists
    #[must_use]
    pub fn plan(&self) -> Option<&Arc<ConversionPlan>> {
        match self {
            Classification::Convertible(plan) => Some(plan),
            _ => None,
        }
    }

    /// The category of the plan, if a conversion exists
    #[must_use]
    pub fn category(&self) -> Option<ConversionCategory> {
        self.plan().map(|plan| plan.category())
    }
}
