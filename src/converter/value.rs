//! Runtime values flowing through converters.
//!
//! [`Value`] carries the data of one instance of a type: primitives, strings, optionals,
//! boxed value types and opaque host instances. Enumeration values are carried as their
//! underlying numeric value; the enumeration itself is known from the plan's static types,
//! and from the runtime type recorded when the value is boxed.

use std::{any::Any, fmt, sync::Arc};

use rust_decimal::Decimal;

use crate::typesystem::{NumericKind, Token, TypeDescRc, TypeUniverse, WellKnown};

/// A boxed value type: the value together with its runtime type
#[derive(Debug, Clone, PartialEq)]
pub struct BoxedValue {
    /// Runtime type of the boxed value, never an optional
    pub ty: Token,
    /// The unboxed value
    pub value: Value,
}

/// An opaque host object or struct with its runtime type
#[derive(Clone)]
pub struct Instance {
    /// Runtime type of the instance
    pub ty: Token,
    payload: Arc<dyn Any + Send + Sync>,
}

impl Instance {
    /// Wrap a host payload as an instance of `ty`
    pub fn new(ty: Token, payload: impl Any + Send + Sync) -> Self {
        Instance {
            ty,
            payload: Arc::new(payload),
        }
    }

    /// Borrow the payload as `T`, if it has that type
    #[must_use]
    pub fn payload<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        self.ty == other.ty && Arc::ptr_eq(&self.payload, &other.payload)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("ty", &self.ty)
            .finish_non_exhaustive()
    }
}

/// A runtime value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The null reference
    Null,
    /// `System.Boolean`
    Bool(bool),
    /// `System.Char`, a UTF-16 code unit
    Char(u16),
    /// `System.SByte`
    I1(i8),
    /// `System.Int16`
    I2(i16),
    /// `System.Int32`
    I4(i32),
    /// `System.Int64`
    I8(i64),
    /// `System.Byte`
    U1(u8),
    /// `System.UInt16`
    U2(u16),
    /// `System.UInt32`
    U4(u32),
    /// `System.UInt64`
    U8(u64),
    /// `System.Single`
    R4(f32),
    /// `System.Double`
    R8(f64),
    /// `System.Decimal`
    Decimal(Decimal),
    /// `System.String`
    String(Arc<str>),
    /// An optional value type, `None` when empty
    Optional(Option<Box<Value>>),
    /// A boxed value type
    Boxed(Arc<BoxedValue>),
    /// A class or struct instance provided by the host
    Instance(Instance),
}

impl Value {
    /// Wrap a value into a present optional
    #[must_use]
    pub fn some(value: Value) -> Self {
        Value::Optional(Some(Box::new(value)))
    }

    /// The empty optional
    #[must_use]
    pub fn none() -> Self {
        Value::Optional(None)
    }

    /// Box a value as an instance of `ty`
    #[must_use]
    pub fn boxed(ty: Token, value: Value) -> Self {
        Value::Boxed(Arc::new(BoxedValue { ty, value }))
    }

    /// The numeric kind of a primitive numeric value
    #[must_use]
    pub fn numeric_kind(&self) -> Option<NumericKind> {
        match self {
            Value::Char(_) => Some(NumericKind::Char),
            Value::I1(_) => Some(NumericKind::I1),
            Value::I2(_) => Some(NumericKind::I2),
            Value::I4(_) => Some(NumericKind::I4),
            Value::I8(_) => Some(NumericKind::I8),
            Value::U1(_) => Some(NumericKind::U1),
            Value::U2(_) => Some(NumericKind::U2),
            Value::U4(_) => Some(NumericKind::U4),
            Value::U8(_) => Some(NumericKind::U8),
            Value::R4(_) => Some(NumericKind::R4),
            Value::R8(_) => Some(NumericKind::R8),
            Value::Decimal(_) => Some(NumericKind::Decimal),
            _ => None,
        }
    }

    /// A short name of the variant, for diagnostics
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Boolean",
            Value::Optional(_) => "Optional",
            Value::Boxed(_) => "Boxed",
            Value::Instance(_) => "Instance",
            Value::String(_) => "String",
            other => other.numeric_kind().map_or("Unknown", |kind| kind.name()),
        }
    }

    /// Check if this is the null reference or an empty optional
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null | Value::Optional(None))
    }

    /// The runtime type of the value, as seen by checked casts and unboxing
    ///
    /// Primitives report their own type. Returns `None` for null, optionals and instances of
    /// unknown types.
    #[must_use]
    pub fn runtime_type(&self, universe: &TypeUniverse) -> Option<TypeDescRc> {
        match self {
            Value::Boxed(boxed) => universe.get(boxed.ty),
            Value::Instance(instance) => universe.get(instance.ty),
            Value::String(_) => Some(universe.well_known(WellKnown::String)),
            Value::Bool(_) => Some(universe.well_known(WellKnown::Boolean)),
            Value::Null | Value::Optional(_) => None,
            other => other.numeric_kind().map(|kind| universe.numeric(kind)),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Char(v) => match char::from_u32(u32::from(*v)) {
                Some(c) => write!(f, "'{c}'"),
                None => write!(f, "'\\u{v:04X}'"),
            },
            Value::I1(v) => write!(f, "{v}"),
            Value::I2(v) => write!(f, "{v}"),
            Value::I4(v) => write!(f, "{v}"),
            Value::I8(v) => write!(f, "{v}L"),
            Value::U1(v) => write!(f, "{v}"),
            Value::U2(v) => write!(f, "{v}"),
            Value::U4(v) => write!(f, "{v}U"),
            Value::U8(v) => write!(f, "{v}UL"),
            Value::R4(v) => write!(f, "{v}f"),
            Value::R8(v) => write!(f, "{v}"),
            Value::Decimal(v) => write!(f, "{v}m"),
            Value::String(v) => write!(f, "\"{v}\""),
            Value::Optional(Some(v)) => write!(f, "{v}"),
            Value::Optional(None) => write!(f, "none"),
            Value::Boxed(boxed) => write!(f, "box({})", boxed.value),
            Value::Instance(instance) => write!(f, "instance({})", instance.ty),
        }
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::I4(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::I8(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::R8(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.into())
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Value::Decimal(value)
    }
}
