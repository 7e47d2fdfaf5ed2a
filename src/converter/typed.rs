//! Converters between Rust types.
//!
//! [`ConvValue`] ties a Rust type to its natural type descriptor and to its [`Value`]
//! representation, so a conversion can be requested as `TypedConverter<i64, Option<i32>>`
//! instead of between descriptors.

use std::{marker::PhantomData, sync::Arc};

use rust_decimal::Decimal;

use crate::{
    converter::{value::Value, Converter},
    typesystem::{NumericKind, TypeDescRc, TypeUniverse, WellKnown},
    Error, Result,
};

/// A Rust type with a natural type descriptor and a [`Value`] representation
pub trait ConvValue: Sized + Send + Sync + 'static {
    /// The descriptor is a value type; `Option<Self>` maps to its optional form
    const VALUE_TYPE: bool = true;

    /// The type descriptor of `Self` in `universe`
    ///
    /// # Errors
    /// Returns an error if the descriptor cannot be constructed.
    fn descriptor(universe: &TypeUniverse) -> Result<TypeDescRc>;

    /// Convert into a runtime value
    ///
    /// # Errors
    /// Returns [`Error::ValueMismatch`] if `self` has no representation.
    fn into_value(self) -> Result<Value>;

    /// Convert from a runtime value
    ///
    /// # Errors
    /// Returns [`Error::ValueMismatch`] if the value has a different shape.
    fn from_value(value: Value) -> Result<Self>;
}

fn mismatch(expected: &str, found: &Value) -> Error {
    Error::ValueMismatch {
        expected: expected.to_string(),
        found: found.type_name().to_string(),
    }
}

macro_rules! numeric_conv_value {
    ($($ty:ty => $variant:ident, $kind:ident;)*) => {
        $(
            impl ConvValue for $ty {
                fn descriptor(universe: &TypeUniverse) -> Result<TypeDescRc> {
                    Ok(universe.numeric(NumericKind::$kind))
                }

                fn into_value(self) -> Result<Value> {
                    Ok(Value::$variant(self))
                }

                fn from_value(value: Value) -> Result<Self> {
                    match value {
                        Value::$variant(v) => Ok(v),
                        other => Err(mismatch(NumericKind::$kind.name(), &other)),
                    }
                }
            }
        )*
    };
}

numeric_conv_value! {
    i8 => I1, I1;
    i16 => I2, I2;
    i32 => I4, I4;
    i64 => I8, I8;
    u8 => U1, U1;
    u16 => U2, U2;
    u32 => U4, U4;
    u64 => U8, U8;
    f32 => R4, R4;
    f64 => R8, R8;
    Decimal => Decimal, Decimal;
}

impl ConvValue for bool {
    fn descriptor(universe: &TypeUniverse) -> Result<TypeDescRc> {
        Ok(universe.well_known(WellKnown::Boolean))
    }

    fn into_value(self) -> Result<Value> {
        Ok(Value::Bool(self))
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bool(v) => Ok(v),
            other => Err(mismatch("Boolean", &other)),
        }
    }
}

/// Characters outside the basic multilingual plane have no single UTF-16 code unit and are
/// rejected, as are surrogate code units on the way back
impl ConvValue for char {
    fn descriptor(universe: &TypeUniverse) -> Result<TypeDescRc> {
        Ok(universe.numeric(NumericKind::Char))
    }

    fn into_value(self) -> Result<Value> {
        u16::try_from(u32::from(self))
            .map(Value::Char)
            .map_err(|_| Error::ValueMismatch {
                expected: "Char".to_string(),
                found: format!("U+{:04X}", u32::from(self)),
            })
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Char(unit) => char::from_u32(u32::from(unit)).ok_or_else(|| Error::ValueMismatch {
                expected: "Char".to_string(),
                found: format!("surrogate U+{unit:04X}"),
            }),
            other => Err(mismatch("Char", &other)),
        }
    }
}

impl ConvValue for String {
    const VALUE_TYPE: bool = false;

    fn descriptor(universe: &TypeUniverse) -> Result<TypeDescRc> {
        Ok(universe.well_known(WellKnown::String))
    }

    fn into_value(self) -> Result<Value> {
        Ok(Value::String(self.into()))
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::String(text) => Ok(text.to_string()),
            other => Err(mismatch("String", &other)),
        }
    }
}

/// Any value, typed as `System.Object`
impl ConvValue for Value {
    const VALUE_TYPE: bool = false;

    fn descriptor(universe: &TypeUniverse) -> Result<TypeDescRc> {
        Ok(universe.well_known(WellKnown::Object))
    }

    fn into_value(self) -> Result<Value> {
        Ok(self)
    }

    fn from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

/// The optional form of a value type, or a nullable reference
impl<T: ConvValue> ConvValue for Option<T> {
    const VALUE_TYPE: bool = T::VALUE_TYPE;

    fn descriptor(universe: &TypeUniverse) -> Result<TypeDescRc> {
        let inner = T::descriptor(universe)?;
        if T::VALUE_TYPE {
            universe.optional_of(&inner)
        } else {
            Ok(inner)
        }
    }

    fn into_value(self) -> Result<Value> {
        match (self, T::VALUE_TYPE) {
            (Some(inner), true) => Ok(Value::some(inner.into_value()?)),
            (Some(inner), false) => inner.into_value(),
            (None, true) => Ok(Value::none()),
            (None, false) => Ok(Value::Null),
        }
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null | Value::Optional(None) => Ok(None),
            Value::Optional(Some(inner)) => T::from_value(*inner).map(Some),
            other => T::from_value(other).map(Some),
        }
    }
}

/// A converter from `S` to `T`
pub struct TypedConverter<S, T> {
    inner: Arc<Converter>,
    _marker: PhantomData<fn(S) -> T>,
}

impl<S: ConvValue, T: ConvValue> TypedConverter<S, T> {
    /// Wrap an untyped converter between the descriptors of `S` and `T`
    #[must_use]
    pub fn new(inner: Arc<Converter>) -> Self {
        TypedConverter {
            inner,
            _marker: PhantomData,
        }
    }

    /// The untyped converter
    #[must_use]
    pub fn inner(&self) -> &Arc<Converter> {
        &self.inner
    }

    /// Convert a value
    ///
    /// # Errors
    /// Returns any error of the underlying converter, or [`Error::ValueMismatch`] if the
    /// result does not have the shape of `T`.
    pub fn convert(&self, value: S) -> Result<T> {
        let result = self.inner.convert(value.into_value()?)?;
        T::from_value(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptors() {
        let universe = TypeUniverse::new();
        assert_eq!(i32::descriptor(&universe).unwrap().fullname(), "System.Int32");
        assert_eq!(char::descriptor(&universe).unwrap().fullname(), "System.Char");
        assert_eq!(
            Option::<u8>::descriptor(&universe).unwrap().fullname(),
            "System.Nullable`1<System.Byte>"
        );
        assert_eq!(
            Option::<String>::descriptor(&universe).unwrap().fullname(),
            "System.String"
        );
        assert_eq!(Value::descriptor(&universe).unwrap().fullname(), "System.Object");
    }

    #[test]
    fn test_values() {
        assert_eq!(5i64.into_value().unwrap(), Value::I8(5));
        assert_eq!(i64::from_value(Value::I8(5)).unwrap(), 5);
        assert!(i64::from_value(Value::I4(5)).is_err());

        assert_eq!('A'.into_value().unwrap(), Value::Char(65));
        assert!('😀'.into_value().is_err());
        assert!(char::from_value(Value::Char(0xD800)).is_err());

        assert_eq!(Some(3u8).into_value().unwrap(), Value::some(Value::U1(3)));
        assert_eq!(None::<u8>.into_value().unwrap(), Value::none());
        assert_eq!(None::<String>.into_value().unwrap(), Value::Null);
        assert_eq!(Option::<u8>::from_value(Value::Null).unwrap(), None);
        assert_eq!(
            Option::<u8>::from_value(Value::some(Value::U1(1))).unwrap(),
            Some(1)
        );
    }
}
