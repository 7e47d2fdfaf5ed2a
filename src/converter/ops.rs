//! Execution of numeric casts.
//!
//! Integral values are widened to `i128`, which holds every integral kind exactly, and
//! narrowed back to the target width. In [`OverflowMode::Checked`] a value outside the
//! target range fails with [`Error::NumericOverflow`] (`conv.ovf.*`); in
//! [`OverflowMode::Unchecked`] the low bits are kept (`conv.*`).
//!
//! Floating point to integer truncates toward zero. Unchecked, NaN becomes zero and values
//! beyond the 128-bit range saturate before the low bits are taken.
//!
//! Conversions from and to `Decimal` are always range-checked. Floats convert to `Decimal`
//! rounded to 7 (`Single`) or 15 (`Double`) significant digits. Conversions to floating point
//! never fail.

use rust_decimal::{prelude::ToPrimitive, Decimal};

use crate::{
    conversion::NumericCast,
    converter::{value::Value, OverflowMode},
    typesystem::NumericKind,
    Error, Result,
};

/// Magnitudes below the smallest positive decimal, `10^-28`, round to zero
const DECIMAL_EPSILON: f64 = 1e-28;

enum Scalar {
    Int(i128),
    Float(f64),
    Decimal(Decimal),
}

impl Value {
    /// Apply a numeric cast to this value
    ///
    /// # Errors
    /// Returns [`Error::ValueMismatch`] if the value is not of the cast's source kind, and
    /// [`Error::NumericOverflow`] if a checked conversion is out of range.
    pub fn convert_numeric(&self, cast: &NumericCast, mode: OverflowMode) -> Result<Value> {
        let scalar = self.scalar(cast.from)?;
        if cast.from == cast.to {
            return Ok(self.clone());
        }

        let overflow = || Error::NumericOverflow {
            from: cast.from,
            to: cast.to,
        };

        match cast.to {
            NumericKind::R4 => Ok(Value::R4(match scalar {
                Scalar::Int(v) => v as f32,
                Scalar::Float(v) => v as f32,
                Scalar::Decimal(d) => d.to_f32().unwrap_or_default(),
            })),
            NumericKind::R8 => Ok(Value::R8(match scalar {
                Scalar::Int(v) => v as f64,
                Scalar::Float(v) => v,
                Scalar::Decimal(d) => d.to_f64().unwrap_or_default(),
            })),
            NumericKind::Decimal => {
                let decimal = match scalar {
                    Scalar::Int(v) => Decimal::try_from_i128_with_scale(v, 0).ok(),
                    Scalar::Float(v) => {
                        let digits = if cast.from == NumericKind::R4 { 7 } else { 15 };
                        decimal_from_float(v, digits)
                    }
                    Scalar::Decimal(d) => Some(d),
                };
                decimal.map(Value::Decimal).ok_or_else(overflow)
            }
            to => {
                let (min, max) = to.integral_range().ok_or_else(overflow)?;
                let checked = mode == OverflowMode::Checked;
                let integral = match scalar {
                    Scalar::Int(v) => {
                        if checked && (v < min || v > max) {
                            return Err(overflow());
                        }
                        v
                    }
                    Scalar::Float(v) => {
                        let truncated = v.trunc();
                        if checked {
                            #[allow(clippy::cast_precision_loss)]
                            let in_range = truncated >= min as f64 && truncated < max as f64 + 1.0;
                            if !in_range {
                                return Err(overflow());
                            }
                        }
                        truncated as i128
                    }
                    Scalar::Decimal(d) => {
                        let truncated = d.trunc().to_i128().ok_or_else(overflow)?;
                        if truncated < min || truncated > max {
                            return Err(overflow());
                        }
                        truncated
                    }
                };
                narrow(integral, to).ok_or_else(overflow)
            }
        }
    }

    fn scalar(&self, expected: NumericKind) -> Result<Scalar> {
        if self.numeric_kind() != Some(expected) {
            return Err(Error::ValueMismatch {
                expected: expected.name().to_string(),
                found: self.type_name().to_string(),
            });
        }
        Ok(match *self {
            Value::Char(v) | Value::U2(v) => Scalar::Int(i128::from(v)),
            Value::I1(v) => Scalar::Int(i128::from(v)),
            Value::I2(v) => Scalar::Int(i128::from(v)),
            Value::I4(v) => Scalar::Int(i128::from(v)),
            Value::I8(v) => Scalar::Int(i128::from(v)),
            Value::U1(v) => Scalar::Int(i128::from(v)),
            Value::U4(v) => Scalar::Int(i128::from(v)),
            Value::U8(v) => Scalar::Int(i128::from(v)),
            Value::R4(v) => Scalar::Float(f64::from(v)),
            Value::R8(v) => Scalar::Float(v),
            Value::Decimal(d) => Scalar::Decimal(d),
            _ => {
                return Err(Error::ValueMismatch {
                    expected: expected.name().to_string(),
                    found: self.type_name().to_string(),
                })
            }
        })
    }
}

/// `None` for NaN, infinities and magnitudes beyond the decimal range
fn decimal_from_float(value: f64, significant_digits: u32) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    if value.abs() < DECIMAL_EPSILON {
        return Some(Decimal::ZERO);
    }
    let exact = Decimal::from_f64_retain(value)?;
    Some(exact.round_sf(significant_digits)?.normalize())
}

/// Keep the low bits of `value` for an integral kind
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn narrow(value: i128, to: NumericKind) -> Option<Value> {
    Some(match to {
        NumericKind::I1 => Value::I1(value as i8),
        NumericKind::I2 => Value::I2(value as i16),
        NumericKind::I4 => Value::I4(value as i32),
        NumericKind::I8 => Value::I8(value as i64),
        NumericKind::U1 => Value::U1(value as u8),
        NumericKind::U2 => Value::U2(value as u16),
        NumericKind::U4 => Value::U4(value as u32),
        NumericKind::U8 => Value::U8(value as u64),
        NumericKind::Char => Value::Char(value as u16),
        NumericKind::R4 | NumericKind::R8 | NumericKind::Decimal => return None,
    })
}
