//! Executable converters.
//!
//! A [`Converter`] turns a classified [`ConversionPlan`] into a short program of primitive
//! [`ConvStep`]s and runs that program on runtime [`Value`]s. Converters are immutable and
//! can be shared freely between threads; the engine caches one per (source, target,
//! overflow mode).
//!
//! # Key Components
//!
//! - [`Value`]: The runtime value model
//! - [`Decimal`]: The 96-bit scaled decimal of `rust_decimal`, laid out like `System.Decimal`
//! - [`ConvStep`]: Primitive conversion steps
//! - [`Converter`]: The step interpreter
//! - [`ConverterCache`]: Compute-once cache of classifications and converters
//! - [`TypedConverter`]: A converter between Rust types implementing [`ConvValue`]
//!
//! # Example
//!
//! ```rust
//! use dotconv::{ConversionEngine, NumericKind, Value};
//!
//! let engine = ConversionEngine::new();
//! let from = engine.universe().numeric(NumericKind::I8);
//! let to = engine.universe().numeric(NumericKind::I4);
//!
//! let converter = engine.converter(&from, &to)?;
//! assert_eq!(converter.convert(Value::I8(42))?, Value::I4(42));
//! # Ok::<(), dotconv::Error>(())
//! ```

mod builder;
pub mod cache;
mod ops;
pub mod typed;
pub mod value;

use std::{fmt, sync::Arc};

pub use cache::{CacheStats, ConverterCache};
pub use rust_decimal::Decimal;
pub use typed::{ConvValue, TypedConverter};
pub use value::{BoxedValue, Instance, Value};

use crate::{
    conversion::{classify_standard, ConversionKind, ConversionPlan, NumericCast},
    typesystem::{ConvertFn, Token, TypeDescRc, TypeUniverse, UserOperatorRc, WellKnown},
    Error, Result,
};

/// Behavior of narrowing integral conversions on values outside the target range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OverflowMode {
    /// Fail with [`Error::NumericOverflow`] (`conv.ovf.*`)
    #[default]
    Checked,
    /// Keep the low bits (`conv.*`)
    Unchecked,
}

/// A primitive conversion step
#[derive(Clone)]
pub enum ConvStep {
    /// Take the value out of an optional, failing on an empty one
    UnwrapOptional,
    /// Run the nested steps on the value inside an optional and wrap the result
    ///
    /// An empty optional skips the nested steps and stays empty.
    Lift(Vec<ConvStep>),
    /// Apply a numeric cast
    Numeric(NumericCast),
    /// Box a value type as an object of runtime type `ty`
    Box {
        /// Runtime type recorded in the box
        ty: Token,
    },
    /// Take a value out of a box, checking its runtime type
    Unbox {
        /// The expected value type
        target: TypeDescRc,
        /// Produce an optional, mapping null to the empty optional
        nullable: bool,
    },
    /// Reference conversion that never fails
    Upcast,
    /// Reference conversion checked against the runtime type
    Downcast {
        /// Type the runtime type must be compatible with
        target: TypeDescRc,
    },
    /// Call a user-defined conversion operator
    Invoke(UserOperatorRc),
    /// Call a host-registered procedure
    InvokeHost(ConvertFn),
    /// Wrap the value into a present optional
    WrapOptional,
}

impl fmt::Debug for ConvStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for ConvStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvStep::UnwrapOptional => write!(f, "unwrap"),
            ConvStep::Lift(steps) => {
                write!(f, "lift(")?;
                for (i, step) in steps.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{step}")?;
                }
                write!(f, ")")
            }
            ConvStep::Numeric(cast) => write!(f, "{}", cast.mnemonic(cast.can_overflow())),
            ConvStep::Box { ty } => write!(f, "box {ty}"),
            ConvStep::Unbox { target, nullable } => {
                if *nullable {
                    write!(f, "unbox.any {}?", target.fullname())
                } else {
                    write!(f, "unbox.any {}", target.fullname())
                }
            }
            ConvStep::Upcast => write!(f, "nop"),
            ConvStep::Downcast { target } => write!(f, "castclass {}", target.fullname()),
            ConvStep::Invoke(op) => write!(f, "call {}", op.signature),
            ConvStep::InvokeHost(_) => write!(f, "call <host>"),
            ConvStep::WrapOptional => write!(f, "wrap"),
        }
    }
}

/// An executable conversion between two types
pub struct Converter {
    plan: Arc<ConversionPlan>,
    steps: Vec<ConvStep>,
    overflow: OverflowMode,
    universe: Arc<TypeUniverse>,
}

impl Converter {
    /// Build a converter executing `plan`
    #[must_use]
    pub fn new(universe: Arc<TypeUniverse>, plan: Arc<ConversionPlan>, overflow: OverflowMode) -> Self {
        let steps = builder::build_steps(&universe, &plan);
        Converter {
            plan,
            steps,
            overflow,
            universe,
        }
    }

    /// The plan this converter executes
    #[must_use]
    pub fn plan(&self) -> &Arc<ConversionPlan> {
        &self.plan
    }

    /// The source type
    #[must_use]
    pub fn source(&self) -> &TypeDescRc {
        &self.plan.source
    }

    /// The target type
    #[must_use]
    pub fn target(&self) -> &TypeDescRc {
        &self.plan.target
    }

    /// The primitive steps, in execution order
    #[must_use]
    pub fn steps(&self) -> &[ConvStep] {
        &self.steps
    }

    /// Overflow behavior of numeric steps
    #[must_use]
    pub fn overflow(&self) -> OverflowMode {
        self.overflow
    }

    /// Check if the underlying conversion is implicit
    #[must_use]
    pub fn is_implicit(&self) -> bool {
        self.plan.is_implicit()
    }

    /// Convert a value of the source type into the target type
    ///
    /// # Errors
    /// - [`Error::NullOptionalUnwrap`] for an empty optional where a value is required
    /// - [`Error::NumericOverflow`] for out-of-range checked numeric conversions
    /// - [`Error::NullReference`] when unboxing null into a non-optional value type
    /// - [`Error::InvalidCast`] when a runtime type does not match a checked cast
    /// - [`Error::ValueMismatch`] when the value does not have the source type's shape
    /// - any error reported by a user operator or host procedure
    pub fn convert(&self, value: Value) -> Result<Value> {
        self.run(&self.steps, value)
    }

    fn run(&self, steps: &[ConvStep], value: Value) -> Result<Value> {
        let mut current = value;
        for step in steps {
            current = match step {
                ConvStep::UnwrapOptional => match current {
                    Value::Optional(Some(inner)) => *inner,
                    Value::Optional(None) | Value::Null => {
                        return Err(Error::NullOptionalUnwrap {
                            target: self.plan.target.fullname(),
                        });
                    }
                    other => other,
                },
                ConvStep::Lift(nested) => match current {
                    Value::Optional(None) | Value::Null => Value::none(),
                    Value::Optional(Some(inner)) => wrap(self.run(nested, *inner)?),
                    other => wrap(self.run(nested, other)?),
                },
                ConvStep::Numeric(cast) => current.convert_numeric(cast, self.overflow)?,
                ConvStep::Box { ty } => match current {
                    Value::Optional(Some(inner)) => Value::boxed(*ty, *inner),
                    Value::Optional(None) | Value::Null => Value::Null,
                    other => Value::boxed(*ty, other),
                },
                ConvStep::Unbox { target, nullable } => self.unbox(current, target, *nullable)?,
                ConvStep::Upcast => current,
                ConvStep::Downcast { target } => self.downcast(current, target)?,
                ConvStep::Invoke(op) => op.invoke(current)?,
                ConvStep::InvokeHost(procedure) => procedure(current)?,
                ConvStep::WrapOptional => wrap(current),
            };
        }
        Ok(current)
    }

    fn unbox(&self, value: Value, target: &TypeDescRc, nullable: bool) -> Result<Value> {
        let (ty, inner) = match value {
            Value::Null | Value::Optional(None) => {
                if nullable {
                    return Ok(Value::none());
                }
                return Err(Error::NullReference {
                    target: target.fullname(),
                });
            }
            Value::Boxed(boxed) => (boxed.ty, boxed.value.clone()),
            other => match other.runtime_type(&self.universe) {
                Some(runtime) => (runtime.token, other),
                None => {
                    return Err(Error::InvalidCast {
                        from: other.type_name().to_string(),
                        to: target.fullname(),
                    })
                }
            },
        };

        let compatible = ty == target.token
            || self.universe.get(ty).is_some_and(|runtime| {
                (runtime.is_enum() || target.is_enum())
                    && runtime.numeric_kind().is_some()
                    && runtime.numeric_kind() == target.numeric_kind()
            });
        if !compatible {
            let from = self
                .universe
                .get(ty)
                .map_or_else(|| ty.to_string(), |runtime| runtime.fullname());
            return Err(Error::InvalidCast {
                from,
                to: target.fullname(),
            });
        }

        Ok(if nullable { Value::some(inner) } else { inner })
    }

    fn downcast(&self, value: Value, target: &TypeDescRc) -> Result<Value> {
        if value.is_null() {
            return Ok(value);
        }
        let Some(runtime) = value.runtime_type(&self.universe) else {
            return Err(Error::InvalidCast {
                from: value.type_name().to_string(),
                to: target.fullname(),
            });
        };

        let compatible = self.universe.is_well_known(target, WellKnown::Object)
            || matches!(
                classify_standard(&self.universe, &runtime, target),
                Some(ConversionKind::Identity | ConversionKind::ImplicitReference | ConversionKind::Box)
            );
        if compatible {
            Ok(value)
        } else {
            Err(Error::InvalidCast {
                from: runtime.fullname(),
                to: target.fullname(),
            })
        }
    }
}

fn wrap(value: Value) -> Value {
    match value {
        Value::Optional(_) => value,
        Value::Null => Value::none(),
        other => Value::some(other),
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converter")
            .field("plan", &self.plan.to_string())
            .field("steps", &self.steps)
            .field("overflow", &self.overflow)
            .finish_non_exhaustive()
    }
}
