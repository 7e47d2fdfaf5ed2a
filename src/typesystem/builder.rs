//! Builder for declared types.
//!
//! This module provides the [`TypeBuilder`] struct, which offers a fluent API for declaring
//! classes, value types, interfaces, enumerations and delegates together with their generic
//! parameters and conversion operators, and registering them in a [`TypeUniverse`].
//!
//! # Example
//!
//! ```rust
//! use dotconv::{
//!     converter::Value,
//!     typesystem::{NumericKind, TypeBuilder, TypeUniverse},
//! };
//!
//! let universe = TypeUniverse::new();
//! let int32 = universe.numeric(NumericKind::I4);
//!
//! let builder = TypeBuilder::new(&universe).value_type("Finance", "Money");
//! let money = builder.token();
//! let money = builder
//!     .implicit_operator(int32.token, money, |value| Ok(value))
//!     .build()?;
//!
//! assert_eq!(universe.operators_declared_by(&money).len(), 1);
//! # Ok::<(), dotconv::Error>(())
//! ```

use std::sync::Arc;

use crate::{
    converter::Value,
    typesystem::{
        ConvertFn, GenericParam, GenericParamFlags, NumericKind, Token, TypeDesc, TypeDescRc,
        TypeFlags, TypeFlavor, TypeUniverse, WellKnown,
    },
    Error::TypeError,
    Result,
};

struct PendingOperator {
    input: Token,
    output: Token,
    is_implicit: bool,
    procedure: ConvertFn,
}

/// Provides a fluent API for declaring types
pub struct TypeBuilder<'a> {
    universe: &'a TypeUniverse,
    token: Token,
    kind: Option<(String, String, TypeFlavor)>,
    base: Option<Token>,
    interfaces: Vec<Token>,
    flags: TypeFlags,
    generic_params: Vec<GenericParam>,
    operators: Vec<PendingOperator>,
    error: Option<crate::Error>,
}

impl<'a> TypeBuilder<'a> {
    /// Create a new builder; the token of the future type is allocated immediately so that
    /// operators can refer to it before [`TypeBuilder::build`]
    #[must_use]
    pub fn new(universe: &'a TypeUniverse) -> Self {
        TypeBuilder {
            universe,
            token: universe.alloc_token(),
            kind: None,
            base: None,
            interfaces: Vec::new(),
            flags: TypeFlags::empty(),
            generic_params: Vec::new(),
            operators: Vec::new(),
            error: None,
        }
    }

    /// The token the built type will carry
    #[must_use]
    pub fn token(&self) -> Token {
        self.token
    }

    fn set_kind(mut self, namespace: &str, name: &str, flavor: TypeFlavor) -> Self {
        if self.kind.is_some() {
            self.error
                .get_or_insert(malformed_error!("Type kind already set for {}", name));
        } else {
            self.kind = Some((namespace.to_string(), name.to_string(), flavor));
        }
        self
    }

    /// Declare a class
    #[must_use]
    pub fn class(self, namespace: &str, name: &str) -> Self {
        self.set_kind(namespace, name, TypeFlavor::Class)
    }

    /// Declare a value type (struct)
    #[must_use]
    pub fn value_type(self, namespace: &str, name: &str) -> Self {
        self.set_kind(namespace, name, TypeFlavor::Struct)
    }

    /// Declare an interface
    #[must_use]
    pub fn interface(self, namespace: &str, name: &str) -> Self {
        self.set_kind(namespace, name, TypeFlavor::Interface)
    }

    /// Declare an enumeration stored as `underlying`
    #[must_use]
    pub fn enumeration(self, namespace: &str, name: &str, underlying: NumericKind) -> Self {
        self.set_kind(namespace, name, TypeFlavor::Enum { underlying })
    }

    /// Declare a delegate type
    #[must_use]
    pub fn delegate(self, namespace: &str, name: &str) -> Self {
        self.set_kind(namespace, name, TypeFlavor::Delegate)
    }

    /// Set the base class
    #[must_use]
    pub fn extends(mut self, base: Token) -> Self {
        if self.base.is_some() {
            self.error
                .get_or_insert(malformed_error!("Base type already set"));
        }
        self.base = Some(base);
        self
    }

    /// Add an implemented interface (or, for interfaces, an inherited one)
    #[must_use]
    pub fn implements(mut self, iface: Token) -> Self {
        if !self.interfaces.contains(&iface) {
            self.interfaces.push(iface);
        }
        self
    }

    /// Mark the type as sealed
    #[must_use]
    pub fn sealed(mut self) -> Self {
        self.flags |= TypeFlags::SEALED;
        self
    }

    /// Mark the type as abstract
    #[must_use]
    pub fn abstract_type(mut self) -> Self {
        self.flags |= TypeFlags::ABSTRACT;
        self
    }

    /// Add a generic parameter, turning the type into a generic definition
    #[must_use]
    pub fn generic_param(mut self, name: &str, flags: GenericParamFlags) -> Self {
        self.flags |= TypeFlags::GENERIC_DEFINITION;
        self.generic_params.push(GenericParam::new(name, flags));
        self
    }

    /// Declare an `op_Implicit` from `input` to `output`
    #[must_use]
    pub fn implicit_operator<F>(self, input: Token, output: Token, procedure: F) -> Self
    where
        F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
    {
        self.operator(input, output, true, Arc::new(procedure))
    }

    /// Declare an `op_Explicit` from `input` to `output`
    #[must_use]
    pub fn explicit_operator<F>(self, input: Token, output: Token, procedure: F) -> Self
    where
        F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
    {
        self.operator(input, output, false, Arc::new(procedure))
    }

    fn operator(mut self, input: Token, output: Token, is_implicit: bool, procedure: ConvertFn) -> Self {
        self.operators.push(PendingOperator {
            input,
            output,
            is_implicit,
            procedure,
        });
        self
    }

    /// Register the type and its operators in the universe
    ///
    /// # Errors
    /// Returns an error if no kind was chosen, a builder call was inconsistent, or the universe
    /// rejects the type or one of its operators.
    pub fn build(self) -> Result<TypeDescRc> {
        if let Some(error) = self.error {
            return Err(error);
        }
        let Some((namespace, name, flavor)) = self.kind else {
            return Err(malformed_error!("Type kind was never set"));
        };

        let mut flags = self.flags;
        let default_base = match flavor {
            TypeFlavor::Class => Some(WellKnown::Object),
            TypeFlavor::Struct => {
                flags |= TypeFlags::SEALED;
                Some(WellKnown::ValueType)
            }
            TypeFlavor::Enum { underlying } => {
                if !underlying.is_integral() || underlying == NumericKind::Char {
                    return Err(TypeError(format!(
                        "Enum {namespace}.{name} needs an integral underlying type, got {underlying}"
                    )));
                }
                flags |= TypeFlags::SEALED;
                Some(WellKnown::Enum)
            }
            TypeFlavor::Delegate => {
                flags |= TypeFlags::SEALED;
                Some(WellKnown::MulticastDelegate)
            }
            _ => None,
        };

        let base = match (flavor, self.base) {
            (TypeFlavor::Class, Some(base)) => Some(base),
            (TypeFlavor::Interface, Some(_)) => {
                return Err(TypeError(format!(
                    "Interface {namespace}.{name} cannot have a base class"
                )));
            }
            (_, Some(_)) => {
                return Err(TypeError(format!(
                    "{namespace}.{name} cannot choose its base class"
                )));
            }
            (_, None) => default_base.map(|wk| self.universe.well_known(wk).token),
        };

        let mut desc = TypeDesc::new(self.token, namespace, name, flavor, flags);
        desc.base = base;
        desc.interfaces = self.interfaces;
        desc.generic_params = self.generic_params;

        let desc = self.universe.register(desc)?;
        for op in self.operators {
            self.universe.declare_operator(
                desc.token,
                op.input,
                op.output,
                op.is_implicit,
                op.procedure,
            )?;
        }
        Ok(desc)
    }
}
