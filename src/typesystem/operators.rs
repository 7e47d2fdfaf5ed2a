//! Declared user conversion operators.

use std::{fmt, sync::Arc};

use crate::{converter::Value, typesystem::Token, Result};

/// A conversion procedure supplied by the host, operating on runtime values
pub type ConvertFn = Arc<dyn Fn(Value) -> Result<Value> + Send + Sync>;

/// Reference to a `UserConversionOperator`
pub type UserOperatorRc = Arc<UserConversionOperator>;

/// A static `op_Implicit` / `op_Explicit` declared by a type.
///
/// Operators are registered through [`crate::typesystem::TypeUniverse::declare_operator`] (or
/// the [`crate::typesystem::TypeBuilder`]), which validates that either the input or the output
/// is the declaring type, possibly wrapped in an optional.
pub struct UserConversionOperator {
    /// Identity of the operator
    pub token: Token,
    /// The type declaring the operator
    pub declaring_type: Token,
    /// Formal parameter type
    pub input: Token,
    /// Formal return type
    pub output: Token,
    /// `true` for `op_Implicit`, `false` for `op_Explicit`
    pub is_implicit: bool,
    /// Human readable signature, e.g. `Money.op_Implicit(System.Int32) -> Money`
    pub signature: String,
    procedure: ConvertFn,
}

impl UserConversionOperator {
    pub(crate) fn new(
        token: Token,
        declaring_type: Token,
        input: Token,
        output: Token,
        is_implicit: bool,
        signature: String,
        procedure: ConvertFn,
    ) -> Self {
        UserConversionOperator {
            token,
            declaring_type,
            input,
            output,
            is_implicit,
            signature,
            procedure,
        }
    }

    /// The metadata name of the operator method
    #[must_use]
    pub fn name(&self) -> &'static str {
        if self.is_implicit {
            "op_Implicit"
        } else {
            "op_Explicit"
        }
    }

    /// Invoke the operator on a value of its formal input type
    ///
    /// # Errors
    /// Returns whatever error the operator's procedure reports.
    pub fn invoke(&self, value: Value) -> Result<Value> {
        (self.procedure)(value)
    }
}

impl fmt::Debug for UserConversionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserConversionOperator")
            .field("token", &self.token)
            .field("declaring_type", &self.declaring_type)
            .field("input", &self.input)
            .field("output", &self.output)
            .field("is_implicit", &self.is_implicit)
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for UserConversionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.signature)
    }
}
