use thiserror::Error;

use crate::typesystem::{NumericKind, Token};

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Classification itself never fails; a missing or ambiguous conversion is reported as a
/// [`crate::conversion::Classification`]. Errors arise when a caller asks for a converter that
/// cannot exist, when the type universe is asked to build something inconsistent, or when a
/// converter fails at runtime for a specific value.
///
/// # Error Categories
///
/// ## Type Universe Errors
/// - [`Error::Malformed`] - Inconsistent input to the type universe
/// - [`Error::TypeNotFound`] - Requested type not registered
/// - [`Error::TypeInsert`] - A type with the same full name already exists
/// - [`Error::TypeError`] - Invalid type or operator construction
///
/// ## Resolution Errors
/// - [`Error::NoConversion`] - No conversion exists between the two types
/// - [`Error::AmbiguousUserConversion`] - Several user operators are equally specific
///
/// ## Runtime Conversion Errors
/// - [`Error::NullOptionalUnwrap`] - An empty optional reached a non-optional target
/// - [`Error::NumericOverflow`] - A checked numeric conversion left the target range
/// - [`Error::InvalidCast`] - Checked downcast or unbox found an incompatible runtime type
/// - [`Error::NullReference`] - A null reference was unboxed into a non-optional value type
/// - [`Error::ValueMismatch`] - A runtime value does not have the expected shape
/// - [`Error::Conversion`] - A user operator or host procedure reported a failure
///
/// # Examples
///
/// ```rust
/// use dotconv::{ConversionEngine, Error, NumericKind, Value};
///
/// let engine = ConversionEngine::new();
/// let universe = engine.universe();
/// let from = universe.numeric(NumericKind::I4);
/// let to = universe.numeric(NumericKind::U1);
///
/// match engine.convert(Value::I4(300), &from, &to) {
///     Err(Error::NumericOverflow { from, to }) => {
///         assert_eq!(from, NumericKind::I4);
///         assert_eq!(to, NumericKind::U1);
///     }
///     other => panic!("unexpected result: {other:?}"),
/// }
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Input to the type universe was inconsistent.
    ///
    /// The error includes the source location where the problem was detected.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// Failed to find type in the `TypeUniverse`.
    ///
    /// The associated [`Token`] identifies which type was not found.
    #[error("Failed to find type in TypeUniverse - {0}")]
    TypeNotFound(Token),

    /// Failed to insert a new type into the `TypeUniverse`.
    ///
    /// Raised when a declared type reuses the full name of an existing type.
    #[error("Failed to insert new type into TypeUniverse - {0}")]
    TypeInsert(String),

    /// General error during type or operator construction.
    #[error("{0}")]
    TypeError(String),

    /// No predefined, user-defined or host conversion exists between the two types.
    #[error("No conversion exists from '{from}' to '{to}'")]
    NoConversion {
        /// Full name of the source type
        from: String,
        /// Full name of the target type
        to: String,
    },

    /// More than one user-defined operator is equally specific for the requested pair.
    ///
    /// Distinct from [`Error::NoConversion`] so callers can report overlapping operators.
    #[error("Ambiguous user-defined conversion from '{from}' to '{to}' - candidates: {}", candidates.join(", "))]
    AmbiguousUserConversion {
        /// Full name of the source type
        from: String,
        /// Full name of the target type
        to: String,
        /// Display names of the competing operators
        candidates: Vec<String>,
    },

    /// An empty optional was converted to a non-optional type.
    #[error("Nullable object must have a value - cannot convert empty optional to '{target}'")]
    NullOptionalUnwrap {
        /// Full name of the non-optional target type
        target: String,
    },

    /// A checked numeric conversion produced a value outside the target range.
    #[error("Arithmetic operation resulted in an overflow - {from} to {to}")]
    NumericOverflow {
        /// The numeric kind converted from
        from: NumericKind,
        /// The numeric kind converted to
        to: NumericKind,
    },

    /// A checked downcast or unbox found an incompatible runtime type.
    #[error("Unable to cast object of type '{from}' to type '{to}'")]
    InvalidCast {
        /// Full name of the runtime type
        from: String,
        /// Full name of the requested type
        to: String,
    },

    /// A null reference was unboxed into a non-optional value type.
    #[error("Object reference not set to an instance of an object - unboxing to '{target}'")]
    NullReference {
        /// Full name of the value type being unboxed to
        target: String,
    },

    /// A runtime value does not have the shape the converter expects.
    #[error("Value mismatch - expected {expected}, found {found}")]
    ValueMismatch {
        /// Description of the expected value shape
        expected: String,
        /// Description of the value that was supplied
        found: String,
    },

    /// A user operator or host procedure reported a failure.
    #[error("Conversion failed - {0}")]
    Conversion(String),
}
