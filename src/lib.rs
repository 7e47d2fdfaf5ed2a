// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(dead_code)]

//! # dotconv
//!
//! A type-conversion resolution engine following the conversion rules of the .NET Common
//! Type System. Given two type descriptors, `dotconv` decides whether a value of the first can
//! be converted to the second, classifies how (identity, numeric, enumeration, nullable,
//! boxing, reference, user-defined or host-provided), and hands out cached, executable
//! converters that behave like the corresponding CIL instruction sequences.
//!
//! ## Features
//!
//! - **Complete standard conversions** - The ECMA-335 numeric table, enumerations, `Nullable<T>`
//!   lifting, boxing, unboxing, and the reference lattice including arrays and variance
//! - **User-defined operators** - `op_Implicit` / `op_Explicit` resolution with most-specific
//!   selection, lifting over optionals, and ambiguity reporting
//! - **Host converters** - Register closures or providers for pairs the type system cannot
//!   relate
//! - **Shared converters** - Every pair is classified once, every converter built once, safely
//!   across threads
//!
//! ## Quick Start
//!
//! ```rust
//! use dotconv::prelude::*;
//!
//! let engine = ConversionEngine::new();
//! let u = engine.universe();
//! let int64 = u.numeric(NumericKind::I8);
//! let int32 = u.numeric(NumericKind::I4);
//!
//! let narrowing = engine.converter(&int64, &int32)?;
//! assert!(!narrowing.is_implicit());
//! assert_eq!(narrowing.convert(Value::I8(42))?, Value::I4(42));
//! assert!(narrowing.convert(Value::I8(i64::MAX)).is_err());
//! # Ok::<(), dotconv::Error>(())
//! ```
//!
//! ## User-defined Operators
//!
//! ```rust
//! use dotconv::prelude::*;
//!
//! let engine = ConversionEngine::new();
//! let u = engine.universe();
//! let double = u.numeric(NumericKind::R8);
//!
//! let celsius = TypeBuilder::new(u).value_type("Units", "Celsius");
//! let token = celsius.token();
//! let celsius = celsius
//!     .explicit_operator(token, double.token, |value| match value {
//!         Value::Instance(instance) => Ok(Value::R8(*instance.payload::<f64>().unwrap_or(&0.0))),
//!         other => Ok(other),
//!     })
//!     .build()?;
//!
//! let classification = engine.classify(&celsius, &double);
//! assert_eq!(classification.category(), Some(ConversionCategory::UserDefined));
//! # Ok::<(), dotconv::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`typesystem`] - Type descriptors, the append-only [`TypeUniverse`] and declared operators
//! - [`conversion`] - The precedence-ordered classifier and its rule families
//! - [`converter`] - Runtime values, executable converters and the converter cache
//! - [`engine`] - [`ConversionEngine`], the entry point tying everything together
//! - [`config`] - [`ConversionConfig`] presets and builders
//! - [`Error`] and [`Result`] - Error handling
//!
//! ## Standards Compliance
//!
//! Conversion semantics follow **ECMA-335** (6th edition), Partition I §8.7 (assignment
//! compatibility) and Partition III (`conv`, `conv.ovf`, `box`, `unbox.any`, `castclass`), and
//! the C# language rules for user-defined conversions.
//!
//! ## Logging
//!
//! The engine emits [`tracing`] events at `debug` level for every classification, operator
//! declaration and host registration. Install any `tracing` subscriber to observe them.
#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use dotconv::prelude::*;
///
/// let engine = ConversionEngine::new();
/// let object = engine.universe().well_known(WellKnown::Object);
/// let string = engine.universe().well_known(WellKnown::String);
/// assert!(engine.classify(&object, &string).is_convertible());
/// ```
pub mod prelude;

/// Type descriptors, the type universe and declared conversion operators
pub mod typesystem;

/// Classification of conversions between two types
pub mod conversion;

/// Runtime values and executable converters
pub mod converter;

/// Engine configuration
pub mod config;

/// The conversion engine
pub mod engine;

/// `dotconv` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `dotconv` Error type
///
/// See [`error::Error`](Error) for the list of failure categories.
pub use error::Error;

/// The entry point for classification and conversion
pub use engine::ConversionEngine;

/// Engine configuration
pub use config::ConversionConfig;

/// Classification results
pub use conversion::{Classification, ConversionCategory, ConversionKind, ConversionPlan};

/// Converters and runtime values
pub use converter::{ConvValue, Converter, Decimal, OverflowMode, TypedConverter, Value};

/// Type system entry points
pub use typesystem::{
    NumericKind, Token, TypeBuilder, TypeDesc, TypeDescRc, TypeUniverse, WellKnown,
};
