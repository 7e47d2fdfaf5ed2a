//! # dotconv Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the dotconv library. Import this module to get quick access to the essential
//! types for classifying and performing conversions.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all dotconv operations
pub use crate::Error;

/// The result type used throughout dotconv
pub use crate::Result;

/// Engine configuration
pub use crate::config::ConversionConfig;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// Classification and converter entry point
pub use crate::engine::ConversionEngine;

// ================================================================================================
// Type System
// ================================================================================================

/// Type descriptors and the universe owning them
pub use crate::typesystem::{
    ConvertFn, GenericParamFlags, NumericKind, Token, TypeBuilder, TypeDesc, TypeDescRc,
    TypeUniverse, UserConversionOperator, UserOperatorRc, Variance, WellKnown,
};

// ================================================================================================
// Classification
// ================================================================================================

/// Classification results and host extension points
pub use crate::conversion::{
    Classification, ConversionCategory, ConversionKind, ConversionPlan, ConverterProvider,
    NumericCast,
};

// ================================================================================================
// Converters and Values
// ================================================================================================

/// Executable converters and the values they operate on
pub use crate::converter::{
    BoxedValue, CacheStats, ConvStep, ConvValue, Converter, Decimal, Instance, OverflowMode,
    TypedConverter, Value,
};
