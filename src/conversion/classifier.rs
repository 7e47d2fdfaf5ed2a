//! The precedence-ordered conversion classifier.

use std::sync::Arc;

use tracing::debug;

use crate::{
    config::ConversionConfig,
    conversion::{
        host::HostRegistry,
        numeric::{numeric_conversion, NumericRelation},
        reference::{is_boxing_target, is_explicit_reference, is_implicit_reference},
        user_defined::{resolve_user_defined, OperatorCache, UserDefinedResolution},
        Classification, ConversionKind, ConversionPlan, NullableConversion,
    },
    typesystem::{TypeDescRc, TypeUniverse},
};

/// Classify a pair using only the standard conversions (identity, numeric, enumeration,
/// nullable, boxing, unboxing and reference conversions)
///
/// Returns `None` if no standard conversion exists. This never consults user-defined
/// operators or host converters.
#[must_use]
pub fn classify_standard(
    universe: &TypeUniverse,
    source: &TypeDescRc,
    target: &TypeDescRc,
) -> Option<ConversionKind> {
    if source.token == target.token {
        return Some(ConversionKind::Identity);
    }

    if let Some(kind) = classify_value(universe, source, target) {
        return Some(kind);
    }

    if source.is_value_type() && target.is_reference_type() {
        return is_boxing_target(universe, source, target).then_some(ConversionKind::Box);
    }

    if source.is_reference_type() && target.is_value_type() {
        return is_boxing_target(universe, target, source).then_some(ConversionKind::Unbox);
    }

    if is_implicit_reference(universe, source, target) {
        return Some(ConversionKind::ImplicitReference);
    }
    if is_explicit_reference(universe, source, target) {
        return Some(ConversionKind::ExplicitReference);
    }

    None
}

/// Numeric, enumeration and nullable conversions between value types
fn classify_value(
    universe: &TypeUniverse,
    source: &TypeDescRc,
    target: &TypeDescRc,
) -> Option<ConversionKind> {
    if !source.is_value_type() || !target.is_value_type() {
        return None;
    }

    let inner_source = universe.unwrap_optional(source);
    let inner_target = universe.unwrap_optional(target);

    let core = if inner_source.token == inner_target.token {
        ConversionKind::Identity
    } else {
        let from = inner_source.numeric_kind()?;
        let to = inner_target.numeric_kind()?;
        let conversion = numeric_conversion(from, to);
        if inner_source.is_enum() || inner_target.is_enum() {
            ConversionKind::Enum(conversion.cast)
        } else {
            match conversion.relation {
                NumericRelation::Identity | NumericRelation::Implicit => {
                    ConversionKind::ImplicitNumeric(conversion.cast)
                }
                NumericRelation::Explicit => ConversionKind::ExplicitNumeric(conversion.cast),
            }
        }
    };

    let unwrap_input = source.is_optional();
    let wrap_output = target.is_optional();
    if !unwrap_input && !wrap_output {
        return Some(core);
    }

    // S? -> T requires a value at runtime and is never implicit
    let implicit = core.is_implicit() && wrap_output;
    let nullable = NullableConversion {
        unwrap_input,
        wrap_output,
        underlying: Box::new(core),
    };
    Some(if implicit {
        ConversionKind::ImplicitNullable(nullable)
    } else {
        ConversionKind::ExplicitNullable(nullable)
    })
}

/// The full classifier: standard conversions, then user-defined operators, then host
/// converters, as enabled by the configuration
pub struct Classifier<'a> {
    universe: &'a TypeUniverse,
    operators: &'a OperatorCache,
    host: &'a HostRegistry,
    config: &'a ConversionConfig,
}

impl<'a> Classifier<'a> {
    /// Create a classifier over the given universe and caches
    #[must_use]
    pub fn new(
        universe: &'a TypeUniverse,
        operators: &'a OperatorCache,
        host: &'a HostRegistry,
        config: &'a ConversionConfig,
    ) -> Self {
        Classifier {
            universe,
            operators,
            host,
            config,
        }
    }

    /// Classify a (source, target) pair
    #[must_use]
    pub fn classify(&self, source: &TypeDescRc, target: &TypeDescRc) -> Classification {
        if let Some(kind) = classify_standard(self.universe, source, target) {
            return Classification::Convertible(self.plan(source, target, kind));
        }

        if self.config.user_defined {
            match resolve_user_defined(self.universe, self.operators, source, target) {
                UserDefinedResolution::Found(conversion) => {
                    return Classification::Convertible(self.plan(
                        source,
                        target,
                        ConversionKind::UserDefined(conversion),
                    ));
                }
                UserDefinedResolution::Ambiguous(candidates) => {
                    debug!(
                        from = %source.fullname(),
                        to = %target.fullname(),
                        candidates = candidates.len(),
                        "ambiguous user-defined conversion"
                    );
                    return Classification::Ambiguous(candidates);
                }
                UserDefinedResolution::NotFound => {}
            }
        }

        if self.config.host_converters {
            if let Some(conversion) = self.host.resolve(self.universe, source, target) {
                return Classification::Convertible(self.plan(
                    source,
                    target,
                    ConversionKind::Host(conversion),
                ));
            }
        }

        Classification::NoConversion
    }

    fn plan(&self, source: &TypeDescRc, target: &TypeDescRc, kind: ConversionKind) -> Arc<ConversionPlan> {
        Arc::new(ConversionPlan::new(source.clone(), target.clone(), kind))
    }
}
