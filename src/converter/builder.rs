//! Lowering of conversion plans to primitive steps.
//!
//! A lifted conversion (an empty source produces an empty result) lowers to a single
//! [`ConvStep::Lift`] holding the steps for the unwrapped value. An empty value therefore skips
//! only that nested program, and any steps around it still run.

use crate::{
    conversion::{CastOp, ConversionKind, ConversionPlan, NullableConversion, NumericCast},
    converter::ConvStep,
    typesystem::TypeUniverse,
};

/// The step sequence executing `plan`
pub(crate) fn build_steps(universe: &TypeUniverse, plan: &ConversionPlan) -> Vec<ConvStep> {
    let mut steps = Vec::new();
    lower(universe, plan, &mut steps);
    steps
}

fn lower(universe: &TypeUniverse, plan: &ConversionPlan, steps: &mut Vec<ConvStep>) {
    match &plan.kind {
        ConversionKind::Identity => {}
        ConversionKind::ImplicitNumeric(cast)
        | ConversionKind::ExplicitNumeric(cast)
        | ConversionKind::Enum(cast) => numeric(cast, steps),
        ConversionKind::ImplicitNullable(nullable) | ConversionKind::ExplicitNullable(nullable) => {
            lower_nullable(nullable, steps);
        }
        ConversionKind::Box => steps.push(ConvStep::Box {
            ty: universe.unwrap_optional(&plan.source).token,
        }),
        ConversionKind::Unbox => steps.push(ConvStep::Unbox {
            target: universe.unwrap_optional(&plan.target),
            nullable: plan.target.is_optional(),
        }),
        ConversionKind::ImplicitReference => steps.push(ConvStep::Upcast),
        ConversionKind::ExplicitReference => steps.push(ConvStep::Downcast {
            target: plan.target.clone(),
        }),
        ConversionKind::UserDefined(conversion) => {
            let mut call = Vec::new();
            if let Some(before) = &conversion.before {
                lower(universe, before, &mut call);
            }
            call.push(ConvStep::Invoke(conversion.operator.clone()));
            if let Some(after) = &conversion.after {
                lower(universe, after, &mut call);
            }

            match (conversion.wraps_optional_input, conversion.wraps_optional_output) {
                (true, true) => steps.push(ConvStep::Lift(call)),
                (true, false) => {
                    steps.push(ConvStep::UnwrapOptional);
                    steps.extend(call);
                }
                (false, _) => steps.extend(call),
            }
        }
        ConversionKind::Host(conversion) => {
            if let Some(before) = &conversion.before {
                lower(universe, before, steps);
            }
            steps.push(ConvStep::InvokeHost(conversion.procedure.clone()));
            if let Some(after) = &conversion.after {
                lower(universe, after, steps);
            }
        }
    }
}

fn lower_nullable(nullable: &NullableConversion, steps: &mut Vec<ConvStep>) {
    let mut value = Vec::new();
    match nullable.underlying.as_ref() {
        ConversionKind::ImplicitNumeric(cast)
        | ConversionKind::ExplicitNumeric(cast)
        | ConversionKind::Enum(cast) => numeric(cast, &mut value),
        _ => {}
    }

    if nullable.propagates_empty() {
        steps.push(ConvStep::Lift(value));
        return;
    }
    if nullable.unwrap_input {
        steps.push(ConvStep::UnwrapOptional);
    }
    steps.extend(value);
    if nullable.wrap_output {
        steps.push(ConvStep::WrapOptional);
    }
}

fn numeric(cast: &NumericCast, steps: &mut Vec<ConvStep>) {
    // Enum to underlying and back of the same width
    if cast.op != CastOp::Identity {
        steps.push(ConvStep::Numeric(*cast));
    }
}
