//! Reference conversions.
//!
//! Implements the lattice of implicit and explicit reference conversions between classes,
//! interfaces, arrays and delegates, including conversions between instantiations of variant
//! generic interfaces and delegates, and the target checks used by boxing and unboxing.
//!
//! # Implicit Reference Conversions
//!
//! - Any reference type to `System.Object`
//! - A class to any of its base classes
//! - A class, array, delegate or string to any interface it implements
//! - An interface to any interface it inherits
//! - `S[]` to `T[]` of the same rank when `S` converts implicitly by reference to `T`
//! - `S[]` (rank 1) to the generic list family over `T` when `S` is `T` or converts implicitly
//!   by reference to it
//! - Variance: `G<A>` to `G<B>` when every argument satisfies the declared variance
//!
//! # Explicit Reference Conversions
//!
//! - `System.Object` to any reference type
//! - A class to any of its derived classes
//! - A non-sealed class to an interface it does not implement
//! - An interface to a class that is not sealed or implements it
//! - An interface to an interface it does not inherit
//! - Arrays and the list family where the element types convert explicitly by reference
//! - Variance: `G<A>` to `G<B>` under the relaxed explicit variance rules
//!
//! Unrelated classes never convert into each other.

use crate::typesystem::{TypeDesc, TypeDescRc, TypeFlavor, TypeUniverse, Variance, WellKnown};

/// Check if `source` converts to `target` by an implicit reference conversion
///
/// Identity is not included; both types must be reference types.
#[must_use]
pub fn is_implicit_reference(universe: &TypeUniverse, source: &TypeDesc, target: &TypeDesc) -> bool {
    if source.token == target.token || !source.is_reference_type() || !target.is_reference_type() {
        return false;
    }

    if universe.is_well_known(target, WellKnown::Object) {
        return true;
    }

    if target.is_interface() {
        if is_variant_convertible(universe, source, target, Direction::Implicit)
            || implements_variant(universe, source, target)
        {
            return true;
        }
        if let Some(element) = single_dimension_element(universe, source) {
            return list_family_accepts(universe, &element, target, Direction::Implicit);
        }
        return false;
    }

    if universe.is_subclass_of(source, target) {
        return true;
    }

    if let (TypeFlavor::Array { rank: s_rank }, TypeFlavor::Array { rank: t_rank }) =
        (source.flavor, target.flavor)
    {
        if s_rank == t_rank {
            if let (Some(se), Some(te)) = (universe.element_of(source), universe.element_of(target)) {
                return is_implicit_reference(universe, &se, &te);
            }
        }
        return false;
    }

    is_variant_convertible(universe, source, target, Direction::Implicit)
}

/// Check if `source` converts to `target` by an explicit reference conversion
///
/// Returns `false` when an implicit reference conversion exists; both types must be reference
/// types.
#[must_use]
pub fn is_explicit_reference(universe: &TypeUniverse, source: &TypeDesc, target: &TypeDesc) -> bool {
    if source.token == target.token
        || !source.is_reference_type()
        || !target.is_reference_type()
        || is_implicit_reference(universe, source, target)
    {
        return false;
    }

    if universe.is_well_known(source, WellKnown::Object) {
        return true;
    }

    match (source.is_interface(), target.is_interface()) {
        (false, false) => {
            if universe.is_subclass_of(target, source) {
                return true;
            }
            if let (TypeFlavor::Array { rank: s_rank }, TypeFlavor::Array { rank: t_rank }) =
                (source.flavor, target.flavor)
            {
                if s_rank == t_rank {
                    if let (Some(se), Some(te)) =
                        (universe.element_of(source), universe.element_of(target))
                    {
                        return is_explicit_reference(universe, &se, &te);
                    }
                }
                return false;
            }
            is_variant_convertible(universe, source, target, Direction::Explicit)
        }
        (false, true) => {
            if let Some(element) = single_dimension_element(universe, source) {
                if list_family_accepts(universe, &element, target, Direction::Explicit) {
                    return true;
                }
            }
            !source.is_sealed()
        }
        (true, false) => {
            if let Some(element) = single_dimension_element(universe, target) {
                if list_family_accepts(universe, &element, source, Direction::Explicit) {
                    return true;
                }
            }
            !target.is_sealed() || universe.implements(target, source)
        }
        (true, true) => true,
    }
}

/// Check if a value of type `value_type` boxes to `target`
///
/// The target must be `System.Object`, `System.ValueType`, `System.Enum` for enumerations, or
/// an interface implemented by the value type (variance included). Optionals box as their inner
/// type.
#[must_use]
pub fn is_boxing_target(universe: &TypeUniverse, value_type: &TypeDescRc, target: &TypeDesc) -> bool {
    if !value_type.is_value_type() || !target.is_reference_type() {
        return false;
    }
    let inner = universe.unwrap_optional(value_type);

    match universe.well_known_kind(target.token) {
        Some(WellKnown::Object | WellKnown::ValueType) => true,
        Some(WellKnown::Enum) => inner.is_enum(),
        _ => target.is_interface() && implements_variant(universe, &inner, target),
    }
}

/// Check if `ty` implements `iface`, either directly or through a variant-compatible
/// instantiation of the same generic interface
#[must_use]
pub fn implements_variant(universe: &TypeUniverse, ty: &TypeDesc, iface: &TypeDesc) -> bool {
    if ty.is_interface() && ty.token == iface.token {
        return false;
    }
    universe.interfaces_of(ty).iter().any(|candidate| {
        candidate.token == iface.token
            || is_variant_convertible(universe, candidate, iface, Direction::Implicit)
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Implicit,
    Explicit,
}

/// Check if two instantiations of the same variant generic interface or delegate convert into
/// each other
fn is_variant_convertible(
    universe: &TypeUniverse,
    source: &TypeDesc,
    target: &TypeDesc,
    direction: Direction,
) -> bool {
    let (Some(s_def), Some(t_def)) = (source.generic_definition, target.generic_definition) else {
        return false;
    };
    if s_def != t_def || !matches!(source.flavor, TypeFlavor::Interface | TypeFlavor::Delegate) {
        return false;
    }
    let Some(definition) = universe.get(s_def) else {
        return false;
    };
    if definition.generic_params.len() != source.generic_args.len()
        || source.generic_args.len() != target.generic_args.len()
    {
        return false;
    }

    let s_args = universe.generic_args_of(source);
    let t_args = universe.generic_args_of(target);
    definition
        .generic_params
        .iter()
        .zip(s_args.iter().zip(t_args.iter()))
        .all(|(param, (a, b))| {
            if a.token == b.token {
                return true;
            }
            match (param.variance(), direction) {
                (Variance::Invariant, _) => false,
                (Variance::Covariant, Direction::Implicit) => is_implicit_reference(universe, a, b),
                (Variance::Contravariant, Direction::Implicit) => {
                    is_implicit_reference(universe, b, a)
                }
                (Variance::Covariant, Direction::Explicit) => {
                    is_implicit_reference(universe, a, b) || is_explicit_reference(universe, a, b)
                }
                (Variance::Contravariant, Direction::Explicit) => {
                    a.is_reference_type() && b.is_reference_type()
                }
            }
        })
}

/// The element type of a single-dimension array
fn single_dimension_element(universe: &TypeUniverse, ty: &TypeDesc) -> Option<TypeDescRc> {
    match ty.flavor {
        TypeFlavor::Array { rank: 1 } => universe.element_of(ty),
        _ => None,
    }
}

/// Check if `list` is an instantiation of the generic list family whose argument relates to
/// `element` as required
fn list_family_accepts(
    universe: &TypeUniverse,
    element: &TypeDesc,
    list: &TypeDesc,
    direction: Direction,
) -> bool {
    let Some(definition) = list.generic_definition else {
        return false;
    };
    if !universe
        .well_known_kind(definition)
        .is_some_and(|wk| wk.is_list_family())
    {
        return false;
    }
    let Some(argument) = list.generic_args.first().and_then(|arg| universe.get(*arg)) else {
        return false;
    };

    if argument.token == element.token {
        return true;
    }
    match direction {
        Direction::Implicit => is_implicit_reference(universe, element, &argument),
        Direction::Explicit => {
            is_implicit_reference(universe, element, &argument)
                || is_explicit_reference(universe, element, &argument)
                || is_implicit_reference(universe, &argument, element)
        }
    }
}
