//! User-defined conversion resolution.
//!
//! When no standard conversion exists between a source `S` and a target `T`, the operators
//! declared by `S`, `T` (optionals unwrapped) and their base classes are considered. Each
//! candidate operator `X -> Y` is related to the request on both sides:
//!
//! | Relation | Input side | Output side |
//! |----------|------------|-------------|
//! | Exact | `X` is `S` | `Y` is `T` |
//! | Implicit | `S -> X` is an implicit standard conversion | `Y -> T` is implicit |
//! | Explicit | `S -> X` is an explicit standard conversion | `Y -> T` is explicit |
//!
//! Operators without any standard conversion on either side are not applicable. The most
//! specific input type is then chosen from the best relation level seen (the source itself
//! for Exact, the most encompassed type for Implicit, the most encompassing type for
//! Explicit), and symmetrically for the output type. Exactly one operator must match both
//! choices; anything else is ambiguous.
//!
//! # Lifting
//!
//! If `S` is optional and an operator takes a non-optional value type, the operator is
//! lifted: the source is unwrapped first. If `T` is optional as well and the operator returns
//! a non-optional value type, the result is wrapped and an empty source yields an empty
//! result instead of failing.

use std::{fmt, sync::Arc};

use dashmap::DashMap;

use crate::{
    conversion::{classifier::classify_standard, ConversionKind, ConversionPlan},
    typesystem::{Token, TypeDescRc, TypeUniverse, UserOperatorRc},
};

/// A resolved user-defined conversion
#[derive(Clone)]
pub struct UserDefinedConversion {
    /// The operator to invoke
    pub operator: UserOperatorRc,
    /// The optional source is unwrapped before the operator runs
    pub wraps_optional_input: bool,
    /// The operator result is wrapped into the optional target
    pub wraps_optional_output: bool,
    /// Standard conversion from the (unwrapped) source to the operator's parameter type
    pub before: Option<Arc<ConversionPlan>>,
    /// Standard conversion from the operator's return type to the (unwrapped) target
    pub after: Option<Arc<ConversionPlan>>,
    /// The whole conversion may be applied implicitly
    pub is_implicit: bool,
}

impl fmt::Debug for UserDefinedConversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserDefinedConversion")
            .field("operator", &self.operator.signature)
            .field("wraps_optional_input", &self.wraps_optional_input)
            .field("wraps_optional_output", &self.wraps_optional_output)
            .field("before", &self.before.as_ref().map(|plan| plan.category()))
            .field("after", &self.after.as_ref().map(|plan| plan.category()))
            .field("is_implicit", &self.is_implicit)
            .finish()
    }
}

/// Outcome of user-defined resolution
#[derive(Debug, Clone)]
pub enum UserDefinedResolution {
    /// Exactly one most specific operator
    Found(UserDefinedConversion),
    /// Several operators are equally specific, or none is most specific
    Ambiguous(Vec<UserOperatorRc>),
    /// No operator is applicable
    NotFound,
}

/// Per-type cache of the operators visible on a type (its own and its base classes'),
/// derived-class operators first
///
/// Entries remember the universe's operator generation they were computed at and are
/// recomputed once new operators have been declared.
#[derive(Default)]
pub struct OperatorCache {
    visible: DashMap<Token, (u64, Arc<Vec<UserOperatorRc>>)>,
}

impl OperatorCache {
    /// Create an empty cache
    #[must_use]
    pub fn new() -> Self {
        OperatorCache {
            visible: DashMap::new(),
        }
    }

    /// Operators declared by `ty` and its base classes, without duplicates
    pub fn visible_operators(
        &self,
        universe: &TypeUniverse,
        ty: &TypeDescRc,
    ) -> Arc<Vec<UserOperatorRc>> {
        let generation = universe.operator_generation();
        if let Some(entry) = self.visible.get(&ty.token) {
            if entry.0 == generation {
                return entry.1.clone();
            }
        }

        let mut operators: Vec<UserOperatorRc> = Vec::new();
        let mut owners = vec![ty.clone()];
        owners.extend(universe.ancestors(ty));
        for owner in &owners {
            for op in universe.operators_declared_by(owner) {
                if !operators.iter().any(|seen| seen.token == op.token) {
                    operators.push(op);
                }
            }
        }

        let operators = Arc::new(operators);
        self.visible
            .insert(ty.token, (generation, operators.clone()));
        operators
    }

    /// Number of cached types
    #[must_use]
    pub fn len(&self) -> usize {
        self.visible.len()
    }

    /// Check if nothing is cached
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }

    /// Drop all cached entries
    pub fn clear(&self) {
        self.visible.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Relation {
    Exact,
    Implicit,
    Explicit,
}

struct Candidate {
    operator: UserOperatorRc,
    input: TypeDescRc,
    output: TypeDescRc,
    from: TypeDescRc,
    to: TypeDescRc,
    lift_in: bool,
    lift_out: bool,
    input_relation: Relation,
    output_relation: Relation,
    before: Option<ConversionKind>,
    after: Option<ConversionKind>,
}

/// How `from` relates to `to`, with the standard conversion bridging them unless identical
fn relation(
    universe: &TypeUniverse,
    from: &TypeDescRc,
    to: &TypeDescRc,
) -> Option<(Relation, Option<ConversionKind>)> {
    if from.token == to.token {
        return Some((Relation::Exact, None));
    }
    let kind = classify_standard(universe, from, to)?;
    let relation = if kind.is_implicit() {
        Relation::Implicit
    } else {
        Relation::Explicit
    };
    Some((relation, Some(kind)))
}

fn is_implicit_standard(universe: &TypeUniverse, from: &TypeDescRc, to: &TypeDescRc) -> bool {
    from.token == to.token
        || classify_standard(universe, from, to).is_some_and(|kind| kind.is_implicit())
}

fn unique_types(types: impl Iterator<Item = TypeDescRc>) -> Vec<TypeDescRc> {
    let mut unique: Vec<TypeDescRc> = Vec::new();
    for ty in types {
        if !unique.iter().any(|seen| seen.token == ty.token) {
            unique.push(ty);
        }
    }
    unique
}

/// The single type in `types` from which every other type is implicitly reachable
fn most_encompassed(universe: &TypeUniverse, types: &[TypeDescRc]) -> Option<Token> {
    let matches: Vec<Token> = types
        .iter()
        .filter(|x| types.iter().all(|y| is_implicit_standard(universe, x, y)))
        .map(|x| x.token)
        .collect();
    match matches.as_slice() {
        [single] => Some(*single),
        _ => None,
    }
}

/// The single type in `types` that every other type implicitly reaches
fn most_encompassing(universe: &TypeUniverse, types: &[TypeDescRc]) -> Option<Token> {
    let matches: Vec<Token> = types
        .iter()
        .filter(|x| types.iter().all(|y| is_implicit_standard(universe, y, x)))
        .map(|x| x.token)
        .collect();
    match matches.as_slice() {
        [single] => Some(*single),
        _ => None,
    }
}

fn standard_plan(
    from: &TypeDescRc,
    to: &TypeDescRc,
    kind: Option<&ConversionKind>,
) -> Option<Arc<ConversionPlan>> {
    kind.map(|kind| Arc::new(ConversionPlan::new(from.clone(), to.clone(), kind.clone())))
}

/// Find the most specific user-defined operator converting `source` to `target`
#[must_use]
pub fn resolve_user_defined(
    universe: &TypeUniverse,
    cache: &OperatorCache,
    source: &TypeDescRc,
    target: &TypeDescRc,
) -> UserDefinedResolution {
    let inner_source = universe.unwrap_optional(source);
    let inner_target = universe.unwrap_optional(target);

    let mut pool: Vec<UserOperatorRc> = Vec::new();
    for owner in [&inner_source, &inner_target] {
        for op in cache.visible_operators(universe, owner).iter() {
            if !pool.iter().any(|seen| seen.token == op.token) {
                pool.push(op.clone());
            }
        }
    }
    if pool.is_empty() {
        return UserDefinedResolution::NotFound;
    }

    let mut candidates: Vec<Candidate> = Vec::new();
    for operator in pool {
        let (Some(input), Some(output)) = (universe.get(operator.input), universe.get(operator.output))
        else {
            continue;
        };

        let lift_in = source.is_optional() && input.is_value_type() && !input.is_optional();
        let lift_out =
            lift_in && target.is_optional() && output.is_value_type() && !output.is_optional();
        let from = if lift_in { inner_source.clone() } else { source.clone() };
        let to = if lift_out { inner_target.clone() } else { target.clone() };

        let Some((input_relation, before)) = relation(universe, &from, &input) else {
            continue;
        };
        let Some((output_relation, after)) = relation(universe, &output, &to) else {
            continue;
        };

        candidates.push(Candidate {
            operator,
            input,
            output,
            from,
            to,
            lift_in,
            lift_out,
            input_relation,
            output_relation,
            before,
            after,
        });
    }

    let Some(best_input) = candidates.iter().map(|c| c.input_relation).min() else {
        return UserDefinedResolution::NotFound;
    };
    let Some(best_output) = candidates.iter().map(|c| c.output_relation).min() else {
        return UserDefinedResolution::NotFound;
    };

    let all_operators = || candidates.iter().map(|c| c.operator.clone()).collect::<Vec<_>>();

    let input_choice = match best_input {
        Relation::Exact => {
            // A non-lifted exact match is preferred over a lifted one
            let exact = candidates
                .iter()
                .filter(|c| c.input_relation == Relation::Exact);
            let direct = exact.clone().find(|c| !c.lift_in).or_else(|| exact.clone().next());
            direct.map(|c| c.input.token)
        }
        Relation::Implicit => {
            let types = unique_types(
                candidates
                    .iter()
                    .filter(|c| c.input_relation == Relation::Implicit)
                    .map(|c| c.input.clone()),
            );
            most_encompassed(universe, &types)
        }
        Relation::Explicit => {
            let types = unique_types(candidates.iter().map(|c| c.input.clone()));
            most_encompassing(universe, &types)
        }
    };

    let output_choice = match best_output {
        Relation::Exact => {
            let exact = candidates
                .iter()
                .filter(|c| c.output_relation == Relation::Exact);
            let direct = exact.clone().find(|c| !c.lift_out).or_else(|| exact.clone().next());
            direct.map(|c| c.output.token)
        }
        Relation::Implicit => {
            let types = unique_types(
                candidates
                    .iter()
                    .filter(|c| c.output_relation == Relation::Implicit)
                    .map(|c| c.output.clone()),
            );
            most_encompassing(universe, &types)
        }
        Relation::Explicit => {
            let types = unique_types(candidates.iter().map(|c| c.output.clone()));
            most_encompassed(universe, &types)
        }
    };

    let (Some(sx), Some(tx)) = (input_choice, output_choice) else {
        return UserDefinedResolution::Ambiguous(all_operators());
    };

    let selected: Vec<&Candidate> = candidates
        .iter()
        .filter(|c| c.input.token == sx && c.output.token == tx)
        .collect();
    let [winner] = selected.as_slice() else {
        if selected.is_empty() {
            return UserDefinedResolution::Ambiguous(all_operators());
        }
        return UserDefinedResolution::Ambiguous(
            selected.iter().map(|c| c.operator.clone()).collect(),
        );
    };

    let is_implicit = winner.operator.is_implicit
        && winner.input_relation <= Relation::Implicit
        && winner.output_relation <= Relation::Implicit
        && !(winner.lift_in && !winner.lift_out);

    UserDefinedResolution::Found(UserDefinedConversion {
        operator: winner.operator.clone(),
        wraps_optional_input: winner.lift_in,
        wraps_optional_output: winner.lift_out,
        before: standard_plan(&winner.from, &winner.input, winner.before.as_ref()),
        after: standard_plan(&winner.output, &winner.to, winner.after.as_ref()),
        is_implicit,
    })
}
