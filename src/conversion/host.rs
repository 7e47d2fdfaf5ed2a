//! Host-registered converters.
//!
//! Hosts can supply conversions the type system does not know about, either as a fixed
//! converter for one (input, output) pair or as a [`ConverterProvider`] that is asked for
//! each pair on demand. Host conversions rank below every predefined and user-defined
//! conversion and are always explicit.
//!
//! Registrations are append-only. When several registrations match the same pair, the one
//! registered last wins. A registered converter is also used for pairs of a different shape
//! when the requested source reaches its input type, and its output type reaches the
//! requested target, through implicit standard conversions.

use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use tracing::debug;

use crate::{
    conversion::{classifier::classify_standard, ConversionPlan},
    typesystem::{ConvertFn, Token, TypeDesc, TypeDescRc, TypeUniverse},
};

/// A source of conversion procedures consulted for pairs without a predefined or
/// user-defined conversion
pub trait ConverterProvider: Send + Sync {
    /// Return a procedure converting values of `source` into `target`, if this provider
    /// handles the pair
    fn provide(&self, source: &TypeDesc, target: &TypeDesc) -> Option<ConvertFn>;
}

enum HostEntry {
    Converter {
        input: Token,
        output: Token,
        procedure: ConvertFn,
    },
    Provider(Arc<dyn ConverterProvider>),
}

/// A resolved host conversion
#[derive(Clone)]
pub struct HostConversion {
    /// The procedure to call
    pub procedure: ConvertFn,
    /// Type the procedure accepts
    pub input: Token,
    /// Type the procedure returns
    pub output: Token,
    /// Implicit standard conversion from the requested source to `input`
    pub before: Option<Arc<ConversionPlan>>,
    /// Implicit standard conversion from `output` to the requested target
    pub after: Option<Arc<ConversionPlan>>,
}

impl fmt::Debug for HostConversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostConversion")
            .field("input", &self.input)
            .field("output", &self.output)
            .field("before", &self.before.as_ref().map(|plan| plan.category()))
            .field("after", &self.after.as_ref().map(|plan| plan.category()))
            .finish_non_exhaustive()
    }
}

/// Append-only registry of host converters and providers
pub struct HostRegistry {
    entries: boxcar::Vec<HostEntry>,
    generation: AtomicU64,
}

impl HostRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        HostRegistry {
            entries: boxcar::Vec::new(),
            generation: AtomicU64::new(0),
        }
    }

    /// Register a converter for exactly `input -> output`
    pub fn register_converter(&self, input: &TypeDesc, output: &TypeDesc, procedure: ConvertFn) {
        self.entries.push(HostEntry::Converter {
            input: input.token,
            output: output.token,
            procedure,
        });
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        debug!(
            from = %input.fullname(),
            to = %output.fullname(),
            generation,
            "registered host converter"
        );
    }

    /// Register a provider consulted for every pair
    pub fn register_provider(&self, provider: Arc<dyn ConverterProvider>) {
        self.entries.push(HostEntry::Provider(provider));
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        debug!(generation, "registered host converter provider");
    }

    /// Counter bumped on every registration
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Number of registrations
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.count()
    }

    /// Check if nothing has been registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find a host conversion for `source -> target`
    ///
    /// Exact registrations and providers are consulted newest first. If none matches, the
    /// registered converters are tried again, newest first, with implicit standard
    /// conversions spliced around them.
    #[must_use]
    pub fn resolve(
        &self,
        universe: &TypeUniverse,
        source: &TypeDescRc,
        target: &TypeDescRc,
    ) -> Option<HostConversion> {
        let entries: Vec<&HostEntry> = self.entries.iter().map(|(_, entry)| entry).collect();

        for entry in entries.iter().rev() {
            match entry {
                HostEntry::Converter {
                    input,
                    output,
                    procedure,
                } if *input == source.token && *output == target.token => {
                    return Some(HostConversion {
                        procedure: procedure.clone(),
                        input: *input,
                        output: *output,
                        before: None,
                        after: None,
                    });
                }
                HostEntry::Provider(provider) => {
                    if let Some(procedure) = provider.provide(source, target) {
                        return Some(HostConversion {
                            procedure,
                            input: source.token,
                            output: target.token,
                            before: None,
                            after: None,
                        });
                    }
                }
                HostEntry::Converter { .. } => {}
            }
        }

        for entry in entries.iter().rev() {
            let HostEntry::Converter {
                input,
                output,
                procedure,
            } = entry
            else {
                continue;
            };
            let (Some(input_ty), Some(output_ty)) = (universe.get(*input), universe.get(*output))
            else {
                continue;
            };
            let Some(before) = adapt(universe, source, &input_ty) else {
                continue;
            };
            let Some(after) = adapt(universe, &output_ty, target) else {
                continue;
            };
            return Some(HostConversion {
                procedure: procedure.clone(),
                input: *input,
                output: *output,
                before,
                after,
            });
        }

        None
    }
}

impl Default for HostRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// `Some(None)` for identical types, `Some(Some(plan))` for an implicit standard conversion
fn adapt(
    universe: &TypeUniverse,
    from: &TypeDescRc,
    to: &TypeDescRc,
) -> Option<Option<Arc<ConversionPlan>>> {
    if from.token == to.token {
        return Some(None);
    }
    match classify_standard(universe, from, to) {
        Some(kind) if kind.is_implicit() => Some(Some(Arc::new(ConversionPlan::new(
            from.clone(),
            to.clone(),
            kind,
        )))),
        _ => None,
    }
}
