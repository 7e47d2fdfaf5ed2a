//! The conversion engine.
//!
//! [`ConversionEngine`] is the entry point of the crate. It owns a [`TypeUniverse`], the
//! classification and converter caches, and the host converter registry, and answers:
//!
//! - [`ConversionEngine::classify`]: does a conversion exist, and of which kind
//! - [`ConversionEngine::get_converter`] / [`ConversionEngine::converter`]: an executable
//!   converter for a pair
//! - [`ConversionEngine::convert`]: convert a single value
//!
//! The engine is `Send + Sync`; all caches are safe for concurrent population, and every
//! (source, target, overflow mode) combination yields one shared converter.
//!
//! # Example
//!
//! ```rust
//! use dotconv::{ConversionEngine, NumericKind, Value, WellKnown};
//!
//! let engine = ConversionEngine::new();
//! let u = engine.universe();
//! let int32 = u.numeric(NumericKind::I4);
//! let object = u.well_known(WellKnown::Object);
//!
//! let boxed = engine.convert(Value::I4(7), &int32, &object)?;
//! assert_eq!(engine.convert(boxed, &object, &int32)?, Value::I4(7));
//!
//! let plan = engine.classify(&int32, &object);
//! assert!(plan.plan().unwrap().is_implicit());
//! # Ok::<(), dotconv::Error>(())
//! ```

use std::{any::TypeId, sync::Arc};

use rayon::prelude::*;
use tracing::debug;

use crate::{
    config::ConversionConfig,
    conversion::{Classification, Classifier, ConverterProvider, HostRegistry, OperatorCache},
    converter::{
        cache::CacheEntry, CacheStats, ConvValue, Converter, ConverterCache, OverflowMode,
        TypedConverter, Value,
    },
    typesystem::{TypeDescRc, TypeUniverse},
    Error, Result,
};

/// Classifies conversions between types and hands out cached converters
pub struct ConversionEngine {
    universe: Arc<TypeUniverse>,
    config: ConversionConfig,
    cache: ConverterCache,
    operators: OperatorCache,
    host: HostRegistry,
}

impl ConversionEngine {
    /// Create an engine over a fresh universe with the default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::with_universe(Arc::new(TypeUniverse::new()), ConversionConfig::default())
    }

    /// Create an engine over a fresh universe
    #[must_use]
    pub fn with_config(config: ConversionConfig) -> Self {
        Self::with_universe(Arc::new(TypeUniverse::new()), config)
    }

    /// Create an engine over an existing universe
    #[must_use]
    pub fn with_universe(universe: Arc<TypeUniverse>, config: ConversionConfig) -> Self {
        ConversionEngine {
            universe,
            config,
            cache: ConverterCache::new(),
            operators: OperatorCache::new(),
            host: HostRegistry::new(),
        }
    }

    /// The type universe
    #[must_use]
    pub fn universe(&self) -> &Arc<TypeUniverse> {
        &self.universe
    }

    /// The configuration
    #[must_use]
    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    fn generation(&self) -> u64 {
        self.universe.operator_generation() + self.host.generation()
    }

    fn entry(&self, source: &TypeDescRc, target: &TypeDescRc) -> Arc<CacheEntry> {
        self.cache.get_or_classify(
            (source.token, target.token),
            self.generation(),
            self.config.cache_negative,
            || {
                let classification =
                    Classifier::new(&self.universe, &self.operators, &self.host, &self.config)
                        .classify(source, target);
                debug!(
                    from = %source.fullname(),
                    to = %target.fullname(),
                    category = ?classification.category(),
                    ambiguous = classification.is_ambiguous(),
                    "classified conversion"
                );
                classification
            },
        )
    }

    /// Classify the conversion from `source` to `target`
    #[must_use]
    pub fn classify(&self, source: &TypeDescRc, target: &TypeDescRc) -> Classification {
        self.entry(source, target).classification().clone()
    }

    /// The converter for a pair using the configured overflow mode, or `None` if no
    /// unambiguous conversion exists
    #[must_use]
    pub fn get_converter(&self, source: &TypeDescRc, target: &TypeDescRc) -> Option<Arc<Converter>> {
        self.entry(source, target)
            .converter(&self.universe, self.config.overflow)
    }

    /// The converter for a pair using the configured overflow mode
    ///
    /// # Errors
    /// Returns [`Error::NoConversion`] or [`Error::AmbiguousUserConversion`].
    pub fn converter(&self, source: &TypeDescRc, target: &TypeDescRc) -> Result<Arc<Converter>> {
        self.converter_with(source, target, self.config.overflow)
    }

    /// The converter for a pair using the given overflow mode
    ///
    /// # Errors
    /// Returns [`Error::NoConversion`] or [`Error::AmbiguousUserConversion`].
    pub fn converter_with(
        &self,
        source: &TypeDescRc,
        target: &TypeDescRc,
        overflow: OverflowMode,
    ) -> Result<Arc<Converter>> {
        let entry = self.entry(source, target);
        match entry.classification() {
            Classification::Ambiguous(candidates) => Err(Error::AmbiguousUserConversion {
                from: source.fullname(),
                to: target.fullname(),
                candidates: candidates.iter().map(|op| op.signature.clone()).collect(),
            }),
            _ => entry
                .converter(&self.universe, overflow)
                .ok_or_else(|| Error::NoConversion {
                    from: source.fullname(),
                    to: target.fullname(),
                }),
        }
    }

    /// Convert a single value from `source` to `target`
    ///
    /// # Errors
    /// Returns the resolution errors of [`Self::converter`] and the execution errors of
    /// [`Converter::convert`].
    pub fn convert(&self, value: Value, source: &TypeDescRc, target: &TypeDescRc) -> Result<Value> {
        self.converter(source, target)?.convert(value)
    }

    /// A converter between two Rust types, through their natural descriptors
    ///
    /// # Errors
    /// Returns an error if a descriptor cannot be constructed or no conversion exists.
    pub fn typed_converter<S, T>(&self) -> Result<Arc<TypedConverter<S, T>>>
    where
        S: ConvValue,
        T: ConvValue,
    {
        let source = S::descriptor(&self.universe)?;
        let target = T::descriptor(&self.universe)?;
        let key = (
            source.token,
            target.token,
            TypeId::of::<S>(),
            TypeId::of::<T>(),
        );
        self.cache
            .get_or_build_typed(key, self.generation(), || {
                let inner = self.converter(&source, &target)?;
                Ok(Arc::new(TypedConverter::new(inner)))
            })
    }

    /// Register a host converter for exactly `input -> output`
    ///
    /// Host converters are consulted after the standard and user-defined conversions, and
    /// the most recent registration for a pair wins.
    pub fn register_user_converter<F>(&self, input: &TypeDescRc, output: &TypeDescRc, procedure: F)
    where
        F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
    {
        self.host.register_converter(input, output, Arc::new(procedure));
    }

    /// Register a provider asked for every pair without a standard or user-defined conversion
    pub fn register_converter_provider(&self, provider: Arc<dyn ConverterProvider>) {
        self.host.register_provider(provider);
    }

    /// Classify and build converters for many pairs in parallel
    ///
    /// Returns the number of convertible pairs.
    pub fn warm(&self, pairs: &[(TypeDescRc, TypeDescRc)]) -> usize {
        let convertible = pairs
            .par_iter()
            .filter(|(source, target)| self.get_converter(source, target).is_some())
            .count();
        debug!(pairs = pairs.len(), convertible, "warmed converter cache");
        convertible
    }

    /// Cache counters
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Drop every cached classification, converter and operator lookup
    pub fn clear_cache(&self) {
        self.cache.clear();
        self.operators.clear();
        debug!("cleared conversion caches");
    }
}

impl Default for ConversionEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        conversion::ConversionCategory,
        test::{meters_payload, Fixture},
        typesystem::NumericKind,
    };

    fn engine(fx: &Fixture) -> ConversionEngine {
        ConversionEngine::with_universe(fx.universe.clone(), ConversionConfig::default())
    }

    #[test]
    fn test_converters_are_shared() {
        let fx = Fixture::new();
        let engine = engine(&fx);
        let a = engine.converter(&fx.int64(), &fx.int32()).unwrap();
        let b = engine.converter(&fx.int64(), &fx.int32()).unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        let c = engine
            .converter_with(&fx.int64(), &fx.int32(), OverflowMode::Unchecked)
            .unwrap();
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(engine.cache_stats().entries, 1);
    }

    #[test]
    fn test_errors() {
        let fx = Fixture::new();
        let engine = engine(&fx);

        assert!(matches!(
            engine.converter(&fx.dog, &fx.sealed_leaf),
            Err(Error::NoConversion { .. })
        ));
        match engine.converter(&fx.garage, &fx.vehicle) {
            Err(Error::AmbiguousUserConversion { candidates, .. }) => {
                assert_eq!(candidates.len(), 2);
            }
            other => panic!("expected ambiguity, got {other:?}"),
        }
        assert!(engine.get_converter(&fx.garage, &fx.vehicle).is_none());
    }

    #[test]
    fn test_user_defined_through_engine() {
        let fx = Fixture::new();
        let engine = engine(&fx);
        let meters = engine
            .convert(Value::I4(5), &fx.int32(), &fx.meters)
            .unwrap();
        assert_eq!(meters_payload(&meters).unwrap(), 5.0);

        let back = engine
            .convert(fx.meters_value(2.5), &fx.meters, &fx.numeric(NumericKind::R8))
            .unwrap();
        assert_eq!(back, Value::R8(2.5));
    }

    #[test]
    fn test_host_registration_invalidates() {
        let fx = Fixture::new();
        let engine = engine(&fx);
        assert!(!engine.classify(&fx.dog, &fx.sealed_leaf).is_convertible());

        engine.register_user_converter(&fx.dog, &fx.sealed_leaf, |_| Ok(Value::Null));
        assert_eq!(
            engine.classify(&fx.dog, &fx.sealed_leaf).category(),
            Some(ConversionCategory::Host)
        );
    }

    #[test]
    fn test_standard_conversions_beat_host() {
        let fx = Fixture::new();
        let engine = engine(&fx);
        engine.register_user_converter(&fx.int32(), &fx.int64(), |_| Ok(Value::I8(-1)));
        assert_eq!(
            engine.convert(Value::I4(3), &fx.int32(), &fx.int64()).unwrap(),
            Value::I8(3)
        );
    }

    #[test]
    fn test_disabled_families() {
        let fx = Fixture::new();
        let engine =
            ConversionEngine::with_universe(fx.universe.clone(), ConversionConfig::standard_only());
        assert!(!engine.classify(&fx.int32(), &fx.meters).is_convertible());
        engine.register_user_converter(&fx.dog, &fx.sealed_leaf, |_| Ok(Value::Null));
        assert!(!engine.classify(&fx.dog, &fx.sealed_leaf).is_convertible());
    }

    #[test]
    fn test_typed_converter() {
        let engine = ConversionEngine::new();
        let narrow = engine.typed_converter::<i64, i32>().unwrap();
        assert_eq!(narrow.convert(42).unwrap(), 42);
        assert!(matches!(
            narrow.convert(i64::MAX),
            Err(Error::NumericOverflow { .. })
        ));

        let again = engine.typed_converter::<i64, i32>().unwrap();
        assert!(Arc::ptr_eq(&narrow, &again));

        let lifted = engine.typed_converter::<Option<i32>, Option<i64>>().unwrap();
        assert_eq!(lifted.convert(None).unwrap(), None);
        assert_eq!(lifted.convert(Some(-4)).unwrap(), Some(-4));

        let boxed = engine.typed_converter::<u8, Value>().unwrap();
        let value = boxed.convert(9).unwrap();
        let unbox = engine.typed_converter::<Value, u8>().unwrap();
        assert_eq!(unbox.convert(value).unwrap(), 9);
    }

    #[test]
    fn test_warm_and_clear() {
        let fx = Fixture::new();
        let engine = engine(&fx);
        let pairs = vec![
            (fx.int32(), fx.int64()),
            (fx.dog.clone(), fx.animal.clone()),
            (fx.dog.clone(), fx.sealed_leaf.clone()),
            (fx.int32(), fx.meters.clone()),
        ];
        assert_eq!(engine.warm(&pairs), 3);
        assert_eq!(engine.cache_stats().entries, 4);

        engine.clear_cache();
        assert_eq!(engine.cache_stats(), CacheStats::default());
    }
}
