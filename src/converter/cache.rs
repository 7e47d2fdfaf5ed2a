//! The converter cache.
//!
//! Classifications are cached per (source, target) pair, and the converters derived from them
//! per overflow mode inside the same entry. A pair is classified outside of any map lock and
//! published with the map's entry API, so concurrent requests for the same pair observe one
//! published entry. Converters inside an entry are built at most once through [`OnceLock`].
//!
//! Every entry records the generation (operator declarations plus host registrations) it
//! was computed at. An entry from an older generation is recomputed on its next lookup.

use std::{
    any::{Any, TypeId},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, OnceLock,
    },
};

use dashmap::{mapref::entry::Entry, DashMap};
use tracing::debug;

use crate::{
    conversion::Classification,
    converter::{Converter, OverflowMode},
    typesystem::{Token, TypeUniverse},
    Result,
};

type TypedKey = (Token, Token, TypeId, TypeId);

/// Counters describing cache usage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that classified a pair
    pub misses: u64,
    /// Cached pairs
    pub entries: usize,
}

/// The cached outcome for one (source, target) pair
pub struct CacheEntry {
    generation: u64,
    classification: Classification,
    checked: OnceLock<Option<Arc<Converter>>>,
    unchecked: OnceLock<Option<Arc<Converter>>>,
}

impl CacheEntry {
    fn new(generation: u64, classification: Classification) -> Self {
        CacheEntry {
            generation,
            classification,
            checked: OnceLock::new(),
            unchecked: OnceLock::new(),
        }
    }

    /// The classification of the pair
    #[must_use]
    pub fn classification(&self) -> &Classification {
        &self.classification
    }

    /// Generation the entry was computed at
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The converter for `mode`, built on first use; `None` if the pair is not convertible
    #[must_use]
    pub fn converter(&self, universe: &Arc<TypeUniverse>, mode: OverflowMode) -> Option<Arc<Converter>> {
        let cell = match mode {
            OverflowMode::Checked => &self.checked,
            OverflowMode::Unchecked => &self.unchecked,
        };
        cell.get_or_init(|| {
            self.classification
                .plan()
                .map(|plan| Arc::new(Converter::new(universe.clone(), plan.clone(), mode)))
        })
        .clone()
    }
}

/// Concurrent cache of classifications, converters and typed converters
#[derive(Default)]
pub struct ConverterCache {
    entries: DashMap<(Token, Token), Arc<CacheEntry>>,
    typed: DashMap<TypedKey, (u64, Arc<dyn Any + Send + Sync>)>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ConverterCache {
    /// Create an empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a pair, classifying and publishing it on a miss
    ///
    /// With `cache_negative` unset, pairs without a conversion are returned but not stored.
    pub fn get_or_classify<F>(
        &self,
        key: (Token, Token),
        generation: u64,
        cache_negative: bool,
        classify: F,
    ) -> Arc<CacheEntry>
    where
        F: FnOnce() -> Classification,
    {
        if let Some(entry) = self.entries.get(&key) {
            if entry.generation >= generation {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return entry.clone();
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let fresh = Arc::new(CacheEntry::new(generation, classify()));
        if !cache_negative && !fresh.classification.is_convertible() {
            return fresh;
        }

        match self.entries.entry(key) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().generation >= generation {
                    return occupied.get().clone();
                }
                debug!(
                    stale = occupied.get().generation,
                    generation, "replaced stale conversion entry"
                );
                occupied.insert(fresh.clone());
                fresh
            }
            Entry::Vacant(vacant) => {
                vacant.insert(fresh.clone());
                fresh
            }
        }
    }

    /// Look up a typed converter, building and publishing it on a miss
    ///
    /// # Errors
    /// Returns the error of `make`; failures are not cached.
    pub fn get_or_build_typed<T, F>(
        &self,
        key: TypedKey,
        generation: u64,
        make: F,
    ) -> Result<Arc<T>>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> Result<Arc<T>>,
    {
        if let Some(cached) = self.typed.get(&key) {
            if cached.0 >= generation {
                if let Ok(typed) = cached.1.clone().downcast::<T>() {
                    return Ok(typed);
                }
            }
        }

        let fresh = make()?;
        let erased: Arc<dyn Any + Send + Sync> = fresh.clone();
        match self.typed.entry(key) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().0 >= generation {
                    if let Ok(typed) = occupied.get().1.clone().downcast::<T>() {
                        return Ok(typed);
                    }
                }
                occupied.insert((generation, erased));
            }
            Entry::Vacant(vacant) => {
                vacant.insert((generation, erased));
            }
        }
        Ok(fresh)
    }

    /// Current counters
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entries.len(),
        }
    }

    /// Number of cached pairs
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no pair is cached
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all entries and reset the counters
    pub fn clear(&self) {
        self.entries.clear();
        self.typed.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}
