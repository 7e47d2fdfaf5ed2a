use std::{sync::Arc, thread};

use dotconv::prelude::*;
use rayon::prelude::*;
use strum::IntoEnumIterator;

#[test]
fn racing_threads_share_one_converter() {
    let engine = Arc::new(ConversionEngine::new());
    let source = engine.universe().numeric(NumericKind::I8);
    let target = engine.universe().numeric(NumericKind::U2);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let engine = engine.clone();
            let source = source.clone();
            let target = target.clone();
            thread::spawn(move || {
                let converter = engine.converter(&source, &target).unwrap();
                assert_eq!(converter.convert(Value::I8(513)).unwrap(), Value::U2(513));
                converter
            })
        })
        .collect();

    let converters: Vec<Arc<Converter>> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();
    for converter in &converters[1..] {
        assert!(Arc::ptr_eq(&converters[0], converter));
    }
    assert_eq!(engine.cache_stats().entries, 1);
}

#[test]
fn parallel_classification_of_all_numeric_pairs() {
    let engine = ConversionEngine::new();
    let u = engine.universe();
    let pairs: Vec<(TypeDescRc, TypeDescRc)> = NumericKind::iter()
        .flat_map(|from| NumericKind::iter().map(move |to| (from, to)))
        .map(|(from, to)| (u.numeric(from), u.numeric(to)))
        .collect();

    assert_eq!(engine.warm(&pairs), pairs.len());
    let stats = engine.cache_stats();
    assert_eq!(stats.entries, pairs.len());

    let again: Vec<bool> = pairs
        .par_iter()
        .map(|(s, t)| engine.classify(s, t).is_convertible())
        .collect();
    assert!(again.into_iter().all(|convertible| convertible));
    assert_eq!(engine.cache_stats().entries, pairs.len());
    assert!(engine.cache_stats().hits >= pairs.len() as u64);
}

#[test]
fn concurrent_type_registration() {
    let engine = ConversionEngine::new();
    let u = engine.universe();
    let base = TypeBuilder::new(u).class("Plugins", "Plugin").build().unwrap();

    let derived: Vec<TypeDescRc> = (0..32)
        .into_par_iter()
        .map(|i| {
            TypeBuilder::new(u)
                .class("Plugins", &format!("Plugin{i}"))
                .extends(base.token)
                .build()
                .unwrap()
        })
        .collect();

    derived.par_iter().for_each(|ty| {
        assert_eq!(
            engine.classify(ty, &base).category(),
            Some(ConversionCategory::ImplicitReference)
        );
        assert_eq!(
            engine.classify(&base, ty).category(),
            Some(ConversionCategory::ExplicitReference)
        );
    });

    let arrays: Vec<TypeDescRc> = (0..16)
        .into_par_iter()
        .map(|_| u.array_of(&base, 1).unwrap())
        .collect();
    assert!(arrays.iter().all(|array| array.token == arrays[0].token));
}

#[test]
fn declaring_operators_invalidates_cached_outcomes() {
    let engine = ConversionEngine::new();
    let u = engine.universe();
    let int32 = u.numeric(NumericKind::I4);
    let ticket = TypeBuilder::new(u).value_type("Venue", "Ticket").build().unwrap();

    assert!(!engine.classify(&int32, &ticket).is_convertible());

    let token = ticket.token;
    u.declare_operator(
        token,
        int32.token,
        token,
        false,
        Arc::new(move |value: Value| Ok(Value::Instance(Instance::new(token, value)))),
    )
    .unwrap();

    let classification = engine.classify(&int32, &ticket);
    assert_eq!(
        classification.category(),
        Some(ConversionCategory::UserDefined)
    );
    assert!(!classification.plan().unwrap().is_implicit());
}
