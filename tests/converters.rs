use std::sync::Arc;

use dotconv::{conversion::numeric::is_implicit_numeric, prelude::*};
use strum::IntoEnumIterator;

fn integral_samples(kind: NumericKind) -> Vec<Value> {
    match kind {
        NumericKind::I1 => vec![Value::I1(i8::MIN), Value::I1(0), Value::I1(i8::MAX)],
        NumericKind::I2 => vec![Value::I2(i16::MIN), Value::I2(-1), Value::I2(i16::MAX)],
        NumericKind::I4 => vec![Value::I4(i32::MIN), Value::I4(7), Value::I4(i32::MAX)],
        NumericKind::I8 => vec![Value::I8(i64::MIN), Value::I8(42), Value::I8(i64::MAX)],
        NumericKind::U1 => vec![Value::U1(0), Value::U1(u8::MAX)],
        NumericKind::U2 => vec![Value::U2(0), Value::U2(u16::MAX)],
        NumericKind::U4 => vec![Value::U4(0), Value::U4(u32::MAX)],
        NumericKind::U8 => vec![Value::U8(0), Value::U8(u64::MAX)],
        NumericKind::Char => vec![Value::Char(0), Value::Char(u16::MAX)],
        _ => Vec::new(),
    }
}

#[test]
fn widen_then_narrow_round_trips() {
    let engine = ConversionEngine::new();
    let u = engine.universe();

    for from in NumericKind::iter() {
        for to in NumericKind::iter() {
            // Single and Double cannot hold every Int64 or UInt64 exactly, so
            // i64::MAX -> Single -> Int64 overflows. Only exact targets round-trip.
            let integral_target = to.is_integral() || to == NumericKind::Decimal;
            if !is_implicit_numeric(from, to) || !integral_target {
                continue;
            }
            let (s, t) = (u.numeric(from), u.numeric(to));
            let widen = engine.converter(&s, &t).unwrap();
            let narrow = engine.converter(&t, &s).unwrap();
            assert!(widen.is_implicit());

            for value in integral_samples(from) {
                let wide = widen.convert(value.clone()).unwrap();
                assert_eq!(narrow.convert(wide).unwrap(), value, "{from} -> {to} -> {from}");
            }
        }
    }
}

#[test]
fn checked_and_unchecked_narrowing() {
    let engine = ConversionEngine::new();
    let u = engine.universe();
    let int64 = u.numeric(NumericKind::I8);
    let int32 = u.numeric(NumericKind::I4);

    let checked = engine.converter(&int64, &int32).unwrap();
    assert_eq!(
        checked.convert(Value::I8(i64::MAX)),
        Err(Error::NumericOverflow {
            from: NumericKind::I8,
            to: NumericKind::I4
        })
    );

    let unchecked = engine
        .converter_with(&int64, &int32, OverflowMode::Unchecked)
        .unwrap();
    assert_eq!(unchecked.convert(Value::I8(i64::MAX)).unwrap(), Value::I4(-1));
    assert_eq!(
        unchecked.convert(Value::I8(0x1_0000_0005)).unwrap(),
        Value::I4(5)
    );

    let double = u.numeric(NumericKind::R8);
    let to_int = engine.converter(&double, &int32).unwrap();
    assert_eq!(to_int.convert(Value::R8(-2.9)).unwrap(), Value::I4(-2));
    assert!(to_int.convert(Value::R8(f64::NAN)).is_err());

    let engine = ConversionEngine::with_config(ConversionConfig::unchecked());
    let u = engine.universe();
    let wrap = engine
        .converter(&u.numeric(NumericKind::I4), &u.numeric(NumericKind::U1))
        .unwrap();
    assert_eq!(wrap.convert(Value::I4(300)).unwrap(), Value::U1(44));
}

#[test]
fn decimal_conversions() {
    let engine = ConversionEngine::with_config(ConversionConfig::unchecked());
    let u = engine.universe();
    let decimal = u.numeric(NumericKind::Decimal);
    let double = u.numeric(NumericKind::R8);
    let int32 = u.numeric(NumericKind::I4);

    let from_double = engine.converter(&double, &decimal).unwrap();
    assert_eq!(
        from_double.convert(Value::R8(1.5)).unwrap(),
        Value::Decimal("1.5".parse().unwrap())
    );
    assert!(from_double.convert(Value::R8(f64::INFINITY)).is_err());

    let to_int = engine.converter(&decimal, &int32).unwrap();
    let value: Decimal = "-2.75".parse().unwrap();
    assert_eq!(to_int.convert(Value::Decimal(value)).unwrap(), Value::I4(-2));
    // Decimal narrowing stays checked in unchecked mode
    assert!(to_int.convert(Value::Decimal(Decimal::MAX)).is_err());
}

#[test]
fn lifted_and_unwrapped_optionals() {
    let engine = ConversionEngine::new();
    let u = engine.universe();
    let int32 = u.numeric(NumericKind::I4);
    let int64 = u.numeric(NumericKind::I8);
    let opt_int = u.optional_of(&int32).unwrap();
    let opt_long = u.optional_of(&int64).unwrap();

    let lifted = engine.converter(&opt_int, &opt_long).unwrap();
    assert!(lifted.is_implicit());
    assert_eq!(lifted.convert(Value::none()).unwrap(), Value::none());
    assert_eq!(
        lifted.convert(Value::some(Value::I4(5))).unwrap(),
        Value::some(Value::I8(5))
    );

    let wrap = engine.converter(&int32, &opt_int).unwrap();
    let unwrap = engine.converter(&opt_int, &int32).unwrap();
    let wrapped = wrap.convert(Value::I4(9)).unwrap();
    assert_eq!(wrapped, Value::some(Value::I4(9)));
    assert_eq!(unwrap.convert(wrapped).unwrap(), Value::I4(9));
    assert!(matches!(
        unwrap.convert(Value::none()),
        Err(Error::NullOptionalUnwrap { .. })
    ));

    let narrow = engine.converter(&opt_long, &int32).unwrap();
    assert!(matches!(
        narrow.convert(Value::some(Value::I8(i64::MIN))),
        Err(Error::NumericOverflow { .. })
    ));
}

#[test]
fn boxing_and_unboxing() {
    let engine = ConversionEngine::new();
    let u = engine.universe();
    let object = u.well_known(WellKnown::Object);
    let int32 = u.numeric(NumericKind::I4);
    let int64 = u.numeric(NumericKind::I8);
    let opt_int = u.optional_of(&int32).unwrap();
    let status = TypeBuilder::new(u)
        .enumeration("App", "Status", NumericKind::I4)
        .build()
        .unwrap();

    let boxed = engine.convert(Value::I4(3), &int32, &object).unwrap();
    assert_eq!(boxed, Value::boxed(int32.token, Value::I4(3)));
    assert_eq!(engine.convert(boxed.clone(), &object, &int32).unwrap(), Value::I4(3));
    assert_eq!(
        engine.convert(boxed.clone(), &object, &opt_int).unwrap(),
        Value::some(Value::I4(3))
    );
    assert_eq!(
        engine.convert(boxed.clone(), &object, &status).unwrap(),
        Value::I4(3)
    );
    assert!(matches!(
        engine.convert(boxed, &object, &int64),
        Err(Error::InvalidCast { .. })
    ));

    assert_eq!(
        engine.convert(Value::none(), &opt_int, &object).unwrap(),
        Value::Null
    );
    assert_eq!(
        engine.convert(Value::Null, &object, &opt_int).unwrap(),
        Value::none()
    );
    assert_eq!(
        engine.convert(Value::Null, &object, &int32),
        Err(Error::NullReference {
            target: "System.Int32".to_string()
        })
    );
}

#[test]
fn checked_downcasts() {
    let engine = ConversionEngine::new();
    let u = engine.universe();
    let animal = TypeBuilder::new(u).class("Zoo", "Animal").build().unwrap();
    let dog = TypeBuilder::new(u)
        .class("Zoo", "Dog")
        .extends(animal.token)
        .build()
        .unwrap();
    let cat = TypeBuilder::new(u)
        .class("Zoo", "Cat")
        .extends(animal.token)
        .build()
        .unwrap();

    let downcast = engine.converter(&animal, &dog).unwrap();
    assert_eq!(downcast.steps().len(), 1);
    assert_eq!(downcast.steps()[0].to_string(), "castclass Zoo.Dog");

    let rex = Value::Instance(Instance::new(dog.token, "Rex"));
    assert_eq!(downcast.convert(rex.clone()).unwrap(), rex);
    assert_eq!(downcast.convert(Value::Null).unwrap(), Value::Null);
    assert_eq!(
        downcast.convert(Value::Instance(Instance::new(cat.token, "Tom"))),
        Err(Error::InvalidCast {
            from: "Zoo.Cat".to_string(),
            to: "Zoo.Dog".to_string()
        })
    );

    let upcast = engine.converter(&dog, &animal).unwrap();
    assert_eq!(upcast.convert(rex.clone()).unwrap(), rex);
}

#[test]
fn user_defined_operators() {
    let engine = ConversionEngine::new();
    let u = engine.universe();
    let int16 = u.numeric(NumericKind::I2);
    let int32 = u.numeric(NumericKind::I4);
    let double = u.numeric(NumericKind::R8);

    let celsius = TypeBuilder::new(u).value_type("Units", "Celsius");
    let token = celsius.token();
    let celsius = celsius
        .implicit_operator(int32.token, token, move |value| match value {
            Value::I4(degrees) => Ok(Value::Instance(Instance::new(token, f64::from(degrees)))),
            other => Err(Error::Conversion(format!("not an Int32: {other}"))),
        })
        .explicit_operator(token, double.token, |value| match value {
            Value::Instance(instance) => instance
                .payload::<f64>()
                .map(|degrees| Value::R8(*degrees))
                .ok_or_else(|| Error::Conversion("not Celsius".to_string())),
            other => Err(Error::Conversion(format!("not Celsius: {other}"))),
        })
        .build()
        .unwrap();

    let from_short = engine.converter(&int16, &celsius).unwrap();
    assert!(from_short.is_implicit());
    let warm = from_short.convert(Value::I2(21)).unwrap();
    let to_double = engine.converter(&celsius, &double).unwrap();
    assert!(!to_double.is_implicit());
    assert_eq!(to_double.convert(warm).unwrap(), Value::R8(21.0));

    let opt_int = u.optional_of(&int32).unwrap();
    let opt_celsius = u.optional_of(&celsius).unwrap();
    let lifted = engine.converter(&opt_int, &opt_celsius).unwrap();
    assert_eq!(lifted.convert(Value::none()).unwrap(), Value::none());
    assert!(matches!(
        lifted.convert(Value::some(Value::I4(5))).unwrap(),
        Value::Optional(Some(_))
    ));

    let failing = engine.convert(Value::Bool(true), &int32, &celsius);
    assert!(failing.is_err());
}

struct ParseProvider;

impl ConverterProvider for ParseProvider {
    fn provide(&self, source: &TypeDesc, target: &TypeDesc) -> Option<ConvertFn> {
        if source.fullname() != "System.String" || target.fullname() != "System.Int64" {
            return None;
        }
        Some(Arc::new(|value: Value| match value {
            Value::String(text) => text
                .parse::<i64>()
                .map(Value::I8)
                .map_err(|error| Error::Conversion(error.to_string())),
            other => Err(Error::Conversion(format!("not a string: {other}"))),
        }))
    }
}

#[test]
fn host_converters() {
    let engine = ConversionEngine::new();
    let u = engine.universe();
    let string = u.well_known(WellKnown::String);
    let boolean = u.well_known(WellKnown::Boolean);
    let int64 = u.numeric(NumericKind::I8);

    assert!(engine.get_converter(&string, &boolean).is_none());
    engine.register_user_converter(&string, &boolean, |value| match value {
        Value::String(text) => Ok(Value::Bool(&*text == "yes")),
        other => Err(Error::Conversion(format!("not a string: {other}"))),
    });
    let parse = engine.converter(&string, &boolean).unwrap();
    assert!(!parse.is_implicit());
    assert_eq!(parse.convert(Value::from("yes")).unwrap(), Value::Bool(true));

    engine.register_user_converter(&string, &boolean, |_| Ok(Value::Bool(false)));
    assert_eq!(
        engine.convert(Value::from("yes"), &string, &boolean).unwrap(),
        Value::Bool(false)
    );

    engine.register_converter_provider(Arc::new(ParseProvider));
    assert_eq!(
        engine.convert(Value::from("-12"), &string, &int64).unwrap(),
        Value::I8(-12)
    );
    assert!(matches!(
        engine.convert(Value::from("twelve"), &string, &int64),
        Err(Error::Conversion(_))
    ));
}

#[test]
fn empty_optionals_reach_optional_parameters() {
    let engine = ConversionEngine::new();
    let u = engine.universe();
    let opt_int = u.optional_of(&u.numeric(NumericKind::I4)).unwrap();
    let opt_long = u.optional_of(&u.numeric(NumericKind::I8)).unwrap();

    let feet = TypeBuilder::new(u).value_type("Units", "Feet");
    let token = feet.token();
    let feet = feet
        .implicit_operator(opt_long.token, token, |value| match value {
            Value::Optional(None) => Ok(Value::I4(-1)),
            Value::Optional(Some(inner)) => Ok(*inner),
            other => Err(Error::Conversion(format!("not an optional: {other}"))),
        })
        .build()
        .unwrap();

    let measure = engine.converter(&opt_int, &feet).unwrap();
    let steps: Vec<String> = measure.steps().iter().map(ToString::to_string).collect();
    assert_eq!(steps.len(), 2);
    assert_eq!(steps[0], "lift(conv.i8)");
    assert_eq!(measure.convert(Value::none()).unwrap(), Value::I4(-1));
    assert_eq!(
        measure.convert(Value::some(Value::I4(3))).unwrap(),
        Value::I8(3)
    );

    let string = u.well_known(WellKnown::String);
    engine.register_user_converter(&opt_long, &string, |value| match value {
        Value::Optional(None) => Ok(Value::from("none")),
        other => Ok(Value::from(other.to_string().as_str())),
    });
    let describe = engine.converter(&opt_int, &string).unwrap();
    assert_eq!(describe.steps().len(), 2);
    assert_eq!(describe.convert(Value::none()).unwrap(), Value::from("none"));
    assert_eq!(
        describe.convert(Value::some(Value::I4(8))).unwrap(),
        Value::from("8L")
    );
}

#[test]
fn typed_converters() {
    let engine = ConversionEngine::new();

    let narrow = engine.typed_converter::<i64, Option<i32>>().unwrap();
    assert_eq!(narrow.convert(17).unwrap(), Some(17));
    assert!(narrow.convert(i64::MAX).is_err());

    let unwrap = engine.typed_converter::<Option<u8>, u8>().unwrap();
    assert_eq!(unwrap.convert(Some(4)).unwrap(), 4);
    assert!(unwrap.convert(None).is_err());

    let to_char = engine.typed_converter::<u16, char>().unwrap();
    assert_eq!(to_char.convert(0x41).unwrap(), 'A');

    let to_decimal = engine.typed_converter::<f32, Decimal>().unwrap();
    assert_eq!(to_decimal.convert(0.25).unwrap(), "0.25".parse::<Decimal>().unwrap());

    let boxed = engine.typed_converter::<bool, Value>().unwrap();
    let unboxed = engine.typed_converter::<Value, bool>().unwrap();
    assert!(unboxed.convert(boxed.convert(true).unwrap()).unwrap());
}

#[test]
fn step_listing() {
    let engine = ConversionEngine::new();
    let u = engine.universe();
    let opt_long = u.optional_of(&u.numeric(NumericKind::I8)).unwrap();
    let opt_byte = u.optional_of(&u.numeric(NumericKind::U1)).unwrap();

    let checked = engine.converter(&opt_long, &opt_byte).unwrap();
    let steps: Vec<String> = checked.steps().iter().map(ToString::to_string).collect();
    assert_eq!(steps, ["lift(conv.ovf.u1)"]);
    assert_eq!(
        checked.plan().to_string(),
        "System.Nullable`1<System.Int64> -> System.Nullable`1<System.Byte> [ExplicitNullable]"
    );
}
