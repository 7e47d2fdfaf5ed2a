//! Shared fixtures for unit tests.

use std::sync::Arc;

use crate::{
    converter::{Instance, Value},
    typesystem::{
        GenericParamFlags, NumericKind, TypeBuilder, TypeDescRc, TypeUniverse, WellKnown,
    },
    Error,
};

/// A small universe covering every rule family.
///
/// - `Animal` (abstract) with `Dog : Animal, IPet` and `Cat : Animal`
/// - `SealedLeaf`, a sealed class unrelated to anything
/// - `IPet`, `IShape` interfaces; `Point` struct implementing `IShape`
/// - `Color`, an enum over `Int32`
/// - `Action`1<in T>`, a contravariant delegate definition
/// - `Meters` struct: `implicit Int32 -> Meters`, `explicit Meters -> Double`
/// - `Vehicle` with `Car : Vehicle` and `Truck : Vehicle`; `Garage` struct declaring
///   `implicit Garage -> Car` and `implicit Garage -> Truck`
pub struct Fixture {
    pub universe: Arc<TypeUniverse>,
    pub animal: TypeDescRc,
    pub dog: TypeDescRc,
    pub cat: TypeDescRc,
    pub sealed_leaf: TypeDescRc,
    pub ipet: TypeDescRc,
    pub ishape: TypeDescRc,
    pub point: TypeDescRc,
    pub color: TypeDescRc,
    pub action: TypeDescRc,
    pub meters: TypeDescRc,
    pub vehicle: TypeDescRc,
    pub car: TypeDescRc,
    pub truck: TypeDescRc,
    pub garage: TypeDescRc,
}

impl Fixture {
    pub fn new() -> Self {
        let universe = Arc::new(TypeUniverse::new());
        let u = universe.as_ref();

        let ipet = TypeBuilder::new(u).interface("Zoo", "IPet").build().unwrap();
        let ishape = TypeBuilder::new(u)
            .interface("Geometry", "IShape")
            .build()
            .unwrap();
        let animal = TypeBuilder::new(u)
            .class("Zoo", "Animal")
            .abstract_type()
            .build()
            .unwrap();
        let dog = TypeBuilder::new(u)
            .class("Zoo", "Dog")
            .extends(animal.token)
            .implements(ipet.token)
            .build()
            .unwrap();
        let cat = TypeBuilder::new(u)
            .class("Zoo", "Cat")
            .extends(animal.token)
            .build()
            .unwrap();
        let sealed_leaf = TypeBuilder::new(u)
            .class("Zoo", "SealedLeaf")
            .sealed()
            .build()
            .unwrap();
        let point = TypeBuilder::new(u)
            .value_type("Geometry", "Point")
            .implements(ishape.token)
            .build()
            .unwrap();
        let color = TypeBuilder::new(u)
            .enumeration("Geometry", "Color", NumericKind::I4)
            .build()
            .unwrap();
        let action = TypeBuilder::new(u)
            .delegate("System", "Action`1")
            .generic_param("T", GenericParamFlags::CONTRAVARIANT)
            .build()
            .unwrap();

        let int32 = universe.numeric(NumericKind::I4).token;
        let double = universe.numeric(NumericKind::R8).token;
        let meters = TypeBuilder::new(u).value_type("Units", "Meters");
        let meters_token = meters.token();
        let meters = meters
            .implicit_operator(int32, meters_token, move |value| match value {
                Value::I4(v) => Ok(Value::Instance(Instance::new(meters_token, f64::from(v)))),
                other => Err(Error::Conversion(format!("expected Int32, got {other:?}"))),
            })
            .explicit_operator(meters_token, double, |value| {
                meters_payload(&value).map(Value::R8)
            })
            .build()
            .unwrap();

        let vehicle = TypeBuilder::new(u)
            .class("Fleet", "Vehicle")
            .build()
            .unwrap();
        let car = TypeBuilder::new(u)
            .class("Fleet", "Car")
            .extends(vehicle.token)
            .build()
            .unwrap();
        let truck = TypeBuilder::new(u)
            .class("Fleet", "Truck")
            .extends(vehicle.token)
            .build()
            .unwrap();
        let car_token = car.token;
        let truck_token = truck.token;
        let garage = TypeBuilder::new(u).value_type("Fleet", "Garage");
        let garage_token = garage.token();
        let garage = garage
            .implicit_operator(garage_token, car_token, move |_| {
                Ok(Value::Instance(Instance::new(car_token, ())))
            })
            .implicit_operator(garage_token, truck_token, move |_| {
                Ok(Value::Instance(Instance::new(truck_token, ())))
            })
            .build()
            .unwrap();

        Fixture {
            universe,
            animal,
            dog,
            cat,
            sealed_leaf,
            ipet,
            ishape,
            point,
            color,
            action,
            meters,
            vehicle,
            car,
            truck,
            garage,
        }
    }

    pub fn object(&self) -> TypeDescRc {
        self.universe.well_known(WellKnown::Object)
    }

    pub fn string(&self) -> TypeDescRc {
        self.universe.well_known(WellKnown::String)
    }

    pub fn int32(&self) -> TypeDescRc {
        self.universe.numeric(NumericKind::I4)
    }

    pub fn int64(&self) -> TypeDescRc {
        self.universe.numeric(NumericKind::I8)
    }

    pub fn numeric(&self, kind: NumericKind) -> TypeDescRc {
        self.universe.numeric(kind)
    }

    pub fn optional(&self, inner: &TypeDescRc) -> TypeDescRc {
        self.universe.optional_of(inner).unwrap()
    }

    pub fn meters_value(&self, value: f64) -> Value {
        Value::Instance(Instance::new(self.meters.token, value))
    }
}

/// Read the payload of a `Meters` instance
pub fn meters_payload(value: &Value) -> crate::Result<f64> {
    match value {
        Value::Instance(instance) => instance
            .payload::<f64>()
            .copied()
            .ok_or_else(|| Error::Conversion("Meters payload is not f64".to_string())),
        other => Err(Error::Conversion(format!("expected Meters, got {other:?}"))),
    }
}
