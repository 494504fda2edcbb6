//! Shared fixtures for the integration suite.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use bindery_engine::{ChangeHandler, Engine};
use bindery_model::{
    AccessorDef, ConstructorDef, ParamDef, PropertyDef, PrototypeDef, TypeTag, Value,
};

/// Engine with a `Rectangle` class prototype: settable `Length`/`Width`
/// and a computed get-only `Size` declared related to both.
pub fn rectangle_engine() -> Engine {
    let engine = Engine::new();

    let size_getter = engine.register_function(|ctx, _args| {
        let length = ctx.get_property("Length")?.as_i64().unwrap_or(0);
        let width = ctx.get_property("Width")?.as_i64().unwrap_or(0);
        Ok(Value::I32((length * width) as i32))
    });
    let ctor = engine.register_function(|ctx, args| {
        ctx.set_property("Length", args[0].clone())?;
        ctx.set_property("Width", args[1].clone())?;
        Ok(Value::Null)
    });

    engine.register_prototype(
        PrototypeDef::class("Rectangle")
            .with_constructor(
                ConstructorDef::new(vec![
                    ParamDef::new("length", TypeTag::I32),
                    ParamDef::new("width", TypeTag::I32),
                ])
                .with_body(ctor),
            )
            .with_property(PropertyDef::new("Length", TypeTag::I32).with_related(&["Size"]))
            .with_property(PropertyDef::new("Width", TypeTag::I32).with_related(&["Size"]))
            .with_property(
                PropertyDef::new("Size", TypeTag::I32)
                    .read_only()
                    .with_getter(AccessorDef::virtual_(size_getter)),
            ),
    );
    engine
}

/// A handler that records every property name it is raised with, plus the
/// shared log it writes into.
pub fn recording_handler() -> (ChangeHandler, Arc<Mutex<Vec<String>>>) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = log.clone();
    let handler: ChangeHandler = Arc::new(move |property: &str| {
        sink.lock().unwrap().push(property.to_string());
    });
    (handler, log)
}

/// Number of notifications recorded for one property
pub fn count_of(log: &Arc<Mutex<Vec<String>>>, property: &str) -> usize {
    log.lock()
        .unwrap()
        .iter()
        .filter(|p| p.as_str() == property)
        .count()
}

/// Everything the log recorded, in delivery order
pub fn recorded(log: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
    log.lock().unwrap().clone()
}
