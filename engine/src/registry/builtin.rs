//! Built-in node kinds.
//!
//! A small general-purpose set covering constants, arithmetic, selection
//! and frame access. Domain-specific kinds (simulation, geometry) come from
//! the embedding application through the same registration path.

use std::sync::Arc;

use crate::error::EngineError;
use crate::model::value::{Data, Value};

use super::{FunctorRegistry, KindCategory, KindDefinition, SocketSpec};

fn scalar(inputs: &[Data], index: usize, socket: &str) -> Result<f64, EngineError> {
    inputs
        .get(index)
        .and_then(Data::as_float)
        .ok_or_else(|| EngineError::functor(format!("input '{socket}' expects a number")))
}

/// Register all built-in kinds into `registry`.
pub fn register_builtin_kinds(registry: &mut FunctorRegistry) -> Result<(), EngineError> {
    registry.register(
        KindDefinition::new(
            "value.float",
            "Float Value",
            KindCategory::Value,
            Arc::new(|inputs, _ctx| {
                let v = scalar(inputs, 0, "value")?;
                Ok(vec![Value::holding(Data::Float(v))])
            }),
        )
        .with_description("Passes its literal input through as a float output.")
        .with_inputs(vec![SocketSpec::with_default("value", Data::Float(0.0))])
        .with_outputs(vec![SocketSpec::new("out")]),
    )?;

    registry.register(
        KindDefinition::new(
            "math.add",
            "Add",
            KindCategory::Math,
            Arc::new(|inputs, _ctx| {
                let a = scalar(inputs, 0, "a")?;
                let b = scalar(inputs, 1, "b")?;
                Ok(vec![Value::holding(Data::Float(a + b))])
            }),
        )
        .with_inputs(vec![
            SocketSpec::with_default("a", Data::Float(0.0)),
            SocketSpec::with_default("b", Data::Float(0.0)),
        ])
        .with_outputs(vec![SocketSpec::new("sum")]),
    )?;

    registry.register(
        KindDefinition::new(
            "math.multiply",
            "Multiply",
            KindCategory::Math,
            Arc::new(|inputs, _ctx| {
                let a = scalar(inputs, 0, "a")?;
                let b = scalar(inputs, 1, "b")?;
                Ok(vec![Value::holding(Data::Float(a * b))])
            }),
        )
        .with_inputs(vec![
            SocketSpec::with_default("a", Data::Float(1.0)),
            SocketSpec::with_default("b", Data::Float(1.0)),
        ])
        .with_outputs(vec![SocketSpec::new("product")]),
    )?;

    registry.register(
        KindDefinition::new(
            "math.negate",
            "Negate",
            KindCategory::Math,
            Arc::new(|inputs, _ctx| {
                let v = scalar(inputs, 0, "in")?;
                Ok(vec![Value::holding(Data::Float(-v))])
            }),
        )
        .with_inputs(vec![SocketSpec::with_default("in", Data::Float(0.0))])
        .with_outputs(vec![SocketSpec::new("out")]),
    )?;

    registry.register(
        KindDefinition::new(
            "logic.switch",
            "Switch",
            KindCategory::Logic,
            Arc::new(|inputs, _ctx| {
                let condition = inputs
                    .first()
                    .and_then(Data::as_boolean)
                    .ok_or_else(|| EngineError::functor("input 'condition' expects a boolean"))?;
                let index = if condition { 1 } else { 2 };
                let chosen = inputs
                    .get(index)
                    .cloned()
                    .ok_or_else(|| EngineError::functor("switch branch input missing"))?;
                Ok(vec![Value::holding(chosen)])
            }),
        )
        .with_description("Selects one of two inputs by a boolean condition.")
        .with_inputs(vec![
            SocketSpec::with_default("condition", Data::Boolean(true)),
            SocketSpec::new("if_true"),
            SocketSpec::new("if_false"),
        ])
        .with_outputs(vec![SocketSpec::new("out")]),
    )?;

    registry.register(
        KindDefinition::new(
            "time.frame",
            "Frame Info",
            KindCategory::Time,
            Arc::new(|_inputs, ctx| {
                Ok(vec![
                    Value::holding(Data::Integer(ctx.frame as i64)),
                    Value::holding(Data::Integer(ctx.substep as i64)),
                ])
            }),
        )
        .with_description("Exposes the current frame and substep as integers.")
        .with_outputs(vec![SocketSpec::new("frame"), SocketSpec::new("substep")]),
    )?;

    Ok(())
}
