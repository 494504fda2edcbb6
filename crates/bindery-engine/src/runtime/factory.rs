//! Instance construction.
//!
//! Resolves the most specific applicable constructor against the supplied
//! arguments: arity first, then assignability of each argument, then total
//! conversion cost. An equal-cost tie between distinct candidates is
//! refused rather than resolved by declaration order.

use std::sync::Arc;

use crate::error::{RuntimeError, RuntimeResult};
use crate::registry::FunctionRegistry;
use crate::runtime::instance::{coerce_args, Instance};
use crate::synth::class::{ConstructorSlot, SynthesizedClass};

use bindery_model::Value;

/// Create an instance of a synthesized class from constructor arguments.
pub fn instantiate(
    class: &Arc<SynthesizedClass>,
    functions: &Arc<FunctionRegistry>,
    args: &[Value],
) -> RuntimeResult<Arc<Instance>> {
    let ctor = resolve_constructor(class, args)?;

    if !ctor.visibility.is_public() {
        return Err(RuntimeError::AccessDenied {
            class: class.name.clone(),
        });
    }

    let instance = Instance::new(class.clone(), functions.clone());
    if let Some(body) = ctor.body {
        let coerced = coerce_args(&ctor.params, args)?;
        instance.run_constructor(body, &coerced)?;
    }
    Ok(Arc::new(instance))
}

fn resolve_constructor<'a>(
    class: &'a SynthesizedClass,
    args: &[Value],
) -> RuntimeResult<&'a ConstructorSlot> {
    let mut best: Option<(u32, &ConstructorSlot)> = None;
    let mut tied = false;

    for ctor in &class.constructors {
        if ctor.params.len() != args.len() {
            continue;
        }
        let Some(cost) = applicability_cost(ctor, args) else {
            continue;
        };
        match best {
            None => best = Some((cost, ctor)),
            Some((best_cost, _)) if cost < best_cost => {
                best = Some((cost, ctor));
                tied = false;
            }
            Some((best_cost, _)) if cost == best_cost => tied = true,
            Some(_) => {}
        }
    }

    match best {
        Some((_, ctor)) if !tied => Ok(ctor),
        _ => Err(RuntimeError::MissingConstructor {
            class: class.name.clone(),
            arity: args.len(),
        }),
    }
}

/// Total conversion cost of binding `args` to the constructor's parameters,
/// or `None` when any argument is not assignable.
fn applicability_cost(ctor: &ConstructorSlot, args: &[Value]) -> Option<u32> {
    let mut total = 0u32;
    for (param, arg) in ctor.params.iter().zip(args) {
        total += param.type_tag.conversion_cost(arg)?;
    }
    Some(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashMap;

    use bindery_model::{ParamDef, TypeTag, Visibility};

    use crate::synth::class::generate_class_id;
    use crate::synth::notification::NotificationPlan;

    fn class_with(constructors: Vec<ConstructorSlot>) -> Arc<SynthesizedClass> {
        Arc::new(SynthesizedClass {
            class_id: generate_class_id(),
            name: "Widget$Bindable".to_string(),
            prototype: "Widget".to_string(),
            selector_id: "default".to_string(),
            field_names: vec![],
            field_defaults: vec![],
            properties: FxHashMap::default(),
            methods: FxHashMap::default(),
            events: FxHashMap::default(),
            constructors,
            notification: NotificationPlan::Absent,
        })
    }

    fn slot(params: Vec<ParamDef>) -> ConstructorSlot {
        ConstructorSlot {
            params,
            visibility: Visibility::Public,
            body: None,
        }
    }

    #[test]
    fn test_arity_filters_candidates() {
        let class = class_with(vec![
            slot(vec![]),
            slot(vec![ParamDef::new("a", TypeTag::I32)]),
        ]);
        let functions = Arc::new(FunctionRegistry::new());

        assert!(instantiate(&class, &functions, &[]).is_ok());
        assert!(instantiate(&class, &functions, &[Value::I32(1)]).is_ok());

        let err = instantiate(&class, &functions, &[Value::I32(1), Value::I32(2)]).unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::MissingConstructor { arity: 2, .. }
        ));
    }

    #[test]
    fn test_exact_match_beats_widening() {
        let class = class_with(vec![
            slot(vec![ParamDef::new("a", TypeTag::F64)]),
            slot(vec![ParamDef::new("a", TypeTag::I32)]),
        ]);
        let ctor = resolve_constructor(&class, &[Value::I32(1)]).unwrap();
        assert_eq!(ctor.params[0].type_tag, TypeTag::I32);

        let ctor = resolve_constructor(&class, &[Value::F64(1.0)]).unwrap();
        assert_eq!(ctor.params[0].type_tag, TypeTag::F64);
    }

    #[test]
    fn test_equal_cost_tie_is_refused() {
        let class = class_with(vec![
            slot(vec![ParamDef::new("a", TypeTag::I64)]),
            slot(vec![ParamDef::new("a", TypeTag::I64)]),
        ]);
        let err = resolve_constructor(&class, &[Value::I64(1)]).unwrap_err();
        assert!(matches!(err, RuntimeError::MissingConstructor { .. }));
    }

    #[test]
    fn test_unassignable_argument_is_missing_constructor() {
        let class = class_with(vec![slot(vec![ParamDef::new("a", TypeTag::I32)])]);
        let functions = Arc::new(FunctionRegistry::new());
        let err = instantiate(&class, &functions, &[Value::str("x")]).unwrap_err();
        assert!(matches!(err, RuntimeError::MissingConstructor { .. }));
    }

    #[test]
    fn test_inaccessible_best_match_is_denied() {
        let mut protected = slot(vec![]);
        protected.visibility = Visibility::Protected;
        let class = class_with(vec![protected]);
        let functions = Arc::new(FunctionRegistry::new());

        let err = instantiate(&class, &functions, &[]).unwrap_err();
        assert!(matches!(err, RuntimeError::AccessDenied { .. }));
    }
}
