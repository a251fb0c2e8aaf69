// Built-in Catalog - The closed set of node templates shipped with the runtime
//
// Categories: entity, event, input, logic, math. Computation nodes activate
// every output so data chains keep flowing; key nodes activate only the
// branch that matched.

use tracing::{debug, info};

use script_types::{PortDef, PortType, Value, Vec2, port};

use crate::context::Entity;
use crate::executor::{EvalContext, NodeOutput, PortResult, number_at, vec2_at};
use crate::registry::TemplateRegistry;

/// Fill `registry` with every built-in template
pub fn register_builtin_templates(registry: &mut TemplateRegistry) {
    register_entity(registry);
    register_events(registry);
    register_input(registry);
    register_logic(registry);
    register_math(registry);
    register_exports(registry);
}

// ─────────────────────────────────────────────────────────────────────────────
// Events
// ─────────────────────────────────────────────────────────────────────────────

fn register_events(registry: &mut TemplateRegistry) {
    registry.register_event("event", "OnTick", vec![port("dt", PortType::Float)]);
    registry.register_event(
        "event",
        "OnCollide",
        vec![port("normal", PortType::Object), port("entity", PortType::Object)],
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Input
// ─────────────────────────────────────────────────────────────────────────────

fn key_outputs() -> Vec<PortDef> {
    vec![
        port("T", PortType::Bool),
        port("F", PortType::Bool),
        port("int", PortType::Int),
    ]
}

/// `T` fires while held, `F` while released; `int` only updates the cache
fn key_results(pressed: bool) -> NodeOutput {
    NodeOutput::results(vec![
        PortResult::activate_if(pressed, pressed),
        PortResult::activate_if(!pressed, !pressed),
        PortResult::passive(i64::from(pressed)),
    ])
}

fn register_input(registry: &mut TemplateRegistry) {
    registry.register_internal(
        "input",
        "KeyPressed",
        vec![],
        vec![PortDef::new("key", PortType::String).with_hint("key")],
        vec![Value::from("A")],
        key_outputs(),
        |_, ctx| key_results(ctx.input.is_key_pressed(ctx.internal_str(0))),
        false,
    );

    registry.register_plain(
        "input",
        "VarKeyPressed",
        vec![port("key", PortType::String)],
        key_outputs(),
        |inputs, ctx| {
            let key = inputs.first().and_then(Value::as_str).unwrap_or_default();
            key_results(ctx.input.is_key_pressed(key))
        },
        false,
    );

    registry.register_internal(
        "input",
        "ExportKey",
        vec![],
        vec![
            port("name", PortType::String),
            PortDef::new("key", PortType::String).with_hint("key"),
        ],
        vec![Value::from("export"), Value::from("a")],
        vec![port("key", PortType::String)],
        |_, ctx| NodeOutput::active([ctx.internal_str(1)]),
        true,
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Logic
// ─────────────────────────────────────────────────────────────────────────────

fn register_logic(registry: &mut TemplateRegistry) {
    registry.register_plain(
        "logic",
        "Mux2",
        vec![
            port("index", PortType::Int),
            port("0", PortType::Any),
            port("1", PortType::Any),
        ],
        vec![port("out", PortType::Any)],
        |inputs, _| {
            let index = inputs.first().and_then(Value::as_i64).unwrap_or(0);
            let pick = if index != 0 { 2 } else { 1 };
            NodeOutput::active([inputs.get(pick).cloned().unwrap_or_default()])
        },
        false,
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Math
// ─────────────────────────────────────────────────────────────────────────────

/// Integer arithmetic when both sides are integers, float otherwise
fn arithmetic(
    inputs: &[Value],
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Value {
    let ints = (inputs.first().and_then(int_only), inputs.get(1).and_then(int_only));
    if let (Some(a), Some(b)) = ints {
        if let Some(result) = int_op(a, b) {
            return Value::Int(result);
        }
    }
    Value::Float(float_op(number_at(inputs, 0), number_at(inputs, 1)))
}

fn int_only(value: &Value) -> Option<i64> {
    match value {
        Value::Int(i) => Some(*i),
        _ => None,
    }
}

fn vector_input(inputs: &[Value], index: usize, name: &str) -> Result<Vec2, NodeOutput> {
    vec2_at(inputs, index).ok_or_else(|| NodeOutput::error(format!("input `{name}` is not a Vec2")))
}

fn register_math(registry: &mut TemplateRegistry) {
    registry.register_constant(
        "math",
        "ConstInt",
        vec![port("int", PortType::Int)],
        vec![Value::from(0)],
        false,
    );

    let number_pair = || vec![port("a", PortType::Number), port("b", PortType::Number)];
    registry.register_plain(
        "math",
        "Subtract",
        number_pair(),
        vec![port("a-b", PortType::Number)],
        |inputs, _| NodeOutput::active([arithmetic(inputs, i64::checked_sub, |a, b| a - b)]),
        false,
    );
    registry.register_plain(
        "math",
        "Multiply",
        number_pair(),
        vec![port("a*b", PortType::Number)],
        |inputs, _| NodeOutput::active([arithmetic(inputs, i64::checked_mul, |a, b| a * b)]),
        false,
    );

    registry.register_plain(
        "math",
        "PrintVec2",
        vec![port("v", PortType::Object)],
        vec![],
        |inputs, ctx| {
            let shown = inputs.first().cloned().unwrap_or_default();
            info!(node = %ctx.node, "{}", shown);
            NodeOutput::none()
        },
        false,
    );

    registry.register_plain(
        "math",
        "Vec2",
        vec![port("x", PortType::Number), port("y", PortType::Number)],
        vec![port("v", PortType::Object)],
        |inputs, _| NodeOutput::active([Vec2::new(number_at(inputs, 0), number_at(inputs, 1))]),
        false,
    );

    registry.register_plain(
        "math",
        "Vec2Components",
        vec![port("v", PortType::Object)],
        vec![port("x", PortType::Number), port("y", PortType::Number)],
        |inputs, _| match vector_input(inputs, 0, "v") {
            Ok(v) => NodeOutput::active([v.x, v.y]),
            Err(e) => e,
        },
        false,
    );

    registry.register_plain(
        "math",
        "ScaleVec2",
        vec![port("v", PortType::Object), port("s", PortType::Number)],
        vec![port("v", PortType::Object)],
        |inputs, _| match vector_input(inputs, 0, "v") {
            Ok(v) => NodeOutput::active([v.scale(number_at(inputs, 1))]),
            Err(e) => e,
        },
        false,
    );

    registry.register_plain(
        "math",
        "Normalize",
        vec![port("v", PortType::Object)],
        vec![port("n", PortType::Object)],
        |inputs, _| match vector_input(inputs, 0, "v") {
            Ok(v) => NodeOutput::active([v.norm()]),
            Err(e) => e,
        },
        false,
    );
}

fn register_exports(registry: &mut TemplateRegistry) {
    register_export(
        registry,
        "ExportInt",
        PortType::Int,
        vec![],
        vec![Value::from("export"), Value::from(0)],
    );
    register_export(
        registry,
        "ExportFloat",
        PortType::Float,
        vec![],
        vec![Value::from("export"), Value::from(0.0)],
    );
    register_export(
        registry,
        "ExportIntRange",
        PortType::Int,
        vec![port("min", PortType::Int), port("max", PortType::Int)],
        vec![Value::from("export"), Value::from(0), Value::from(0), Value::from(10)],
    );
}

/// Exported templates carry `name` then `value`, followed by any `settings`
fn register_export(
    registry: &mut TemplateRegistry,
    name: &str,
    value: PortType,
    settings: Vec<PortDef>,
    defaults: Vec<Value>,
) {
    let mut internals = vec![port("name", PortType::String), port("value", value)];
    internals.extend(settings);
    registry.register_internal(
        "math",
        name,
        vec![],
        internals,
        defaults,
        vec![port("value", value)],
        |_, ctx| NodeOutput::active([ctx.internal(1).cloned().unwrap_or_default()]),
        true,
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Entity
// ─────────────────────────────────────────────────────────────────────────────

/// Apply `action` to the entity named by `inputs[0]`, ignoring foreign handles
fn with_entity(
    inputs: &[Value],
    ctx: &mut EvalContext<'_>,
    action: impl FnOnce(&mut dyn Entity),
) -> NodeOutput {
    let node = ctx.node;
    let target = inputs.first().cloned().unwrap_or_default();
    match ctx.resolve_entity(&target) {
        Some(entity) => action(entity),
        None => debug!(
            node = %node,
            target = %target,
            "Entity is not the controlled entity; ignoring"
        ),
    }
    NodeOutput::none()
}

fn register_entity(registry: &mut TemplateRegistry) {
    let entity = || port("entity", PortType::Object);

    registry.register_plain(
        "entity",
        "GetControlledEntity",
        vec![],
        vec![entity()],
        |_, ctx| NodeOutput::active([ctx.entity.handle().clone()]),
        false,
    );

    registry.register_plain(
        "entity",
        "SetEntityVelocity",
        vec![entity(), port("v", PortType::Object)],
        vec![],
        |inputs, ctx| match vector_input(inputs, 1, "v") {
            Ok(v) => with_entity(inputs, ctx, |e| e.set_velocity(v)),
            Err(e) => e,
        },
        false,
    );

    registry.register_plain(
        "entity",
        "SetEntityVelocityX",
        vec![entity(), port("x", PortType::Number)],
        vec![],
        |inputs, ctx| {
            let x = number_at(inputs, 1);
            with_entity(inputs, ctx, |e| e.set_velocity_x(x))
        },
        false,
    );

    registry.register_plain(
        "entity",
        "ApplyEntityForce",
        vec![entity(), port("force", PortType::Object)],
        vec![],
        |inputs, ctx| match vector_input(inputs, 1, "force") {
            Ok(force) => with_entity(inputs, ctx, |e| e.apply_force(force)),
            Err(e) => e,
        },
        false,
    );

    registry.register_plain(
        "entity",
        "GetEntityVelocity",
        vec![entity()],
        vec![port("v", PortType::Object)],
        |inputs, ctx| {
            let target = inputs.first().cloned().unwrap_or_default();
            match ctx.resolve_entity(&target) {
                Some(e) => NodeOutput::active([e.velocity()]),
                None => NodeOutput::error(format!("cannot resolve entity {target}")),
            }
        },
        false,
    );

    registry.register_plain(
        "entity",
        "SetEntityScale",
        vec![entity(), port("scale", PortType::Number)],
        vec![],
        |inputs, ctx| {
            let scale = number_at(inputs, 1);
            with_entity(inputs, ctx, |e| e.set_scale(scale))
        },
        false,
    );
}
