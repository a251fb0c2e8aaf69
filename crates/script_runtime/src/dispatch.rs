// Event Dispatch - The only way an event node becomes active
//
// The game layer reports clock ticks and collisions; matching event nodes are
// armed with the notification's values bound to their outputs and run on the
// next tick.

use tracing::debug;

use script_types::{Handle, Value, Vec2};

use crate::context::ScriptContext;
use crate::error::GraphResult;
use crate::graph::{ScriptGraph, TickReport};
use crate::registry::NodeTemplate;

pub const ON_TICK: &str = "OnTick";
pub const ON_COLLIDE: &str = "OnCollide";

impl ScriptGraph {
    /// Arm every event node whose template is named `name`.
    ///
    /// `payload` is bound positionally to the node's outputs; short payloads
    /// are padded with zero values and long ones truncated. Returns how many
    /// nodes were armed.
    pub fn fire_event(&mut self, name: &str, payload: Vec<Value>) -> GraphResult<usize> {
        self.fire_matching(|t| t.name == name, payload)
    }

    /// Arm every event node in `category`
    pub fn fire_category(&mut self, category: &str, payload: Vec<Value>) -> GraphResult<usize> {
        self.fire_matching(|t| t.category == category, payload)
    }

    /// Per-tick clock notification
    pub fn fire_tick(&mut self, dt: f64) -> GraphResult<usize> {
        self.fire_event(ON_TICK, vec![Value::from(dt)])
    }

    /// Collision notification: contact normal and the other entity
    pub fn fire_collision(&mut self, normal: Vec2, other: &Handle) -> GraphResult<usize> {
        self.fire_event(ON_COLLIDE, vec![Value::from(normal), Value::from(other.clone())])
    }

    /// Activate every non-event node without input ports.
    ///
    /// These are the graph's sources (constants, key polls, export values and
    /// entity getters); nothing upstream can ever activate them.
    pub fn activate_sources(&mut self) -> GraphResult<usize> {
        self.ensure_idle()?;
        let mut activated = 0;
        for node in self.nodes_mut() {
            let template = node.template();
            if !template.is_event() && template.inputs.is_empty() {
                node.set_active(true);
                activated += 1;
            }
        }
        Ok(activated)
    }

    /// Fire the clock with the context's delta, then propagate
    pub fn step(&mut self, scene: &mut ScriptContext<'_>) -> GraphResult<TickReport> {
        self.fire_tick(scene.global.delta)?;
        self.tick(scene)
    }

    fn fire_matching(
        &mut self,
        predicate: impl Fn(&NodeTemplate) -> bool,
        payload: Vec<Value>,
    ) -> GraphResult<usize> {
        self.ensure_idle()?;
        let graph = self.id();

        let mut armed = 0;
        for node in self.nodes_mut() {
            if node.template().is_event() && predicate(node.template()) {
                node.arm_event(payload.clone());
                armed += 1;
                debug!(
                    graph = %graph,
                    node = %node.id(),
                    template = %node.template_name(),
                    "Armed event node"
                );
            }
        }
        Ok(armed)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use script_types::{PortType, port};

    use crate::context::testing::RecordingEntity;
    use crate::context::{PressedKeys, ScriptContext, WorldState};
    use crate::error::GraphError;
    use crate::graph::{Phase, ScriptGraph};
    use crate::registry::TemplateRegistry;

    use super::*;

    fn graph() -> ScriptGraph {
        ScriptGraph::new(Arc::new(TemplateRegistry::with_builtins()))
    }

    #[test]
    fn test_fire_event_arms_matching_nodes_only() {
        let mut graph = graph();
        let first = graph.add_node("OnTick").unwrap();
        let second = graph.add_node("OnTick").unwrap();
        let collide = graph.add_node("OnCollide").unwrap();

        assert_eq!(graph.fire_tick(0.25).unwrap(), 2);
        assert!(graph.node(first).unwrap().is_active());
        assert!(graph.node(second).unwrap().is_active());
        assert!(!graph.node(collide).unwrap().is_active());
        assert_eq!(graph.fire_event("OnNothing", vec![]).unwrap(), 0);
    }

    #[test]
    fn test_collision_payload_bound_to_outputs() {
        let mut graph = graph();
        let collide = graph.add_node("OnCollide").unwrap();
        let split = graph.add_node("Vec2Components").unwrap();
        graph.add_edge(collide, 0, split, 0).unwrap();

        let other = Handle::new("entity");
        graph.fire_collision(Vec2::new(0.0, -1.0), &other).unwrap();

        let mut entity = RecordingEntity::new();
        let keys = PressedKeys::new();
        let world = WorldState::default();
        let report = graph.tick(&mut ScriptContext::new(&mut entity, &keys, &world)).unwrap();

        assert!(report.is_clean());
        assert_eq!(
            graph.node(collide).unwrap().outputs(),
            &[Value::from(Vec2::new(0.0, -1.0)), Value::from(other)]
        );
        assert_eq!(graph.node(split).unwrap().outputs(), &[Value::Float(0.0), Value::Float(-1.0)]);
        // the dispatcher has to re-arm it
        assert!(!graph.node(collide).unwrap().is_active());
    }

    #[test]
    fn test_fire_category_pads_payload() {
        let mut registry = TemplateRegistry::with_builtins();
        registry.register_event(
            "timer",
            "OnAlarm",
            vec![port("id", PortType::Int), port("label", PortType::String)],
        );
        let mut graph = ScriptGraph::new(Arc::new(registry));
        let alarm = graph.add_node("OnAlarm").unwrap();
        let on_tick = graph.add_node("OnTick").unwrap();

        assert_eq!(graph.fire_category("timer", vec![Value::from(3)]).unwrap(), 1);
        assert!(!graph.node(on_tick).unwrap().is_active());

        let mut entity = RecordingEntity::new();
        let keys = PressedKeys::new();
        let world = WorldState::default();
        graph.tick(&mut ScriptContext::new(&mut entity, &keys, &world)).unwrap();
        assert_eq!(graph.node(alarm).unwrap().outputs(), &[Value::Int(3), Value::from("")]);
    }

    #[test]
    fn test_step_fires_clock_with_world_delta() {
        let mut graph = graph();
        let on_tick = graph.add_node("OnTick").unwrap();
        let double = graph.add_node("Multiply").unwrap();
        let two = graph.add_node("ConstInt").unwrap();
        graph.set_internal_value(two, 0, Value::from(2)).unwrap();
        graph.add_edge(on_tick, 0, double, 0).unwrap();
        graph.add_edge(two, 0, double, 1).unwrap();
        // prime the constant's cache once
        graph.activate(two).unwrap();

        let mut entity = RecordingEntity::new();
        let keys = PressedKeys::new();
        let world = WorldState::new(1, 0.5, 0.5);
        let mut scene = ScriptContext::new(&mut entity, &keys, &world);
        let report = graph.step(&mut scene).unwrap();

        assert!(report.is_clean());
        assert_eq!(graph.node(on_tick).unwrap().outputs(), &[Value::Float(0.5)]);
        assert_eq!(graph.node(double).unwrap().outputs(), &[Value::Float(1.0)]);
    }

    #[test]
    fn test_activate_sources() {
        let mut graph = graph();
        let on_tick = graph.add_node("OnTick").unwrap();
        let constant = graph.add_node("ConstInt").unwrap();
        let key = graph.add_node("KeyPressed").unwrap();
        let sub = graph.add_node("Subtract").unwrap();

        assert_eq!(graph.activate_sources().unwrap(), 2);
        assert!(graph.node(constant).unwrap().is_active());
        assert!(graph.node(key).unwrap().is_active());
        assert!(!graph.node(on_tick).unwrap().is_active());
        assert!(!graph.node(sub).unwrap().is_active());
    }

    #[test]
    fn test_dispatch_refused_while_propagating() {
        let mut graph = graph();
        let on_tick = graph.add_node("OnTick").unwrap();
        graph.phase = Phase::Propagating;
        assert_eq!(graph.fire_tick(0.1), Err(GraphError::MidTickMutation));
        assert!(!graph.node(on_tick).unwrap().is_active());
    }
}
