//! Live node instances bound into a graph

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use script_types::{TemplateKind, Value, validate};

use crate::context::ScriptContext;
use crate::error::FaultKind;
use crate::executor::{EvalContext, NodeOutput, PortResult};
use crate::graph::NodeId;
use crate::registry::NodeTemplate;

/// Result of asking a node to run
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The node was not active
    Skipped,
    /// Results were stored; one activation flag per output port
    Ran(Vec<bool>),
    /// The node was skipped for this tick and its caches left untouched
    Faulted(FaultKind),
}

/// A template stamped into a graph, with its own settings and caches
#[derive(Debug, Clone)]
pub struct NodeInstance {
    id: NodeId,
    template: Arc<NodeTemplate>,
    internal_values: Vec<Value>,
    outputs: Vec<Value>,
    active: bool,
    /// Output values bound by the dispatcher for the next event run
    event_payload: Option<Vec<Value>>,
}

impl NodeInstance {
    pub(crate) fn new(id: NodeId, template: Arc<NodeTemplate>) -> Self {
        Self {
            id,
            internal_values: template.defaults.clone(),
            outputs: template.zero_outputs(),
            template,
            active: false,
            event_payload: None,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn template(&self) -> &Arc<NodeTemplate> {
        &self.template
    }

    pub fn template_name(&self) -> &str {
        &self.template.name
    }

    pub fn kind(&self) -> TemplateKind {
        self.template.kind
    }

    pub fn internal_values(&self) -> &[Value] {
        &self.internal_values
    }

    /// Cached results of the last completed run
    pub fn outputs(&self) -> &[Value] {
        &self.outputs
    }

    pub fn output(&self, index: usize) -> Option<&Value> {
        self.outputs.get(index)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub(crate) fn internal_values_mut(&mut self) -> &mut Vec<Value> {
        &mut self.internal_values
    }

    /// Arm an event node with the values its outputs carry on the next run
    pub(crate) fn arm_event(&mut self, mut payload: Vec<Value>) {
        let outputs = &self.template.outputs;
        payload.truncate(outputs.len());
        for port in &outputs[payload.len()..] {
            payload.push(port.port_type.zero_value());
        }
        self.event_payload = Some(payload);
        self.active = true;
    }

    /// Run the node against already-resolved inputs.
    ///
    /// Does not touch `active`; the graph clears it once activations have been
    /// propagated.
    pub fn run(&mut self, inputs: &[Value], scene: &mut ScriptContext<'_>) -> RunOutcome {
        if !self.active {
            return RunOutcome::Skipped;
        }

        if !validate(inputs, &self.template.input_types()) {
            return RunOutcome::Faulted(FaultKind::TypeMismatch);
        }

        let results = match self.template.kind {
            TemplateKind::Event => {
                let payload = self
                    .event_payload
                    .take()
                    .unwrap_or_else(|| self.template.zero_outputs());
                payload.into_iter().map(PortResult::active).collect()
            }
            TemplateKind::Constant => self
                .internal_values
                .iter()
                .cloned()
                .map(PortResult::active)
                .collect(),
            TemplateKind::Plain | TemplateKind::Internal => match self.evaluate(inputs, scene) {
                Ok(results) => results,
                Err(fault) => return RunOutcome::Faulted(fault),
            },
        };

        if results.len() != self.template.outputs.len() {
            return RunOutcome::Faulted(FaultKind::EvaluationFailed(format!(
                "expected {} results, got {}",
                self.template.outputs.len(),
                results.len()
            )));
        }

        let mut activations = Vec::with_capacity(results.len());
        self.outputs = results
            .into_iter()
            .map(|r| {
                activations.push(r.activate);
                r.value
            })
            .collect();
        RunOutcome::Ran(activations)
    }

    fn evaluate(
        &self,
        inputs: &[Value],
        scene: &mut ScriptContext<'_>,
    ) -> Result<Vec<PortResult>, FaultKind> {
        let Some(evaluator) = self.template.evaluator.as_ref() else {
            return Err(FaultKind::EvaluationFailed(
                "template has no evaluation function".to_string(),
            ));
        };

        let mut ctx = EvalContext {
            node: self.id,
            internal: &self.internal_values,
            entity: &mut *scene.entity,
            input: scene.input,
            global: scene.global,
        };

        // A panicking evaluator must not take the game loop down with it
        let output = catch_unwind(AssertUnwindSafe(|| evaluator.evaluate(inputs, &mut ctx)))
            .map_err(|payload| FaultKind::EvaluationFailed(panic_message(payload.as_ref())))?;

        match output {
            NodeOutput::Results(results) => Ok(results),
            NodeOutput::Error(message) => Err(FaultKind::EvaluationFailed(message)),
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::testing::RecordingEntity;
    use crate::context::{PressedKeys, WorldState};
    use crate::registry::TemplateRegistry;
    use script_types::{PortType, port};

    fn registry() -> TemplateRegistry {
        let mut registry = TemplateRegistry::new();
        registry.register_plain(
            "math",
            "Double",
            vec![port("x", PortType::Number)],
            vec![port("2x", PortType::Number)],
            |inputs, _| NodeOutput::active([inputs[0].as_f64().unwrap_or(0.0) * 2.0]),
            false,
        );
        registry.register_plain(
            "test",
            "Broken",
            vec![],
            vec![port("x", PortType::Int)],
            |_, _| NodeOutput::none(),
            false,
        );
        registry.register_plain("test", "Panics", vec![], vec![], |_, _| panic!("bad node"), false);
        registry.register_event(
            "event",
            "OnHit",
            vec![port("force", PortType::Float), port("who", PortType::Object)],
        );
        registry
    }

    fn instance(name: &str) -> NodeInstance {
        NodeInstance::new(NodeId(0), registry().get(name).unwrap())
    }

    fn run(node: &mut NodeInstance, inputs: &[Value]) -> RunOutcome {
        let mut entity = RecordingEntity::new();
        let keys = PressedKeys::new();
        let world = WorldState::default();
        let mut scene = ScriptContext::new(&mut entity, &keys, &world);
        node.run(inputs, &mut scene)
    }

    #[test]
    fn test_inactive_node_is_a_no_op() {
        let mut node = instance("Double");
        assert_eq!(run(&mut node, &[Value::from(4)]), RunOutcome::Skipped);
        assert_eq!(node.outputs(), &[Value::Int(0)]);
    }

    #[test]
    fn test_run_stores_results() {
        let mut node = instance("Double");
        node.set_active(true);
        assert_eq!(run(&mut node, &[Value::from(4)]), RunOutcome::Ran(vec![true]));
        assert_eq!(node.outputs(), &[Value::Float(8.0)]);
    }

    #[test]
    fn test_type_mismatch_keeps_cache() {
        let mut node = instance("Double");
        node.set_active(true);
        run(&mut node, &[Value::from(1)]);

        let outcome = run(&mut node, &[Value::from("one")]);
        assert_eq!(outcome, RunOutcome::Faulted(FaultKind::TypeMismatch));
        assert_eq!(node.outputs(), &[Value::Float(2.0)]);
    }

    #[test]
    fn test_wrong_result_count_faults() {
        let mut node = instance("Broken");
        node.set_active(true);
        assert!(matches!(
            run(&mut node, &[]),
            RunOutcome::Faulted(FaultKind::EvaluationFailed(_))
        ));
        assert_eq!(node.outputs(), &[Value::Int(0)]);
    }

    #[test]
    fn test_panic_is_captured() {
        let mut node = instance("Panics");
        node.set_active(true);
        match run(&mut node, &[]) {
            RunOutcome::Faulted(FaultKind::EvaluationFailed(message)) => {
                assert!(message.contains("bad node"));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn test_event_emits_bound_payload() {
        let mut node = instance("OnHit");
        node.arm_event(vec![Value::from(2.5)]);
        assert!(node.is_active());

        assert_eq!(run(&mut node, &[]), RunOutcome::Ran(vec![true, true]));
        assert_eq!(node.outputs(), &[Value::Float(2.5), Value::Null]);
    }
}
