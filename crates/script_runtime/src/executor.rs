// Executor - Evaluation context and output types
//
// Provides the context passed to template evaluation functions and the
// result structure they hand back to the graph.

use script_types::{Value, Vec2};

use crate::context::{Entity, InputState, WorldState};
use crate::graph::NodeId;

// ─────────────────────────────────────────────────────────────────────────────
// Evaluation Context
// ─────────────────────────────────────────────────────────────────────────────

/// Context passed to a template's evaluation function
pub struct EvalContext<'a> {
    /// Node being evaluated
    pub node: NodeId,
    /// The node's internal settings, in internal-port order
    pub internal: &'a [Value],
    /// The controlled scene actor
    pub entity: &'a mut dyn Entity,
    pub input: &'a dyn InputState,
    pub global: &'a WorldState,
}

impl EvalContext<'_> {
    /// Internal setting by position
    pub fn internal(&self, index: usize) -> Option<&Value> {
        self.internal.get(index)
    }

    /// Internal setting as a string, empty when missing or not a string
    pub fn internal_str(&self, index: usize) -> &str {
        self.internal
            .get(index)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Resolve an entity handle received on a wire.
    ///
    /// Only the controlled entity can be resolved; anything else yields `None`.
    pub fn resolve_entity(&mut self, value: &Value) -> Option<&mut dyn Entity> {
        let handle = value.as_handle()?;
        if handle == self.entity.handle() {
            Some(&mut *self.entity)
        } else {
            None
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Node Output
// ─────────────────────────────────────────────────────────────────────────────

/// One result per declared output port
#[derive(Debug, Clone, PartialEq)]
pub struct PortResult {
    pub value: Value,
    /// Whether targets wired to this output become eligible to run
    pub activate: bool,
}

impl PortResult {
    /// A value that activates downstream nodes
    pub fn active(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            activate: true,
        }
    }

    /// A value that only updates the cache
    pub fn passive(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            activate: false,
        }
    }

    pub fn activate_if(value: impl Into<Value>, activate: bool) -> Self {
        Self {
            value: value.into(),
            activate,
        }
    }
}

/// Output from an evaluation function
#[derive(Debug, Clone, PartialEq)]
pub enum NodeOutput {
    /// Ordered results, one per output port
    Results(Vec<PortResult>),
    /// The evaluation could not produce results
    Error(String),
}

impl NodeOutput {
    /// Output for templates without output ports
    pub fn none() -> Self {
        NodeOutput::Results(Vec::new())
    }

    /// Every value activates its targets
    pub fn active<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        NodeOutput::Results(values.into_iter().map(PortResult::active).collect())
    }

    pub fn results(results: Vec<PortResult>) -> Self {
        NodeOutput::Results(results)
    }

    pub fn error(message: impl Into<String>) -> Self {
        NodeOutput::Error(message.into())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, NodeOutput::Error(_))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Input Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Read a numeric input; validation has already run, so absence means zero
pub fn number_at(inputs: &[Value], index: usize) -> f64 {
    inputs.get(index).and_then(Value::as_f64).unwrap_or(0.0)
}

/// Read a vector input, `None` when the wire carried something else
pub fn vec2_at(inputs: &[Value], index: usize) -> Option<Vec2> {
    inputs.get(index).and_then(Value::as_vec2)
}
