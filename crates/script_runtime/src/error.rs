//! Graph errors and tick-time faults

use script_types::PortType;

use crate::graph::{EdgeId, GraphId, NodeId};

/// Which port array an index refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortSide {
    Input,
    Output,
    Internal,
}

impl std::fmt::Display for PortSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortSide::Input => write!(f, "input"),
            PortSide::Output => write!(f, "output"),
            PortSide::Internal => write!(f, "internal"),
        }
    }
}

/// Errors returned by structural graph operations.
///
/// A call that fails leaves the graph exactly as it was.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    #[error("Invalid {side} port index {index} on node {node} (has {len})")]
    InvalidPortIndex {
        node: NodeId,
        side: PortSide,
        index: usize,
        len: usize,
    },

    #[error("Cannot attach nodes from graph {other} to graph {graph}")]
    CrossGraphEdge { graph: GraphId, other: GraphId },

    #[error("Input {input} of node {node} is already wired")]
    DuplicateInputEdge { node: NodeId, input: usize },

    #[error("Graph structure cannot change while a tick is propagating")]
    MidTickMutation,

    #[error("Unknown template: {0}")]
    UnknownTemplate(String),

    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    #[error("Unknown edge: {0}")]
    UnknownEdge(EdgeId),

    #[error("Edge {edge} references missing node index {index}")]
    MissingNode { edge: usize, index: usize },

    #[error("Event node {0} can only be activated by the event dispatcher")]
    EventActivation(NodeId),

    #[error("Internal port {index} of node {node} expects {expected}, got {actual}")]
    InternalTypeMismatch {
        node: NodeId,
        index: usize,
        expected: PortType,
        actual: &'static str,
    },
}

/// Result type for graph operations
pub type GraphResult<T> = Result<T, GraphError>;

/// What went wrong with a node during a tick
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FaultKind {
    #[error("input values do not match the declared port types")]
    TypeMismatch,

    #[error("evaluation failed: {0}")]
    EvaluationFailed(String),

    #[error("propagation exceeded {cap} executions")]
    CycleOverflow { cap: usize },
}

/// A non-fatal problem recorded against a node during a tick
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("node {node} ({template}): {kind}")]
pub struct NodeFault {
    pub node: NodeId,
    pub template: String,
    pub kind: FaultKind,
}
