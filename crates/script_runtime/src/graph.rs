// Script Graph - Owns node instances and edges, drives per-tick execution
//
// Nodes and edges live in index-addressed arenas. Slots are never reused, so
// ascending node id is creation order. Adjacency is kept as edge-id lists per
// node and is only ever changed through the methods below.
//
// A tick turns the set of externally activated nodes into a FIFO sequence of
// node runs. Each run resolves its inputs from upstream caches, and every
// output that carries activation arms the nodes wired to it.

use std::collections::VecDeque;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use script_types::{SerializedEdge, SerializedGraph, SerializedNode, Value};

use crate::config::GraphConfig;
use crate::context::ScriptContext;
use crate::error::{FaultKind, GraphError, GraphResult, NodeFault, PortSide};
use crate::node::{NodeInstance, RunOutcome};
use crate::registry::TemplateRegistry;

// ─────────────────────────────────────────────────────────────────────────────
// Identifiers
// ─────────────────────────────────────────────────────────────────────────────

/// Identity of a graph instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphId(pub uuid::Uuid);

impl std::fmt::Display for GraphId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position of a node in its graph's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId(pub u32);

impl EdgeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Graph-qualified node reference handed out to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef {
    pub graph: GraphId,
    pub node: NodeId,
}

// ─────────────────────────────────────────────────────────────────────────────
// Edges and Adjacency
// ─────────────────────────────────────────────────────────────────────────────

/// A wire from one node's output to another node's input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    pub source: NodeId,
    pub source_output: usize,
    pub target: NodeId,
    pub target_input: usize,
}

#[derive(Debug, Clone, Default)]
struct Adjacency {
    incoming: Vec<EdgeId>,
    outgoing: Vec<EdgeId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Idle,
    Propagating,
}

/// Summary of one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Node runs performed, including runs that faulted
    pub executions: usize,
    pub faults: Vec<NodeFault>,
    /// Propagation stopped at the execution cap
    pub overflowed: bool,
}

impl TickReport {
    pub fn is_clean(&self) -> bool {
        self.faults.is_empty() && !self.overflowed
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Script Graph
// ─────────────────────────────────────────────────────────────────────────────

pub struct ScriptGraph {
    id: GraphId,
    registry: Arc<TemplateRegistry>,
    config: GraphConfig,
    nodes: Vec<Option<NodeInstance>>,
    adjacency: Vec<Adjacency>,
    edges: Vec<Option<Edge>>,
    live_nodes: usize,
    live_edges: usize,
    pub(crate) phase: Phase,
    ticks: u64,
}

impl std::fmt::Debug for ScriptGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptGraph")
            .field("id", &self.id)
            .field("nodes", &self.live_nodes)
            .field("edges", &self.live_edges)
            .field("ticks", &self.ticks)
            .finish()
    }
}

impl ScriptGraph {
    /// Create an empty graph drawing templates from `registry`
    pub fn new(registry: Arc<TemplateRegistry>) -> Self {
        Self::with_config(registry, GraphConfig::default())
    }

    pub fn with_config(registry: Arc<TemplateRegistry>, config: GraphConfig) -> Self {
        Self {
            id: GraphId(uuid::Uuid::new_v4()),
            registry,
            config,
            nodes: Vec::new(),
            adjacency: Vec::new(),
            edges: Vec::new(),
            live_nodes: 0,
            live_edges: 0,
            phase: Phase::Idle,
            ticks: 0,
        }
    }

    pub fn id(&self) -> GraphId {
        self.id
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<TemplateRegistry> {
        &self.registry
    }

    pub fn is_idle(&self) -> bool {
        self.phase == Phase::Idle
    }

    /// Number of completed ticks
    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    pub fn len(&self) -> usize {
        self.live_nodes
    }

    pub fn is_empty(&self) -> bool {
        self.live_nodes == 0
    }

    pub fn edge_count(&self) -> usize {
        self.live_edges
    }

    pub fn node_ref(&self, node: NodeId) -> NodeRef {
        NodeRef {
            graph: self.id,
            node,
        }
    }

    /// Look up a node; references from other graphs resolve to `None`
    pub fn node(&self, node: NodeRef) -> Option<&NodeInstance> {
        if node.graph != self.id {
            return None;
        }
        self.node_by_id(node.node)
    }

    pub fn node_by_id(&self, id: NodeId) -> Option<&NodeInstance> {
        self.nodes.get(id.index()).and_then(Option::as_ref)
    }

    /// Live nodes in creation order
    pub fn nodes(&self) -> impl Iterator<Item = &NodeInstance> {
        self.nodes.iter().flatten()
    }

    pub(crate) fn nodes_mut(&mut self) -> impl Iterator<Item = &mut NodeInstance> {
        self.nodes.iter_mut().flatten()
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.index()).and_then(Option::as_ref)
    }

    /// Live edges in creation order
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> {
        self.edges
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.as_ref().map(|e| (EdgeId(i as u32), e)))
    }

    /// Edges wired into a node
    pub fn incoming(&self, node: NodeRef) -> Vec<Edge> {
        self.adjacent(node, |a| &a.incoming)
    }

    /// Edges leaving a node
    pub fn outgoing(&self, node: NodeRef) -> Vec<Edge> {
        self.adjacent(node, |a| &a.outgoing)
    }

    fn adjacent(&self, node: NodeRef, side: impl Fn(&Adjacency) -> &Vec<EdgeId>) -> Vec<Edge> {
        if self.node(node).is_none() {
            return Vec::new();
        }
        side(&self.adjacency[node.node.index()])
            .iter()
            .filter_map(|id| self.edge(*id).copied())
            .collect()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Structural edits (idle only)
    // ─────────────────────────────────────────────────────────────────────────

    pub(crate) fn ensure_idle(&self) -> GraphResult<()> {
        if self.phase == Phase::Propagating {
            error!(graph = %self.id, "Structural edit attempted while propagating");
            return Err(GraphError::MidTickMutation);
        }
        Ok(())
    }

    /// Check a reference belongs to this graph and names a live node
    fn resolve(&self, node: NodeRef) -> GraphResult<NodeId> {
        if node.graph != self.id {
            return Err(GraphError::CrossGraphEdge {
                graph: self.id,
                other: node.graph,
            });
        }
        match self.node_by_id(node.node) {
            Some(_) => Ok(node.node),
            None => Err(GraphError::UnknownNode(node.node)),
        }
    }

    pub(crate) fn node_mut(&mut self, node: NodeRef) -> GraphResult<&mut NodeInstance> {
        let id = self.resolve(node)?;
        self.nodes[id.index()]
            .as_mut()
            .ok_or(GraphError::UnknownNode(id))
    }

    /// Stamp out a node from a registered template
    pub fn add_node(&mut self, template_name: &str) -> GraphResult<NodeRef> {
        self.ensure_idle()?;
        let template = self
            .registry
            .get(template_name)
            .ok_or_else(|| GraphError::UnknownTemplate(template_name.to_string()))?;

        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Some(NodeInstance::new(id, template)));
        self.adjacency.push(Adjacency::default());
        self.live_nodes += 1;

        debug!(graph = %self.id, node = %id, template = %template_name, "Added node");
        Ok(self.node_ref(id))
    }

    /// Remove a node together with every edge touching it
    pub fn remove_node(&mut self, node: NodeRef) -> GraphResult<()> {
        self.ensure_idle()?;
        let id = self.resolve(node)?;

        let adjacency = std::mem::take(&mut self.adjacency[id.index()]);
        for edge_id in adjacency.incoming.into_iter().chain(adjacency.outgoing) {
            self.detach_edge(edge_id);
        }
        self.nodes[id.index()] = None;
        self.live_nodes -= 1;

        debug!(graph = %self.id, node = %id, "Removed node");
        Ok(())
    }

    /// Wire `source.outputs[output]` into `target.inputs[input]`
    pub fn add_edge(
        &mut self,
        source: NodeRef,
        output: usize,
        target: NodeRef,
        input: usize,
    ) -> GraphResult<EdgeId> {
        self.ensure_idle()?;
        let source_id = self.resolve(source)?;
        let target_id = self.resolve(target)?;

        let source_node = self.node_by_id(source_id);
        let target_node = self.node_by_id(target_id);
        let (source_node, target_node) = match (source_node, target_node) {
            (Some(s), Some(t)) => (s, t),
            (None, _) => return Err(GraphError::UnknownNode(source_id)),
            (_, None) => return Err(GraphError::UnknownNode(target_id)),
        };

        let outputs = &source_node.template().outputs;
        if output >= outputs.len() {
            return Err(GraphError::InvalidPortIndex {
                node: source_id,
                side: PortSide::Output,
                index: output,
                len: outputs.len(),
            });
        }
        let inputs = &target_node.template().inputs;
        if input >= inputs.len() {
            return Err(GraphError::InvalidPortIndex {
                node: target_id,
                side: PortSide::Input,
                index: input,
                len: inputs.len(),
            });
        }

        let wired = self.adjacency[target_id.index()]
            .incoming
            .iter()
            .filter_map(|id| self.edge(*id))
            .any(|e| e.target_input == input);
        if wired {
            return Err(GraphError::DuplicateInputEdge {
                node: target_id,
                input,
            });
        }

        let (from_type, to_type) = (outputs[output].port_type, inputs[input].port_type);
        if !from_type.is_compatible_with(&to_type) {
            warn!(
                graph = %self.id,
                source = %source_id,
                target = %target_id,
                "Wiring {} output into {} input; mismatching values fault the target",
                from_type,
                to_type
            );
        }

        let edge_id = EdgeId(self.edges.len() as u32);
        self.edges.push(Some(Edge {
            source: source_id,
            source_output: output,
            target: target_id,
            target_input: input,
        }));
        self.adjacency[source_id.index()].outgoing.push(edge_id);
        self.adjacency[target_id.index()].incoming.push(edge_id);
        self.live_edges += 1;

        debug!(
            graph = %self.id,
            edge = %edge_id,
            source = %source_id,
            target = %target_id,
            "Added edge"
        );
        Ok(edge_id)
    }

    pub fn remove_edge(&mut self, edge: EdgeId) -> GraphResult<()> {
        self.ensure_idle()?;
        if self.edge(edge).is_none() {
            return Err(GraphError::UnknownEdge(edge));
        }
        self.detach_edge(edge);
        Ok(())
    }

    /// Drop an edge from the arena and both endpoints' adjacency lists
    fn detach_edge(&mut self, edge_id: EdgeId) {
        let Some(edge) = self.edges.get_mut(edge_id.index()).and_then(Option::take) else {
            return;
        };
        self.adjacency[edge.source.index()]
            .outgoing
            .retain(|id| *id != edge_id);
        self.adjacency[edge.target.index()]
            .incoming
            .retain(|id| *id != edge_id);
        self.live_edges -= 1;
    }

    /// Editor-facing setter for a node's internal configuration
    pub fn set_internal_value(
        &mut self,
        node: NodeRef,
        index: usize,
        value: Value,
    ) -> GraphResult<()> {
        self.ensure_idle()?;
        let instance = self.node_mut(node)?;
        let id = instance.id();

        let Some(port) = instance.template().internals.get(index) else {
            return Err(GraphError::InvalidPortIndex {
                node: id,
                side: PortSide::Internal,
                index,
                len: instance.template().internals.len(),
            });
        };
        let expected = port.port_type;
        let actual = value.kind_name();
        let Some(value) = expected.coerce(value) else {
            return Err(GraphError::InternalTypeMismatch {
                node: id,
                index,
                expected,
                actual,
            });
        };

        instance.internal_values_mut()[index] = value;
        Ok(())
    }

    /// Mark a non-event node eligible to run on the next tick
    pub fn activate(&mut self, node: NodeRef) -> GraphResult<()> {
        self.ensure_idle()?;
        let instance = self.node_mut(node)?;
        if instance.template().is_event() {
            return Err(GraphError::EventActivation(instance.id()));
        }
        instance.set_active(true);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Execution
    // ─────────────────────────────────────────────────────────────────────────

    /// Run one propagation pass over the currently active nodes
    pub fn tick(&mut self, scene: &mut ScriptContext<'_>) -> GraphResult<TickReport> {
        self.ensure_idle()?;
        let mut report = TickReport::default();

        self.phase = Phase::Propagating;
        let cap = self.config.iteration_cap(self.live_nodes);
        let mut worklist: VecDeque<NodeId> = self
            .nodes()
            .filter(|n| n.is_active())
            .map(NodeInstance::id)
            .collect();

        while let Some(id) = worklist.pop_front() {
            if report.executions >= cap {
                worklist.push_front(id);
                report.overflowed = true;
                break;
            }
            report.executions += 1;

            let inputs = self.resolve_inputs(id);
            let Some(node) = self.nodes[id.index()].as_mut() else {
                continue;
            };
            let outcome = node.run(&inputs, scene);
            node.set_active(false);

            match outcome {
                RunOutcome::Ran(activations) => self.propagate(id, &activations, &mut worklist),
                RunOutcome::Faulted(kind) => {
                    let fault = NodeFault {
                        node: id,
                        template: node.template_name().to_string(),
                        kind,
                    };
                    warn!(
                        graph = %self.id,
                        node = %id,
                        template = %fault.template,
                        "{}",
                        fault.kind
                    );
                    report.faults.push(fault);
                }
                RunOutcome::Skipped => {}
            }
        }

        if report.overflowed {
            if let Some(next) = worklist.front().and_then(|id| self.node_by_id(*id)) {
                let fault = NodeFault {
                    node: next.id(),
                    template: next.template_name().to_string(),
                    kind: FaultKind::CycleOverflow { cap },
                };
                error!(
                    graph = %self.id,
                    node = %fault.node,
                    pending = worklist.len(),
                    "{}",
                    fault.kind
                );
                report.faults.push(fault);
            }
            for id in worklist.drain(..) {
                if let Some(node) = self.nodes[id.index()].as_mut() {
                    node.set_active(false);
                }
            }
        }

        self.phase = Phase::Idle;
        self.ticks += 1;
        Ok(report)
    }

    /// Current input values of a node: upstream caches, zero values where unwired
    fn resolve_inputs(&self, id: NodeId) -> Vec<Value> {
        let Some(node) = self.node_by_id(id) else {
            return Vec::new();
        };
        let mut inputs: Vec<Value> = node
            .template()
            .inputs
            .iter()
            .map(|p| p.port_type.zero_value())
            .collect();

        for edge in self.adjacency[id.index()].incoming.iter().filter_map(|e| self.edge(*e)) {
            let value = self
                .node_by_id(edge.source)
                .and_then(|source| source.output(edge.source_output));
            if let (Some(slot), Some(value)) = (inputs.get_mut(edge.target_input), value) {
                *slot = value.clone();
            }
        }
        inputs
    }

    /// Arm the targets of every activating output and queue them once
    fn propagate(&mut self, id: NodeId, activations: &[bool], worklist: &mut VecDeque<NodeId>) {
        let targets: Vec<NodeId> = self.adjacency[id.index()]
            .outgoing
            .iter()
            .filter_map(|e| self.edge(*e))
            .filter(|e| activations.get(e.source_output).copied().unwrap_or(false))
            .map(|e| e.target)
            .collect();

        for target in targets {
            let Some(node) = self.nodes[target.index()].as_mut() else {
                continue;
            };
            if node.template().is_event() || node.is_active() {
                continue;
            }
            node.set_active(true);
            worklist.push_back(target);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Persistence
    // ─────────────────────────────────────────────────────────────────────────

    /// Dense persisted form; node positions follow creation order
    pub fn to_serialized(&self) -> SerializedGraph {
        let mut positions = vec![None; self.nodes.len()];
        let mut nodes = Vec::with_capacity(self.live_nodes);
        for node in self.nodes() {
            positions[node.id().index()] = Some(nodes.len());
            nodes.push(SerializedNode {
                template: node.template_name().to_string(),
                internal_values: node.internal_values().to_vec(),
            });
        }

        let edges = self
            .edges()
            .filter_map(|(_, e)| {
                Some(SerializedEdge {
                    src: positions[e.source.index()]?,
                    src_out: e.source_output,
                    dst: positions[e.target.index()]?,
                    dst_in: e.target_input,
                })
            })
            .collect();

        SerializedGraph { nodes, edges }
    }

    /// Rebuild a graph from its persisted form.
    ///
    /// Internal values are matched by position against the template's current
    /// internal ports: missing values take the template default, extra values
    /// are dropped. Every edge goes through the same checks as `add_edge`.
    pub fn from_serialized(
        registry: Arc<TemplateRegistry>,
        config: GraphConfig,
        form: &SerializedGraph,
    ) -> GraphResult<Self> {
        for (i, edge) in form.edges.iter().enumerate() {
            for index in [edge.src, edge.dst] {
                if index >= form.nodes.len() {
                    return Err(GraphError::MissingNode { edge: i, index });
                }
            }
        }

        let mut graph = Self::with_config(registry, config);
        let mut refs = Vec::with_capacity(form.nodes.len());
        for saved in &form.nodes {
            let node = graph.add_node(&saved.template)?;
            graph.restore_internals(node, &saved.internal_values)?;
            refs.push(node);
        }

        for edge in &form.edges {
            graph.add_edge(refs[edge.src], edge.src_out, refs[edge.dst], edge.dst_in)?;
        }
        Ok(graph)
    }

    fn restore_internals(&mut self, node: NodeRef, saved: &[Value]) -> GraphResult<()> {
        let instance = self.node_mut(node)?;
        let template = Arc::clone(instance.template());
        if saved.len() > template.internals.len() {
            warn!(
                template = %template.name,
                saved = saved.len(),
                expected = template.internals.len(),
                "Dropping extra saved internal values"
            );
        }

        for (index, (port, value)) in template.internals.iter().zip(saved).enumerate() {
            if let Some(value) = port.port_type.coerce(value.clone()) {
                instance.internal_values_mut()[index] = value;
            } else {
                warn!(
                    template = %template.name,
                    port = %port.name,
                    "Saved {} does not fit {} port; keeping default",
                    value.kind_name(),
                    port.port_type
                );
            }
        }
        Ok(())
    }
}
