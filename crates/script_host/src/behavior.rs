//! Scripts attached to one entity
//!
//! An entity may carry several graphs. Each update re-polls every graph's
//! sources, fires its clock and propagates.

use serde::Serialize;
use tracing::debug;

use script_runtime::{
    Entity, GraphResult, InputState, NodeFault, NodeId, ScriptContext, ScriptGraph, WorldState,
};

/// A fault observed during one update, tagged with where it happened
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaultRecord {
    pub tick: u64,
    /// Position of the graph in its behavior
    pub graph: usize,
    pub node: NodeId,
    pub template: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateSummary {
    pub executions: usize,
    pub faults: Vec<FaultRecord>,
    /// Graphs whose propagation hit the execution cap
    pub overflows: usize,
}

#[derive(Debug, Default)]
pub struct Behavior {
    graphs: Vec<ScriptGraph>,
}

impl Behavior {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, graph: ScriptGraph) {
        self.graphs.push(graph);
    }

    pub fn graphs(&self) -> &[ScriptGraph] {
        &self.graphs
    }

    pub fn graphs_mut(&mut self) -> &mut [ScriptGraph] {
        &mut self.graphs
    }

    /// Run one tick of every graph against `entity`
    pub fn update(
        &mut self,
        entity: &mut dyn Entity,
        input: &dyn InputState,
        world: &WorldState,
    ) -> GraphResult<UpdateSummary> {
        let mut summary = UpdateSummary::default();
        for (index, graph) in self.graphs.iter_mut().enumerate() {
            graph.activate_sources()?;
            let mut scene = ScriptContext::new(&mut *entity, input, world);
            let report = graph.step(&mut scene)?;

            debug!(
                graph = %graph.id(),
                tick = world.tick,
                executions = report.executions,
                "Graph stepped"
            );
            summary.executions += report.executions;
            if report.overflowed {
                summary.overflows += 1;
            }
            summary
                .faults
                .extend(report.faults.into_iter().map(|fault| record(world.tick, index, fault)));
        }
        Ok(summary)
    }
}

fn record(tick: u64, graph: usize, fault: NodeFault) -> FaultRecord {
    FaultRecord {
        tick,
        graph,
        node: fault.node,
        message: fault.kind.to_string(),
        template: fault.template,
    }
}
