//! Headless run loop
//!
//! Loads a serialized graph, drives it for a fixed number of ticks against a
//! simulated entity and summarizes what happened.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use script_runtime::{GraphConfig, PressedKeys, ScriptGraph, TemplateRegistry, WorldState};
use script_types::{ExportEntry, SerializedGraph};

use crate::behavior::{Behavior, FaultRecord};
use crate::config::HostConfig;
use crate::sim::SimEntity;

/// Final state printed when a run completes
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub entity: SimEntity,
    pub exports: Vec<ExportEntry>,
    pub ticks: u64,
    pub executions: usize,
    pub faults: Vec<FaultRecord>,
    pub overflows: usize,
}

/// Parse a serialized graph file into a live graph
pub fn load_graph(
    path: impl AsRef<Path>,
    registry: Arc<TemplateRegistry>,
    config: GraphConfig,
) -> Result<ScriptGraph> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read graph {}", path.display()))?;
    let form = SerializedGraph::from_json(&text)
        .with_context(|| format!("Failed to parse graph {}", path.display()))?;
    let graph = ScriptGraph::from_serialized(registry, config, &form)
        .with_context(|| format!("Failed to build graph {}", path.display()))?;

    info!(path = %path.display(), nodes = graph.len(), edges = graph.edge_count(), "Loaded graph");
    Ok(graph)
}

/// Apply the configured export overrides to every graph of a behavior
pub fn apply_exports(behavior: &mut Behavior, config: &HostConfig) -> Result<()> {
    let values = config.export_values();
    if values.is_empty() {
        return Ok(());
    }
    let mut applied = 0;
    for graph in behavior.graphs_mut() {
        applied += graph
            .apply_exports(&values)
            .with_context(|| format!("Failed to apply exports to graph {}", graph.id()))?;
    }
    if applied < values.len() {
        warn!(requested = values.len(), applied, "Some export overrides matched nothing");
    }
    Ok(())
}

/// Step `behavior` for `config.run.ticks` ticks, integrating the entity after each
pub fn run(
    behavior: &mut Behavior,
    entity: &mut SimEntity,
    config: &HostConfig,
) -> Result<RunReport> {
    let keys: PressedKeys = config.run.keys.iter().cloned().collect();
    let delta = config.run.delta;

    let mut executions = 0;
    let mut faults = Vec::new();
    let mut overflows = 0;
    for tick in 0..config.run.ticks {
        let world = WorldState::new(tick, delta, tick as f64 * delta);
        let summary = behavior
            .update(entity, &keys, &world)
            .with_context(|| format!("Tick {tick} failed"))?;
        entity.integrate(delta);

        executions += summary.executions;
        overflows += summary.overflows;
        if !summary.faults.is_empty() {
            warn!(tick, faults = summary.faults.len(), "Node faults this tick");
        }
        faults.extend(summary.faults);
    }

    info!(
        ticks = config.run.ticks,
        executions,
        faults = faults.len(),
        overflows,
        "Run complete"
    );

    Ok(RunReport {
        entity: entity.clone(),
        exports: behavior.graphs().iter().flat_map(ScriptGraph::exports).collect(),
        ticks: config.run.ticks,
        executions,
        faults,
        overflows,
    })
}
