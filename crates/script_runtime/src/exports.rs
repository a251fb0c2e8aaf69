//! Tunable parameters surfaced by exported templates
//!
//! An exported node stores its export name in the internal port `name` and
//! its value in the next internal port. Anything after that is a setting
//! (range bounds and the like) shown alongside the value.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use script_types::{ExportEntry, Value};

use crate::error::GraphResult;
use crate::graph::ScriptGraph;

const NAME_PORT: &str = "name";

impl ScriptGraph {
    /// Export surface of the graph, in node creation order
    pub fn exports(&self) -> Vec<ExportEntry> {
        self.nodes()
            .filter(|n| n.template().exported)
            .filter_map(|node| {
                let template = node.template();
                let name_index = template.internal_index(NAME_PORT)?;
                let values = node.internal_values();
                let name = values.get(name_index)?.as_str()?.to_string();
                let value = values.get(name_index + 1).cloned().unwrap_or_default();
                let settings = template
                    .internals
                    .iter()
                    .zip(values)
                    .skip(name_index + 2)
                    .map(|(port, value)| (port.name.clone(), value.clone()))
                    .collect();

                Some(ExportEntry {
                    name,
                    value,
                    template: template.name.clone(),
                    settings,
                })
            })
            .collect()
    }

    /// Write tuned values back by export name.
    ///
    /// Every exported node carrying a matching name is updated. Values that do
    /// not fit the port are skipped with a warning. Returns the number of
    /// values written.
    pub fn apply_exports(&mut self, values: &HashMap<String, Value>) -> GraphResult<usize> {
        self.ensure_idle()?;

        let mut applied = 0;
        for node in self.nodes_mut() {
            let template = Arc::clone(node.template());
            if !template.exported {
                continue;
            }
            let Some(name_index) = template.internal_index(NAME_PORT) else {
                continue;
            };
            let value_index = name_index + 1;
            let (Some(name), Some(port)) = (
                node.internal_values()
                    .get(name_index)
                    .and_then(Value::as_str)
                    .map(str::to_string),
                template.internals.get(value_index),
            ) else {
                continue;
            };
            let Some(value) = values.get(&name) else {
                continue;
            };

            let Some(value) = port.port_type.coerce(value.clone()) else {
                warn!(
                    export = %name,
                    "Value {} does not fit {} export; skipped",
                    value,
                    port.port_type
                );
                continue;
            };
            node.internal_values_mut()[value_index] = value;
            applied += 1;
            debug!(export = %name, node = %node.id(), "Applied export");
        }
        Ok(applied)
    }
}

#[cfg(test)]
mod tests {
    use crate::registry::TemplateRegistry;

    use super::*;

    fn graph() -> ScriptGraph {
        ScriptGraph::new(Arc::new(TemplateRegistry::with_builtins()))
    }

    #[test]
    fn test_exports_in_creation_order() {
        let mut graph = graph();
        let speed = graph.add_node("ExportFloat").unwrap();
        graph.add_node("Subtract").unwrap();
        let lives = graph.add_node("ExportIntRange").unwrap();
        let jump = graph.add_node("ExportKey").unwrap();
        graph.set_internal_value(speed, 0, Value::from("speed")).unwrap();
        graph.set_internal_value(speed, 1, Value::from(2.5)).unwrap();
        graph.set_internal_value(lives, 0, Value::from("lives")).unwrap();
        graph.set_internal_value(lives, 1, Value::from(3)).unwrap();
        graph.set_internal_value(jump, 0, Value::from("jump")).unwrap();
        graph.set_internal_value(jump, 1, Value::from("Space")).unwrap();

        let exports = graph.exports();
        let names: Vec<_> = exports.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["speed", "lives", "jump"]);

        assert_eq!(exports[0].value, Value::Float(2.5));
        assert!(exports[0].settings.is_empty());
        assert_eq!(exports[1].template, "ExportIntRange");
        assert_eq!(
            exports[1].settings,
            vec![("min".to_string(), Value::Int(0)), ("max".to_string(), Value::Int(10))]
        );
        assert_eq!(exports[2].value, Value::from("Space"));
    }

    #[test]
    fn test_apply_exports_type_checked() {
        let mut graph = graph();
        let speed = graph.add_node("ExportFloat").unwrap();
        let lives = graph.add_node("ExportInt").unwrap();
        graph.set_internal_value(speed, 0, Value::from("speed")).unwrap();
        graph.set_internal_value(lives, 0, Value::from("lives")).unwrap();

        let tuned = HashMap::from([
            ("speed".to_string(), Value::from(4)),
            ("lives".to_string(), Value::from("many")),
            ("unused".to_string(), Value::from(1)),
        ]);
        assert_eq!(graph.apply_exports(&tuned).unwrap(), 1);

        let exports = graph.exports();
        assert_eq!(exports[0].value, Value::Int(4));
        assert_eq!(exports[1].value, Value::Int(0));
    }

    #[test]
    fn test_tuned_value_flows_on_next_run() {
        let mut graph = graph();
        let export = graph.add_node("ExportInt").unwrap();
        graph.set_internal_value(export, 0, Value::from("power")).unwrap();
        let tuned = HashMap::from([("power".to_string(), Value::from(9.0))]);
        assert_eq!(graph.apply_exports(&tuned).unwrap(), 1);

        let mut entity = crate::context::testing::RecordingEntity::new();
        let keys = crate::context::PressedKeys::new();
        let world = crate::context::WorldState::default();
        graph.activate(export).unwrap();
        graph
            .tick(&mut crate::context::ScriptContext::new(&mut entity, &keys, &world))
            .unwrap();
        assert_eq!(graph.node(export).unwrap().outputs(), &[Value::Int(9)]);
    }

    #[test]
    fn test_apply_exports_refused_while_propagating() {
        let mut graph = graph();
        let speed = graph.add_node("ExportFloat").unwrap();
        graph.set_internal_value(speed, 0, Value::from("speed")).unwrap();
        graph.phase = crate::graph::Phase::Propagating;

        let tuned = HashMap::from([("speed".to_string(), Value::from(2.0))]);
        assert_eq!(graph.apply_exports(&tuned), Err(crate::error::GraphError::MidTickMutation));
        assert_eq!(graph.node(speed).unwrap().internal_values()[1], Value::Float(0.0));
    }
}
