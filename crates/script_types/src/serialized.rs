//! Persisted shape of a script graph
//!
//! Produced and consumed by the save layer; nothing here is evaluated. Node
//! references in edges are positions in `nodes`.

use serde::{Deserialize, Serialize};

use crate::Value;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SerializedGraph {
    #[serde(default)]
    pub nodes: Vec<SerializedNode>,
    #[serde(default)]
    pub edges: Vec<SerializedEdge>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedNode {
    /// Template name in the registry
    pub template: String,
    /// Plain JSON literals, one per internal port
    #[serde(default, with = "literal_values")]
    pub internal_values: Vec<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedEdge {
    pub src: usize,
    pub src_out: usize,
    pub dst: usize,
    pub dst_in: usize,
}

impl SerializedGraph {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Internal values are stored as the literals an editor writes (`7`, `"Space"`,
/// `{"x": 1.0, "y": 2.0}`). The tagged `{"kind": .., "value": ..}` form is
/// still read.
mod literal_values {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::Value;

    pub fn serialize<S: Serializer>(values: &[Value], serializer: S) -> Result<S::Ok, S::Error> {
        let literals: Vec<serde_json::Value> = values.iter().cloned().map(Into::into).collect();
        literals.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Value>, D::Error> {
        let literals = Vec::<serde_json::Value>::deserialize(deserializer)?;
        Ok(literals.into_iter().map(from_literal).collect())
    }

    fn from_literal(json: serde_json::Value) -> Value {
        if is_tagged(&json) {
            if let Ok(value) = serde_json::from_value(json.clone()) {
                return value;
            }
        }
        Value::from(json)
    }

    fn is_tagged(json: &serde_json::Value) -> bool {
        json.as_object().is_some_and(|map| {
            map.get("kind").is_some_and(serde_json::Value::is_string)
                && map.keys().all(|key| key == "kind" || key == "value")
        })
    }
}

/// A tunable parameter surfaced by an exported template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportEntry {
    /// Value of the node's `name` internal port
    pub name: String,
    pub value: Value,
    /// Template that declared the export (e.g. "ExportIntRange")
    pub template: String,
    /// Remaining internal settings, such as range bounds
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub settings: Vec<(String, Value)>,
}

#[cfg(test)]
mod tests {
    use crate::{Handle, Vec2};

    use super::*;

    #[test]
    fn test_wire_format_field_names() {
        let json = r#"{
            "nodes": [
                {"template": "ConstInt", "internalValues": [7]},
                {"template": "OnTick"}
            ],
            "edges": [{"src": 0, "srcOut": 0, "dst": 1, "dstIn": 1}]
        }"#;

        let graph = SerializedGraph::from_json(json).unwrap();
        assert_eq!(graph.nodes[0].internal_values, vec![Value::Int(7)]);
        assert!(graph.nodes[1].internal_values.is_empty());
        assert_eq!(
            graph.edges[0],
            SerializedEdge { src: 0, src_out: 0, dst: 1, dst_in: 1 }
        );

        let text = graph.to_json_pretty().unwrap();
        assert!(text.contains("\"internalValues\""));
        assert!(text.contains("\"dstIn\""));
    }

    #[test]
    fn test_internal_values_written_as_literals() {
        let graph = SerializedGraph {
            nodes: vec![SerializedNode {
                template: "ExportVec2".to_string(),
                internal_values: vec![
                    Value::from("offset"),
                    Value::Int(3),
                    Value::Float(1.5),
                    Value::Bool(true),
                    Value::from(Vec2::new(1.0, -2.0)),
                    Value::from(Handle::new("entity")),
                ],
            }],
            edges: Vec::new(),
        };

        let text = serde_json::to_string(&graph).unwrap();
        assert!(text.contains(r#""internalValues":["offset",3,1.5,true,"#));
        assert!(!text.contains("\"kind\""));

        let parsed = SerializedGraph::from_json(&text).unwrap();
        assert_eq!(parsed, graph);
    }

    #[test]
    fn test_tagged_internal_values_still_read() {
        let json = r#"{"nodes": [{"template": "ExportFloat", "internalValues": [
            {"kind": "string", "value": "speed"},
            {"kind": "float", "value": 2.0},
            {"kind": "note"}
        ]}]}"#;

        let graph = SerializedGraph::from_json(json).unwrap();
        let values = &graph.nodes[0].internal_values;
        assert_eq!(values[0], Value::from("speed"));
        assert_eq!(values[1], Value::Float(2.0));
        // an object that only looks tagged stays a plain object
        assert!(matches!(&values[2], Value::Object { type_id: None, fields } if fields.len() == 1));
    }
}
