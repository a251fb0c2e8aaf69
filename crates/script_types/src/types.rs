// Script Types - Port and template descriptors
//
// These types describe the shape of a node: which typed ports it exposes and
// what kind of template stamped it out. The runtime checks wire values against
// them before every evaluation.

use serde::{Deserialize, Serialize};

use crate::Value;

// ─────────────────────────────────────────────────────────────────────────────
// Port Types
// ─────────────────────────────────────────────────────────────────────────────

/// Data types a port can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortType {
    /// Any numeric value
    Number,
    /// Whole numbers
    Int,
    /// Any numeric value, read as floating point
    Float,
    String,
    Bool,
    /// Structured values, arrays and actor handles
    Object,
    /// Bypasses the type check
    Any,
}

impl PortType {
    /// Structural check of a runtime value against this port type
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            PortType::Any => true,
            PortType::Number => match value {
                Value::Int(_) => true,
                Value::Float(f) => f.is_finite(),
                _ => false,
            },
            PortType::Int => value.as_i64().is_some(),
            PortType::Float => value.is_numeric(),
            PortType::String => matches!(value, Value::String(_)),
            PortType::Bool => matches!(value, Value::Bool(_)),
            PortType::Object => matches!(
                value,
                Value::Object { .. } | Value::Array(_) | Value::Handle(_) | Value::Null
            ),
        }
    }

    /// Checked form of `value` for storage in a port of this type.
    ///
    /// Whole floats written to an `int` port become [`Value::Int`]; anything
    /// this type does not accept is `None`.
    pub fn coerce(&self, value: Value) -> Option<Value> {
        if !self.accepts(&value) {
            return None;
        }
        match (self, &value) {
            (PortType::Int, Value::Float(_)) => value.as_i64().map(Value::Int),
            _ => Some(value),
        }
    }

    /// Value an unwired input of this type receives
    pub fn zero_value(&self) -> Value {
        match self {
            PortType::Number | PortType::Int => Value::Int(0),
            PortType::Float => Value::Float(0.0),
            PortType::String => Value::String(String::new()),
            PortType::Bool => Value::Bool(false),
            PortType::Object | PortType::Any => Value::Null,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, PortType::Number | PortType::Int | PortType::Float)
    }

    /// Whether an output of this type may feed an input of `other`
    pub fn is_compatible_with(&self, other: &PortType) -> bool {
        match (self, other) {
            (a, b) if a == b => true,
            (PortType::Any, _) | (_, PortType::Any) => true,
            (a, b) => a.is_numeric() && b.is_numeric(),
        }
    }
}

impl std::fmt::Display for PortType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PortType::Number => "number",
            PortType::Int => "int",
            PortType::Float => "float",
            PortType::String => "string",
            PortType::Bool => "bool",
            PortType::Object => "object",
            PortType::Any => "any",
        };
        f.write_str(name)
    }
}

/// Check every value against the type declared at the same position.
///
/// A length mismatch fails the check.
pub fn validate(values: &[Value], types: &[PortType]) -> bool {
    values.len() == types.len() && values.iter().zip(types).all(|(v, t)| t.accepts(v))
}

// ─────────────────────────────────────────────────────────────────────────────
// Port Definitions
// ─────────────────────────────────────────────────────────────────────────────

/// A named, typed slot on a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortDef {
    pub name: String,
    #[serde(rename = "type")]
    pub port_type: PortType,
    /// Editor affordance for internal ports (e.g. "key" opens a key picker)
    #[serde(default, rename = "editorHint", skip_serializing_if = "Option::is_none")]
    pub editor_hint: Option<String>,
}

impl PortDef {
    pub fn new(name: impl Into<String>, port_type: PortType) -> Self {
        Self {
            name: name.into(),
            port_type,
            editor_hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.editor_hint = Some(hint.into());
        self
    }
}

/// Shorthand for building port lists: `port("a", PortType::Number)`
pub fn port(name: &str, port_type: PortType) -> PortDef {
    PortDef::new(name, port_type)
}

/// Declared types of a port list, in order
pub fn port_types(ports: &[PortDef]) -> Vec<PortType> {
    ports.iter().map(|p| p.port_type).collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Template Kinds
// ─────────────────────────────────────────────────────────────────────────────

/// How a template behaves when its node runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateKind {
    /// Inputs in, results out
    Plain,
    /// No inputs; fired by the event dispatcher, never by edges
    Event,
    /// Like `Plain` with per-instance editable settings
    Internal,
    /// No inputs; emits its configured values
    Constant,
}

impl TemplateKind {
    pub fn has_internals(&self) -> bool {
        matches!(self, TemplateKind::Internal | TemplateKind::Constant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_bypasses_check() {
        assert!(PortType::Any.accepts(&Value::Null));
        assert!(PortType::Any.accepts(&Value::from("x")));
    }

    #[test]
    fn test_numeric_subtypes_are_structural() {
        assert!(PortType::Int.accepts(&Value::Float(3.0)));
        assert!(!PortType::Int.accepts(&Value::Float(3.5)));
        assert!(PortType::Float.accepts(&Value::Int(2)));
        assert!(PortType::Number.accepts(&Value::Float(0.25)));
        assert!(!PortType::Number.accepts(&Value::Float(f64::INFINITY)));
        assert!(!PortType::Number.accepts(&Value::from("2")));
    }

    #[test]
    fn test_coerce_stores_whole_floats_as_int() {
        assert_eq!(PortType::Int.coerce(Value::Float(7.0)), Some(Value::Int(7)));
        assert_eq!(PortType::Int.coerce(Value::Float(7.5)), None);
        assert_eq!(PortType::Float.coerce(Value::Int(2)), Some(Value::Int(2)));
        assert_eq!(PortType::Any.coerce(Value::Float(1.0)), Some(Value::Float(1.0)));
        assert_eq!(PortType::Bool.coerce(Value::from("yes")), None);
    }

    #[test]
    fn test_object_accepts_null_and_handles() {
        assert!(PortType::Object.accepts(&Value::Null));
        assert!(PortType::Object.accepts(&Value::Handle(crate::Handle::new("entity"))));
        assert!(!PortType::Object.accepts(&Value::Bool(true)));
    }

    #[test]
    fn test_validate_positions_and_length() {
        let types = [PortType::Int, PortType::Bool];
        assert!(validate(&[Value::from(1), Value::from(false)], &types));
        assert!(!validate(&[Value::from(false), Value::from(1)], &types));
        assert!(!validate(&[Value::from(1)], &types));
    }

    #[test]
    fn test_zero_values_pass_their_own_check() {
        for t in [
            PortType::Number,
            PortType::Int,
            PortType::Float,
            PortType::String,
            PortType::Bool,
            PortType::Object,
            PortType::Any,
        ] {
            assert!(t.accepts(&t.zero_value()), "{t} rejects its zero value");
        }
    }

    #[test]
    fn test_compatibility() {
        assert!(PortType::Int.is_compatible_with(&PortType::Number));
        assert!(PortType::Object.is_compatible_with(&PortType::Any));
        assert!(!PortType::Bool.is_compatible_with(&PortType::String));
    }

    #[test]
    fn test_port_def_json_shape() {
        let p = port("key", PortType::String).with_hint("key");
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json, serde_json::json!({"name": "key", "type": "string", "editorHint": "key"}));
    }
}
