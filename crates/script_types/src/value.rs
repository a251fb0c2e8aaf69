//! Runtime values carried on script graph wires
//!
//! Every port, internal setting and cached output holds a [`Value`]. Scene
//! actors never travel on a wire directly; they are referenced through an
//! opaque [`Handle`] which the evaluation context resolves.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::Vec2;

// ─────────────────────────────────────────────────────────────────────────────
// Handles
// ─────────────────────────────────────────────────────────────────────────────

/// Identity of a scene actor referenced from a graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HandleId(pub uuid::Uuid);

impl HandleId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for HandleId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for HandleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to an actor owned by the game layer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Handle {
    pub id: HandleId,
    /// Kind of actor (e.g. "entity")
    pub type_id: String,
}

impl Handle {
    /// Create a handle with a fresh identity
    pub fn new(type_id: impl Into<String>) -> Self {
        Self {
            id: HandleId::new(),
            type_id: type_id.into(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Value
// ─────────────────────────────────────────────────────────────────────────────

/// A value flowing through the graph
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<Value>),
    /// Structured value; `type_id` tags well-known shapes such as `Vec2`
    Object {
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        type_id: Option<String>,
        fields: HashMap<String, Value>,
    },
    Handle(Handle),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer view; floats qualify only when they hold a whole number
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Float(f) if f.is_finite() && f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_handle(&self) -> Option<&Handle> {
        match self {
            Value::Handle(h) => Some(h),
            _ => None,
        }
    }

    pub fn as_vec2(&self) -> Option<Vec2> {
        Vec2::try_from(self).ok()
    }

    /// Field lookup on objects
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object { fields, .. } => fields.get(key),
            _ => None,
        }
    }

    pub fn object_type_id(&self) -> Option<&str> {
        match self {
            Value::Object { type_id, .. } => type_id.as_deref(),
            _ => None,
        }
    }

    /// Build a typed object from key/value pairs
    pub fn typed_object<I, K, V>(type_id: impl Into<String>, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Value::Object {
            type_id: Some(type_id.into()),
            fields: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// Short name of the value's kind, used in diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object { .. } => "object",
            Value::Handle(_) => "handle",
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::String(s) => write!(f, "{s}"),
            Value::Handle(h) => write!(f, "<{} {}>", h.type_id, h.id),
            other => write!(f, "{}", serde_json::Value::from(other.clone())),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Conversions
// ─────────────────────────────────────────────────────────────────────────────

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Handle> for Value {
    fn from(h: Handle) -> Self {
        Value::Handle(h)
    }
}

impl From<Vec2> for Value {
    fn from(v: Vec2) -> Self {
        Value::typed_object(Vec2::TYPE_ID, [("x", v.x), ("y", v.y)])
    }
}

/// JSON literals as written in saved graphs: integers stay integers,
/// `{"x":..,"y":..}` objects are plain untyped objects.
impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                if let Some(handle) = handle_literal(&map) {
                    return Value::Handle(handle);
                }
                let type_id = map
                    .get("__type__")
                    .and_then(|t| t.as_str())
                    .map(str::to_string);
                let fields = map
                    .into_iter()
                    .filter(|(k, _)| k != "__type__")
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect();
                Value::Object { type_id, fields }
            }
        }
    }
}

/// `{"__handle__": <uuid>, "__type__": <kind>}`, the literal form of a [`Handle`]
fn handle_literal(map: &serde_json::Map<String, serde_json::Value>) -> Option<Handle> {
    let id = map.get("__handle__")?.as_str()?;
    let id = uuid::Uuid::parse_str(id).ok()?;
    let type_id = map.get("__type__")?.as_str()?;
    Some(Handle {
        id: HandleId(id),
        type_id: type_id.to_string(),
    })
}

impl From<Value> for serde_json::Value {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Int(i) => serde_json::Value::Number(i.into()),
            Value::Float(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s),
            Value::Array(items) => {
                serde_json::Value::Array(items.into_iter().map(Into::into).collect())
            }
            Value::Object { type_id, fields } => {
                let mut map: serde_json::Map<String, serde_json::Value> =
                    fields.into_iter().map(|(k, v)| (k, v.into())).collect();
                if let Some(tid) = type_id {
                    map.insert("__type__".to_string(), serde_json::Value::String(tid));
                }
                serde_json::Value::Object(map)
            }
            Value::Handle(h) => serde_json::json!({
                "__handle__": h.id.to_string(),
                "__type__": h.type_id,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_views() {
        assert_eq!(Value::from(7).as_f64(), Some(7.0));
        assert_eq!(Value::from(4.0).as_i64(), Some(4));
        assert_eq!(Value::from(4.5).as_i64(), None);
        assert_eq!(Value::Float(f64::NAN).as_i64(), None);
        assert!(Value::from(1).is_numeric());
        assert!(!Value::from("1").is_numeric());
    }

    #[test]
    fn test_vec2_object_shape() {
        let v = Value::from(Vec2::new(1.5, -2.0));
        assert_eq!(v.object_type_id(), Some("Vec2"));
        assert_eq!(v.get("x"), Some(&Value::Float(1.5)));
        assert_eq!(v.as_vec2(), Some(Vec2::new(1.5, -2.0)));
    }

    #[test]
    fn test_json_interop_keeps_type_tag() {
        let original = Value::from(Vec2::new(3.0, 4.0));
        let json: serde_json::Value = original.clone().into();
        assert_eq!(json["__type__"], "Vec2");

        let back = Value::from(json);
        assert_eq!(back, original);
    }

    #[test]
    fn test_json_integers_stay_integers() {
        let v = Value::from(serde_json::json!([7, 2.5, "a", null]));
        assert_eq!(
            v,
            Value::Array(vec![
                Value::Int(7),
                Value::Float(2.5),
                Value::from("a"),
                Value::Null
            ])
        );
    }

    #[test]
    fn test_handle_equality() {
        let h = Handle::new("entity");
        assert_eq!(Value::from(h.clone()).as_handle(), Some(&h));
        assert_ne!(Handle::new("entity"), h);
    }
}
