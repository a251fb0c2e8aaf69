//! Two-component vector used by the math and entity nodes

use serde::{Deserialize, Serialize};

use crate::Value;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    /// Object tag used when a vector travels as a [`Value`]
    pub const TYPE_ID: &'static str = "Vec2";

    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn scale(self, s: f64) -> Self {
        Self::new(self.x * s, self.y * s)
    }

    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Unit vector in the same direction; the zero vector stays zero
    pub fn norm(self) -> Self {
        let len = self.length();
        if len == 0.0 { Self::ZERO } else { self.scale(1.0 / len) }
    }
}

impl std::ops::Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

/// Error when reading a typed value back out of a [`Value`]
#[derive(Debug, Clone, thiserror::Error)]
pub enum ValueConversionError {
    #[error("Expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },
}

impl TryFrom<&Value> for Vec2 {
    type Error = ValueConversionError;

    /// Accepts `Vec2`-tagged and untagged objects with numeric `x` and `y`
    fn try_from(v: &Value) -> Result<Self, Self::Error> {
        let mismatch = || ValueConversionError::TypeMismatch {
            expected: Vec2::TYPE_ID,
            actual: v.kind_name(),
        };
        match v.object_type_id() {
            Some(Vec2::TYPE_ID) | None => {}
            Some(_) => return Err(mismatch()),
        }
        let x = v.get("x").and_then(Value::as_f64).ok_or_else(mismatch)?;
        let y = v.get("y").and_then(Value::as_f64).ok_or_else(mismatch)?;
        Ok(Vec2::new(x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_norm() {
        let n = Vec2::new(3.0, 4.0).norm();
        assert!((n.x - 0.6).abs() < 1e-12);
        assert!((n.y - 0.8).abs() < 1e-12);
        assert_eq!(Vec2::ZERO.norm(), Vec2::ZERO);
    }

    #[test]
    fn test_untyped_object_converts() {
        let v = Value::from(serde_json::json!({"x": 1, "y": 2.5}));
        assert_eq!(Vec2::try_from(&v).ok(), Some(Vec2::new(1.0, 2.5)));
    }

    #[test]
    fn test_wrong_shapes_rejected() {
        assert!(Vec2::try_from(&Value::from(3)).is_err());
        let tagged = Value::typed_object("Color", [("x", 1.0), ("y", 2.0)]);
        assert!(Vec2::try_from(&tagged).is_err());
    }
}
