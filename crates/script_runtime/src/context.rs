// Context - Capabilities supplied by the game layer
//
// The graph never reaches for engine globals. Whatever a node may touch is
// handed to the tick explicitly through a `ScriptContext`.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use script_types::{Handle, Value, Vec2};

/// The scene actor a graph controls
pub trait Entity {
    /// Identity used when the entity travels on a wire
    fn handle(&self) -> &Handle;

    fn velocity(&self) -> Vec2;

    fn set_velocity(&mut self, v: Vec2);

    fn set_velocity_x(&mut self, x: f64);

    fn apply_force(&mut self, force: Vec2);

    fn set_scale(&mut self, scale: f64);
}

/// Keyboard state for the current tick
pub trait InputState {
    fn is_key_pressed(&self, key: &str) -> bool;
}

/// Read-only engine/world state for the current tick
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorldState {
    /// Index of the tick being processed
    pub tick: u64,
    /// Seconds since the previous tick
    pub delta: f64,
    /// Seconds since the simulation started
    pub elapsed: f64,
    #[serde(default)]
    pub values: HashMap<String, Value>,
}

impl WorldState {
    pub fn new(tick: u64, delta: f64, elapsed: f64) -> Self {
        Self {
            tick,
            delta,
            elapsed,
            values: HashMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }
}

/// Capability bundle threaded into every evaluation of a tick
pub struct ScriptContext<'a> {
    pub entity: &'a mut dyn Entity,
    pub input: &'a dyn InputState,
    pub global: &'a WorldState,
}

impl<'a> ScriptContext<'a> {
    pub fn new(
        entity: &'a mut dyn Entity,
        input: &'a dyn InputState,
        global: &'a WorldState,
    ) -> Self {
        Self {
            entity,
            input,
            global,
        }
    }
}

/// Set of currently held keys
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PressedKeys(HashSet<String>);

impl PressedKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, key: impl Into<String>) {
        self.0.insert(key.into());
    }

    pub fn release(&mut self, key: &str) {
        self.0.remove(key);
    }
}

impl<S: Into<String>> FromIterator<S> for PressedKeys {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl InputState for PressedKeys {
    fn is_key_pressed(&self, key: &str) -> bool {
        self.0.contains(key)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Recording entity shared by the runtime tests

    use super::*;

    #[derive(Debug)]
    pub struct RecordingEntity {
        pub handle: Handle,
        pub velocity: Vec2,
        pub forces: Vec<Vec2>,
        pub scale: f64,
    }

    impl RecordingEntity {
        pub fn new() -> Self {
            Self {
                handle: Handle::new("entity"),
                velocity: Vec2::ZERO,
                forces: Vec::new(),
                scale: 1.0,
            }
        }
    }

    impl Entity for RecordingEntity {
        fn handle(&self) -> &Handle {
            &self.handle
        }

        fn velocity(&self) -> Vec2 {
            self.velocity
        }

        fn set_velocity(&mut self, v: Vec2) {
            self.velocity = v;
        }

        fn set_velocity_x(&mut self, x: f64) {
            self.velocity.x = x;
        }

        fn apply_force(&mut self, force: Vec2) {
            self.forces.push(force);
        }

        fn set_scale(&mut self, scale: f64) {
            self.scale = scale;
        }
    }
}
