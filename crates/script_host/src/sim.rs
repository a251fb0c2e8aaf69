// Simulated Entity - Headless stand-in for a physics-backed scene actor

use serde::Serialize;

use script_runtime::Entity;
use script_types::{Handle, Vec2};

#[derive(Debug, Clone, Serialize)]
pub struct SimEntity {
    pub handle: Handle,
    pub position: Vec2,
    pub velocity: Vec2,
    /// Force accumulated since the last integration step
    pub force: Vec2,
    pub scale: f64,
    pub mass: f64,
}

impl SimEntity {
    pub fn new(mass: f64) -> Self {
        Self {
            handle: Handle::new("entity"),
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            force: Vec2::ZERO,
            scale: 1.0,
            mass,
        }
    }

    /// Semi-implicit Euler step: force changes velocity, then velocity moves
    /// the entity. The force accumulator is cleared.
    pub fn integrate(&mut self, dt: f64) {
        let acceleration = self.force.scale(1.0 / self.mass);
        self.velocity = self.velocity + acceleration.scale(dt);
        self.position = self.position + self.velocity.scale(dt);
        self.force = Vec2::ZERO;
    }
}

impl Entity for SimEntity {
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
        self.force = self.force + force;
    }

    fn set_scale(&mut self, scale: f64) {
        self.scale = scale;
    }
}
