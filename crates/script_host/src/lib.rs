//! Script Host - Headless driver for script graphs
//!
//! Loads serialized graphs and a TOML config, attaches the graphs to a
//! simulated entity and steps them for a fixed number of ticks.

pub use script_runtime;

pub mod behavior;
pub mod config;
pub mod runner;
pub mod sim;

pub use behavior::{Behavior, FaultRecord, UpdateSummary};
pub use config::HostConfig;
pub use runner::{RunReport, apply_exports, load_graph, run};
pub use sim::SimEntity;
