//! Script Runtime - Execution engine for script graphs
//!
//! This crate contains the template registry, the built-in node catalog and
//! the graph that wires node instances together and runs them each tick.

pub use script_types;

pub mod catalog;
pub mod category;
mod config;
mod context;
mod dispatch;
mod error;
mod executor;
mod exports;
mod graph;
mod node;
mod registry;

pub use category::{CategoryStyle, category_style};
pub use config::*;
pub use context::*;
pub use dispatch::{ON_COLLIDE, ON_TICK};
pub use error::*;
pub use executor::*;
pub use graph::{Edge, EdgeId, GraphId, NodeId, NodeRef, ScriptGraph, TickReport};
pub use node::{NodeInstance, RunOutcome};
pub use registry::*;
