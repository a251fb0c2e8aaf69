//! Script Types - Core data definitions for script graphs
//!
//! This crate holds the pure data structures shared by the runtime and any
//! tooling that reads or writes saved graphs: values, port descriptors,
//! template kinds and the serialized graph form.

mod serialized;
mod types;
mod value;
mod vec2;

pub use serialized::*;
pub use types::*;
pub use value::*;
pub use vec2::*;
