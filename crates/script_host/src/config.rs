//! Host configuration (host.toml)
//!
//! ```toml
//! log_filter = "script_host=debug"
//!
//! [graph]
//! iteration_cap_factor = 10
//!
//! [run]
//! ticks = 120
//! delta = 0.016
//! keys = ["Space"]
//!
//! [entity]
//! mass = 2.0
//!
//! [exports]
//! speed = 4.5
//! ```

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use script_runtime::GraphConfig;
use script_types::Value;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostConfig {
    /// Overrides the default tracing filter; `RUST_LOG` still wins
    pub log_filter: Option<String>,
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub entity: EntityConfig,
    /// Tuned values applied to the graph's export surface by name
    #[serde(default)]
    pub exports: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub ticks: u64,
    /// Seconds per tick
    pub delta: f64,
    /// Keys held for the whole run
    pub keys: Vec<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            ticks: 60,
            delta: 1.0 / 60.0,
            keys: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityConfig {
    pub mass: f64,
}

impl Default for EntityConfig {
    fn default() -> Self {
        Self { mass: 1.0 }
    }
}

impl HostConfig {
    /// Load from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let config: HostConfig = toml::from_str(text)?;
        if !(config.run.delta.is_finite() && config.run.delta >= 0.0) {
            anyhow::bail!("run.delta must be a non-negative number, got {}", config.run.delta);
        }
        if !(config.entity.mass.is_finite() && config.entity.mass > 0.0) {
            anyhow::bail!("entity.mass must be positive, got {}", config.entity.mass);
        }
        Ok(config)
    }

    /// Export overrides as wire values
    pub fn export_values(&self) -> HashMap<String, Value> {
        self.exports
            .iter()
            .map(|(name, value)| (name.clone(), Value::from(value.clone())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = HostConfig::from_toml("").unwrap();
        assert_eq!(config.graph, GraphConfig::default());
        assert_eq!(config.run.ticks, 60);
        assert!(config.run.keys.is_empty());
        assert_eq!(config.entity.mass, 1.0);
        assert!(config.log_filter.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
log_filter = "script_host=debug"

[graph]
iteration_cap_factor = 4

[run]
ticks = 3
delta = 0.5
keys = ["Space", "D"]

[exports]
speed = 4.5
lives = 3
"#
        )
        .unwrap();

        let config = HostConfig::load(file.path()).unwrap();
        assert_eq!(config.log_filter.as_deref(), Some("script_host=debug"));
        assert_eq!(config.graph.iteration_cap_factor, 4);
        assert_eq!(config.run.ticks, 3);
        assert_eq!(config.run.keys, vec!["Space", "D"]);

        let exports = config.export_values();
        assert_eq!(exports["speed"], Value::Float(4.5));
        assert_eq!(exports["lives"], Value::Int(3));
    }

    #[test]
    fn test_missing_file_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");
        let err = HostConfig::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("missing.toml"));
    }

    #[test]
    fn test_rejects_bad_mass() {
        let err = HostConfig::from_toml("[entity]\nmass = 0.0\n").unwrap_err();
        assert!(err.to_string().contains("mass"));
    }
}
