//! Configuration System
//!
//! Loads the run configuration from a TOML file: grid and clock settings
//! plus the organisms to spawn.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "ecosim.toml";

/// Top-level configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub organisms: Vec<OrganismConfig>,
}

/// Grid, clock and run-length parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub grid_x_size: i32,
    pub grid_y_size: i32,
    /// Simulated seconds per tick.
    pub seconds_per_tick: f64,
    pub ticks: u64,
    pub seed: u64,
    pub snapshot_interval: u64,
    /// Ticks per wall-clock second. Zero runs unpaced.
    pub tick_rate: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            grid_x_size: 40,
            grid_y_size: 40,
            seconds_per_tick: 3600.0,
            ticks: 1000,
            seed: 42,
            snapshot_interval: 100,
            tick_rate: 0.0,
        }
    }
}

/// A batch of organisms of one species
#[derive(Debug, Clone, Deserialize)]
pub struct OrganismConfig {
    /// Species library directory.
    pub library: PathBuf,
    /// Scientific name, e.g. "Vulpes vulpes".
    pub name: String,
    #[serde(default = "default_quantity")]
    pub quantity: usize,
}

fn default_quantity() -> usize {
    1
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default path, or use defaults if not found
    pub fn load_or_default() -> Self {
        Self::load(DEFAULT_CONFIG_PATH).unwrap_or_else(|e| {
            tracing::warn!("Could not load {}: {}. Using defaults.", DEFAULT_CONFIG_PATH, e);
            Self::default()
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let sim = &self.simulation;
        if sim.grid_x_size <= 0 || sim.grid_y_size <= 0 {
            return Err(ConfigError::Invalid(format!(
                "grid size must be positive, got {}x{}",
                sim.grid_x_size, sim.grid_y_size
            )));
        }
        if !(sim.seconds_per_tick > 0.0) {
            return Err(ConfigError::Invalid(
                "seconds_per_tick must be positive".to_string(),
            ));
        }
        if sim.tick_rate < 0.0 {
            return Err(ConfigError::Invalid("tick_rate cannot be negative".to_string()));
        }
        Ok(())
    }

    /// Total organisms requested across all batches.
    pub fn organism_count(&self) -> usize {
        self.organisms.iter().map(|o| o.quantity).sum()
    }
}

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.simulation.ticks, 1000);
        assert_eq!(config.simulation.grid_x_size, 40);
        assert!(config.organisms.is_empty());
    }

    #[test]
    fn test_parse_config() {
        let config = Config::from_toml(
            r#"
            [simulation]
            grid_x_size = 12
            grid_y_size = 8
            seed = 7

            [[organisms]]
            library = "library"
            name = "Vulpes vulpes"
            quantity = 3

            [[organisms]]
            library = "library"
            name = "Lepus europaeus"
            "#,
        )
        .unwrap();

        assert_eq!(config.simulation.grid_x_size, 12);
        assert_eq!(config.simulation.seed, 7);
        assert_eq!(config.simulation.seconds_per_tick, 3600.0);
        assert_eq!(config.organisms[0].name, "Vulpes vulpes");
        assert_eq!(config.organism_count(), 4);
    }

    #[test]
    fn test_invalid_config() {
        let err = Config::from_toml("[simulation]\ngrid_x_size = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = Config::from_toml("[simulation\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load("/nonexistent/ecosim.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
