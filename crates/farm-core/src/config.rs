//! Simulation configuration, loadable from YAML.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::profiles::region_by_name;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Simulation configuration parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Seed for deterministic RNG; entropy is used when absent.
    pub rng_seed: Option<u64>,
    /// Region (farm name or state) used when generating a farm.
    pub region: Option<String>,
    /// Directory holding the JSON documents.
    pub data_dir: PathBuf,
    /// Seconds between live ticks.
    pub tick_interval_secs: u64,
    /// Derive equipment alerts every N ticks.
    pub alert_every_ticks: u32,
    /// Refresh the forecast every N ticks.
    pub forecast_every_ticks: u32,
    pub forecast_days: u32,
    /// Days of history produced by a dataset backfill.
    pub history_days: u32,
    /// Hours between backfilled readings.
    pub history_step_hours: u32,
    /// Readings kept by the store.
    pub sensor_retention: usize,
    /// Alerts kept by the store.
    pub alert_retention: usize,
    /// Advance crop growth on every tick.
    pub apply_growth: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            rng_seed: None,
            region: None,
            data_dir: PathBuf::from("data"),
            tick_interval_secs: 30,
            alert_every_ticks: 10,
            forecast_every_ticks: 120,
            forecast_days: 7,
            history_days: 30,
            history_step_hours: 6,
            sensor_retention: 1000,
            alert_retention: 100,
            apply_growth: true,
        }
    }
}

impl SimConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let cfg: SimConfig = serde_yaml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("tick_interval_secs", self.tick_interval_secs),
            ("alert_every_ticks", u64::from(self.alert_every_ticks)),
            ("forecast_every_ticks", u64::from(self.forecast_every_ticks)),
            ("history_step_hours", u64::from(self.history_step_hours)),
            ("sensor_retention", self.sensor_retention as u64),
            ("alert_retention", self.alert_retention as u64),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be > 0".to_string(),
                });
            }
        }
        if let Some(region) = &self.region {
            if region_by_name(region).is_none() {
                return Err(ConfigError::Invalid {
                    field: "region",
                    reason: format!("unknown region {region:?}"),
                });
            }
        }
        Ok(())
    }
}
