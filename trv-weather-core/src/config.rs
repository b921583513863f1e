use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::error::ConfigError;
use crate::model::{MeasurementKind, StationQuery};

/// Settings for one configured station sensor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorConfig {
    /// Display name of the sensor, e.g. "Lanna road".
    pub name: String,
    /// Station name as known to Trafikverket, e.g. "Lanna".
    pub station: String,
    pub kind: MeasurementKind,
}

impl SensorConfig {
    /// Validate and build sensor settings. Empty required fields are
    /// rejected here, before anything can reach the network.
    pub fn new(
        name: impl Into<String>,
        station: impl Into<String>,
        kind: MeasurementKind,
    ) -> Result<Self, ConfigError> {
        let cfg = Self { name: name.into(), station: station.into(), kind };
        cfg.validate()?;

        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::EmptyField("name"));
        }
        if self.station.trim().is_empty() {
            return Err(ConfigError::EmptyField("station"));
        }

        Ok(())
    }

    /// The station/kind pair this sensor polls.
    pub fn query(&self) -> Result<StationQuery, ConfigError> {
        StationQuery::new(self.station.clone(), self.kind)
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// API key for the Trafikverket open data API.
    pub api_key: Option<String>,

    /// Example TOML:
    /// [[sensors]]
    /// name = "Lanna road"
    /// station = "Lanna"
    /// kind = "road"
    #[serde(default)]
    pub sensors: Vec<SensorConfig>,
}

impl Config {
    /// The configured API key, or an actionable error when none is set yet.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    pub fn sensor(&self, name: &str) -> Result<&SensorConfig, ConfigError> {
        self.sensors
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| ConfigError::UnknownSensor(name.to_string()))
    }

    /// Add a sensor, rejecting duplicates by display name.
    pub fn add_sensor(&mut self, sensor: SensorConfig) -> Result<(), ConfigError> {
        sensor.validate()?;

        if self.sensors.iter().any(|s| s.name == sensor.name) {
            return Err(ConfigError::DuplicateSensor(sensor.name));
        }

        self.sensors.push(sensor);
        Ok(())
    }

    pub fn remove_sensor(&mut self, name: &str) -> Result<SensorConfig, ConfigError> {
        let idx = self
            .sensors
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| ConfigError::UnknownSensor(name.to_string()))?;

        Ok(self.sensors.remove(idx))
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("se", "trv-weather", "trv-weather")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
