use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

use crate::error::ConfigError;

/// Which physical quantity a station sensor reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementKind {
    Air,
    Road,
}

impl MeasurementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeasurementKind::Air => "air",
            MeasurementKind::Road => "road",
        }
    }

    /// Name of the measurement field in the provider's response.
    pub fn field(&self) -> &'static str {
        match self {
            MeasurementKind::Air => "Air",
            MeasurementKind::Road => "Road",
        }
    }

    /// Inclusion path sent in the query document.
    pub fn include_path(&self) -> &'static str {
        match self {
            MeasurementKind::Air => "Measurement.Air.Temp",
            MeasurementKind::Road => "Measurement.Road.Temp",
        }
    }
}

impl std::fmt::Display for MeasurementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for MeasurementKind {
    type Error = ConfigError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "air" => Ok(MeasurementKind::Air),
            "road" => Ok(MeasurementKind::Road),
            _ => Err(ConfigError::UnknownKind(value.to_string())),
        }
    }
}

/// One station/kind pair to query at the provider.
#[derive(Debug, Clone)]
pub struct StationQuery {
    pub station: String,
    pub kind: MeasurementKind,
}

impl StationQuery {
    /// Build a query, rejecting an empty station name up front.
    pub fn new(station: impl Into<String>, kind: MeasurementKind) -> Result<Self, ConfigError> {
        let station = station.into();
        if station.trim().is_empty() {
            return Err(ConfigError::EmptyField("station"));
        }

        Ok(Self { station, kind })
    }
}
