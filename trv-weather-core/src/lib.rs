//! Core library for the `trv-weather` CLI.
//!
//! This crate defines:
//! - Configuration & credential handling
//! - The Trafikverket measurement source, behind a trait seam
//! - The throttled fetcher that caches the last reading per station
//!
//! It is used by `trv-weather-cli`, but can also be reused by other binaries
//! or services.

pub mod config;
pub mod error;
pub mod fetcher;
pub mod model;
pub mod sensor;
pub mod source;

pub use config::{Config, SensorConfig};
pub use error::{ConfigError, FetchError};
pub use fetcher::ThrottledFetcher;
pub use model::{MeasurementKind, StationQuery};
pub use sensor::WeatherStationSensor;
pub use source::{MeasurementSource, TrafikverketSource};
