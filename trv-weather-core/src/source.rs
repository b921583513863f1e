use async_trait::async_trait;
use std::fmt::Debug;

use crate::error::FetchError;
use crate::model::StationQuery;

pub mod trafikverket;

pub use trafikverket::TrafikverketSource;

/// Abstraction over the upstream measurement provider.
///
/// The fetcher talks to the provider only through this seam, which is also
/// what tests script against.
#[async_trait]
pub trait MeasurementSource: Send + Sync + Debug {
    /// Fetch the current temperature in Celsius for one station query.
    async fn fetch_temperature(&self, query: &StationQuery) -> Result<f64, FetchError>;
}
