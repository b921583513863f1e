use chrono::{DateTime, Utc};

use crate::fetcher::ThrottledFetcher;
use crate::source::MeasurementSource;

/// Unit reported for every temperature sensor.
pub const UNIT_CELSIUS: &str = "°C";

/// Attribution shown alongside every exposed value.
pub const ATTRIBUTION: &str = "Data provided by Trafikverket API";

/// A named temperature sensor backed by a throttled fetcher.
///
/// Plain value object: a host reads its state through getters instead of
/// subclassing anything.
#[derive(Debug)]
pub struct WeatherStationSensor<S> {
    name: String,
    fetcher: ThrottledFetcher<S>,
}

impl<S: MeasurementSource> WeatherStationSensor<S> {
    pub fn new(name: String, fetcher: ThrottledFetcher<S>) -> Self {
        Self { name, fetcher }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current sensor state; `None` until a fetch has succeeded.
    pub fn state(&self) -> Option<f64> {
        self.fetcher.current_value()
    }

    pub fn unit_of_measurement(&self) -> &'static str {
        UNIT_CELSIUS
    }

    pub fn attribution(&self) -> &'static str {
        ATTRIBUTION
    }

    /// Let the fetcher refresh if its interval gate allows it.
    pub async fn update(&mut self, now: DateTime<Utc>) {
        self.fetcher.refresh(now).await;
    }

    pub fn fetcher(&self) -> &ThrottledFetcher<S> {
        &self.fetcher
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::model::{MeasurementKind, StationQuery};

    #[derive(Debug)]
    struct StaticSource(f64);

    #[async_trait::async_trait]
    impl MeasurementSource for StaticSource {
        async fn fetch_temperature(&self, _query: &StationQuery) -> Result<f64, FetchError> {
            Ok(self.0)
        }
    }

    #[test]
    fn unit_and_attribution_are_fixed() {
        assert_eq!(UNIT_CELSIUS, "°C");
        assert_eq!(ATTRIBUTION, "Data provided by Trafikverket API");
    }

    #[tokio::test]
    async fn state_reflects_fetcher_value() {
        let query = StationQuery::new("Lanna", MeasurementKind::Air).unwrap();
        let fetcher = ThrottledFetcher::new(StaticSource(4.5), query);
        let mut sensor = WeatherStationSensor::new("Lanna air".to_string(), fetcher);

        assert_eq!(sensor.state(), None);

        sensor.update(Utc::now()).await;

        assert_eq!(sensor.state(), Some(4.5));
        assert!(sensor.fetcher().last_error().is_none());
    }
}
