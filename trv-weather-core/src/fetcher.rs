use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use crate::error::FetchError;
use crate::model::StationQuery;
use crate::source::MeasurementSource;

/// Polls one station/kind pair, never more often than its minimum interval.
///
/// Owns the last successful reading. A failed fetch keeps the previous value
/// and timestamp untouched, so consumers see a stale value rather than a gap,
/// and the next refresh is free to try again.
#[derive(Debug)]
pub struct ThrottledFetcher<S> {
    source: S,
    query: StationQuery,
    min_interval: Duration,
    last_value: Option<f64>,
    last_fetch_time: Option<DateTime<Utc>>,
    last_error: Option<FetchError>,
}

impl<S: MeasurementSource> ThrottledFetcher<S> {
    /// Default minimum interval: one minute between outbound requests.
    pub fn new(source: S, query: StationQuery) -> Self {
        Self {
            source,
            query,
            min_interval: Duration::seconds(60),
            last_value: None,
            last_fetch_time: None,
            last_error: None,
        }
    }

    pub fn with_min_interval(mut self, min_interval: Duration) -> Self {
        self.min_interval = min_interval;
        self
    }

    /// Refresh the cached value if the interval gate allows it.
    ///
    /// `now` must be non-decreasing across calls on one instance. Failures
    /// are logged and recorded in `last_error`, never returned: the caller's
    /// polling loop keeps running whatever happens upstream.
    pub async fn refresh(&mut self, now: DateTime<Utc>) {
        if let Some(last) = self.last_fetch_time {
            if now - last < self.min_interval {
                debug!(station = %self.query.station, "within throttle window, skipping fetch");
                return;
            }
        }

        match self.source.fetch_temperature(&self.query).await {
            Ok(celsius) => {
                self.last_value = Some(celsius);
                self.last_fetch_time = Some(now);
                self.last_error = None;
            }
            Err(err) => {
                warn!(
                    station = %self.query.station,
                    kind = %self.query.kind,
                    "fetch failed, keeping previous value: {err}"
                );
                self.last_error = Some(err);
            }
        }
    }

    /// Last successfully fetched temperature, in Celsius. Pure read.
    pub fn current_value(&self) -> Option<f64> {
        self.last_value
    }

    /// Time of the last successful fetch.
    pub fn last_fetch_time(&self) -> Option<DateTime<Utc>> {
        self.last_fetch_time
    }

    /// Failure recorded by the most recent attempted fetch, cleared on success.
    pub fn last_error(&self) -> Option<&FetchError> {
        self.last_error.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MeasurementKind;
    use chrono::TimeZone;
    use std::sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    /// Scripted stand-in for the provider: pops one canned response per call
    /// and counts how many outbound requests the fetcher actually made.
    #[derive(Debug, Clone)]
    struct ScriptedSource {
        inner: Arc<Inner>,
    }

    #[derive(Debug)]
    struct Inner {
        calls: AtomicUsize,
        responses: Mutex<Vec<Result<f64, FetchError>>>,
    }

    impl ScriptedSource {
        fn new(responses: Vec<Result<f64, FetchError>>) -> Self {
            Self {
                inner: Arc::new(Inner {
                    calls: AtomicUsize::new(0),
                    responses: Mutex::new(responses),
                }),
            }
        }

        fn calls(&self) -> usize {
            self.inner.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl MeasurementSource for ScriptedSource {
        async fn fetch_temperature(&self, _query: &StationQuery) -> Result<f64, FetchError> {
            self.inner.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.responses.lock().unwrap().remove(0)
        }
    }

    fn at(secs: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap() + Duration::seconds(i64::from(secs))
    }

    fn fetcher(source: ScriptedSource) -> ThrottledFetcher<ScriptedSource> {
        let query = StationQuery::new("Lanna", MeasurementKind::Air).unwrap();
        ThrottledFetcher::new(source, query)
    }

    #[tokio::test]
    async fn second_refresh_within_interval_issues_one_request() {
        let source = ScriptedSource::new(vec![Ok(5.2), Ok(6.0)]);
        let mut f = fetcher(source.clone());

        f.refresh(at(0)).await;
        f.refresh(at(30)).await;

        assert_eq!(source.calls(), 1);
        assert_eq!(f.current_value(), Some(5.2));
    }

    #[tokio::test]
    async fn refresh_at_interval_boundary_issues_second_request() {
        let source = ScriptedSource::new(vec![Ok(5.2), Ok(6.0)]);
        let mut f = fetcher(source.clone());

        f.refresh(at(0)).await;
        f.refresh(at(60)).await;

        assert_eq!(source.calls(), 2);
        assert_eq!(f.current_value(), Some(6.0));
    }

    #[tokio::test]
    async fn failed_fetch_keeps_previous_value_and_timestamp() {
        let source = ScriptedSource::new(vec![
            Ok(1.5),
            Err(FetchError::Parse("RESULT is empty".to_string())),
        ]);
        let mut f = fetcher(source.clone()).with_min_interval(Duration::zero());

        f.refresh(at(0)).await;
        f.refresh(at(1)).await;

        assert_eq!(f.current_value(), Some(1.5));
        assert_eq!(f.last_fetch_time(), Some(at(0)));
        assert!(matches!(f.last_error(), Some(FetchError::Parse(_))));
    }

    #[tokio::test]
    async fn failure_before_any_success_leaves_value_absent() {
        let source = ScriptedSource::new(vec![Err(FetchError::Transport(
            "connection refused".to_string(),
        ))]);
        let mut f = fetcher(source.clone());

        f.refresh(at(0)).await;

        assert_eq!(f.current_value(), None);
        assert_eq!(f.last_fetch_time(), None);
        assert!(matches!(f.last_error(), Some(FetchError::Transport(_))));
    }

    #[tokio::test]
    async fn failure_does_not_arm_the_throttle() {
        // last_fetch_time only moves on success, so the very next refresh
        // after a failure goes out again even within the window.
        let source = ScriptedSource::new(vec![
            Err(FetchError::Transport("connection refused".to_string())),
            Ok(3.0),
        ]);
        let mut f = fetcher(source.clone());

        f.refresh(at(0)).await;
        f.refresh(at(1)).await;

        assert_eq!(source.calls(), 2);
        assert_eq!(f.current_value(), Some(3.0));
    }

    #[tokio::test]
    async fn success_clears_recorded_error() {
        let source = ScriptedSource::new(vec![
            Err(FetchError::Parse("bad body".to_string())),
            Ok(2.5),
        ]);
        let mut f = fetcher(source.clone()).with_min_interval(Duration::zero());

        f.refresh(at(0)).await;
        assert!(f.last_error().is_some());

        f.refresh(at(1)).await;
        assert!(f.last_error().is_none());
        assert_eq!(f.current_value(), Some(2.5));
    }

    #[tokio::test]
    async fn throttled_refresh_touches_no_state() {
        let source = ScriptedSource::new(vec![Ok(5.2)]);
        let mut f = fetcher(source.clone());

        f.refresh(at(0)).await;
        f.refresh(at(59)).await;

        assert_eq!(f.last_fetch_time(), Some(at(0)));
        assert_eq!(f.current_value(), Some(5.2));
        assert!(f.last_error().is_none());
    }
}
