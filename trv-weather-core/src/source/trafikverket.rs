use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Deserializer, de};
use std::time::Duration;

use crate::error::{ConfigError, FetchError};
use crate::model::{MeasurementKind, StationQuery};

use super::MeasurementSource;

const DATA_URL: &str = "https://api.trafikinfo.trafikverket.se/v1.3/data.json";
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the Trafikverket open data API.
///
/// Issues one POST per fetch with a fixed-structure query document and
/// extracts a single temperature out of the JSON response.
#[derive(Debug, Clone)]
pub struct TrafikverketSource {
    api_key: String,
    http: Client,
}

impl TrafikverketSource {
    pub fn new(api_key: String) -> Result<Self, ConfigError> {
        if api_key.trim().is_empty() {
            return Err(ConfigError::EmptyField("api_key"));
        }

        Ok(Self {
            api_key,
            http: Client::new(),
        })
    }
}

#[async_trait]
impl MeasurementSource for TrafikverketSource {
    async fn fetch_temperature(&self, query: &StationQuery) -> Result<f64, FetchError> {
        let body = build_query(&self.api_key, query);

        let res = self
            .http
            .post(DATA_URL)
            .timeout(HTTP_TIMEOUT)
            .header(reqwest::header::CONTENT_TYPE, "text/xml")
            .body(body)
            .send()
            .await
            .map_err(|e| FetchError::Transport(format!("failed to send request: {e}")))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| FetchError::Transport(format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            return Err(FetchError::Transport(format!(
                "request failed with status {}: {}",
                status,
                truncate_body(&text),
            )));
        }

        extract_temperature(&text, query.kind)
    }
}

/// Build the query document for one station and kind.
///
/// Attribute values go through `escape_xml`; raw credential or station
/// strings never reach the document directly.
fn build_query(api_key: &str, query: &StationQuery) -> String {
    format!(
        "<REQUEST>\
         <LOGIN authenticationkey='{key}' />\
         <QUERY objecttype=\"WeatherStation\">\
         <FILTER><EQ name=\"Name\" value='{station}' /></FILTER>\
         <INCLUDE>{include}</INCLUDE>\
         </QUERY>\
         </REQUEST>",
        key = escape_xml(api_key),
        station = escape_xml(&query.station),
        include = query.kind.include_path(),
    )
}

fn escape_xml(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&apos;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Navigate `RESPONSE.RESULT[0].WeatherStation[0].Measurement.<kind>.Temp`.
/// Every deviation from that shape is a parse failure, including an empty
/// `RESULT` (the station name matched nothing).
fn extract_temperature(body: &str, kind: MeasurementKind) -> Result<f64, FetchError> {
    let envelope: TvEnvelope = serde_json::from_str(body)
        .map_err(|e| FetchError::Parse(format!("invalid response JSON: {e}")))?;

    let result = envelope
        .response
        .result
        .into_iter()
        .next()
        .ok_or_else(|| FetchError::Parse("RESULT is empty; no station matched".to_string()))?;

    let station = result
        .weather_stations
        .into_iter()
        .next()
        .ok_or_else(|| FetchError::Parse("no WeatherStation in RESULT".to_string()))?;

    let measurement = station
        .measurement
        .ok_or_else(|| FetchError::Parse("WeatherStation has no Measurement".to_string()))?;

    let temp = match kind {
        MeasurementKind::Air => measurement.air,
        MeasurementKind::Road => measurement.road,
    };

    temp.and_then(|t| t.temp)
        .ok_or_else(|| FetchError::Parse(format!("Measurement has no {}.Temp", kind.field())))
}

#[derive(Debug, Deserialize)]
struct TvEnvelope {
    #[serde(rename = "RESPONSE")]
    response: TvResponse,
}

#[derive(Debug, Deserialize)]
struct TvResponse {
    #[serde(rename = "RESULT")]
    result: Vec<TvResult>,
}

#[derive(Debug, Deserialize)]
struct TvResult {
    #[serde(rename = "WeatherStation", default)]
    weather_stations: Vec<TvWeatherStation>,
}

#[derive(Debug, Deserialize)]
struct TvWeatherStation {
    #[serde(rename = "Measurement")]
    measurement: Option<TvMeasurement>,
}

#[derive(Debug, Deserialize)]
struct TvMeasurement {
    #[serde(rename = "Air")]
    air: Option<TvTemp>,
    #[serde(rename = "Road")]
    road: Option<TvTemp>,
}

#[derive(Debug, Deserialize)]
struct TvTemp {
    // The API documents Temp as a number but the payload has been observed
    // carrying numeric strings as well.
    #[serde(rename = "Temp", default, deserialize_with = "temp_from_number_or_string")]
    temp: Option<f64>,
}

fn temp_from_number_or_string<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        String(String),
    }

    match Option::<NumberOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrString::Number(n)) => Ok(Some(n)),
        Some(NumberOrString::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("non-numeric Temp value '{s}'"))),
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX { format!("{}...", &body[..MAX]) } else { body.to_string() }
}
