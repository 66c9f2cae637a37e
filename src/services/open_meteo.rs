//! Open-Meteo forecast client.
//!
//! Fetches the hourly 2 m temperature series for a coordinate pair.
//! See: https://open-meteo.com/en/docs

use serde::Deserialize;
use std::time::Duration;

use crate::errors::AppError;
use crate::timestamps::parse_local_timestamp;

/// Hourly variable requested from the provider.
const HOURLY_VARIABLE: &str = "temperature_2m";

/// Client for the Open-Meteo forecast endpoint.
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    client: reqwest::Client,
    forecast_url: String,
    timeout: Duration,
}

/// Validated hourly series: `times[i]` is the naive local hour of `temperatures[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyForecast {
    pub times: Vec<String>,
    pub temperatures: Vec<f64>,
}

// --- Open-Meteo JSON response types ---

#[derive(Debug, Deserialize)]
struct OpenMeteoResponse {
    hourly: OpenMeteoHourly,
}

#[derive(Debug, Deserialize)]
struct OpenMeteoHourly {
    time: Vec<String>,
    temperature_2m: Vec<f64>,
}

impl OpenMeteoClient {
    pub fn new(forecast_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            forecast_url: forecast_url.to_string(),
            timeout,
        })
    }

    /// Fetch and validate the hourly temperature series for a location.
    ///
    /// Transport failures, timeouts and non-2xx statuses are
    /// `UpstreamUnavailable`; a body that does not match the expected shape
    /// is `SchemaValidation`.
    pub async fn fetch_hourly_temperatures(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<HourlyForecast, AppError> {
        tracing::debug!(
            "Requesting {}?latitude={}&longitude={}&hourly={}",
            self.forecast_url,
            latitude,
            longitude,
            HOURLY_VARIABLE
        );

        let response = self
            .client
            .get(&self.forecast_url)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("hourly", HOURLY_VARIABLE.to_string()),
            ])
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::UpstreamUnavailable(format!(
                "Open-Meteo returned HTTP {}",
                status
            )));
        }

        let body = response.bytes().await.map_err(|e| self.transport_error(e))?;

        parse_forecast_body(&body)
    }

    fn transport_error(&self, err: reqwest::Error) -> AppError {
        if err.is_timeout() {
            AppError::UpstreamUnavailable(format!(
                "Open-Meteo did not respond within {}s",
                self.timeout.as_secs_f64()
            ))
        } else {
            AppError::UpstreamUnavailable(format!("Open-Meteo request failed: {}", err))
        }
    }
}

/// Validate a raw provider body into an index-aligned hourly series.
///
/// Pure function (no I/O), so the schema rules are testable without a server.
pub fn parse_forecast_body(body: &[u8]) -> Result<HourlyForecast, AppError> {
    let parsed: OpenMeteoResponse = serde_json::from_slice(body).map_err(|e| {
        AppError::SchemaValidation(format!("Open-Meteo response structure error: {}", e))
    })?;
    let OpenMeteoHourly {
        time,
        temperature_2m,
    } = parsed.hourly;

    if time.len() != temperature_2m.len() {
        return Err(AppError::SchemaValidation(format!(
            "hourly.time has {} entries but hourly.temperature_2m has {}",
            time.len(),
            temperature_2m.len()
        )));
    }

    if let Some(bad) = time.iter().find(|t| parse_local_timestamp(t).is_none()) {
        return Err(AppError::SchemaValidation(format!(
            "hourly.time entry '{}' is not an ISO-8601 local datetime",
            bad
        )));
    }

    Ok(HourlyForecast {
        times: time,
        temperatures: temperature_2m,
    })
}
