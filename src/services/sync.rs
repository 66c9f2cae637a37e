//! Forecast ingestion: resolve → fetch → upsert.
//!
//! This is the only write path into `weather_data`. Re-running a sync for the
//! same location is safe; hours already stored are skipped by the table's
//! uniqueness constraint.

use sqlx::SqlitePool;

use crate::db::models::NewWeatherSample;
use crate::db::queries;
use crate::errors::AppError;
use crate::locations::LocationTable;
use crate::services::open_meteo::{HourlyForecast, OpenMeteoClient};

/// Result of one sync call.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncOutcome {
    pub location_name: String,
    /// Rows newly written; hours that were already stored are not counted.
    pub rows_inserted: u64,
}

/// Pair each hour with its temperature, stamped with the resolved location.
pub fn build_samples(forecast: HourlyForecast, location_name: &str) -> Vec<NewWeatherSample> {
    forecast
        .times
        .into_iter()
        .zip(forecast.temperatures)
        .map(|(timestamp, temperature)| NewWeatherSample {
            timestamp,
            temperature,
            location_name: location_name.to_string(),
        })
        .collect()
}

/// Fetch the forecast for a coordinate pair and store every new hour.
///
/// A fetch or validation failure returns before anything is written.
pub async fn sync_location(
    pool: &SqlitePool,
    client: &OpenMeteoClient,
    locations: &LocationTable,
    latitude: f64,
    longitude: f64,
) -> Result<SyncOutcome, AppError> {
    let location_name = locations.resolve(latitude, longitude);
    tracing::info!(
        "Syncing weather for ({}, {}) as '{}'",
        latitude,
        longitude,
        location_name
    );

    let forecast = client
        .fetch_hourly_temperatures(latitude, longitude)
        .await?;
    let samples = build_samples(forecast, &location_name);
    let fetched = samples.len();

    let rows_inserted = queries::upsert_batch(pool, &samples).await?;

    tracing::info!(
        "Sync for '{}' complete: {} fetched, {} inserted, {} already stored",
        location_name,
        fetched,
        rows_inserted,
        fetched as u64 - rows_inserted
    );

    Ok(SyncOutcome {
        location_name,
        rows_inserted,
    })
}
