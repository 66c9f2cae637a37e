//! Weather HTTP endpoints.
//!
//! - POST /sync-weather?latitude=&longitude=
//! - GET  /week?latitude=&longitude=
//! - GET  /locations
//! - GET  /weather?limit=N

use axum::extract::{Query, State};
use axum::Json;
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use crate::db::queries;
use crate::errors::{AppError, ErrorResponse};
use crate::locations::LocationTable;
use crate::services::aggregate::{daily_daytime_average, week_window};
use crate::services::open_meteo::OpenMeteoClient;
use crate::services::sync::sync_location;

/// Berlin, used when a request omits its coordinates.
const DEFAULT_LATITUDE: f64 = 52.52;
const DEFAULT_LONGITUDE: f64 = 13.41;
/// Rows returned by `/weather` when `limit` is omitted.
const DEFAULT_LATEST_LIMIT: i64 = 10;
/// Largest accepted `limit` for `/weather`.
const MAX_LATEST_LIMIT: i64 = 1000;

/// Shared application state for weather endpoints.
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) pool: SqlitePool,
    pub(crate) forecast_client: OpenMeteoClient,
    pub(crate) locations: Arc<LocationTable>,
}

// ---------------------------------------------------------------------------
// Query parameter structs
// ---------------------------------------------------------------------------

fn default_latitude() -> f64 {
    DEFAULT_LATITUDE
}

fn default_longitude() -> f64 {
    DEFAULT_LONGITUDE
}

fn default_limit() -> i64 {
    DEFAULT_LATEST_LIMIT
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct CoordinatesQuery {
    /// Latitude in decimal degrees (default 52.52, Berlin)
    #[serde(default = "default_latitude")]
    pub latitude: f64,
    /// Longitude in decimal degrees (default 13.41, Berlin)
    #[serde(default = "default_longitude")]
    pub longitude: f64,
}

impl CoordinatesQuery {
    fn validate(&self) -> Result<(), AppError> {
        // is_finite() first: NaN slips through range comparisons.
        if !self.latitude.is_finite() || !self.longitude.is_finite() {
            return Err(AppError::BadRequest(
                "latitude and longitude must be finite numbers".to_string(),
            ));
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(AppError::BadRequest(format!(
                "latitude must be between -90 and 90, got {}",
                self.latitude
            )));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(AppError::BadRequest(format!(
                "longitude must be between -180 and 180, got {}",
                self.longitude
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct LatestQuery {
    /// Number of rows to return (default 10, max 1000)
    #[serde(default = "default_limit")]
    pub limit: i64,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Result of a sync call.
#[derive(Debug, Serialize, ToSchema)]
pub struct SyncResponse {
    /// Number of hourly rows newly stored by this call
    pub rows_upserted: u64,
    /// Resolved location name
    pub city: String,
}

/// Daytime averages for the coming week, keyed by city then ISO date.
#[derive(Debug, Serialize, ToSchema)]
pub struct WeekResponse(pub BTreeMap<String, BTreeMap<String, f64>>);

#[derive(Debug, Serialize, ToSchema)]
pub struct LocationsResponse {
    /// Every location with stored data, alphabetically
    pub locations: Vec<String>,
}

/// One stored hourly temperature.
#[derive(Debug, Serialize, ToSchema)]
pub struct WeatherRow {
    /// Naive local hour as returned by Open-Meteo (e.g. "2024-01-01T06:00")
    pub timestamp: String,
    /// Temperature at 2 m in Celsius
    pub temperature: f64,
    /// Location name
    pub city: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Fetch the hourly forecast for a location and store every new hour.
#[utoipa::path(
    post,
    path = "/sync-weather",
    tag = "Weather",
    params(CoordinatesQuery),
    responses(
        (status = 200, description = "Forecast stored", body = SyncResponse),
        (status = 400, description = "Invalid coordinates", body = ErrorResponse),
        (status = 500, description = "Provider unavailable, malformed provider response, or storage failure", body = ErrorResponse),
    )
)]
pub async fn sync_weather(
    State(state): State<AppState>,
    Query(params): Query<CoordinatesQuery>,
) -> Result<Json<SyncResponse>, AppError> {
    params.validate()?;

    let outcome = sync_location(
        &state.pool,
        &state.forecast_client,
        &state.locations,
        params.latitude,
        params.longitude,
    )
    .await?;

    Ok(Json(SyncResponse {
        rows_upserted: outcome.rows_inserted,
        city: outcome.location_name,
    }))
}

/// Mean daytime (06:00-18:00) temperature per day for the week starting today.
#[utoipa::path(
    get,
    path = "/week",
    tag = "Weather",
    params(CoordinatesQuery),
    responses(
        (status = 200, description = "Daily daytime averages keyed by city, then date", body = WeekResponse),
        (status = 400, description = "Invalid coordinates", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse),
    )
)]
pub async fn get_week(
    State(state): State<AppState>,
    Query(params): Query<CoordinatesQuery>,
) -> Result<Json<WeekResponse>, AppError> {
    params.validate()?;

    let city = state.locations.resolve(params.latitude, params.longitude);
    let today = Local::now().date_naive();
    let averages = week_averages(&state.pool, &city, today).await?;

    let mut body = BTreeMap::new();
    body.insert(city, averages);
    Ok(Json(WeekResponse(body)))
}

/// Daytime averages for `city` over `[today, today + 7)`, keyed by ISO date.
pub(crate) async fn week_averages(
    pool: &SqlitePool,
    city: &str,
    today: NaiveDate,
) -> Result<BTreeMap<String, f64>, AppError> {
    let (start, end) = week_window(today);
    tracing::debug!("Aggregating '{}' between {} and {}", city, start, end);

    let samples = queries::scan(pool, city, start, end).await?;
    Ok(daily_daytime_average(&samples)
        .into_iter()
        .map(|(date, avg)| (date.to_string(), avg))
        .collect())
}

/// List every location that has been synced at least once.
#[utoipa::path(
    get,
    path = "/locations",
    tag = "Weather",
    responses(
        (status = 200, description = "Known locations", body = LocationsResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse),
    )
)]
pub async fn get_locations(
    State(state): State<AppState>,
) -> Result<Json<LocationsResponse>, AppError> {
    let locations = queries::distinct_locations(&state.pool).await?;
    Ok(Json(LocationsResponse { locations }))
}

/// Most recent stored temperatures across all locations, newest first.
#[utoipa::path(
    get,
    path = "/weather",
    tag = "Weather",
    params(LatestQuery),
    responses(
        (status = 200, description = "Latest rows", body = Vec<WeatherRow>),
        (status = 400, description = "Invalid limit", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse),
    )
)]
pub async fn get_weather(
    State(state): State<AppState>,
    Query(params): Query<LatestQuery>,
) -> Result<Json<Vec<WeatherRow>>, AppError> {
    if !(0..=MAX_LATEST_LIMIT).contains(&params.limit) {
        return Err(AppError::BadRequest(format!(
            "limit must be between 0 and {}",
            MAX_LATEST_LIMIT
        )));
    }

    let rows = queries::scan_latest(&state.pool, params.limit).await?;
    Ok(Json(
        rows.into_iter()
            .map(|r| WeatherRow {
                timestamp: r.timestamp,
                temperature: r.temperature,
                city: r.location_name,
            })
            .collect(),
    ))
}
