use axum::extract::State;
use axum::Json;
use serde::Serialize;
use sqlx::SqlitePool;
use utoipa::ToSchema;

use crate::db::queries;

/// Service status plus a summary of what the weather store holds.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// "ok", or "degraded" when the weather store cannot be read
    pub status: String,
    pub version: String,
    /// Whether `weather_data` answered the stats query
    pub database: bool,
    /// Stored hourly samples across all locations
    pub stored_samples: Option<i64>,
    /// Locations with at least one stored sample
    pub stored_locations: Option<i64>,
    /// Newest forecast hour in the store (naive local time)
    pub latest_timestamp: Option<String>,
    /// Write time of the most recent row (UTC, as assigned by SQLite)
    pub last_ingested_at: Option<String>,
}

/// Health check endpoint.
///
/// Reads counters from `weather_data`. A failed read still answers 200, with
/// status "degraded" and no counters.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service status and store summary", body = HealthResponse),
    )
)]
pub async fn health_check(State(pool): State<SqlitePool>) -> Json<HealthResponse> {
    let version = env!("CARGO_PKG_VERSION").to_string();

    match queries::store_stats(&pool).await {
        Ok(stats) => Json(HealthResponse {
            status: "ok".to_string(),
            version,
            database: true,
            stored_samples: Some(stats.sample_count),
            stored_locations: Some(stats.location_count),
            latest_timestamp: stats.latest_timestamp,
            last_ingested_at: stats.last_ingested_at,
        }),
        Err(e) => {
            tracing::warn!("Health check could not read weather_data: {}", e);
            Json(HealthResponse {
                status: "degraded".to_string(),
                version,
                database: false,
                stored_samples: None,
                stored_locations: None,
                latest_timestamp: None,
                last_ingested_at: None,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::NewWeatherSample;
    use crate::db::test_pool;

    fn sample(timestamp: &str, location: &str) -> NewWeatherSample {
        NewWeatherSample {
            timestamp: timestamp.to_string(),
            temperature: 12.5,
            location_name: location.to_string(),
        }
    }

    #[tokio::test]
    async fn test_health_on_empty_store() {
        let pool = test_pool().await;
        let Json(health) = health_check(State(pool)).await;
        assert_eq!(health.status, "ok");
        assert!(health.database);
        assert_eq!(health.stored_samples, Some(0));
        assert_eq!(health.stored_locations, Some(0));
        assert!(health.latest_timestamp.is_none());
    }

    #[tokio::test]
    async fn test_health_reports_stored_samples() {
        let pool = test_pool().await;
        queries::upsert_batch(
            &pool,
            &[
                sample("2024-06-01T10:00", "Berlin"),
                sample("2024-06-01T11:00", "Berlin"),
                sample("2024-06-01T11:00", "London"),
            ],
        )
        .await
        .unwrap();

        let Json(health) = health_check(State(pool)).await;
        assert_eq!(health.status, "ok");
        assert_eq!(health.stored_samples, Some(3));
        assert_eq!(health.stored_locations, Some(2));
        assert_eq!(health.latest_timestamp.as_deref(), Some("2024-06-01T11:00"));
        assert!(health.last_ingested_at.is_some());
    }

    #[tokio::test]
    async fn test_health_degraded_without_table() {
        let pool = test_pool().await;
        sqlx::query("DROP TABLE weather_data")
            .execute(&pool)
            .await
            .unwrap();

        let Json(health) = health_check(State(pool)).await;
        assert_eq!(health.status, "degraded");
        assert!(!health.database);
        assert!(health.stored_samples.is_none());
    }

    #[tokio::test]
    async fn test_health_degraded_when_pool_closed() {
        let pool = test_pool().await;
        pool.close().await;
        let Json(health) = health_check(State(pool)).await;
        assert_eq!(health.status, "degraded");
        assert!(!health.database);
    }
}
