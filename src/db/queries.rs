use chrono::NaiveDate;
use sqlx::SqlitePool;

use super::models::{LocatedSample, NewWeatherSample, StoreStats, StoredSample};

/// Create the sample table and its indexes if absent. Safe on every start.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS weather_data (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            timestamp TEXT NOT NULL,
            temperature REAL NOT NULL,
            city_name TEXT NOT NULL DEFAULT 'unknown',
            created_at TEXT DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(timestamp, city_name)
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_weather_data_city_timestamp
         ON weather_data (city_name, timestamp)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Insert every sample whose (timestamp, location) is not yet stored.
///
/// Runs in one transaction: on failure nothing from this batch is committed.
/// Returns the number of rows actually inserted; duplicates are skipped and
/// never overwrite the existing row.
pub async fn upsert_batch(
    pool: &SqlitePool,
    samples: &[NewWeatherSample],
) -> Result<u64, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut inserted = 0;

    for sample in samples {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO weather_data (timestamp, temperature, city_name)
             VALUES (?, ?, ?)",
        )
        .bind(&sample.timestamp)
        .bind(sample.temperature)
        .bind(&sample.location_name)
        .execute(&mut *tx)
        .await?;
        inserted += result.rows_affected();
    }

    tx.commit().await?;
    Ok(inserted)
}

/// Samples for one location whose calendar date lies in `[start, end)`,
/// oldest first.
pub async fn scan(
    pool: &SqlitePool,
    location_name: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<StoredSample>, sqlx::Error> {
    sqlx::query_as::<_, StoredSample>(
        "SELECT timestamp, temperature FROM weather_data
         WHERE date(timestamp) >= date(?)
           AND date(timestamp) < date(?)
           AND city_name = ?
         ORDER BY timestamp ASC",
    )
    .bind(start.to_string())
    .bind(end.to_string())
    .bind(location_name)
    .fetch_all(pool)
    .await
}

/// The `limit` most recent samples across all locations, newest first.
pub async fn scan_latest(pool: &SqlitePool, limit: i64) -> Result<Vec<LocatedSample>, sqlx::Error> {
    sqlx::query_as::<_, LocatedSample>(
        "SELECT timestamp, temperature, city_name FROM weather_data
         ORDER BY timestamp DESC, city_name ASC
         LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Every location with at least one stored sample, alphabetically.
pub async fn distinct_locations(pool: &SqlitePool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT city_name FROM weather_data ORDER BY city_name",
    )
    .fetch_all(pool)
    .await
}

/// Row and location counts plus the newest stored hour and write time.
pub async fn store_stats(pool: &SqlitePool) -> Result<StoreStats, sqlx::Error> {
    sqlx::query_as::<_, StoreStats>(
        "SELECT COUNT(*) AS sample_count,
                COUNT(DISTINCT city_name) AS location_count,
                MAX(timestamp) AS latest_timestamp,
                MAX(created_at) AS last_ingested_at
         FROM weather_data",
    )
    .fetch_one(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    fn sample(timestamp: &str, temperature: f64, location: &str) -> NewWeatherSample {
        NewWeatherSample {
            timestamp: timestamp.to_string(),
            temperature,
            location_name: location.to_string(),
        }
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    async fn row_count(pool: &SqlitePool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM weather_data")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_ensure_schema_is_idempotent() {
        let pool = test_pool().await;
        ensure_schema(&pool).await.unwrap();
        ensure_schema(&pool).await.unwrap();
        assert_eq!(row_count(&pool).await, 0);
    }

    #[tokio::test]
    async fn test_upsert_skips_existing_rows() {
        let pool = test_pool().await;
        let batch = vec![
            sample("2024-01-01T00:00", 1.0, "Berlin"),
            sample("2024-01-01T01:00", 2.0, "Berlin"),
        ];

        assert_eq!(upsert_batch(&pool, &batch).await.unwrap(), 2);
        assert_eq!(upsert_batch(&pool, &batch).await.unwrap(), 0);

        // Overlapping batch: one new hour, one existing hour with a different value.
        let overlap = vec![
            sample("2024-01-01T01:00", 99.0, "Berlin"),
            sample("2024-01-01T02:00", 3.0, "Berlin"),
        ];
        assert_eq!(upsert_batch(&pool, &overlap).await.unwrap(), 1);
        assert_eq!(row_count(&pool).await, 3);

        // Insert-if-absent: the original value is kept.
        let rows = scan(&pool, "Berlin", date("2024-01-01"), date("2024-01-02"))
            .await
            .unwrap();
        assert_eq!(rows[1].timestamp, "2024-01-01T01:00");
        assert_eq!(rows[1].temperature, 2.0);
    }

    #[tokio::test]
    async fn test_same_hour_different_locations_both_stored() {
        let pool = test_pool().await;
        let batch = vec![
            sample("2024-01-01T00:00", 1.0, "Berlin"),
            sample("2024-01-01T00:00", 25.0, "Sao Paulo"),
        ];
        assert_eq!(upsert_batch(&pool, &batch).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_duplicates_within_one_batch_insert_once() {
        let pool = test_pool().await;
        let batch = vec![
            sample("2024-01-01T00:00", 1.0, "Berlin"),
            sample("2024-01-01T00:00", 1.0, "Berlin"),
        ];
        assert_eq!(upsert_batch(&pool, &batch).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_upsert_rolls_back_whole_batch_on_failure() {
        let pool = test_pool().await;
        sqlx::query(
            "CREATE TRIGGER reject_hot BEFORE INSERT ON weather_data
             WHEN NEW.temperature > 100
             BEGIN SELECT RAISE(ABORT, 'too hot'); END",
        )
        .execute(&pool)
        .await
        .unwrap();

        let batch = vec![
            sample("2024-01-01T00:00", 1.0, "Berlin"),
            sample("2024-01-01T01:00", 500.0, "Berlin"),
        ];
        assert!(upsert_batch(&pool, &batch).await.is_err());
        assert_eq!(row_count(&pool).await, 0);
    }

    #[tokio::test]
    async fn test_created_at_is_assigned() {
        let pool = test_pool().await;
        upsert_batch(&pool, &[sample("2024-01-01T00:00", 1.0, "Berlin")])
            .await
            .unwrap();

        let created_at: Option<String> =
            sqlx::query_scalar("SELECT created_at FROM weather_data")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert!(created_at.is_some());
    }

    #[tokio::test]
    async fn test_scan_window_boundaries() {
        let pool = test_pool().await;
        let today = date("2024-03-10");
        let end = date("2024-03-17");
        upsert_batch(
            &pool,
            &[
                sample("2024-03-09T23:00", 0.0, "Berlin"),
                sample("2024-03-10T00:00", 1.0, "Berlin"),
                sample("2024-03-16T23:00", 2.0, "Berlin"),
                sample("2024-03-17T00:00", 3.0, "Berlin"),
            ],
        )
        .await
        .unwrap();

        let rows = scan(&pool, "Berlin", today, end).await.unwrap();
        let stamps: Vec<&str> = rows.iter().map(|r| r.timestamp.as_str()).collect();
        assert_eq!(stamps, vec!["2024-03-10T00:00", "2024-03-16T23:00"]);
    }

    #[tokio::test]
    async fn test_scan_filters_location_and_orders_ascending() {
        let pool = test_pool().await;
        upsert_batch(
            &pool,
            &[
                sample("2024-03-10T12:00", 12.0, "Berlin"),
                sample("2024-03-10T06:00", 6.0, "Berlin"),
                sample("2024-03-10T09:00", 30.0, "Paris"),
            ],
        )
        .await
        .unwrap();

        let rows = scan(&pool, "Berlin", date("2024-03-10"), date("2024-03-11"))
            .await
            .unwrap();
        assert_eq!(
            rows,
            vec![
                StoredSample {
                    timestamp: "2024-03-10T06:00".to_string(),
                    temperature: 6.0
                },
                StoredSample {
                    timestamp: "2024-03-10T12:00".to_string(),
                    temperature: 12.0
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_scan_latest_newest_first_with_limit() {
        let pool = test_pool().await;
        upsert_batch(
            &pool,
            &[
                sample("2024-03-10T00:00", 1.0, "Berlin"),
                sample("2024-03-10T02:00", 3.0, "Berlin"),
                sample("2024-03-10T01:00", 20.0, "Paris"),
            ],
        )
        .await
        .unwrap();

        let rows = scan_latest(&pool, 2).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].timestamp, "2024-03-10T02:00");
        assert_eq!(rows[0].location_name, "Berlin");
        assert_eq!(rows[1].timestamp, "2024-03-10T01:00");
        assert_eq!(rows[1].location_name, "Paris");

        assert!(scan_latest(&pool, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_distinct_locations_sorted_unique() {
        let pool = test_pool().await;
        assert!(distinct_locations(&pool).await.unwrap().is_empty());

        upsert_batch(
            &pool,
            &[
                sample("2024-03-10T00:00", 1.0, "Paris"),
                sample("2024-03-10T01:00", 1.0, "Paris"),
                sample("2024-03-10T00:00", 1.0, "Berlin"),
                sample("2024-03-10T00:00", 1.0, "0.00,0.00"),
            ],
        )
        .await
        .unwrap();

        assert_eq!(
            distinct_locations(&pool).await.unwrap(),
            vec!["0.00,0.00", "Berlin", "Paris"]
        );
    }

    #[tokio::test]
    async fn test_store_stats_empty_and_populated() {
        let pool = test_pool().await;
        let empty = store_stats(&pool).await.unwrap();
        assert_eq!(empty.sample_count, 0);
        assert_eq!(empty.location_count, 0);
        assert!(empty.latest_timestamp.is_none());
        assert!(empty.last_ingested_at.is_none());

        upsert_batch(
            &pool,
            &[
                sample("2024-03-10T00:00", 1.0, "Paris"),
                sample("2024-03-11T05:00", 1.0, "Paris"),
                sample("2024-03-10T00:00", 1.0, "Berlin"),
            ],
        )
        .await
        .unwrap();

        let stats = store_stats(&pool).await.unwrap();
        assert_eq!(stats.sample_count, 3);
        assert_eq!(stats.location_count, 2);
        assert_eq!(stats.latest_timestamp.as_deref(), Some("2024-03-11T05:00"));
        assert!(stats.last_ingested_at.is_some());
    }

    #[tokio::test]
    async fn test_concurrent_batches_insert_each_row_once() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("weather.db");
        let pool = crate::db::connect(db_path.to_str().unwrap()).await.unwrap();
        ensure_schema(&pool).await.unwrap();

        let batch: Vec<NewWeatherSample> = (0..48)
            .map(|i| {
                sample(
                    &format!("2024-05-{:02}T{:02}:00", 1 + i / 24, i % 24),
                    i as f64,
                    "Berlin",
                )
            })
            .collect();
        let overlapping: Vec<NewWeatherSample> = batch[24..]
            .iter()
            .cloned()
            .chain((0..24).map(|h| sample(&format!("2024-05-03T{:02}:00", h), 0.0, "Berlin")))
            .collect();

        let (a, b, c) = tokio::join!(
            upsert_batch(&pool, &batch),
            upsert_batch(&pool, &batch),
            upsert_batch(&pool, &overlapping),
        );
        let total = a.unwrap() + b.unwrap() + c.unwrap();

        assert_eq!(total, 72);
        assert_eq!(row_count(&pool).await, 72);
        pool.close().await;
    }
}
