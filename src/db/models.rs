use sqlx::FromRow;

/// A sample ready to be written. `created_at` is assigned by the database.
#[derive(Debug, Clone, PartialEq)]
pub struct NewWeatherSample {
    /// Naive local ISO-8601 timestamp exactly as returned by the provider.
    pub timestamp: String,
    pub temperature: f64,
    pub location_name: String,
}

/// A stored hourly sample for a single location, as read by the range scan.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct StoredSample {
    pub timestamp: String,
    pub temperature: f64,
}

/// A stored sample together with its location, as read by the latest-N scan.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct LocatedSample {
    pub timestamp: String,
    pub temperature: f64,
    #[sqlx(rename = "city_name")]
    pub location_name: String,
}

/// Summary counters over the whole store, reported by `/health`.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct StoreStats {
    pub sample_count: i64,
    pub location_count: i64,
    /// Newest forecast hour stored, if any.
    pub latest_timestamp: Option<String>,
    /// When the most recent row was written.
    pub last_ingested_at: Option<String>,
}
