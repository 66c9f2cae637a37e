use std::path::PathBuf;
use std::time::Duration;

/// Default SQLite database location when `DB_PATH` is unset.
pub const DEFAULT_DB_PATH: &str = "/app/data/weather.db";
/// Default Open-Meteo forecast endpoint.
pub const DEFAULT_OPEN_METEO_URL: &str = "https://api.open-meteo.com/v1/forecast";
/// Default upper bound on a single provider request.
const DEFAULT_FORECAST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got '{value}'")]
    InvalidValue {
        name: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("Failed to read locations file {path}: {source}")]
    LocationsRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid locations table: {0}")]
    LocationsInvalid(String),
}

/// Log output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Application configuration, parsed from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// SQLite database file.
    pub db_path: String,
    pub port: u16,
    /// Forecast endpoint queried on every sync.
    pub open_meteo_url: String,
    pub forecast_timeout: Duration,
    /// Optional JSON file overriding the embedded coordinate table.
    pub locations_file: Option<PathBuf>,
    pub log_format: LogFormat,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from an arbitrary variable source. Empty values count as unset.
    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let port = match var("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                name: "PORT",
                expected: "a valid u16",
                value: raw,
            })?,
            None => 8080,
        };

        let timeout_secs = match var("FORECAST_TIMEOUT_SECS") {
            Some(raw) => {
                let parsed = raw.trim().parse::<u64>();
                match parsed {
                    Ok(secs) if secs > 0 => secs,
                    _ => {
                        return Err(ConfigError::InvalidValue {
                            name: "FORECAST_TIMEOUT_SECS",
                            expected: "a positive number of seconds",
                            value: raw,
                        })
                    }
                }
            }
            None => DEFAULT_FORECAST_TIMEOUT_SECS,
        };

        let log_format = match var("LOG_FORMAT").as_deref().map(str::trim) {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    name: "LOG_FORMAT",
                    expected: "'text' or 'json'",
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            db_path: var("DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
            port,
            open_meteo_url: var("OPEN_METEO_URL")
                .unwrap_or_else(|| DEFAULT_OPEN_METEO_URL.to_string()),
            forecast_timeout: Duration::from_secs(timeout_secs),
            locations_file: var("LOCATIONS_FILE").map(PathBuf::from),
            log_format,
        })
    }
}
