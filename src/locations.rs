//! Coordinate → location name resolution.
//!
//! The known-location table is configuration data: `data/locations.json` is
//! embedded as the default and can be replaced at startup via `LOCATIONS_FILE`.
//! Coordinates are compared after rounding to 2 decimal places; unknown
//! coordinates resolve to a `"{lat:.2},{lon:.2}"` identifier.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::config::ConfigError;

const DEFAULT_LOCATIONS_JSON: &str = include_str!("../data/locations.json");

/// One row of the locations file.
#[derive(Debug, Deserialize)]
struct LocationEntry {
    name: String,
    latitude: f64,
    longitude: f64,
}

/// One coordinate rendered to 2 decimal places. The decimal renderer rounds
/// the exact binary value with ties to even, so `52.525` (stored as
/// 52.52499...) becomes `"52.52"`. Negative zero folds into `"0.00"`.
fn two_decimals(v: f64) -> String {
    let text = format!("{:.2}", v);
    if text == "-0.00" {
        "0.00".to_string()
    } else {
        text
    }
}

/// Lookup key: both coordinates as 2-decimal text, the same rendering the
/// fallback name uses.
fn grid_key(latitude: f64, longitude: f64) -> String {
    format!("{},{}", two_decimals(latitude), two_decimals(longitude))
}

/// Immutable lookup table of known coordinates.
#[derive(Debug, Clone)]
pub struct LocationTable {
    names: HashMap<String, String>,
}

impl LocationTable {
    /// The built-in table shipped with the service.
    pub fn embedded() -> Result<Self, ConfigError> {
        Self::from_json(DEFAULT_LOCATIONS_JSON)
    }

    /// Load the table from a JSON file (array of `{name, latitude, longitude}`).
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::LocationsRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    /// Load from `path` when given, otherwise fall back to the embedded table.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::from_file(p),
            None => Self::embedded(),
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let entries: Vec<LocationEntry> = serde_json::from_str(raw)
            .map_err(|e| ConfigError::LocationsInvalid(e.to_string()))?;

        let mut names = HashMap::with_capacity(entries.len());
        for entry in entries {
            if !entry.latitude.is_finite() || !entry.longitude.is_finite() {
                return Err(ConfigError::LocationsInvalid(format!(
                    "non-finite coordinates for '{}'",
                    entry.name
                )));
            }
            let key = grid_key(entry.latitude, entry.longitude);
            if let Some(existing) = names.insert(key, entry.name.clone()) {
                return Err(ConfigError::LocationsInvalid(format!(
                    "'{}' and '{}' share coordinates {:.2},{:.2}",
                    existing, entry.name, entry.latitude, entry.longitude
                )));
            }
        }

        Ok(Self { names })
    }

    /// Resolve coordinates to a display name. Never fails.
    pub fn resolve(&self, latitude: f64, longitude: f64) -> String {
        self.names
            .get(&grid_key(latitude, longitude))
            .cloned()
            .unwrap_or_else(|| format!("{:.2},{:.2}", latitude, longitude))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
