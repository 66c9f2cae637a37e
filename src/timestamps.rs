//! Naive local timestamps as Open-Meteo returns them and as they are stored.

use chrono::NaiveDateTime;

/// Accepted shapes of a stored or fetched `timestamp`.
const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"];

/// Parse a naive ISO-8601 local datetime. No timezone is attached.
pub fn parse_local_timestamp(s: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_parse_local_timestamp_formats() {
        assert!(parse_local_timestamp("2024-01-01T06:00").is_some());
        assert!(parse_local_timestamp("2024-01-01T06:00:00").is_some());
        assert!(parse_local_timestamp("2024-01-01").is_none());
        assert!(parse_local_timestamp("2024-01-01T06:00Z").is_none());
    }

    #[test]
    fn test_parse_keeps_local_hour() {
        let dt = parse_local_timestamp("2024-03-31T02:00").unwrap();
        assert_eq!(dt.hour(), 2);
    }
}
