//! Utility functions for timing and formatting
use time::{format_description, OffsetDateTime};

/// Format a timestamp for human-readable logging
///
/// Converts an OffsetDateTime to DD.MM.YYYY - HH:MM:SS format
/// Falls back to default string representation if formatting fails.
pub fn format_datetime(dt: &OffsetDateTime) -> String {
    format_description::parse("[day].[month].[year] - [hour]:[minute]:[second]")
        .ok()
        .and_then(|format| dt.format(&format).ok())
        .unwrap_or_else(|| dt.to_string())
}

/// Convert a time::Duration to seconds as u64, negative durations become 0
pub fn duration_to_seconds(duration: time::Duration) -> u64 {
    duration.whole_seconds().max(0) as u64
}

/// Format an optional value for the packet summary
pub fn format_optional(value: Option<f64>, decimals: usize, unit: &str) -> String {
    match value {
        Some(v) => format!("{:.*} {}", decimals, v, unit),
        None => "n/a".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn formats_datetime() {
        let dt = datetime!(2015-08-03 07:05:09 UTC);
        assert_eq!(format_datetime(&dt), "03.08.2015 - 07:05:09");
    }

    #[test]
    fn negative_durations_clamp_to_zero() {
        assert_eq!(duration_to_seconds(time::Duration::seconds(-5)), 0);
        assert_eq!(duration_to_seconds(time::Duration::milliseconds(61_900)), 61);
    }

    #[test]
    fn formats_optional_values() {
        assert_eq!(format_optional(Some(1013.26), 1, "hPa"), "1013.3 hPa");
        assert_eq!(format_optional(None, 1, "hPa"), "n/a");
    }
}
