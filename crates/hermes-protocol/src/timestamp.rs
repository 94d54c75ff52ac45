//! The three wire timestamp formats.
//!
//! | Format | Example |
//! |---|---|
//! | date-time | `2024-01-01T00:00:00Z`, `2024-01-01T00:00:00.25Z` |
//! | http-date | `Mon, 01 Jan 2024 00:00:00 GMT` |
//! | epoch-seconds | `1704067200`, `1704067200.25` |
//!
//! Fractional seconds are written with millisecond precision and only when
//! non-zero. http-date carries whole seconds.

use chrono::{DateTime, NaiveDateTime, Utc};
use hermes_core::TimestampFormat;
use thiserror::Error;

const HTTP_DATE: &str = "%a, %d %b %Y %H:%M:%S GMT";
const HTTP_DATE_PARSE: &str = "%a, %d %b %Y %H:%M:%S%.f GMT";

/// A timestamp could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {format} timestamp `{input}`")]
pub struct TimestampError {
    /// The rejected text.
    pub input: String,
    /// The expected format.
    pub format: TimestampFormat,
}

/// Formats a timestamp.
///
/// # Example
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use hermes_core::TimestampFormat;
/// use hermes_protocol::timestamp::format_timestamp;
///
/// let instant = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
/// assert_eq!(format_timestamp(&instant, TimestampFormat::DateTime), "2024-01-01T00:00:00Z");
/// assert_eq!(format_timestamp(&instant, TimestampFormat::HttpDate), "Mon, 01 Jan 2024 00:00:00 GMT");
/// assert_eq!(format_timestamp(&instant, TimestampFormat::EpochSeconds), "1704067200");
/// ```
#[must_use]
pub fn format_timestamp(instant: &DateTime<Utc>, format: TimestampFormat) -> String {
    match format {
        TimestampFormat::DateTime => {
            let mut text = instant.format("%Y-%m-%dT%H:%M:%S").to_string();
            if let Some(fraction) = millis_fraction(instant.timestamp_subsec_millis()) {
                text.push('.');
                text.push_str(&fraction);
            }
            text.push('Z');
            text
        }
        TimestampFormat::HttpDate => instant.format(HTTP_DATE).to_string(),
        TimestampFormat::EpochSeconds => {
            let total = instant.timestamp_millis();
            let sign = if total < 0 { "-" } else { "" };
            let abs = total.unsigned_abs();
            let (secs, millis) = (abs / 1000, abs % 1000);
            match millis_fraction(millis as u32) {
                Some(fraction) => format!("{sign}{secs}.{fraction}"),
                None => format!("{sign}{secs}"),
            }
        }
    }
}

/// Parses a timestamp.
pub fn parse_timestamp(text: &str, format: TimestampFormat) -> Result<DateTime<Utc>, TimestampError> {
    let text = text.trim();
    let parsed = match format {
        TimestampFormat::DateTime => DateTime::parse_from_rfc3339(text)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        TimestampFormat::HttpDate => NaiveDateTime::parse_from_str(text, HTTP_DATE_PARSE)
            .map(|naive| naive.and_utc())
            .or_else(|_| DateTime::parse_from_rfc2822(text).map(|dt| dt.with_timezone(&Utc)))
            .ok(),
        TimestampFormat::EpochSeconds => text
            .parse::<f64>()
            .ok()
            .filter(|secs| secs.is_finite())
            .and_then(epoch_seconds),
    };
    parsed.ok_or_else(|| TimestampError {
        input: text.to_string(),
        format,
    })
}

/// Converts fractional epoch seconds, rounding to milliseconds.
pub(crate) fn epoch_seconds(secs: f64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis((secs * 1000.0).round() as i64)
}

fn millis_fraction(millis: u32) -> Option<String> {
    (millis != 0).then(|| format!("{millis:03}").trim_end_matches('0').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn new_year() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_round_trip_each_format() {
        let instant = new_year();
        for (format, text) in [
            (TimestampFormat::DateTime, "2024-01-01T00:00:00Z"),
            (TimestampFormat::HttpDate, "Mon, 01 Jan 2024 00:00:00 GMT"),
            (TimestampFormat::EpochSeconds, "1704067200"),
        ] {
            assert_eq!(format_timestamp(&instant, format), text);
            assert_eq!(parse_timestamp(text, format).unwrap(), instant);
        }
    }

    #[test]
    fn test_fraction_only_when_non_zero() {
        let instant = new_year() + chrono::Duration::milliseconds(250);
        assert_eq!(
            format_timestamp(&instant, TimestampFormat::DateTime),
            "2024-01-01T00:00:00.25Z"
        );
        assert_eq!(
            format_timestamp(&instant, TimestampFormat::EpochSeconds),
            "1704067200.25"
        );
        assert_eq!(
            parse_timestamp("1704067200.25", TimestampFormat::EpochSeconds).unwrap(),
            instant
        );
    }

    #[test]
    fn test_negative_epoch_fraction() {
        let instant = DateTime::from_timestamp_millis(-1500).unwrap();
        assert_eq!(format_timestamp(&instant, TimestampFormat::EpochSeconds), "-1.5");
        assert_eq!(
            parse_timestamp("-1.5", TimestampFormat::EpochSeconds).unwrap(),
            instant
        );
    }

    #[test]
    fn test_date_time_accepts_offsets() {
        let parsed = parse_timestamp("2024-01-01T02:00:00+02:00", TimestampFormat::DateTime).unwrap();
        assert_eq!(parsed, new_year());
    }

    #[test]
    fn test_rejects_malformed_text() {
        let err = parse_timestamp("yesterday", TimestampFormat::HttpDate).unwrap_err();
        assert_eq!(err.format, TimestampFormat::HttpDate);
        assert!(parse_timestamp("NaN", TimestampFormat::EpochSeconds).is_err());
        assert!(parse_timestamp("2024-13-01T00:00:00Z", TimestampFormat::DateTime).is_err());
    }

    proptest! {
        #[test]
        fn prop_millisecond_instants_round_trip(millis in 0_i64..4_102_444_800_000) {
            let instant = DateTime::from_timestamp_millis(millis).unwrap();
            for format in [TimestampFormat::DateTime, TimestampFormat::EpochSeconds] {
                let text = format_timestamp(&instant, format);
                prop_assert_eq!(parse_timestamp(&text, format).unwrap(), instant);
            }
        }
    }
}
