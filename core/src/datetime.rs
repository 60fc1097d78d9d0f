use chrono::{DateTime, Duration, LocalResult, NaiveDateTime, TimeZone};
use thiserror::Error;

/// Format used by date-time input fields: local wall time, minute precision.
pub const INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M";

const INPUT_FORMAT_SECONDS: &str = "%Y-%m-%dT%H:%M:%S";
const ISO_WITH_OFFSET: &str = "%Y-%m-%dT%H:%M:%S%:z";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DateTimeError {
    #[error("invalid date-time '{0}', expected YYYY-MM-DDTHH:MM")]
    Invalid(String),
    #[error("date-time '{0}' does not exist in the local time zone")]
    Nonexistent(String),
}

/// Format an instant as a zone-naive input value in its own zone.
pub fn to_input_value<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format(INPUT_FORMAT).to_string()
}

/// Pre-fill values for the calendar form: `(now, now + 1h)`.
pub fn default_event_window<Tz: TimeZone>(now: &DateTime<Tz>) -> (String, String)
where
    Tz::Offset: std::fmt::Display,
{
    let end = now.clone() + Duration::hours(1);
    (to_input_value(now), to_input_value(&end))
}

/// Convert a zone-naive input value to ISO-8601 with the explicit numeric offset
/// the given zone has at that instant, e.g. `2024-06-01T10:00` at UTC-5 becomes
/// `2024-06-01T10:00:00-05:00`.
///
/// Ambiguous wall times (DST fall-back) resolve to the earlier instant.
pub fn local_to_iso<Tz: TimeZone>(value: &str, zone: &Tz) -> Result<String, DateTimeError>
where
    Tz::Offset: std::fmt::Display,
{
    let value = value.trim();
    let naive = NaiveDateTime::parse_from_str(value, INPUT_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(value, INPUT_FORMAT_SECONDS))
        .map_err(|_| DateTimeError::Invalid(value.to_string()))?;

    let local = match zone.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => return Err(DateTimeError::Nonexistent(value.to_string())),
    };
    Ok(local.format(ISO_WITH_OFFSET).to_string())
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, NaiveDate, Utc};

    use super::*;

    fn utc_minus_5() -> FixedOffset {
        FixedOffset::west_opt(5 * 3600).unwrap()
    }

    #[test]
    fn converts_local_input_with_negative_offset() {
        assert_eq!(
            local_to_iso("2024-06-01T10:00", &utc_minus_5()).unwrap(),
            "2024-06-01T10:00:00-05:00"
        );
    }

    #[test]
    fn converts_with_positive_and_half_hour_offsets() {
        let ist = FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap();
        assert_eq!(
            local_to_iso("2024-12-31T23:59", &ist).unwrap(),
            "2024-12-31T23:59:00+05:30"
        );
        assert_eq!(
            local_to_iso("2024-01-01T00:00", &Utc).unwrap(),
            "2024-01-01T00:00:00+00:00"
        );
    }

    #[test]
    fn accepts_seconds_and_surrounding_whitespace() {
        assert_eq!(
            local_to_iso(" 2024-06-01T10:00:30 ", &utc_minus_5()).unwrap(),
            "2024-06-01T10:00:30-05:00"
        );
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(
            local_to_iso("tomorrow", &Utc),
            Err(DateTimeError::Invalid("tomorrow".into()))
        );
        assert!(local_to_iso("2024-13-01T10:00", &Utc).is_err());
    }

    #[test]
    fn wall_time_skipped_by_dst_is_rejected() {
        assert_eq!(
            local_to_iso("2024-03-10T02:30", &chrono_tz::America::New_York),
            Err(DateTimeError::Nonexistent("2024-03-10T02:30".into()))
        );
    }

    #[test]
    fn repeated_wall_time_takes_the_earlier_instant() {
        assert_eq!(
            local_to_iso("2024-11-03T01:30", &chrono_tz::America::New_York).unwrap(),
            "2024-11-03T01:30:00-04:00"
        );
        assert_eq!(
            local_to_iso("2024-11-03T03:30", &chrono_tz::America::New_York).unwrap(),
            "2024-11-03T03:30:00-05:00"
        );
    }

    #[test]
    fn prefill_spans_one_hour() {
        let now = utc_minus_5()
            .from_local_datetime(
                &NaiveDate::from_ymd_opt(2024, 6, 1)
                    .unwrap()
                    .and_hms_opt(23, 30, 45)
                    .unwrap(),
            )
            .unwrap();
        let (start, end) = default_event_window(&now);
        assert_eq!(start, "2024-06-01T23:30");
        assert_eq!(end, "2024-06-02T00:30");
    }
}
