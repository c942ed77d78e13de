use crate::error::{InspectError, Result};
use crate::model::DateRange;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use std::time::{Duration, SystemTime};

const MILLIS_PER_MINUTE: i64 = 60 * 1000;

/// Converts an API timestamp (`2018-03-01T10:15:30.123Z`) into epoch milliseconds.
pub fn timestamp_millis(input: &str) -> Result<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.timestamp_millis());
    }
    // Some exports drop the zone designator; those are UTC.
    if let Ok(naive) = NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(Utc.from_utc_datetime(&naive).timestamp_millis());
    }
    Err(InspectError::InvalidDate(format!("Unrecognised timestamp '{input}'")))
}

pub fn millis_to_datetime(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(millis)
}

/// Parses an increment size into milliseconds.
///
/// Accepts `days:hours:minutes` (`1:0:0`, `0:6:30`) or any humantime
/// duration (`6h`, `2days 12h`). The result is always positive.
pub fn parse_increment_size(input: &str) -> Result<i64> {
    let input = input.trim();
    let millis = if input.contains(':') {
        let parts: Vec<&str> = input.split(':').collect();
        if parts.len() != 3 {
            return Err(InspectError::InvalidIncrement(format!(
                "expected 'days:hours:minutes', got '{input}'"
            )));
        }
        let mut fields = [0i64; 3];
        for (slot, part) in fields.iter_mut().zip(&parts) {
            *slot = part.trim().parse::<i64>().map_err(|_| {
                InspectError::InvalidIncrement(format!("'{part}' in '{input}' is not a whole number"))
            })?;
            if *slot < 0 {
                return Err(InspectError::InvalidIncrement(format!(
                    "negative field in '{input}'"
                )));
            }
        }
        let [days, hours, minutes] = fields;
        ((days * 24 + hours) * 60 + minutes) * MILLIS_PER_MINUTE
    } else {
        let duration = humantime::parse_duration(input)
            .map_err(|e| InspectError::InvalidIncrement(format!("'{input}': {e}")))?;
        i64::try_from(duration.as_millis())
            .map_err(|_| InspectError::InvalidIncrement(format!("'{input}' is too large")))?
    };

    if millis <= 0 {
        return Err(InspectError::InvalidIncrement(format!(
            "'{input}' must be longer than zero"
        )));
    }
    Ok(millis)
}

/// Floors `creation_millis` onto the increment grid.
pub fn timeline_start(creation_millis: i64, increment_size: i64) -> i64 {
    creation_millis.div_euclid(increment_size) * increment_size
}

pub fn resolve_range(since: Option<&str>, until: Option<&str>) -> Result<DateRange> {
    let mut range = DateRange::new();

    let since_dt = since.map(parse_date).transpose()?;
    let until_dt = until.map(parse_date).transpose()?;

    if let (Some(s), Some(u)) = (since_dt, until_dt) {
        if s > u {
            return Err(InspectError::InvalidDate(format!(
                "Invalid range: since ({}) is after until ({})",
                s, u
            )));
        }
    }

    if let Some(s) = since_dt {
        range = range.with_since(s);
    }
    if let Some(u) = until_dt {
        range = range.with_until(u);
    }

    Ok(range)
}

pub fn parse_date(input: &str) -> Result<DateTime<Utc>> {
    // RFC3339
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }

    // YYYY-MM-DD
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        if let Some(datetime) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&datetime));
        }
    }

    // Relative ("2 weeks ago", "90d")
    let duration = parse_natural_duration(input)
        .or_else(|| humantime::parse_duration(input.trim()).ok())
        .ok_or_else(|| InspectError::InvalidDate(format!("Unrecognised date '{input}'")))?;
    let target = SystemTime::now()
        .checked_sub(duration)
        .ok_or_else(|| InspectError::InvalidDate(format!("Duration overflow for '{input}'")))?;
    Ok(DateTime::<Utc>::from(target))
}

fn parse_natural_duration(input: &str) -> Option<Duration> {
    let input = input.trim().to_lowercase();

    if let Some(days) = input.strip_suffix(" days ago") {
        if let Ok(n) = days.trim().parse::<u64>() {
            return Some(Duration::from_secs(n * 86400));
        }
    }

    if let Some(weeks) = input.strip_suffix(" weeks ago") {
        if let Ok(n) = weeks.trim().parse::<u64>() {
            return Some(Duration::from_secs(n * 7 * 86400));
        }
    }

    if let Some(months) = input.strip_suffix(" months ago") {
        if let Ok(n) = months.trim().parse::<u64>() {
            return Some(Duration::from_secs(n * 30 * 86400));
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_colon_increment() {
        assert_eq!(parse_increment_size("1:0:0").unwrap(), 86_400_000);
        assert_eq!(parse_increment_size("0:1:30").unwrap(), 5_400_000);
    }

    #[test]
    fn parses_humantime_increment() {
        assert_eq!(parse_increment_size("6h").unwrap(), 6 * 3_600_000);
    }

    #[test]
    fn rejects_zero_and_malformed_increments() {
        assert!(parse_increment_size("0:0:0").is_err());
        assert!(parse_increment_size("1:2").is_err());
        assert!(parse_increment_size("a:b:c").is_err());
        assert!(parse_increment_size("0:-1:0").is_err());
    }

    #[test]
    fn parses_api_timestamps() {
        assert_eq!(timestamp_millis("1970-01-01T00:00:01.500Z").unwrap(), 1500);
        assert_eq!(timestamp_millis("1970-01-01T00:01:00").unwrap(), 60_000);
        assert!(timestamp_millis("yesterday").is_err());
    }

    #[test]
    fn timeline_start_floors_to_grid() {
        assert_eq!(timeline_start(2_500, 1_000), 2_000);
        assert_eq!(timeline_start(3_000, 1_000), 3_000);
        assert_eq!(timeline_start(-1, 1_000), -1_000);
    }

    #[test]
    fn resolve_range_rejects_inverted_bounds() {
        assert!(resolve_range(Some("2024-02-01"), Some("2024-01-01")).is_err());
        let range = resolve_range(Some("2024-01-01"), None).unwrap();
        assert!(range.since.is_some());
        assert!(range.until.is_none());
    }

    #[test]
    fn natural_durations() {
        assert_eq!(
            parse_natural_duration("2 weeks ago"),
            Some(Duration::from_secs(14 * 86400))
        );
        assert!(parse_date("3 days ago").is_ok());
    }
}
