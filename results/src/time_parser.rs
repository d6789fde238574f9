use chrono::DateTime as ChronoDateTime;
use speedate::{Date as SpeedateDate, DateTime as SpeedateDateTime};

#[derive(Debug, Copy, Clone)]
enum DateType {
    DateTime,
    NaiveDate,
    Rfc3339,
}

/// Turns the timestamps found in results files into microseconds since the epoch.
///
/// A single file uses one timestamp style throughout, so the first style that
/// parses is tried first for every later value.
#[derive(Debug, Clone, Default)]
pub struct TimestampParser {
    date_type: Option<DateType>,
}

impl TimestampParser {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn parse_micros<T: AsRef<str>>(&mut self, date_str: T) -> Option<i64> {
        let date_str = date_str.as_ref().trim();

        if let Some(cached) = self.date_type {
            if let Some(micros) = Self::parse_as(cached, date_str) {
                return Some(micros);
            }
        }

        [DateType::DateTime, DateType::Rfc3339, DateType::NaiveDate]
            .into_iter()
            .find_map(|date_type| {
                Self::parse_as(date_type, date_str).map(|micros| {
                    self.date_type = Some(date_type);
                    micros
                })
            })
    }

    /// Milliseconds between two timestamps, or `None` when either one is unreadable
    /// or the end precedes the start.
    pub fn elapsed_millis<S: AsRef<str>, E: AsRef<str>>(&mut self, start: S, end: E) -> Option<f64> {
        let start = self.parse_micros(start)?;
        let end = self.parse_micros(end)?;
        (end >= start).then(|| (end - start) as f64 / 1_000.0)
    }

    fn parse_as(date_type: DateType, date_str: &str) -> Option<i64> {
        match date_type {
            DateType::DateTime => SpeedateDateTime::parse_str(date_str).ok().map(|dt| {
                let offset = i64::from(dt.time.tz_offset.unwrap_or_default());
                (dt.timestamp() - offset) * 1_000_000 + i64::from(dt.time.microsecond)
            }),
            DateType::NaiveDate => SpeedateDate::parse_str(date_str)
                .ok()
                .map(|d| d.timestamp() * 1_000_000),
            // Seven-digit fractions (.NET round-trip format) land here
            DateType::Rfc3339 => ChronoDateTime::parse_from_rfc3339(date_str)
                .ok()
                .map(|dt| dt.timestamp_micros()),
        }
    }
}

/// Parses a seconds value such as `0.125` (or `0,125` from comma-decimal locales)
/// into milliseconds.
pub fn seconds_to_millis<T: AsRef<str>>(seconds: T) -> Option<f64> {
    let seconds = seconds.as_ref().trim().replace(',', ".");
    seconds
        .parse::<f64>()
        .ok()
        .filter(|s| s.is_finite() && *s >= 0.0)
        .map(|s| s * 1_000.0)
}

pub fn millis<T: AsRef<str>>(millis: T) -> Option<f64> {
    millis
        .as_ref()
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|ms| ms.is_finite() && *ms >= 0.0)
}

/// Parses a .NET `TimeSpan` string, `[d.]hh:mm:ss[.fffffff]`, into milliseconds.
pub fn timespan_to_millis<T: AsRef<str>>(timespan: T) -> Option<f64> {
    let mut parts = timespan.as_ref().trim().split(':');
    let (days_hours, minutes, seconds) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let (days, hours) = match days_hours.split_once('.') {
        Some((days, hours)) => (days.parse::<u64>().ok()?, hours.parse::<u64>().ok()?),
        None => (0, days_hours.parse::<u64>().ok()?),
    };
    let minutes = minutes.parse::<u64>().ok()?;
    let seconds = seconds.parse::<f64>().ok().filter(|s| s.is_finite() && *s >= 0.0)?;

    let whole_seconds = days
        .checked_mul(24)
        .and_then(|h| h.checked_add(hours))
        .and_then(|h| h.checked_mul(60))
        .and_then(|m| m.checked_add(minutes))
        .and_then(|m| m.checked_mul(60))?;
    Some((whole_seconds as f64 + seconds) * 1_000.0)
}
