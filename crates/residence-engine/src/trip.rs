//! Trip records and the date-parsing boundary.
//!
//! A trip is an inclusive range of calendar days spent outside the UK. Dates
//! arrive from the persistence layer as ISO strings, either plain
//! `YYYY-MM-DD` or a full RFC 3339 timestamp; both are reduced to a
//! [`NaiveDate`] here so the rest of the engine only ever sees whole days.

use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ResidenceError, Result};

/// A single absence from the UK, inclusive of both boundary days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    #[serde(with = "iso_date")]
    pub start_date: NaiveDate,
    #[serde(with = "iso_date")]
    pub end_date: NaiveDate,
    /// Free-form label shown in listings (e.g., "Christmas in Lisbon").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Destination country, display only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl Trip {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date,
            title: None,
            country: None,
        }
    }

    /// Build a trip from two ISO date strings.
    ///
    /// # Errors
    /// Returns `ResidenceError::InvalidDate` if either string is unparsable.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Ok(Self::new(parse_date(start)?, parse_date(end)?))
    }

    /// A trip of `length_days` consecutive days beginning on `start_date`.
    ///
    /// # Errors
    /// Returns `ResidenceError::InvalidTripLength` for a zero length and
    /// `ResidenceError::DateOutOfRange` if the end date is not representable.
    pub fn spanning(start_date: NaiveDate, length_days: u32) -> Result<Self> {
        if length_days == 0 {
            return Err(ResidenceError::InvalidTripLength(length_days));
        }
        let end_date = start_date
            .checked_add_days(Days::new(u64::from(length_days - 1)))
            .ok_or(ResidenceError::DateOutOfRange(start_date))?;
        Ok(Self::new(start_date, end_date))
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    /// True when the end date precedes the start date.
    pub fn is_inverted(&self) -> bool {
        self.end_date < self.start_date
    }

    /// Number of days covered, counting both ends. Inverted trips cover none.
    pub fn days(&self) -> i64 {
        if self.is_inverted() {
            0
        } else {
            inclusive_days(self.start_date, self.end_date)
        }
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start_date <= day && day <= self.end_date
    }
}

/// Inclusive day count between two dates: `(end - start) + 1`.
pub fn inclusive_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

/// Parse an ISO 8601 date or datetime string into a calendar date.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps (reduced to their UTC date) and
/// naive `YYYY-MM-DDTHH:MM:SS` timestamps.
///
/// # Errors
/// Returns `ResidenceError::InvalidDate` if no format matches.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc).date_naive());
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .map(|ndt| ndt.date())
        .map_err(|e| ResidenceError::InvalidDate(format!("'{}': {}", s, e)))
}

/// Serde adapter that writes `YYYY-MM-DD` and reads anything [`parse_date`] accepts.
pub mod iso_date {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format("%Y-%m-%d"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_date(&raw).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parse_date_accepts_plain_and_timestamped_forms() {
        assert_eq!(parse_date("2023-01-07").unwrap(), date(2023, 1, 7));
        assert_eq!(
            parse_date("2023-01-07T00:00:00.000Z").unwrap(),
            date(2023, 1, 7)
        );
        assert_eq!(parse_date("2023-01-07T10:30:00").unwrap(), date(2023, 1, 7));
    }

    #[test]
    fn parse_date_rejects_garbage() {
        let err = parse_date("next tuesday").unwrap_err();
        assert!(matches!(err, ResidenceError::InvalidDate(_)));
    }

    #[test]
    fn week_long_trip_covers_seven_days() {
        let trip = Trip::parse("2023-01-01", "2023-01-07").unwrap();
        assert_eq!(trip.days(), 7);
    }

    #[test]
    fn inverted_trip_covers_nothing() {
        let trip = Trip::new(date(2023, 1, 7), date(2023, 1, 1));
        assert!(trip.is_inverted());
        assert_eq!(trip.days(), 0);
    }

    #[test]
    fn spanning_rejects_zero_length() {
        assert_eq!(
            Trip::spanning(date(2023, 1, 1), 0),
            Err(ResidenceError::InvalidTripLength(0))
        );
        let trip = Trip::spanning(date(2023, 1, 1), 14).unwrap();
        assert_eq!(trip.end_date, date(2023, 1, 14));
    }

    #[test]
    fn trip_json_uses_camel_case_and_iso_dates() {
        let trip: Trip = serde_json::from_str(
            r#"{"startDate":"2023-06-01T00:00:00.000Z","endDate":"2023-06-30","country":"France"}"#,
        )
        .unwrap();
        assert_eq!(trip.start_date, date(2023, 6, 1));
        assert_eq!(trip.country.as_deref(), Some("France"));

        let json = serde_json::to_string(&Trip::new(date(2023, 6, 1), date(2023, 6, 30))).unwrap();
        assert_eq!(json, r#"{"startDate":"2023-06-01","endDate":"2023-06-30"}"#);
    }
}
