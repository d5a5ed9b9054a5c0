//! Policy parameters for the continuous residence test.
//!
//! [`ResidenceProfile`] is the user configuration as the persistence layer
//! stores it. [`ResidencePolicy`] is what the engine actually consumes: the
//! qualifying period anchor, the first-entry date and the absence ceiling.

use std::fmt;

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{ResidenceError, Result};
use crate::trip::iso_date;

/// Regulatory ceiling on days outside the UK in any rolling 12 months.
pub const DEFAULT_MAX_ABSENCE_DAYS: i64 = 180;

/// Length of the qualifying period in calendar years.
pub const QUALIFYING_PERIOD_YEARS: u32 = 5;

/// Safety margin a user subtracts from the absence ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Buffer {
    #[default]
    NoBuffer,
    Little,
    Cautious,
    Safe,
}

impl Buffer {
    pub const ALL: [Buffer; 4] = [Self::NoBuffer, Self::Little, Self::Cautious, Self::Safe];

    pub const fn days(self) -> u32 {
        match self {
            Self::NoBuffer => 0,
            Self::Little => 7,
            Self::Cautious => 14,
            Self::Safe => 30,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::NoBuffer => "No Buffer",
            Self::Little => "Little",
            Self::Cautious => "Cautious",
            Self::Safe => "Safe",
        }
    }
}

impl TryFrom<u32> for Buffer {
    type Error = ResidenceError;

    fn try_from(days: u32) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|b| b.days() == days)
            .ok_or(ResidenceError::InvalidBuffer(days))
    }
}

impl From<Buffer> for u32 {
    fn from(buffer: Buffer) -> Self {
        buffer.days()
    }
}

impl fmt::Display for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} days)", self.label(), self.days())
    }
}

/// A user's settlement configuration as stored alongside their profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResidenceProfile {
    #[serde(rename = "visaApprovalDate", with = "iso_date")]
    pub visa_approval_date: NaiveDate,
    #[serde(rename = "firstEntryToUK", with = "iso_date")]
    pub first_entry_to_uk: NaiveDate,
    #[serde(default)]
    pub buffer: Buffer,
}

/// Inputs to the absence window engine other than the trips themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResidencePolicy {
    /// Start of the qualifying period (normally the visa approval date).
    pub visa_start_date: NaiveDate,
    /// First physical arrival; days before it count as absence.
    pub first_entry_date: NaiveDate,
    pub max_absence_days: i64,
    pub buffer_days: i64,
}

impl ResidencePolicy {
    /// Policy with the 180-day ceiling and no buffer.
    pub fn new(visa_start_date: NaiveDate, first_entry_date: NaiveDate) -> Self {
        Self {
            visa_start_date,
            first_entry_date,
            max_absence_days: DEFAULT_MAX_ABSENCE_DAYS,
            buffer_days: 0,
        }
    }

    pub fn with_buffer(self, buffer: Buffer) -> Self {
        self.with_buffer_days(i64::from(buffer.days()))
    }

    pub fn with_buffer_days(mut self, buffer_days: i64) -> Self {
        self.buffer_days = buffer_days;
        self
    }

    pub fn with_max_absence_days(mut self, max_absence_days: i64) -> Self {
        self.max_absence_days = max_absence_days;
        self
    }

    /// The ceiling every window is tested against: `max_absence_days - buffer_days`.
    pub fn adjusted_max_absence(&self) -> i64 {
        self.max_absence_days - self.buffer_days
    }

    /// Last day of the qualifying period, exactly five years after its start.
    ///
    /// # Errors
    /// Returns `ResidenceError::DateOutOfRange` if the result is not representable.
    pub fn qualifying_period_end(&self) -> Result<NaiveDate> {
        self.visa_start_date
            .checked_add_months(Months::new(QUALIFYING_PERIOD_YEARS * 12))
            .ok_or(ResidenceError::DateOutOfRange(self.visa_start_date))
    }

    /// First day of the trailing 12-month window that ends on `anchor`,
    /// never earlier than the start of the qualifying period.
    ///
    /// # Errors
    /// Returns `ResidenceError::DateOutOfRange` if the year before `anchor`
    /// is not representable.
    pub fn window_start(&self, anchor: NaiveDate) -> Result<NaiveDate> {
        Ok(one_year_before(anchor)?.max(self.visa_start_date))
    }

    /// Days between the visa start and first entry, as an inclusive range.
    ///
    /// `None` when the user arrived on (or, through a data-entry error,
    /// before) the start of the qualifying period.
    pub fn pre_entry_gap(&self) -> Option<(NaiveDate, NaiveDate)> {
        let last_absent_day = self.first_entry_date.pred_opt()?;
        (self.visa_start_date <= last_absent_day).then_some((self.visa_start_date, last_absent_day))
    }
}

impl From<&ResidenceProfile> for ResidencePolicy {
    fn from(profile: &ResidenceProfile) -> Self {
        Self::new(profile.visa_approval_date, profile.first_entry_to_uk).with_buffer(profile.buffer)
    }
}

/// Same month and day one year earlier; 29 February rolls over to 1 March.
pub fn one_year_before(day: NaiveDate) -> Result<NaiveDate> {
    let year = day.year() - 1;
    day.with_year(year)
        .or_else(|| NaiveDate::from_ymd_opt(year, 3, 1))
        .ok_or(ResidenceError::DateOutOfRange(day))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn qualifying_period_is_five_calendar_years() {
        let policy = ResidencePolicy::new(date(2020, 1, 1), date(2020, 1, 1));
        assert_eq!(policy.qualifying_period_end().unwrap(), date(2025, 1, 1));

        let leap = ResidencePolicy::new(date(2020, 2, 29), date(2020, 2, 29));
        assert_eq!(leap.qualifying_period_end().unwrap(), date(2025, 2, 28));
    }

    #[test]
    fn leap_day_window_rolls_over_to_march() {
        assert_eq!(one_year_before(date(2024, 2, 29)).unwrap(), date(2023, 3, 1));
        assert_eq!(one_year_before(date(2024, 3, 15)).unwrap(), date(2023, 3, 15));
    }

    #[test]
    fn window_start_is_clamped_to_visa_start() {
        let policy = ResidencePolicy::new(date(2020, 1, 1), date(2020, 1, 1));
        assert_eq!(policy.window_start(date(2020, 6, 1)).unwrap(), date(2020, 1, 1));
        assert_eq!(policy.window_start(date(2021, 6, 1)).unwrap(), date(2020, 6, 1));
    }

    #[test]
    fn pre_entry_gap_is_half_open() {
        let policy = ResidencePolicy::new(date(2020, 1, 1), date(2020, 1, 11));
        assert_eq!(policy.pre_entry_gap(), Some((date(2020, 1, 1), date(2020, 1, 10))));

        let same_day = ResidencePolicy::new(date(2020, 1, 1), date(2020, 1, 1));
        assert_eq!(same_day.pre_entry_gap(), None);

        let entered_early = ResidencePolicy::new(date(2020, 1, 1), date(2019, 12, 1));
        assert_eq!(entered_early.pre_entry_gap(), None);
    }

    #[test]
    fn buffer_round_trips_through_day_counts() {
        assert_eq!(Buffer::try_from(30).unwrap(), Buffer::Safe);
        assert_eq!(Buffer::try_from(5), Err(ResidenceError::InvalidBuffer(5)));
        assert_eq!(Buffer::Cautious.to_string(), "Cautious (14 days)");
    }

    #[test]
    fn profile_converts_to_policy_with_buffer() {
        let profile: ResidenceProfile = serde_json::from_str(
            r#"{"visaApprovalDate":"2022-03-01","firstEntryToUK":"2022-04-15","buffer":14}"#,
        )
        .unwrap();
        let policy = ResidencePolicy::from(&profile);
        assert_eq!(policy.buffer_days, 14);
        assert_eq!(policy.adjusted_max_absence(), 166);
        assert_eq!(policy.first_entry_date, date(2022, 4, 15));
    }

    #[test]
    fn profile_rejects_unknown_buffer() {
        let err = serde_json::from_str::<ResidenceProfile>(
            r#"{"visaApprovalDate":"2022-03-01","firstEntryToUK":"2022-03-01","buffer":10}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Invalid buffer"));
    }
}
