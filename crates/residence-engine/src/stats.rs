//! Running totals for the travel dashboard.
//!
//! These figures describe the qualifying period so far (up to `today`) rather
//! than rolling windows: how long since the visa started, how much of that
//! was spent abroad, and which trips are in progress or still to come.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ledger::{covered_days, DayRange};
use crate::policy::ResidencePolicy;
use crate::residence::absence_ranges;
use crate::trip::{inclusive_days, Trip};

/// Days covered by all trips, overlapping trips counted once.
pub fn total_days_abroad(trips: &[Trip]) -> i64 {
    covered_days(trips.iter().map(|t| (t.start_date, t.end_date)))
}

/// Length of the pre-entry gap `[visa start, first entry)`; never negative.
pub fn pre_entry_gap_days(policy: &ResidencePolicy) -> i64 {
    policy
        .pre_entry_gap()
        .map_or(0, |(start, end)| inclusive_days(start, end))
}

/// Days since first arrival, counting both the arrival day and `today`.
/// Zero before arrival.
pub fn days_since_arrival(policy: &ResidencePolicy, today: NaiveDate) -> i64 {
    if today < policy.first_entry_date {
        0
    } else {
        inclusive_days(policy.first_entry_date, today)
    }
}

/// The trip in progress on `today`, if any. The earliest-listed match wins.
pub fn current_trip(trips: &[Trip], today: NaiveDate) -> Option<&Trip> {
    trips.iter().find(|trip| trip.contains(today))
}

/// Trips that have not started yet, soonest first.
pub fn upcoming_trips(trips: &[Trip], today: NaiveDate) -> Vec<&Trip> {
    let mut upcoming: Vec<&Trip> = trips.iter().filter(|t| t.start_date > today).collect();
    upcoming.sort_by_key(|t| (t.start_date, t.end_date));
    upcoming
}

/// Dashboard summary of the qualifying period up to `today`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelStats {
    pub as_of: NaiveDate,
    /// Days from the visa start up to and including `today`.
    pub days_since_visa_start: i64,
    /// Absent days (trips and pre-entry gap) up to and including `today`.
    pub days_abroad: i64,
    /// `days_since_visa_start - days_abroad`.
    pub days_in_uk: i64,
    pub pre_entry_gap_days: i64,
    pub days_since_arrival: i64,
    /// All logged trip days, including ones still in the future.
    pub total_trip_days: i64,
    pub current_trip: Option<Trip>,
    pub upcoming_trip_count: usize,
}

impl TravelStats {
    pub fn compute(trips: &[Trip], policy: &ResidencePolicy, today: NaiveDate) -> Self {
        let elapsed: DayRange = (policy.visa_start_date, today);
        let days_since_visa_start = if today < policy.visa_start_date {
            0
        } else {
            inclusive_days(elapsed.0, elapsed.1)
        };

        let days_abroad = covered_days(
            absence_ranges(trips, policy)
                .into_iter()
                .filter(|(start, _)| *start <= today)
                .map(|(start, end)| (start.max(elapsed.0), end.min(elapsed.1))),
        );

        Self {
            as_of: today,
            days_since_visa_start,
            days_abroad,
            days_in_uk: days_since_visa_start - days_abroad,
            pre_entry_gap_days: pre_entry_gap_days(policy),
            days_since_arrival: days_since_arrival(policy, today),
            total_trip_days: total_days_abroad(trips),
            current_trip: current_trip(trips, today).cloned(),
            upcoming_trip_count: upcoming_trips(trips, today).len(),
        }
    }
}
