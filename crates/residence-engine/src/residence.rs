//! Continuous residence check over the five-year qualifying period.
//!
//! Every day of the qualifying period anchors a trailing 12-month window.
//! Absence inside a window is the union of the pre-entry gap and all trips;
//! the first window whose absence exceeds the adjusted ceiling fails the
//! check. When the whole period passes, the engine also searches for the
//! earliest date a short reference trip could start without breaking the
//! ceiling.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{ResidenceError, Result};
use crate::ledger::{add_days, AbsenceLedger, DayRange};
use crate::policy::ResidencePolicy;
use crate::trip::Trip;

/// Furthest ahead, in days, that [`find_next_possible_trip_date`] looks.
pub const SEARCH_HORIZON_DAYS: u64 = 730;

/// Reference trip lengths reported in [`NextPossibleTrips`].
pub const SHORT_TRIP_DAYS: u32 = 7;
pub const LONG_TRIP_DAYS: u32 = 14;

/// A trailing window and the absence counted inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbsencePeriod {
    pub days: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Earliest start dates for the two reference trip lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextPossibleTrips {
    pub seven_day_trip: Option<NaiveDate>,
    pub fourteen_day_trip: Option<NaiveDate>,
}

/// Outcome of [`check_continuous_residence`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResidenceCheckResult {
    pub is_valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    /// The violating window when invalid, otherwise the worst window seen.
    pub max_absence_period: AbsencePeriod,
    pub qualifying_period_end: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_possible_trips: Option<NextPossibleTrips>,
}

/// The first window found over the ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Violation {
    pub period: AbsencePeriod,
    pub adjusted_max_absence: i64,
    pub max_absence_days: i64,
    pub buffer_days: i64,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Exceeded maximum allowed absence: {} days outside UK from {} to {} \
             (maximum: {} days, i.e. the {}-day limit with {} days safety buffer)",
            self.period.days,
            self.period.start_date,
            self.period.end_date,
            self.adjusted_max_absence,
            self.max_absence_days,
            self.buffer_days,
        )
    }
}

/// Check whether `trips` keep every rolling 12-month window of the
/// qualifying period within the policy's adjusted ceiling.
///
/// `proposed_trip`, when given, is counted as if it had already been taken;
/// the caller's trip list is not modified. `today` is the earliest point the
/// next-trip search may start from.
///
/// The scan stops at the first violating window (earliest anchor day). On
/// success the result carries the worst window seen and the next possible
/// start dates for a 7-day and a 14-day trip.
///
/// # Errors
/// Returns `ResidenceError::DateOutOfRange` if the qualifying period or any
/// window cannot be represented as calendar dates.
pub fn check_continuous_residence(
    trips: &[Trip],
    policy: &ResidencePolicy,
    proposed_trip: Option<&Trip>,
    today: NaiveDate,
) -> Result<ResidenceCheckResult> {
    let qualifying_period_end = policy.qualifying_period_end()?;

    let mut all_trips = trips.to_vec();
    all_trips.extend(proposed_trip.cloned());

    tracing::debug!(
        trips = all_trips.len(),
        visa_start = %policy.visa_start_date,
        first_entry = %policy.first_entry_date,
        adjusted_max_absence = policy.adjusted_max_absence(),
        "checking continuous residence"
    );

    let ledger = AbsenceLedger::build(
        policy.visa_start_date,
        qualifying_period_end,
        absence_ranges(&all_trips, policy),
    );

    let max_absence_period = match scan_windows(&ledger, policy, qualifying_period_end)? {
        WindowScan::Passed(worst) => worst,
        WindowScan::Violated(violation) => {
            tracing::debug!(
                days = violation.period.days,
                window_start = %violation.period.start_date,
                window_end = %violation.period.end_date,
                "residence check failed"
            );
            return Ok(ResidenceCheckResult {
                is_valid: false,
                failure_reason: Some(violation.to_string()),
                max_absence_period: violation.period,
                qualifying_period_end,
                next_possible_trips: None,
            });
        }
    };

    let search_from = proposed_trip.map_or(today, |trip| trip.end_date);
    let next_possible_trips = NextPossibleTrips {
        seven_day_trip: find_next_possible_trip_date(
            &all_trips,
            policy,
            SHORT_TRIP_DAYS,
            qualifying_period_end,
            search_from,
            today,
        )?,
        fourteen_day_trip: find_next_possible_trip_date(
            &all_trips,
            policy,
            LONG_TRIP_DAYS,
            qualifying_period_end,
            search_from,
            today,
        )?,
    };

    tracing::debug!(
        worst_days = max_absence_period.days,
        seven_day_trip = ?next_possible_trips.seven_day_trip,
        fourteen_day_trip = ?next_possible_trips.fourteen_day_trip,
        "residence check passed"
    );

    Ok(ResidenceCheckResult {
        is_valid: true,
        failure_reason: None,
        max_absence_period,
        qualifying_period_end,
        next_possible_trips: Some(next_possible_trips),
    })
}

/// Find the earliest date a trip of `trip_length` days could start without
/// pushing any window anchored inside that trip over the adjusted ceiling.
///
/// Candidates start the day after the later of `search_from` and `today`, and
/// stop at `qualifying_period_end` or [`SEARCH_HORIZON_DAYS`] after the first
/// candidate, whichever comes first. Returns `Ok(None)` if no candidate fits.
///
/// # Errors
/// Returns `ResidenceError::InvalidTripLength` for a zero-length trip and
/// `ResidenceError::DateOutOfRange` if the search runs past chrono's range.
pub fn find_next_possible_trip_date(
    trips: &[Trip],
    policy: &ResidencePolicy,
    trip_length: u32,
    qualifying_period_end: NaiveDate,
    search_from: NaiveDate,
    today: NaiveDate,
) -> Result<Option<NaiveDate>> {
    if trip_length == 0 {
        return Err(ResidenceError::InvalidTripLength(trip_length));
    }
    let trip_span = u64::from(trip_length - 1);

    let start = search_from.max(today);
    let first_candidate = next_day(start)?;
    let horizon = add_days(first_candidate, SEARCH_HORIZON_DAYS)
        .ok_or(ResidenceError::DateOutOfRange(first_candidate))?;
    let search_end = qualifying_period_end.min(horizon);

    if first_candidate > search_end {
        return Ok(None);
    }

    // The last candidate's trip may run past the qualifying period.
    let last_needed =
        add_days(search_end, trip_span).ok_or(ResidenceError::DateOutOfRange(search_end))?;
    let ledger = AbsenceLedger::build(
        policy.visa_start_date,
        last_needed.max(qualifying_period_end),
        absence_ranges(trips, policy),
    );
    let ceiling = policy.adjusted_max_absence();

    let mut candidate = first_candidate;
    while candidate <= search_end {
        let trip_end =
            add_days(candidate, trip_span).ok_or(ResidenceError::DateOutOfRange(candidate))?;
        if trip_fits(&ledger, policy, (candidate, trip_end), ceiling)? {
            tracing::trace!(%candidate, trip_length, "found next possible trip date");
            return Ok(Some(candidate));
        }
        candidate = next_day(candidate)?;
    }

    tracing::trace!(trip_length, %search_end, "no possible trip date within search horizon");
    Ok(None)
}

/// The pre-entry gap plus every trip, as inclusive day ranges.
pub(crate) fn absence_ranges(trips: &[Trip], policy: &ResidencePolicy) -> Vec<DayRange> {
    let mut ranges: Vec<DayRange> = Vec::with_capacity(trips.len() + 1);
    ranges.extend(policy.pre_entry_gap());
    for trip in trips {
        if trip.is_inverted() {
            tracing::warn!(
                start = %trip.start_date,
                end = %trip.end_date,
                "ignoring trip that ends before it starts"
            );
            continue;
        }
        ranges.push((trip.start_date, trip.end_date));
    }
    ranges
}

/// Result of walking every anchor day of the qualifying period.
enum WindowScan {
    /// The first window over the ceiling.
    Violated(Violation),
    /// No window over the ceiling; carries the worst window seen.
    Passed(AbsencePeriod),
}

/// Walk anchors forward, tracking the worst window and stopping at the first
/// one over the ceiling. Ties for the worst window keep the earliest anchor.
fn scan_windows(
    ledger: &AbsenceLedger,
    policy: &ResidencePolicy,
    qualifying_period_end: NaiveDate,
) -> Result<WindowScan> {
    let ceiling = policy.adjusted_max_absence();
    let mut worst = AbsencePeriod {
        days: 0,
        start_date: policy.visa_start_date,
        end_date: policy.visa_start_date,
    };

    let mut anchor = policy.visa_start_date;
    while anchor <= qualifying_period_end {
        let window_start = policy.window_start(anchor)?;
        let period = AbsencePeriod {
            days: ledger.absent_days(window_start, anchor),
            start_date: window_start,
            end_date: anchor,
        };
        if period.days > ceiling {
            return Ok(WindowScan::Violated(Violation {
                period,
                adjusted_max_absence: ceiling,
                max_absence_days: policy.max_absence_days,
                buffer_days: policy.buffer_days,
            }));
        }
        if period.days > worst.days {
            worst = period;
        }
        anchor = next_day(anchor)?;
    }

    Ok(WindowScan::Passed(worst))
}

fn trip_fits(
    ledger: &AbsenceLedger,
    policy: &ResidencePolicy,
    trip: DayRange,
    ceiling: i64,
) -> Result<bool> {
    let mut day = trip.0;
    while day <= trip.1 {
        let window_start = policy.window_start(day)?;
        if ledger.absent_days_with(window_start, day, trip) > ceiling {
            return Ok(false);
        }
        day = next_day(day)?;
    }
    Ok(true)
}

fn next_day(day: NaiveDate) -> Result<NaiveDate> {
    day.succ_opt().ok_or(ResidenceError::DateOutOfRange(day))
}
