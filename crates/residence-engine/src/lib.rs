//! # residence-engine
//!
//! Rolling 12-month absence checks for the UK continuous residence
//! requirement.
//!
//! Given a user's trips abroad, the date their qualifying period started and
//! the date they first entered the UK, the engine tests every trailing
//! 12-month window of the five-year qualifying period against the absence
//! ceiling (180 days less an optional safety buffer). It reports the first
//! violating window, or the worst window seen together with the earliest
//! dates a 7-day and a 14-day trip could start.
//!
//! All computation is pure: callers load trips and configuration themselves
//! and pass `today` explicitly, so identical inputs always give identical
//! results.
//!
//! ## Modules
//!
//! - [`residence`] — the window scan and the next-trip search
//! - [`ledger`] — merged absence ranges with O(1) window counts
//! - [`policy`] — ceiling, buffer tiers and qualifying period arithmetic
//! - [`trip`] — trip records and ISO date parsing
//! - [`stats`] — running totals for a travel dashboard
//! - [`error`] — Error types

pub mod error;
pub mod ledger;
pub mod policy;
pub mod residence;
pub mod stats;
pub mod trip;

pub use error::{ResidenceError, Result};
pub use policy::{Buffer, ResidencePolicy, ResidenceProfile, DEFAULT_MAX_ABSENCE_DAYS};
pub use residence::{
    check_continuous_residence, find_next_possible_trip_date, AbsencePeriod, NextPossibleTrips,
    ResidenceCheckResult,
};
pub use stats::TravelStats;
pub use trip::{parse_date, Trip};
