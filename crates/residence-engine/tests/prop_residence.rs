//! Property-based tests for the absence window engine using proptest.
//!
//! These tests verify invariants that should hold for *any* trip history,
//! not just the specific examples in `residence_tests.rs`.

use std::collections::HashSet;

use chrono::{Days, NaiveDate};
use proptest::prelude::*;
use residence_engine::ledger::AbsenceLedger;
use residence_engine::residence::{check_continuous_residence, find_next_possible_trip_date};
use residence_engine::{ResidencePolicy, Trip};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
}

fn day(offset: u64) -> NaiveDate {
    base_date().checked_add_days(Days::new(offset)).unwrap()
}

/// A trip starting somewhere in the qualifying period, 1-120 days long.
fn arb_trip() -> impl Strategy<Value = Trip> {
    (0u64..1826, 1u32..=120).prop_map(|(start, len)| Trip::spanning(day(start), len).unwrap())
}

fn arb_trips() -> impl Strategy<Value = Vec<Trip>> {
    prop::collection::vec(arb_trip(), 0..6)
}

/// First entry up to 90 days after the visa start.
fn arb_policy() -> impl Strategy<Value = ResidencePolicy> {
    (0u64..=90).prop_map(|gap| ResidencePolicy::new(base_date(), day(gap)))
}

fn arb_today() -> impl Strategy<Value = NaiveDate> {
    (0u64..1900).prop_map(day)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Absent days in `[start, end]` counted one day at a time.
fn naive_absent_days(ranges: &[(NaiveDate, NaiveDate)], start: NaiveDate, end: NaiveDate) -> i64 {
    let mut absent = HashSet::new();
    for &(from, to) in ranges {
        let mut d = from.max(start);
        while d <= to.min(end) {
            absent.insert(d);
            d = d.succ_opt().unwrap();
        }
    }
    absent.len() as i64
}

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: 64,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Property 1: Identical inputs give identical results
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn check_is_idempotent(trips in arb_trips(), policy in arb_policy(), today in arb_today()) {
        let first = check_continuous_residence(&trips, &policy, None, today).unwrap();
        let second = check_continuous_residence(&trips, &policy, None, today).unwrap();
        prop_assert_eq!(first, second);
    }
}

// ---------------------------------------------------------------------------
// Property 2: A larger buffer never turns an invalid history valid
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn larger_buffer_is_never_more_lenient(
        trips in arb_trips(),
        policy in arb_policy(),
        small in 0i64..=30,
        extra in 0i64..=30,
    ) {
        let today = base_date();
        let lenient = check_continuous_residence(
            &trips, &policy.with_buffer_days(small), None, today,
        ).unwrap();
        let strict = check_continuous_residence(
            &trips, &policy.with_buffer_days(small + extra), None, today,
        ).unwrap();

        if strict.is_valid {
            prop_assert!(lenient.is_valid);
        }
    }
}

// ---------------------------------------------------------------------------
// Property 3: Ledger counts match a day-by-day union
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn ledger_matches_naive_union(
        trips in arb_trips(),
        window_start in 0u64..1826,
        window_len in 0u64..400,
    ) {
        let ranges: Vec<_> = trips.iter().map(|t| (t.start_date, t.end_date)).collect();
        let ledger = AbsenceLedger::build(day(0), day(2000), ranges.iter().copied());

        let start = day(window_start);
        let end = day(window_start + window_len);
        prop_assert_eq!(
            ledger.absent_days(start, end),
            naive_absent_days(&ranges, start, end)
        );
    }
}

// ---------------------------------------------------------------------------
// Property 4: The worst window never exceeds the ceiling on a valid history
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn valid_result_stays_within_ceiling(trips in arb_trips(), policy in arb_policy()) {
        let result = check_continuous_residence(&trips, &policy, None, base_date()).unwrap();
        if result.is_valid {
            prop_assert!(result.max_absence_period.days <= policy.adjusted_max_absence());
        } else {
            prop_assert_eq!(result.max_absence_period.days, policy.adjusted_max_absence() + 1);
            prop_assert!(result.failure_reason.is_some());
        }
    }
}

// ---------------------------------------------------------------------------
// Property 5: A suggested trip date is after today and keeps its own windows
// within the ceiling
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn suggested_trip_fits(
        trips in arb_trips(),
        policy in arb_policy(),
        today in arb_today(),
        length in prop_oneof![Just(7u32), Just(14u32)],
    ) {
        let end = policy.qualifying_period_end().unwrap();
        let found = find_next_possible_trip_date(&trips, &policy, length, end, today, today).unwrap();

        if let Some(start) = found {
            prop_assert!(start > today);
            prop_assert!(start <= end);

            let candidate = Trip::spanning(start, length).unwrap();
            let mut ranges: Vec<_> = trips.iter().map(|t| (t.start_date, t.end_date)).collect();
            ranges.extend(policy.pre_entry_gap());
            ranges.push((candidate.start_date, candidate.end_date));

            let mut d = candidate.start_date;
            while d <= candidate.end_date {
                let window_start = policy.window_start(d).unwrap();
                prop_assert!(
                    naive_absent_days(&ranges, window_start, d) <= policy.adjusted_max_absence(),
                    "window ending {} is over the ceiling", d
                );
                d = d.succ_opt().unwrap();
            }
        }
    }
}
