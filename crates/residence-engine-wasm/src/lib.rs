//! WASM bindings for residence-engine.
//!
//! Exposes the continuous residence check, the next-trip search and the
//! dashboard statistics to JavaScript via `wasm-bindgen`. All complex types
//! are passed as JSON strings in the same camelCase shape the web app
//! already stores (`Trip`, `prInfo`).
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p residence-engine-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target web --out-dir web/pkg/ \
//!   target/wasm32-unknown-unknown/release/residence_engine_wasm.wasm
//! ```

use chrono::NaiveDate;
use residence_engine::{ResidencePolicy, ResidenceProfile, TravelStats, Trip};
use serde::Serialize;
use wasm_bindgen::prelude::*;

// ---------------------------------------------------------------------------
// Helpers: JSON in, JSON out
// ---------------------------------------------------------------------------

/// Parse a JSON array of `{startDate, endDate}` trip objects.
fn parse_trips_json(json: &str) -> Result<Vec<Trip>, String> {
    serde_json::from_str(json).map_err(|e| format!("Invalid trips JSON: {}", e))
}

/// Parse a `{visaApprovalDate, firstEntryToUK, buffer}` object into a policy.
fn parse_policy_json(json: &str) -> Result<ResidencePolicy, String> {
    let profile: ResidenceProfile =
        serde_json::from_str(json).map_err(|e| format!("Invalid profile JSON: {}", e))?;
    Ok(ResidencePolicy::from(&profile))
}

fn parse_trip_json(json: &str) -> Result<Trip, String> {
    serde_json::from_str(json).map_err(|e| format!("Invalid trip JSON: {}", e))
}

fn parse_day(s: &str) -> Result<NaiveDate, String> {
    residence_engine::parse_date(s).map_err(|e| e.to_string())
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("Serialization error: {}", e))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NextTripDto {
    trip_length: u32,
    start_date: Option<NaiveDate>,
}

// ---------------------------------------------------------------------------
// Plain-Rust entry points (exercised by native tests)
// ---------------------------------------------------------------------------

pub fn check_json(
    trips_json: &str,
    profile_json: &str,
    proposed_trip_json: Option<&str>,
    today: &str,
) -> Result<String, String> {
    let trips = parse_trips_json(trips_json)?;
    let policy = parse_policy_json(profile_json)?;
    let proposed = proposed_trip_json.map(parse_trip_json).transpose()?;
    let today = parse_day(today)?;

    let result =
        residence_engine::check_continuous_residence(&trips, &policy, proposed.as_ref(), today)
            .map_err(|e| e.to_string())?;
    to_json(&result)
}

pub fn next_trip_json(
    trips_json: &str,
    profile_json: &str,
    trip_length: u32,
    search_from: &str,
    today: &str,
) -> Result<String, String> {
    let trips = parse_trips_json(trips_json)?;
    let policy = parse_policy_json(profile_json)?;
    let search_from = parse_day(search_from)?;
    let today = parse_day(today)?;
    let qualifying_period_end = policy.qualifying_period_end().map_err(|e| e.to_string())?;

    let start_date = residence_engine::find_next_possible_trip_date(
        &trips,
        &policy,
        trip_length,
        qualifying_period_end,
        search_from,
        today,
    )
    .map_err(|e| e.to_string())?;

    to_json(&NextTripDto {
        trip_length,
        start_date,
    })
}

pub fn stats_json(trips_json: &str, profile_json: &str, today: &str) -> Result<String, String> {
    let trips = parse_trips_json(trips_json)?;
    let policy = parse_policy_json(profile_json)?;
    let today = parse_day(today)?;

    to_json(&TravelStats::compute(&trips, &policy, today))
}

// ---------------------------------------------------------------------------
// WASM exports
// ---------------------------------------------------------------------------

/// Check continuous residence over the whole qualifying period.
///
/// `trips_json` is a JSON array of `{startDate, endDate}` objects,
/// `profile_json` is `{visaApprovalDate, firstEntryToUK, buffer}`, and
/// `proposed_trip_json` optionally adds one more trip for this call only.
/// Returns the `ResidenceCheckResult` as a JSON string.
#[wasm_bindgen(js_name = "checkContinuousResidence")]
pub fn check_continuous_residence(
    trips_json: &str,
    profile_json: &str,
    proposed_trip_json: Option<String>,
    today: &str,
) -> Result<String, JsValue> {
    check_json(trips_json, profile_json, proposed_trip_json.as_deref(), today)
        .map_err(|e| JsValue::from_str(&e))
}

/// Find the earliest start date for a trip of `trip_length` days.
///
/// Returns `{tripLength, startDate}` as a JSON string; `startDate` is `null`
/// when nothing fits within the search horizon.
#[wasm_bindgen(js_name = "findNextPossibleTripDate")]
pub fn find_next_possible_trip_date(
    trips_json: &str,
    profile_json: &str,
    trip_length: u32,
    search_from: &str,
    today: &str,
) -> Result<String, JsValue> {
    next_trip_json(trips_json, profile_json, trip_length, search_from, today)
        .map_err(|e| JsValue::from_str(&e))
}

/// Dashboard totals for the qualifying period up to `today`, as a JSON string.
#[wasm_bindgen(js_name = "travelStats")]
pub fn travel_stats(trips_json: &str, profile_json: &str, today: &str) -> Result<String, JsValue> {
    stats_json(trips_json, profile_json, today).map_err(|e| JsValue::from_str(&e))
}
