//! `residence` CLI — check a trip log against the continuous residence rules.
//!
//! ## Usage
//!
//! ```sh
//! # Check the whole qualifying period (profile JSON from a file)
//! residence check -i profile.json
//!
//! # Would a planned trip break the 12-month ceiling?
//! residence check -i profile.json --propose 2024-07-01..2024-07-21
//!
//! # Earliest start for a 10-day trip, as JSON
//! residence next-trip -i profile.json --length 10 --json
//!
//! # Dashboard totals as of a fixed date (stdin → stdout)
//! cat profile.json | residence stats --today 2024-03-01
//! ```
//!
//! The profile file holds the user's settlement settings and trip log:
//!
//! ```json
//! {
//!   "prInfo": { "visaApprovalDate": "2022-03-01", "firstEntryToUK": "2022-04-15", "buffer": 14 },
//!   "trips": [{ "startDate": "2022-08-01", "endDate": "2022-08-14", "country": "Italy" }]
//! }
//! ```

use std::io::{self, Read};
use std::process;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use residence_engine::{
    check_continuous_residence, find_next_possible_trip_date, parse_date, ResidenceCheckResult,
    ResidencePolicy, ResidenceProfile, TravelStats, Trip,
};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

/// Exit status for a completed check whose trips break the ceiling.
const EXIT_INVALID: i32 = 2;

#[derive(Parser)]
#[command(
    name = "residence",
    version,
    about = "UK continuous residence checker"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging (otherwise controlled by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check every rolling 12-month window of the qualifying period
    Check {
        /// Profile JSON file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Evaluate as of this date instead of today (YYYY-MM-DD)
        #[arg(long)]
        today: Option<String>,
        /// Include a planned trip, given as START..END
        #[arg(long)]
        propose: Option<String>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Find the earliest start date for a trip of a given length
    NextTrip {
        /// Profile JSON file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Trip length in days
        #[arg(short, long, default_value_t = 7)]
        length: u32,
        /// Search from this date instead of today (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,
        /// Evaluate as of this date instead of today (YYYY-MM-DD)
        #[arg(long)]
        today: Option<String>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show totals for the qualifying period so far
    Stats {
        /// Profile JSON file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Evaluate as of this date instead of today (YYYY-MM-DD)
        #[arg(long)]
        today: Option<String>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
}

/// The on-disk shape of a user's settlement settings and trip log.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileFile {
    pr_info: ResidenceProfile,
    #[serde(default)]
    trips: Vec<Trip>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    match cli.command {
        Commands::Check {
            input,
            today,
            propose,
            json,
        } => {
            let profile = load_profile(input.as_deref())?;
            let policy = ResidencePolicy::from(&profile.pr_info);
            let today = resolve_today(today.as_deref())?;
            let proposed = propose.as_deref().map(parse_proposed_trip).transpose()?;

            let result = check_continuous_residence(&profile.trips, &policy, proposed.as_ref(), today)
                .context("Failed to check continuous residence")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_check(&result, &profile.pr_info);
            }

            if !result.is_valid {
                process::exit(EXIT_INVALID);
            }
        }
        Commands::NextTrip {
            input,
            length,
            from,
            today,
            json,
        } => {
            let profile = load_profile(input.as_deref())?;
            let policy = ResidencePolicy::from(&profile.pr_info);
            let today = resolve_today(today.as_deref())?;
            let search_from = match from.as_deref() {
                Some(raw) => parse_date(raw)?,
                None => today,
            };
            let qualifying_period_end = policy.qualifying_period_end()?;

            let next = find_next_possible_trip_date(
                &profile.trips,
                &policy,
                length,
                qualifying_period_end,
                search_from,
                today,
            )
            .context("Failed to search for the next possible trip")?;

            if json {
                let value = serde_json::json!({
                    "tripLength": length,
                    "startDate": next,
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                match next {
                    Some(date) => println!("Next possible {}-day trip: {}", length, date),
                    None => println!("No {}-day trip fits within the search horizon", length),
                }
            }
        }
        Commands::Stats { input, today, json } => {
            let profile = load_profile(input.as_deref())?;
            let policy = ResidencePolicy::from(&profile.pr_info);
            let today = resolve_today(today.as_deref())?;

            let stats = TravelStats::compute(&profile.trips, &policy, today);

            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print_stats(&stats);
            }
        }
    }

    Ok(())
}

fn print_check(result: &ResidenceCheckResult, profile: &ResidenceProfile) {
    let policy = ResidencePolicy::from(profile);
    let period = &result.max_absence_period;

    println!(
        "Continuous residence: {}",
        if result.is_valid { "VALID" } else { "INVALID" }
    );
    println!("Qualifying period ends: {}", result.qualifying_period_end);
    println!(
        "Maximum absence: {} days between {} and {}",
        period.days, period.start_date, period.end_date
    );
    println!("Safety buffer: {}", profile.buffer);
    println!(
        "Allowed absence: {} days in any 12-month period ({} minus {} days buffer)",
        policy.adjusted_max_absence(),
        policy.max_absence_days,
        policy.buffer_days
    );

    if let Some(reason) = &result.failure_reason {
        println!("Reason: {}", reason);
    }

    if let Some(next) = &result.next_possible_trips {
        println!("Next 7-day trip: {}", describe_date(next.seven_day_trip));
        println!("Next 14-day trip: {}", describe_date(next.fourteen_day_trip));
    }
}

fn print_stats(stats: &TravelStats) {
    println!("As of:                  {}", stats.as_of);
    println!("Days since visa start:  {}", stats.days_since_visa_start);
    println!("Days in UK:             {}", stats.days_in_uk);
    println!("Days abroad:            {}", stats.days_abroad);
    println!("  before first entry:   {}", stats.pre_entry_gap_days);
    println!("Days since arrival:     {}", stats.days_since_arrival);
    println!("Logged trip days:       {}", stats.total_trip_days);
    println!("Upcoming trips:         {}", stats.upcoming_trip_count);
    match &stats.current_trip {
        Some(trip) => println!(
            "Currently abroad:       {} until {}",
            trip.country.as_deref().unwrap_or("unknown destination"),
            trip.end_date
        ),
        None => println!("Currently abroad:       no"),
    }
}

fn describe_date(date: Option<NaiveDate>) -> String {
    date.map_or_else(|| "none within search horizon".to_string(), |d| d.to_string())
}

/// Parse `START..END` into a trip.
fn parse_proposed_trip(raw: &str) -> Result<Trip> {
    let (start, end) = raw
        .split_once("..")
        .with_context(|| format!("Invalid proposed trip '{}': expected START..END", raw))?;
    Ok(Trip::parse(start, end)?)
}

fn resolve_today(raw: Option<&str>) -> Result<NaiveDate> {
    match raw {
        Some(raw) => Ok(parse_date(raw)?),
        None => Ok(Utc::now().date_naive()),
    }
}

fn load_profile(path: Option<&str>) -> Result<ProfileFile> {
    let raw = read_input(path)?;
    let profile: ProfileFile =
        serde_json::from_str(&raw).context("Failed to parse profile JSON")?;
    tracing::debug!(
        trips = profile.trips.len(),
        buffer = profile.pr_info.buffer.days(),
        "loaded profile"
    );
    Ok(profile)
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}
