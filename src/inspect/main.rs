//! Standalone inspector for the bot's state files.
//!
//! Lists every premium and usage record with its current status, and flags
//! records the bot would silently ignore. Never writes to either file.

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Local;
use clap::Parser;
use serde::Serialize;

use diskwala_bot::config::{DEFAULT_FREE_COOLDOWN_HOURS, MAX_FREE_COOLDOWN_HOURS};
use diskwala_bot::store::{EntitlementStore, PremiumStatus, UsageStatus, UsageTracker};

/// State file inspector.
#[derive(Parser, Debug)]
#[command(name = "inspect_stores")]
#[command(about = "Shows premium and free-tier usage records of the Diskwala bot")]
#[command(version)]
struct Args {
    /// Path to the premium entitlement file.
    #[arg(long, default_value = "premium_users.json")]
    premium_file: PathBuf,

    /// Path to the free-tier usage file.
    #[arg(long, default_value = "usage_tracker.json")]
    usage_file: PathBuf,

    /// Free-tier cooldown in hours.
    #[arg(
        long,
        default_value_t = DEFAULT_FREE_COOLDOWN_HOURS,
        value_parser = clap::value_parser!(i64).range(1..=MAX_FREE_COOLDOWN_HOURS)
    )]
    cooldown_hours: i64,

    /// Print a JSON report instead of text.
    #[arg(long)]
    json: bool,

    /// Also list healthy records.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Serialize)]
struct Report {
    premium: Vec<Record<PremiumStatus>>,
    usage: Vec<Record<UsageStatus>>,
}

#[derive(Debug, Serialize)]
struct Record<S> {
    user: String,
    status: S,
}

impl Report {
    fn malformed_count(&self) -> usize {
        self.premium
            .iter()
            .filter(|r| r.status == PremiumStatus::Malformed)
            .count()
            + self
                .usage
                .iter()
                .filter(|r| r.status == UsageStatus::Malformed)
                .count()
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let now = Local::now().naive_local();
    let premium = EntitlementStore::new(&args.premium_file);
    let usage = UsageTracker::with_hours(&args.usage_file, args.cooldown_hours);

    let premium_records = match premium.records_on(now.date()).await {
        Ok(records) => records,
        Err(e) => {
            eprintln!("✗ Failed to read {}: {e}", args.premium_file.display());
            return ExitCode::FAILURE;
        }
    };
    let usage_records = match usage.records_at(now).await {
        Ok(records) => records,
        Err(e) => {
            eprintln!("✗ Failed to read {}: {e}", args.usage_file.display());
            return ExitCode::FAILURE;
        }
    };

    let report = Report {
        premium: premium_records
            .into_iter()
            .map(|(user, status)| Record { user, status })
            .collect(),
        usage: usage_records
            .into_iter()
            .map(|(user, status)| Record { user, status })
            .collect(),
    };

    if args.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("✗ Failed to encode report: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        print_text(&args, &report);
    }

    if report.malformed_count() == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn print_text(args: &Args, report: &Report) {
    println!("Premium: {}", args.premium_file.display());
    let mut active = 0;
    for record in &report.premium {
        match record.status {
            PremiumStatus::Active(expiry) => {
                active += 1;
                if args.verbose {
                    println!("  ✓ {} active until {expiry}", record.user);
                }
            }
            PremiumStatus::Expired(expiry) => {
                if args.verbose {
                    println!("  · {} expired on {expiry}", record.user);
                }
            }
            PremiumStatus::Malformed => println!("  ✗ {} has a malformed expiry", record.user),
        }
    }
    println!("  {active}/{} active\n", report.premium.len());

    println!("Usage: {}", args.usage_file.display());
    let mut cooling = 0;
    for record in &report.usage {
        match record.status {
            UsageStatus::CoolingDown(reopens) => {
                cooling += 1;
                if args.verbose {
                    println!("  ⏳ {} can use the free tier again at {reopens}", record.user);
                }
            }
            UsageStatus::Available(last) => {
                if args.verbose {
                    println!("  ✓ {} last used {last}", record.user);
                }
            }
            UsageStatus::Malformed => println!("  ✗ {} has a malformed timestamp", record.user),
        }
    }
    println!("  {cooling}/{} cooling down", report.usage.len());

    let malformed = report.malformed_count();
    if malformed > 0 {
        println!("\n✗ {malformed} malformed record(s); the bot ignores them");
    }
}
