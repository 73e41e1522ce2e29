//! Apsis finder
//!
//! Finds the next nearest and farthest points of one body's orbit around
//! another, starting from a given date.
//!
//! Usage:
//!   cargo run --bin apsides -- --date 2019-05-01 --body1 earth --body2 sun

use std::path::Path;
use std::process::ExitCode;

use apsides::{almanac, ApsidesError, Ephemeris, Loader, Time, Timescale};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clap::{ArgAction, Parser};
use log::{debug, error};

/// Type alias for the error type used throughout this module
type Result<T> = std::result::Result<T, ApsidesError>;

/// Apsis finder
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Finds the nearest and farthest points of an orbit using a JPL ephemeris",
    long_about = None
)]
struct Args {
    /// Date to start the search from (YYYY-MM-DD or RFC 3339), defaults to now
    #[arg(short, long)]
    date: Option<String>,

    /// Orbiting body
    #[arg(long, default_value = "earth")]
    body1: String,

    /// Body orbited
    #[arg(long, default_value = "sun")]
    body2: String,

    /// Ephemeris kernel, a file name in the data directory or a path
    #[arg(short, long, default_value = "de421.bsp")]
    ephemeris: String,

    /// Directory holding the ephemeris instead of the download cache
    #[arg(long)]
    data_dir: Option<String>,

    /// Print the report as JSON
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,

    /// Log every refinement step
    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,
}

/// Parse a start date given as a calendar date or a full timestamp
fn parse_date(ts: &Timescale, text: &str) -> Result<Time> {
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Ok(ts.from_datetime(date.and_time(NaiveTime::MIN).and_utc()));
    }

    DateTime::parse_from_rfc3339(text)
        .map(|dt| ts.from_datetime(dt.with_timezone(&Utc)))
        .map_err(|e| ApsidesError::DataError(format!("Invalid date {:?}: {}", text, e)))
}

fn load_ephemeris(args: &Args) -> Result<Ephemeris> {
    let path = Path::new(&args.ephemeris);
    if args.data_dir.is_none() && path.components().count() > 1 {
        return Ephemeris::open(path);
    }

    let loader = match &args.data_dir {
        Some(dir) => Loader::new().with_data_dir(dir),
        None => Loader::new(),
    };
    loader.load_ephemeris(&args.ephemeris)
}

fn run(args: &Args) -> Result<()> {
    let ts = Loader::new().timescale();
    let start = match &args.date {
        Some(text) => parse_date(&ts, text)?,
        None => ts.now(),
    };

    let ephemeris = load_ephemeris(args)?;
    debug!("Loaded {} segments", ephemeris.spk().segments.len());

    let report = almanac::find_apsides(&ephemeris, &ts, start, &args.body1, &args.body2)?;

    if args.json {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| ApsidesError::DataError(format!("Failed to encode report: {}", e)))?;
        println!("{}", json);
    } else {
        println!("{}", report);
    }

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
