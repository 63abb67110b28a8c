//! # Moon Almanac Application Entry Point
//!
//! This binary crate loads the observer configuration, computes one day's
//! almanac and prints it. It supports a plain-text report (default) and JSON
//! output (`--json`) for scripting.
//!
//! ## Usage
//! ```text
//! moon-almanac [--config PATH] [--date YYYY-MM-DD] [--json]
//! ```
//! Without `--date` the current date in the configured time zone is used.
//! Logging goes to stderr and is controlled with `RUST_LOG` (default `info`).


use anyhow::{anyhow, Context};
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use log::info;
use moon_almanac_lib::{
    config::Config,
    ephemeris::KeplerMoon,
    moon_events::moon_rise_set_with,
    moon_phase,
    report::{phase_instant, DayReport},
    sun_phenomenon, GeodeticPosition,
};
use std::env;
use std::path::PathBuf;
use std::time::Instant;

/// Parsed command line.
#[derive(Debug, Default, PartialEq)]
pub struct CliArgs {
    /// Explicit configuration file
    pub config_path: Option<PathBuf>,
    /// Day to report on, in the configured zone
    pub date: Option<NaiveDate>,
    /// Emit JSON instead of text
    pub json: bool,
}

impl CliArgs {
    /// Parse arguments (without the program name).
    pub fn parse<I: IntoIterator<Item = String>>(args: I) -> anyhow::Result<Self> {
        let mut parsed = CliArgs::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--json" => parsed.json = true,
                "--config" => {
                    let path = args.next().ok_or_else(|| anyhow!("--config needs a path"))?;
                    parsed.config_path = Some(PathBuf::from(path));
                }
                "--date" => {
                    let value = args
                        .next()
                        .ok_or_else(|| anyhow!("--date needs a YYYY-MM-DD value"))?;
                    let date = NaiveDate::parse_from_str(&value, "%Y-%m-%d")
                        .with_context(|| format!("invalid --date '{value}'"))?;
                    parsed.date = Some(date);
                }
                other => return Err(anyhow!("unknown argument '{other}'")),
            }
        }
        Ok(parsed)
    }
}

/// Compute the report, running the moon scan and the solar formulas on
/// separate blocking threads.
async fn compute_report(
    config: &Config,
    position: GeodeticPosition,
    tz: Tz,
    date: NaiveDate,
) -> anyhow::Result<DayReport> {
    let options = config.scan_options(Instant::now());
    let moon_task = tokio::task::spawn_blocking(move || {
        moon_rise_set_with(&KeplerMoon, &position, date, &tz, &options)
    });

    let phenomena = config.almanac.phenomena.clone();
    let sun_task = tokio::task::spawn_blocking(move || {
        phenomena
            .into_iter()
            .map(|p| sun_phenomenon(&position, p, date, &tz).map(|r| (p, r)))
            .collect::<Result<Vec<_>, _>>()
    });

    let phase = moon_phase(&phase_instant(date, &tz)?);
    let (moon, sun) = tokio::try_join!(moon_task, sun_task)?;
    let moon = moon.context("moonrise/moonset scan failed")?;
    let sun = sun.context("solar phenomena failed")?;

    Ok(DayReport::assemble(config, date, phase, &moon, sun))
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = CliArgs::parse(env::args().skip(1))?;
    let config = match &args.config_path {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    };

    let position = config.position()?;
    let tz = config.timezone()?;
    let date = args
        .date
        .unwrap_or_else(|| Utc::now().with_timezone(&tz).date_naive());
    info!("Computing almanac for {} on {date}", config.observer.name);

    // Create Tokio runtime for the concurrent computations
    let rt = tokio::runtime::Runtime::new()?;
    let report = rt.block_on(compute_report(&config, position, tz, date))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.render_text());
    }
    Ok(())
}
