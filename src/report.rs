//! # Day Report
//!
//! Collects the results of every almanac operation for one observer and one
//! local day into a serialisable [`DayReport`], and renders it as plain text
//! for terminals. JSON output is the same struct through `serde_json`.
//!
//! Instants are stored as `DateTime<FixedOffset>` so the report keeps the
//! offset that was in force at each event (DST days can mix two offsets).

use crate::config::Config;
use crate::ephemeris::KeplerMoon;
use crate::moon_events::{local_midnight, moon_rise_set_with, MoonRiseSet};
use crate::{
    moon_phase, sun_phenomenon, AlmanacError, GeodeticPosition, MoonPhaseSample, PhenomenonResult,
    SunPhenomenon,
};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone};
use serde::Serialize;
use std::fmt;
use std::time::Instant;

/// Width of the illumination bar in characters.
const BAR_WIDTH: usize = 20;

/// One solar phenomenon line of the report.
#[derive(Debug, Clone, Serialize)]
pub struct SunEntry {
    pub phenomenon: SunPhenomenon,
    pub result: PhenomenonResult<DateTime<FixedOffset>>,
}

/// Everything the almanac knows about one day at one place.
#[derive(Debug, Clone, Serialize)]
pub struct DayReport {
    pub location: String,
    pub position: GeodeticPosition,
    pub timezone: String,
    pub date: NaiveDate,
    /// Phase sampled at local noon
    pub moon_phase: MoonPhaseSample,
    pub moonrise: Option<DateTime<FixedOffset>>,
    pub moonset: Option<DateTime<FixedOffset>>,
    pub sun: Vec<SunEntry>,
}

impl DayReport {
    /// Build a report from results that were computed elsewhere.
    pub fn assemble<Tz: TimeZone>(
        config: &Config,
        date: NaiveDate,
        moon_phase: MoonPhaseSample,
        moon: &MoonRiseSet<Tz>,
        sun: Vec<(SunPhenomenon, PhenomenonResult<DateTime<Tz>>)>,
    ) -> Self {
        DayReport {
            location: config.observer.name.clone(),
            position: GeodeticPosition {
                latitude_deg: config.observer.latitude,
                longitude_deg: config.observer.longitude,
            },
            timezone: config.observer.timezone.clone(),
            date,
            moon_phase,
            moonrise: moon.rise.as_ref().map(|t| t.fixed_offset()),
            moonset: moon.set.as_ref().map(|t| t.fixed_offset()),
            sun: sun
                .into_iter()
                .map(|(phenomenon, result)| SunEntry {
                    phenomenon,
                    result: result.map(|t| t.fixed_offset()),
                })
                .collect(),
        }
    }

    /// Compute every section sequentially.
    pub fn compute(config: &Config, date: NaiveDate) -> Result<Self, AlmanacError> {
        let position = config.position()?;
        let tz = config.timezone()?;

        let phase = moon_phase(&phase_instant(date, &tz)?);
        let options = config.scan_options(Instant::now());
        let moon = moon_rise_set_with(&KeplerMoon, &position, date, &tz, &options)?;
        let sun = config
            .almanac
            .phenomena
            .iter()
            .map(|&p| sun_phenomenon(&position, p, date, &tz).map(|r| (p, r)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::assemble(config, date, phase, &moon, sun))
    }

    /// Plain-text rendering for terminals.
    pub fn render_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for DayReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Moon Almanac - {} ({})",
            self.location,
            format_coordinates(&self.position)
        )?;
        writeln!(f, "Date: {} ({})", self.date, self.timezone)?;
        writeln!(f)?;

        let phase = &self.moon_phase;
        writeln!(f, "Moon")?;
        writeln!(
            f,
            "  {:<18}{} (age {:.1} d)",
            "Phase", phase.phase_name, phase.age_days
        )?;
        writeln!(
            f,
            "  {:<18}{} {:>3.0}%",
            "Illumination",
            illumination_bar(phase.illuminated_fraction, BAR_WIDTH),
            phase.illuminated_fraction * 100.0
        )?;
        writeln!(f, "  {:<18}{}", "Moonrise", format_event_time(self.moonrise.as_ref()))?;
        writeln!(f, "  {:<18}{}", "Moonset", format_event_time(self.moonset.as_ref()))?;

        if !self.sun.is_empty() {
            writeln!(f)?;
            writeln!(f, "Sun")?;
            for entry in &self.sun {
                writeln!(
                    f,
                    "  {:<18}{}",
                    entry.phenomenon.name(),
                    format_sun_result(&entry.result)
                )?;
            }
        }
        Ok(())
    }
}

/// Local noon of `date`, where the daily moon phase is sampled.
pub fn phase_instant<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Result<DateTime<Tz>, AlmanacError> {
    Ok(local_midnight(date, tz)? + Duration::hours(12))
}

/// `HH:MM` or `--` when the event does not occur.
pub fn format_event_time(instant: Option<&DateTime<FixedOffset>>) -> String {
    match instant {
        Some(t) => t.format("%H:%M").to_string(),
        None => "--".to_string(),
    }
}

fn format_sun_result(result: &PhenomenonResult<DateTime<FixedOffset>>) -> String {
    match result {
        PhenomenonResult::Found(t) => format_event_time(Some(t)),
        PhenomenonResult::Absent => "-- (does not occur)".to_string(),
        PhenomenonResult::Fallback {
            instant,
            phenomenon,
        } => format!("{} ({} fallback)", format_event_time(Some(instant)), phenomenon),
    }
}

/// `51.100°N, 17.030°E`
pub fn format_coordinates(position: &GeodeticPosition) -> String {
    let ns = if position.latitude_deg < 0.0 { 'S' } else { 'N' };
    let ew = if position.longitude_deg < 0.0 { 'W' } else { 'E' };
    format!(
        "{:.3}°{}, {:.3}°{}",
        position.latitude_deg.abs(),
        ns,
        position.longitude_deg.abs(),
        ew
    )
}

/// `[#####.....]` style bar for a fraction in `[0, 1]`.
pub fn illumination_bar(fraction: f64, width: usize) -> String {
    let filled = ((fraction.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    format!("[{}{}]", "#".repeat(filled), ".".repeat(width - filled))
}
