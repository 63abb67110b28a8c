//! # Moonrise and Moonset
//!
//! Maps a local calendar day to the Moon's rise and set instants.
//!
//! ## Windowing
//! The scan runs from 12 hours before to 36 hours after local midnight
//! (converted to UTC). That oversized window covers every crossing whose local
//! projection can fall on the requested day, whatever the zone offset or DST
//! rule, and also catches slow grazing crossings at high latitude.
//!
//! ## Selection
//! Crossings are projected into the caller's zone, those outside the requested
//! calendar date are dropped, and the first rising and first setting crossing
//! are reported independently. Either (or both) may be missing: the Moon rises
//! ~50 minutes later each day, so roughly once a month a day has no moonrise
//! (or no moonset), and near the poles the Moon can stay up or down for days.

use crate::altitude::topocentric_altitude;
use crate::crossing::{find_crossings, HorizonOffset, ScanOptions, ScanWindow};
use crate::ephemeris::{EphemerisProvider, KeplerMoon};
use crate::{AlmanacError, CrossingEvent, Direction, GeodeticPosition};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use log::debug;

/// Hours scanned before local midnight.
const WINDOW_LEAD_HOURS: i64 = 12;
/// Hours scanned after local midnight.
const WINDOW_TRAIL_HOURS: i64 = 36;

/// A crossing projected into the caller's time zone.
#[derive(Debug, Clone)]
pub struct LocalCrossing<Tz: TimeZone> {
    pub instant: DateTime<Tz>,
    pub direction: Direction,
}

/// Moon events on one local calendar day.
#[derive(Debug, Clone)]
pub struct MoonRiseSet<Tz: TimeZone> {
    /// First rising crossing of the day
    pub rise: Option<DateTime<Tz>>,
    /// First setting crossing of the day
    pub set: Option<DateTime<Tz>>,
    /// Every crossing on the day, ascending
    pub crossings: Vec<LocalCrossing<Tz>>,
}

/// Moonrise and moonset for `date` in zone `tz`, using the Kepler ephemeris
/// and standard refraction.
///
/// # Example
/// ```no_run
/// use chrono::NaiveDate;
/// use moon_almanac_lib::{moon_rise_set, GeodeticPosition};
///
/// let site = GeodeticPosition::new(51.1, 17.03).unwrap();
/// let date = NaiveDate::from_ymd_opt(2025, 3, 16).unwrap();
/// let events = moon_rise_set(&site, date, &chrono_tz::Europe::Warsaw).unwrap();
/// println!("rise {:?} set {:?}", events.rise, events.set);
/// ```
pub fn moon_rise_set<Tz: TimeZone>(
    observer: &GeodeticPosition,
    date: NaiveDate,
    tz: &Tz,
) -> Result<MoonRiseSet<Tz>, AlmanacError> {
    moon_rise_set_with(&KeplerMoon, observer, date, tz, &ScanOptions::default())
}

/// [`moon_rise_set`] with an explicit ephemeris and scan options.
pub fn moon_rise_set_with<P, Tz>(
    provider: &P,
    observer: &GeodeticPosition,
    date: NaiveDate,
    tz: &Tz,
    options: &ScanOptions,
) -> Result<MoonRiseSet<Tz>, AlmanacError>
where
    P: EphemerisProvider + ?Sized,
    Tz: TimeZone,
{
    observer.validate()?;

    let midnight = local_midnight(date, tz)?.with_timezone(&Utc);
    let window = scan_window(midnight)?;
    debug!(
        "scanning moon altitude {} .. {} for {date}",
        window.start, window.end
    );

    let horizon = HorizonOffset {
        refraction_deg: options.refraction_deg,
    };
    let crossings = find_crossings(
        &window,
        |t| topocentric_altitude(provider, t, observer),
        |sample| horizon.at(sample),
        options.deadline,
    )?;

    Ok(select_day_events(&crossings, date, tz))
}

/// UTC window scanned for the local day starting at `midnight_utc`.
///
/// Fails with [`AlmanacError::InvalidArgument`] when the window leaves
/// chrono's representable range.
pub fn scan_window(midnight_utc: DateTime<Utc>) -> Result<ScanWindow, AlmanacError> {
    let out_of_range =
        || AlmanacError::InvalidArgument(format!("scan window around {midnight_utc} is out of range"));
    Ok(ScanWindow {
        start: midnight_utc
            .checked_sub_signed(Duration::hours(WINDOW_LEAD_HOURS))
            .ok_or_else(out_of_range)?,
        end: midnight_utc
            .checked_add_signed(Duration::hours(WINDOW_TRAIL_HOURS))
            .ok_or_else(out_of_range)?,
    })
}

/// Keep crossings on local `date` and pick the first of each direction.
pub fn select_day_events<Tz: TimeZone>(
    crossings: &[CrossingEvent],
    date: NaiveDate,
    tz: &Tz,
) -> MoonRiseSet<Tz> {
    let mut on_day: Vec<LocalCrossing<Tz>> = crossings
        .iter()
        .map(|c| LocalCrossing {
            instant: c.instant_utc.with_timezone(tz),
            direction: c.direction,
        })
        .filter(|c| c.instant.date_naive() == date)
        .collect();
    on_day.sort_by(|a, b| a.instant.cmp(&b.instant));

    let first = |direction: Direction| {
        on_day
            .iter()
            .find(|c| c.direction == direction)
            .map(|c| c.instant.clone())
    };
    let rise = first(Direction::Rising);
    let set = first(Direction::Setting);

    MoonRiseSet {
        rise,
        set,
        crossings: on_day,
    }
}

/// First instant of `date` in `tz`.
///
/// An ambiguous midnight (clocks turned back) resolves to the earlier
/// instant. Where midnight does not exist (clocks jump forward at 00:00) the
/// first valid wall-clock time of the day is used.
pub fn local_midnight<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Result<DateTime<Tz>, AlmanacError> {
    let mut wall = date.and_time(NaiveTime::MIN);
    // DST gaps are at most a few hours
    for _ in 0..=16 {
        if let Some(instant) = tz.from_local_datetime(&wall).earliest() {
            return Ok(instant);
        }
        wall += Duration::minutes(15);
    }
    Err(AlmanacError::InvalidArgument(format!(
        "no valid local time at the start of {date}"
    )))
}
