//! # Sunrise, Sunset and Twilight
//!
//! Closed-form solar event times from the "Almanac for Computers" (US Naval
//! Observatory, 1990), the same approximation NOAA's calculators popularised.
//! No iteration: one evaluation per event, accurate to a minute or two at
//! non-polar latitudes.
//!
//! ## Phenomena
//! | Phenomenon            | Zenith    | Sun centre      |
//! |-----------------------|-----------|-----------------|
//! | Astronomical twilight | 108°      | 18° below       |
//! | Nautical twilight     | 102°      | 12° below       |
//! | Civil twilight        | 96°       | 6° below        |
//! | Sunrise / sunset      | 90.833°   | upper limb + refraction |
//!
//! ## Missing Events
//! When the hour-angle equation has no solution the Sun never reaches the
//! zenith angle that day (midnight sun, polar night, or a summer night that
//! never gets astronomically dark). That is reported as
//! [`PhenomenonResult::Absent`]. Astronomical twilight gets one extra step: if
//! it is absent, nautical twilight is tried and, if found, reported as a
//! distinct [`PhenomenonResult::Fallback`] so callers can tell the two apart.

use crate::time::{normalize_degrees, normalize_hours};
use crate::{AlmanacError, GeodeticPosition};
use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Solar phenomena that can be computed for a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SunPhenomenon {
    AstronomicalDawn,
    NauticalDawn,
    CivilDawn,
    Sunrise,
    Sunset,
    CivilDusk,
    NauticalDusk,
    AstronomicalDusk,
}

impl SunPhenomenon {
    /// All phenomena in chronological order through a normal day.
    pub const ALL: [SunPhenomenon; 8] = [
        SunPhenomenon::AstronomicalDawn,
        SunPhenomenon::NauticalDawn,
        SunPhenomenon::CivilDawn,
        SunPhenomenon::Sunrise,
        SunPhenomenon::Sunset,
        SunPhenomenon::CivilDusk,
        SunPhenomenon::NauticalDusk,
        SunPhenomenon::AstronomicalDusk,
    ];

    /// Zenith angle of the Sun's centre at the event, degrees.
    pub fn zenith_deg(self) -> f64 {
        match self {
            SunPhenomenon::AstronomicalDawn | SunPhenomenon::AstronomicalDusk => 108.0,
            SunPhenomenon::NauticalDawn | SunPhenomenon::NauticalDusk => 102.0,
            SunPhenomenon::CivilDawn | SunPhenomenon::CivilDusk => 96.0,
            // 90° + 34' refraction + 16' solar radius
            SunPhenomenon::Sunrise | SunPhenomenon::Sunset => 90.833,
        }
    }

    /// `true` for morning events.
    pub fn is_rising(self) -> bool {
        matches!(
            self,
            SunPhenomenon::AstronomicalDawn
                | SunPhenomenon::NauticalDawn
                | SunPhenomenon::CivilDawn
                | SunPhenomenon::Sunrise
        )
    }

    /// Less strict phenomenon substituted when this one does not occur.
    pub fn fallback(self) -> Option<SunPhenomenon> {
        match self {
            SunPhenomenon::AstronomicalDawn => Some(SunPhenomenon::NauticalDawn),
            SunPhenomenon::AstronomicalDusk => Some(SunPhenomenon::NauticalDusk),
            _ => None,
        }
    }

    /// Display name, also accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            SunPhenomenon::AstronomicalDawn => "AstronomicalDawn",
            SunPhenomenon::NauticalDawn => "NauticalDawn",
            SunPhenomenon::CivilDawn => "CivilDawn",
            SunPhenomenon::Sunrise => "Sunrise",
            SunPhenomenon::Sunset => "Sunset",
            SunPhenomenon::CivilDusk => "CivilDusk",
            SunPhenomenon::NauticalDusk => "NauticalDusk",
            SunPhenomenon::AstronomicalDusk => "AstronomicalDusk",
        }
    }
}

impl fmt::Display for SunPhenomenon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SunPhenomenon {
    type Err = AlmanacError;

    /// Case-insensitive; spaces, `-` and `_` are ignored
    /// (`"astronomical-dawn"`, `"Civil Dusk"`, `"SUNSET"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .collect::<String>()
            .to_ascii_lowercase();
        SunPhenomenon::ALL
            .into_iter()
            .find(|p| p.name().to_ascii_lowercase() == key)
            .ok_or_else(|| AlmanacError::InvalidArgument(format!("unknown phenomenon '{s}'")))
    }
}

/// Outcome of a solar phenomenon query.
///
/// The event happened, it did not happen, or it did not happen and a less
/// strict event is reported in its place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "value", rename_all = "snake_case")]
pub enum PhenomenonResult<T> {
    /// The requested phenomenon occurs at this instant
    Found(T),
    /// The requested phenomenon does not occur on the day
    Absent,
    /// The requested phenomenon does not occur; `phenomenon` does, at `instant`
    Fallback { instant: T, phenomenon: SunPhenomenon },
}

impl<T> PhenomenonResult<T> {
    /// Instant of either the requested or the substituted phenomenon.
    pub fn instant(&self) -> Option<&T> {
        match self {
            PhenomenonResult::Found(t) | PhenomenonResult::Fallback { instant: t, .. } => Some(t),
            PhenomenonResult::Absent => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, PhenomenonResult::Absent)
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> PhenomenonResult<U> {
        match self {
            PhenomenonResult::Found(t) => PhenomenonResult::Found(f(t)),
            PhenomenonResult::Absent => PhenomenonResult::Absent,
            PhenomenonResult::Fallback {
                instant,
                phenomenon,
            } => PhenomenonResult::Fallback {
                instant: f(instant),
                phenomenon,
            },
        }
    }
}

/// UTC hour `[0, 24)` at which the Sun's centre reaches `zenith_deg`, or
/// `None` if it does not on that day.
///
/// `day_of_year` is 1-based; `longitude_deg` is east positive.
pub fn sun_event_utc_hour(
    day_of_year: u32,
    latitude_deg: f64,
    longitude_deg: f64,
    zenith_deg: f64,
    is_rising: bool,
) -> Option<f64> {
    // ---------- 1. Approximate time of the event ----------
    let lng_hour = longitude_deg / 15.0;
    let base_hour = if is_rising { 6.0 } else { 18.0 };
    let t = f64::from(day_of_year) + (base_hour - lng_hour) / 24.0;

    // ---------- 2. Sun's mean anomaly and true longitude ----------
    let mean_anomaly = 0.9856 * t - 3.289;
    let true_longitude = normalize_degrees(
        mean_anomaly
            + 1.916 * mean_anomaly.to_radians().sin()
            + 0.020 * (2.0 * mean_anomaly).to_radians().sin()
            + 282.634,
    );

    // ---------- 3. Right ascension, in the same quadrant as λ ----------
    let mut ra = normalize_degrees(
        (0.917_64 * true_longitude.to_radians().tan())
            .atan()
            .to_degrees(),
    );
    let l_quadrant = (true_longitude / 90.0).floor() * 90.0;
    let ra_quadrant = (ra / 90.0).floor() * 90.0;
    ra += l_quadrant - ra_quadrant;
    let ra_hours = ra / 15.0;

    // ---------- 4. Declination and local hour angle ----------
    let sin_dec = 0.397_82 * true_longitude.to_radians().sin();
    let cos_dec = sin_dec.asin().cos();
    let (sin_lat, cos_lat) = latitude_deg.to_radians().sin_cos();
    let cos_h = (zenith_deg.to_radians().cos() - sin_dec * sin_lat) / (cos_dec * cos_lat);
    if !(-1.0..=1.0).contains(&cos_h) {
        return None;
    }

    let h_deg = if is_rising {
        360.0 - cos_h.acos().to_degrees()
    } else {
        cos_h.acos().to_degrees()
    };
    let h_hours = h_deg / 15.0;

    // ---------- 5. Local mean time → UTC ----------
    let local_mean = h_hours + ra_hours - 0.065_71 * t - 6.622;
    Some(normalize_hours(local_mean - lng_hour))
}

/// Instant of `phenomenon` on local `date` in zone `tz`.
///
/// Astronomical dawn/dusk fall back to nautical twilight when absent.
pub fn sun_phenomenon<Tz: TimeZone>(
    observer: &GeodeticPosition,
    phenomenon: SunPhenomenon,
    date: NaiveDate,
    tz: &Tz,
) -> Result<PhenomenonResult<DateTime<Tz>>, AlmanacError> {
    observer.validate()?;

    if let Some(instant) = event_on_local_date(observer, phenomenon, date, tz) {
        return Ok(PhenomenonResult::Found(instant));
    }

    if let Some(substitute) = phenomenon.fallback() {
        if let Some(instant) = event_on_local_date(observer, substitute, date, tz) {
            warn!("{phenomenon} does not occur on {date}; reporting {substitute} instead");
            return Ok(PhenomenonResult::Fallback {
                instant,
                phenomenon: substitute,
            });
        }
    }

    debug!("{phenomenon} does not occur on {date}");
    Ok(PhenomenonResult::Absent)
}

/// [`sun_phenomenon`] with the phenomenon given by name.
///
/// Unknown names are [`AlmanacError::InvalidArgument`].
pub fn sun_phenomenon_by_name<Tz: TimeZone>(
    observer: &GeodeticPosition,
    name: &str,
    date: NaiveDate,
    tz: &Tz,
) -> Result<PhenomenonResult<DateTime<Tz>>, AlmanacError> {
    let phenomenon: SunPhenomenon = name.parse()?;
    sun_phenomenon(observer, phenomenon, date, tz)
}

/// Evaluate the formula and place the UTC hour on the requested local date.
///
/// The hour is anchored on `date` in UTC; zones far from Greenwich can push
/// the local projection onto an adjacent date, which is corrected by a day.
fn event_on_local_date<Tz: TimeZone>(
    observer: &GeodeticPosition,
    phenomenon: SunPhenomenon,
    date: NaiveDate,
    tz: &Tz,
) -> Option<DateTime<Tz>> {
    let hours = sun_event_utc_hour(
        date.ordinal(),
        observer.latitude_deg,
        observer.longitude_deg,
        phenomenon.zenith_deg(),
        phenomenon.is_rising(),
    )?;

    let anchor = Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?);
    let utc = anchor + Duration::milliseconds((hours * 3_600_000.0).round() as i64);
    let local = utc.with_timezone(tz);

    let shift = match local.date_naive().cmp(&date) {
        std::cmp::Ordering::Less => Duration::days(1),
        std::cmp::Ordering::Greater => Duration::days(-1),
        std::cmp::Ordering::Equal => Duration::zero(),
    };
    Some((utc + shift).with_timezone(tz))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Timelike};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_phenomenon_names_parse() {
        assert_eq!(
            "AstronomicalDawn".parse::<SunPhenomenon>().unwrap(),
            SunPhenomenon::AstronomicalDawn
        );
        assert_eq!(
            "civil-dusk".parse::<SunPhenomenon>().unwrap(),
            SunPhenomenon::CivilDusk
        );
        assert_eq!(
            "Nautical Dawn".parse::<SunPhenomenon>().unwrap(),
            SunPhenomenon::NauticalDawn
        );
        assert_eq!("SUNSET".parse::<SunPhenomenon>().unwrap(), SunPhenomenon::Sunset);
        for p in SunPhenomenon::ALL {
            assert_eq!(p.to_string().parse::<SunPhenomenon>().unwrap(), p);
        }
    }

    #[test]
    fn test_unknown_phenomenon_is_invalid_argument() {
        let err = "GoldenHour".parse::<SunPhenomenon>().unwrap_err();
        assert!(matches!(err, AlmanacError::InvalidArgument(_)));

        let site = GeodeticPosition::new(51.1, 17.03).unwrap();
        let err = sun_phenomenon_by_name(&site, "Moonrise", ymd(2025, 3, 16), &Utc).unwrap_err();
        assert!(matches!(err, AlmanacError::InvalidArgument(_)));
    }

    #[test]
    fn test_phenomenon_properties() {
        assert_eq!(SunPhenomenon::CivilDawn.zenith_deg(), 96.0);
        assert!(SunPhenomenon::Sunrise.is_rising());
        assert!(!SunPhenomenon::NauticalDusk.is_rising());
        assert_eq!(
            SunPhenomenon::AstronomicalDusk.fallback(),
            Some(SunPhenomenon::NauticalDusk)
        );
        assert_eq!(SunPhenomenon::CivilDusk.fallback(), None);
    }

    #[test]
    fn test_wroclaw_sunrise_sunset_hours() {
        // 2025-03-16, day 75: sunrise ≈ 05:05 UTC, sunset ≈ 16:58 UTC
        let rise = sun_event_utc_hour(75, 51.1, 17.03, 90.833, true).unwrap();
        let set = sun_event_utc_hour(75, 51.1, 17.03, 90.833, false).unwrap();
        assert!((rise - 5.079).abs() < 0.02, "sunrise {rise}");
        assert!((set - 16.960).abs() < 0.02, "sunset {set}");
    }

    #[test]
    fn test_twilight_brackets_sunrise() {
        let hours: Vec<f64> = [108.0, 102.0, 96.0, 90.833]
            .iter()
            .map(|z| sun_event_utc_hour(75, 51.1, 17.03, *z, true).unwrap())
            .collect();
        for pair in hours.windows(2) {
            assert!(pair[0] < pair[1], "dawn order {hours:?}");
        }
    }

    #[test]
    fn test_polar_summer_has_no_sunset() {
        // 70°N, solstice: the Sun stays above every threshold
        for zenith in [90.833, 96.0, 102.0, 108.0] {
            assert!(sun_event_utc_hour(172, 70.0, 19.0, zenith, false).is_none());
        }
    }

    #[test]
    fn test_equator_equinox_day_is_twelve_hours() {
        let date = ymd(2025, 3, 20);
        for lon in [-120.0, 0.0, 45.0, 150.0] {
            let site = GeodeticPosition::new(0.0, lon).unwrap();
            let zone = FixedOffset::east_opt((lon / 15.0 * 3600.0) as i32).unwrap();
            let rise = sun_phenomenon(&site, SunPhenomenon::Sunrise, date, &zone).unwrap();
            let set = sun_phenomenon(&site, SunPhenomenon::Sunset, date, &zone).unwrap();
            let (PhenomenonResult::Found(rise), PhenomenonResult::Found(set)) = (rise, set) else {
                panic!("equator events must exist at lon {lon}");
            };
            assert_eq!(rise.date_naive(), date);
            assert_eq!(set.date_naive(), date);
            // Refraction and solar radius lengthen the day by ~7 minutes
            let minutes = (set - rise).num_minutes();
            assert!((715..=735).contains(&minutes), "lon {lon}: {minutes} min");
            // Local solar noon ≈ 12:07 (equation of time in March)
            assert!((5..=6).contains(&rise.hour()), "lon {lon}: rise {rise}");
        }
    }

    #[test]
    fn test_result_map_and_instant() {
        let found: PhenomenonResult<i32> = PhenomenonResult::Found(3);
        assert_eq!(found.clone().map(|v| v * 2), PhenomenonResult::Found(6));
        assert_eq!(found.instant(), Some(&3));

        let fallback = PhenomenonResult::Fallback {
            instant: 4,
            phenomenon: SunPhenomenon::NauticalDawn,
        };
        assert_eq!(fallback.instant(), Some(&4));
        assert!(!fallback.is_absent());
        assert!(PhenomenonResult::<i32>::Absent.is_absent());
    }

    #[test]
    fn test_result_serializes_with_outcome_tag() {
        let absent: PhenomenonResult<String> = PhenomenonResult::Absent;
        assert_eq!(
            serde_json::to_string(&absent).unwrap(),
            r#"{"outcome":"absent"}"#
        );
        let fallback = PhenomenonResult::Fallback {
            instant: "02:37".to_string(),
            phenomenon: SunPhenomenon::NauticalDawn,
        };
        let json = serde_json::to_value(&fallback).unwrap();
        assert_eq!(json["outcome"], "fallback");
        assert_eq!(json["value"]["phenomenon"], "NauticalDawn");
    }
}
