//! Moon phase & illumination from the mean synodic cycle
//!
//! Age is measured from the mean new moon of 2000-01-06 (Meeus ch. 49, k = 0)
//! in units of the mean synodic month. Illumination follows from the phase
//! angle of a uniformly moving Moon: `(1 - cos 2πf) / 2`.
//! Accuracy: true new/full moons wander up to ~14 h around the mean ones, so
//! age is good to about half a day; illumination to a few percent.

use crate::time::julian_date;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use std::fmt;

/// Mean synodic month, days.
pub const SYNODIC_MONTH_DAYS: f64 = 29.530_588_2;

/// Julian Date of the mean new moon of 2000 January 6.
const NEW_MOON_EPOCH_JD: f64 = 2_451_550.097_66;

/// Eight named bands of the lunar cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhaseName {
    New,
    WaxingCrescent,
    FirstQuarter,
    WaxingGibbous,
    Full,
    WaningGibbous,
    LastQuarter,
    WaningCrescent,
}

impl PhaseName {
    /// Bucket a cycle fraction `f` in `[0, 1)`.
    pub fn from_fraction(f: f64) -> Self {
        match f {
            f if !(0.03..=0.97).contains(&f) => PhaseName::New,
            f if f < 0.22 => PhaseName::WaxingCrescent,
            f if f < 0.28 => PhaseName::FirstQuarter,
            f if f < 0.47 => PhaseName::WaxingGibbous,
            f if f < 0.53 => PhaseName::Full,
            f if f < 0.72 => PhaseName::WaningGibbous,
            f if f < 0.78 => PhaseName::LastQuarter,
            _ => PhaseName::WaningCrescent,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PhaseName::New => "New Moon",
            PhaseName::WaxingCrescent => "Waxing Crescent",
            PhaseName::FirstQuarter => "First Quarter",
            PhaseName::WaxingGibbous => "Waxing Gibbous",
            PhaseName::Full => "Full Moon",
            PhaseName::WaningGibbous => "Waning Gibbous",
            PhaseName::LastQuarter => "Last Quarter",
            PhaseName::WaningCrescent => "Waning Crescent",
        }
    }
}

impl fmt::Display for PhaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Phase of the Moon at one instant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MoonPhaseSample {
    /// Instant the sample describes (UTC)
    pub instant: DateTime<Utc>,
    /// Days since the last mean new moon, `[0, synodic month)`
    pub age_days: f64,
    /// Fraction of the cycle elapsed, `[0, 1)`
    pub phase_fraction: f64,
    /// Illuminated fraction of the disc, `[0, 1]`
    pub illuminated_fraction: f64,
    pub phase_name: PhaseName,
}

/// Phase, age and illumination of the Moon at `instant` (any zone).
pub fn moon_phase<Tz: TimeZone>(instant: &DateTime<Tz>) -> MoonPhaseSample {
    let instant = instant.with_timezone(&Utc);
    let cycles = (julian_date(&instant) - NEW_MOON_EPOCH_JD) / SYNODIC_MONTH_DAYS;
    let mut fraction = cycles - cycles.floor();
    if fraction >= 1.0 {
        fraction = 0.0;
    }

    MoonPhaseSample {
        instant,
        age_days: fraction * SYNODIC_MONTH_DAYS,
        phase_fraction: fraction,
        illuminated_fraction: ((1.0 - (TAU * fraction).cos()) / 2.0).clamp(0.0, 1.0),
        phase_name: PhaseName::from_fraction(fraction),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset};

    #[test]
    fn test_band_thresholds() {
        assert_eq!(PhaseName::from_fraction(0.0), PhaseName::New);
        assert_eq!(PhaseName::from_fraction(0.029), PhaseName::New);
        assert_eq!(PhaseName::from_fraction(0.03), PhaseName::WaxingCrescent);
        assert_eq!(PhaseName::from_fraction(0.22), PhaseName::FirstQuarter);
        assert_eq!(PhaseName::from_fraction(0.28), PhaseName::WaxingGibbous);
        assert_eq!(PhaseName::from_fraction(0.47), PhaseName::Full);
        assert_eq!(PhaseName::from_fraction(0.53), PhaseName::WaningGibbous);
        assert_eq!(PhaseName::from_fraction(0.72), PhaseName::LastQuarter);
        assert_eq!(PhaseName::from_fraction(0.78), PhaseName::WaningCrescent);
        assert_eq!(PhaseName::from_fraction(0.97), PhaseName::WaningCrescent);
        assert_eq!(PhaseName::from_fraction(0.975), PhaseName::New);
    }

    #[test]
    fn test_known_full_and_new_moons() {
        // Full moon 2025-03-14 06:55 UTC
        let full = moon_phase(&Utc.with_ymd_and_hms(2025, 3, 14, 6, 55, 0).unwrap());
        assert_eq!(full.phase_name, PhaseName::Full);
        assert!(full.illuminated_fraction > 0.99);
        assert!((full.age_days - 14.77).abs() < 0.5, "age {}", full.age_days);

        // New moon 2025-03-29 10:58 UTC
        let new = moon_phase(&Utc.with_ymd_and_hms(2025, 3, 29, 10, 58, 0).unwrap());
        assert_eq!(new.phase_name, PhaseName::New);
        assert!(new.illuminated_fraction < 0.01);
    }

    #[test]
    fn test_illumination_is_periodic() {
        let t = Utc.with_ymd_and_hms(2025, 3, 16, 12, 0, 0).unwrap();
        let month = Duration::milliseconds((SYNODIC_MONTH_DAYS * 86_400_000.0).round() as i64);
        let a = moon_phase(&t);
        let b = moon_phase(&(t + month));
        assert!((a.illuminated_fraction - b.illuminated_fraction).abs() < 1e-6);
        assert!((a.age_days - b.age_days).abs() < 1e-4);
    }

    #[test]
    fn test_zone_does_not_change_result() {
        let utc = Utc.with_ymd_and_hms(2025, 3, 16, 12, 0, 0).unwrap();
        let warsaw = utc.with_timezone(&FixedOffset::east_opt(3600).unwrap());
        let a = moon_phase(&utc);
        let b = moon_phase(&warsaw);
        assert_eq!(a.instant, b.instant);
        assert_eq!(a.age_days, b.age_days);
    }

    #[test]
    fn test_fields_stay_in_range() {
        let start = Utc.with_ymd_and_hms(1999, 12, 1, 0, 0, 0).unwrap();
        for step in 0..400 {
            let sample = moon_phase(&(start + Duration::hours(step * 7)));
            assert!((0.0..SYNODIC_MONTH_DAYS).contains(&sample.age_days));
            assert!((0.0..=1.0).contains(&sample.illuminated_fraction));
            assert!((0.0..1.0).contains(&sample.phase_fraction));
        }
    }
}
