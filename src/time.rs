//! Time-scale and angle helpers shared by the ephemeris and event solvers.
//!
//! UT is treated as UTC (the sub-second DUT1 difference is far below the
//! accuracy of the series used here) and no ΔT correction is applied.

use chrono::{DateTime, Utc};

/// Julian Date of the J2000.0 epoch (2000-01-01 12:00 TT).
pub const J2000_JD: f64 = 2_451_545.0;

/// Julian Date of the Unix epoch (1970-01-01 00:00 UTC).
const UNIX_EPOCH_JD: f64 = 2_440_587.5;

/// Julian Date of 2000 January 0.0 UT, the zero point of the orbital elements.
const ELEMENTS_EPOCH_JD: f64 = 2_451_543.5;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Julian Date of a UTC instant, including sub-second precision.
pub fn julian_date(instant: &DateTime<Utc>) -> f64 {
    let seconds =
        instant.timestamp() as f64 + f64::from(instant.timestamp_subsec_nanos()) * 1e-9;
    seconds / SECONDS_PER_DAY + UNIX_EPOCH_JD
}

/// Julian centuries elapsed since J2000.0.
pub fn julian_centuries(jd: f64) -> f64 {
    (jd - J2000_JD) / 36_525.0
}

/// Days since 2000 January 0.0 UT, the day number the orbital elements use.
pub fn elements_day_number(jd: f64) -> f64 {
    jd - ELEMENTS_EPOCH_JD
}

/// Greenwich Mean Sidereal Time in degrees, `[0, 360)` (IAU 1982 expression).
pub fn greenwich_sidereal_deg(jd: f64) -> f64 {
    let t = julian_centuries(jd);
    normalize_degrees(
        280.460_618_37 + 360.985_647_366_29 * (jd - J2000_JD) + 0.000_387_933 * t * t
            - t * t * t / 38_710_000.0,
    )
}

/// Wrap an angle into `[0, 360)`.
pub fn normalize_degrees(deg: f64) -> f64 {
    wrap(deg, 360.0)
}

/// Wrap an hour value into `[0, 24)`.
pub fn normalize_hours(hours: f64) -> f64 {
    wrap(hours, 24.0)
}

fn wrap(value: f64, period: f64) -> f64 {
    let r = value.rem_euclid(period);
    // rem_euclid rounds tiny negatives up to `period`
    if r >= period {
        0.0
    } else {
        r
    }
}
