//! Low-precision lunar ephemeris (Kepler orbit + periodic perturbations)
//!
//! Mean orbital elements for the Moon and Sun follow Paul Schlyter's
//! "How to compute planetary positions" (elements referred to the equinox of
//! date). The Moon's osculating ellipse is solved for the eccentric anomaly,
//! rotated into ecliptic coordinates, and corrected by the dozen largest
//! perturbation terms (evection, variation, yearly equation, ...).
//!
//! Accuracy: a few arc-minutes in λ, β; ~0.1 Earth radii in Δ. At the Moon's
//! apparent speed (~0.5° per hour relative to the horizon) that is better
//! than a minute of rise/set timing.

use crate::time::{elements_day_number, greenwich_sidereal_deg, julian_date, normalize_degrees};
use crate::{CartesianDirection, GeodeticPosition};
use chrono::{DateTime, Utc};

/// Obliquity of the ecliptic, fixed at its J2000 value (no precession).
pub const OBLIQUITY_J2000_DEG: f64 = 23.4393;

/// Newton iterations for Kepler's equation. From the `M + e·sin M` seed six
/// steps reduce the error below 1e-7 rad for the Moon's e ≈ 0.055; the cap
/// keeps results reproducible instead of iterating to machine precision.
pub const KEPLER_ITERATIONS: u32 = 6;

/// Early-exit threshold for the eccentric-anomaly correction, radians.
pub const KEPLER_TOLERANCE_RAD: f64 = 1e-7;

/// Moon radius in Earth radii.
pub const MOON_RADIUS_ER: f64 = 0.2725;

/// Mean Earth–Moon distance (semi-major axis), Earth radii.
pub const MOON_MEAN_DISTANCE_ER: f64 = 60.2666;

const MOON_ECCENTRICITY: f64 = 0.054_900;
const MOON_INCLINATION_DEG: f64 = 5.1454;

/// Source of geocentric Moon positions.
///
/// Implementations must be pure functions of the instant.
pub trait EphemerisProvider {
    /// Geocentric equatorial position of the Moon, Earth radii.
    fn moon_position(&self, instant: &DateTime<Utc>) -> CartesianDirection;

    /// Whether the position's magnitude is a meaningful distance. Models
    /// that only produce a direction return `false`.
    fn provides_distance(&self) -> bool {
        true
    }
}

/// Geocentric ecliptic coordinates of date.
#[derive(Debug, Clone, Copy)]
pub struct EclipticCoordinates {
    /// Ecliptic longitude, degrees `[0, 360)`
    pub longitude_deg: f64,
    /// Ecliptic latitude, degrees
    pub latitude_deg: f64,
    /// Geocentric distance, Earth radii
    pub distance_er: f64,
}

/// Kepler-orbit Moon with Schlyter's perturbation series.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeplerMoon;

impl KeplerMoon {
    /// Ecliptic longitude, latitude and distance of the Moon.
    pub fn ecliptic_position(&self, instant: &DateTime<Utc>) -> EclipticCoordinates {
        let d = elements_day_number(julian_date(instant));

        // ---------- 1. Mean elements (degrees, Earth radii) ----------
        let node = normalize_degrees(125.1228 - 0.052_953_808_3 * d);
        let perigee = normalize_degrees(318.0634 + 0.164_357_322_3 * d);
        let mean_anomaly = normalize_degrees(115.3654 + 13.064_992_950_9 * d);

        let sun_perihelion = 282.9404 + 4.709_35e-5 * d;
        let sun_anomaly = normalize_degrees(356.0470 + 0.985_600_258_5 * d);

        // ---------- 2. Position in the orbital plane ----------
        let e = MOON_ECCENTRICITY;
        let ecc = eccentric_anomaly(mean_anomaly.to_radians(), e);
        let xv = MOON_MEAN_DISTANCE_ER * (ecc.cos() - e);
        let yv = MOON_MEAN_DISTANCE_ER * (1.0 - e * e).sqrt() * ecc.sin();
        let true_anomaly = yv.atan2(xv);
        let r = xv.hypot(yv);

        // ---------- 3. Rotate by node, inclination, perigee ----------
        let (sin_n, cos_n) = node.to_radians().sin_cos();
        let (sin_i, cos_i) = MOON_INCLINATION_DEG.to_radians().sin_cos();
        let (sin_u, cos_u) = (true_anomaly + perigee.to_radians()).sin_cos();
        let xh = r * (cos_n * cos_u - sin_n * sin_u * cos_i);
        let yh = r * (sin_n * cos_u + cos_n * sin_u * cos_i);
        let zh = r * sin_u * sin_i;

        let mut lon = yh.atan2(xh).to_degrees();
        let mut lat = zh.atan2(xh.hypot(yh)).to_degrees();
        let mut dist = r;

        // ---------- 4. Periodic perturbations ----------
        let sun_lon = sun_anomaly + sun_perihelion;
        let moon_lon = mean_anomaly + perigee + node;
        let elong = moon_lon - sun_lon; // D
        let arg_lat = moon_lon - node; // F
        let mm = mean_anomaly;
        let ms = sun_anomaly;

        lon += -1.274 * sin_deg(mm - 2.0 * elong) // evection
            + 0.658 * sin_deg(2.0 * elong) // variation
            - 0.186 * sin_deg(ms) // yearly equation
            - 0.059 * sin_deg(2.0 * mm - 2.0 * elong)
            - 0.057 * sin_deg(mm - 2.0 * elong + ms)
            + 0.053 * sin_deg(mm + 2.0 * elong)
            + 0.046 * sin_deg(2.0 * elong - ms)
            + 0.041 * sin_deg(mm - ms)
            - 0.035 * sin_deg(elong) // parallactic equation
            - 0.031 * sin_deg(mm + ms)
            - 0.015 * sin_deg(2.0 * arg_lat - 2.0 * elong)
            + 0.011 * sin_deg(mm - 4.0 * elong);

        lat += -0.173 * sin_deg(arg_lat - 2.0 * elong)
            - 0.055 * sin_deg(mm - arg_lat - 2.0 * elong)
            - 0.046 * sin_deg(mm + arg_lat - 2.0 * elong)
            + 0.033 * sin_deg(arg_lat + 2.0 * elong)
            + 0.017 * sin_deg(2.0 * mm + arg_lat);

        dist += -0.58 * cos_deg(mm - 2.0 * elong) - 0.46 * cos_deg(2.0 * elong);

        EclipticCoordinates {
            longitude_deg: normalize_degrees(lon),
            latitude_deg: lat,
            distance_er: dist,
        }
    }
}

impl EphemerisProvider for KeplerMoon {
    fn moon_position(&self, instant: &DateTime<Utc>) -> CartesianDirection {
        let ecl = self.ecliptic_position(instant);
        let (sin_lon, cos_lon) = ecl.longitude_deg.to_radians().sin_cos();
        let (sin_lat, cos_lat) = ecl.latitude_deg.to_radians().sin_cos();
        let ecliptic = CartesianDirection::new(
            ecl.distance_er * cos_lon * cos_lat,
            ecl.distance_er * sin_lon * cos_lat,
            ecl.distance_er * sin_lat,
        );
        ecliptic_to_equatorial(&ecliptic)
    }
}

/// Solve Kepler's equation `E - e·sin E = M` by Newton refinement.
///
/// Runs at most [`KEPLER_ITERATIONS`] steps, stopping early once a step is
/// smaller than [`KEPLER_TOLERANCE_RAD`].
pub fn eccentric_anomaly(mean_anomaly_rad: f64, eccentricity: f64) -> f64 {
    let m = mean_anomaly_rad;
    let e = eccentricity;
    let mut ecc = m + e * m.sin() * (1.0 + e * m.cos());
    for _ in 0..KEPLER_ITERATIONS {
        let step = (ecc - e * ecc.sin() - m) / (1.0 - e * ecc.cos());
        ecc -= step;
        if step.abs() < KEPLER_TOLERANCE_RAD {
            break;
        }
    }
    ecc
}

/// Rotate ecliptic rectangular coordinates into the equatorial frame.
pub fn ecliptic_to_equatorial(v: &CartesianDirection) -> CartesianDirection {
    let (sin_eps, cos_eps) = OBLIQUITY_J2000_DEG.to_radians().sin_cos();
    CartesianDirection::new(
        v.x,
        v.y * cos_eps - v.z * sin_eps,
        v.y * sin_eps + v.z * cos_eps,
    )
}

/// Observer's position on a spherical Earth of radius 1.
///
/// The same vector is the observer's local "up" direction.
pub fn observer_position(instant: &DateTime<Utc>, observer: &GeodeticPosition) -> CartesianDirection {
    let sidereal = greenwich_sidereal_deg(julian_date(instant)) + observer.longitude_deg;
    let (sin_th, cos_th) = sidereal.to_radians().sin_cos();
    let (sin_lat, cos_lat) = observer.latitude_deg.to_radians().sin_cos();
    CartesianDirection::new(cos_lat * cos_th, cos_lat * sin_th, sin_lat)
}

fn sin_deg(deg: f64) -> f64 {
    deg.to_radians().sin()
}

fn cos_deg(deg: f64) -> f64 {
    deg.to_radians().cos()
}
