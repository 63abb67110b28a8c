//! Topocentric altitude of the Moon.
//!
//! The observer sits on a unit sphere, the Moon a few dozen Earth radii away.
//! Subtracting the two vectors gives the line of sight from the observer, so
//! the ~1° lunar parallax is built into the altitude rather than applied as a
//! correction to the horizon threshold.

use crate::ephemeris::{observer_position, EphemerisProvider, KeplerMoon};
use crate::{AltitudeSample, GeodeticPosition};
use chrono::{DateTime, Utc};

/// Altitude of the Moon's centre above the observer's horizon.
///
/// The cosine is clamped to `[-1, 1]` before `acos`; rounding can push the
/// normalised dot product a hair past the domain when the Moon is near the
/// zenith or nadir.
pub fn topocentric_altitude<P>(
    provider: &P,
    instant: &DateTime<Utc>,
    observer: &GeodeticPosition,
) -> AltitudeSample
where
    P: EphemerisProvider + ?Sized,
{
    let moon = provider.moon_position(instant);
    let up = observer_position(instant, observer);

    let line_of_sight = moon.minus(&up);
    let distance = line_of_sight.norm();
    let cos_zenith = (line_of_sight.dot(&up) / distance).clamp(-1.0, 1.0);

    AltitudeSample {
        instant: *instant,
        altitude_deg: 90.0 - cos_zenith.acos().to_degrees(),
        distance_er: provider.provides_distance().then(|| moon.norm()),
    }
}

/// [`topocentric_altitude`] with the default Kepler ephemeris.
pub fn moon_altitude(instant: &DateTime<Utc>, observer: &GeodeticPosition) -> AltitudeSample {
    topocentric_altitude(&KeplerMoon, instant, observer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CartesianDirection;
    use chrono::{Duration, TimeZone};

    /// Moon parked at a fixed equatorial vector.
    struct FixedMoon(CartesianDirection);

    impl EphemerisProvider for FixedMoon {
        fn moon_position(&self, _instant: &DateTime<Utc>) -> CartesianDirection {
            self.0
        }

        fn provides_distance(&self) -> bool {
            false
        }
    }

    #[test]
    fn test_altitude_in_range_and_continuous() {
        let site = GeodeticPosition::new(51.1, 17.03).unwrap();
        let start = Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).unwrap();
        let mut previous = moon_altitude(&start, &site);
        for minute in 1..=2880 {
            let t = start + Duration::minutes(minute);
            let sample = moon_altitude(&t, &site);
            assert!((-90.0..=90.0).contains(&sample.altitude_deg));
            // Apparent motion never exceeds ~0.25°/min
            let jump = (sample.altitude_deg - previous.altitude_deg).abs();
            assert!(jump < 0.5, "jump of {jump}° at minute {minute}");
            previous = sample;
        }
    }

    #[test]
    fn test_polar_observer_sees_declination() {
        // From the north pole altitude equals declination, less parallax
        let pole = GeodeticPosition::new(90.0, 0.0).unwrap();
        let t = Utc.with_ymd_and_hms(2025, 3, 16, 0, 0, 0).unwrap();
        let moon = KeplerMoon.moon_position(&t);
        let declination = (moon.z / moon.norm()).asin().to_degrees();
        let sample = moon_altitude(&t, &pole);
        assert!(
            (sample.altitude_deg - declination).abs() < 1.1,
            "altitude {} vs declination {}",
            sample.altitude_deg,
            declination
        );
    }

    #[test]
    fn test_zenith_clamps_without_nan() {
        let site = GeodeticPosition::new(0.0, 0.0).unwrap();
        let t = Utc.with_ymd_and_hms(2025, 3, 16, 0, 0, 0).unwrap();
        let up = observer_position(&t, &site);
        let overhead = FixedMoon(CartesianDirection::new(up.x * 60.0, up.y * 60.0, up.z * 60.0));
        let sample = topocentric_altitude(&overhead, &t, &site);
        assert!(!sample.altitude_deg.is_nan());
        assert!((sample.altitude_deg - 90.0).abs() < 1e-4);
        assert!(sample.distance_er.is_none());
    }

    #[test]
    fn test_kepler_sample_reports_distance() {
        let site = GeodeticPosition::new(51.1, 17.03).unwrap();
        let t = Utc.with_ymd_and_hms(2025, 3, 16, 0, 0, 0).unwrap();
        let dist = moon_altitude(&t, &site).distance_er.unwrap();
        assert!((55.0..65.0).contains(&dist));
    }
}
