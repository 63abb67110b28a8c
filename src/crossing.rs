//! # Horizon-Crossing Solver
//!
//! Finds the instants at which a body's altitude crosses a (possibly
//! time-varying) threshold inside a UTC window.
//!
//! ## Algorithm
//! 1. **Scan**: sample the altitude every [`SCAN_STEP_SECONDS`] across the window
//! 2. **Detect**: a sign change of `altitude - offset` between two samples
//!    brackets a crossing. Non-positive → positive is *rising*, non-negative →
//!    negative is *setting*. A sample exactly on the threshold therefore counts
//!    as "below" for the rising test and "above" for the setting test; this
//!    asymmetry decides which single event a grazing tangency produces.
//! 3. **Refine**: bisect each one-minute bracket [`BISECTION_ITERATIONS`] times
//!    and report the left end of the final bracket
//!
//! ## Precision
//! Six halvings of 60 s leave a 0.94 s bracket, so the reported instant is at
//! most ~1 s before the true crossing. The counts are fixed on purpose:
//! changing them changes published times.
//!
//! ## Cost
//! A 48-hour window is 2 880 scan evaluations plus 7 per crossing. An
//! optional deadline is checked before every scan evaluation, never inside
//! one.

use crate::ephemeris::{MOON_MEAN_DISTANCE_ER, MOON_RADIUS_ER};
use crate::{AlmanacError, AltitudeSample, CrossingEvent, Direction};
use chrono::{DateTime, Duration, Utc};
use log::debug;
use std::time::Instant;

/// Scan cadence.
pub const SCAN_STEP_SECONDS: i64 = 60;

/// Bisection steps per bracket (60 s / 2^6 ≈ 0.94 s).
pub const BISECTION_ITERATIONS: u32 = 6;

/// Standard horizontal refraction, degrees (34 arc-minutes).
pub const STANDARD_REFRACTION_DEG: f64 = 0.5667;

/// Tunables for a rise/set scan.
#[derive(Debug, Clone, Copy)]
pub struct ScanOptions {
    /// Refraction at the horizon, degrees
    pub refraction_deg: f64,
    /// Abandon the scan once this instant passes
    pub deadline: Option<Instant>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions {
            refraction_deg: STANDARD_REFRACTION_DEG,
            deadline: None,
        }
    }
}

/// Half-open UTC interval to scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Angular radius of the Moon seen from `distance_er` Earth radii, degrees.
///
/// `asin(R_moon / Δ)` with `R_moon` = 0.2725 Earth radii: ~0.26° at mean
/// distance.
pub fn lunar_semidiameter_deg(distance_er: f64) -> f64 {
    (MOON_RADIUS_ER / distance_er).asin().to_degrees()
}

/// Altitude of the Moon's centre at the instant its upper limb touches the
/// refracted horizon.
#[derive(Debug, Clone, Copy)]
pub struct HorizonOffset {
    pub refraction_deg: f64,
}

impl HorizonOffset {
    /// Threshold for `sample`, degrees (negative: centre below the horizon).
    ///
    /// Falls back to the mean distance when the ephemeris gave none.
    pub fn at(&self, sample: &AltitudeSample) -> f64 {
        let distance = sample.distance_er.unwrap_or(MOON_MEAN_DISTANCE_ER);
        -(self.refraction_deg + lunar_semidiameter_deg(distance))
    }
}

/// Scan `window` and return every refined crossing, ordered by time.
///
/// `altitude` evaluates the body; `offset` gives the threshold for a sample.
pub fn find_crossings<A, O>(
    window: &ScanWindow,
    altitude: A,
    offset: O,
    deadline: Option<Instant>,
) -> Result<Vec<CrossingEvent>, AlmanacError>
where
    A: Fn(&DateTime<Utc>) -> AltitudeSample,
    O: Fn(&AltitudeSample) -> f64,
{
    let step = Duration::seconds(SCAN_STEP_SECONDS);
    let mut evaluations = 0usize;
    let mut crossings = Vec::new();

    check_deadline(deadline, evaluations)?;
    let first = altitude(&window.start);
    evaluations += 1;

    let mut prev_time = window.start;
    let mut prev_diff = first.altitude_deg - offset(&first);

    loop {
        let time = prev_time + step;
        if time > window.end {
            break;
        }

        check_deadline(deadline, evaluations)?;
        let sample = altitude(&time);
        evaluations += 1;
        let diff = sample.altitude_deg - offset(&sample);

        let direction = if prev_diff <= 0.0 && diff > 0.0 {
            Some(Direction::Rising)
        } else if prev_diff >= 0.0 && diff < 0.0 {
            Some(Direction::Setting)
        } else {
            None
        };

        if let Some(direction) = direction {
            let instant_utc = refine_crossing(prev_time, time, &altitude, &offset);
            debug!("{direction:?} crossing bracketed at {prev_time}, refined to {instant_utc}");
            crossings.push(CrossingEvent {
                instant_utc,
                direction,
            });
        }

        prev_time = time;
        prev_diff = diff;
    }

    Ok(crossings)
}

/// Narrow `[left, right]` around the threshold crossing by bisection.
///
/// Returns the left end after [`BISECTION_ITERATIONS`] halvings.
pub fn refine_crossing<A, O>(
    mut left: DateTime<Utc>,
    mut right: DateTime<Utc>,
    altitude: &A,
    offset: &O,
) -> DateTime<Utc>
where
    A: Fn(&DateTime<Utc>) -> AltitudeSample,
    O: Fn(&AltitudeSample) -> f64,
{
    let diff = |t: &DateTime<Utc>| {
        let sample = altitude(t);
        sample.altitude_deg - offset(&sample)
    };
    let mut left_diff = diff(&left);
    for _ in 0..BISECTION_ITERATIONS {
        let mid = left + (right - left) / 2;
        let mid_diff = diff(&mid);

        if left_diff * mid_diff <= 0.0 {
            right = mid;
        } else {
            left = mid;
            left_diff = mid_diff;
        }
    }
    left
}

fn check_deadline(deadline: Option<Instant>, evaluations: usize) -> Result<(), AlmanacError> {
    match deadline {
        Some(deadline) if Instant::now() >= deadline => {
            Err(AlmanacError::DeadlineExceeded { evaluations })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::cell::Cell;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 16, 12, 0, 0).unwrap()
    }

    /// Altitude climbing one degree per minute through zero at `t0`.
    fn linear(t: &DateTime<Utc>) -> AltitudeSample {
        AltitudeSample {
            instant: *t,
            altitude_deg: (*t - t0()).num_milliseconds() as f64 / 60_000.0,
            distance_er: None,
        }
    }

    fn zero(_: &AltitudeSample) -> f64 {
        0.0
    }

    #[test]
    fn test_linear_rise_is_refined_to_a_second() {
        let start = t0() - Duration::seconds(10 * 60 + 17);
        let window = ScanWindow {
            start,
            end: start + Duration::minutes(30),
        };
        let crossings = find_crossings(&window, linear, zero, None).unwrap();
        assert_eq!(crossings.len(), 1);
        assert_eq!(crossings[0].direction, Direction::Rising);

        let lead = (t0() - crossings[0].instant_utc).num_milliseconds();
        assert!((0..1000).contains(&lead), "reported {lead} ms before root");
    }

    #[test]
    fn test_sinusoid_alternates_directions_in_order() {
        let start = t0();
        let wave = move |t: &DateTime<Utc>| {
            let hours = (*t - start).num_seconds() as f64 / 3600.0;
            AltitudeSample {
                instant: *t,
                altitude_deg: 40.0 * (hours / 24.0 * std::f64::consts::TAU + 0.3).sin(),
                distance_er: None,
            }
        };
        let window = ScanWindow {
            start,
            end: start + Duration::hours(48),
        };
        let crossings = find_crossings(&window, wave, |_: &AltitudeSample| -0.8, None).unwrap();
        assert_eq!(crossings.len(), 4);
        for pair in crossings.windows(2) {
            assert!(pair[0].instant_utc < pair[1].instant_utc);
            assert_ne!(pair[0].direction, pair[1].direction);
        }
        assert_eq!(crossings[0].direction, Direction::Setting);
    }

    #[test]
    fn test_tangency_from_below_reports_single_setting() {
        // Samples -1, 0, -1: equal counts as "above" for the setting test
        let peak = t0();
        let tent = move |t: &DateTime<Utc>| AltitudeSample {
            instant: *t,
            altitude_deg: -((*t - peak).num_milliseconds() as f64 / 60_000.0).abs(),
            distance_er: None,
        };
        let window = ScanWindow {
            start: peak - Duration::minutes(5),
            end: peak + Duration::minutes(5),
        };
        let crossings = find_crossings(&window, tent, zero, None).unwrap();
        assert_eq!(crossings.len(), 1);
        assert_eq!(crossings[0].direction, Direction::Setting);
        assert_eq!(crossings[0].instant_utc, peak);
    }

    #[test]
    fn test_tangency_from_above_reports_single_rising() {
        let trough = t0();
        let valley = move |t: &DateTime<Utc>| AltitudeSample {
            instant: *t,
            altitude_deg: ((*t - trough).num_milliseconds() as f64 / 60_000.0).abs(),
            distance_er: None,
        };
        let window = ScanWindow {
            start: trough - Duration::minutes(5),
            end: trough + Duration::minutes(5),
        };
        let crossings = find_crossings(&window, valley, zero, None).unwrap();
        assert_eq!(crossings.len(), 1);
        assert_eq!(crossings[0].direction, Direction::Rising);
    }

    #[test]
    fn test_refinement_is_stable_on_converged_bracket() {
        let start = t0() - Duration::seconds(10 * 60 + 41);
        let window = ScanWindow {
            start,
            end: start + Duration::minutes(20),
        };
        let crossing = find_crossings(&window, linear, zero, None).unwrap()[0].instant_utc;
        let again = refine_crossing(crossing, crossing + Duration::seconds(1), &linear, &zero);
        assert!((again - crossing).num_milliseconds().abs() <= 1000);
    }

    #[test]
    fn test_refinement_evaluates_once_per_halving() {
        let calls = Cell::new(0u32);
        let counted = |t: &DateTime<Utc>| {
            calls.set(calls.get() + 1);
            linear(t)
        };
        let left = t0() - Duration::seconds(37);
        let refined = refine_crossing(left, left + Duration::minutes(1), &counted, &zero);
        assert_eq!(calls.get(), BISECTION_ITERATIONS + 1);

        // Same answer as re-evaluating the left end every step
        let lead = (t0() - refined).num_milliseconds();
        assert!((0..1000).contains(&lead), "reported {lead} ms before root");
    }

    #[test]
    fn test_expired_deadline_aborts_before_evaluating() {
        let window = ScanWindow {
            start: t0(),
            end: t0() + Duration::hours(1),
        };
        let deadline = Some(Instant::now());
        match find_crossings(&window, linear, zero, deadline) {
            Err(AlmanacError::DeadlineExceeded { evaluations }) => assert_eq!(evaluations, 0),
            other => panic!("expected deadline error, got {other:?}"),
        }
    }

    #[test]
    fn test_lunar_horizon_offset() {
        let sd = lunar_semidiameter_deg(MOON_MEAN_DISTANCE_ER);
        assert!((sd - 0.259).abs() < 0.002, "semidiameter {sd}");

        let offset = HorizonOffset {
            refraction_deg: STANDARD_REFRACTION_DEG,
        };
        let near = AltitudeSample {
            instant: t0(),
            altitude_deg: 0.0,
            distance_er: Some(56.0),
        };
        let far = AltitudeSample {
            distance_er: Some(64.0),
            ..near
        };
        let unknown = AltitudeSample {
            distance_er: None,
            ..near
        };
        // Closer Moon is larger, so its centre must sink further
        assert!(offset.at(&near) < offset.at(&far));
        assert!((offset.at(&unknown) + STANDARD_REFRACTION_DEG + sd).abs() < 1e-12);
    }
}
