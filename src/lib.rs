//! # Moon Almanac Core Library
//!
//! This library computes the sky quantities an observer cares about for a single
//! day at a single place: the Moon's phase and illumination, the clock times at
//! which the Moon rises and sets, and the Sun's rise, set and twilight times.
//!
//! ## Design Philosophy
//!
//! ### Low-Precision, Minute-Accurate
//! Positions come from truncated series (Meeus/Schlyter style) rather than a full
//! ephemeris. That is plenty for event timing to better than a minute and keeps
//! every calculation on the stack:
//! - **Moon**: Kepler orbit with the largest periodic perturbations
//! - **Sun**: closed-form NOAA almanac formula for hour-angle crossings
//!
//! ### Pure Functions
//! Every public operation is synchronous and side-effect free. There is no
//! shared mutable state, so independent days, places or phenomena can be
//! computed concurrently without locking.
//!
//! ### Time Scales
//! All ephemeris math is done on `DateTime<Utc>`. Public entry points accept any
//! `chrono::TimeZone` and convert at the boundary, so a non-UTC instant can never
//! reach the trigonometry.
//!
//! ## Data Flow
//! 1. **Window**: local calendar day → UTC scan window (-12 h .. +36 h)
//! 2. **Scan**: topocentric Moon altitude sampled every minute
//! 3. **Refine**: each horizon crossing bisected to ~1 second
//! 4. **Select**: crossings projected back to local time, first rise/set kept
//!
//! ## Core Types
//! - [`GeodeticPosition`]: observer latitude/longitude
//! - [`CartesianDirection`]: geocentric equatorial vector
//! - [`AltitudeSample`]: one altitude evaluation during a scan
//! - [`CrossingEvent`]: a refined horizon crossing

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Module declarations
pub mod altitude;
pub mod config;
pub mod crossing;
pub mod ephemeris;
pub mod error;
pub mod moon_events;
pub mod phase;
pub mod report;
pub mod sun_events;
pub mod time;

pub use error::AlmanacError;
pub use moon_events::{moon_rise_set, MoonRiseSet};
pub use phase::{moon_phase, MoonPhaseSample, PhaseName};
pub use sun_events::{sun_phenomenon, sun_phenomenon_by_name, PhenomenonResult, SunPhenomenon};

/// Observer location on a spherical Earth.
///
/// Latitude is north-positive in `[-90, 90]`, longitude east-positive in
/// `[-180, 180]`. Altitude above sea level is ignored by the low-precision
/// models.
///
/// # Example
/// ```
/// use moon_almanac_lib::GeodeticPosition;
///
/// let wroclaw = GeodeticPosition::new(51.1, 17.03).unwrap();
/// assert!(GeodeticPosition::new(91.0, 0.0).is_err());
/// # let _ = wroclaw;
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeodeticPosition {
    /// Latitude in degrees, north positive
    pub latitude_deg: f64,
    /// Longitude in degrees, east positive
    pub longitude_deg: f64,
}

impl GeodeticPosition {
    /// Build a validated position.
    pub fn new(latitude_deg: f64, longitude_deg: f64) -> Result<Self, AlmanacError> {
        let position = Self {
            latitude_deg,
            longitude_deg,
        };
        position.validate()?;
        Ok(position)
    }

    /// Check ranges. Fields are public, so every public operation re-validates.
    pub fn validate(&self) -> Result<(), AlmanacError> {
        if !self.latitude_deg.is_finite() || !(-90.0..=90.0).contains(&self.latitude_deg) {
            return Err(AlmanacError::InvalidArgument(format!(
                "latitude {} outside [-90, 90]",
                self.latitude_deg
            )));
        }
        if !self.longitude_deg.is_finite() || !(-180.0..=180.0).contains(&self.longitude_deg) {
            return Err(AlmanacError::InvalidArgument(format!(
                "longitude {} outside [-180, 180]",
                self.longitude_deg
            )));
        }
        Ok(())
    }
}

/// A 3-vector in the geocentric equatorial frame.
///
/// Units depend on the producer: Earth radii for the Moon, unit length for a
/// point on the Earth's surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CartesianDirection {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl CartesianDirection {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// `self - other`
    pub fn minus(&self, other: &Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

/// One altitude evaluation produced while scanning a window.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct AltitudeSample {
    /// Instant of the evaluation
    pub instant: DateTime<Utc>,
    /// Topocentric altitude of the body's centre, degrees in `[-90, 90]`
    pub altitude_deg: f64,
    /// Geocentric distance in Earth radii, when the model provides one
    pub distance_er: Option<f64>,
}

/// Which way a body crosses the horizon threshold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Rising,
    Setting,
}

/// A refined zero-crossing of `altitude - offset`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CrossingEvent {
    pub instant_utc: DateTime<Utc>,
    pub direction: Direction,
}
