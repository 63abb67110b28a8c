//! # Configuration Management
//!
//! This module loads the observer location and almanac settings from
//! `moon-almanac.toml`. The time zone is part of the configuration: nothing
//! in the library consults the host's local zone.

use crate::crossing::{ScanOptions, STANDARD_REFRACTION_DEG};
use crate::{AlmanacError, GeodeticPosition, SunPhenomenon};
use chrono_tz::Tz;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "moon-almanac.toml";

/// Application configuration loaded from moon-almanac.toml
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Where the sky is observed from
    pub observer: ObserverConfig,
    /// Calculation settings
    #[serde(default)]
    pub almanac: AlmanacConfig,
}

/// Observer location and civil time zone
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObserverConfig {
    /// Human-readable place name for the report header
    pub name: String,
    /// Latitude in degrees, north positive
    pub latitude: f64,
    /// Longitude in degrees, east positive
    pub longitude: f64,
    /// IANA time zone name (e.g. "Europe/Warsaw")
    pub timezone: String,
}

/// Calculation settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AlmanacConfig {
    /// Horizon refraction used for moonrise/moonset, degrees
    pub horizon_refraction_deg: f64,
    /// Give up on a rise/set scan after this many milliseconds
    pub scan_deadline_ms: Option<u64>,
    /// Solar phenomena to include in the report
    pub phenomena: Vec<SunPhenomenon>,
}

impl Default for AlmanacConfig {
    fn default() -> Self {
        AlmanacConfig {
            horizon_refraction_deg: STANDARD_REFRACTION_DEG,
            scan_deadline_ms: None,
            phenomena: SunPhenomenon::ALL.to_vec(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            observer: ObserverConfig {
                name: "Wrocław".to_string(),
                latitude: 51.1,
                longitude: 17.03,
                timezone: "Europe/Warsaw".to_string(),
            },
            almanac: AlmanacConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from moon-almanac.toml
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    info!("Loaded configuration for observer: {}", config.observer.name);
                    config
                }
                Err(e) => {
                    warn!("Invalid config file format in {}: {}", path.display(), e);
                    warn!("Using default configuration (Wrocław)");
                    Self::default()
                }
            },
            Err(_) => {
                info!("No config file at {}, using default configuration (Wrocław)", path.display());
                Self::default()
            }
        }
    }

    /// Save current configuration to `path` as pretty TOML
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), AlmanacError> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path.as_ref(), contents)?;
        info!("Configuration saved to {}", path.as_ref().display());
        Ok(())
    }

    /// Validated observer position.
    pub fn position(&self) -> Result<GeodeticPosition, AlmanacError> {
        GeodeticPosition::new(self.observer.latitude, self.observer.longitude)
    }

    /// Parsed time zone.
    pub fn timezone(&self) -> Result<Tz, AlmanacError> {
        self.observer.timezone.parse::<Tz>().map_err(|_| {
            AlmanacError::InvalidArgument(format!(
                "unknown time zone '{}'",
                self.observer.timezone
            ))
        })
    }

    /// Scan options with the deadline measured from `now`.
    pub fn scan_options(&self, now: Instant) -> ScanOptions {
        ScanOptions {
            refraction_deg: self.almanac.horizon_refraction_deg,
            deadline: self
                .almanac
                .scan_deadline_ms
                .map(|ms| now + Duration::from_millis(ms)),
        }
    }
}
