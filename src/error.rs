//! Error taxonomy for almanac operations.
//!
//! Only genuine faults live here. A phenomenon that simply does not happen on
//! the requested day (polar night, a moonless day) is an ordinary value:
//! `None` for moon events, [`PhenomenonResult::Absent`](crate::PhenomenonResult)
//! or `Fallback` for the Sun.

use std::io;
use thiserror::Error;

/// Errors returned by the almanac library.
#[derive(Error, Debug)]
pub enum AlmanacError {
    /// Caller supplied something the operation cannot interpret
    /// (unknown phenomenon or time-zone name, out-of-range coordinates).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The optional scan deadline elapsed before the window was covered.
    #[error("scan deadline exceeded after {evaluations} altitude evaluations")]
    DeadlineExceeded { evaluations: usize },

    /// Configuration file could not be written.
    #[error("config IO: {0}")]
    Io(#[from] io::Error),

    /// Configuration could not be encoded as TOML.
    #[error("config encode: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),
}
