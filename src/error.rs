//! # Error Types
//!
//! Failures are split by who can do something about them:
//!
//! - [`ForecastError::Fetch`]: the upstream service could not be reached or
//!   answered with an error status. Callers may retry; the core never does.
//! - [`ForecastError::NoData`]: the service answered but had nothing for the
//!   location and window. Shown to users as "no data for this location".
//! - [`ForecastError::Data`]: the service answered with something we cannot
//!   use. Not recoverable.
//!
//! Missing daylight for a single date is not an error at all: samples on that
//! date are simply never safe.

use thiserror::Error;

/// Errors that can occur while producing a forecast.
#[derive(Error, Debug)]
pub enum ForecastError {
    /// HTTP request failed (network, timeout, or error status)
    #[error("fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    /// Upstream returned no tide extremes or no daylight entries
    #[error("no {what} for location {location}")]
    NoData {
        location: String,
        what: &'static str,
    },

    /// Upstream data was malformed or inconsistent
    #[error("bad forecast data: {0}")]
    Data(#[from] DataError),

    /// Client configuration is unusable
    #[error("configuration: {0}")]
    Config(String),
}

/// Malformed or inconsistent upstream data.
#[derive(Error, Debug, PartialEq)]
pub enum DataError {
    /// An extreme is earlier than the one before it
    #[error("tide extremes out of order: {next} follows {previous}")]
    NonMonotonic { previous: String, next: String },

    /// Heights are not in metres
    #[error("unsupported height units: {0}")]
    Units(String),

    /// Timestamp could not be parsed or does not exist in the local zone
    #[error("bad timestamp: {0}")]
    Timestamp(String),

    /// Unknown IANA time-zone name
    #[error("unknown time zone: {0}")]
    TimeZone(String),

    /// Tide type is neither low nor high
    #[error("unknown tide type: {0}")]
    TideType(String),

    /// Response body does not have the expected shape
    #[error("decode: {0}")]
    Decode(String),

    /// No samples could be produced
    #[error("no tide samples")]
    Empty,
}

impl From<serde_json::Error> for DataError {
    fn from(err: serde_json::Error) -> Self {
        DataError::Decode(err.to_string())
    }
}
