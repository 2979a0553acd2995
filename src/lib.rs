//! # Tread Lightly Core Library
//!
//! This library computes turtle-friendly beach driving windows from tide and
//! daylight forecasts. Driving is safer for nesting turtles and hatchlings when
//! it happens near low tide and between dawn and dusk.
//!
//! ## Data Flow
//!
//! The pipeline is strictly forward and recomputed for every request:
//!
//! 1. **Fetch**: [`willy_weather`] downloads high/low tide extremes and
//!    first/last light times for one location (optionally from its cache)
//! 2. **Interpolate**: [`interpolate`] fills one sample per minute between
//!    consecutive extremes with a half-cosine curve
//! 3. **Classify**: [`safety`] assigns each sample its governing low tide and
//!    marks it safe when it is near that low and in daylight
//! 4. **Reduce**: [`windows`] computes the earliest and latest safe minute of
//!    every low tide, rounded inwards to 5 minutes
//! 5. **Assemble**: [`forecast`] trims the samples to whole day/night cycles and
//!    packages them with the location and daylight table
//!
//! The interpolation, classification, reduction and assembly stages are pure
//! and synchronous. All network I/O happens before they run.
//!
//! ## Core Types
//!
//! - [`TideExtreme`]: a reported high or low tide
//! - [`DaylightWindow`]: first and last light for one calendar date
//! - [`TideSample`]: one minute of the computed curve, enriched in place as it
//!   moves through the pipeline
//! - [`SafeWindow`]: the rounded safe range around one low tide

use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

// Module declarations
pub mod config;
pub mod error;
pub mod forecast;
pub mod interpolate;
pub mod renderer;
pub mod safety;
pub mod willy_weather;
pub mod windows;

pub use error::{DataError, ForecastError};
pub use forecast::{assemble, Forecast, RawForecast};

/// What a sample on the tide curve represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TideKind {
    /// Reported low tide
    Low,
    /// Reported high tide
    High,
    /// Computed height between two reported extremes
    Interpolated,
}

impl TideKind {
    /// Parse the tide type used by the upstream API (`"low"` or `"high"`).
    pub fn from_wire(value: &str) -> Result<Self, DataError> {
        match value {
            "low" => Ok(TideKind::Low),
            "high" => Ok(TideKind::High),
            other => Err(DataError::TideType(other.to_string())),
        }
    }

    /// True for reported extremes, false for interpolated samples.
    pub fn is_extreme(self) -> bool {
        !matches!(self, TideKind::Interpolated)
    }
}

/// A reported high or low tide.
///
/// Extremes arrive ordered by time and normally alternate low/high, although
/// the alternation is not enforced anywhere.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TideExtreme {
    /// Local time of the extreme
    pub time: DateTime<Tz>,
    /// Height in metres
    pub height: f64,
    /// `Low` or `High`
    pub kind: TideKind,
}

/// First and last light for one calendar date.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DaylightWindow {
    /// Local calendar date, taken from `dawn`
    pub date: NaiveDate,
    /// First light
    pub dawn: DateTime<Tz>,
    /// Last light
    pub dusk: DateTime<Tz>,
}

impl DaylightWindow {
    /// Build a window dated by its dawn.
    pub fn new(dawn: DateTime<Tz>, dusk: DateTime<Tz>) -> Self {
        DaylightWindow {
            date: dawn.date_naive(),
            dawn,
            dusk,
        }
    }

    /// True when `time` lies between dawn and dusk, both inclusive.
    pub fn contains(&self, time: DateTime<Tz>) -> bool {
        self.dawn <= time && time <= self.dusk
    }
}

/// One minute of the computed tide curve.
///
/// Samples are created by [`interpolate::interpolate`] with only `time`,
/// `height` and `kind` meaningful. [`safety::classify`] then fills
/// `governing_low`, `is_safe`, `dawn` and `dusk`, and [`windows::reduce`]
/// fills `safe_start` and `safe_end`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TideSample {
    /// Local time at minute resolution
    pub time: DateTime<Tz>,
    /// Height in metres
    pub height: f64,
    /// Reported extreme or interpolated
    pub kind: TideKind,
    /// Time of the low tide this sample is judged against
    pub governing_low: DateTime<Tz>,
    /// Near the governing low and in daylight
    pub is_safe: bool,
    /// Local calendar date of `time`
    pub day: NaiveDate,
    /// First light on `day`, if known
    pub dawn: Option<DateTime<Tz>>,
    /// Last light on `day`, if known
    pub dusk: Option<DateTime<Tz>>,
    /// Rounded start of the governing low's safe window
    pub safe_start: Option<DateTime<Tz>>,
    /// Rounded end of the governing low's safe window
    pub safe_end: Option<DateTime<Tz>>,
}

impl TideSample {
    /// A fresh, unclassified sample. Its governing low defaults to its own time.
    pub fn new(time: DateTime<Tz>, height: f64, kind: TideKind) -> Self {
        TideSample {
            time,
            height,
            kind,
            governing_low: time,
            is_safe: false,
            day: time.date_naive(),
            dawn: None,
            dusk: None,
            safe_start: None,
            safe_end: None,
        }
    }

    /// Between dawn and dusk of its date, both inclusive. False when the
    /// date has no daylight window.
    pub fn in_daylight(&self) -> bool {
        match (self.dawn, self.dusk) {
            (Some(dawn), Some(dusk)) => dawn <= self.time && self.time <= dusk,
            _ => false,
        }
    }
}

impl From<&TideExtreme> for TideSample {
    fn from(extreme: &TideExtreme) -> Self {
        TideSample::new(extreme.time, extreme.height, extreme.kind)
    }
}

/// The safe driving range around one low tide.
///
/// `earliest` is rounded up and `latest` rounded down to 5 minutes, so a
/// window shorter than 5 minutes can come out with `earliest > latest`.
/// Such windows are kept; use [`SafeWindow::is_practical`] to filter them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SafeWindow {
    /// Time of the low tide this window belongs to
    pub governing_low: DateTime<Tz>,
    /// First safe time, rounded up
    pub earliest: DateTime<Tz>,
    /// Last safe time, rounded down
    pub latest: DateTime<Tz>,
}

impl SafeWindow {
    /// False when rounding collapsed the window.
    pub fn is_practical(&self) -> bool {
        self.earliest <= self.latest
    }
}

/// Where a forecast is for, as reported by the data provider.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Provider location id
    pub id: u32,
    /// Place name, e.g. "Bribie Island"
    pub name: String,
    /// Region within the state
    #[serde(default)]
    pub region: String,
    /// State abbreviation
    #[serde(default)]
    pub state: String,
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lng: f64,
    /// IANA time-zone name all forecast times are localized to
    #[serde(rename = "timeZone")]
    pub time_zone: String,
}

impl Location {
    /// Map link centred on the location, as shown under the safe-window table.
    pub fn map_url(&self) -> String {
        format!(
            "https://www.google.com/maps/@?api=1&map_action=map&zoom=14&basemap=terrain&center={}%2C{}",
            self.lat, self.lng
        )
    }
}
