//! # Forecast Assembly
//!
//! Runs the pipeline over one fetched batch of extremes and daylight times:
//!
//! ```text
//! extremes ──interpolate──▶ samples ──classify──▶ ──reduce──▶ ──trim──▶ Forecast
//!                 daylight ─────────────┘
//! ```
//!
//! Assembly owns its input and shares nothing, so it can be re-run for the
//! same batch any number of times (for instance behind a response cache) with
//! identical results.

use crate::{
    interpolate::interpolate, safety::classify, windows::reduce, DaylightWindow, ForecastError,
    Location, SafeWindow, TideExtreme, TideKind, TideSample,
};
use chrono::{DateTime, Datelike, Duration, NaiveDate};
use chrono_tz::Tz;
use serde::Serialize;
use std::collections::BTreeMap;

/// Day of the week the default look-ahead starts on (Thursday, Monday = 0).
const WEEKEND_START: u32 = 3;

/// Extremes and daylight times for one location, as fetched.
#[derive(Clone, Debug)]
pub struct RawForecast {
    /// Location the data is for
    pub location: Location,
    /// Zone all timestamps are localized to
    pub zone: Tz,
    /// First and last light, one entry per date
    pub daylight: Vec<DaylightWindow>,
    /// Reported highs and lows, ordered by time
    pub extremes: Vec<TideExtreme>,
}

/// A packaged forecast ready for display.
///
/// `samples` cover only the span between the earliest dusk and the latest
/// dawn so that every night shown is complete. `daylight` is the untrimmed
/// table for every date fetched.
#[derive(Clone, Debug, Serialize)]
pub struct Forecast {
    pub location: Location,
    pub zone: Tz,
    pub daylight: Vec<DaylightWindow>,
    pub samples: Vec<TideSample>,
    /// True when built from an expired cached response after a failed fetch
    pub stale: bool,
}

impl Forecast {
    /// Safe windows of the low tides still covered by `samples`, in time order.
    pub fn safe_windows(&self) -> Vec<SafeWindow> {
        let mut windows = BTreeMap::new();
        for sample in &self.samples {
            if let (Some(earliest), Some(latest)) = (sample.safe_start, sample.safe_end) {
                windows.entry(sample.governing_low).or_insert(SafeWindow {
                    governing_low: sample.governing_low,
                    earliest,
                    latest,
                });
            }
        }
        windows.into_values().collect()
    }

    /// The reported low tides, each carrying its window limits if it has any.
    pub fn low_tides(&self) -> impl Iterator<Item = &TideSample> {
        self.samples.iter().filter(|s| s.kind == TideKind::Low)
    }

    /// First and last sample times.
    pub fn span(&self) -> Option<(DateTime<Tz>, DateTime<Tz>)> {
        Some((self.samples.first()?.time, self.samples.last()?.time))
    }
}

/// Build a forecast from fetched data.
///
/// # Errors
/// - [`ForecastError::NoData`] if there are no extremes or no daylight entries
/// - [`ForecastError::Data`] if the extremes are out of order
pub fn assemble(raw: RawForecast, margin: Duration) -> Result<Forecast, ForecastError> {
    if raw.extremes.is_empty() {
        return Err(ForecastError::NoData {
            location: raw.location.id.to_string(),
            what: "tide extremes",
        });
    }
    if raw.daylight.is_empty() {
        return Err(ForecastError::NoData {
            location: raw.location.id.to_string(),
            what: "daylight times",
        });
    }

    let mut samples = interpolate(&raw.extremes)?;
    classify(&mut samples, &raw.daylight, margin);
    reduce(&mut samples);
    let samples = trim(samples, &raw.daylight);

    Ok(Forecast {
        location: raw.location,
        zone: raw.zone,
        daylight: raw.daylight,
        samples,
        stale: false,
    })
}

/// Keep samples strictly after the earliest dusk and strictly before the latest dawn.
pub fn trim(samples: Vec<TideSample>, daylight: &[DaylightWindow]) -> Vec<TideSample> {
    let first_dusk = daylight.iter().map(|d| d.dusk).min();
    let last_dawn = daylight.iter().map(|d| d.dawn).max();
    match (first_dusk, last_dawn) {
        (Some(first_dusk), Some(last_dawn)) => samples
            .into_iter()
            .filter(|s| first_dusk < s.time && s.time < last_dawn)
            .collect(),
        _ => Vec::new(),
    }
}

/// The next Thursday on or after `today`.
///
/// A five-day look-ahead from there covers the coming weekend with a full
/// night either side.
pub fn weekend_start(today: NaiveDate) -> NaiveDate {
    let weekday = today.weekday().num_days_from_monday();
    let ahead = (WEEKEND_START + 7 - weekday) % 7;
    today + Duration::days(i64::from(ahead))
}
