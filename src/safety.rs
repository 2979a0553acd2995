//! # Safe Driving Classification
//!
//! Marks each minute of the tide curve as safe or unsafe for beach driving.
//! A minute is safe when all of these hold:
//!
//! - it is not a high tide
//! - it is less than `margin` away from its governing low tide
//! - it falls between dawn and dusk on its local calendar date
//!
//! ## Governing Low Tide
//!
//! Every minute is judged against one low tide. The assignment is a single
//! forward walk over the reported extremes that remembers the latest high and
//! the latest low seen so far:
//!
//! - reaching a high fills every sample strictly between the remembered low
//!   and this high with that low
//! - reaching a low fills every sample strictly between the remembered high
//!   and this low with this low
//!
//! For alternating extremes this gives each minute the low at the bottom of
//! its own rising or falling limb. When two lows occur back to back the second
//! low also claims the span back to the last high, which is not the same as
//! picking the nearest low by distance. Displayed windows depend on this
//! exact behaviour.

use crate::{DaylightWindow, TideKind, TideSample};
use chrono::{DateTime, Duration, NaiveDate};
use chrono_tz::Tz;
use std::collections::HashMap;

/// Compute the governing low tide of every sample in one forward pass.
///
/// Returns one timestamp per sample, by index. Samples never reached by the
/// walk keep their own time. `samples` must be sorted by time.
pub fn assign_governing_lows(samples: &[TideSample]) -> Vec<DateTime<Tz>> {
    let mut governing: Vec<DateTime<Tz>> = samples.iter().map(|s| s.time).collect();
    let mut high: Option<DateTime<Tz>> = None;
    let mut low: Option<DateTime<Tz>> = None;

    for sample in samples.iter().filter(|s| s.kind.is_extreme()) {
        match sample.kind {
            TideKind::High => {
                high = Some(sample.time);
                if let Some(low) = low {
                    fill_between(samples, &mut governing, low, sample.time, low);
                }
            }
            TideKind::Low => {
                low = Some(sample.time);
                if let Some(high) = high {
                    fill_between(samples, &mut governing, high, sample.time, sample.time);
                }
            }
            TideKind::Interpolated => {}
        }
    }

    governing
}

/// Set `governing` to `low` for every sample strictly between `after` and `before`.
fn fill_between(
    samples: &[TideSample],
    governing: &mut [DateTime<Tz>],
    after: DateTime<Tz>,
    before: DateTime<Tz>,
    low: DateTime<Tz>,
) {
    let start = samples.partition_point(|s| s.time <= after);
    let end = samples.partition_point(|s| s.time < before);
    if start < end {
        governing[start..end].fill(low);
    }
}

/// Copy dawn and dusk onto each sample from the window with the same local date.
///
/// Samples on dates without a window keep `None` and can never be safe. When
/// a date appears twice the first window wins.
pub fn merge_daylight(samples: &mut [TideSample], daylight: &[DaylightWindow]) {
    let mut by_date: HashMap<NaiveDate, &DaylightWindow> = HashMap::with_capacity(daylight.len());
    for window in daylight {
        by_date.entry(window.date).or_insert(window);
    }

    for sample in samples.iter_mut() {
        sample.day = sample.time.date_naive();
        let window = by_date.get(&sample.day);
        sample.dawn = window.map(|w| w.dawn);
        sample.dusk = window.map(|w| w.dusk);
    }
}

/// Whether a classified sample is safe to drive at.
pub fn is_safe(sample: &TideSample, margin: Duration) -> bool {
    if sample.kind == TideKind::High {
        return false;
    }

    let distance = if sample.time >= sample.governing_low {
        sample.time - sample.governing_low
    } else {
        sample.governing_low - sample.time
    };

    distance < margin && sample.in_daylight()
}

/// Assign governing lows, merge daylight and mark safe samples, in place.
///
/// `samples` must be sorted by time, as produced by
/// [`interpolate`](crate::interpolate::interpolate).
pub fn classify(samples: &mut [TideSample], daylight: &[DaylightWindow], margin: Duration) {
    let governing = assign_governing_lows(samples);
    merge_daylight(samples, daylight);

    for (sample, low) in samples.iter_mut().zip(governing) {
        sample.governing_low = low;
        sample.is_safe = is_safe(sample, margin);
    }
}
