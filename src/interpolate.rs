//! # Tide Height Interpolation
//!
//! Tide providers only report the times and heights of high and low water.
//! This module fills in a height for every whole minute between them.
//!
//! ## Half-Cosine Curve
//!
//! Between an extreme `(t1, h1)` and the next `(t2, h2)`:
//!
//! ```text
//! a = π · ((t − t1) / (t2 − t1) + 1)
//! height(t) = h1 + (h2 − h1) · (cos(a) + 1) / 2
//! ```
//!
//! At `t1` the angle is `π` and the height is `h1`; at `t2` it is `2π` and the
//! height is `h2`. The curve is monotonic in between and flat at both ends,
//! matching the slack water around real highs and lows. This is the method
//! LINZ publishes for finding heights between high and low waters.

use crate::{DataError, TideExtreme, TideKind, TideSample};
use chrono::{DateTime, Duration};
use chrono_tz::Tz;
use std::f64::consts::PI;

/// Height at `t` on the half-cosine curve from `(t1, h1)` to `(t2, h2)`.
///
/// `t2` must be later than `t1`.
pub fn height_at(t: DateTime<Tz>, t1: DateTime<Tz>, h1: f64, t2: DateTime<Tz>, h2: f64) -> f64 {
    let position = (t - t1).num_seconds() as f64 / (t2 - t1).num_seconds() as f64;
    let a = PI * (position + 1.0);
    h1 + (h2 - h1) * ((a.cos() + 1.0) / 2.0)
}

/// Expand ordered extremes into a per-minute tide curve.
///
/// The output holds every extreme exactly once, unmodified, with an
/// `Interpolated` sample at each whole minute strictly between consecutive
/// extremes. Pairs sharing a timestamp contribute no interpolated samples.
///
/// # Errors
/// - [`DataError::NonMonotonic`] if an extreme is earlier than its predecessor
/// - [`DataError::Empty`] if there are no extremes at all
///
/// # Example
/// ```
/// use chrono::TimeZone;
/// use chrono_tz::Australia::Brisbane;
/// use tread_lightly::{interpolate::interpolate, TideExtreme, TideKind};
///
/// let low = TideExtreme {
///     time: Brisbane.with_ymd_and_hms(2023, 11, 16, 0, 0, 0).unwrap(),
///     height: 0.2,
///     kind: TideKind::Low,
/// };
/// let high = TideExtreme {
///     time: Brisbane.with_ymd_and_hms(2023, 11, 16, 6, 0, 0).unwrap(),
///     height: 1.8,
///     kind: TideKind::High,
/// };
///
/// let samples = interpolate(&[low, high]).unwrap();
/// assert_eq!(samples.len(), 6 * 60 + 1);
/// ```
pub fn interpolate(extremes: &[TideExtreme]) -> Result<Vec<TideSample>, DataError> {
    for pair in extremes.windows(2) {
        if pair[1].time < pair[0].time {
            return Err(DataError::NonMonotonic {
                previous: pair[0].time.to_rfc3339(),
                next: pair[1].time.to_rfc3339(),
            });
        }
    }

    let (first, last) = match (extremes.first(), extremes.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(DataError::Empty),
    };

    // One sample per minute plus the extremes themselves
    let span = (last.time - first.time).num_minutes().max(0) as usize;
    let mut samples = Vec::with_capacity(span + extremes.len());
    samples.push(TideSample::from(first));

    for pair in extremes.windows(2) {
        let (from, to) = (&pair[0], &pair[1]);
        let minutes = (to.time - from.time).num_minutes();
        for minute in 1..minutes {
            let time = from.time + Duration::minutes(minute);
            let height = height_at(time, from.time, from.height, to.time, to.height);
            samples.push(TideSample::new(time, height, TideKind::Interpolated));
        }
        samples.push(TideSample::from(to));
    }

    Ok(samples)
}
