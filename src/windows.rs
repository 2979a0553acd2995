//! # Safe Window Reduction
//!
//! Collapses the per-minute safe flags into one `[earliest, latest]` range per
//! low tide and writes the range back onto every sample of that low.
//!
//! Displayed limits are rounded inwards to 5 minutes on the local clock:
//! the start rounds up and the end rounds down, so a displayed window never
//! begins earlier or ends later than the computed one.

use crate::{SafeWindow, TideSample};
use chrono::{DateTime, Duration, Timelike};
use chrono_tz::Tz;
use std::collections::BTreeMap;

/// Display granularity of window limits, in minutes.
const STEP_MINUTES: u32 = 5;

/// Round down to the previous 5-minute boundary of the local clock.
fn floor_to_step(time: DateTime<Tz>) -> DateTime<Tz> {
    let past = i64::from((time.minute() % STEP_MINUTES) * 60 + time.second());
    time - Duration::seconds(past) - Duration::nanoseconds(i64::from(time.nanosecond()))
}

/// Round up to the next 5-minute boundary of the local clock.
fn ceil_to_step(time: DateTime<Tz>) -> DateTime<Tz> {
    let floored = floor_to_step(time);
    if floored == time {
        time
    } else {
        floored + Duration::minutes(i64::from(STEP_MINUTES))
    }
}

/// Round a safe range inwards: `earliest` up and `latest` down to 5 minutes.
///
/// The result may have `earliest > latest` when the range is shorter than
/// the rounding step.
pub fn round_window(earliest: DateTime<Tz>, latest: DateTime<Tz>) -> (DateTime<Tz>, DateTime<Tz>) {
    (ceil_to_step(earliest), floor_to_step(latest))
}

/// Compute the safe window of every low tide and merge it onto the samples.
///
/// Every sample whose governing low has at least one safe sample gets that
/// low's rounded `safe_start`/`safe_end`, whether or not the sample itself is
/// safe. All other samples get `None`. Returns the windows ordered by low tide.
pub fn reduce(samples: &mut [TideSample]) -> Vec<SafeWindow> {
    let mut limits: BTreeMap<DateTime<Tz>, (DateTime<Tz>, DateTime<Tz>)> = BTreeMap::new();
    for sample in samples.iter().filter(|s| s.is_safe) {
        limits
            .entry(sample.governing_low)
            .and_modify(|(earliest, latest)| {
                *earliest = (*earliest).min(sample.time);
                *latest = (*latest).max(sample.time);
            })
            .or_insert((sample.time, sample.time));
    }

    let windows: Vec<SafeWindow> = limits
        .into_iter()
        .map(|(governing_low, (earliest, latest))| {
            let (earliest, latest) = round_window(earliest, latest);
            SafeWindow {
                governing_low,
                earliest,
                latest,
            }
        })
        .collect();

    for sample in samples.iter_mut() {
        let window = windows
            .binary_search_by_key(&sample.governing_low, |w| w.governing_low)
            .ok()
            .map(|index| &windows[index]);
        sample.safe_start = window.map(|w| w.earliest);
        sample.safe_end = window.map(|w| w.latest);
    }

    windows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TideKind;
    use chrono::TimeZone;
    use chrono_tz::Australia::{Adelaide, Brisbane};

    fn at(hour: u32, minute: u32) -> DateTime<Tz> {
        Brisbane.with_ymd_and_hms(2023, 11, 16, hour, minute, 0).unwrap()
    }

    /// Minute samples from `from` to `to` inclusive, governed by `low`,
    /// safe between `safe_from` and `safe_to` inclusive.
    fn bracket(
        from: DateTime<Tz>,
        to: DateTime<Tz>,
        low: DateTime<Tz>,
        safe: Option<(DateTime<Tz>, DateTime<Tz>)>,
    ) -> Vec<TideSample> {
        let mut samples = Vec::new();
        let mut time = from;
        while time <= to {
            let mut sample = TideSample::new(time, 0.5, TideKind::Interpolated);
            sample.governing_low = low;
            sample.is_safe = safe.is_some_and(|(start, end)| start <= time && time <= end);
            samples.push(sample);
            time += Duration::minutes(1);
        }
        samples
    }

    #[test]
    fn test_round_window_rounds_inwards() {
        let (earliest, latest) = round_window(at(8, 32), at(9, 47));
        assert_eq!(earliest, at(8, 35));
        assert_eq!(latest, at(9, 45));
    }

    #[test]
    fn test_round_window_keeps_boundaries() {
        let (earliest, latest) = round_window(at(8, 35), at(9, 45));
        assert_eq!(earliest, at(8, 35));
        assert_eq!(latest, at(9, 45));
    }

    #[test]
    fn test_round_window_drops_seconds() {
        let start = Brisbane.with_ymd_and_hms(2023, 11, 16, 8, 35, 20).unwrap();
        let end = Brisbane.with_ymd_and_hms(2023, 11, 16, 9, 45, 40).unwrap();
        let (earliest, latest) = round_window(start, end);
        assert_eq!(earliest, at(8, 40));
        assert_eq!(latest, at(9, 45));
    }

    #[test]
    fn test_round_window_uses_local_clock() {
        // Adelaide is on a half-hour offset
        let start = Adelaide.with_ymd_and_hms(2023, 11, 16, 8, 32, 0).unwrap();
        let (earliest, _) = round_window(start, start);
        assert_eq!(earliest.minute(), 35);
        assert_eq!(earliest.hour(), 8);
    }

    #[test]
    fn test_reduce_rounds_and_merges_onto_bracket() {
        let low = at(9, 0);
        let mut samples = bracket(at(8, 0), at(10, 0), low, Some((at(8, 32), at(9, 47))));
        let windows = reduce(&mut samples);

        assert_eq!(
            windows,
            vec![SafeWindow {
                governing_low: low,
                earliest: at(8, 35),
                latest: at(9, 45),
            }]
        );
        // Unsafe samples in the same bracket carry the window too
        assert!(!samples[0].is_safe);
        assert_eq!(samples[0].safe_start, Some(at(8, 35)));
        assert_eq!(samples.last().unwrap().safe_end, Some(at(9, 45)));
    }

    #[test]
    fn test_reduce_leaves_unsafe_brackets_empty() {
        let mut samples = bracket(at(2, 0), at(4, 0), at(3, 0), None);
        samples.extend(bracket(at(4, 1), at(6, 0), at(5, 0), Some((at(5, 0), at(5, 30)))));
        let windows = reduce(&mut samples);

        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].governing_low, at(5, 0));
        assert!(samples[0].safe_start.is_none());
        assert!(samples[0].safe_end.is_none());
        assert_eq!(samples.last().unwrap().safe_start, Some(at(5, 0)));
    }

    #[test]
    fn test_reduce_keeps_collapsed_windows() {
        let mut samples = bracket(at(9, 0), at(9, 10), at(9, 0), Some((at(9, 1), at(9, 4))));
        let windows = reduce(&mut samples);

        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].earliest, at(9, 5));
        assert_eq!(windows[0].latest, at(9, 0));
        assert!(!windows[0].is_practical());
    }
}
