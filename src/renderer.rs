//! # Safe Window Rendering
//!
//! Plain-text output for terminals: a table of safe driving periods per low
//! tide and an ASCII chart of the tide curve with safe minutes highlighted and
//! nights shaded.

use crate::{config::ForecastConfig, Forecast, SafeWindow, TideKind, TideSample};
use chrono::{DateTime, Timelike};
use chrono_tz::Tz;
use std::fmt::Write;

/// Chart height in text rows
const ROWS: usize = 12;
/// Space for Y-axis labels
const Y_AXIS_WIDTH: usize = 5;

const SAFE: char = '●';
const UNSAFE: char = '·';
const NIGHT: char = '░';
const HIGH: char = '✕';

/// Clock time like "8:35am".
fn clock(time: DateTime<Tz>) -> String {
    time.format("%-I:%M%p").to_string().to_lowercase()
}

/// Short label for a safe window, e.g. "✓ 8:35am - 9:45am".
pub fn period_hint(window: &SafeWindow) -> String {
    format!("✓ {} - {}", clock(window.earliest), clock(window.latest))
}

/// Table of safe driving periods, one row per low tide.
pub fn render_table(forecast: &Forecast, safe_hours: u32) -> String {
    let mut out = String::new();
    let location = &forecast.location;

    if forecast.stale {
        out.push_str("⚠ STALE DATA\n\n");
    }

    let _ = writeln!(
        out,
        "Turtle-friendly driving times near {}, {}, {} (times in {})",
        location.name, location.region, location.state, location.time_zone
    );
    let _ = writeln!(out, "{}\n", location.map_url());
    let _ = writeln!(out, "{:<16} {:>8} {:>8}", "Day", "From", "To");

    for low in forecast.low_tides() {
        let from = low.safe_start.map(clock).unwrap_or_else(|| "-".to_string());
        let to = low.safe_end.map(clock).unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "{:<16} {:>8} {:>8}",
            low.day.format("%a %-d %b %Y").to_string(),
            from,
            to
        );
    }

    let _ = writeln!(
        out,
        "\nThe safest times are {safe_hours} hours either side of low tide and between dawn and dusk."
    );
    out
}

/// ASCII chart of tide height, one column per `step_minutes`.
///
/// Safe columns are drawn with `●`, unsafe with `·`, high tides with `✕`, and
/// night columns are shaded. Day labels sit under each noon, and each low tide
/// with a safe window gets its period hint on the line below.
pub fn render_chart(forecast: &Forecast, step_minutes: u32) -> String {
    let step = step_minutes.max(1) as usize;
    let columns: Vec<&TideSample> = forecast.samples.iter().step_by(step).collect();
    if columns.is_empty() {
        return String::from("No tide samples to chart\n");
    }

    let (min_height, max_height) = columns
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), sample| {
            (min.min(sample.height), max.max(sample.height))
        });
    let range = (max_height - min_height).max(f64::EPSILON);

    let height_to_row = |height: f64| {
        let normalized = (height - min_height) / range;
        ((1.0 - normalized) * (ROWS as f64 - 1.0)).round() as usize
    };

    let mut grid = vec![vec![' '; columns.len() + Y_AXIS_WIDTH]; ROWS];

    // Y-axis labels at top, middle and bottom
    for height in [max_height, (min_height + max_height) / 2.0, min_height] {
        let row = height_to_row(height);
        let label = format!("{:<width$.1}", height, width = Y_AXIS_WIDTH - 1);
        for (i, ch) in label.chars().take(Y_AXIS_WIDTH - 1).enumerate() {
            grid[row][i] = ch;
        }
    }
    for row in grid.iter_mut() {
        row[Y_AXIS_WIDTH - 1] = '│';
    }

    for (column, sample) in columns.iter().enumerate() {
        let grid_column = column + Y_AXIS_WIDTH;
        if !sample.in_daylight() {
            for row in grid.iter_mut() {
                row[grid_column] = NIGHT;
            }
        }
        grid[height_to_row(sample.height)][grid_column] = if sample.is_safe { SAFE } else { UNSAFE };
    }

    for (index, sample) in forecast.samples.iter().enumerate() {
        if sample.kind == TideKind::High {
            let row = height_to_row(sample.height).min(ROWS - 1);
            grid[row][index / step + Y_AXIS_WIDTH] = HIGH;
        }
    }

    let mut out = String::new();
    for row in grid {
        out.extend(row);
        out.push('\n');
    }

    // Day labels under the column nearest each noon
    let mut labels = vec![' '; columns.len() + Y_AXIS_WIDTH];
    for (column, sample) in columns.iter().enumerate() {
        let minute_of_day = (sample.time.hour() * 60 + sample.time.minute()) as usize;
        if (720..720 + step).contains(&minute_of_day) {
            place(&mut labels, column + Y_AXIS_WIDTH, &sample.time.format("%a %-d").to_string());
        }
    }
    out.extend(labels);
    out.push('\n');

    let mut hints = vec![' '; columns.len() + Y_AXIS_WIDTH];
    for (index, low) in forecast.samples.iter().enumerate() {
        if low.kind != TideKind::Low {
            continue;
        }
        if let (Some(earliest), Some(latest)) = (low.safe_start, low.safe_end) {
            let window = SafeWindow {
                governing_low: low.time,
                earliest,
                latest,
            };
            place(&mut hints, index / step + Y_AXIS_WIDTH, &period_hint(&window));
        }
    }
    out.push_str(hints.iter().collect::<String>().trim_end());
    out.push('\n');
    out
}

/// Write `text` into `line` from `start`, growing the line as needed.
fn place(line: &mut Vec<char>, start: usize, text: &str) {
    for (i, ch) in text.chars().enumerate() {
        let slot = start + i;
        if slot >= line.len() {
            line.resize(slot + 1, ' ');
        }
        line[slot] = ch;
    }
}

/// Print the safe-window table and, if asked, the chart to stdout.
pub fn draw_ascii(forecast: &Forecast, config: &ForecastConfig, with_chart: bool) {
    print!("{}", render_table(forecast, config.safe_hours));
    if with_chart {
        println!();
        print!("{}", render_chart(forecast, config.chart_step_minutes));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DaylightWindow, Location};
    use chrono::{Duration, TimeZone};
    use chrono_tz::Australia::Brisbane;

    fn at(hour: u32, minute: u32) -> DateTime<Tz> {
        Brisbane.with_ymd_and_hms(2023, 11, 16, hour, minute, 0).unwrap()
    }

    fn test_forecast() -> Forecast {
        let low = at(9, 0);
        let daylight = DaylightWindow::new(at(5, 0), at(19, 0));
        let mut samples = Vec::new();
        let mut time = at(0, 0);
        while time <= at(23, 59) {
            let minutes = (time - at(0, 0)).num_minutes() as f64;
            let kind = if time == low {
                TideKind::Low
            } else if time == at(21, 0) {
                TideKind::High
            } else {
                TideKind::Interpolated
            };
            let mut sample = TideSample::new(time, 1.0 + (minutes / 200.0).sin(), kind);
            sample.governing_low = low;
            sample.dawn = Some(daylight.dawn);
            sample.dusk = Some(daylight.dusk);
            sample.is_safe = (time - low).num_minutes().abs() < 180 && daylight.contains(time);
            sample.safe_start = Some(at(6, 5));
            sample.safe_end = Some(at(11, 55));
            samples.push(sample);
            time += Duration::minutes(1);
        }
        Forecast {
            location: Location {
                id: 17924,
                name: "Bribie Island".to_string(),
                region: "Sunshine Coast".to_string(),
                state: "QLD".to_string(),
                lat: -27.07,
                lng: 153.2,
                time_zone: "Australia/Brisbane".to_string(),
            },
            zone: Brisbane,
            daylight: vec![daylight],
            samples,
            stale: false,
        }
    }

    #[test]
    fn test_period_hint() {
        let window = SafeWindow {
            governing_low: at(9, 0),
            earliest: at(8, 35),
            latest: at(13, 45),
        };
        assert_eq!(period_hint(&window), "✓ 8:35am - 1:45pm");
    }

    #[test]
    fn test_table_lists_each_low() {
        let table = render_table(&test_forecast(), 3);
        assert!(table.contains("Bribie Island, Sunshine Coast, QLD"));
        assert!(table.contains("Thu 16 Nov 2023"));
        assert!(table.contains("6:05am"));
        assert!(table.contains("11:55am"));
        assert!(table.contains("3 hours either side"));
        assert!(!table.contains("STALE"));
    }

    #[test]
    fn test_stale_indicator() {
        let mut forecast = test_forecast();
        forecast.stale = true;
        assert!(render_table(&forecast, 3).starts_with("⚠ STALE DATA"));
    }

    #[test]
    fn test_chart_marks_safe_and_night() {
        let chart = render_chart(&test_forecast(), 60);
        let lines: Vec<&str> = chart.lines().collect();

        assert_eq!(lines.len(), ROWS + 2);
        assert!(chart.contains(SAFE));
        assert!(chart.contains(UNSAFE));
        assert!(chart.contains(NIGHT));
        assert!(lines[ROWS].contains("Thu 16"));
        // 24 columns plus the axis
        assert_eq!(lines[0].chars().count(), 24 + Y_AXIS_WIDTH);
    }

    #[test]
    fn test_chart_marks_highs_and_hints_lows() {
        let chart = render_chart(&test_forecast(), 60);
        let lines: Vec<&str> = chart.lines().collect();

        // The 21:00 high sits in column 21
        let crosses: Vec<usize> = lines[..ROWS]
            .iter()
            .filter_map(|line| line.chars().position(|ch| ch == HIGH))
            .collect();
        assert_eq!(crosses, vec![21 + Y_AXIS_WIDTH]);

        // The hint starts under the 09:00 low
        let hint = lines[ROWS + 1];
        assert_eq!(hint.trim_start(), "✓ 6:05am - 11:55am");
        assert_eq!(hint.chars().take_while(|ch| *ch == ' ').count(), 9 + Y_AXIS_WIDTH);
    }

    #[test]
    fn test_chart_without_samples() {
        let mut forecast = test_forecast();
        forecast.samples.clear();
        assert_eq!(render_chart(&forecast, 60), "No tide samples to chart\n");
    }
}
