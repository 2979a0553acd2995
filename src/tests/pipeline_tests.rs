//! Full pipeline from a weather response body to safe driving windows.

use chrono::{DateTime, Duration, TimeZone};
use chrono_tz::{Australia::Brisbane, Tz};
use serde_json::json;
use tread_lightly::{
    assemble, renderer::period_hint, willy_weather::decode_forecast, Forecast, TideKind,
    TideSample,
};

fn at(day: u32, hour: u32, minute: u32) -> DateTime<Tz> {
    Brisbane.with_ymd_and_hms(2023, 11, day, hour, minute, 0).unwrap()
}

/// Three days of six-hourly extremes with first light 05:00 and last light 19:00.
fn weather_body() -> String {
    let tide = |time: &str, height: f64, kind: &str| {
        json!({"dateTime": time, "height": height, "type": kind})
    };
    let light = |day: u32| {
        json!({"dateTime": format!("2023-11-{day} 00:00:00"), "entries": [{
            "firstLightDateTime": format!("2023-11-{day} 05:00:00"),
            "lastLightDateTime": format!("2023-11-{day} 19:00:00"),
        }]})
    };

    json!({
        "location": {
            "id": 17924, "name": "Bribie Island", "region": "Sunshine Coast", "state": "QLD",
            "timeZone": "Australia/Brisbane", "lat": -27.0708, "lng": 153.2016
        },
        "forecasts": {
            "tides": {
                "units": {"height": "m"},
                "days": [
                    {"entries": [tide("2023-11-15 18:00:00", 1.5, "high")]},
                    {"entries": [
                        tide("2023-11-16 00:00:00", 0.1, "low"),
                        tide("2023-11-16 06:00:00", 1.6, "high"),
                        tide("2023-11-16 12:00:00", 0.2, "low"),
                        tide("2023-11-16 18:00:00", 1.5, "high"),
                    ]},
                    {"entries": [
                        tide("2023-11-17 00:00:00", 0.3, "low"),
                        tide("2023-11-17 06:00:00", 1.6, "high"),
                    ]}
                ]
            },
            "sunrisesunset": {"days": [light(15), light(16), light(17)]}
        }
    })
    .to_string()
}

fn forecast() -> Forecast {
    let raw = decode_forecast(&weather_body()).expect("fixture should decode");
    assemble(raw, Duration::hours(3)).expect("fixture should assemble")
}

fn sample(forecast: &Forecast, time: DateTime<Tz>) -> &TideSample {
    forecast
        .samples
        .iter()
        .find(|s| s.time == time)
        .unwrap_or_else(|| panic!("no sample at {time}"))
}

/// Near the 00:00 low but before dawn, so not safe.
#[test]
fn near_low_before_dawn_is_unsafe() {
    let forecast = forecast();
    let early = sample(&forecast, at(16, 2, 0));
    assert_eq!(early.governing_low, at(16, 0, 0));
    assert!(!early.is_safe);
}

/// Two hours either side of the midday low, in daylight.
#[test]
fn near_midday_low_is_safe() {
    let forecast = forecast();
    for time in [at(16, 10, 0), at(16, 14, 0)] {
        let s = sample(&forecast, time);
        assert!(s.is_safe, "{time} should be safe");
        assert_eq!(s.governing_low, at(16, 12, 0));
        assert_eq!(s.dawn, Some(at(16, 5, 0)));
        assert_eq!(s.dusk, Some(at(16, 19, 0)));
    }
}

/// The midday low is the only one with daylight inside its margin.
#[test]
fn one_rounded_window_per_usable_low() {
    let forecast = forecast();
    let windows = forecast.safe_windows();

    assert_eq!(windows.len(), 1);
    let window = windows[0];
    assert_eq!(window.governing_low, at(16, 12, 0));
    // Raw limits 09:01 and 14:59, rounded inwards
    assert_eq!(window.earliest, at(16, 9, 5));
    assert_eq!(window.latest, at(16, 14, 55));
    assert!(window.is_practical());
    assert_eq!(period_hint(&window), "✓ 9:05am - 2:55pm");
}

#[test]
fn low_tide_rows_match_windows() {
    let forecast = forecast();
    let lows: Vec<_> = forecast.low_tides().collect();

    assert_eq!(lows.len(), 3);
    assert_eq!(lows[0].safe_start, None);
    assert_eq!(lows[1].safe_start, Some(at(16, 9, 5)));
    assert_eq!(lows[1].safe_end, Some(at(16, 14, 55)));
    assert_eq!(lows[2].safe_end, None);
}

#[test]
fn samples_span_first_dusk_to_last_dawn() {
    let forecast = forecast();
    let (first, last) = forecast.span().unwrap();

    assert_eq!(first, at(15, 19, 1));
    assert_eq!(last, at(17, 4, 59));
    assert!(forecast
        .samples
        .windows(2)
        .all(|pair| pair[1].time - pair[0].time == Duration::minutes(1)));
}

#[test]
fn every_extreme_survives_once() {
    let forecast = forecast();
    let extremes: Vec<_> = forecast
        .samples
        .iter()
        .filter(|s| s.kind.is_extreme())
        .map(|s| (s.time, s.kind))
        .collect();

    assert_eq!(
        extremes,
        vec![
            (at(16, 0, 0), TideKind::Low),
            (at(16, 6, 0), TideKind::High),
            (at(16, 12, 0), TideKind::Low),
            (at(16, 18, 0), TideKind::High),
            (at(17, 0, 0), TideKind::Low),
        ]
    );
}

#[test]
fn forecast_serializes_for_json_output() {
    let value = serde_json::to_value(forecast()).unwrap();

    assert_eq!(value["zone"], "Australia/Brisbane");
    assert_eq!(value["location"]["timeZone"], "Australia/Brisbane");
    assert_eq!(value["stale"], false);
    assert_eq!(value["samples"][0]["kind"], "interpolated");
    assert_eq!(value["daylight"].as_array().unwrap().len(), 3);
}
