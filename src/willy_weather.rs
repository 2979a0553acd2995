//! # Willy Weather Data Fetching and Caching
//!
//! This module talks to the Willy Weather REST API, which republishes Bureau of
//! Meteorology tide predictions and sunrise/sunset times for Australian
//! locations. See <https://www.willyweather.com.au/info/api.html>.
//!
//! ## Endpoints
//!
//! Every URL has the shape `{host}/{version}/{key}/{path}.json`:
//!
//! - `search.json?query=`: find locations by name or postcode
//! - `locations/{id}.json`: one location
//! - `locations/{id}/weather.json?forecasts=tides,sunrisesunset&days=&startDate=`
//!   for tide extremes and first/last light for a run of days
//!
//! Times in the weather response are naive local strings
//! (`2023-11-16 04:21:00`) in the location's IANA time zone.
//!
//! ## Caching Strategy
//!
//! Raw weather responses are cached as files, one per location, start date
//! and day count, and reused while younger than the configured TTL (24 hours
//! by default). When the network fails and an expired entry exists, the
//! stale response is used and the forecast is flagged `stale` so the display
//! can say so. Cache write failures are never fatal.

use crate::{
    assemble, config::ApiConfig, DataError, DaylightWindow, Forecast, ForecastError, Location,
    RawForecast, TideExtreme, TideKind,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};
use std::{fs, io};

/// Timestamp layout used throughout the weather response
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The only height unit the pipeline understands
const METRES: &str = "m";

// -- Wire format --

#[derive(Deserialize)]
struct WeatherResponse {
    location: Location,
    forecasts: Forecasts,
}

#[derive(Deserialize)]
struct Forecasts {
    #[serde(default)]
    tides: Option<TideForecast>,
    #[serde(default)]
    sunrisesunset: Option<SunForecast>,
}

#[derive(Deserialize)]
struct TideForecast {
    days: Vec<TideDay>,
    units: Units,
}

#[derive(Deserialize)]
struct Units {
    height: String,
}

#[derive(Deserialize)]
struct TideDay {
    entries: Vec<TideEntry>,
}

#[derive(Deserialize)]
struct TideEntry {
    #[serde(rename = "dateTime")]
    date_time: String,
    height: f64,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Deserialize)]
struct SunForecast {
    days: Vec<SunDay>,
}

#[derive(Deserialize)]
struct SunDay {
    #[serde(rename = "dateTime", default)]
    date_time: String,
    entries: Vec<SunEntry>,
}

#[derive(Deserialize)]
struct SunEntry {
    #[serde(rename = "firstLightDateTime")]
    first_light: String,
    #[serde(rename = "lastLightDateTime")]
    last_light: String,
}

/// Parse a naive local timestamp and place it in `zone`.
///
/// Local times skipped or repeated by a daylight-saving change are rejected.
pub fn localize(text: &str, zone: Tz) -> Result<DateTime<Tz>, DataError> {
    let naive = NaiveDateTime::parse_from_str(text.trim(), TIME_FORMAT)
        .map_err(|e| DataError::Timestamp(format!("{text}: {e}")))?;
    zone.from_local_datetime(&naive)
        .single()
        .ok_or_else(|| DataError::Timestamp(format!("{text} is not a unique time in {zone}")))
}

/// Decode a weather response body into extremes and daylight windows.
///
/// A day without first/last light, or with unusable light times, is skipped
/// with a warning. A response without a tide forecast decodes to zero
/// extremes; [`assemble`] reports that as no data.
pub fn decode_forecast(body: &str) -> Result<RawForecast, DataError> {
    let response: WeatherResponse = serde_json::from_str(body)?;
    let location = response.location;
    let zone: Tz = location
        .time_zone
        .parse()
        .map_err(|_| DataError::TimeZone(location.time_zone.clone()))?;

    let mut daylight = Vec::new();
    for day in response
        .forecasts
        .sunrisesunset
        .map(|sun| sun.days)
        .unwrap_or_default()
    {
        let Some(entry) = day.entries.first() else {
            tracing::warn!(day = %day.date_time, "no first/last light, skipping day");
            continue;
        };
        match (localize(&entry.first_light, zone), localize(&entry.last_light, zone)) {
            (Ok(dawn), Ok(dusk)) => daylight.push(DaylightWindow::new(dawn, dusk)),
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!(day = %day.date_time, error = %e, "bad first/last light, skipping day");
            }
        }
    }

    let mut extremes = Vec::new();
    if let Some(tides) = response.forecasts.tides {
        if tides.units.height != METRES {
            return Err(DataError::Units(tides.units.height));
        }
        for entry in tides.days.iter().flat_map(|day| &day.entries) {
            extremes.push(TideExtreme {
                time: localize(&entry.date_time, zone)?,
                height: entry.height,
                kind: TideKind::from_wire(&entry.kind)?,
            });
        }
    }

    Ok(RawForecast {
        location,
        zone,
        daylight,
        extremes,
    })
}

/// File cache of raw responses, keyed by request.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    dir: PathBuf,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(dir: PathBuf, ttl: Duration) -> Self {
        ResponseCache { dir, ttl }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Cached body if younger than the TTL.
    pub fn load_fresh(&self, key: &str) -> Result<String, io::Error> {
        let path = self.path(key);
        let age = SystemTime::now()
            .duration_since(fs::metadata(&path)?.modified()?)
            .map_err(|_| io::Error::other("time error"))?;

        if age > self.ttl {
            return Err(io::Error::other("stale"));
        }

        fs::read_to_string(path)
    }

    /// Cached body regardless of age.
    pub fn load_any(&self, key: &str) -> Result<String, io::Error> {
        fs::read_to_string(self.path(key))
    }

    pub fn save(&self, key: &str, body: &str) -> Result<(), io::Error> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path(key), body)
    }
}

/// Async client for the Willy Weather API.
///
/// All settings, including the API key, come from the [`ApiConfig`] passed to
/// [`WillyWeatherClient::new`].
#[derive(Debug, Clone)]
pub struct WillyWeatherClient {
    http: reqwest::Client,
    base: String,
    cache: Option<ResponseCache>,
}

impl WillyWeatherClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    /// [`ForecastError::Config`] when no API key is configured, or
    /// [`ForecastError::Fetch`] when the HTTP client cannot be created.
    pub fn new(config: &ApiConfig) -> Result<Self, ForecastError> {
        let key = config.resolved_key().ok_or_else(|| {
            ForecastError::Config(format!(
                "no API key: set api.key or {}",
                crate::config::KEY_ENV
            ))
        })?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let cache = (config.cache_ttl_hours > 0).then(|| {
            ResponseCache::new(
                config.cache_path(),
                Duration::from_secs(config.cache_ttl_hours * 60 * 60),
            )
        });

        Ok(WillyWeatherClient {
            http,
            base: format!(
                "{}/{}/{}",
                config.host.trim_end_matches('/'),
                config.version,
                key
            ),
            cache,
        })
    }

    /// Find locations by name or postcode.
    pub async fn search(&self, query: &str) -> Result<Vec<Location>, ForecastError> {
        let body = self.get("search", &[("query", query.to_string())]).await?;
        Ok(serde_json::from_str(&body).map_err(DataError::from)?)
    }

    /// Look up one location by id.
    pub async fn location(&self, id: u32) -> Result<Location, ForecastError> {
        let body = self.get(&format!("locations/{id}"), &[]).await?;
        Ok(serde_json::from_str(&body).map_err(DataError::from)?)
    }

    /// Fetch and decode extremes and daylight for `days` days from `start`.
    pub async fn fetch_forecast(
        &self,
        location_id: u32,
        start: NaiveDate,
        days: u32,
    ) -> Result<RawForecast, ForecastError> {
        let (raw, _) = self.raw_forecast(location_id, start, days).await?;
        Ok(raw)
    }

    /// Fetch, then compute safe driving windows with the given margin.
    pub async fn forecast(
        &self,
        location_id: u32,
        start: NaiveDate,
        days: u32,
        margin: chrono::Duration,
    ) -> Result<Forecast, ForecastError> {
        let (raw, stale) = self.raw_forecast(location_id, start, days).await?;
        let mut forecast = assemble(raw, margin)?;
        forecast.stale = stale;
        Ok(forecast)
    }

    /// Decoded weather response, from cache when fresh. The flag is true when
    /// an expired cache entry stood in for a failed fetch.
    ///
    /// Only responses that decode are written to the cache.
    async fn raw_forecast(
        &self,
        location_id: u32,
        start: NaiveDate,
        days: u32,
    ) -> Result<(RawForecast, bool), ForecastError> {
        let key = format!("weather-{location_id}-{start}-{days}");

        if let Some(cache) = &self.cache {
            if let Ok(body) = cache.load_fresh(&key) {
                match decode_forecast(&body) {
                    Ok(raw) => {
                        tracing::debug!(location = location_id, %start, days, "using cached forecast");
                        return Ok((raw, false));
                    }
                    Err(e) => tracing::warn!(error = %e, "ignoring unreadable cached forecast"),
                }
            }
        }

        let fetched = self
            .get(
                &format!("locations/{location_id}/weather"),
                &[
                    ("forecasts", "tides,sunrisesunset".to_string()),
                    ("days", days.to_string()),
                    ("startDate", start.to_string()),
                ],
            )
            .await;

        let body = match fetched {
            Ok(body) => body,
            Err(err) => return self.stale_forecast(&key, location_id, err),
        };

        let raw = decode_forecast(&body)?;
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.save(&key, &body) {
                tracing::debug!(error = %e, "could not write response cache");
            }
        }
        Ok((raw, false))
    }

    /// Fall back to an expired cache entry after `err`, or return `err` when
    /// there is no usable entry.
    fn stale_forecast(
        &self,
        key: &str,
        location_id: u32,
        err: ForecastError,
    ) -> Result<(RawForecast, bool), ForecastError> {
        let stale = self
            .cache
            .as_ref()
            .and_then(|cache| cache.load_any(key).ok())
            .and_then(|body| decode_forecast(&body).ok());

        match stale {
            Some(raw) => {
                tracing::warn!(location = location_id, error = %err, "fetch failed, using stale forecast");
                Ok((raw, true))
            }
            None => Err(err),
        }
    }

    /// GET `{base}/{path}.json` and return the body of a successful response.
    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<String, ForecastError> {
        tracing::info!(path, "requesting Willy Weather");
        let body = self
            .http
            .get(format!("{}/{path}.json", self.base))
            .header(ACCEPT, "application/json")
            .query(query)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(body)
    }
}
