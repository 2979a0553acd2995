//! # Tread Lightly Application Entry Point
//!
//! Fetches the tide and daylight forecast for one location, works out the
//! turtle-friendly driving windows and prints them as a table (optionally with
//! an ASCII chart) or as JSON for other tools.

// Test modules
#[cfg(test)]
mod tests;

use anyhow::{anyhow, bail, Context};
use chrono::{Local, NaiveDate};
use std::env;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tread_lightly::{
    config::Config, forecast::weekend_start, renderer::draw_ascii,
    willy_weather::WillyWeatherClient, ForecastError,
};

const USAGE: &str = "\
Usage: tread-lightly [OPTIONS]

Options:
  --config PATH      configuration file (default: tread-lightly.toml)
  --location ID      Willy Weather location id
  --start DATE       first day of forecast, YYYY-MM-DD (default: next Thursday)
  --days N           number of days to fetch
  --margin HOURS     safe hours either side of low tide
  --chart            also draw an ASCII tide chart
  --json             print the full forecast as JSON
  --search QUERY     list locations matching a name or postcode
  --verbose          debug logging";

/// Command line options. Anything not given falls back to the configuration.
#[derive(Debug, Default, PartialEq)]
struct Args {
    config: Option<PathBuf>,
    location: Option<u32>,
    start: Option<NaiveDate>,
    days: Option<u32>,
    margin: Option<u32>,
    chart: bool,
    json: bool,
    search: Option<String>,
    verbose: bool,
    help: bool,
}

/// Parse options, not including the program name.
fn parse_args<I: IntoIterator<Item = String>>(args: I) -> anyhow::Result<Args> {
    let mut parsed = Args::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        let mut value = |name: &str| {
            args.next()
                .ok_or_else(|| anyhow!("{name} needs a value"))
        };
        match arg.as_str() {
            "--config" => parsed.config = Some(PathBuf::from(value("--config")?)),
            "--location" => {
                parsed.location = Some(value("--location")?.parse().context("--location")?)
            }
            "--start" => {
                let date = value("--start")?;
                parsed.start = Some(
                    NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                        .with_context(|| format!("--start {date}"))?,
                );
            }
            "--days" => parsed.days = Some(value("--days")?.parse().context("--days")?),
            "--margin" => parsed.margin = Some(value("--margin")?.parse().context("--margin")?),
            "--search" => parsed.search = Some(value("--search")?),
            "--chart" => parsed.chart = true,
            "--json" => parsed.json = true,
            "--verbose" => parsed.verbose = true,
            "--help" | "-h" => parsed.help = true,
            other => bail!("unknown option {other}\n\n{USAGE}"),
        }
    }

    Ok(parsed)
}

/// Apply command line overrides on top of the loaded configuration.
fn apply_overrides(config: &mut Config, args: &Args) {
    if let Some(id) = args.location {
        config.location.id = id;
    }
    if let Some(days) = args.days {
        config.forecast.days = days;
    }
    if let Some(hours) = args.margin {
        config.forecast.safe_hours = hours;
    }
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    let args = parse_args(env::args().skip(1))?;
    if args.help {
        println!("{USAGE}");
        return Ok(());
    }

    // Logs go to stderr so the report and JSON stay clean on stdout
    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let mut config = match &args.config {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    };
    apply_overrides(&mut config, &args);
    tracing::debug!(?config, "effective configuration");

    let client = WillyWeatherClient::new(&config.api).context("cannot create Willy Weather client")?;

    // Create Tokio runtime for the network calls
    let rt = tokio::runtime::Runtime::new()?;

    if let Some(query) = &args.search {
        let locations = rt.block_on(client.search(query))?;
        for location in locations {
            println!(
                "{:>6}  {}, {}, {} ({})",
                location.id, location.name, location.region, location.state, location.time_zone
            );
        }
        return Ok(());
    }

    let start = args
        .start
        .unwrap_or_else(|| weekend_start(Local::now().date_naive()));
    tracing::info!(
        location = config.location.id,
        %start,
        days = config.forecast.days,
        safe_hours = config.forecast.safe_hours,
        "building forecast"
    );

    let forecast = match rt.block_on(client.forecast(
        config.location.id,
        start,
        config.forecast.days,
        config.forecast.margin(),
    )) {
        Ok(forecast) => forecast,
        Err(ForecastError::NoData { .. }) => {
            bail!("No tide data available for selected location")
        }
        Err(err) => return Err(err).context("could not build forecast"),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&forecast)?);
    } else {
        draw_ascii(&forecast, &config.forecast, args.chart);
    }

    Ok(())
}
