use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::convert::TryFrom;
use std::time::Duration;

use trv_weather_core::{
    Config, MeasurementKind, SensorConfig, ThrottledFetcher, TrafikverketSource,
    WeatherStationSensor,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "trv-weather", version, about = "Trafikverket weather-station CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the Trafikverket API key.
    Configure,

    /// Add a station sensor to the configuration.
    Add {
        /// Display name for the sensor.
        name: String,

        /// Station name as known to Trafikverket, e.g. "Lanna".
        #[arg(long)]
        station: String,

        /// Measurement kind: "air" or "road".
        #[arg(long)]
        kind: String,
    },

    /// List configured sensors.
    List,

    /// Remove a sensor by name.
    Remove {
        /// Display name of the sensor to remove.
        name: String,
    },

    /// Fetch and print the current value of one sensor.
    Show {
        /// Display name of the sensor.
        name: String,
    },

    /// Poll one sensor on a fixed cadence and print each reading.
    Watch {
        /// Display name of the sensor.
        name: String,

        /// Seconds between polls. The fetcher still enforces its own minimum
        /// interval between outbound requests.
        #[arg(long, default_value_t = 60)]
        every: u64,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Add { name, station, kind } => add(name, station, kind),
            Command::List => list(),
            Command::Remove { name } => remove(name),
            Command::Show { name } => show(name).await,
            Command::Watch { name, every } => watch(name, every).await,
        }
    }
}

fn configure() -> Result<()> {
    let mut config = Config::load()?;

    let api_key = inquire::Password::new("Trafikverket API key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    if api_key.trim().is_empty() {
        bail!("API key must not be empty");
    }

    config.set_api_key(api_key);
    config.save()?;

    println!("API key saved to {}", Config::config_file_path()?.display());
    Ok(())
}

fn add(name: String, station: String, kind: String) -> Result<()> {
    let kind = MeasurementKind::try_from(kind.as_str())?;
    let sensor = SensorConfig::new(name, station, kind)?;

    let mut config = Config::load()?;
    config.add_sensor(sensor.clone())?;
    config.save()?;

    println!(
        "Added sensor '{}' ({} temperature at station '{}')",
        sensor.name, sensor.kind, sensor.station
    );
    Ok(())
}

fn list() -> Result<()> {
    let config = Config::load()?;

    if config.sensors.is_empty() {
        println!(
            "No sensors configured.\n\
             Hint: run `trv-weather add <name> --station <station> --kind air|road`."
        );
        return Ok(());
    }

    for sensor in &config.sensors {
        println!("{}  station={}  kind={}", sensor.name, sensor.station, sensor.kind);
    }
    Ok(())
}

fn remove(name: String) -> Result<()> {
    let mut config = Config::load()?;
    let removed = config.remove_sensor(&name)?;
    config.save()?;

    println!("Removed sensor '{}'", removed.name);
    Ok(())
}

async fn show(name: String) -> Result<()> {
    let mut sensor = build_sensor(&name)?;

    sensor.update(Utc::now()).await;
    print_reading(&sensor);
    println!("({})", sensor.attribution());

    Ok(())
}

async fn watch(name: String, every: u64) -> Result<()> {
    let mut sensor = build_sensor(&name)?;
    let mut ticker = tokio::time::interval(Duration::from_secs(every.max(1)));

    tracing::info!(sensor = %sensor.name(), every, "starting watch loop");

    loop {
        ticker.tick().await;
        sensor.update(Utc::now()).await;
        print_reading(&sensor);
    }
}

/// Wire a configured sensor to the live Trafikverket source.
fn build_sensor(name: &str) -> Result<WeatherStationSensor<TrafikverketSource>> {
    let config = Config::load()?;
    let api_key = config.require_api_key()?;
    let sensor_config = config.sensor(name)?;

    let source = TrafikverketSource::new(api_key.to_owned())?;
    let query = sensor_config.query()?;
    let fetcher = ThrottledFetcher::new(source, query);

    Ok(WeatherStationSensor::new(sensor_config.name.clone(), fetcher))
}

fn print_reading(sensor: &WeatherStationSensor<TrafikverketSource>) {
    match sensor.state() {
        Some(celsius) => {
            println!("{}: {:.1} {}", sensor.name(), celsius, sensor.unit_of_measurement());
        }
        None => println!("{}: no reading yet", sensor.name()),
    }
}
