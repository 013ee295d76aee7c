use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use inquire::{Password, Select, Text};
use skyview_core::{
    Background, Config, DailySampling, Orchestrator, Query, Units, config::API_KEY_ENV,
};

use crate::{render, watch};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "skyview", version, about = "Current weather and a short forecast for any city")]
pub struct Cli {
    /// Log debug output to stderr (RUST_LOG overrides).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key and startup defaults.
    Configure,

    /// Fetch and print the weather once.
    Show {
        /// City name; defaults to the configured city.
        city: Option<String>,

        /// "metric" or "imperial".
        #[arg(long, short)]
        units: Option<Units>,

        /// How daily entries are picked: "stride" or "calendar".
        #[arg(long)]
        sampling: Option<DailySampling>,

        /// Print the record as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Interactive session: type a city and press Enter, `:u` toggles units.
    Watch {
        /// Starting city; defaults to the configured city.
        city: Option<String>,

        #[arg(long, short)]
        units: Option<Units>,

        #[arg(long)]
        sampling: Option<DailySampling>,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { city, units, sampling, json } => {
                let config = load_config()?;
                let query = query_from(&config, city, units);
                let orchestrator = orchestrator_from(&config, sampling)?;

                let weather = orchestrator
                    .fetch(&query)
                    .await
                    .with_context(|| format!("Could not show weather for '{}'", query.city))?;
                let background = Background::for_temperature(weather.temp, weather.units);

                if json {
                    let out = serde_json::json!({
                        "weather": weather,
                        "background": background,
                        "background_image": background.image(),
                    });
                    println!("{}", serde_json::to_string_pretty(&out)?);
                } else {
                    println!("{}", render::weather(&weather, background));
                }
                Ok(())
            }
            Command::Watch { city, units, sampling } => {
                let config = load_config()?;
                let query = query_from(&config, city, units);
                let orchestrator = orchestrator_from(&config, sampling)?;

                watch::run(orchestrator, query).await
            }
        }
    }
}

fn load_config() -> Result<Config> {
    let mut config = Config::load()?;
    config.apply_env();
    Ok(config)
}

fn query_from(config: &Config, city: Option<String>, units: Option<Units>) -> Query {
    Query::new(
        city.unwrap_or_else(|| config.defaults.city.clone()),
        units.unwrap_or(config.defaults.units),
    )
}

fn orchestrator_from(config: &Config, sampling: Option<DailySampling>) -> Result<Orchestrator> {
    let mut client = config.client_config()?;
    if let Some(sampling) = sampling {
        client.sampling = sampling;
    }

    Orchestrator::from_config(&client).context("Failed to build HTTP client")
}

fn configure() -> Result<()> {
    let mut config = Config::load()?;

    let key = Password::new("OpenWeather API key:")
        .without_confirmation()
        .with_help_message(&format!("Stored in the config file; {API_KEY_ENV} overrides it"))
        .prompt()
        .context("API key prompt aborted")?;
    let key = key.trim();
    if !key.is_empty() {
        config.set_api_key(key.to_string());
    }

    let city = Text::new("Default city:")
        .with_default(&config.defaults.city)
        .prompt()
        .context("City prompt aborted")?;
    if !city.trim().is_empty() {
        config.defaults.city = city.trim().to_string();
    }

    let start = Units::all().iter().position(|u| *u == config.defaults.units).unwrap_or(0);
    config.defaults.units = Select::new("Default units:", Units::all().to_vec())
        .with_starting_cursor(start)
        .prompt()
        .context("Units prompt aborted")?;

    let path = config.save()?;
    println!("Saved configuration to {}", path.display());

    if !config.is_configured() {
        println!("No API key stored yet; set {API_KEY_ENV} or run `skyview configure` again.");
    }

    Ok(())
}
