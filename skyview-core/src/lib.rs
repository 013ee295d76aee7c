//! Core library for the `skyview` weather app.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Abstraction over weather providers, with an OpenWeather client
//! - The fetch pipeline turning a city and unit system into a display-ready record
//! - Shell state: the re-fetch trigger policy and background selection
//!
//! It is used by `skyview-cli`, but can also be reused by other front ends.

pub mod config;
pub mod error;
pub mod format;
pub mod model;
pub mod orchestrator;
pub mod provider;
pub mod session;
pub mod shell;

pub use config::{ClientConfig, Config, IconConfig};
pub use error::{ErrorKind, FetchError, FormatError, ProviderError};
pub use format::DailySampling;
pub use model::{DailySummary, FormattedWeather, Query, Units};
pub use orchestrator::Orchestrator;
pub use provider::{OpenWeatherProvider, WeatherProvider};
pub use session::Session;
pub use shell::{Action, Background, FetchTicket, Outcome, Shell};
