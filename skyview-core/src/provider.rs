use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    error::ProviderError,
    model::{Coordinates, CurrentConditions, ForecastSeries, Units},
};

pub mod openweather;

pub use openweather::OpenWeatherProvider;

/// The two calls the fetch pipeline makes against a weather service.
///
/// `current` resolves a city by name and yields its coordinates; `forecast`
/// takes those coordinates. Both report values in the requested unit system.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current(&self, city: &str, units: Units) -> Result<CurrentConditions, ProviderError>;

    async fn forecast(
        &self,
        coordinates: Coordinates,
        units: Units,
    ) -> Result<ForecastSeries, ProviderError>;
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}
