use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use tracing::{debug, instrument};

use crate::{
    config::ClientConfig,
    error::ProviderError,
    model::{Coordinates, CurrentConditions, ForecastSample, ForecastSeries, Units},
};

use super::{WeatherProvider, truncate_body};

/// Client for the OpenWeather 2.5 `weather` and `forecast` endpoints.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(config: &ClientConfig) -> Result<Self, ProviderError> {
        let http = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            http,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
        not_found: impl FnOnce() -> String,
    ) -> Result<T, ProviderError> {
        let url = format!("{}/{endpoint}", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(params)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;
        debug!(%status, endpoint, bytes = body.len(), "OpenWeather responded");

        if status == StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound(not_found()));
        }

        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            ProviderError::Malformed(format!("{endpoint}: {e} in {}", truncate_body(&body)))
        })
    }
}

#[derive(Debug, Deserialize)]
struct OwCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    temp_min: f64,
    temp_max: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    #[serde(default)]
    country: String,
    sunrise: i64,
    sunset: i64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    dt: i64,
    timezone: i32,
    coord: OwCoord,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    sys: OwSys,
}

#[derive(Debug, Deserialize)]
struct OwForecastMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwForecastMain,
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastEntry>,
}

impl OwCurrentResponse {
    fn into_conditions(self) -> Result<CurrentConditions, ProviderError> {
        let condition = self.weather.into_iter().next().ok_or_else(|| {
            ProviderError::Malformed("current weather has no conditions".to_string())
        })?;

        Ok(CurrentConditions {
            name: self.name,
            country: self.sys.country,
            description: condition.description,
            icon: condition.icon,
            temp: self.main.temp,
            feels_like: self.main.feels_like,
            temp_min: self.main.temp_min,
            temp_max: self.main.temp_max,
            humidity: self.main.humidity,
            speed: self.wind.speed,
            observed_at: self.dt,
            sunrise: self.sys.sunrise,
            sunset: self.sys.sunset,
            timezone_offset: self.timezone,
            coordinates: Coordinates {
                lat: self.coord.lat,
                lon: self.coord.lon,
            },
        })
    }
}

impl OwForecastResponse {
    fn into_series(self) -> Result<ForecastSeries, ProviderError> {
        let samples = self
            .list
            .into_iter()
            .map(|entry| {
                let icon = entry
                    .weather
                    .into_iter()
                    .next()
                    .map(|w| w.icon)
                    .ok_or_else(|| {
                        ProviderError::Malformed(format!(
                            "forecast sample {} has no conditions",
                            entry.dt
                        ))
                    })?;

                Ok(ForecastSample {
                    dt: entry.dt,
                    temp: entry.main.temp,
                    icon,
                })
            })
            .collect::<Result<Vec<_>, ProviderError>>()?;

        Ok(ForecastSeries { samples })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    #[instrument(skip(self, units), fields(units = %units))]
    async fn current(&self, city: &str, units: Units) -> Result<CurrentConditions, ProviderError> {
        let parsed: OwCurrentResponse = self
            .get_json("weather", &[("q", city), ("units", units.as_str())], || city.to_string())
            .await?;

        parsed.into_conditions()
    }

    #[instrument(skip(self, units), fields(units = %units))]
    async fn forecast(
        &self,
        coordinates: Coordinates,
        units: Units,
    ) -> Result<ForecastSeries, ProviderError> {
        let lat = coordinates.lat.to_string();
        let lon = coordinates.lon.to_string();

        let parsed: OwForecastResponse = self
            .get_json(
                "forecast",
                &[("lat", lat.as_str()), ("lon", lon.as_str()), ("units", units.as_str())],
                || format!("no forecast at {coordinates}"),
            )
            .await?;

        parsed.into_series()
    }
}
