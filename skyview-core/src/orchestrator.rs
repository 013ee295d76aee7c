//! Two-stage fetch pipeline: city lookup, then forecast by coordinates,
//! then a pure formatting step.

use std::sync::Arc;
use tracing::{debug, instrument};

use crate::{
    config::{ClientConfig, IconConfig},
    error::{FetchError, ProviderError},
    format::{DailySampling, format_weather},
    model::{Coordinates, CurrentConditions, ForecastSeries, FormattedWeather, Query, Units},
    provider::{OpenWeatherProvider, WeatherProvider},
};

#[derive(Debug, Clone)]
pub struct Orchestrator {
    provider: Arc<dyn WeatherProvider>,
    icons: IconConfig,
    sampling: DailySampling,
}

impl Orchestrator {
    /// Build an orchestrator backed by OpenWeather.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ProviderError> {
        let provider = OpenWeatherProvider::new(config)?;
        Ok(Self::with_provider(Arc::new(provider), config.icons.clone(), config.sampling))
    }

    pub fn with_provider(
        provider: Arc<dyn WeatherProvider>,
        icons: IconConfig,
        sampling: DailySampling,
    ) -> Self {
        Self {
            provider,
            icons,
            sampling,
        }
    }

    /// Stage 1: resolve the city and its coordinates.
    pub async fn resolve_current(&self, query: &Query) -> Result<CurrentConditions, FetchError> {
        self.provider
            .current(&query.city, query.units)
            .await
            .map_err(|source| FetchError::Current {
                city: query.city.clone(),
                source,
            })
    }

    /// Stage 2: forecast for the coordinates found in stage 1.
    pub async fn resolve_forecast(
        &self,
        coordinates: Coordinates,
        units: Units,
    ) -> Result<ForecastSeries, FetchError> {
        self.provider
            .forecast(coordinates, units)
            .await
            .map_err(|source| FetchError::Forecast {
                coordinates,
                source,
            })
    }

    #[instrument(skip(self, query), fields(city = %query.city, units = %query.units))]
    pub async fn fetch(&self, query: &Query) -> Result<FormattedWeather, FetchError> {
        let current = self.resolve_current(query).await?;
        debug!(coordinates = %current.coordinates, "resolved city");

        let forecast = self.resolve_forecast(current.coordinates, query.units).await?;
        debug!(samples = forecast.samples.len(), "received forecast");

        format_weather(&current, &forecast, query.units, &self.icons, self.sampling)
            .map_err(|source| FetchError::Format {
                city: query.city.clone(),
                source,
            })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{
        error::ErrorKind,
        format::tests::{sample_current, sample_forecast},
    };
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    pub(crate) struct MockProvider {
        pub temp: f64,
        pub forecast_len: usize,
        pub fail_current: bool,
        pub fail_forecast: bool,
        pub calls: Mutex<Vec<String>>,
    }

    impl MockProvider {
        pub(crate) fn with_temp(temp: f64) -> Self {
            Self {
                temp,
                forecast_len: 40,
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().map(|c| c.clone()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl WeatherProvider for MockProvider {
        async fn current(
            &self,
            city: &str,
            units: Units,
        ) -> Result<CurrentConditions, ProviderError> {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push(format!("current:{city}:{units}"));
            }
            if self.fail_current {
                return Err(ProviderError::NotFound(city.to_string()));
            }
            let mut current = sample_current(self.temp);
            current.name = city.to_string();
            Ok(current)
        }

        async fn forecast(
            &self,
            coordinates: Coordinates,
            units: Units,
        ) -> Result<ForecastSeries, ProviderError> {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push(format!("forecast:{coordinates}:{units}"));
            }
            if self.fail_forecast {
                return Err(ProviderError::Status {
                    status: 503,
                    body: "busy".into(),
                });
            }
            Ok(sample_forecast(self.forecast_len))
        }
    }

    fn orchestrator(provider: Arc<MockProvider>) -> Orchestrator {
        Orchestrator::with_provider(provider, IconConfig::default(), DailySampling::Stride)
    }

    #[tokio::test]
    async fn fetch_chains_both_stages_with_same_units() {
        let provider = Arc::new(MockProvider::with_temp(65.0));
        let weather = orchestrator(provider.clone())
            .fetch(&Query::new("Paris", Units::Imperial))
            .await
            .expect("fetch");

        assert_eq!(weather.display_temp(), "65 °F");
        assert_eq!(weather.daily.len(), 4);
        assert_eq!(
            provider.calls(),
            vec!["current:Paris:imperial", "forecast:48.8534,2.3488:imperial"]
        );
    }

    #[tokio::test]
    async fn current_failure_skips_forecast() {
        let provider = Arc::new(MockProvider {
            fail_current: true,
            ..MockProvider::with_temp(1.0)
        });
        let err = orchestrator(provider.clone())
            .fetch(&Query::new("InvalidCityXYZ", Units::Metric))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(matches!(err, FetchError::Current { ref city, .. } if city == "InvalidCityXYZ"));
        assert_eq!(provider.calls().len(), 1);
    }

    #[tokio::test]
    async fn forecast_failure_is_tagged_with_its_stage() {
        let provider = Arc::new(MockProvider {
            fail_forecast: true,
            ..MockProvider::with_temp(1.0)
        });
        let err = orchestrator(provider).fetch(&Query::default()).await.unwrap_err();

        assert!(matches!(err, FetchError::Forecast { .. }));
        assert_eq!(err.kind(), ErrorKind::NetworkFailure);
    }

    #[tokio::test]
    async fn short_forecast_is_malformed() {
        let provider = Arc::new(MockProvider {
            forecast_len: 5,
            ..MockProvider::with_temp(1.0)
        });
        let err = orchestrator(provider).fetch(&Query::default()).await.unwrap_err();

        assert!(matches!(err, FetchError::Format { .. }));
        assert_eq!(err.kind(), ErrorKind::MalformedResponse);
    }

    #[tokio::test]
    async fn repeated_fetch_is_identical() {
        let orch = orchestrator(Arc::new(MockProvider::with_temp(15.0)));
        let query = Query::default();

        let a = orch.fetch(&query).await.expect("fetch");
        let b = orch.fetch(&query).await.expect("fetch");
        assert_eq!(a, b);
    }
}
