use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt};

/// Unit system the provider reports values in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

impl Units {
    /// Value of the provider's `units` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Units::Metric => Units::Imperial,
            Units::Imperial => Units::Metric,
        }
    }

    pub fn temperature_symbol(&self) -> &'static str {
        match self {
            Units::Metric => "°C",
            Units::Imperial => "°F",
        }
    }

    pub fn speed_unit(&self) -> &'static str {
        match self {
            Units::Metric => "m/s",
            Units::Imperial => "mph",
        }
    }

    /// Temperatures at or below this value get the cold background.
    pub fn background_threshold(&self) -> f64 {
        match self {
            Units::Metric => 20.0,
            Units::Imperial => 60.0,
        }
    }

    pub const fn all() -> &'static [Units] {
        &[Units::Metric, Units::Imperial]
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Units {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "metric" | "c" | "celsius" => Ok(Units::Metric),
            "imperial" | "f" | "fahrenheit" => Ok(Units::Imperial),
            _ => Err(anyhow::anyhow!(
                "Unknown unit system '{value}'. Supported: metric, imperial."
            )),
        }
    }
}

impl std::str::FromStr for Units {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Units::try_from(s)
    }
}

/// The (city, unit system) pair that drives a fetch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Query {
    pub city: String,
    pub units: Units,
}

impl Query {
    pub const DEFAULT_CITY: &'static str = "Paris";

    pub fn new(city: impl Into<String>, units: Units) -> Self {
        Self {
            city: city.into(),
            units,
        }
    }
}

impl Default for Query {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CITY, Units::Metric)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4},{:.4}", self.lat, self.lon)
    }
}

/// Current conditions for a city, as returned by the first pipeline stage.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentConditions {
    pub name: String,
    pub country: String,
    pub description: String,
    pub icon: String,
    pub temp: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub humidity: u8,
    pub speed: f64,
    /// Epoch seconds.
    pub observed_at: i64,
    pub sunrise: i64,
    pub sunset: i64,
    /// Offset from UTC in seconds for the city.
    pub timezone_offset: i32,
    pub coordinates: Coordinates,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSample {
    pub dt: i64,
    pub temp: f64,
    pub icon: String,
}

/// Forecast samples in provider order, as returned by the second stage.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ForecastSeries {
    pub samples: Vec<ForecastSample>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub temp: f64,
    pub title: String,
    pub icon_url: String,
}

/// Display-ready weather record, built once per successful fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattedWeather {
    pub name: String,
    pub country: String,
    pub description: String,
    pub icon_url: String,
    pub units: Units,
    pub temp: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub humidity: u8,
    pub speed: f64,
    pub sunrise: String,
    pub sunset: String,
    pub formatted_local_time: String,
    pub timezone_offset: i32,
    pub daily: Vec<DailySummary>,
}

impl FormattedWeather {
    /// Headline temperature, rounded half away from zero, e.g. `15 °C`.
    pub fn display_temp(&self) -> String {
        format_temperature(self.temp, self.units)
    }
}

pub fn format_temperature(value: f64, units: Units) -> String {
    format!("{} {}", value.round() as i64, units.temperature_symbol())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn units_as_str_roundtrip() {
        for units in Units::all() {
            let parsed = Units::try_from(units.as_str()).expect("roundtrip should succeed");
            assert_eq!(*units, parsed);
        }
    }

    #[test]
    fn units_accept_short_forms() {
        assert_eq!("F".parse::<Units>().unwrap(), Units::Imperial);
        assert_eq!(" celsius ".parse::<Units>().unwrap(), Units::Metric);
    }

    #[test]
    fn unknown_units_error() {
        let err = Units::try_from("kelvin").unwrap_err();
        assert!(err.to_string().contains("Unknown unit system"));
    }

    #[test]
    fn toggle_flips_both_ways() {
        assert_eq!(Units::Metric.toggle(), Units::Imperial);
        assert_eq!(Units::Imperial.toggle(), Units::Metric);
    }

    #[test]
    fn default_query_is_paris_metric() {
        let q = Query::default();
        assert_eq!(q.city, "Paris");
        assert_eq!(q.units, Units::Metric);
    }

    #[test]
    fn temperature_rounds_like_the_display() {
        assert_eq!(format_temperature(15.0, Units::Metric), "15 °C");
        assert_eq!(format_temperature(64.5, Units::Imperial), "65 °F");
        assert_eq!(format_temperature(-2.5, Units::Metric), "-3 °C");
    }
}
