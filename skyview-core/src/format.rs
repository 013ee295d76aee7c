//! Pure transformation from provider payloads into a [`FormattedWeather`].

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{
    config::IconConfig,
    error::FormatError,
    model::{
        CurrentConditions, DailySummary, ForecastSample, ForecastSeries, FormattedWeather, Units,
    },
};

pub const DAILY_LEN: usize = 4;

/// List offsets used by [`DailySampling::Stride`]: 3-hour samples, one per 24 hours.
pub const DAILY_OFFSETS: [usize; DAILY_LEN] = [0, 8, 16, 24];

const LOCAL_TIME_FORMAT: &str = "%A, %d %b %Y | Local time: %I:%M %p";
const CLOCK_FORMAT: &str = "%I:%M %p";
const DAY_TITLE_FORMAT: &str = "%a";

/// How the four daily entries are picked out of the forecast list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DailySampling {
    /// Fixed list offsets, see [`DAILY_OFFSETS`].
    #[default]
    Stride,
    /// First four local calendar dates, taking the sample nearest noon.
    Calendar,
}

impl std::str::FromStr for DailySampling {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stride" => Ok(DailySampling::Stride),
            "calendar" => Ok(DailySampling::Calendar),
            _ => Err(anyhow::anyhow!(
                "Unknown sampling '{s}'. Supported: stride, calendar."
            )),
        }
    }
}

pub fn format_weather(
    current: &CurrentConditions,
    forecast: &ForecastSeries,
    units: Units,
    icons: &IconConfig,
    sampling: DailySampling,
) -> Result<FormattedWeather, FormatError> {
    let offset = current.timezone_offset;

    let picked = match sampling {
        DailySampling::Stride => sample_by_stride(forecast)?,
        DailySampling::Calendar => sample_by_calendar(forecast, offset)?,
    };

    let daily = picked
        .into_iter()
        .map(|sample| {
            Ok(DailySummary {
                temp: sample.temp,
                title: format_local(sample.dt, offset, DAY_TITLE_FORMAT)?,
                icon_url: icons.url_for(&sample.icon),
            })
        })
        .collect::<Result<Vec<_>, FormatError>>()?;

    Ok(FormattedWeather {
        name: current.name.clone(),
        country: current.country.clone(),
        description: current.description.clone(),
        icon_url: icons.url_for(&current.icon),
        units,
        temp: current.temp,
        feels_like: current.feels_like,
        temp_min: current.temp_min,
        temp_max: current.temp_max,
        humidity: current.humidity,
        speed: current.speed,
        sunrise: format_local(current.sunrise, offset, CLOCK_FORMAT)?,
        sunset: format_local(current.sunset, offset, CLOCK_FORMAT)?,
        formatted_local_time: format_local(current.observed_at, offset, LOCAL_TIME_FORMAT)?,
        timezone_offset: offset,
        daily,
    })
}

/// Epoch seconds shifted into the city's fixed UTC offset.
pub fn local_datetime(ts: i64, offset_secs: i32) -> Result<DateTime<FixedOffset>, FormatError> {
    let offset = FixedOffset::east_opt(offset_secs).ok_or(FormatError::Offset(offset_secs))?;
    let utc = DateTime::from_timestamp(ts, 0).ok_or(FormatError::Timestamp(ts))?;
    Ok(utc.with_timezone(&offset))
}

pub fn format_local(ts: i64, offset_secs: i32, fmt: &str) -> Result<String, FormatError> {
    Ok(local_datetime(ts, offset_secs)?.format(fmt).to_string())
}

fn sample_by_stride(forecast: &ForecastSeries) -> Result<Vec<&ForecastSample>, FormatError> {
    DAILY_OFFSETS
        .iter()
        .map(|&idx| {
            forecast.samples.get(idx).ok_or(FormatError::NotEnoughSamples {
                needed: idx,
                available: forecast.samples.len(),
            })
        })
        .collect()
}

fn sample_by_calendar(
    forecast: &ForecastSeries,
    offset_secs: i32,
) -> Result<Vec<&ForecastSample>, FormatError> {
    let noon = NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default();
    let mut by_date: BTreeMap<NaiveDate, (i64, &ForecastSample)> = BTreeMap::new();

    for sample in &forecast.samples {
        let local = local_datetime(sample.dt, offset_secs)?;
        let distance = (local.time() - noon).num_seconds().abs();

        by_date
            .entry(local.date_naive())
            .and_modify(|best| {
                if distance < best.0 {
                    *best = (distance, sample);
                }
            })
            .or_insert((distance, sample));
    }

    if by_date.len() < DAILY_LEN {
        return Err(FormatError::NotEnoughDays {
            needed: DAILY_LEN,
            available: by_date.len(),
        });
    }

    Ok(by_date.into_values().take(DAILY_LEN).map(|(_, sample)| sample).collect())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::Coordinates;

    // 2024-01-15 12:00:00 UTC, a Monday.
    pub(crate) const NOON_UTC: i64 = 1_705_320_000;
    const HOUR: i64 = 3600;

    pub(crate) fn sample_current(temp: f64) -> CurrentConditions {
        CurrentConditions {
            name: "Paris".into(),
            country: "FR".into(),
            description: "light rain".into(),
            icon: "10d".into(),
            temp,
            feels_like: temp - 1.0,
            temp_min: temp - 2.0,
            temp_max: temp + 2.0,
            humidity: 81,
            speed: 4.1,
            observed_at: NOON_UTC,
            // 07:40 and 17:15 local (UTC+1).
            sunrise: NOON_UTC - 5 * HOUR - 20 * 60,
            sunset: NOON_UTC + 4 * HOUR + 15 * 60,
            timezone_offset: 3600,
            coordinates: Coordinates {
                lat: 48.8534,
                lon: 2.3488,
            },
        }
    }

    /// `count` samples three hours apart starting at `NOON_UTC`, temp = index.
    pub(crate) fn sample_forecast(count: usize) -> ForecastSeries {
        ForecastSeries {
            samples: (0..count)
                .map(|i| ForecastSample {
                    dt: NOON_UTC + 3 * HOUR * i as i64,
                    temp: i as f64,
                    icon: format!("{:02}d", i % 50),
                })
                .collect(),
        }
    }

    #[test]
    fn formats_local_times_with_offset() {
        let weather = format_weather(
            &sample_current(15.0),
            &sample_forecast(40),
            Units::Metric,
            &IconConfig::default(),
            DailySampling::Stride,
        )
        .expect("format");

        assert_eq!(weather.sunrise, "07:40 AM");
        assert_eq!(weather.sunset, "05:15 PM");
        assert_eq!(weather.formatted_local_time, "Monday, 15 Jan 2024 | Local time: 01:00 PM");
        assert_eq!(weather.icon_url, "https://openweathermap.org/img/wn/2x/10d.png");
        assert_eq!(weather.display_temp(), "15 °C");
    }

    #[test]
    fn stride_picks_fixed_offsets() {
        let weather = format_weather(
            &sample_current(15.0),
            &sample_forecast(40),
            Units::Metric,
            &IconConfig::default(),
            DailySampling::Stride,
        )
        .expect("format");

        let temps: Vec<f64> = weather.daily.iter().map(|d| d.temp).collect();
        assert_eq!(temps, vec![0.0, 8.0, 16.0, 24.0]);

        let titles: Vec<&str> = weather.daily.iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles, vec!["Mon", "Tue", "Wed", "Thu"]);
        assert_eq!(weather.daily[1].icon_url, "https://openweathermap.org/img/wn/2x/08d.png");
    }

    #[test]
    fn stride_rejects_short_forecast() {
        let err = format_weather(
            &sample_current(15.0),
            &sample_forecast(24),
            Units::Metric,
            &IconConfig::default(),
            DailySampling::Stride,
        )
        .unwrap_err();

        assert_eq!(
            err,
            FormatError::NotEnoughSamples {
                needed: 24,
                available: 24
            }
        );
    }

    #[test]
    fn calendar_picks_sample_nearest_local_noon() {
        // Samples land at 01:00, 04:00, ... 22:00 local; 13:00 is the closest to noon each day.
        let weather = format_weather(
            &sample_current(15.0),
            &sample_forecast(40),
            Units::Metric,
            &IconConfig::default(),
            DailySampling::Calendar,
        )
        .expect("format");

        assert_eq!(weather.daily.len(), DAILY_LEN);
        let titles: Vec<&str> = weather.daily.iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles, vec!["Mon", "Tue", "Wed", "Thu"]);
        // Local 13:00 samples are index 0, 8, 16, 24.
        let temps: Vec<f64> = weather.daily.iter().map(|d| d.temp).collect();
        assert_eq!(temps, vec![0.0, 8.0, 16.0, 24.0]);
    }

    #[test]
    fn calendar_rejects_too_few_days() {
        let err = format_weather(
            &sample_current(15.0),
            &sample_forecast(8),
            Units::Metric,
            &IconConfig::default(),
            DailySampling::Calendar,
        )
        .unwrap_err();

        assert!(matches!(err, FormatError::NotEnoughDays { needed: 4, .. }));
    }

    #[test]
    fn formatting_is_idempotent() {
        let current = sample_current(15.0);
        let forecast = sample_forecast(40);
        let icons = IconConfig::default();

        let a = format_weather(&current, &forecast, Units::Metric, &icons, DailySampling::Stride)
            .expect("format");
        let b = format_weather(&current, &forecast, Units::Metric, &icons, DailySampling::Stride)
            .expect("format");

        assert_eq!(
            serde_json::to_vec(&a).expect("json"),
            serde_json::to_vec(&b).expect("json")
        );
    }

    #[test]
    fn rejects_out_of_range_offset() {
        let err = local_datetime(NOON_UTC, 100_000).unwrap_err();
        assert_eq!(err, FormatError::Offset(100_000));
    }

    #[test]
    fn sampling_parses() {
        assert_eq!("Calendar".parse::<DailySampling>().unwrap(), DailySampling::Calendar);
        assert!("weekly".parse::<DailySampling>().is_err());
    }
}
