//! Presentation state and the re-fetch trigger policy.
//!
//! The shell owns the current [`Query`], the last successful record and the
//! selected background. Every change to the `(city, units)` pair issues a
//! [`FetchTicket`]; completions are matched back against the latest ticket so
//! a slow, superseded fetch can never overwrite newer data.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    error::{ErrorKind, FetchError},
    model::{FormattedWeather, Query, Units},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Background {
    Hot,
    Cold,
}

impl Background {
    /// `temp <= threshold` is cold; anything above is hot.
    pub fn for_temperature(temp: f64, units: Units) -> Self {
        if temp <= units.background_threshold() {
            Background::Cold
        } else {
            Background::Hot
        }
    }

    pub fn image(&self) -> &'static str {
        match self {
            Background::Hot => "assets/hot.jpg",
            Background::Cold => "assets/cold.jpg",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// City typed and confirmed with Enter.
    SubmitCity(String),
    ToggleUnits,
    /// Re-run the fetch for the current pair.
    Refresh,
}

/// A fetch the shell wants run, captured by value when issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub query: Query,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The record and background were replaced.
    Updated,
    /// The fetch failed; the previous record is still shown.
    Failed { kind: ErrorKind, message: String },
    /// A newer ticket was issued after this one; result dropped.
    Stale,
}

#[derive(Debug, Clone)]
pub struct Shell {
    query: Query,
    weather: Option<FormattedWeather>,
    background: Background,
    last_error: Option<String>,
    generation: u64,
}

impl Default for Shell {
    fn default() -> Self {
        Self::new(Query::default())
    }
}

impl Shell {
    pub fn new(query: Query) -> Self {
        Self {
            query,
            weather: None,
            background: Background::Hot,
            last_error: None,
            generation: 0,
        }
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn weather(&self) -> Option<&FormattedWeather> {
        self.weather.as_ref()
    }

    pub fn background(&self) -> Background {
        self.background
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Ticket for the initial fetch.
    pub fn start(&mut self) -> FetchTicket {
        self.issue()
    }

    /// Apply a user action. Returns a ticket only when the `(city, units)`
    /// pair changed, or on an explicit refresh.
    pub fn apply(&mut self, action: Action) -> Option<FetchTicket> {
        match action {
            Action::SubmitCity(city) => {
                let city = city.trim();
                if city.is_empty() || city == self.query.city {
                    return None;
                }
                self.query.city = city.to_string();
            }
            Action::ToggleUnits => {
                self.query.units = self.query.units.toggle();
            }
            Action::Refresh => {}
        }

        Some(self.issue())
    }

    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        ticket.generation == self.generation
    }

    /// Feed back the result of a ticket's fetch.
    pub fn complete(
        &mut self,
        ticket: &FetchTicket,
        result: Result<FormattedWeather, FetchError>,
    ) -> Outcome {
        if !self.is_current(ticket) {
            debug!(
                generation = ticket.generation,
                latest = self.generation,
                "dropping superseded fetch result"
            );
            return Outcome::Stale;
        }

        match result {
            Ok(weather) => {
                self.background = Background::for_temperature(weather.temp, ticket.query.units);
                self.weather = Some(weather);
                self.last_error = None;
                Outcome::Updated
            }
            Err(err) => {
                let message = err.display_chain();
                warn!(
                    city = %ticket.query.city,
                    error = %message,
                    "fetch failed, keeping previous record"
                );
                self.last_error = Some(message.clone());
                Outcome::Failed {
                    kind: err.kind(),
                    message,
                }
            }
        }
    }

    fn issue(&mut self) -> FetchTicket {
        self.generation += 1;
        FetchTicket {
            generation: self.generation,
            query: self.query.clone(),
        }
    }
}
