use thiserror::Error;

use crate::model::Coordinates;

/// Coarse classification shared by every pipeline error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NetworkFailure,
    NotFound,
    MalformedResponse,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("city not found: {0}")]
    NotFound(String),

    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected payload: {0}")]
    Malformed(String),
}

impl ProviderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProviderError::Network(_) => ErrorKind::NetworkFailure,
            ProviderError::Status { .. } => ErrorKind::NetworkFailure,
            ProviderError::NotFound(_) => ErrorKind::NotFound,
            ProviderError::Malformed(_) => ErrorKind::MalformedResponse,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum FormatError {
    #[error("forecast has {available} samples, need index {needed}")]
    NotEnoughSamples { needed: usize, available: usize },

    #[error("forecast covers {available} days, need {needed}")]
    NotEnoughDays { needed: usize, available: usize },

    #[error("timestamp {0} is out of range")]
    Timestamp(i64),

    #[error("timezone offset {0}s is out of range")]
    Offset(i32),
}

/// Failure of one of the fetch pipeline stages.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("current weather lookup for '{city}' failed")]
    Current {
        city: String,
        #[source]
        source: ProviderError,
    },

    #[error("forecast lookup at {coordinates} failed")]
    Forecast {
        coordinates: Coordinates,
        #[source]
        source: ProviderError,
    },

    #[error("could not format weather for '{city}'")]
    Format {
        city: String,
        #[source]
        source: FormatError,
    },
}

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::Current { source, .. } | FetchError::Forecast { source, .. } => {
                source.kind()
            }
            FetchError::Format { .. } => ErrorKind::MalformedResponse,
        }
    }

    /// One-line message including the underlying cause.
    pub fn display_chain(&self) -> String {
        match self {
            FetchError::Current { source, .. } | FetchError::Forecast { source, .. } => {
                format!("{self}: {source}")
            }
            FetchError::Format { source, .. } => format!("{self}: {source}"),
        }
    }
}
