use crate::config::ConfigError;
use crate::stations::error::StationConfigError;
use crate::upstream::error::UpstreamError;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Every error the hub can return.
///
/// All variants are `Clone` so that callers sharing one in-flight fetch can each receive the same
/// outcome.
#[derive(Debug, Clone, Error)]
pub enum MeteoHubError {
    #[error(transparent)]
    InvalidInput(#[from] InvalidInput),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    StationConfig(#[from] StationConfigError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Internal fault: {0}")]
    Internal(String),
}

/// Coarse classification used to pick an HTTP status and a recovery strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller asked for something that cannot be served. Never retried.
    InvalidInput,
    /// The provider could not be reached or answered with something unusable.
    UpstreamUnavailable,
    /// A bug or a broken deployment.
    InternalFault,
}

impl MeteoHubError {
    /// Classifies the error for status mapping and recovery.
    pub fn kind(&self) -> ErrorKind {
        match self {
            MeteoHubError::InvalidInput(_) => ErrorKind::InvalidInput,
            MeteoHubError::Upstream(_) => ErrorKind::UpstreamUnavailable,
            MeteoHubError::StationConfig(_)
            | MeteoHubError::Config(_)
            | MeteoHubError::Internal(_) => ErrorKind::InternalFault,
        }
    }

    pub fn is_upstream_unavailable(&self) -> bool {
        self.kind() == ErrorKind::UpstreamUnavailable
    }
}

/// Requests rejected before any upstream call is made.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidInput {
    #[error("Station {0} not found")]
    UnknownStation(u32),

    #[error("Station '{0}' not found, station ids are numeric")]
    StationId(String),

    #[error("Hour count {hours} is out of range, expected 1 to {max}")]
    WindowHours { hours: u32, max: u32 },

    #[error("Window start {0} lies in the future")]
    FutureStart(DateTime<Utc>),

    #[error("Invalid period '{0}', expected one of 24h, 48h, 72h")]
    Period(String),

    #[error("Unknown variables: {}", invalid.join(", "))]
    UnknownParameters { invalid: Vec<String> },

    #[error("Invalid station list '{0}', expected comma separated numeric ids")]
    StationList(String),

    #[error("At least one station id is required")]
    NoStations,

    #[error("Invalid value '{value}' for '{name}'")]
    QueryValue { name: &'static str, value: String },
}
