use crate::types::series::TimeSeries;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a forecast is requested for: a station, or a municipality by its place code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "camelCase")]
pub enum ForecastTarget {
    Station(u32),
    Municipality(String),
}

impl fmt::Display for ForecastTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForecastTarget::Station(id) => write!(f, "station {}", id),
            ForecastTarget::Municipality(code) => write!(f, "municipality {}", code),
        }
    }
}

/// A multi-day forecast, one series per forecast parameter.
///
/// Forecast series are not tied to a station when the target is a municipality; their
/// `station_id` is `0` in that case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastBundle {
    pub target: ForecastTarget,
    pub issued_at: Option<DateTime<Utc>>,
    pub series: Vec<TimeSeries>,
}
