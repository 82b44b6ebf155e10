//! Typed views of the provider's JSON payloads and their translation into series.
//!
//! Parsing fails closed: a missing observation list or timestamp turns the whole payload into a
//! [`UpstreamError::MalformedPayload`]. Unknown fields are ignored with a warning.

use crate::types::parameter::ParameterCode;
use crate::types::series::{ObservationPoint, TimeSeries};
use crate::types::station::Station;
use crate::upstream::error::UpstreamError;
use chrono::{DateTime, NaiveDateTime, Utc};
use log::{debug, warn};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

pub(crate) const OBSERVATION_TIME_FIELD: &str = "observationTimeUtc";
pub(crate) const FORECAST_TIME_FIELD: &str = "forecastTimeUtc";

/// `/stations/{id}/observations[/latest]`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ObservationsResponse {
    #[serde(default)]
    pub station_id: Option<u32>,
    pub observations: Vec<Map<String, Value>>,
}

/// `/forecasts/stations/{id}` and `/forecasts/places/{code}`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ForecastResponse {
    #[serde(default)]
    pub forecast_creation_time_utc: Option<String>,
    pub forecast_timestamps: Vec<Map<String, Value>>,
}

/// Accepts RFC 3339 as well as the provider's `YYYY-MM-DD HH:MM:SS` (UTC) format.
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Converts provider rows into one series per parameter, in first-seen parameter order.
///
/// When `station` is given, values for parameters it does not support are dropped.
pub(crate) fn rows_to_series(
    url: &str,
    station_id: u32,
    station: Option<&Station>,
    rows: &[Map<String, Value>],
    time_field: &str,
) -> Result<Vec<TimeSeries>, UpstreamError> {
    let mut collected: Vec<(ParameterCode, Vec<ObservationPoint>)> = Vec::new();
    let mut unknown_fields: BTreeSet<&str> = BTreeSet::new();
    let mut unsupported: BTreeSet<ParameterCode> = BTreeSet::new();

    for row in rows {
        let timestamp = row
            .get(time_field)
            .and_then(Value::as_str)
            .and_then(parse_timestamp)
            .ok_or_else(|| {
                UpstreamError::malformed(url, format!("row without a valid '{}'", time_field))
            })?;

        for (field, raw_value) in row {
            if field == time_field {
                continue;
            }
            let Some(mapping) = ParameterCode::from_upstream(field) else {
                unknown_fields.insert(field.as_str());
                continue;
            };
            if station.is_some_and(|s| !s.supports(mapping.code)) {
                unsupported.insert(mapping.code);
                continue;
            }
            let value = match raw_value {
                Value::Null => None,
                Value::Number(n) => n.as_f64().map(|v| v * mapping.scale),
                Value::String(s) => match s.trim().parse::<f64>() {
                    Ok(v) => Some(v * mapping.scale),
                    Err(_) => {
                        warn!(
                            "Dropping non-numeric value '{}' for {} at {} from {}",
                            s, field, timestamp, url
                        );
                        continue;
                    }
                },
                other => {
                    warn!(
                        "Dropping unexpected value {} for {} at {} from {}",
                        other, field, timestamp, url
                    );
                    continue;
                }
            };

            let point = ObservationPoint::new(timestamp, value);
            match collected.iter_mut().find(|(code, _)| *code == mapping.code) {
                Some((_, points)) => points.push(point),
                None => collected.push((mapping.code, vec![point])),
            }
        }
    }

    if !unknown_fields.is_empty() {
        warn!(
            "Ignoring unknown upstream fields from {}: {}",
            url,
            unknown_fields.into_iter().collect::<Vec<_>>().join(", ")
        );
    }
    if !unsupported.is_empty() {
        debug!(
            "Station {} does not support {:?}, dropped those values",
            station_id, unsupported
        );
    }

    Ok(collected
        .into_iter()
        .map(|(code, points)| TimeSeries::from_points(station_id, code, points))
        .collect())
}
