//! Query string models and their validation.
//!
//! Every field is taken as a raw string so that malformed values produce the hub's own JSON
//! errors instead of the framework's plain-text rejections.

use crate::error::InvalidInput;
use crate::types::parameter::ParameterCode;
use crate::types::window::{ComparisonPeriod, MAX_WINDOW_HOURS};
use crate::upstream::payload::parse_timestamp;
use chrono::{DateTime, Utc};
use serde::Deserialize;

pub const DEFAULT_HISTORY_HOURS: u32 = 24;

#[derive(Debug, Default, Deserialize)]
pub struct VariablesQuery {
    pub variables: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub hours: Option<String>,
    pub start: Option<String>,
    pub variables: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MultiHistoryQuery {
    pub stations: Option<String>,
    pub hours: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CompareQuery {
    pub stations: Option<String>,
    pub period: Option<String>,
    pub variables: Option<String>,
}

/// `None` or an empty string means "all parameters".
pub fn parse_variables(raw: Option<&str>) -> Result<Vec<ParameterCode>, InvalidInput> {
    match raw {
        None => Ok(Vec::new()),
        Some(list) => {
            ParameterCode::parse_list(list).map_err(|invalid| InvalidInput::UnknownParameters { invalid })
        }
    }
}

/// A station id taken from the path. Anything non-numeric cannot name a station.
pub fn parse_station_id(raw: &str) -> Result<u32, InvalidInput> {
    raw.trim()
        .parse()
        .map_err(|_| InvalidInput::StationId(raw.to_string()))
}

/// A comma separated list of numeric station ids, duplicates removed.
pub fn parse_station_ids(raw: Option<&str>) -> Result<Vec<u32>, InvalidInput> {
    let raw = raw.unwrap_or_default();
    let mut ids = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let id: u32 = part
            .parse()
            .map_err(|_| InvalidInput::StationList(raw.to_string()))?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    if ids.is_empty() {
        return Err(InvalidInput::NoStations);
    }
    Ok(ids)
}

/// A single hour count in `1..=168`, defaulting to 24.
pub fn parse_hours(raw: Option<&str>) -> Result<u32, InvalidInput> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_HISTORY_HOURS);
    };
    let hours = raw.trim().parse::<u32>().map_err(|_| InvalidInput::QueryValue {
        name: "hours",
        value: raw.to_string(),
    })?;
    if hours == 0 || hours > MAX_WINDOW_HOURS {
        return Err(InvalidInput::WindowHours {
            hours,
            max: MAX_WINDOW_HOURS,
        });
    }
    Ok(hours)
}

/// A comma separated list of hour counts, ascending and deduplicated.
pub fn parse_hour_list(raw: Option<&str>) -> Result<Vec<u32>, InvalidInput> {
    let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
        return Ok(vec![DEFAULT_HISTORY_HOURS]);
    };
    let mut hours = raw
        .split(',')
        .map(|part| parse_hours(Some(part)))
        .collect::<Result<Vec<_>, _>>()?;
    hours.sort_unstable();
    hours.dedup();
    Ok(hours)
}

pub fn parse_period(raw: Option<&str>) -> Result<ComparisonPeriod, InvalidInput> {
    raw.unwrap_or("24h").parse()
}

pub fn parse_start(raw: Option<&str>) -> Result<Option<DateTime<Utc>>, InvalidInput> {
    match raw {
        None => Ok(None),
        Some(raw) => parse_timestamp(raw.trim())
            .map(Some)
            .ok_or_else(|| InvalidInput::QueryValue {
                name: "start",
                value: raw.to_string(),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_variables() {
        assert!(parse_variables(None).unwrap().is_empty());
        assert_eq!(
            parse_variables(Some("wind_speed, air_temperature")).unwrap(),
            vec![ParameterCode::WindSpeed, ParameterCode::AirTemperature]
        );
        assert_eq!(
            parse_variables(Some("wind_speed,ozone,pollen")),
            Err(InvalidInput::UnknownParameters {
                invalid: vec!["ozone".to_string(), "pollen".to_string()]
            })
        );
    }

    #[test]
    fn test_parse_hours_bounds() {
        assert_eq!(parse_hours(None), Ok(24));
        assert_eq!(parse_hours(Some("168")), Ok(168));
        assert_eq!(
            parse_hours(Some("0")),
            Err(InvalidInput::WindowHours { hours: 0, max: 168 })
        );
        assert_eq!(
            parse_hours(Some("200")),
            Err(InvalidInput::WindowHours { hours: 200, max: 168 })
        );
        assert!(matches!(
            parse_hours(Some("-3")),
            Err(InvalidInput::QueryValue { name: "hours", .. })
        ));
        assert_eq!(parse_hour_list(Some("72,24,72")), Ok(vec![24, 72]));
    }

    #[test]
    fn test_parse_station_id() {
        assert_eq!(parse_station_id("10104"), Ok(10104));
        assert_eq!(
            parse_station_id("harbour"),
            Err(InvalidInput::StationId("harbour".to_string()))
        );
    }

    #[test]
    fn test_parse_station_ids() {
        assert_eq!(parse_station_ids(Some("10104,10162,10104")), Ok(vec![10104, 10162]));
        assert_eq!(parse_station_ids(Some("")), Err(InvalidInput::NoStations));
        assert_eq!(parse_station_ids(None), Err(InvalidInput::NoStations));
        assert!(matches!(
            parse_station_ids(Some("10104,abc")),
            Err(InvalidInput::StationList(_))
        ));
    }

    #[test]
    fn test_parse_start_and_period() {
        assert!(parse_start(Some("2024-05-01T00:00:00Z")).unwrap().is_some());
        assert!(parse_start(Some("last tuesday")).is_err());
        assert_eq!(parse_period(None), Ok(ComparisonPeriod::Day));
        assert!(parse_period(Some("7d")).is_err());
    }
}
