//! Defines the `ParameterCode` enum, the fixed vocabulary of measured quantities served by the hub,
//! together with their units, display names and the upstream field names they are parsed from.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A measured quantity reported by a station.
///
/// The set is closed: every upstream field the hub understands maps onto exactly one variant.
/// Upstream fields that map onto none of them are dropped while parsing.
///
/// # Examples
///
/// ```
/// use meteohub::ParameterCode;
///
/// let code: ParameterCode = "air_temperature".parse().unwrap();
/// assert_eq!(code, ParameterCode::AirTemperature);
/// assert_eq!(code.unit(), "°C");
/// assert_eq!(code.to_string(), "air_temperature");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterCode {
    /// Air temperature 2 m above ground.
    AirTemperature,
    /// Apparent ("feels like") temperature.
    FeelsLikeTemperature,
    /// Dew point temperature.
    DewPoint,
    /// Relative humidity.
    RelativeHumidity,
    /// Air pressure reduced to sea level.
    SeaLevelPressure,
    /// Precipitation amount over the preceding hour.
    Precipitation,
    /// Mean wind speed.
    WindSpeed,
    /// Peak wind gust.
    WindGust,
    /// Direction the wind blows from, clockwise from north.
    WindDirection,
    /// Total cloud cover.
    CloudCover,
    /// UV index.
    UvIndex,
    /// Horizontal visibility.
    Visibility,
    /// Snow depth on the ground.
    SnowDepth,
}

/// Describes how an upstream field maps onto a [`ParameterCode`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct UpstreamField {
    pub name: &'static str,
    pub code: ParameterCode,
    /// Multiplier converting the upstream unit into the hub unit.
    pub scale: f64,
}

const UPSTREAM_FIELDS: &[UpstreamField] = &[
    UpstreamField { name: "airTemperature", code: ParameterCode::AirTemperature, scale: 1.0 },
    UpstreamField { name: "feelsLikeTemperature", code: ParameterCode::FeelsLikeTemperature, scale: 1.0 },
    UpstreamField { name: "dewPointTemperature", code: ParameterCode::DewPoint, scale: 1.0 },
    UpstreamField { name: "relativeHumidity", code: ParameterCode::RelativeHumidity, scale: 1.0 },
    UpstreamField { name: "seaLevelPressure", code: ParameterCode::SeaLevelPressure, scale: 1.0 },
    // Some provider feeds still report pressure in pascal.
    UpstreamField { name: "seaLevelPressurePa", code: ParameterCode::SeaLevelPressure, scale: 0.01 },
    UpstreamField { name: "precipitation", code: ParameterCode::Precipitation, scale: 1.0 },
    UpstreamField { name: "totalPrecipitation", code: ParameterCode::Precipitation, scale: 1.0 },
    UpstreamField { name: "windSpeed", code: ParameterCode::WindSpeed, scale: 1.0 },
    UpstreamField { name: "windGust", code: ParameterCode::WindGust, scale: 1.0 },
    UpstreamField { name: "windDirection", code: ParameterCode::WindDirection, scale: 1.0 },
    UpstreamField { name: "cloudCover", code: ParameterCode::CloudCover, scale: 1.0 },
    UpstreamField { name: "uvIndex", code: ParameterCode::UvIndex, scale: 1.0 },
    UpstreamField { name: "visibilityKm", code: ParameterCode::Visibility, scale: 1000.0 },
    UpstreamField { name: "visibility", code: ParameterCode::Visibility, scale: 1.0 },
    UpstreamField { name: "snowDepth", code: ParameterCode::SnowDepth, scale: 1.0 },
];

impl ParameterCode {
    /// Every parameter in declaration order.
    pub const ALL: [ParameterCode; 13] = [
        ParameterCode::AirTemperature,
        ParameterCode::FeelsLikeTemperature,
        ParameterCode::DewPoint,
        ParameterCode::RelativeHumidity,
        ParameterCode::SeaLevelPressure,
        ParameterCode::Precipitation,
        ParameterCode::WindSpeed,
        ParameterCode::WindGust,
        ParameterCode::WindDirection,
        ParameterCode::CloudCover,
        ParameterCode::UvIndex,
        ParameterCode::Visibility,
        ParameterCode::SnowDepth,
    ];

    /// The code used in query strings and JSON payloads served by the hub.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterCode::AirTemperature => "air_temperature",
            ParameterCode::FeelsLikeTemperature => "feels_like_temperature",
            ParameterCode::DewPoint => "dew_point",
            ParameterCode::RelativeHumidity => "relative_humidity",
            ParameterCode::SeaLevelPressure => "sea_level_pressure",
            ParameterCode::Precipitation => "precipitation",
            ParameterCode::WindSpeed => "wind_speed",
            ParameterCode::WindGust => "wind_gust",
            ParameterCode::WindDirection => "wind_direction",
            ParameterCode::CloudCover => "cloud_cover",
            ParameterCode::UvIndex => "uv_index",
            ParameterCode::Visibility => "visibility",
            ParameterCode::SnowDepth => "snow_depth",
        }
    }

    /// The unit values are reported in after conversion.
    pub fn unit(&self) -> &'static str {
        match self {
            ParameterCode::AirTemperature
            | ParameterCode::FeelsLikeTemperature
            | ParameterCode::DewPoint => "°C",
            ParameterCode::RelativeHumidity | ParameterCode::CloudCover => "%",
            ParameterCode::SeaLevelPressure => "hPa",
            ParameterCode::Precipitation => "mm",
            ParameterCode::WindSpeed | ParameterCode::WindGust => "m/s",
            ParameterCode::WindDirection => "°",
            ParameterCode::UvIndex => "index",
            ParameterCode::Visibility => "m",
            ParameterCode::SnowDepth => "cm",
        }
    }

    /// A label suitable for chart legends.
    pub fn display_name(&self) -> &'static str {
        match self {
            ParameterCode::AirTemperature => "Air temperature",
            ParameterCode::FeelsLikeTemperature => "Feels-like temperature",
            ParameterCode::DewPoint => "Dew point",
            ParameterCode::RelativeHumidity => "Relative humidity",
            ParameterCode::SeaLevelPressure => "Sea-level pressure",
            ParameterCode::Precipitation => "Precipitation",
            ParameterCode::WindSpeed => "Wind speed",
            ParameterCode::WindGust => "Wind gust",
            ParameterCode::WindDirection => "Wind direction",
            ParameterCode::CloudCover => "Cloud cover",
            ParameterCode::UvIndex => "UV index",
            ParameterCode::Visibility => "Visibility",
            ParameterCode::SnowDepth => "Snow depth",
        }
    }

    /// Resolves an upstream field name, returning `None` for fields the hub does not know.
    pub(crate) fn from_upstream(field: &str) -> Option<UpstreamField> {
        UPSTREAM_FIELDS.iter().find(|f| f.name == field).copied()
    }

    /// Parses a comma separated list such as `"air_temperature,wind_speed"`.
    ///
    /// Returns the recognised codes in first-seen order (duplicates removed) and, as the error,
    /// every entry that is not a known code.
    pub fn parse_list(list: &str) -> Result<Vec<ParameterCode>, Vec<String>> {
        let mut codes = Vec::new();
        let mut invalid = Vec::new();
        for raw in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            match raw.parse::<ParameterCode>() {
                Ok(code) if !codes.contains(&code) => codes.push(code),
                Ok(_) => {}
                Err(_) => invalid.push(raw.to_string()),
            }
        }
        if invalid.is_empty() {
            Ok(codes)
        } else {
            Err(invalid)
        }
    }

    /// Codes of every parameter, in declaration order.
    pub fn valid_codes() -> Vec<&'static str> {
        Self::ALL.iter().map(ParameterCode::as_str).collect()
    }
}

impl fmt::Display for ParameterCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParameterCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .iter()
            .find(|code| code.as_str().eq_ignore_ascii_case(needle))
            .copied()
            .ok_or_else(|| needle.to_string())
    }
}
