//! Historical window requests, the chunks they are split into, and the comparison periods.

use crate::error::InvalidInput;
use chrono::{DateTime, Duration, DurationRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Longest window the hub serves, in hours (7 days).
pub const MAX_WINDOW_HOURS: u32 = 168;
/// Longest window the provider returns in a single historical call.
pub const MAX_CHUNK_HOURS: u32 = 72;

/// A validated request for `hour_count` hourly slots starting at `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalWindowRequest {
    pub station_id: u32,
    pub start: DateTime<Utc>,
    pub hour_count: u32,
}

impl HistoricalWindowRequest {
    /// Validates the hour count and snaps `start` down to the full hour.
    ///
    /// # Errors
    ///
    /// [`InvalidInput::WindowHours`] if `hour_count` is outside `1..=168`.
    pub fn new(
        station_id: u32,
        start: DateTime<Utc>,
        hour_count: u32,
    ) -> Result<Self, InvalidInput> {
        validate_hours(hour_count, MAX_WINDOW_HOURS)?;
        Ok(Self {
            station_id,
            start: truncate_to_hour(start),
            hour_count,
        })
    }

    /// The window ending at the current full hour (exclusive) and reaching `hour_count` back.
    pub fn latest(station_id: u32, hour_count: u32, now: DateTime<Utc>) -> Result<Self, InvalidInput> {
        validate_hours(hour_count, MAX_WINDOW_HOURS)?;
        let end = truncate_to_hour(now);
        Self::new(station_id, end - Duration::hours(i64::from(hour_count)), hour_count)
    }

    /// Exclusive end of the window.
    pub fn end(&self) -> DateTime<Utc> {
        self.start + Duration::hours(i64::from(self.hour_count))
    }

    /// Whether `timestamp` lies in `[start, end)`.
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        timestamp >= self.start && timestamp < self.end()
    }

    /// Splits the window into consecutive chunks of at most [`MAX_CHUNK_HOURS`].
    ///
    /// A window that is not a multiple of 72 hours ends with a shorter chunk.
    pub fn chunks(&self) -> Vec<ChunkSpan> {
        let mut chunks = Vec::new();
        let mut offset = 0;
        while offset < self.hour_count {
            let hours = (self.hour_count - offset).min(MAX_CHUNK_HOURS);
            chunks.push(ChunkSpan {
                start: self.start + Duration::hours(i64::from(offset)),
                hours,
            });
            offset += hours;
        }
        chunks
    }
}

/// A sub-window no longer than the provider's per-call limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkSpan {
    pub start: DateTime<Utc>,
    pub hours: u32,
}

impl ChunkSpan {
    /// Exclusive end of the chunk.
    pub fn end(&self) -> DateTime<Utc> {
        self.start + Duration::hours(i64::from(self.hours))
    }
}

/// The comparison periods offered to charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonPeriod {
    #[serde(rename = "24h")]
    Day,
    #[serde(rename = "48h")]
    TwoDays,
    #[serde(rename = "72h")]
    ThreeDays,
}

impl ComparisonPeriod {
    /// Length of the compared window.
    pub fn hours(&self) -> u32 {
        match self {
            ComparisonPeriod::Day => 24,
            ComparisonPeriod::TwoDays => 48,
            ComparisonPeriod::ThreeDays => 72,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonPeriod::Day => "24h",
            ComparisonPeriod::TwoDays => "48h",
            ComparisonPeriod::ThreeDays => "72h",
        }
    }
}

impl fmt::Display for ComparisonPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComparisonPeriod {
    type Err = InvalidInput;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "24h" => Ok(ComparisonPeriod::Day),
            "48h" => Ok(ComparisonPeriod::TwoDays),
            "72h" => Ok(ComparisonPeriod::ThreeDays),
            other => Err(InvalidInput::Period(other.to_string())),
        }
    }
}

pub(crate) fn validate_hours(hours: u32, max: u32) -> Result<(), InvalidInput> {
    if hours == 0 || hours > max {
        return Err(InvalidInput::WindowHours { hours, max });
    }
    Ok(())
}

pub(crate) fn truncate_to_hour(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    timestamp
        .duration_trunc(Duration::hours(1))
        .unwrap_or(timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_hour_count_bounds() {
        assert!(HistoricalWindowRequest::new(1, start(), 0).is_err());
        assert!(HistoricalWindowRequest::new(1, start(), 169).is_err());
        assert!(HistoricalWindowRequest::new(1, start(), 1).is_ok());
        assert!(HistoricalWindowRequest::new(1, start(), 168).is_ok());
    }

    #[test]
    fn test_chunks_cover_window_without_gaps() {
        let window = HistoricalWindowRequest::new(1, start(), 168).unwrap();
        let chunks = window.chunks();
        assert_eq!(
            chunks.iter().map(|c| c.hours).collect::<Vec<_>>(),
            vec![72, 72, 24]
        );
        assert_eq!(chunks[0].start, window.start);
        for pair in chunks.windows(2) {
            assert_eq!(pair[0].end(), pair[1].start);
        }
        assert_eq!(chunks.last().unwrap().end(), window.end());
    }

    #[test]
    fn test_single_short_chunk() {
        let window = HistoricalWindowRequest::new(1, start(), 5).unwrap();
        assert_eq!(window.chunks(), vec![ChunkSpan { start: start(), hours: 5 }]);
    }

    #[test]
    fn test_start_is_snapped_to_hour() {
        let odd = Utc.with_ymd_and_hms(2024, 5, 1, 10, 42, 17).unwrap();
        let window = HistoricalWindowRequest::new(1, odd, 2).unwrap();
        assert_eq!(window.start, Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_latest_window_ends_at_current_hour() {
        let now = Utc.with_ymd_and_hms(2024, 5, 2, 12, 30, 0).unwrap();
        let window = HistoricalWindowRequest::latest(1, 24, now).unwrap();
        assert_eq!(window.end(), Utc.with_ymd_and_hms(2024, 5, 2, 12, 0, 0).unwrap());
        assert_eq!(window.start, Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_period_parsing() {
        assert_eq!("48h".parse::<ComparisonPeriod>().unwrap().hours(), 48);
        assert!(matches!(
            "96h".parse::<ComparisonPeriod>(),
            Err(InvalidInput::Period(p)) if p == "96h"
        ));
    }
}
