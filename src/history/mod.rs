//! Historical windows of up to seven days, stitched together from shorter provider calls.

pub mod assembler;
pub mod merge;

use crate::types::parameter::ParameterCode;
use crate::types::series::SeriesBundle;
use crate::types::window::{ChunkSpan, HistoricalWindowRequest};
use serde::Serialize;
use std::collections::BTreeMap;

/// `hour offset from window start -> parameter -> value`
pub type HourlyRows = BTreeMap<u32, BTreeMap<ParameterCode, Option<f64>>>;

/// Which chunks a window was assembled from and which of them failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowCoverage {
    pub chunks: Vec<ChunkSpan>,
    pub failed_chunks: Vec<ChunkSpan>,
}

/// An assembled historical window.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowSeries {
    pub request: HistoricalWindowRequest,
    pub bundle: SeriesBundle,
    pub coverage: WindowCoverage,
}

impl WindowSeries {
    /// `true` when at least one chunk could not be fetched.
    pub fn is_partial(&self) -> bool {
        !self.coverage.failed_chunks.is_empty()
    }

    /// Regroups the window as `hour offset from start -> parameter -> value`.
    ///
    /// Hours without any point are absent.
    pub fn by_hour_offset(&self) -> HourlyRows {
        let mut rows = HourlyRows::new();
        for series in &self.bundle.series {
            for point in series.points() {
                let offset = (point.timestamp - self.request.start).num_hours();
                let Ok(offset) = u32::try_from(offset) else {
                    continue;
                };
                rows.entry(offset)
                    .or_default()
                    .insert(series.parameter_code, point.value);
            }
        }
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::series::{ObservationPoint, TimeSeries};
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn test_by_hour_offset_groups_parameters() {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let request = HistoricalWindowRequest::new(3, start, 3).unwrap();
        let temp = TimeSeries::from_points(
            3,
            ParameterCode::AirTemperature,
            [
                ObservationPoint::new(start, Some(1.0)),
                ObservationPoint::new(start + Duration::hours(2), None),
            ],
        );
        let wind = TimeSeries::from_points(
            3,
            ParameterCode::WindSpeed,
            [ObservationPoint::new(start, Some(5.0))],
        );
        let window = WindowSeries {
            request,
            bundle: SeriesBundle {
                station_id: 3,
                series: vec![temp, wind],
            },
            coverage: WindowCoverage {
                chunks: request.chunks(),
                failed_chunks: vec![],
            },
        };

        let rows = window.by_hour_offset();
        assert_eq!(rows.keys().copied().collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(rows[&0][&ParameterCode::WindSpeed], Some(5.0));
        assert_eq!(rows[&2][&ParameterCode::AirTemperature], None);
        assert!(!window.is_partial());
    }
}
