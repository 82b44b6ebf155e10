//! The uniform time-series model every upstream payload is normalized into.

use crate::types::parameter::ParameterCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single measurement at one instant for one station and parameter.
///
/// A `None` value means the provider had a slot for this instant but no reading. A parameter the
/// station does not report at all has no [`TimeSeries`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObservationPoint {
    pub timestamp: DateTime<Utc>,
    pub value: Option<f64>,
}

impl ObservationPoint {
    pub fn new(timestamp: DateTime<Utc>, value: Option<f64>) -> Self {
        Self { timestamp, value }
    }
}

/// All points for one station and parameter.
///
/// Points are kept in strictly increasing timestamp order without duplicates. Missing hours are
/// simply absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeries {
    pub station_id: u32,
    pub parameter_code: ParameterCode,
    pub unit: String,
    points: Vec<ObservationPoint>,
}

impl TimeSeries {
    /// Creates an empty series using the parameter's declared unit.
    pub fn new(station_id: u32, parameter_code: ParameterCode) -> Self {
        Self {
            station_id,
            parameter_code,
            unit: parameter_code.unit().to_string(),
            points: Vec::new(),
        }
    }

    /// Builds a series from points in any order.
    ///
    /// Points are sorted by timestamp; when several share a timestamp the last one given wins.
    pub fn from_points(
        station_id: u32,
        parameter_code: ParameterCode,
        points: impl IntoIterator<Item = ObservationPoint>,
    ) -> Self {
        let mut series = Self::new(station_id, parameter_code);
        let mut points: Vec<ObservationPoint> = points.into_iter().collect();
        // Stable sort keeps the input order among equal timestamps, so the last duplicate is kept.
        points.sort_by_key(|p| p.timestamp);
        for point in points {
            match series.points.last_mut() {
                Some(last) if last.timestamp == point.timestamp => *last = point,
                _ => series.points.push(point),
            }
        }
        series
    }

    /// The points, oldest first.
    pub fn points(&self) -> &[ObservationPoint] {
        &self.points
    }

    /// Number of points, null readings included.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Timestamp of the oldest point, if any.
    pub fn first_timestamp(&self) -> Option<DateTime<Utc>> {
        self.points.first().map(|p| p.timestamp)
    }

    /// Timestamp of the newest point, if any.
    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.points.last().map(|p| p.timestamp)
    }

    /// The value recorded at `timestamp`, `Some(None)` for a null reading and `None` for no slot.
    pub fn value_at(&self, timestamp: DateTime<Utc>) -> Option<Option<f64>> {
        self.points
            .binary_search_by_key(&timestamp, |p| p.timestamp)
            .ok()
            .map(|idx| self.points[idx].value)
    }

    /// Appends a point, returning `false` (and leaving the series untouched) if it would break the
    /// ordering invariant.
    pub(crate) fn push(&mut self, point: ObservationPoint) -> bool {
        if let Some(last) = self.points.last() {
            if point.timestamp <= last.timestamp {
                return false;
            }
        }
        self.points.push(point);
        true
    }

    /// Checks that timestamps are strictly increasing.
    pub fn is_strictly_increasing(&self) -> bool {
        self.points.windows(2).all(|w| w[0].timestamp < w[1].timestamp)
    }
}

/// All series produced for one station by a single fetch.
///
/// Series keep the order in which their parameter was first seen in the upstream payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SeriesBundle {
    pub station_id: u32,
    pub series: Vec<TimeSeries>,
}

impl SeriesBundle {
    /// An empty bundle for `station_id`.
    pub fn new(station_id: u32) -> Self {
        Self {
            station_id,
            series: Vec::new(),
        }
    }

    /// The series for `code`, if the fetch produced one.
    pub fn get(&self, code: ParameterCode) -> Option<&TimeSeries> {
        self.series.iter().find(|s| s.parameter_code == code)
    }

    pub(crate) fn get_or_insert(&mut self, code: ParameterCode) -> &mut TimeSeries {
        let idx = match self.series.iter().position(|s| s.parameter_code == code) {
            Some(idx) => idx,
            None => {
                self.series.push(TimeSeries::new(self.station_id, code));
                self.series.len() - 1
            }
        };
        &mut self.series[idx]
    }

    /// Parameters present in the bundle, in first-seen order.
    pub fn parameters(&self) -> impl Iterator<Item = ParameterCode> + '_ {
        self.series.iter().map(|s| s.parameter_code)
    }

    /// `true` when no series holds a single point.
    pub fn is_empty(&self) -> bool {
        self.series.iter().all(TimeSeries::is_empty)
    }

    /// Keeps only the series whose parameter is in `codes`. An empty filter keeps everything.
    pub fn retain_parameters(&mut self, codes: &[ParameterCode]) {
        if !codes.is_empty() {
            self.series.retain(|s| codes.contains(&s.parameter_code));
        }
    }

    /// The distinct timestamps of all series, ascending.
    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        let mut stamps: Vec<DateTime<Utc>> = self
            .series
            .iter()
            .flat_map(|s| s.points().iter().map(|p| p.timestamp))
            .collect();
        stamps.sort();
        stamps.dedup();
        stamps
    }
}
