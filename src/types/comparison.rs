use crate::types::parameter::ParameterCode;
use crate::types::series::TimeSeries;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// One parameter measured across several stations, ready for a comparison chart.
///
/// `per_station` keeps the order in which stations were requested and is serialized as a JSON
/// object keyed by station id. It is never empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonSeries {
    pub parameter_code: ParameterCode,
    pub unit: String,
    #[serde(rename = "parameterName")]
    pub display_name: String,
    #[serde(serialize_with = "serialize_per_station")]
    pub per_station: Vec<(u32, TimeSeries)>,
}

impl ComparisonSeries {
    /// Ids of the stations contributing to this series, in request order.
    pub fn station_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.per_station.iter().map(|(id, _)| *id)
    }

    /// The series one station contributed, if it reported this parameter.
    pub fn series_for(&self, station_id: u32) -> Option<&TimeSeries> {
        self.per_station
            .iter()
            .find(|(id, _)| *id == station_id)
            .map(|(_, series)| series)
    }
}

fn serialize_per_station<S>(entries: &[(u32, TimeSeries)], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut map = serializer.serialize_map(Some(entries.len()))?;
    for (id, series) in entries {
        map.serialize_entry(&id.to_string(), series)?;
    }
    map.end()
}

/// The outcome of a comparison: the per-parameter series plus the stations that had to be left out.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonReport {
    pub series: Vec<ComparisonSeries>,
    /// Stations whose data could not be fetched (or that are unknown), in request order.
    pub omitted: Vec<u32>,
    /// Stations included with only part of their window.
    pub partial: Vec<u32>,
}
