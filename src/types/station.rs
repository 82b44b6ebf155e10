//! Defines the data structures describing the monitoring stations served by the hub. Also includes
//! the implementations needed to index stations spatially with the `rstar` crate.

use crate::types::parameter::ParameterCode;
use rstar::{PointDistance, RTreeObject, AABB};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A fixed physical monitoring location and the parameters it is able to report.
///
/// Stations are loaded once from static configuration and never mutated afterwards.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    /// The provider's numeric station identifier (e.g. `10104`).
    pub id: u32,
    /// Human readable station name.
    pub name: String,
    /// Latitude in decimal degrees (positive for North, negative for South).
    pub latitude: f64,
    /// Longitude in decimal degrees (positive for East, negative for West).
    pub longitude: f64,
    /// Elevation above sea level in meters, if known.
    #[serde(default)]
    pub elevation: Option<i32>,
    /// Forecast place code of the municipality the station belongs to, if any.
    #[serde(default)]
    pub municipality: Option<String>,
    /// Parameters the station measures. Values for anything else are discarded while parsing.
    pub supported_parameters: BTreeSet<ParameterCode>,
}

impl Station {
    /// Whether the station measures `code`.
    pub fn supports(&self, code: ParameterCode) -> bool {
        self.supported_parameters.contains(&code)
    }
}

/// Lets `rstar` treat a `Station` as a point object.
impl RTreeObject for Station {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.latitude, self.longitude])
    }
}

/// Squared planar distance in degrees. Only used to order candidates inside the R-tree; the
/// registry re-ranks candidates by haversine distance afterwards.
impl PointDistance for Station {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.latitude - point[0];
        let dy = self.longitude - point[1];
        dx * dx + dy * dy
    }
}
