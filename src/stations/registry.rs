use crate::stations::error::StationConfigError;
use crate::types::parameter::ParameterCode;
use crate::types::station::Station;
use haversine::{distance, Location as HaversineLocation, Units};
use log::info;
use ordered_float::OrderedFloat;
use rstar::RTree;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

const EMBEDDED_STATIONS: &str = include_str!("../../data/stations.json");

/// The static set of stations the hub serves.
///
/// Lookups are pure and synchronous. Stations are kept both by id and in an R-tree for
/// proximity queries.
#[derive(Debug, Clone)]
pub struct StationRegistry {
    by_id: BTreeMap<u32, Station>,
    rtree: RTree<Station>,
}

impl StationRegistry {
    /// Builds a registry, rejecting duplicate ids and empty configurations.
    pub fn new(stations: Vec<Station>) -> Result<Self, StationConfigError> {
        if stations.is_empty() {
            return Err(StationConfigError::Empty);
        }
        let mut by_id = BTreeMap::new();
        for station in &stations {
            if by_id.insert(station.id, station.clone()).is_some() {
                return Err(StationConfigError::DuplicateStation(station.id));
            }
        }
        Ok(Self {
            by_id,
            rtree: RTree::bulk_load(stations),
        })
    }

    /// The station list shipped with the crate.
    pub fn embedded() -> Result<Self, StationConfigError> {
        Self::from_json_str(EMBEDDED_STATIONS)
    }

    /// Parses a JSON array of stations.
    pub fn from_json_str(json: &str) -> Result<Self, StationConfigError> {
        let stations: Vec<Station> =
            serde_json::from_str(json).map_err(|e| StationConfigError::Parse(Arc::new(e)))?;
        Self::new(stations)
    }

    /// Reads and parses a JSON station file.
    pub fn from_json_file(path: &Path) -> Result<Self, StationConfigError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| StationConfigError::Read(path.to_path_buf(), Arc::new(e)))?;
        let registry = Self::from_json_str(&json)?;
        info!(
            "Loaded {} stations from {}",
            registry.len(),
            path.display()
        );
        Ok(registry)
    }

    /// The station with `station_id`, or `None` if it is not configured.
    pub fn lookup(&self, station_id: u32) -> Option<&Station> {
        self.by_id.get(&station_id)
    }

    /// `false` for unknown stations as well as for parameters the station does not measure.
    pub fn supports_parameter(&self, station_id: u32, code: ParameterCode) -> bool {
        self.lookup(station_id)
            .is_some_and(|station| station.supports(code))
    }

    /// All stations ordered by id.
    pub fn stations(&self) -> impl Iterator<Item = &Station> {
        self.by_id.values()
    }

    /// Number of configured stations.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Finds up to `limit` stations within `max_distance_km` of a coordinate, closest first.
    pub fn nearest(
        &self,
        latitude: f64,
        longitude: f64,
        limit: usize,
        max_distance_km: f64,
    ) -> Vec<(&Station, f64)> {
        if limit == 0 {
            return vec![];
        }

        // Planar R-tree order and haversine order differ slightly, so look at a few extra.
        let candidate_limit = (limit * 2).max(20);

        let mut candidates: Vec<(&Station, f64)> = self
            .rtree
            .nearest_neighbor_iter(&[latitude, longitude])
            .take(candidate_limit)
            .filter_map(|station| {
                let dist_km = distance(
                    HaversineLocation {
                        latitude,
                        longitude,
                    },
                    HaversineLocation {
                        latitude: station.latitude,
                        longitude: station.longitude,
                    },
                    Units::Kilometers,
                );
                (dist_km <= max_distance_km).then_some((station, dist_km))
            })
            .collect();

        candidates.sort_by_key(|(_, dist)| OrderedFloat(*dist));
        candidates.truncate(limit);
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::io::Write;

    fn station(id: u32, latitude: f64, longitude: f64, params: &[ParameterCode]) -> Station {
        Station {
            id,
            name: format!("Station {}", id),
            latitude,
            longitude,
            elevation: None,
            municipality: None,
            supported_parameters: params.iter().copied().collect::<BTreeSet<_>>(),
        }
    }

    #[test]
    fn test_lookup_and_supports_parameter() {
        let registry = StationRegistry::new(vec![
            station(1, 52.0, 4.0, &[ParameterCode::AirTemperature]),
            station(2, 53.0, 5.0, &[ParameterCode::WindSpeed]),
        ])
        .unwrap();

        assert_eq!(registry.lookup(2).map(|s| s.id), Some(2));
        assert!(registry.lookup(3).is_none());
        assert!(registry.supports_parameter(1, ParameterCode::AirTemperature));
        assert!(!registry.supports_parameter(1, ParameterCode::WindSpeed));
        assert!(!registry.supports_parameter(3, ParameterCode::AirTemperature));
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let result = StationRegistry::new(vec![station(1, 0.0, 0.0, &[]), station(1, 1.0, 1.0, &[])]);
        assert!(matches!(result, Err(StationConfigError::DuplicateStation(1))));
        assert!(matches!(StationRegistry::new(vec![]), Err(StationConfigError::Empty)));
    }

    #[test]
    fn test_nearest_orders_by_distance_and_respects_radius() {
        let registry = StationRegistry::new(vec![
            station(1, 52.00, 4.00, &[]),
            station(2, 52.10, 4.00, &[]),
            station(3, 40.00, -3.70, &[]),
        ])
        .unwrap();

        let found = registry.nearest(52.09, 4.0, 5, 50.0);
        let ids: Vec<u32> = found.iter().map(|(s, _)| s.id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert!(found[0].1 < found[1].1);

        assert_eq!(registry.nearest(52.09, 4.0, 1, 50.0).len(), 1);
        assert!(registry.nearest(0.0, 160.0, 5, 50.0).is_empty());
        assert!(registry.nearest(52.09, 4.0, 0, 50.0).is_empty());
    }

    #[test]
    fn test_embedded_registry_loads() {
        let registry = StationRegistry::embedded().unwrap();
        assert!(registry.lookup(10104).is_some());
        assert!(registry.lookup(10162).is_some());
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id": 5, "name": "Pier", "latitude": 1.0, "longitude": 2.0,
                 "supportedParameters": ["wind_speed", "wind_gust"]}}]"#
        )
        .unwrap();

        let registry = StationRegistry::from_json_file(file.path()).unwrap();
        assert!(registry.supports_parameter(5, ParameterCode::WindGust));
        assert_eq!(registry.lookup(5).unwrap().municipality, None);

        let missing = StationRegistry::from_json_file(Path::new("/definitely/not/here.json"));
        assert!(matches!(missing, Err(StationConfigError::Read(_, _))));
    }
}
