#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use meteohub::{
    ForecastBundle, ForecastTarget, HubConfig, MeteoHub, MeteoHubError, ObservationPoint,
    ObservationSource, SeriesBundle, Station, StationRegistry, TimeSeries, UpstreamError,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Deterministic provider: every supported parameter gets one value per hour, derived from the
/// station id and the hour so that results can be checked exactly.
#[derive(Default)]
pub struct FakeSource {
    pub down_stations: HashSet<u32>,
    pub failing_chunk_starts: Vec<DateTime<Utc>>,
    pub calls: AtomicUsize,
    pub chunk_requests: Mutex<Vec<(u32, DateTime<Utc>, u32)>>,
}

impl FakeSource {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn value(station_id: u32, timestamp: DateTime<Utc>) -> f64 {
        f64::from(station_id % 100) + (timestamp.timestamp() / 3600 % 24) as f64
    }

    fn outage(&self, station_id: u32) -> Result<(), MeteoHubError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.down_stations.contains(&station_id) {
            return Err(UpstreamError::Unavailable(format!("station {} offline", station_id)).into());
        }
        Ok(())
    }
}

#[async_trait]
impl ObservationSource for FakeSource {
    async fn fetch_current(&self, station: &Station) -> Result<SeriesBundle, MeteoHubError> {
        self.outage(station.id)?;
        let now = Utc::now();
        Ok(SeriesBundle {
            station_id: station.id,
            series: station
                .supported_parameters
                .iter()
                .map(|code| {
                    TimeSeries::from_points(
                        station.id,
                        *code,
                        [ObservationPoint::new(now, Some(Self::value(station.id, now)))],
                    )
                })
                .collect(),
        })
    }

    async fn fetch_forecast(&self, target: &ForecastTarget) -> Result<ForecastBundle, MeteoHubError> {
        if let ForecastTarget::Station(id) = target {
            self.outage(*id)?;
        } else {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
        Ok(ForecastBundle {
            target: target.clone(),
            issued_at: Some(Utc::now()),
            series: vec![],
        })
    }

    async fn fetch_historical_chunk(
        &self,
        station: &Station,
        start: DateTime<Utc>,
        hours: u32,
    ) -> Result<SeriesBundle, MeteoHubError> {
        self.chunk_requests
            .lock()
            .unwrap()
            .push((station.id, start, hours));
        self.outage(station.id)?;
        if self.failing_chunk_starts.contains(&start) {
            return Err(UpstreamError::Unavailable(format!("chunk {} lost", start)).into());
        }
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;

        let stamps: Vec<DateTime<Utc>> = (0..hours)
            .map(|h| start + Duration::hours(i64::from(h)))
            .collect();
        Ok(SeriesBundle {
            station_id: station.id,
            series: station
                .supported_parameters
                .iter()
                .map(|code| {
                    TimeSeries::from_points(
                        station.id,
                        *code,
                        stamps
                            .iter()
                            .map(|ts| ObservationPoint::new(*ts, Some(Self::value(station.id, *ts)))),
                    )
                })
                .collect(),
        })
    }
}

pub fn registry() -> StationRegistry {
    StationRegistry::embedded().unwrap()
}

pub fn station(id: u32) -> Station {
    registry().lookup(id).unwrap().clone()
}

pub fn hub(source: Arc<FakeSource>) -> MeteoHub {
    MeteoHub::with_source(HubConfig::default(), registry(), source)
}

pub fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, day, hour, 0, 0).unwrap()
}
