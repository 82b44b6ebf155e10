//! The main entry point of the crate.
//!
//! [`MeteoHub`] owns the station registry, the upstream limiter, the caches and the window
//! assembler, and exposes the hub's read operations through builder methods.

use crate::cache::key::{CacheKey, CacheScope};
use crate::cache::TtlCache;
use crate::comparison::engine::ComparisonEngine;
use crate::config::HubConfig;
use crate::error::{InvalidInput, MeteoHubError};
use crate::history::assembler::WindowAssembler;
use crate::history::WindowSeries;
use crate::stations::registry::StationRegistry;
use crate::types::comparison::ComparisonReport;
use crate::types::forecast::{ForecastBundle, ForecastTarget};
use crate::types::parameter::ParameterCode;
use crate::types::series::SeriesBundle;
use crate::types::station::Station;
use crate::types::window::{ComparisonPeriod, HistoricalWindowRequest};
use crate::upstream::cached::CachedSource;
use crate::upstream::client::UpstreamClient;
use crate::upstream::limiter::UpstreamLimiter;
use crate::upstream::ObservationSource;
use bon::bon;
use chrono::{DateTime, Utc};
use log::info;
use std::sync::Arc;

/// A geographical coordinate: latitude first, longitude second.
///
/// # Examples
///
/// ```
/// use meteohub::LatLon;
///
/// let harbour = LatLon(54.18, 7.89);
/// assert_eq!(harbour.0, 54.18);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon(pub f64, pub f64);

/// The weather hub: cached, rate-limited access to observations, forecasts, historical windows
/// and cross-station comparisons.
///
/// Create one with [`MeteoHub::new`] to talk to the configured provider, or with
/// [`MeteoHub::with_source`] to plug in any [`ObservationSource`].
///
/// # Examples
///
/// ```no_run
/// # use meteohub::{HubConfig, MeteoHub, MeteoHubError, ParameterCode};
/// # #[tokio::main]
/// # async fn main() -> Result<(), MeteoHubError> {
/// let hub = MeteoHub::new(HubConfig::default())?;
///
/// let latest = hub
///     .current(10104)
///     .parameters(&[ParameterCode::AirTemperature])
///     .call()
///     .await?;
/// println!("{} series", latest.series.len());
///
/// let week = hub.window(10162).hours(168).call().await?;
/// println!("partial: {}", week.is_partial());
/// # Ok(())
/// # }
/// ```
pub struct MeteoHub {
    config: HubConfig,
    registry: Arc<StationRegistry>,
    source: Arc<CachedSource>,
    assembler: Arc<WindowAssembler>,
    comparisons: ComparisonEngine,
    comparison_cache: TtlCache<CacheKey, ComparisonReport>,
}

#[bon]
impl MeteoHub {
    /// Creates a hub talking to `config.upstream_url`.
    ///
    /// The station list is read from `config.stations_file` if set, otherwise the embedded list
    /// is used.
    ///
    /// # Errors
    ///
    /// [`MeteoHubError::StationConfig`] if the station list cannot be loaded, and
    /// [`MeteoHubError::Internal`] if the HTTP client cannot be built.
    pub fn new(config: HubConfig) -> Result<Self, MeteoHubError> {
        let registry = match &config.stations_file {
            Some(path) => StationRegistry::from_json_file(path)?,
            None => StationRegistry::embedded()?,
        };
        let limiter = UpstreamLimiter::new(config.max_concurrent_upstream);
        let client = UpstreamClient::new(&config, limiter)?;
        Ok(Self::with_source(config, registry, Arc::new(client)))
    }

    /// Creates a hub on top of an arbitrary source. The source is wrapped in the hub's cache.
    pub fn with_source(
        config: HubConfig,
        registry: StationRegistry,
        source: Arc<dyn ObservationSource>,
    ) -> Self {
        let registry = Arc::new(registry);
        let source = Arc::new(CachedSource::new(source, config.cache_ttl));
        let assembler = Arc::new(WindowAssembler::new(
            source.clone(),
            config.max_parallel_chunks,
        ));
        let comparisons = ComparisonEngine::new(registry.clone(), assembler.clone());
        info!(
            "Hub ready with {} stations, cache TTL {:?}, {} upstream permits",
            registry.len(),
            config.cache_ttl,
            config.max_concurrent_upstream
        );
        Self {
            comparison_cache: TtlCache::new(config.cache_ttl),
            config,
            registry,
            source,
            assembler,
            comparisons,
        }
    }

    /// The settings the hub was created with.
    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// The stations this hub serves.
    pub fn registry(&self) -> &StationRegistry {
        &self.registry
    }

    /// Looks up a station, turning an unknown id into [`InvalidInput::UnknownStation`].
    pub fn station(&self, station_id: u32) -> Result<&Station, MeteoHubError> {
        self.registry
            .lookup(station_id)
            .ok_or_else(|| InvalidInput::UnknownStation(station_id).into())
    }

    /// Finds stations near a location, closest first.
    ///
    /// * `.location(LatLon)`: **Required.**
    /// * `.max_distance_km(f64)`: Optional, defaults to `50.0`.
    /// * `.station_limit(usize)`: Optional, defaults to `5`.
    ///
    /// Returns each station with its distance in kilometres.
    #[builder]
    pub fn find_stations(
        &self,
        location: LatLon,
        max_distance_km: Option<f64>,
        station_limit: Option<usize>,
    ) -> Vec<(Station, f64)> {
        self.registry
            .nearest(
                location.0,
                location.1,
                station_limit.unwrap_or(5),
                max_distance_km.unwrap_or(50.0),
            )
            .into_iter()
            .map(|(station, distance)| (station.clone(), distance))
            .collect()
    }

    /// The latest observation of a station.
    ///
    /// * `.parameters(&[ParameterCode])`: Optional. Restricts the returned series.
    ///
    /// # Errors
    ///
    /// [`InvalidInput::UnknownStation`] without calling the provider, or the upstream error if
    /// the provider could not be reached.
    #[builder]
    pub async fn current(
        &self,
        #[builder(start_fn)] station_id: u32,
        parameters: Option<&[ParameterCode]>,
    ) -> Result<SeriesBundle, MeteoHubError> {
        let station = self.station(station_id)?;
        let mut bundle = self.source.fetch_current(station).await?;
        bundle.retain_parameters(parameters.unwrap_or_default());
        Ok(bundle)
    }

    /// The forecast for a station or a municipality.
    ///
    /// Station targets are checked against the registry; municipality codes are passed to the
    /// provider as given.
    #[builder]
    pub async fn forecast(
        &self,
        #[builder(start_fn)] target: ForecastTarget,
        parameters: Option<&[ParameterCode]>,
    ) -> Result<ForecastBundle, MeteoHubError> {
        if let ForecastTarget::Station(id) = &target {
            self.station(*id)?;
        }
        let mut forecast = self.source.fetch_forecast(&target).await?;
        if let Some(codes) = parameters.filter(|codes| !codes.is_empty()) {
            forecast
                .series
                .retain(|series| codes.contains(&series.parameter_code));
        }
        Ok(forecast)
    }

    /// An hourly historical window of 1 to 168 hours.
    ///
    /// * `.hours(u32)`: **Required.**
    /// * `.start(DateTime<Utc>)`: Optional. Without it the window ends at the current full hour.
    /// * `.parameters(&[ParameterCode])`: Optional. Restricts the returned series.
    ///
    /// Chunks that could not be fetched are reported through [`WindowSeries::coverage`].
    ///
    /// # Errors
    ///
    /// * [`InvalidInput::UnknownStation`], [`InvalidInput::WindowHours`] and
    ///   [`InvalidInput::FutureStart`], all before any provider call.
    /// * The upstream error when no chunk could be fetched.
    #[builder]
    pub async fn window(
        &self,
        #[builder(start_fn)] station_id: u32,
        hours: u32,
        start: Option<DateTime<Utc>>,
        parameters: Option<&[ParameterCode]>,
    ) -> Result<WindowSeries, MeteoHubError> {
        let station = self.station(station_id)?;
        let mut window = match start {
            Some(start) => self.assembler.get_window(station, start, hours).await?,
            None => self.assembler.latest_window(station, hours).await?,
        };
        window
            .bundle
            .retain_parameters(parameters.unwrap_or_default());
        Ok(window)
    }

    /// Compares the latest windows of several stations.
    ///
    /// * `.period(ComparisonPeriod)`: **Required.**
    /// * `.parameters(&[ParameterCode])`: Optional. Restricts the compared parameters.
    ///
    /// Results are cached per station list, parameter set and window.
    #[builder]
    pub async fn compare(
        &self,
        #[builder(start_fn)] station_ids: &[u32],
        period: ComparisonPeriod,
        parameters: Option<&[ParameterCode]>,
    ) -> Result<ComparisonReport, MeteoHubError> {
        if station_ids.is_empty() {
            return Err(InvalidInput::NoStations.into());
        }
        let now = Utc::now();
        let parameters = parameters.unwrap_or_default().to_vec();
        let window = HistoricalWindowRequest::latest(0, period.hours(), now)?;
        let key = CacheKey::new(CacheScope::Comparison(station_ids.to_vec()))
            .with_parameters(&parameters)
            .with_window(window.start, window.end());

        let engine = self.comparisons.clone();
        let station_ids = station_ids.to_vec();
        self.comparison_cache
            .get_or_fetch(key, move || async move {
                engine
                    .compare_at(&station_ids, period, &parameters, now)
                    .await
            })
            .await
    }

    /// Drops expired entries from every cache, returning how many were removed.
    pub async fn purge_expired(&self) -> usize {
        self.source.purge_expired().await + self.comparison_cache.purge_expired().await
    }

    /// Empties every cache.
    pub async fn clear_caches(&self) {
        self.source.clear().await;
        self.comparison_cache.clear().await;
    }
}
