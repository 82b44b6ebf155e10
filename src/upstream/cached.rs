use crate::cache::key::{CacheKey, CacheScope};
use crate::cache::TtlCache;
use crate::error::MeteoHubError;
use crate::types::forecast::{ForecastBundle, ForecastTarget};
use crate::types::series::SeriesBundle;
use crate::types::station::Station;
use crate::types::window::ChunkSpan;
use crate::upstream::ObservationSource;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

/// Wraps an [`ObservationSource`] so that identical fetches within the TTL hit the provider once.
///
/// Historical chunks are cached individually, keyed by their exact interval, so overlapping
/// windows reuse each other's chunks when the boundaries line up.
pub struct CachedSource {
    inner: Arc<dyn ObservationSource>,
    current: TtlCache<CacheKey, SeriesBundle>,
    forecasts: TtlCache<CacheKey, ForecastBundle>,
    chunks: TtlCache<CacheKey, SeriesBundle>,
}

impl CachedSource {
    pub fn new(inner: Arc<dyn ObservationSource>, ttl: Duration) -> Self {
        Self {
            inner,
            current: TtlCache::new(ttl),
            forecasts: TtlCache::new(ttl),
            chunks: TtlCache::new(ttl),
        }
    }

    /// Drops every cached value.
    pub async fn clear(&self) {
        self.current.clear().await;
        self.forecasts.clear().await;
        self.chunks.clear().await;
    }

    /// Removes expired values from every cache, returning how many were dropped.
    pub async fn purge_expired(&self) -> usize {
        self.current.purge_expired().await
            + self.forecasts.purge_expired().await
            + self.chunks.purge_expired().await
    }
}

#[async_trait]
impl ObservationSource for CachedSource {
    async fn fetch_current(&self, station: &Station) -> Result<SeriesBundle, MeteoHubError> {
        let key = CacheKey::new(CacheScope::Current(station.id));
        let inner = self.inner.clone();
        let station = station.clone();
        self.current
            .get_or_fetch(key, move || async move { inner.fetch_current(&station).await })
            .await
    }

    async fn fetch_forecast(
        &self,
        target: &ForecastTarget,
    ) -> Result<ForecastBundle, MeteoHubError> {
        let key = CacheKey::new(CacheScope::Forecast(target.clone()));
        let inner = self.inner.clone();
        let target = target.clone();
        self.forecasts
            .get_or_fetch(key, move || async move { inner.fetch_forecast(&target).await })
            .await
    }

    async fn fetch_historical_chunk(
        &self,
        station: &Station,
        start: DateTime<Utc>,
        hours: u32,
    ) -> Result<SeriesBundle, MeteoHubError> {
        let span = ChunkSpan { start, hours };
        let key = CacheKey::new(CacheScope::History(station.id)).with_window(start, span.end());
        let inner = self.inner.clone();
        let station = station.clone();
        self.chunks
            .get_or_fetch(key, move || async move {
                inner.fetch_historical_chunk(&station, start, hours).await
            })
            .await
    }
}
