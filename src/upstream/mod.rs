//! Access to the meteorological provider.
//!
//! [`ObservationSource`] is the seam between the hub and the provider: [`client::UpstreamClient`]
//! talks HTTP, [`cached::CachedSource`] wraps any source with the single-flight TTL cache, and
//! tests plug in their own fakes.

pub mod cached;
pub mod client;
pub mod error;
pub mod limiter;
pub(crate) mod payload;

use crate::error::MeteoHubError;
use crate::types::forecast::{ForecastBundle, ForecastTarget};
use crate::types::series::SeriesBundle;
use crate::types::station::Station;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait ObservationSource: Send + Sync {
    /// The most recent reading for every parameter the station supports.
    async fn fetch_current(&self, station: &Station) -> Result<SeriesBundle, MeteoHubError>;

    /// The multi-day forecast for a station or a municipality.
    async fn fetch_forecast(&self, target: &ForecastTarget)
        -> Result<ForecastBundle, MeteoHubError>;

    /// Up to 72 hours of history starting at `start`.
    ///
    /// Implementations reject `hours` outside `1..=72` with
    /// [`crate::InvalidInput::WindowHours`].
    async fn fetch_historical_chunk(
        &self,
        station: &Station,
        start: DateTime<Utc>,
        hours: u32,
    ) -> Result<SeriesBundle, MeteoHubError>;
}
