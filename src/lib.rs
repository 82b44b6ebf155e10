mod api;
mod cache;
mod comparison;
mod config;
mod error;
mod history;
mod meteohub;
mod stations;
mod types;
mod upstream;

pub use config::{ConfigError, HubConfig};
pub use error::{ErrorKind, InvalidInput, MeteoHubError};
pub use meteohub::*;

pub use types::comparison::{ComparisonReport, ComparisonSeries};
pub use types::forecast::{ForecastBundle, ForecastTarget};
pub use types::parameter::ParameterCode;
pub use types::series::{ObservationPoint, SeriesBundle, TimeSeries};
pub use types::station::Station;
pub use types::window::{
    ChunkSpan, ComparisonPeriod, HistoricalWindowRequest, MAX_CHUNK_HOURS, MAX_WINDOW_HOURS,
};

pub use cache::key::{CacheKey, CacheScope};
pub use cache::TtlCache;
pub use comparison::engine::{group_by_parameter, ComparisonEngine};
pub use history::assembler::{WindowAssembler, DEFAULT_PARALLEL_CHUNKS};
pub use history::merge::merge_chunks;
pub use history::{HourlyRows, WindowCoverage, WindowSeries};
pub use stations::error::StationConfigError;
pub use stations::registry::StationRegistry;
pub use upstream::cached::CachedSource;
pub use upstream::client::UpstreamClient;
pub use upstream::error::UpstreamError;
pub use upstream::limiter::UpstreamLimiter;
pub use upstream::ObservationSource;

pub use api::gate::{AllowAll, RequestGate};
pub use api::response::ApiResponse;
pub use api::{router, ApiState};
