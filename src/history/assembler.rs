use crate::error::{InvalidInput, MeteoHubError};
use crate::history::merge::merge_chunks;
use crate::history::{WindowCoverage, WindowSeries};
use crate::types::series::SeriesBundle;
use crate::types::station::Station;
use crate::types::window::{ChunkSpan, HistoricalWindowRequest};
use crate::upstream::ObservationSource;
use chrono::{DateTime, Utc};
use futures_util::stream::{self, StreamExt};
use log::{debug, warn};
use std::sync::Arc;

/// Default number of chunk requests a single window may have in flight.
pub const DEFAULT_PARALLEL_CHUNKS: usize = 4;

/// Builds windows of up to 168 hours out of provider calls of at most 72 hours each.
pub struct WindowAssembler {
    source: Arc<dyn ObservationSource>,
    max_parallel_chunks: usize,
}

impl WindowAssembler {
    /// `max_parallel_chunks` is raised to at least one.
    pub fn new(source: Arc<dyn ObservationSource>, max_parallel_chunks: usize) -> Self {
        Self {
            source,
            max_parallel_chunks: max_parallel_chunks.max(1),
        }
    }

    /// The window of `hour_count` hours starting at `start` (snapped down to the hour).
    pub async fn get_window(
        &self,
        station: &Station,
        start: DateTime<Utc>,
        hour_count: u32,
    ) -> Result<WindowSeries, MeteoHubError> {
        self.get_window_at(station, start, hour_count, Utc::now())
            .await
    }

    /// Same as [`Self::get_window`] with an explicit notion of "now".
    ///
    /// # Errors
    ///
    /// * [`InvalidInput::WindowHours`] for hour counts outside `1..=168`.
    /// * [`InvalidInput::FutureStart`] when `start` lies after `now`.
    /// * The last upstream error if every chunk failed.
    pub async fn get_window_at(
        &self,
        station: &Station,
        start: DateTime<Utc>,
        hour_count: u32,
        now: DateTime<Utc>,
    ) -> Result<WindowSeries, MeteoHubError> {
        let request = HistoricalWindowRequest::new(station.id, start, hour_count)?;
        if start > now {
            return Err(InvalidInput::FutureStart(start).into());
        }
        self.assemble(station, request).await
    }

    /// The `hour_count` hours leading up to the current full hour.
    pub async fn latest_window(
        &self,
        station: &Station,
        hour_count: u32,
    ) -> Result<WindowSeries, MeteoHubError> {
        self.latest_window_at(station, hour_count, Utc::now()).await
    }

    /// Same as [`Self::latest_window`] with an explicit notion of "now".
    pub async fn latest_window_at(
        &self,
        station: &Station,
        hour_count: u32,
        now: DateTime<Utc>,
    ) -> Result<WindowSeries, MeteoHubError> {
        let request = HistoricalWindowRequest::latest(station.id, hour_count, now)?;
        self.assemble(station, request).await
    }

    async fn assemble(
        &self,
        station: &Station,
        request: HistoricalWindowRequest,
    ) -> Result<WindowSeries, MeteoHubError> {
        let spans = request.chunks();
        debug!(
            "Assembling {}h window for station {} from {} chunks",
            request.hour_count,
            station.id,
            spans.len()
        );

        let outcomes: Vec<(ChunkSpan, Result<SeriesBundle, MeteoHubError>)> =
            stream::iter(spans.iter().copied())
                .map(|span| async move {
                    let outcome = self
                        .source
                        .fetch_historical_chunk(station, span.start, span.hours)
                        .await;
                    (span, outcome)
                })
                .buffer_unordered(self.max_parallel_chunks)
                .collect()
                .await;

        let mut fetched = Vec::with_capacity(outcomes.len());
        let mut failures: Vec<(ChunkSpan, MeteoHubError)> = Vec::new();
        for (span, outcome) in outcomes {
            match outcome {
                Ok(bundle) => fetched.push((span, bundle)),
                Err(e) if e.is_upstream_unavailable() => {
                    warn!(
                        "Chunk {} (+{}h) for station {} failed: {}",
                        span.start, span.hours, station.id, e
                    );
                    failures.push((span, e));
                }
                Err(e) => return Err(e),
            }
        }
        failures.sort_by_key(|(span, _)| span.start);

        if fetched.is_empty() {
            return Err(failures.pop().map(|(_, e)| e).unwrap_or_else(|| {
                MeteoHubError::Internal(format!(
                    "window for station {} produced no chunks",
                    station.id
                ))
            }));
        }

        let bundle = merge_chunks(&request, &fetched);
        Ok(WindowSeries {
            request,
            bundle,
            coverage: WindowCoverage {
                chunks: spans,
                failed_chunks: failures.into_iter().map(|(span, _)| span).collect(),
            },
        })
    }
}
