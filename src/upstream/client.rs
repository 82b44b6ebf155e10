//! HTTP client for the provider's observation and forecast endpoints.

use crate::config::HubConfig;
use crate::error::MeteoHubError;
use crate::types::forecast::{ForecastBundle, ForecastTarget};
use crate::types::series::SeriesBundle;
use crate::types::station::Station;
use crate::types::window::{validate_hours, MAX_CHUNK_HOURS};
use crate::upstream::error::UpstreamError;
use crate::upstream::limiter::UpstreamLimiter;
use crate::upstream::payload::{
    parse_timestamp, rows_to_series, ForecastResponse, ObservationsResponse, FORECAST_TIME_FIELD,
    OBSERVATION_TIME_FIELD,
};
use crate::upstream::ObservationSource;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use log::{debug, info, warn};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Talks to the provider over HTTP.
///
/// Every request waits for a permit from the shared [`UpstreamLimiter`] and is bounded by the
/// configured timeout. Requests are never retried here.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: Client,
    base_url: String,
    limiter: UpstreamLimiter,
    request_timeout: Duration,
}

impl UpstreamClient {
    /// Builds the HTTP client with the configured timeout and user agent.
    pub fn new(config: &HubConfig, limiter: UpstreamLimiter) -> Result<Self, MeteoHubError> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| MeteoHubError::Internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.upstream_url.trim_end_matches('/').to_string(),
            limiter,
            request_timeout: config.request_timeout,
        })
    }

    pub fn limiter(&self) -> &UpstreamLimiter {
        &self.limiter
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, UpstreamError> {
        // Waiting for a permit counts against the same budget as the request itself.
        let _permit = tokio::time::timeout(self.request_timeout, self.limiter.acquire())
            .await
            .map_err(|_| {
                warn!("Timed out waiting for an upstream permit for {}", url);
                UpstreamError::Timeout {
                    url: url.to_string(),
                }
            })??;
        debug!("Requesting {} {:?}", url, query);

        let response = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| UpstreamError::from_reqwest(url, e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("HTTP error for {}: {}", url, e);
                return Err(UpstreamError::from_reqwest(url, e));
            }
        };

        let body = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::from_reqwest(url, e))?;

        serde_json::from_slice(&body).map_err(|e| UpstreamError::malformed(url, e.to_string()))
    }

    async fn fetch_observations(
        &self,
        station: &Station,
        url: String,
        query: &[(&str, String)],
    ) -> Result<SeriesBundle, UpstreamError> {
        let response: ObservationsResponse = self.get_json(&url, query).await?;
        if let Some(reported) = response.station_id {
            if reported != station.id {
                return Err(UpstreamError::malformed(
                    &url,
                    format!("expected station {}, got {}", station.id, reported),
                ));
            }
        }

        let series = rows_to_series(
            &url,
            station.id,
            Some(station),
            &response.observations,
            OBSERVATION_TIME_FIELD,
        )?;
        info!(
            "Fetched {} observation rows ({} parameters) for station {}",
            response.observations.len(),
            series.len(),
            station.id
        );
        Ok(SeriesBundle {
            station_id: station.id,
            series,
        })
    }
}

#[async_trait]
impl ObservationSource for UpstreamClient {
    async fn fetch_current(&self, station: &Station) -> Result<SeriesBundle, MeteoHubError> {
        let url = format!(
            "{}/stations/{}/observations/latest",
            self.base_url, station.id
        );
        Ok(self.fetch_observations(station, url, &[]).await?)
    }

    async fn fetch_forecast(
        &self,
        target: &ForecastTarget,
    ) -> Result<ForecastBundle, MeteoHubError> {
        let url = match target {
            ForecastTarget::Station(id) => format!("{}/forecasts/stations/{}", self.base_url, id),
            ForecastTarget::Municipality(code) => {
                format!("{}/forecasts/places/{}", self.base_url, code)
            }
        };
        let response: ForecastResponse = self.get_json(&url, &[]).await?;

        let station_id = match target {
            ForecastTarget::Station(id) => *id,
            ForecastTarget::Municipality(_) => 0,
        };
        let series = rows_to_series(
            &url,
            station_id,
            None,
            &response.forecast_timestamps,
            FORECAST_TIME_FIELD,
        )?;
        let issued_at = response
            .forecast_creation_time_utc
            .as_deref()
            .and_then(parse_timestamp);

        info!(
            "Fetched {} forecast steps for {}",
            response.forecast_timestamps.len(),
            target
        );
        Ok(ForecastBundle {
            target: target.clone(),
            issued_at,
            series,
        })
    }

    async fn fetch_historical_chunk(
        &self,
        station: &Station,
        start: DateTime<Utc>,
        hours: u32,
    ) -> Result<SeriesBundle, MeteoHubError> {
        validate_hours(hours, MAX_CHUNK_HOURS)?;

        let url = format!("{}/stations/{}/observations", self.base_url, station.id);
        let query = [
            ("start", start.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ("hours", hours.to_string()),
        ];
        Ok(self.fetch_observations(station, url, &query).await?)
    }
}
