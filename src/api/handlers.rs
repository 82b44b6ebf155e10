//! Route handlers. Each one validates its input before touching the hub, so invalid requests
//! never reach the provider.

use crate::api::query::{
    parse_hour_list, parse_hours, parse_period, parse_start, parse_station_id, parse_station_ids,
    parse_variables, CompareQuery, HistoryQuery, MultiHistoryQuery, VariablesQuery,
};
use crate::api::response::ApiResponse;
use crate::api::ApiState;
use crate::error::MeteoHubError;
use crate::history::{HourlyRows, WindowSeries};
use crate::types::forecast::ForecastTarget;
use crate::types::station::Station;
use crate::upstream::error::UpstreamError;
use axum::extract::{Path, Query, State};
use chrono::{SecondsFormat, Utc};
use futures_util::future::join_all;
use log::warn;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

fn finish(result: Result<ApiResponse, MeteoHubError>) -> ApiResponse {
    result.unwrap_or_else(|e| ApiResponse::from_error(&e))
}

/// `GET /api/stations`
pub async fn list_stations(State(state): State<ApiState>) -> ApiResponse {
    let stations: Vec<&Station> = state.hub.registry().stations().collect();
    ApiResponse::success(&stations)
}

/// `GET /api/stations/{id}/current?variables=`
pub async fn current(
    State(state): State<ApiState>,
    Path(station): Path<String>,
    Query(query): Query<VariablesQuery>,
) -> ApiResponse {
    finish(fetch_current(&state, &station, &query).await)
}

async fn fetch_current(
    state: &ApiState,
    station: &str,
    query: &VariablesQuery,
) -> Result<ApiResponse, MeteoHubError> {
    let station_id = parse_station_id(station)?;
    let variables = parse_variables(query.variables.as_deref())?;
    let bundle = state
        .hub
        .current(station_id)
        .parameters(&variables)
        .call()
        .await?;
    Ok(ApiResponse::success(&bundle))
}

/// `GET /api/stations/{id}/forecast?variables=`
pub async fn station_forecast(
    State(state): State<ApiState>,
    Path(station): Path<String>,
    Query(query): Query<VariablesQuery>,
) -> ApiResponse {
    let target = parse_station_id(&station).map(ForecastTarget::Station);
    match target {
        Ok(target) => finish(fetch_forecast(&state, target, &query).await),
        Err(e) => ApiResponse::from_error(&e.into()),
    }
}

/// `GET /api/forecast/{municipality}?variables=`
pub async fn municipality_forecast(
    State(state): State<ApiState>,
    Path(municipality): Path<String>,
    Query(query): Query<VariablesQuery>,
) -> ApiResponse {
    let target = ForecastTarget::Municipality(municipality.trim().to_lowercase());
    finish(fetch_forecast(&state, target, &query).await)
}

async fn fetch_forecast(
    state: &ApiState,
    target: ForecastTarget,
    query: &VariablesQuery,
) -> Result<ApiResponse, MeteoHubError> {
    let variables = parse_variables(query.variables.as_deref())?;
    let forecast = state
        .hub
        .forecast(target)
        .parameters(&variables)
        .call()
        .await?;
    Ok(ApiResponse::success(&forecast))
}

/// `GET /api/stations/{id}/history?hours=&start=&variables=`
pub async fn station_history(
    State(state): State<ApiState>,
    Path(station): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> ApiResponse {
    finish(fetch_history(&state, &station, &query).await)
}

async fn fetch_history(
    state: &ApiState,
    station: &str,
    query: &HistoryQuery,
) -> Result<ApiResponse, MeteoHubError> {
    let station_id = parse_station_id(station)?;
    let hours = parse_hours(query.hours.as_deref())?;
    let start = parse_start(query.start.as_deref())?;
    let variables = parse_variables(query.variables.as_deref())?;
    let window = state
        .hub
        .window(station_id)
        .hours(hours)
        .maybe_start(start)
        .parameters(&variables)
        .call()
        .await?;
    Ok(history_response(&window))
}

fn history_response(window: &WindowSeries) -> ApiResponse {
    let response = ApiResponse::success(&window.by_hour_offset()).with_field(
        "timestamp",
        window.request.start.to_rfc3339_opts(SecondsFormat::Secs, true),
    );
    if !window.is_partial() {
        return response;
    }
    response.with_field("partial", true).with_field(
        "warning",
        format!(
            "{} of {} history chunks could not be fetched, data is incomplete",
            window.coverage.failed_chunks.len(),
            window.coverage.chunks.len()
        ),
    )
}

/// `GET /api/history?stations=&hours=`
///
/// Answers `{"<hours>": {"<stationId>": rows}}` for every requested hour count and station.
pub async fn multi_history(
    State(state): State<ApiState>,
    Query(query): Query<MultiHistoryQuery>,
) -> ApiResponse {
    finish(fetch_multi_history(&state, &query).await)
}

async fn fetch_multi_history(
    state: &ApiState,
    query: &MultiHistoryQuery,
) -> Result<ApiResponse, MeteoHubError> {
    let station_ids = parse_station_ids(query.stations.as_deref())?;
    let hour_list = parse_hour_list(query.hours.as_deref())?;
    for id in &station_ids {
        state.hub.station(*id)?;
    }

    let hub = &state.hub;
    let fetches = hour_list
        .iter()
        .flat_map(|&hours| station_ids.iter().map(move |&id| (hours, id)))
        .map(|(hours, id)| async move { (hours, id, hub.window(id).hours(hours).call().await) });
    let outcomes = join_all(fetches).await;

    let mut data: BTreeMap<u32, BTreeMap<u32, HourlyRows>> = BTreeMap::new();
    let mut incomplete: Vec<String> = Vec::new();
    let mut last_outage: Option<UpstreamError> = None;
    for (hours, id, outcome) in outcomes {
        match outcome {
            Ok(window) => {
                if window.is_partial() {
                    incomplete.push(format!("{} ({}h, partial)", id, hours));
                }
                data.entry(hours)
                    .or_default()
                    .insert(id, window.by_hour_offset());
            }
            Err(MeteoHubError::Upstream(e)) => {
                warn!("History for station {} ({}h) unavailable: {}", id, hours, e);
                incomplete.push(format!("{} ({}h)", id, hours));
                last_outage = Some(e);
            }
            Err(e) => return Err(e),
        }
    }

    if data.is_empty() {
        if let Some(outage) = last_outage {
            return Ok(ApiResponse::degraded(&outage));
        }
    }

    let response = ApiResponse::success(&data).with_field(
        "timestamp",
        Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
    );
    if incomplete.is_empty() {
        return Ok(response);
    }
    Ok(response.with_field(
        "warning",
        format!("Incomplete history for stations: {}", incomplete.join(", ")),
    ))
}

/// `GET /api/compare?stations=&period=&variables=`
pub async fn compare(
    State(state): State<ApiState>,
    Query(query): Query<CompareQuery>,
) -> ApiResponse {
    finish(fetch_comparison(&state, &query).await)
}

async fn fetch_comparison(
    state: &ApiState,
    query: &CompareQuery,
) -> Result<ApiResponse, MeteoHubError> {
    let station_ids = parse_station_ids(query.stations.as_deref())?;
    let period = parse_period(query.period.as_deref())?;
    let variables = parse_variables(query.variables.as_deref())?;
    for id in &station_ids {
        state.hub.station(*id)?;
    }

    let report = state
        .hub
        .compare(&station_ids)
        .period(period)
        .parameters(&variables)
        .call()
        .await?;

    let mut body = Map::new();
    body.insert("success".to_string(), json!(true));
    body.insert("stations".to_string(), json!(station_ids));
    body.insert("period".to_string(), json!(period.as_str()));

    let omitted_list = report
        .omitted
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    if report.series.is_empty() && !report.omitted.is_empty() {
        body.insert("data".to_string(), Value::Null);
        body.insert(
            "warning".to_string(),
            json!(format!(
                "Weather provider unavailable, no data for stations {}",
                omitted_list
            )),
        );
    } else {
        let series = serde_json::to_value(&report.series).map_err(|e| {
            MeteoHubError::Internal(format!("failed to serialize comparison: {}", e))
        })?;
        body.insert("data".to_string(), series);
        if !report.omitted.is_empty() {
            body.insert(
                "warning".to_string(),
                json!(format!("No data for stations {}", omitted_list)),
            );
        }
    }
    if !report.omitted.is_empty() {
        body.insert("omitted".to_string(), json!(report.omitted));
    }
    if !report.partial.is_empty() {
        body.insert("partial".to_string(), json!(report.partial));
    }
    Ok(ApiResponse::from(body))
}
