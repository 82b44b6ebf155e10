//! JSON HTTP surface of the hub.
//!
//! All routes sit behind a [`gate::RequestGate`]. Validation failures answer `400`/`404`, provider
//! outages answer `200` with `data: null` and a `warning`, internal faults answer `500`.

pub mod gate;
pub mod handlers;
pub mod query;
pub mod response;

use crate::api::gate::{AllowAll, RequestGate};
use crate::meteohub::MeteoHub;
use axum::middleware;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct ApiState {
    pub hub: Arc<MeteoHub>,
    pub gate: Arc<dyn RequestGate>,
}

impl ApiState {
    /// State with a gate that lets everything through.
    pub fn new(hub: Arc<MeteoHub>) -> Self {
        Self {
            hub,
            gate: Arc::new(AllowAll),
        }
    }

    /// Replaces the gate, e.g. with one checking an API key header.
    pub fn with_gate(mut self, gate: Arc<dyn RequestGate>) -> Self {
        self.gate = gate;
        self
    }
}

/// Builds the `/api` routes with the gate applied to all of them.
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/stations", get(handlers::list_stations))
        .route("/api/stations/{id}/current", get(handlers::current))
        .route("/api/stations/{id}/forecast", get(handlers::station_forecast))
        .route("/api/stations/{id}/history", get(handlers::station_history))
        .route("/api/forecast/{municipality}", get(handlers::municipality_forecast))
        .route("/api/history", get(handlers::multi_history))
        .route("/api/compare", get(handlers::compare))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            gate::require_gate,
        ))
        .with_state(state)
}
