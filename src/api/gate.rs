use crate::api::response::ApiResponse;
use crate::api::ApiState;
use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use log::debug;

/// Decides whether a request may reach the hub's routes.
///
/// Authentication itself lives outside the hub; implementations only answer pass or fail.
pub trait RequestGate: Send + Sync {
    fn permits(&self, headers: &HeaderMap) -> bool;
}

/// Lets every request through.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl RequestGate for AllowAll {
    fn permits(&self, _headers: &HeaderMap) -> bool {
        true
    }
}

pub(crate) async fn require_gate(
    State(state): State<ApiState>,
    request: Request,
    next: Next,
) -> Response {
    if state.gate.permits(request.headers()) {
        next.run(request).await
    } else {
        debug!("Gate refused {} {}", request.method(), request.uri().path());
        ApiResponse::unauthorized().into_response()
    }
}
