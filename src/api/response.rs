use crate::error::{InvalidInput, MeteoHubError};
use crate::types::parameter::ParameterCode;
use crate::upstream::error::UpstreamError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::{error, warn};
use serde::Serialize;
use serde_json::{json, Map, Value};

/// A JSON response body with its status code.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiResponse {
    /// `200 {"success": true, "data": <data>}`
    pub fn success<T: Serialize>(data: &T) -> Self {
        match serde_json::to_value(data) {
            Ok(data) => Self {
                status: StatusCode::OK,
                body: json!({ "success": true, "data": data }),
            },
            Err(e) => Self::from_error(&MeteoHubError::Internal(format!(
                "failed to serialize response: {}",
                e
            ))),
        }
    }

    /// `200 {"success": true, "data": null, "warning": ...}` for a provider outage.
    pub fn degraded(err: &UpstreamError) -> Self {
        warn!("Serving degraded response: {}", err);
        Self {
            status: StatusCode::OK,
            body: json!({ "success": true, "data": null, "warning": upstream_warning(err) }),
        }
    }

    pub fn unauthorized() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            body: json!({ "error": "Authentication required" }),
        }
    }

    /// Maps an error onto the HTTP contract. Upstream errors become degraded `200` responses.
    pub fn from_error(err: &MeteoHubError) -> Self {
        match err {
            MeteoHubError::InvalidInput(
                InvalidInput::UnknownStation(_) | InvalidInput::StationId(_),
            ) => Self {
                status: StatusCode::NOT_FOUND,
                body: json!({ "error": err.to_string() }),
            },
            MeteoHubError::InvalidInput(InvalidInput::UnknownParameters { invalid }) => Self {
                status: StatusCode::BAD_REQUEST,
                body: json!({
                    "error": err.to_string(),
                    "invalidVariables": invalid,
                    "validVariables": ParameterCode::valid_codes(),
                }),
            },
            MeteoHubError::InvalidInput(_) => Self {
                status: StatusCode::BAD_REQUEST,
                body: json!({ "error": err.to_string() }),
            },
            MeteoHubError::Upstream(upstream) => Self::degraded(upstream),
            MeteoHubError::StationConfig(_)
            | MeteoHubError::Config(_)
            | MeteoHubError::Internal(_) => {
                error!("Internal fault while serving request: {}", err);
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    body: json!({ "error": "Internal server error", "details": err.to_string() }),
                }
            }
        }
    }

    /// Adds a top-level field to an object body. Non-object bodies are left alone.
    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        if let Value::Object(map) = &mut self.body {
            map.insert(key.to_string(), value.into());
        }
        self
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

impl From<Map<String, Value>> for ApiResponse {
    fn from(body: Map<String, Value>) -> Self {
        Self {
            status: StatusCode::OK,
            body: Value::Object(body),
        }
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// A client-facing description of an outage. Never includes URLs or transport details.
pub fn upstream_warning(err: &UpstreamError) -> String {
    match err {
        UpstreamError::Timeout { .. } => "Weather provider timed out, data temporarily unavailable".to_string(),
        UpstreamError::HttpStatus { status, .. } => format!(
            "Weather provider answered with status {}, data temporarily unavailable",
            status.as_u16()
        ),
        UpstreamError::MalformedPayload { .. } => {
            "Weather provider returned unreadable data, data temporarily unavailable".to_string()
        }
        UpstreamError::NetworkRequest { .. }
        | UpstreamError::LimiterClosed
        | UpstreamError::Unavailable(_) => {
            "Weather provider unreachable, data temporarily unavailable".to_string()
        }
    }
}
