//! Gateway error types.
//!
//! Every request-time failure is rendered as `{"detail": "<fixed message>"}`.
//! The underlying cause is logged by the caller and never sent to the client.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::gateway::payload::EncodingError;
use crate::routing::template::TemplateError;

/// Request-time gateway errors.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Downstream unreachable, refused, or timed out.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Downstream answered with a body that could not be decoded.
    #[error("upstream protocol error: {0}")]
    UpstreamProtocol(String),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    /// The inbound body could not be read or parsed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("no route for {0}")]
    RouteNotFound(String),

    #[error("method not allowed for {0}")]
    MethodNotAllowed(String),

    #[error("missing required header: {0}")]
    MissingHeader(String),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::UpstreamProtocol(_)
            | GatewayError::Template(_)
            | GatewayError::Encoding(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            GatewayError::RouteNotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            GatewayError::MissingHeader(_) => StatusCode::UNAUTHORIZED,
        }
    }

    /// The message shown to the client.
    pub fn detail(&self) -> String {
        match self {
            GatewayError::ServiceUnavailable(_) => "Service is unavailable.".to_string(),
            GatewayError::UpstreamProtocol(_) => "Service error.".to_string(),
            GatewayError::Template(_) | GatewayError::Encoding(_) => {
                "Internal server error.".to_string()
            }
            GatewayError::InvalidRequest(_) => "Unprocessable request.".to_string(),
            GatewayError::RouteNotFound(_) => "Not Found".to_string(),
            GatewayError::MethodNotAllowed(_) => "Method Not Allowed".to_string(),
            GatewayError::MissingHeader(name) => format!("Missing required header: {}", name),
        }
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::ServiceUnavailable(_) => "service_unavailable",
            GatewayError::UpstreamProtocol(_) => "upstream_protocol",
            GatewayError::Template(_) => "template",
            GatewayError::Encoding(_) => "encoding",
            GatewayError::InvalidRequest(_) => "invalid_request",
            GatewayError::RouteNotFound(_) => "route_not_found",
            GatewayError::MethodNotAllowed(_) => "method_not_allowed",
            GatewayError::MissingHeader(_) => "missing_header",
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "detail": self.detail() }))).into_response()
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors raised while assembling the server at startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("route table: {0}")]
    Routes(#[from] TemplateError),

    #[error("outbound client: {0}")]
    Client(#[from] reqwest::Error),
}
