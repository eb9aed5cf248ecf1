//! Pre-processing checks that run before the forwarding core.

use axum::http::HeaderMap;

use crate::config::RouteConfig;
use crate::error::{GatewayError, GatewayResult};

/// Reject the request unless every header in `required_headers` is present
/// with a non-empty value.
pub fn check_required_headers(route: &RouteConfig, headers: &HeaderMap) -> GatewayResult<()> {
    for name in &route.required_headers {
        let present = headers
            .get(name.as_str())
            .is_some_and(|v| !v.as_bytes().is_empty());
        if !present {
            return Err(GatewayError::MissingHeader(name.clone()));
        }
    }
    Ok(())
}
