//! The forwarding pipeline for one request.
//!
//! ```text
//! ParameterBag ─▶ split ─▶ encode_form / encode_body ─▶ merge ─┐
//! path params ──────────▶ resolve ─────────────────────────────┤
//! inbound headers ──────▶ prepare_outbound_headers ────────────┤
//!                                                             ▼
//!                                          ForwardingClient::forward ─▶ ServiceResponse
//! ```

use std::collections::HashMap;

use axum::http::{HeaderMap, Method};
use serde_json::Value;

use crate::config::RouteConfig;
use crate::error::GatewayResult;
use crate::gateway::client::{BodyDecoding, ForwardingClient, OutboundRequest, ServiceResponse};
use crate::gateway::headers::prepare_outbound_headers;
use crate::gateway::params::{ChannelMap, ParamValue, ParameterBag};
use crate::gateway::payload::{encode_body, encode_form, merge, EncodingError};
use crate::gateway::splitter::split;
use crate::gateway::target::resolve;

/// Everything the core needs to know about an inbound request.
#[derive(Debug, Default)]
pub struct InboundRequest {
    pub method: Method,
    pub params: ParameterBag,
    pub path_params: HashMap<String, String>,
    pub headers: HeaderMap,
    /// Fields of a form-encoded inbound body, if there was one.
    pub parsed_form: Option<ChannelMap>,
}

/// Translate the inbound request into an outbound one for `route`.
pub fn build_outbound(
    route: &RouteConfig,
    inbound: InboundRequest,
) -> GatewayResult<OutboundRequest> {
    let channels = split(
        &inbound.params,
        &route.query_params,
        &route.form_params,
        &route.body_params,
    );

    let body = encode_body(channels.body.as_ref())?;
    let form = encode_form(channels.form.as_ref(), inbound.parsed_form.as_ref())?;
    let payload = merge(form, body);

    let url = resolve(
        &route.service_url,
        &route.gateway_path,
        route.service_path.as_deref(),
        &inbound.path_params,
    )?;

    let query = match channels.query {
        Some(query) => query_pairs(&query)?,
        None => Vec::new(),
    };

    Ok(OutboundRequest {
        url,
        method: inbound.method,
        query,
        payload,
        headers: prepare_outbound_headers(&inbound.headers),
    })
}

/// Run the whole pipeline: build the outbound request and execute it.
pub async fn forward_request(
    route: &RouteConfig,
    client: &ForwardingClient,
    inbound: InboundRequest,
) -> GatewayResult<ServiceResponse> {
    let outbound = build_outbound(route, inbound)?;
    let decoding = if route.unquote_response {
        BodyDecoding::PercentDecodedJson
    } else {
        BodyDecoding::Json
    };
    client.forward(outbound, route.timeout(), decoding).await
}

/// Render the query channel as `name=value` pairs.
///
/// Arrays repeat the name once per element; nulls are skipped.
fn query_pairs(query: &ChannelMap) -> Result<Vec<(String, String)>, EncodingError> {
    let mut pairs = Vec::with_capacity(query.len());
    for (name, value) in query.iter() {
        match value {
            ParamValue::Text(s) => pairs.push((name.to_string(), s.clone())),
            ParamValue::Scalar(Value::Array(items)) => {
                for item in items {
                    let rendered = query_scalar(item).ok_or_else(|| query_error(name))?;
                    pairs.push((name.to_string(), rendered));
                }
            }
            ParamValue::Scalar(Value::Null) => {}
            ParamValue::Scalar(v) => {
                let rendered = query_scalar(v).ok_or_else(|| query_error(name))?;
                pairs.push((name.to_string(), rendered));
            }
            ParamValue::Map(_) | ParamValue::File(_) => return Err(query_error(name)),
        }
    }
    Ok(pairs)
}

fn query_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn query_error(name: &str) -> EncodingError {
    EncodingError {
        field: name.to_string(),
        target: "query parameter",
    }
}
