//! Inbound parameter extraction.
//!
//! # Responsibilities
//! - Collect path params, query pairs, and body fields into a [`ParameterBag`]
//! - Keep the full parsed form of urlencoded bodies for the payload encoder
//! - Bound the inbound body by the configured size limit
//!
//! # Design Decisions
//! - Precedence on name clashes: path > body/form > query
//! - Declared form params are only ever read from the form body
//! - Multipart fields bind declared form params; undeclared ones are dropped
//! - JSON bodies are only read when the route declares body params
//! - A single declared body name receives the whole JSON body; with several
//!   names each one binds to the top-level key of the same name

use std::collections::HashMap;

use axum::body::{Body, Bytes};
use axum::extract::{FromRequest, Multipart};
use axum::http::{header, HeaderMap, Request};
use serde_json::Value;
use url::form_urlencoded;

use crate::config::RouteConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::gateway::params::{ChannelMap, FilePart, ParamValue, ParameterBag};
use crate::gateway::pipeline::InboundRequest;

const DEFAULT_FILE_CONTENT_TYPE: &str = "application/octet-stream";

/// Shape of the inbound body, from its content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    UrlEncoded,
    Multipart,
    Other,
}

fn body_kind(headers: &HeaderMap) -> BodyKind {
    let essence = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase())
        .unwrap_or_default();
    match essence.as_str() {
        "application/x-www-form-urlencoded" => BodyKind::UrlEncoded,
        "multipart/form-data" => BodyKind::Multipart,
        _ => BodyKind::Other,
    }
}

/// Build the [`InboundRequest`] the forwarding core consumes.
pub async fn extract(
    route: &RouteConfig,
    path_params: HashMap<String, String>,
    request: Request<Body>,
    max_body_size: usize,
) -> GatewayResult<InboundRequest> {
    let method = request.method().clone();
    let headers = request.headers().clone();

    let mut params = ParameterBag::new();
    if let Some(query) = request.uri().query() {
        for (name, value) in form_urlencoded::parse(query.as_bytes()) {
            params.insert(name.into_owned(), value.into_owned());
        }
    }

    let kind = body_kind(&headers);
    let body_form = match kind {
        BodyKind::UrlEncoded => {
            let bytes = read_body(request.into_body(), max_body_size).await?;
            Some(parse_urlencoded(&bytes))
        }
        BodyKind::Multipart => Some(parse_multipart(request).await?),
        BodyKind::Other if !route.body_params.is_empty() => {
            let bytes = read_body(request.into_body(), max_body_size).await?;
            bind_json_body(&mut params, &route.body_params, &bytes)?;
            None
        }
        BodyKind::Other => None,
    };

    for name in &route.form_params {
        params.remove(name);
        if let Some(value) = body_form.as_ref().and_then(|form| form.get(name)) {
            params.insert(name.clone(), value.clone());
        }
    }

    let parsed_form = match kind {
        BodyKind::UrlEncoded => body_form,
        _ => None,
    };

    for (name, value) in &path_params {
        params.insert(name.clone(), value.clone());
    }

    Ok(InboundRequest {
        method,
        params,
        path_params,
        headers,
        parsed_form,
    })
}

async fn read_body(body: Body, limit: usize) -> GatewayResult<Bytes> {
    axum::body::to_bytes(body, limit)
        .await
        .map_err(|e| GatewayError::InvalidRequest(format!("failed to read body: {}", e)))
}

fn parse_urlencoded(bytes: &[u8]) -> ChannelMap {
    form_urlencoded::parse(bytes)
        .map(|(name, value)| (name.into_owned(), ParamValue::Text(value.into_owned())))
        .collect()
}

async fn parse_multipart(request: Request<Body>) -> GatewayResult<ChannelMap> {
    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|e| GatewayError::InvalidRequest(format!("invalid multipart body: {}", e)))?;

    let mut form = ChannelMap::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| GatewayError::InvalidRequest(format!("invalid multipart field: {}", e)))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let filename = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| GatewayError::InvalidRequest(format!("field '{}': {}", name, e)))?;

        let value = match filename {
            Some(filename) => ParamValue::File(FilePart {
                filename,
                content_type: content_type
                    .unwrap_or_else(|| DEFAULT_FILE_CONTENT_TYPE.to_string()),
                data,
            }),
            None => {
                let text = String::from_utf8(data.to_vec()).map_err(|_| {
                    GatewayError::InvalidRequest(format!("field '{}' is not UTF-8 text", name))
                })?;
                ParamValue::Text(text)
            }
        };
        form.insert(name, value);
    }
    Ok(form)
}

/// Bind a JSON body to the declared body names.
fn bind_json_body(params: &mut ParameterBag, names: &[String], bytes: &[u8]) -> GatewayResult<()> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(());
    }
    let body: Value = serde_json::from_slice(bytes)
        .map_err(|e| GatewayError::InvalidRequest(format!("invalid JSON body: {}", e)))?;

    match (names, body) {
        ([name], body) => params.insert(name.clone(), ParamValue::from_json(body)),
        (names, Value::Object(mut fields)) => {
            for name in names {
                if let Some(value) = fields.remove(name) {
                    params.insert(name.clone(), ParamValue::from_json(value));
                }
            }
        }
        (_, _) => {
            return Err(GatewayError::InvalidRequest(
                "expected a JSON object for multiple body params".to_string(),
            ))
        }
    }
    Ok(())
}
