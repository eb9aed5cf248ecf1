//! Outbound client for downstream services.
//!
//! # Responsibilities
//! - Send the assembled request (method, URL, query, headers, payload)
//! - Bound the whole exchange (connect + response + body read) by the route timeout
//! - Decode the downstream body as JSON
//! - Classify failures into gateway errors
//!
//! # Failure Mapping
//! - Connect failure, send failure, timeout → `ServiceUnavailable` (503)
//! - Body read failure, non-JSON content type, invalid JSON → `UpstreamProtocol` (500)
//!
//! # Design Decisions
//! - One shared `reqwest::Client`; pooling is internal, headers are per request
//! - Single attempt per inbound request, no retries
//! - The downstream status code is returned as-is, never interpreted

use std::time::Duration;

use axum::body::Bytes;
use axum::http::{header, HeaderMap, Method, StatusCode};
use percent_encoding::percent_decode_str;
use reqwest::multipart::{Form, Part};
use reqwest::RequestBuilder;
use serde_json::Value;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::gateway::payload::{EncodingError, FormField, FormValue, OutboundPayload};

/// A fully assembled downstream request. Consumed by [`ForwardingClient::forward`].
#[derive(Debug)]
pub struct OutboundRequest {
    pub url: String,
    pub method: Method,
    pub query: Vec<(String, String)>,
    pub payload: OutboundPayload,
    pub headers: HeaderMap,
}

/// The decoded downstream response.
#[derive(Debug, Clone)]
pub struct ServiceResponse {
    pub body: Value,
    pub status: StatusCode,
    pub headers: HeaderMap,
}

/// How the downstream body is turned into JSON.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BodyDecoding {
    /// Parse the body as JSON.
    #[default]
    Json,
    /// Parse, percent-decode the serialized form, parse again. For downstreams
    /// that percent-encode characters inside their JSON strings.
    PercentDecodedJson,
}

/// HTTP client used for every forwarded call.
#[derive(Debug, Clone)]
pub struct ForwardingClient {
    client: reqwest::Client,
}

impl ForwardingClient {
    pub fn new(config: &ClientConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(Duration::from_secs(config.pool_idle_timeout_secs))
            .user_agent(config.user_agent.as_str())
            .no_proxy()
            .build()?;
        Ok(Self { client })
    }

    /// Execute one downstream exchange.
    pub async fn forward(
        &self,
        request: OutboundRequest,
        timeout: Duration,
        decoding: BodyDecoding,
    ) -> GatewayResult<ServiceResponse> {
        let OutboundRequest {
            url,
            method,
            query,
            payload,
            headers,
        } = request;

        debug!(
            method = %method,
            url = %url,
            query_len = query.len(),
            payload = payload.kind(),
            "Forwarding request downstream"
        );

        let mut builder = self
            .client
            .request(method, &url)
            .headers(headers)
            .timeout(timeout);
        if !query.is_empty() {
            builder = builder.query(&query);
        }
        let builder = attach_payload(builder, payload)?;

        let exchange = async {
            let response = builder.send().await.map_err(send_error)?;
            let status = response.status();
            let headers = response.headers().clone();
            let body = response.bytes().await.map_err(body_error)?;
            Ok::<_, GatewayError>((status, headers, body))
        };

        let (status, headers, body) = tokio::time::timeout(timeout, exchange)
            .await
            .map_err(|_| {
                GatewayError::ServiceUnavailable(format!("no response within {:?}", timeout))
            })??;

        debug!(url = %url, status = %status, bytes = body.len(), "Downstream responded");

        let body = decode_body(&headers, &body, decoding)?;
        Ok(ServiceResponse {
            body,
            status,
            headers,
        })
    }
}

fn send_error(e: reqwest::Error) -> GatewayError {
    let reason = if e.is_timeout() {
        "timed out"
    } else if e.is_connect() {
        "connection failed"
    } else {
        "request failed"
    };
    GatewayError::ServiceUnavailable(format!("{}: {}", reason, e))
}

fn body_error(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::ServiceUnavailable(format!("timed out reading body: {}", e))
    } else {
        GatewayError::UpstreamProtocol(format!("failed to read body: {}", e))
    }
}

fn attach_payload(
    builder: RequestBuilder,
    payload: OutboundPayload,
) -> Result<RequestBuilder, EncodingError> {
    let multipart = payload.is_multipart();
    Ok(match payload {
        OutboundPayload::Empty => builder,
        OutboundPayload::Json(object) => builder.json(&object),
        OutboundPayload::Form(fields) if multipart => builder.multipart(multipart_form(fields)?),
        OutboundPayload::Form(fields) => {
            let pairs: Vec<(String, String)> = fields
                .into_iter()
                .filter_map(|f| match f.value {
                    FormValue::Text(text) => Some((f.name, text)),
                    FormValue::File(_) => None,
                })
                .collect();
            builder.form(&pairs)
        }
    })
}

fn multipart_form(fields: Vec<FormField>) -> Result<Form, EncodingError> {
    let mut form = Form::new();
    for FormField { name, value } in fields {
        form = match value {
            FormValue::Text(text) => form.text(name, text),
            FormValue::File(file) => {
                let part = Part::bytes(file.data.to_vec())
                    .file_name(file.filename)
                    .mime_str(&file.content_type)
                    .map_err(|_| EncodingError {
                        field: name.clone(),
                        target: "multipart file",
                    })?;
                form.part(name, part)
            }
        };
    }
    Ok(form)
}

/// `application/json` or any `+json` media type, parameters ignored.
pub fn is_json_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || (essence.starts_with("application/") && essence.ends_with("+json"))
}

/// Decode a downstream body. An empty body decodes to `null`.
pub fn decode_body(headers: &HeaderMap, body: &Bytes, decoding: BodyDecoding) -> GatewayResult<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if !is_json_content_type(content_type) {
        return Err(GatewayError::UpstreamProtocol(format!(
            "expected a JSON response, got content-type '{}'",
            content_type
        )));
    }

    let value: Value = serde_json::from_slice(body)
        .map_err(|e| GatewayError::UpstreamProtocol(format!("invalid JSON body: {}", e)))?;

    match decoding {
        BodyDecoding::Json => Ok(value),
        BodyDecoding::PercentDecodedJson => unquote_json(&value).map_err(|e| {
            GatewayError::UpstreamProtocol(format!("percent-decoded body is not JSON: {}", e))
        }),
    }
}

/// Serialize, percent-decode, and re-parse a JSON value.
pub fn unquote_json(value: &Value) -> Result<Value, serde_json::Error> {
    let serialized = serde_json::to_string(value)?;
    let decoded = percent_decode_str(&serialized).decode_utf8_lossy();
    serde_json::from_str(&decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serde_json::json;
    use tokio::net::TcpListener;

    fn json_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }

    fn request(url: String) -> OutboundRequest {
        OutboundRequest {
            url,
            method: Method::GET,
            query: Vec::new(),
            payload: OutboundPayload::Empty,
            headers: HeaderMap::new(),
        }
    }

    #[test]
    fn test_json_content_types() {
        assert!(is_json_content_type("application/json"));
        assert!(is_json_content_type("Application/JSON; charset=utf-8"));
        assert!(is_json_content_type("application/problem+json"));
        assert!(!is_json_content_type("text/html"));
        assert!(!is_json_content_type(""));
    }

    #[test]
    fn test_decode_body_variants() {
        let headers = json_headers();
        let list = Bytes::from_static(br#"[{"foo_key":"foo"},{"foo_key":"bar"}]"#);
        assert_eq!(
            decode_body(&headers, &list, BodyDecoding::Json).unwrap(),
            json!([{"foo_key": "foo"}, {"foo_key": "bar"}])
        );
        assert_eq!(
            decode_body(&headers, &Bytes::from_static(b"42"), BodyDecoding::Json).unwrap(),
            json!(42)
        );
        assert_eq!(
            decode_body(&HeaderMap::new(), &Bytes::new(), BodyDecoding::Json).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn test_decode_body_rejects_non_json() {
        let mut html = HeaderMap::new();
        html.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/html"));
        let err = decode_body(&html, &Bytes::from_static(b"<h1>hi</h1>"), BodyDecoding::Json)
            .unwrap_err();
        assert!(matches!(err, GatewayError::UpstreamProtocol(_)));

        let err = decode_body(&json_headers(), &Bytes::from_static(b"{oops"), BodyDecoding::Json)
            .unwrap_err();
        assert!(matches!(err, GatewayError::UpstreamProtocol(_)));
    }

    #[test]
    fn test_percent_decoding_is_opt_in() {
        let body = Bytes::from_static(br#"{"name":"J%C3%BCrgen"}"#);
        let plain = decode_body(&json_headers(), &body, BodyDecoding::Json).unwrap();
        assert_eq!(plain, json!({"name": "J%C3%BCrgen"}));

        let decoded =
            decode_body(&json_headers(), &body, BodyDecoding::PercentDecodedJson).unwrap();
        assert_eq!(decoded, json!({"name": "Jürgen"}));
    }

    #[test]
    fn test_percent_decoding_can_break_json() {
        let body = Bytes::from_static(br#"{"q":"a%22b"}"#);
        let err = decode_body(&json_headers(), &body, BodyDecoding::PercentDecodedJson)
            .unwrap_err();
        assert!(matches!(err, GatewayError::UpstreamProtocol(_)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_unavailable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = ForwardingClient::new(&ClientConfig::default()).unwrap();
        let err = client
            .forward(
                request(format!("http://{}/v1/query", addr)),
                Duration::from_secs(5),
                BodyDecoding::Json,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::ServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_timeout_is_unavailable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            // Accept and hold the connection without ever answering.
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let client = ForwardingClient::new(&ClientConfig::default()).unwrap();
        let err = client
            .forward(
                request(format!("http://{}/slow", addr)),
                Duration::from_millis(200),
                BodyDecoding::Json,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::ServiceUnavailable(_)));
    }
}
