//! HTTP server setup and the gateway dispatcher.
//!
//! # Responsibilities
//! - Create the Axum Router with a single catch-all handler
//! - Wire up middleware (request ID, tracing, body limit)
//! - Dispatch requests through the route table
//! - Run guard → extract → forward for matched routes
//! - Render downstream results as JSON responses with merged headers
//! - Observability (metrics, request-scoped logs)

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, State},
    http::{HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Json, Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::{GatewayConfig, RouteConfig};
use crate::error::{GatewayError, StartupError};
use crate::gateway::client::{ForwardingClient, ServiceResponse};
use crate::gateway::headers::merge_response_headers;
use crate::gateway::pipeline::forward_request;
use crate::http::extract::extract;
use crate::http::guard::check_required_headers;
use crate::http::request::{request_id, request_id_header, UuidRequestId};
use crate::observability::metrics;
use crate::routing::{RouteLookup, RouteTable};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteTable>,
    pub client: ForwardingClient,
    pub max_body_size: usize,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
}

impl HttpServer {
    /// Compile the route table, build the outbound client, and assemble the router.
    pub fn new(config: GatewayConfig) -> Result<Self, StartupError> {
        let routes = Arc::new(RouteTable::from_config(config.routes.clone())?);
        let client = ForwardingClient::new(&config.client)?;

        for route in routes.routes() {
            let rc = route.config();
            tracing::info!(
                route = %rc.name,
                method = %route.method(),
                path = route.template().as_str(),
                service_url = %rc.service_url,
                tags = ?rc.docs.tags,
                summary = rc.docs.summary.as_deref().unwrap_or(""),
                deprecated = rc.docs.deprecated,
                "Route registered"
            );
        }

        let state = AppState {
            routes,
            client,
            max_body_size: config.security.max_body_size,
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(gateway_handler))
            .route("/", any(gateway_handler))
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.security.max_body_size))
            .layer(PropagateRequestIdLayer::new(request_id_header()))
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    tracing::info_span!(
                        "request",
                        request_id = %request_id(request.headers()),
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                }),
            )
            .layer(SetRequestIdLayer::new(request_id_header(), UuidRequestId))
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, routes = self.config.routes.len(), "HTTP server starting");

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Draining in-flight requests");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// The assembled router, for serving with a custom runtime or in tests.
    pub fn into_router(self) -> Router {
        self.router
    }
}

/// Catch-all dispatcher: route lookup, guard, extraction, forwarding.
async fn gateway_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = request_id(request.headers()).to_string();

    let (route, path_params) = match state.routes.lookup(&method, &path) {
        RouteLookup::Matched(m) => (Arc::clone(m.route.config()), m.path_params),
        RouteLookup::MethodNotAllowed => {
            tracing::warn!(request_id = %request_id, method = %method, path = %path, "Method not allowed");
            metrics::record_request(method.as_str(), 405, "none", start);
            return GatewayError::MethodNotAllowed(path).into_response();
        }
        RouteLookup::NotFound => {
            tracing::warn!(request_id = %request_id, path = %path, "No route matched");
            metrics::record_request(method.as_str(), 404, "none", start);
            return GatewayError::RouteNotFound(path).into_response();
        }
    };

    tracing::debug!(request_id = %request_id, route = %route.name, "Route matched");

    let result = async {
        check_required_headers(&route, request.headers())?;
        let inbound = extract(&route, path_params, request, state.max_body_size).await?;
        forward_request(&route, &state.client, inbound).await
    }
    .await;

    let response = match result {
        Ok(service) => {
            tracing::info!(
                request_id = %request_id,
                route = %route.name,
                status = service.status.as_u16(),
                latency_ms = start.elapsed().as_millis() as u64,
                "Request forwarded"
            );
            render(&route, &request_id, service)
        }
        Err(e) => {
            match &e {
                GatewayError::ServiceUnavailable(_) | GatewayError::UpstreamProtocol(_) => {
                    metrics::record_upstream_failure(&route.name, e.kind());
                    tracing::error!(request_id = %request_id, route = %route.name, error = %e, "Forwarding failed");
                }
                GatewayError::Template(_) | GatewayError::Encoding(_) => {
                    tracing::error!(request_id = %request_id, route = %route.name, error = %e, "Request could not be translated");
                }
                _ => {
                    tracing::warn!(request_id = %request_id, route = %route.name, error = %e, "Request rejected");
                }
            }
            e.into_response()
        }
    };

    metrics::record_request(method.as_str(), response.status().as_u16(), &route.name, start);
    response
}

/// Build the client response: downstream status and JSON body, gateway headers,
/// then downstream headers the policy lets through.
fn render(route: &RouteConfig, request_id: &str, service: ServiceResponse) -> Response {
    let ServiceResponse {
        body,
        status,
        headers,
    } = service;

    let mut response = if status == StatusCode::NO_CONTENT || status == StatusCode::NOT_MODIFIED {
        status.into_response()
    } else {
        (status, Json(body)).into_response()
    };

    if let Ok(id) = HeaderValue::from_str(request_id) {
        response.headers_mut().insert(request_id_header(), id);
    }

    let merged = merge_response_headers(response.headers(), &headers, route.override_headers);
    for (name, value) in merged.iter() {
        response.headers_mut().append(name.clone(), value.clone());
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpMethod;
    use axum::body::to_bytes;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn closed_port_url() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}", addr)
    }

    async fn server() -> Router {
        let mut config = GatewayConfig::default();
        let url = closed_port_url().await;
        let mut route = RouteConfig::new("items", HttpMethod::Get, "/items/{id}", url);
        route.prefix = "/api".into();
        config.routes.push(route);
        HttpServer::new(config).unwrap().into_router()
    }

    async fn call(router: Router, method: &str, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        assert!(response.headers().contains_key("x-request-id"));
        let bytes = to_bytes(response.into_body(), 1024).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_unknown_path_is_404() {
        let (status, body) = call(server().await, "GET", "/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"detail": "Not Found"}));
    }

    #[tokio::test]
    async fn test_wrong_method_is_405() {
        let (status, body) = call(server().await, "POST", "/api/items/1").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body, json!({"detail": "Method Not Allowed"}));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_503() {
        let (status, body) = call(server().await, "GET", "/api/items/1").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body, json!({"detail": "Service is unavailable."}));
    }

    #[test]
    fn test_render_merges_headers() {
        let mut route = RouteConfig::new("r", HttpMethod::Get, "/r", "http://svc");
        let mut headers = axum::http::HeaderMap::new();
        headers.insert("x-service", HeaderValue::from_static("users"));
        headers.insert("content-type", HeaderValue::from_static("text/plain"));
        headers.insert("x-request-id", HeaderValue::from_static("downstream"));
        let service = ServiceResponse {
            body: json!({"ok": true}),
            status: StatusCode::CREATED,
            headers,
        };

        let response = render(&route, "gw-id", service.clone());
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()["x-service"], "users");
        assert_eq!(response.headers()["content-type"], "application/json");
        assert_eq!(response.headers()["x-request-id"], "gw-id");

        route.override_headers = false;
        let response = render(&route, "gw-id", service);
        assert!(response.headers().get("x-service").is_none());
    }
}
