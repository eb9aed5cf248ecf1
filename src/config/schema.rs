//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use axum::http::Method;
use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Outbound client settings shared by every route.
    pub client: ClientConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Inbound request limits.
    pub security: SecurityConfig,

    /// Route table entries, in registration order.
    pub routes: Vec<RouteConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
        }
    }
}

/// HTTP method a route is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    pub fn as_method(&self) -> Method {
        match self {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
            HttpMethod::Head => Method::HEAD,
            HttpMethod::Options => Method::OPTIONS,
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_method())
    }
}

/// A gateway endpoint and the downstream call it forwards to.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route identifier for logging/metrics.
    pub name: String,

    /// Method the gateway endpoint answers to. The same method is used downstream.
    pub method: HttpMethod,

    /// Mount prefix prepended to `gateway_path` when matching inbound requests.
    /// It is not part of the downstream path.
    #[serde(default)]
    pub prefix: String,

    /// Gateway path template, e.g. "/path_param/{random_int}".
    pub gateway_path: String,

    /// Downstream base URL, e.g. "http://users.internal:8002".
    pub service_url: String,

    /// Downstream path template. Falls back to `gateway_path` when unset or empty.
    #[serde(default)]
    pub service_path: Option<String>,

    /// Parameters forwarded in the query string.
    #[serde(default)]
    pub query_params: Vec<String>,

    /// Parameters forwarded as form fields.
    #[serde(default)]
    pub form_params: Vec<String>,

    /// Parameters forwarded in the JSON body.
    #[serde(default)]
    pub body_params: Vec<String>,

    /// Relay downstream response headers to the client.
    #[serde(default = "default_override_headers")]
    pub override_headers: bool,

    /// Wall-clock bound on the downstream call, in seconds.
    #[serde(default = "default_route_timeout")]
    pub timeout_secs: u64,

    /// Percent-decode the downstream JSON before relaying it.
    #[serde(default)]
    pub unquote_response: bool,

    /// Headers the inbound request must carry before it is forwarded.
    #[serde(default)]
    pub required_headers: Vec<String>,

    /// Documentation metadata. Carried as-is, never interpreted.
    #[serde(default)]
    pub docs: RouteDocs,
}

fn default_override_headers() -> bool {
    true
}

fn default_route_timeout() -> u64 {
    60
}

impl RouteConfig {
    /// Create a route with no declared parameters and default policies.
    pub fn new(
        name: impl Into<String>,
        method: HttpMethod,
        gateway_path: impl Into<String>,
        service_url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            method,
            prefix: String::new(),
            gateway_path: gateway_path.into(),
            service_url: service_url.into(),
            service_path: None,
            query_params: Vec::new(),
            form_params: Vec::new(),
            body_params: Vec::new(),
            override_headers: default_override_headers(),
            timeout_secs: default_route_timeout(),
            unquote_response: false,
            required_headers: Vec::new(),
            docs: RouteDocs::default(),
        }
    }

    /// Full inbound path template (`prefix` + `gateway_path`).
    pub fn mounted_path(&self) -> String {
        format!("{}{}", self.prefix.trim_end_matches('/'), self.gateway_path)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Documentation metadata attached to a route.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RouteDocs {
    pub tags: Vec<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub deprecated: bool,
}

/// Shared outbound HTTP client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// TCP connect timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Maximum idle connections kept per downstream host.
    pub pool_max_idle_per_host: usize,

    /// Idle pooled connection lifetime in seconds.
    pub pool_idle_timeout_secs: u64,

    /// User-Agent sent on forwarded requests that do not carry their own.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 5,
            pool_max_idle_per_host: 32,
            pool_idle_timeout_secs: 90,
            user_agent: concat!("service-gateway/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Inbound request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum inbound body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}
