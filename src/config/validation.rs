//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate route templates and their placeholder coverage
//! - Validate value ranges (timeouts > 0, body limit > 0)
//! - Detect conflicting routes
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;

use thiserror::Error;
use url::Url;

use crate::config::schema::{GatewayConfig, RouteConfig};
use crate::routing::template::{PathTemplate, TemplateError};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("route '{0}' is declared more than once")]
    DuplicateRouteName(String),

    #[error("route '{route}' duplicates {method} {path}")]
    DuplicateEndpoint { route: String, method: String, path: String },

    #[error("route '{route}': {source}")]
    Template {
        route: String,
        #[source]
        source: TemplateError,
    },

    #[error("route '{route}': service path uses '{{{name}}}' which the gateway path does not capture")]
    UncapturedPlaceholder { route: String, name: String },

    #[error("route '{route}': service_url '{url}' is not an absolute http(s) URL")]
    InvalidServiceUrl { route: String, url: String },

    #[error("route '{route}': timeout_secs must be greater than zero")]
    ZeroTimeout { route: String },

    #[error("route '{route}': empty name in {list}")]
    EmptyParamName { route: String, list: &'static str },

    #[error("security.max_body_size must be greater than zero")]
    ZeroBodyLimit,

    #[error("client.connect_timeout_secs must be greater than zero")]
    ZeroConnectTimeout,
}

/// Validate the whole configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }
    if config.client.connect_timeout_secs == 0 {
        errors.push(ValidationError::ZeroConnectTimeout);
    }

    let mut names = HashSet::new();
    let mut endpoints = HashSet::new();
    for route in &config.routes {
        if !names.insert(route.name.as_str()) {
            errors.push(ValidationError::DuplicateRouteName(route.name.clone()));
        }

        let mounted = route.mounted_path();
        if !endpoints.insert((route.method, mounted.clone())) {
            errors.push(ValidationError::DuplicateEndpoint {
                route: route.name.clone(),
                method: route.method.to_string(),
                path: mounted,
            });
        }

        validate_route(route, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_route(route: &RouteConfig, errors: &mut Vec<ValidationError>) {
    let template_error = |source| ValidationError::Template {
        route: route.name.clone(),
        source,
    };

    match PathTemplate::parse(&route.mounted_path()) {
        Ok(gateway) => {
            let service_path = route.service_path.as_deref().filter(|p| !p.is_empty());
            if let Some(service_path) = service_path {
                match PathTemplate::parse(service_path) {
                    Ok(service) => {
                        let captured: HashSet<&str> = gateway.placeholders().collect();
                        for name in service.placeholders() {
                            if !captured.contains(name) {
                                errors.push(ValidationError::UncapturedPlaceholder {
                                    route: route.name.clone(),
                                    name: name.to_string(),
                                });
                            }
                        }
                    }
                    Err(e) => errors.push(template_error(e)),
                }
            }
        }
        Err(e) => errors.push(template_error(e)),
    }

    let url_ok = Url::parse(&route.service_url)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
        .unwrap_or(false);
    if !url_ok {
        errors.push(ValidationError::InvalidServiceUrl {
            route: route.name.clone(),
            url: route.service_url.clone(),
        });
    }

    if route.timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout {
            route: route.name.clone(),
        });
    }

    for (list, names) in [
        ("query_params", &route.query_params),
        ("form_params", &route.form_params),
        ("body_params", &route.body_params),
        ("required_headers", &route.required_headers),
    ] {
        if names.iter().any(|n| n.trim().is_empty()) {
            errors.push(ValidationError::EmptyParamName {
                route: route.name.clone(),
                list,
            });
        }
    }
}
