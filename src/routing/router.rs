//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store compiled routes
//! - Look up matching route for request method + path
//! - Return matched route, method mismatch, or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) template scan (acceptable for typical route counts)
//! - First registered match wins
//! - Explicit NotFound / MethodNotAllowed rather than silent default

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::Method;

use crate::config::RouteConfig;
use crate::routing::template::{PathTemplate, TemplateError};

/// A route compiled for matching.
#[derive(Debug)]
pub struct Route {
    config: Arc<RouteConfig>,
    method: Method,
    template: PathTemplate,
}

impl Route {
    pub fn compile(config: RouteConfig) -> Result<Self, TemplateError> {
        let template = PathTemplate::parse(&config.mounted_path())?;
        Ok(Self {
            method: config.method.as_method(),
            config: Arc::new(config),
            template,
        })
    }

    pub fn config(&self) -> &Arc<RouteConfig> {
        &self.config
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn template(&self) -> &PathTemplate {
        &self.template
    }
}

/// A successful lookup: the route and the captured path parameters.
#[derive(Debug)]
pub struct RouteMatch<'a> {
    pub route: &'a Route,
    pub path_params: HashMap<String, String>,
}

/// Outcome of a route table lookup.
#[derive(Debug)]
pub enum RouteLookup<'a> {
    Matched(RouteMatch<'a>),
    MethodNotAllowed,
    NotFound,
}

/// The immutable route table built at startup.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Compile every configured route, preserving registration order.
    pub fn from_config(routes: Vec<RouteConfig>) -> Result<Self, TemplateError> {
        let routes = routes
            .into_iter()
            .map(Route::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { routes })
    }

    pub fn lookup(&self, method: &Method, path: &str) -> RouteLookup<'_> {
        let mut path_matched = false;
        for route in &self.routes {
            if let Some(path_params) = route.template.captures(path) {
                if route.method == *method {
                    return RouteLookup::Matched(RouteMatch { route, path_params });
                }
                path_matched = true;
            }
        }

        if path_matched {
            RouteLookup::MethodNotAllowed
        } else {
            RouteLookup::NotFound
        }
    }

    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
