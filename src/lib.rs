//! Configuration-driven API gateway library.
//!
//! Each configured route maps an inbound endpoint to one downstream service
//! call. Request parameters are split into query, form, and JSON body channels,
//! the downstream URL is rendered from a path template, and the downstream
//! JSON answer is relayed with its status code and (optionally) its headers.

// Core subsystems
pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod routing;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::schema::GatewayConfig;
pub use error::{GatewayError, GatewayResult, StartupError};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
