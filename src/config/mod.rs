//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → routes compiled into the RouteTable, shared via Arc
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the route table lives for the process
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    ClientConfig, GatewayConfig, HttpMethod, ListenerConfig, LogFormat, ObservabilityConfig,
    RouteConfig, RouteDocs, SecurityConfig,
};
pub use validation::{validate_config, ValidationError};
