//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → router.rs (route lookup)
//!     → template.rs (match path template, capture path params)
//!     → Return: matched Route + path params, MethodNotAllowed, or NotFound
//!
//! Route Compilation (at startup):
//!     RouteConfig[]
//!     → Parse prefix + gateway_path templates
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path
//! - Deterministic: same input always matches same route
//! - First match wins (registration order)

pub mod router;
pub mod template;

pub use router::{Route, RouteLookup, RouteMatch, RouteTable};
pub use template::{PathTemplate, TemplateError};
