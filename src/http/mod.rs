//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace span, route lookup)
//!     → guard.rs (required headers)
//!     → extract.rs (path, query, body → ParameterBag)
//!     → gateway pipeline (downstream call)
//!     → server.rs (JSON response, merged headers)
//!     → Send to client
//! ```

pub mod extract;
pub mod guard;
pub mod request;
pub mod server;

pub use request::{UuidRequestId, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
