//! Forwarding core.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     ↓
//! params (ParameterBag) → splitter (query / form / body channels)
//!     ↓
//! payload (form beats JSON) + target (downstream URL) + headers (outbound set)
//!     ↓
//! client (single downstream call, JSON decode)
//!     ↓
//! ServiceResponse → headers (response merge) → client
//! ```

pub mod client;
pub mod headers;
pub mod params;
pub mod payload;
pub mod pipeline;
pub mod splitter;
pub mod target;

pub use client::{BodyDecoding, ForwardingClient, OutboundRequest, ServiceResponse};
pub use params::{ChannelMap, FilePart, ParamSource, ParamValue, ParameterBag};
pub use payload::{EncodingError, OutboundPayload};
pub use pipeline::{forward_request, InboundRequest};
