//! Header policy for both directions of the forwarding hop.
//!
//! # Responsibilities
//! - Strip inbound-hop headers before forwarding
//! - Tag forwarded requests with the gateway's inbound host
//! - Decide which downstream response headers reach the client
//!
//! # Design Decisions
//! - Transport headers (length, type, encoding) belong to each hop and are never copied
//! - Headers the gateway already set win over same-named downstream headers
//! - Hop-by-hop headers are dropped in both directions

use axum::http::header::{self, HeaderMap, HeaderName};

/// Header carrying the Host the client used to reach the gateway.
pub const GATEWAY_HOST: &str = "gateway_host";

/// Inbound headers that describe the inbound hop only.
const REQUEST_DENYLIST: [HeaderName; 4] = [
    header::HOST,
    header::CONTENT_TYPE,
    header::ACCEPT_ENCODING,
    header::CONTENT_LENGTH,
];

/// Response headers owned by the gateway's own transport.
const RESPONSE_DENYLIST: [HeaderName; 5] = [
    header::SERVER,
    header::DATE,
    header::CONTENT_ENCODING,
    header::CONTENT_TYPE,
    header::CONTENT_LENGTH,
];

const HOP_BY_HOP: [&str; 7] = [
    "connection",
    "keep-alive",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(&name.as_str())
}

/// Headers to send downstream, derived from the inbound request headers.
pub fn prepare_outbound_headers(incoming: &HeaderMap) -> HeaderMap {
    let mut outbound = incoming.clone();
    for name in &REQUEST_DENYLIST {
        outbound.remove(name);
    }
    for name in HOP_BY_HOP {
        outbound.remove(name);
    }

    if let Some(host) = incoming.get(header::HOST) {
        outbound.insert(HeaderName::from_static(GATEWAY_HOST), host.clone());
    }
    outbound
}

/// Downstream response headers to add to the gateway response.
///
/// Empty unless `override_enabled`. Otherwise every service header that is not
/// transport-owned and not already set by the gateway, with all of its values.
pub fn merge_response_headers(
    gateway: &HeaderMap,
    service: &HeaderMap,
    override_enabled: bool,
) -> HeaderMap {
    let mut merged = HeaderMap::new();
    if !override_enabled {
        return merged;
    }

    for (name, value) in service.iter() {
        if RESPONSE_DENYLIST.contains(name) || is_hop_by_hop(name) || gateway.contains_key(name) {
            continue;
        }
        merged.append(name.clone(), value.clone());
    }
    merged
}
