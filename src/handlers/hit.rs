use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::warn;

use crate::error::LimitError;
use crate::state::AppState;

const UNKNOWN_CLIENT: &str = "unknown";

// X-Real-Ip, then X-Forwarded-For, then the peer host; header values used verbatim
pub fn client_identifier(headers: &HeaderMap, remote: Option<SocketAddr>) -> String {
    for name in ["x-real-ip", "x-forwarded-for"] {
        // raw bytes, so non-ascii values still count as present
        if let Some(value) = headers.get(name) {
            if !value.is_empty() {
                return String::from_utf8_lossy(value.as_bytes()).into_owned();
            }
        }
    }
    remote
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

fn request_identifier(request: &Request) -> String {
    let remote = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    client_identifier(request.headers(), remote)
}

// GET /hit - record a hit and answer with the caller's rate
pub async fn hit_handler(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let identifier = request_identifier(&request);

    match state.limiter.hit_or_reject(&identifier).await {
        Ok(rate) => (StatusCode::OK, format!("{}\n", rate)).into_response(),
        Err(e) => {
            if let LimitError::Store(cause) = &e {
                warn!(identifier = %identifier, error = %cause, "hit could not be recorded");
            }
            e.into_response()
        }
    }
}

// GET /rate - current rate without recording anything
pub async fn rate_handler(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let identifier = request_identifier(&request);

    match state.limiter.rate(&identifier).await {
        Ok(rate) => (StatusCode::OK, format!("{}\n", rate)).into_response(),
        Err(e) => {
            warn!(identifier = %identifier, error = %e, "rate query failed");
            e.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn addr(s: &str) -> Option<SocketAddr> {
        Some(s.parse().unwrap())
    }

    #[test]
    fn real_ip_wins_over_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Real-Ip", HeaderValue::from_static("10.0.0.1"));
        headers.insert("X-Forwarded-For", HeaderValue::from_static("10.0.0.2"));
        assert_eq!(client_identifier(&headers, addr("127.0.0.1:9000")), "10.0.0.1");
    }

    #[test]
    fn forwarded_for_is_taken_verbatim() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Forwarded-For", HeaderValue::from_static("10.0.0.2, 10.0.0.3"));
        assert_eq!(
            client_identifier(&headers, addr("127.0.0.1:9000")),
            "10.0.0.2, 10.0.0.3"
        );
    }

    #[test]
    fn empty_headers_fall_through_to_peer_host() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Real-Ip", HeaderValue::from_static(""));
        assert_eq!(client_identifier(&headers, addr("192.168.0.7:51234")), "192.168.0.7");
        assert_eq!(client_identifier(&HeaderMap::new(), addr("[::1]:8080")), "::1");
    }

    #[test]
    fn non_ascii_header_is_not_treated_as_missing() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Real-Ip", HeaderValue::from_bytes(b"cl\xefent").unwrap());
        let identifier = client_identifier(&headers, addr("9.9.9.9:1"));
        assert_ne!(identifier, "9.9.9.9");
        assert_eq!(identifier, "cl\u{fffd}ent");

        let mut headers = HeaderMap::new();
        headers.insert("X-Forwarded-For", HeaderValue::from_bytes("clïent".as_bytes()).unwrap());
        assert_eq!(client_identifier(&headers, addr("9.9.9.9:1")), "clïent");
    }

    #[test]
    fn no_source_at_all_is_unknown() {
        assert_eq!(client_identifier(&HeaderMap::new(), None), "unknown");
    }
}
