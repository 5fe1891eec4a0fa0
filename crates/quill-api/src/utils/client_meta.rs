//! Client address and user agent, recorded on sessions for diagnostics.

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap};
use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

/// Longest user agent kept on a session.
const MAX_USER_AGENT_LENGTH: usize = 512;

/// Client IP from `X-Forwarded-For` (nearest hop), then `X-Real-IP`, then the socket.
pub fn client_ip(headers: &HeaderMap, socket_addr: Option<&SocketAddr>) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').map(str::trim).filter(|s| !s.is_empty()).last());
    let real_ip = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim);

    forwarded
        .into_iter()
        .chain(real_ip)
        .find(|candidate| candidate.parse::<IpAddr>().is_ok())
        .map(str::to_string)
        .or_else(|| socket_addr.map(|addr| addr.ip().to_string()))
}

pub fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|ua| ua.chars().take(MAX_USER_AGENT_LENGTH).collect())
}

/// Extractor for the diagnostic fields of a new session. Never rejects.
#[derive(Debug, Clone, Default)]
pub struct ClientMeta {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl<S> FromRequestParts<S> for ClientMeta
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let socket = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        Ok(ClientMeta {
            ip_address: client_ip(&parts.headers, socket.as_ref()),
            user_agent: user_agent(&parts.headers),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_forwarded_for_uses_nearest_valid_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.9, 10.0.0.1"),
        );
        assert_eq!(client_ip(&headers, None).as_deref(), Some("10.0.0.1"));
    }

    #[test]
    fn test_falls_back_to_real_ip_then_socket() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("not-an-ip"));
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.4"));
        assert_eq!(client_ip(&headers, None).as_deref(), Some("198.51.100.4"));

        let socket = SocketAddr::from(([127, 0, 0, 1], 4000));
        assert_eq!(
            client_ip(&HeaderMap::new(), Some(&socket)).as_deref(),
            Some("127.0.0.1")
        );
        assert_eq!(client_ip(&HeaderMap::new(), None), None);
    }

    #[test]
    fn test_user_agent_is_capped() {
        let mut headers = HeaderMap::new();
        let long = "a".repeat(MAX_USER_AGENT_LENGTH * 2);
        headers.insert(header::USER_AGENT, HeaderValue::from_str(&long).unwrap());
        assert_eq!(
            user_agent(&headers).map(|ua| ua.len()),
            Some(MAX_USER_AGENT_LENGTH)
        );
    }
}
