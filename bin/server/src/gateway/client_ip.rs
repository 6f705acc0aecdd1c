//! Client IP extraction for audit records.

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use std::convert::Infallible;
use std::net::SocketAddr;

/// Header consulted first; set by reverse proxies in front of the gateway.
const FORWARDED_FOR: &str = "x-forwarded-for";

/// The client IP as recorded in audit events.
///
/// Takes the first entry of `X-Forwarded-For` when present, falls back to
/// the socket peer address, and degrades to `"unknown"` when neither is
/// available (e.g. in tests without a real connection).
pub struct ClientIp(pub String);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let forwarded = parts
            .headers
            .get(FORWARDED_FOR)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        let ip = forwarded
            .or_else(|| {
                parts
                    .extensions
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|info| info.0.ip().to_string())
            })
            .unwrap_or_else(|| "unknown".to_string());

        Ok(Self(ip))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> String {
        let (mut parts, ()) = request.into_parts();
        let ClientIp(ip) = ClientIp::from_request_parts(&mut parts, &())
            .await
            .expect("infallible");
        ip
    }

    #[tokio::test]
    async fn forwarded_header_takes_first_entry() {
        let request = Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(())
            .expect("request");
        assert_eq!(extract(request).await, "203.0.113.7");
    }

    #[tokio::test]
    async fn falls_back_to_peer_address() {
        let mut request = Request::builder().body(()).expect("request");
        request
            .extensions_mut()
            .insert(ConnectInfo("192.0.2.4:55000".parse::<SocketAddr>().expect("addr")));
        assert_eq!(extract(request).await, "192.0.2.4");
    }

    #[tokio::test]
    async fn unknown_without_header_or_peer() {
        let request = Request::builder().body(()).expect("request");
        assert_eq!(extract(request).await, "unknown");
    }

    #[tokio::test]
    async fn empty_header_is_ignored() {
        let request = Request::builder()
            .header("x-forwarded-for", "  ")
            .body(())
            .expect("request");
        assert_eq!(extract(request).await, "unknown");
    }
}
