//! Client address resolution.
//!
//! Behind a reverse proxy the socket peer is the proxy, so the originating
//! address comes from the first `X-Forwarded-For` entry. The header is only
//! honoured when the listener is configured to trust it.

use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderName},
    middleware::Next,
    response::Response,
};

const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
const HTTP_X_FORWARDED_FOR: HeaderName = HeaderName::from_static("http-x-forwarded-for");

/// Originating client address, inserted as a request extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientIp(pub IpAddr);

/// First parsable address from the forwarding headers.
pub fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    let value = headers
        .get(X_FORWARDED_FOR)
        .or_else(|| headers.get(HTTP_X_FORWARDED_FOR))?
        .to_str()
        .ok()?;

    value.split(',').next()?.trim().parse().ok()
}

pub async fn client_ip_middleware(
    State(trust_forwarded_for): State<bool>,
    mut req: Request,
    next: Next,
) -> Response {
    let forwarded = trust_forwarded_for
        .then(|| forwarded_ip(req.headers()))
        .flatten();
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    if let Some(ip) = forwarded.or(peer) {
        req.extensions_mut().insert(ClientIp(ip));
    }

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, middleware::from_fn_with_state, routing::get, Router};
    use tower::ServiceExt;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, value.parse().unwrap());
        }
        map
    }

    #[test]
    fn test_forwarded_ip_first_entry() {
        let map = headers(&[("x-forwarded-for", "203.0.113.7, 10.0.0.1")]);
        assert_eq!(forwarded_ip(&map), Some("203.0.113.7".parse().unwrap()));
    }

    #[test]
    fn test_forwarded_ip_fallback_header() {
        let map = headers(&[("http-x-forwarded-for", "2001:db8::1")]);
        assert_eq!(forwarded_ip(&map), Some("2001:db8::1".parse().unwrap()));
    }

    #[test]
    fn test_forwarded_ip_unparsable() {
        assert_eq!(forwarded_ip(&headers(&[("x-forwarded-for", "unknown")])), None);
        assert_eq!(forwarded_ip(&HeaderMap::new()), None);
    }

    async fn resolve(trust: bool, forwarded: Option<&str>) -> String {
        let app = Router::new()
            .route(
                "/",
                get(|req: Request<Body>| async move {
                    req.extensions()
                        .get::<ClientIp>()
                        .map(|ClientIp(ip)| ip.to_string())
                        .unwrap_or_else(|| "none".to_string())
                }),
            )
            .layer(from_fn_with_state(trust, client_ip_middleware));

        let mut builder = Request::builder().uri("/");
        if let Some(value) = forwarded {
            builder = builder.header("x-forwarded-for", value);
        }
        let mut req = builder.body(Body::empty()).unwrap();
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 1], 4000))));

        let response = app.oneshot(req).await.unwrap();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(body.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_trusted_header_wins() {
        assert_eq!(resolve(true, Some("203.0.113.7")).await, "203.0.113.7");
    }

    #[tokio::test]
    async fn test_untrusted_header_ignored() {
        assert_eq!(resolve(false, Some("203.0.113.7")).await, "192.0.2.1");
    }

    #[tokio::test]
    async fn test_peer_used_when_header_missing() {
        assert_eq!(resolve(true, None).await, "192.0.2.1");
    }
}
