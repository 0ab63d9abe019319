use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::{Extensions, HeaderMap, header, request::Parts};

use crate::state::AppState;

/// Client address as seen through `trusted_proxies` reverse proxies.
///
/// Each trusted proxy appends the address it received the request from, so
/// the client is the `trusted_proxies`-th hop counted from the right. Hops to
/// the left of it were supplied by the client and are ignored. With no
/// trusted proxies, or a chain shorter than expected, the socket peer is used.
pub fn client_ip(
    headers: &HeaderMap,
    extensions: &Extensions,
    trusted_proxies: usize,
) -> Option<IpAddr> {
    forwarded_hop(headers, trusted_proxies).or_else(|| {
        extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
    })
}

fn forwarded_hop(headers: &HeaderMap, trusted_proxies: usize) -> Option<IpAddr> {
    if trusted_proxies == 0 {
        return None;
    }
    let value = headers.get("X-Forwarded-For")?.to_str().ok()?;
    let hops: Vec<&str> = value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    let pos = hops.len().checked_sub(trusted_proxies)?;
    hops[pos].parse().ok()
}

/// Request metadata recorded with downloads.
#[derive(Debug, Clone, Default)]
pub struct ClientMeta {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl FromRequestParts<AppState> for ClientMeta {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let trusted_proxies = state.config.rate_limit.trusted_proxies;
        Ok(ClientMeta {
            ip_address: client_ip(&parts.headers, &parts.extensions, trusted_proxies)
                .map(|ip| ip.to_string()),
            user_agent: parts
                .headers
                .get(header::USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned),
        })
    }
}
