//! Client address resolution behind proxies.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use axum::http::HeaderMap;
use thiserror::Error;

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";
pub const X_REAL_IP: &str = "x-real-ip";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RealIpError {
    #[error("no valid client address in headers or connection")]
    NoAddress,
}

/// (network, prefix length) pairs that never identify a real client.
const PRIVATE_V4: [(Ipv4Addr, u8); 6] = [
    (Ipv4Addr::new(10, 0, 0, 0), 8),
    (Ipv4Addr::new(100, 64, 0, 0), 10),
    (Ipv4Addr::new(172, 16, 0, 0), 12),
    (Ipv4Addr::new(192, 0, 0, 0), 24),
    (Ipv4Addr::new(192, 168, 0, 0), 16),
    (Ipv4Addr::new(198, 18, 0, 0), 15),
];

fn in_v4_net(ip: Ipv4Addr, net: Ipv4Addr, prefix: u8) -> bool {
    let mask = u32::MAX.checked_shl(32 - u32::from(prefix)).unwrap_or(0);
    u32::from(ip) & mask == u32::from(net) & mask
}

/// Whether `ip` is worth reporting as a client address.
pub fn is_public(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            !(v4.is_loopback()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast()
                || PRIVATE_V4
                    .iter()
                    .any(|&(net, prefix)| in_v4_net(v4, net, prefix)))
        }
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => is_public(IpAddr::V4(v4)),
            None => !(v6.is_loopback() || v6.is_unspecified() || is_local_v6(v6)),
        },
    }
}

// fc00::/7 unique local, fe80::/10 link local
fn is_local_v6(ip: Ipv6Addr) -> bool {
    let first = ip.segments()[0];
    first & 0xfe00 == 0xfc00 || first & 0xffc0 == 0xfe80
}

fn parse(candidate: &str) -> Option<IpAddr> {
    let candidate = candidate.trim();
    candidate
        .parse::<IpAddr>()
        .ok()
        .or_else(|| candidate.parse::<SocketAddr>().ok().map(|s| s.ip()))
}

/// Header candidates in trust order: `X-Forwarded-For` right to left, then
/// `X-Real-IP`.
fn candidates(headers: &HeaderMap) -> Vec<IpAddr> {
    let mut found = Vec::new();
    for value in headers.get_all(X_FORWARDED_FOR).iter().rev() {
        if let Ok(list) = value.to_str() {
            found.extend(list.rsplit(',').filter_map(parse));
        }
    }
    if let Some(real) = headers.get(X_REAL_IP).and_then(|v| v.to_str().ok()) {
        found.extend(parse(real));
    }
    found
}

/// Resolve the client address.
///
/// Returns the first public header candidate, else the peer address, else
/// any syntactically valid header candidate.
pub fn resolve(headers: &HeaderMap, peer: Option<IpAddr>) -> Result<IpAddr, RealIpError> {
    let found = candidates(headers);
    found
        .iter()
        .copied()
        .find(|ip| is_public(*ip))
        .or(peer)
        .or_else(|| found.first().copied())
        .ok_or(RealIpError::NoAddress)
}
