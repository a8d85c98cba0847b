//! Source address derivation for submitted responses.

use std::net::SocketAddr;

pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Transport facts about one inbound submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOrigin {
    pub forwarded_for: Option<String>,
    pub peer_addr: Option<String>,
}

impl RequestOrigin {
    pub fn new(forwarded_for: Option<&str>, peer_addr: Option<&str>) -> Self {
        Self {
            forwarded_for: forwarded_for.map(str::to_string),
            peer_addr: peer_addr.map(str::to_string),
        }
    }

    /// Origin with only a direct peer address.
    pub fn peer(peer_addr: &str) -> Self {
        Self::new(None, Some(peer_addr))
    }

    /// Builds an origin from a header map. Header names match case-insensitively.
    pub fn from_headers<'a>(
        headers: impl IntoIterator<Item = (&'a str, &'a str)>,
        peer_addr: Option<&str>,
    ) -> Self {
        let forwarded_for = headers
            .into_iter()
            .find(|(name, _)| name.trim().eq_ignore_ascii_case(FORWARDED_FOR_HEADER))
            .map(|(_, value)| value);
        Self::new(forwarded_for, peer_addr)
    }

    /// Derives the source address, optionally ignoring the forwarded header.
    pub fn source_address(&self, trust_forwarded_for: bool) -> Option<String> {
        let forwarded = if trust_forwarded_for {
            self.forwarded_for.as_deref()
        } else {
            None
        };
        source_address(forwarded, self.peer_addr.as_deref())
    }
}

/// First non-blank `X-Forwarded-For` token, else the direct peer address.
///
/// A peer given as `ip:port` is reduced to its ip.
pub fn source_address(forwarded_for: Option<&str>, peer_addr: Option<&str>) -> Option<String> {
    if let Some(header) = forwarded_for.filter(|value| !value.trim().is_empty()) {
        let first = header.split(',').next().unwrap_or_default().trim();
        if !first.is_empty() {
            return Some(first.to_string());
        }
    }

    let peer = peer_addr?.trim();
    if peer.is_empty() {
        return None;
    }
    match peer.parse::<SocketAddr>() {
        Ok(addr) => Some(addr.ip().to_string()),
        Err(_) => Some(peer.to_string()),
    }
}
