//! Per-scheme share-link parsers.

pub mod hysteria2;
pub mod shadowsocks;
pub mod trojan;
pub mod tuic;
pub mod vless;
pub mod vmess;

pub use hysteria2::Hysteria2Parser;
pub use shadowsocks::ShadowsocksParser;
pub use trojan::TrojanParser;
pub use tuic::TuicParser;
pub use vless::VLessParser;
pub use vmess::VMessParser;

use std::collections::HashMap;

use anyhow::{Result, anyhow};
use url::Url;

/// Collect a link's query parameters into a map.
pub(crate) fn query_map(url: &Url) -> HashMap<String, String> {
    url.query_pairs().into_owned().collect()
}

/// Resolve a link's display tag: the percent-decoded fragment, or
/// `server:port` when no fragment is present.
pub(crate) fn link_tag(url: &Url, server: &str, port: u16) -> String {
    url.fragment()
        .map(|f| {
            urlencoding::decode(f)
                .unwrap_or_else(|_| f.into())
                .into_owned()
        })
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| format!("{}:{}", server, port))
}

/// Split a `host:port` string, handling bracketed IPv6 addresses.
pub(crate) fn split_host_port(input: &str) -> Result<(String, u16)> {
    let (host, port) = input
        .rsplit_once(':')
        .ok_or_else(|| anyhow!("Missing port in address: {}", input))?;
    let port: u16 = port
        .parse()
        .map_err(|_| anyhow!("Invalid port in address: {}", input))?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    Ok((host.to_string(), port))
}
