//! DNS configuration types for sing-box.
//!
//! The assembly engine only touches the primary server's `detour`, but the
//! full DNS block round-trips through this model so a skeleton loaded from
//! JSON survives a build unmodified apart from that field.

use serde::{Deserialize, Serialize};

use crate::config::util::is_false;

/// DNS configuration
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Dns {
    /// List of DNS servers; the first entry is the primary server
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<DnsServer>,

    /// Default DNS server tag. The first server is used if empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r#final: Option<String>,

    /// Default domain strategy for resolving domain names
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<Strategy>,

    /// Disable DNS cache
    #[serde(default, skip_serializing_if = "is_false")]
    pub disable_cache: bool,

    /// Make each DNS server's cache independent
    #[serde(default, skip_serializing_if = "is_false")]
    pub independent_cache: bool,
}

/// Domain resolution strategy
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    PreferIpv4,
    PreferIpv6,
    Ipv4Only,
    Ipv6Only,
}

/// A single DNS server entry.
///
/// Uses the address-based server shape (`"address": "tls://8.8.8.8"`); the
/// `detour` field names the outbound its queries are sent through.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct DnsServer {
    /// Tag of the server
    pub tag: String,

    /// Server address (e.g., "8.8.8.8", "tls://dns.google", "https://1.1.1.1/dns-query")
    pub address: String,

    /// Tag of another server used to resolve the domain name in the address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_resolver: Option<String>,

    /// Domain strategy for resolving domain names via this server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<Strategy>,

    /// Tag of the outbound used to connect to the DNS server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detour: Option<String>,
}

impl DnsServer {
    /// Create a new DNS server entry.
    pub fn new(tag: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            address: address.into(),
            ..Default::default()
        }
    }

    /// Set the address resolver tag.
    pub fn with_address_resolver(mut self, resolver: impl Into<String>) -> Self {
        self.address_resolver = Some(resolver.into());
        self
    }

    /// Set the detour outbound tag.
    pub fn with_detour(mut self, detour: impl Into<String>) -> Self {
        self.detour = Some(detour.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dns_server_serialization() {
        let server = DnsServer::new("dns-remote", "tls://8.8.8.8")
            .with_address_resolver("dns-resolver")
            .with_detour("proxy");
        let json = serde_json::to_string(&server).unwrap();
        assert!(json.contains(r#""tag":"dns-remote""#));
        assert!(json.contains(r#""address":"tls://8.8.8.8""#));
        assert!(json.contains(r#""address_resolver":"dns-resolver""#));
        assert!(json.contains(r#""detour":"proxy""#));
    }

    #[test]
    fn test_dns_final_field_renamed() {
        let dns = Dns {
            servers: vec![DnsServer::new("local", "223.5.5.5")],
            r#final: Some("local".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_string(&dns).unwrap();
        assert!(json.contains(r#""final":"local""#));
    }

    #[test]
    fn test_dns_strategy_snake_case() {
        let dns = Dns {
            strategy: Some(Strategy::Ipv4Only),
            ..Default::default()
        };
        let json = serde_json::to_string(&dns).unwrap();
        assert!(json.contains(r#""strategy":"ipv4_only""#));
    }

    #[test]
    fn test_dns_roundtrip() {
        let json = r#"{
            "servers": [
                {"tag": "remote", "address": "tls://1.1.1.1", "detour": "proxy"},
                {"tag": "local", "address": "223.5.5.5", "detour": "DIRECT"}
            ],
            "final": "remote",
            "independent_cache": true
        }"#;
        let dns: Dns = serde_json::from_str(json).unwrap();
        assert_eq!(dns.servers.len(), 2);
        assert_eq!(dns.servers[0].detour.as_deref(), Some("proxy"));
        assert_eq!(dns.r#final.as_deref(), Some("remote"));
        assert!(dns.independent_cache);
    }
}
