//! Inbound configuration types for sing-box.
//!
//! Only the inbound shapes the base skeleton uses are modeled: a mixed
//! SOCKS/HTTP listener and a tun device.

use serde::{Deserialize, Serialize};

use crate::config::util::{is_false, is_zero_u32};

/// Inbound configuration enum
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Inbound {
    /// Mixed SOCKS4/4a/5 and HTTP inbound
    Mixed(MixedInbound),
    /// Tun device inbound
    Tun(TunInbound),
}

/// Mixed inbound configuration
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct MixedInbound {
    /// Tag of the inbound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    /// Listen address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listen: Option<String>,

    /// Listen port
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listen_port: Option<u16>,
}

impl MixedInbound {
    /// Create a new mixed inbound with tag
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            ..Default::default()
        }
    }

    /// Set the listen address and port
    pub fn listen(mut self, address: impl Into<String>, port: u16) -> Self {
        self.listen = Some(address.into());
        self.listen_port = Some(port);
        self
    }
}

/// Tun inbound configuration
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct TunInbound {
    /// Tag of the inbound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    /// Interface addresses in CIDR notation
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub address: Vec<String>,

    /// Device MTU
    #[serde(default, skip_serializing_if = "is_zero_u32")]
    pub mtu: u32,

    /// Set the default route through the device
    #[serde(default, skip_serializing_if = "is_false")]
    pub auto_route: bool,

    /// Enforce routing through the device with firewall rules
    #[serde(default, skip_serializing_if = "is_false")]
    pub strict_route: bool,

    /// TCP/IP stack: system, gvisor, or mixed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl TunInbound {
    /// Create a new tun inbound with tag
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            ..Default::default()
        }
    }

    /// Set interface addresses
    pub fn address(mut self, address: Vec<String>) -> Self {
        self.address = address;
        self
    }

    /// Enable auto route
    pub fn auto_route(mut self) -> Self {
        self.auto_route = true;
        self
    }

    /// Enable strict route
    pub fn strict_route(mut self) -> Self {
        self.strict_route = true;
        self
    }

    /// Set the TCP/IP stack
    pub fn stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_inbound_serialization() {
        let inbound = Inbound::Mixed(MixedInbound::new("mixed-in").listen("0.0.0.0", 2080));
        let json = serde_json::to_string(&inbound).unwrap();
        assert!(json.contains(r#""type":"mixed""#));
        assert!(json.contains(r#""listen":"0.0.0.0""#));
        assert!(json.contains(r#""listen_port":2080"#));
    }

    #[test]
    fn test_tun_inbound_serialization() {
        let inbound = Inbound::Tun(
            TunInbound::new("tun-in")
                .address(vec!["172.19.0.1/30".to_string()])
                .auto_route()
                .strict_route()
                .stack("mixed"),
        );
        let json = serde_json::to_string(&inbound).unwrap();
        assert!(json.contains(r#""type":"tun""#));
        assert!(json.contains(r#""auto_route":true"#));
        assert!(json.contains(r#""strict_route":true"#));
        assert!(json.contains(r#""stack":"mixed""#));
    }

    #[test]
    fn test_inbound_deserialization() {
        let json = r#"{"type": "mixed", "tag": "mixed-in", "listen": "127.0.0.1", "listen_port": 7890}"#;
        let inbound: Inbound = serde_json::from_str(json).unwrap();
        match inbound {
            Inbound::Mixed(m) => assert_eq!(m.listen_port, Some(7890)),
            Inbound::Tun(_) => panic!("Expected Mixed inbound"),
        }
    }
}
