//! Outbound configuration types for sing-box.
//!
//! Covers the proxy protocols the link parsers emit plus the group types the
//! assembly engine generates (`selector`, `urltest`) and the built-in
//! `direct`/`block`/`dns` outbounds the base skeleton carries.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::util::{is_false, is_zero_u32};

// ============================================================================
// Outbound Enum
// ============================================================================

/// Outbound configuration enum
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Outbound {
    /// Direct outbound (send requests directly)
    Direct(DirectOutbound),
    /// Block outbound (reject requests)
    Block(BlockOutbound),
    /// DNS outbound (legacy DNS request sink)
    #[serde(rename = "dns")]
    Dns(DnsOutbound),
    /// Shadowsocks outbound
    Shadowsocks(ShadowsocksOutbound),
    /// VMess outbound
    #[serde(rename = "vmess")]
    VMess(VMessOutbound),
    /// VLESS outbound
    #[serde(rename = "vless")]
    VLess(VLessOutbound),
    /// Trojan outbound
    Trojan(TrojanOutbound),
    /// Hysteria2 outbound
    Hysteria2(Hysteria2Outbound),
    /// TUIC outbound
    #[serde(rename = "tuic")]
    Tuic(TuicOutbound),
    /// Selector outbound (manual selection)
    Selector(SelectorOutbound),
    /// URLTest outbound (latency-based automatic selection)
    #[serde(rename = "urltest")]
    UrlTest(UrlTestOutbound),
}

impl Outbound {
    /// Returns the display tag, if set.
    pub fn tag(&self) -> Option<&str> {
        match self {
            Outbound::Direct(o) => o.tag.as_deref(),
            Outbound::Block(o) => o.tag.as_deref(),
            Outbound::Dns(o) => o.tag.as_deref(),
            Outbound::Shadowsocks(o) => o.tag.as_deref(),
            Outbound::VMess(o) => o.tag.as_deref(),
            Outbound::VLess(o) => o.tag.as_deref(),
            Outbound::Trojan(o) => o.tag.as_deref(),
            Outbound::Hysteria2(o) => o.tag.as_deref(),
            Outbound::Tuic(o) => o.tag.as_deref(),
            Outbound::Selector(o) => o.tag.as_deref(),
            Outbound::UrlTest(o) => o.tag.as_deref(),
        }
    }

    /// Replaces the display tag.
    pub fn set_tag(&mut self, tag: impl Into<String>) {
        let tag = Some(tag.into());
        match self {
            Outbound::Direct(o) => o.tag = tag,
            Outbound::Block(o) => o.tag = tag,
            Outbound::Dns(o) => o.tag = tag,
            Outbound::Shadowsocks(o) => o.tag = tag,
            Outbound::VMess(o) => o.tag = tag,
            Outbound::VLess(o) => o.tag = tag,
            Outbound::Trojan(o) => o.tag = tag,
            Outbound::Hysteria2(o) => o.tag = tag,
            Outbound::Tuic(o) => o.tag = tag,
            Outbound::Selector(o) => o.tag = tag,
            Outbound::UrlTest(o) => o.tag = tag,
        }
    }

    /// Returns the server address for proxy outbounds.
    pub fn server(&self) -> Option<&str> {
        match self {
            Outbound::Shadowsocks(o) => o.server.as_deref(),
            Outbound::VMess(o) => o.server.as_deref(),
            Outbound::VLess(o) => o.server.as_deref(),
            Outbound::Trojan(o) => o.server.as_deref(),
            Outbound::Hysteria2(o) => o.server.as_deref(),
            Outbound::Tuic(o) => o.server.as_deref(),
            Outbound::Direct(_)
            | Outbound::Block(_)
            | Outbound::Dns(_)
            | Outbound::Selector(_)
            | Outbound::UrlTest(_) => None,
        }
    }

    /// Whether this outbound is a usable egress path (has a server address).
    pub fn is_proxy(&self) -> bool {
        self.server().is_some()
    }

    /// Structural equality of every field except the display tag.
    ///
    /// Two outbounds of different protocol types are never payload-equal.
    pub fn payload_eq(&self, other: &Outbound) -> bool {
        fn stripped(o: &Outbound) -> serde_json::Value {
            let mut value = serde_json::to_value(o).unwrap_or(serde_json::Value::Null);
            if let Some(map) = value.as_object_mut() {
                map.remove("tag");
            }
            value
        }
        stripped(self) == stripped(other)
    }
}

// ============================================================================
// TLS and Transport
// ============================================================================

/// TLS configuration for outbound (client) connections
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct OutboundTlsConfig {
    /// Enable TLS
    #[serde(default, skip_serializing_if = "is_false")]
    pub enabled: bool,

    /// Do not send server name in ClientHello
    #[serde(default, skip_serializing_if = "is_false")]
    pub disable_sni: bool,

    /// Server name for verification and SNI
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_name: Option<String>,

    /// Accept any server certificate (insecure)
    #[serde(default, skip_serializing_if = "is_false")]
    pub insecure: bool,

    /// List of supported ALPN protocols
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alpn: Vec<String>,

    /// uTLS fingerprint configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utls: Option<UtlsConfig>,

    /// Reality configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reality: Option<RealityConfig>,
}

/// uTLS configuration
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct UtlsConfig {
    /// Enable uTLS
    #[serde(default, skip_serializing_if = "is_false")]
    pub enabled: bool,

    /// Browser fingerprint to mimic (e.g., "chrome")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

/// Reality configuration for outbound connections
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct RealityConfig {
    /// Enable Reality
    #[serde(default, skip_serializing_if = "is_false")]
    pub enabled: bool,

    /// Server public key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,

    /// Short ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_id: Option<String>,
}

/// V2Ray transport configuration
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Transport {
    /// WebSocket transport
    #[serde(rename = "ws")]
    WebSocket(WebSocketTransport),
    /// gRPC transport
    #[serde(rename = "grpc")]
    Grpc(GrpcTransport),
    /// HTTP transport
    Http(HttpTransport),
}

/// WebSocket transport configuration
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct WebSocketTransport {
    /// HTTP request path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Extra headers
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,

    /// Max early data size
    #[serde(default, skip_serializing_if = "is_zero_u32")]
    pub max_early_data: u32,

    /// Early data header name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub early_data_header_name: Option<String>,
}

/// gRPC transport configuration
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct GrpcTransport {
    /// gRPC service name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
}

/// HTTP transport configuration
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct HttpTransport {
    /// Host domains
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub host: Vec<String>,

    /// HTTP request path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

// ============================================================================
// Outbound Types
// ============================================================================

/// Direct outbound configuration
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct DirectOutbound {
    /// Tag of the outbound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

/// Block outbound configuration
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct BlockOutbound {
    /// Tag of the outbound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

/// DNS outbound configuration
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct DnsOutbound {
    /// Tag of the outbound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

/// Shadowsocks outbound configuration
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ShadowsocksOutbound {
    /// Tag of the outbound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    /// Server address (required)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,

    /// Server port (required)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_port: Option<u16>,

    /// Encryption method (required)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    /// Password (required)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// SIP003 plugin
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin: Option<String>,

    /// SIP003 plugin options
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin_opts: Option<String>,
}

/// VMess outbound configuration
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct VMessOutbound {
    /// Tag of the outbound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    /// Server address (required)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,

    /// Server port (required)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_port: Option<u16>,

    /// VMess user UUID (required)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,

    /// Security: auto, none, zero, aes-128-gcm, chacha20-poly1305
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<String>,

    /// Alter ID (0 = AEAD)
    #[serde(default, skip_serializing_if = "is_zero_u32")]
    pub alter_id: u32,

    /// TLS configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<OutboundTlsConfig>,

    /// V2Ray transport configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport: Option<Transport>,
}

/// VLESS outbound configuration
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct VLessOutbound {
    /// Tag of the outbound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    /// Server address (required)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,

    /// Server port (required)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_port: Option<u16>,

    /// VLESS UUID (required)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,

    /// VLESS flow (e.g., "xtls-rprx-vision")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow: Option<String>,

    /// TLS configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<OutboundTlsConfig>,

    /// V2Ray transport configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport: Option<Transport>,
}

/// Trojan outbound configuration
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct TrojanOutbound {
    /// Tag of the outbound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    /// Server address (required)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,

    /// Server port (required)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_port: Option<u16>,

    /// Trojan password (required)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// TLS configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<OutboundTlsConfig>,

    /// V2Ray transport configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport: Option<Transport>,
}

/// Hysteria2 outbound configuration
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Hysteria2Outbound {
    /// Tag of the outbound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    /// Server address (required)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,

    /// Server port (required)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_port: Option<u16>,

    /// Upload bandwidth in Mbps
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub up_mbps: Option<u32>,

    /// Download bandwidth in Mbps
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub down_mbps: Option<u32>,

    /// Obfuscation configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obfs: Option<Hysteria2Obfs>,

    /// Authentication password
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// TLS configuration (required by the protocol)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<OutboundTlsConfig>,
}

/// Hysteria2 obfuscation configuration
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Hysteria2Obfs {
    /// Obfuscation type (only "salamander")
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub obfs_type: Option<String>,

    /// Obfuscation password
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// TUIC outbound configuration
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct TuicOutbound {
    /// Tag of the outbound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    /// Server address (required)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,

    /// Server port (required)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_port: Option<u16>,

    /// TUIC UUID (required)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,

    /// TUIC password
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Congestion control: cubic, new_reno, bbr
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub congestion_control: Option<String>,

    /// UDP relay mode: native, quic
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub udp_relay_mode: Option<String>,

    /// TLS configuration (required by the protocol)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<OutboundTlsConfig>,
}

/// Selector outbound configuration (manual selection)
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct SelectorOutbound {
    /// Tag of the outbound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    /// List of candidate outbound tags (required)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outbounds: Vec<String>,

    /// Default selected tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    /// Interrupt existing connections when selection changes
    #[serde(default, skip_serializing_if = "is_false")]
    pub interrupt_exist_connections: bool,
}

/// URLTest outbound configuration (latency-based automatic selection)
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct UrlTestOutbound {
    /// Tag of the outbound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    /// List of candidate outbound tags (required)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outbounds: Vec<String>,

    /// Test URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Test interval
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,

    /// Tolerance in milliseconds
    #[serde(default, skip_serializing_if = "is_zero_u32")]
    pub tolerance: u32,
}

// ============================================================================
// Builder Implementations
// ============================================================================

impl DirectOutbound {
    /// Create a new direct outbound with tag
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
        }
    }
}

impl BlockOutbound {
    /// Create a new block outbound with tag
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
        }
    }
}

impl DnsOutbound {
    /// Create a new DNS outbound with tag
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
        }
    }
}

impl ShadowsocksOutbound {
    /// Create a new Shadowsocks outbound with required fields
    pub fn new(
        tag: impl Into<String>,
        server: impl Into<String>,
        server_port: u16,
        method: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            tag: Some(tag.into()),
            server: Some(server.into()),
            server_port: Some(server_port),
            method: Some(method.into()),
            password: Some(password.into()),
            ..Default::default()
        }
    }
}

impl VMessOutbound {
    /// Create a new VMess outbound with required fields
    pub fn new(
        tag: impl Into<String>,
        server: impl Into<String>,
        server_port: u16,
        uuid: impl Into<String>,
    ) -> Self {
        Self {
            tag: Some(tag.into()),
            server: Some(server.into()),
            server_port: Some(server_port),
            uuid: Some(uuid.into()),
            ..Default::default()
        }
    }
}

impl VLessOutbound {
    /// Create a new VLESS outbound with required fields
    pub fn new(
        tag: impl Into<String>,
        server: impl Into<String>,
        server_port: u16,
        uuid: impl Into<String>,
    ) -> Self {
        Self {
            tag: Some(tag.into()),
            server: Some(server.into()),
            server_port: Some(server_port),
            uuid: Some(uuid.into()),
            ..Default::default()
        }
    }

    /// Set the VLESS flow
    pub fn with_flow(mut self, flow: impl Into<String>) -> Self {
        self.flow = Some(flow.into());
        self
    }
}

impl TrojanOutbound {
    /// Create a new Trojan outbound with required fields
    pub fn new(
        tag: impl Into<String>,
        server: impl Into<String>,
        server_port: u16,
        password: impl Into<String>,
    ) -> Self {
        Self {
            tag: Some(tag.into()),
            server: Some(server.into()),
            server_port: Some(server_port),
            password: Some(password.into()),
            ..Default::default()
        }
    }
}

impl SelectorOutbound {
    /// Create a new selector outbound with tag and candidates
    pub fn new(tag: impl Into<String>, outbounds: Vec<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            outbounds,
            ..Default::default()
        }
    }

    /// Set the default selected tag
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }
}

impl UrlTestOutbound {
    /// Create a new urltest outbound with tag and candidates
    pub fn new(tag: impl Into<String>, outbounds: Vec<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            outbounds,
            ..Default::default()
        }
    }

    /// Set the test URL
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set the test interval
    pub fn with_interval(mut self, interval: impl Into<String>) -> Self {
        self.interval = Some(interval.into());
        self
    }
}
