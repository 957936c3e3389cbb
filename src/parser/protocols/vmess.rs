//! VMess (vmess://) share-link parser.
//!
//! VMess links are base64-encoded JSON:
//! `vmess://BASE64({"v":"2","ps":"name","add":"host","port":443,...})`

use std::collections::HashMap;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

use crate::config::outbound::{
    GrpcTransport, Outbound, OutboundTlsConfig, Transport, UtlsConfig, VMessOutbound,
    WebSocketTransport,
};
use crate::parser::LinkParser;
use crate::parser::base64::decode_base64_str;

/// Parser for VMess (vmess://) links
pub struct VMessParser;

/// VMess link JSON payload
#[derive(Deserialize, Debug)]
struct VMessJson {
    /// Remark/name
    #[serde(default)]
    ps: String,
    /// Server address
    add: String,
    /// Server port (number or string)
    #[serde(deserialize_with = "deserialize_port")]
    port: u16,
    /// UUID
    id: String,
    /// Alter ID (number or string)
    #[serde(default, deserialize_with = "deserialize_option_u32")]
    aid: Option<u32>,
    /// Security/encryption method
    #[serde(default)]
    scy: Option<String>,
    /// Network type (tcp, ws, grpc)
    #[serde(default)]
    net: Option<String>,
    /// TLS setting ("tls" enables it)
    #[serde(default)]
    tls: Option<String>,
    /// SNI
    #[serde(default)]
    sni: Option<String>,
    /// ALPN (comma separated)
    #[serde(default)]
    alpn: Option<String>,
    /// uTLS fingerprint
    #[serde(default)]
    fp: Option<String>,
    /// WebSocket host header
    #[serde(default)]
    host: Option<String>,
    /// WebSocket path
    #[serde(default)]
    path: Option<String>,
    /// gRPC service name
    #[serde(default, rename = "serviceName")]
    service_name: Option<String>,
}

impl LinkParser for VMessParser {
    fn scheme(&self) -> &str {
        "vmess"
    }

    fn parse(&self, link: &str) -> Result<Outbound> {
        let encoded = link
            .strip_prefix("vmess://")
            .ok_or_else(|| anyhow!("Invalid VMess link: missing vmess:// prefix"))?;

        let decoded = decode_base64_str(encoded).context("Failed to decode VMess link")?;
        let json: VMessJson =
            serde_json::from_str(&decoded).context("Failed to parse VMess JSON")?;

        let tls = if json.tls.as_deref() == Some("tls") {
            Some(OutboundTlsConfig {
                enabled: true,
                server_name: json.sni.clone(),
                alpn: json
                    .alpn
                    .as_ref()
                    .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                    .unwrap_or_default(),
                utls: json.fp.as_ref().map(|fp| UtlsConfig {
                    enabled: true,
                    fingerprint: Some(fp.clone()),
                }),
                ..Default::default()
            })
        } else {
            None
        };

        let transport = build_transport(&json);

        let tag = if json.ps.is_empty() {
            format!("{}:{}", json.add, json.port)
        } else {
            json.ps
        };

        Ok(Outbound::VMess(VMessOutbound {
            tag: Some(tag),
            server: Some(json.add),
            server_port: Some(json.port),
            uuid: Some(json.id),
            security: json.scy.or_else(|| Some("auto".to_string())),
            alter_id: json.aid.unwrap_or(0),
            tls,
            transport,
        }))
    }
}

fn build_transport(json: &VMessJson) -> Option<Transport> {
    match json.net.as_deref() {
        Some("ws") | Some("websocket") => {
            let mut headers = HashMap::new();
            if let Some(host) = &json.host
                && !host.is_empty()
            {
                headers.insert("Host".to_string(), host.clone());
            }
            Some(Transport::WebSocket(WebSocketTransport {
                path: json.path.clone(),
                headers,
                ..Default::default()
            }))
        }
        Some("grpc") => Some(Transport::Grpc(GrpcTransport {
            service_name: json.service_name.clone(),
        })),
        _ => None,
    }
}

/// Port fields arrive as either numbers or strings.
fn deserialize_port<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum PortValue {
        Number(u16),
        String(String),
    }

    match PortValue::deserialize(deserializer)? {
        PortValue::Number(n) => Ok(n),
        PortValue::String(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

fn deserialize_option_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum U32Value {
        Number(u32),
        String(String),
    }

    match Option::<U32Value>::deserialize(deserializer)? {
        Some(U32Value::Number(n)) => Ok(Some(n)),
        Some(U32Value::String(s)) if s.is_empty() => Ok(None),
        Some(U32Value::String(s)) => s.parse().map(Some).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}
