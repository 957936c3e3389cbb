//! VLESS (vless://) share-link parser.
//!
//! Format: `vless://uuid@host:port?params#tag`

use std::collections::HashMap;

use anyhow::{Result, anyhow, bail};
use url::Url;

use crate::config::outbound::{
    GrpcTransport, Outbound, OutboundTlsConfig, RealityConfig, Transport, UtlsConfig,
    VLessOutbound, WebSocketTransport,
};
use crate::parser::LinkParser;

use super::{link_tag, query_map};

/// Parser for VLESS (vless://) links
pub struct VLessParser;

impl LinkParser for VLessParser {
    fn scheme(&self) -> &str {
        "vless"
    }

    fn parse(&self, link: &str) -> Result<Outbound> {
        let url = Url::parse(link).map_err(|e| anyhow!("Failed to parse VLESS link: {}", e))?;

        let uuid = url.username().to_string();
        if uuid.is_empty() {
            bail!("VLESS link missing UUID");
        }

        let server = url
            .host_str()
            .ok_or_else(|| anyhow!("VLESS link missing host"))?
            .to_string();
        let server_port = url.port().ok_or_else(|| anyhow!("VLESS link missing port"))?;

        let params = query_map(&url);
        let tag = link_tag(&url, &server, server_port);

        let tls = build_tls(&params);
        let transport = build_transport(&params);

        let mut outbound = VLessOutbound::new(tag, server, server_port, uuid);
        if let Some(flow) = params.get("flow").filter(|f| !f.is_empty()) {
            outbound = outbound.with_flow(flow.clone());
        }
        outbound.tls = tls;
        outbound.transport = transport;
        Ok(Outbound::VLess(outbound))
    }
}

fn build_tls(params: &HashMap<String, String>) -> Option<OutboundTlsConfig> {
    let security = params.get("security").map(String::as_str).unwrap_or("none");
    if security != "tls" && security != "reality" {
        return None;
    }

    let reality = (security == "reality").then(|| RealityConfig {
        enabled: true,
        public_key: params.get("pbk").cloned(),
        short_id: params.get("sid").cloned(),
    });

    Some(OutboundTlsConfig {
        enabled: true,
        server_name: params.get("sni").cloned(),
        alpn: params
            .get("alpn")
            .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
            .unwrap_or_default(),
        utls: params.get("fp").map(|fp| UtlsConfig {
            enabled: true,
            fingerprint: Some(fp.clone()),
        }),
        reality,
        ..Default::default()
    })
}

fn build_transport(params: &HashMap<String, String>) -> Option<Transport> {
    match params.get("type").map(String::as_str) {
        Some("ws") | Some("websocket") => {
            let mut headers = HashMap::new();
            if let Some(host) = params.get("host")
                && !host.is_empty()
            {
                headers.insert("Host".to_string(), host.clone());
            }
            Some(Transport::WebSocket(WebSocketTransport {
                path: params.get("path").cloned(),
                headers,
                ..Default::default()
            }))
        }
        Some("grpc") => Some(Transport::Grpc(GrpcTransport {
            service_name: params.get("serviceName").cloned(),
        })),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vless_basic() {
        let parser = VLessParser;
        let link = "vless://12345678-1234-1234-1234-123456789abc@127.0.0.1:1000?encryption=none&security=none#node";
        let outbound = parser.parse(link).unwrap();

        match outbound {
            Outbound::VLess(vless) => {
                assert_eq!(vless.tag.as_deref(), Some("node"));
                assert_eq!(vless.server.as_deref(), Some("127.0.0.1"));
                assert_eq!(vless.server_port, Some(1000));
                assert_eq!(
                    vless.uuid.as_deref(),
                    Some("12345678-1234-1234-1234-123456789abc")
                );
                assert!(vless.tls.is_none());
            }
            _ => panic!("Expected VLESS outbound"),
        }
    }

    #[test]
    fn test_vless_reality() {
        let parser = VLessParser;
        let link = "vless://uuid@example.com:443?security=reality&sni=cdn.example.com&pbk=publickey&sid=0123&fp=chrome&flow=xtls-rprx-vision#reality-node";
        let outbound = parser.parse(link).unwrap();

        match outbound {
            Outbound::VLess(vless) => {
                assert_eq!(vless.flow.as_deref(), Some("xtls-rprx-vision"));
                let tls = vless.tls.unwrap();
                assert!(tls.enabled);
                assert_eq!(tls.server_name.as_deref(), Some("cdn.example.com"));
                let reality = tls.reality.unwrap();
                assert_eq!(reality.public_key.as_deref(), Some("publickey"));
                assert_eq!(reality.short_id.as_deref(), Some("0123"));
            }
            _ => panic!("Expected VLESS outbound"),
        }
    }

    #[test]
    fn test_vless_ws_transport() {
        let parser = VLessParser;
        let link =
            "vless://uuid@example.com:443?security=tls&type=ws&path=%2Fws&host=ws.example.com#ws";
        let outbound = parser.parse(link).unwrap();

        match outbound {
            Outbound::VLess(vless) => match vless.transport {
                Some(Transport::WebSocket(ws)) => {
                    assert_eq!(ws.path.as_deref(), Some("/ws"));
                    assert_eq!(
                        ws.headers.get("Host").map(String::as_str),
                        Some("ws.example.com")
                    );
                }
                _ => panic!("Expected WebSocket transport"),
            },
            _ => panic!("Expected VLESS outbound"),
        }
    }

    #[test]
    fn test_vless_percent_encoded_fragment() {
        let parser = VLessParser;
        let link = "vless://uuid@example.com:443#%E8%8A%82%E7%82%B9";
        let outbound = parser.parse(link).unwrap();
        assert_eq!(outbound.tag(), Some("节点"));
    }

    #[test]
    fn test_vless_invalid() {
        let parser = VLessParser;
        assert!(parser.parse("vless://@example.com:443").is_err());
        assert!(parser.parse("vless://uuid@example.com").is_err());
    }
}
