//! Trojan (trojan://) share-link parser.
//!
//! Format: `trojan://password@host:port?params#tag`

use std::collections::HashMap;

use anyhow::{Result, anyhow, bail};
use url::Url;

use crate::config::outbound::{
    GrpcTransport, Outbound, OutboundTlsConfig, Transport, TrojanOutbound, UtlsConfig,
    WebSocketTransport,
};
use crate::parser::LinkParser;

use super::{link_tag, query_map};

/// Parser for Trojan (trojan://) links
pub struct TrojanParser;

impl LinkParser for TrojanParser {
    fn scheme(&self) -> &str {
        "trojan"
    }

    fn parse(&self, link: &str) -> Result<Outbound> {
        let url = Url::parse(link).map_err(|e| anyhow!("Failed to parse Trojan link: {}", e))?;

        let password = urlencoding::decode(url.username())
            .unwrap_or_else(|_| url.username().into())
            .into_owned();
        if password.is_empty() {
            bail!("Trojan link missing password");
        }

        let server = url
            .host_str()
            .ok_or_else(|| anyhow!("Trojan link missing host"))?
            .to_string();
        let server_port = url
            .port()
            .ok_or_else(|| anyhow!("Trojan link missing port"))?;

        let params = query_map(&url);
        let tag = link_tag(&url, &server, server_port);

        // Trojan runs over TLS unless explicitly disabled.
        let security = params.get("security").map(String::as_str).unwrap_or("tls");
        let tls = (security != "none").then(|| OutboundTlsConfig {
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
            ..Default::default()
        });

        let transport = build_transport(&params);

        let mut outbound = TrojanOutbound::new(tag, server, server_port, password);
        outbound.tls = tls;
        outbound.transport = transport;
        Ok(Outbound::Trojan(outbound))
    }
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
