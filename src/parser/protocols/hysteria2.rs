//! Hysteria2 (hysteria2:// / hy2://) share-link parser.
//!
//! Format: `hysteria2://auth@host:port?params#tag`

use anyhow::{Result, anyhow, bail};
use url::Url;

use crate::config::outbound::{Hysteria2Obfs, Hysteria2Outbound, Outbound, OutboundTlsConfig};
use crate::parser::LinkParser;

use super::{link_tag, query_map};

/// Parser for Hysteria2 links; registered for both the `hysteria2` and the
/// short `hy2` scheme.
pub struct Hysteria2Parser {
    scheme: String,
}

impl Hysteria2Parser {
    /// Create a parser for the given scheme spelling.
    pub fn new(scheme: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
        }
    }
}

impl LinkParser for Hysteria2Parser {
    fn scheme(&self) -> &str {
        &self.scheme
    }

    fn parse(&self, link: &str) -> Result<Outbound> {
        let url = Url::parse(link).map_err(|e| anyhow!("Failed to parse Hysteria2 link: {}", e))?;

        let password = urlencoding::decode(url.username())
            .unwrap_or_else(|_| url.username().into())
            .into_owned();
        if password.is_empty() {
            bail!("Hysteria2 link missing auth password");
        }

        let server = url
            .host_str()
            .ok_or_else(|| anyhow!("Hysteria2 link missing host"))?
            .to_string();
        let server_port = url
            .port()
            .ok_or_else(|| anyhow!("Hysteria2 link missing port"))?;

        let params = query_map(&url);
        let tag = link_tag(&url, &server, server_port);

        let obfs = params
            .get("obfs")
            .filter(|o| !o.is_empty())
            .map(|obfs_type| Hysteria2Obfs {
                obfs_type: Some(obfs_type.clone()),
                password: params.get("obfs-password").cloned(),
            });

        let insecure = matches!(
            params.get("insecure").map(String::as_str),
            Some("1") | Some("true")
        );

        // Hysteria2 always runs over TLS.
        let tls = OutboundTlsConfig {
            enabled: true,
            server_name: params.get("sni").cloned(),
            insecure,
            ..Default::default()
        };

        Ok(Outbound::Hysteria2(Hysteria2Outbound {
            tag: Some(tag),
            server: Some(server),
            server_port: Some(server_port),
            password: Some(password),
            obfs,
            tls: Some(tls),
            ..Default::default()
        }))
    }
}
