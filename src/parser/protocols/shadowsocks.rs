//! Shadowsocks (ss://) share-link parser.
//!
//! Two encodings circulate:
//! - SIP002: `ss://BASE64(method:password)@host:port?plugin=...#tag`
//! - Legacy: `ss://BASE64(method:password@host:port)#tag`

use anyhow::{Result, anyhow, bail};

use crate::config::outbound::{Outbound, ShadowsocksOutbound};
use crate::parser::LinkParser;
use crate::parser::base64::decode_base64_str;

use super::split_host_port;

/// Parser for Shadowsocks (ss://) links
pub struct ShadowsocksParser;

impl LinkParser for ShadowsocksParser {
    fn scheme(&self) -> &str {
        "ss"
    }

    fn parse(&self, link: &str) -> Result<Outbound> {
        let body = link
            .strip_prefix("ss://")
            .ok_or_else(|| anyhow!("Invalid Shadowsocks link: missing ss:// prefix"))?;

        let (body, fragment) = match body.split_once('#') {
            Some((body, fragment)) => (body, Some(fragment)),
            None => (body, None),
        };
        let (body, query) = match body.split_once('?') {
            Some((body, query)) => (body, Some(query)),
            None => (body, None),
        };

        let (method, password, server, server_port) = if let Some((userinfo, address)) =
            body.rsplit_once('@')
        {
            // SIP002: only the userinfo is encoded (some providers skip
            // encoding it altogether).
            let userinfo = decode_base64_str(userinfo).unwrap_or_else(|_| userinfo.to_string());
            let (method, password) = userinfo
                .split_once(':')
                .ok_or_else(|| anyhow!("Invalid Shadowsocks userinfo: missing ':'"))?;
            let (server, port) = split_host_port(address)?;
            (method.to_string(), password.to_string(), server, port)
        } else {
            // Legacy: the whole body is encoded.
            let decoded = decode_base64_str(body)?;
            let (userinfo, address) = decoded
                .rsplit_once('@')
                .ok_or_else(|| anyhow!("Invalid Shadowsocks link: missing '@'"))?;
            let (method, password) = userinfo
                .split_once(':')
                .ok_or_else(|| anyhow!("Invalid Shadowsocks userinfo: missing ':'"))?;
            let (server, port) = split_host_port(address)?;
            (method.to_string(), password.to_string(), server, port)
        };

        if method.is_empty() {
            bail!("Shadowsocks link missing encryption method");
        }

        let tag = fragment
            .map(|f| {
                urlencoding::decode(f)
                    .unwrap_or_else(|_| f.into())
                    .into_owned()
            })
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| format!("{}:{}", server, server_port));

        let (plugin, plugin_opts) = parse_plugin(query);

        let mut outbound = ShadowsocksOutbound::new(tag, server, server_port, method, password);
        outbound.plugin = plugin;
        outbound.plugin_opts = plugin_opts;
        Ok(Outbound::Shadowsocks(outbound))
    }
}

fn parse_plugin(query: Option<&str>) -> (Option<String>, Option<String>) {
    let Some(query) = query else {
        return (None, None);
    };
    let Some(raw) = query
        .split('&')
        .find_map(|pair| pair.strip_prefix("plugin="))
    else {
        return (None, None);
    };
    let decoded = urlencoding::decode(raw)
        .unwrap_or_else(|_| raw.into())
        .into_owned();
    match decoded.split_once(';') {
        Some((name, opts)) => (Some(name.to_string()), Some(opts.to_string())),
        None => (Some(decoded), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;

    #[test]
    fn test_legacy_form() {
        let parser = ShadowsocksParser;
        let encoded = STANDARD.encode("aes-256-gcm:testpassword@127.0.0.1:1000");
        let link = format!("ss://{}#my%20node", encoded);
        let outbound = parser.parse(&link).unwrap();

        match outbound {
            Outbound::Shadowsocks(ss) => {
                assert_eq!(ss.tag.as_deref(), Some("my node"));
                assert_eq!(ss.server.as_deref(), Some("127.0.0.1"));
                assert_eq!(ss.server_port, Some(1000));
                assert_eq!(ss.method.as_deref(), Some("aes-256-gcm"));
                assert_eq!(ss.password.as_deref(), Some("testpassword"));
            }
            _ => panic!("Expected Shadowsocks outbound"),
        }
    }

    #[test]
    fn test_sip002_form() {
        let parser = ShadowsocksParser;
        let userinfo = STANDARD.encode("chacha20-ietf-poly1305:secret");
        let link = format!("ss://{}@ss.example.com:8388#tokyo", userinfo);
        let outbound = parser.parse(&link).unwrap();

        match outbound {
            Outbound::Shadowsocks(ss) => {
                assert_eq!(ss.tag.as_deref(), Some("tokyo"));
                assert_eq!(ss.server.as_deref(), Some("ss.example.com"));
                assert_eq!(ss.method.as_deref(), Some("chacha20-ietf-poly1305"));
            }
            _ => panic!("Expected Shadowsocks outbound"),
        }
    }

    #[test]
    fn test_sip002_with_plugin() {
        let parser = ShadowsocksParser;
        let userinfo = STANDARD.encode("aes-128-gcm:pw");
        let link = format!(
            "ss://{}@ss.example.com:443?plugin=obfs-local%3Bobfs%3Dhttp#obfs",
            userinfo
        );
        let outbound = parser.parse(&link).unwrap();

        match outbound {
            Outbound::Shadowsocks(ss) => {
                assert_eq!(ss.plugin.as_deref(), Some("obfs-local"));
                assert_eq!(ss.plugin_opts.as_deref(), Some("obfs=http"));
            }
            _ => panic!("Expected Shadowsocks outbound"),
        }
    }

    #[test]
    fn test_missing_name_falls_back_to_address() {
        let parser = ShadowsocksParser;
        let encoded = STANDARD.encode("aes-256-gcm:pw@1.2.3.4:8388");
        let outbound = parser.parse(&format!("ss://{}", encoded)).unwrap();
        assert_eq!(outbound.tag(), Some("1.2.3.4:8388"));
    }

    #[test]
    fn test_invalid_links() {
        let parser = ShadowsocksParser;
        assert!(parser.parse("ss://").is_err());
        assert!(parser.parse("ss://!!!").is_err());
        let no_colon = STANDARD.encode("methodonly@1.2.3.4:8388");
        assert!(parser.parse(&format!("ss://{}", no_colon)).is_err());
    }

    #[test]
    fn test_can_parse() {
        let parser = ShadowsocksParser;
        assert!(parser.can_parse("ss://abc"));
        assert!(!parser.can_parse("vmess://abc"));
    }
}
