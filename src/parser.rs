//! Share-link parsing.
//!
//! Turns subscription text — a plain or base64-encoded list of proxy share
//! links, one per line — into normalized [`Outbound`] descriptors for the
//! assembly engine. Individual schemes are handled by [`LinkParser`]
//! implementations dispatched through a [`ParserRegistry`]; lines that fail
//! to parse are logged and dropped rather than failing the whole list.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Result, anyhow, bail};
use tracing::{debug, warn};

use crate::config::outbound::Outbound;
use crate::parser::base64::decode_base64;
use crate::parser::protocols::{
    Hysteria2Parser, ShadowsocksParser, TrojanParser, TuicParser, VLessParser, VMessParser,
};

pub mod base64;
pub mod protocols;

// ============================================================================
// Link Parser Trait
// ============================================================================

/// Parser for one proxy share-link scheme.
pub trait LinkParser: Send + Sync {
    /// The URI scheme this parser handles (e.g., "ss", "vmess").
    fn scheme(&self) -> &str;

    /// Parse a link into an outbound descriptor.
    fn parse(&self, link: &str) -> Result<Outbound>;

    /// Whether this parser can handle the given link.
    fn can_parse(&self, link: &str) -> bool {
        link.starts_with(&format!("{}://", self.scheme()))
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Registry of scheme parsers with dynamic dispatch.
#[derive(Default)]
pub struct ParserRegistry {
    parsers: HashMap<String, Arc<dyn LinkParser>>,
}

impl ParserRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with all built-in parsers registered.
    pub fn with_builtin_parsers() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ShadowsocksParser));
        registry.register(Arc::new(VMessParser));
        registry.register(Arc::new(VLessParser));
        registry.register(Arc::new(TrojanParser));
        registry.register(Arc::new(Hysteria2Parser::new("hysteria2")));
        registry.register(Arc::new(Hysteria2Parser::new("hy2")));
        registry.register(Arc::new(TuicParser));
        registry
    }

    /// Register a scheme parser.
    pub fn register(&mut self, parser: Arc<dyn LinkParser>) {
        self.parsers.insert(parser.scheme().to_string(), parser);
    }

    /// Parse a single link via its scheme's parser.
    pub fn parse_link(&self, link: &str) -> Result<Outbound> {
        let scheme = extract_scheme(link)?;
        let parser = self
            .parsers
            .get(scheme)
            .ok_or_else(|| anyhow!("No parser registered for scheme: {}", scheme))?;
        parser.parse(link)
    }

    /// Parse a list of links (one per line), keeping only the successes.
    pub fn parse_link_list(&self, content: &str) -> Vec<Outbound> {
        let lines: Vec<&str> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .collect();
        let total = lines.len();

        let outbounds: Vec<Outbound> = lines
            .into_iter()
            .filter_map(|line| match self.parse_link(line) {
                Ok(outbound) => Some(outbound),
                Err(e) => {
                    warn!("Failed to parse link: {}", e);
                    None
                }
            })
            .collect();

        debug!(
            "Link list parsing complete: {} total, {} parsed",
            total,
            outbounds.len()
        );
        outbounds
    }
}

fn extract_scheme(link: &str) -> Result<&str> {
    if !link.contains("://") {
        bail!("Invalid link: missing scheme separator ://");
    }
    link.split("://")
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| anyhow!("Invalid link: missing scheme"))
}

// ============================================================================
// Subscription Content
// ============================================================================

fn is_share_link(line: &str) -> bool {
    const SCHEMES: [&str; 7] = [
        "ss://",
        "vmess://",
        "vless://",
        "trojan://",
        "hysteria2://",
        "hy2://",
        "tuic://",
    ];
    SCHEMES.iter().any(|scheme| line.starts_with(scheme))
}

/// Decode subscription content into plain link lines.
///
/// Accepts either a plain link list or the whole list base64-encoded (the
/// common subscription delivery format, with or without padding).
pub fn decode_content(content: &str) -> Result<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        bail!("Empty subscription content");
    }

    if trimmed.lines().any(|line| is_share_link(line.trim())) {
        return Ok(trimmed.to_string());
    }

    let decoded = decode_base64(trimmed)?;
    let text = String::from_utf8(decoded)
        .map_err(|_| anyhow!("Decoded subscription content is not valid UTF-8"))?;
    if !text.lines().any(|line| is_share_link(line.trim())) {
        bail!("Decoded content contains no recognized share links");
    }
    Ok(text)
}

/// Parse subscription content into outbound descriptors, decoding base64
/// content automatically.
pub fn parse_links(content: &str) -> Result<Vec<Outbound>> {
    let decoded = decode_content(content)?;
    let registry = ParserRegistry::with_builtin_parsers();
    Ok(registry.parse_link_list(&decoded))
}
