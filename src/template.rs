//! Base skeleton configuration.
//!
//! The skeleton carries the default DNS block (whose primary server expects a
//! detour filled in during finalization), the local inbounds, the built-in
//! `DIRECT`/`REJECT`/`dns-out` outbounds that generated groups reference, and
//! an empty route block.
//!
//! [`base_config`] returns a freshly constructed owned value on every call.
//! Builds must never share a process-wide mutable skeleton: concurrent builds
//! each get their own document.

use crate::config::SingBoxConfig;
use crate::config::dns::{Dns, DnsServer};
use crate::config::inbound::{Inbound, MixedInbound, TunInbound};
use crate::config::log::{Log, LogLevel};
use crate::config::outbound::{BlockOutbound, DirectOutbound, DnsOutbound, Outbound};
use crate::config::route::Route;

/// Tag of the built-in direct outbound.
pub const DIRECT_TAG: &str = "DIRECT";

/// Tag of the built-in reject outbound.
pub const REJECT_TAG: &str = "REJECT";

/// Construct the base skeleton configuration.
pub fn base_config() -> SingBoxConfig {
    SingBoxConfig {
        log: Log {
            level: Some(LogLevel::Info),
            timestamp: Some(true),
            ..Default::default()
        },
        dns: Some(Dns {
            servers: vec![
                // Primary server; finalization points its detour at the
                // node-select group.
                DnsServer::new("dns-remote", "tls://8.8.8.8").with_address_resolver("dns-resolver"),
                DnsServer::new("dns-direct", "https://dns.alidns.com/dns-query")
                    .with_address_resolver("dns-resolver")
                    .with_detour(DIRECT_TAG),
                DnsServer::new("dns-resolver", "223.5.5.5").with_detour(DIRECT_TAG),
            ],
            r#final: Some("dns-remote".to_string()),
            independent_cache: true,
            ..Default::default()
        }),
        inbounds: vec![
            Inbound::Mixed(MixedInbound::new("mixed-in").listen("0.0.0.0", 2080)),
            Inbound::Tun(
                TunInbound::new("tun-in")
                    .address(vec!["172.19.0.1/30".to_string()])
                    .auto_route()
                    .strict_route()
                    .stack("mixed"),
            ),
        ],
        outbounds: vec![
            Outbound::Direct(DirectOutbound::new(DIRECT_TAG)),
            Outbound::Block(BlockOutbound::new(REJECT_TAG)),
            Outbound::Dns(DnsOutbound::new("dns-out")),
        ],
        route: Some(Route::new()),
    }
}
