use serde::{Deserialize, Serialize};

use crate::config::dns::Dns;
use crate::config::inbound::Inbound;
use crate::config::log::Log;
use crate::config::outbound::Outbound;
use crate::config::route::Route;

pub mod dns;
pub mod inbound;
pub mod log;
pub mod outbound;
pub mod route;
pub mod util;

/// Root sing-box configuration document.
///
/// One instance is created per build invocation from the base skeleton,
/// mutated in place by the assembly engine, and returned finished. Fields set
/// to their defaults are omitted from serialization.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct SingBoxConfig {
    /// Log configuration
    #[serde(default, skip_serializing_if = "is_default_log")]
    pub log: Log,

    /// DNS configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns: Option<Dns>,

    /// Inbound configurations
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inbounds: Vec<Inbound>,

    /// Outbound configurations
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outbounds: Vec<Outbound>,

    /// Route configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<Route>,
}

fn is_default_log(log: &Log) -> bool {
    !log.disabled && log.level.is_none() && log.output.is_none() && log.timestamp.is_none()
}

impl SingBoxConfig {
    /// Create a new empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize the configuration to a JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize the configuration to a pretty-printed JSON string
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize a configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Find an outbound by tag.
    pub fn outbound(&self, tag: &str) -> Option<&Outbound> {
        self.outbounds.iter().find(|o| o.tag() == Some(tag))
    }
}
