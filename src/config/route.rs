//! Route configuration types for sing-box.
//!
//! Routing rules are first-match: the order of `Route::rules` is part of the
//! configuration's meaning, not a presentation detail.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::config::util::{is_false, string_or_vec};

// ============================================================================
// Route Configuration
// ============================================================================

/// Main route configuration
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Route {
    /// Ordered list of route rules
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<RouteRule>,

    /// List of rule-set declarations referenced by the rules
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rule_set: Vec<RuleSet>,

    /// Default outbound tag when no rule matches
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "final")]
    pub final_outbound: Option<String>,

    /// Bind outbound connections to the default network interface
    #[serde(default, skip_serializing_if = "is_false")]
    pub auto_detect_interface: bool,
}

impl Route {
    /// Create a new empty route configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a route rule.
    pub fn add_rule(mut self, rule: RouteRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Add a rule-set declaration.
    pub fn add_rule_set(mut self, rule_set: RuleSet) -> Self {
        self.rule_set.push(rule_set);
        self
    }

    /// Set the final/default outbound.
    pub fn with_final(mut self, outbound: impl Into<String>) -> Self {
        self.final_outbound = Some(outbound.into());
        self
    }
}

// ============================================================================
// Route Rules
// ============================================================================

/// A route rule that matches connections and routes them to an outbound
/// or applies an action.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct RouteRule {
    /// Match Clash mode ("direct", "global")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clash_mode: Option<String>,

    /// Match sniffed protocol
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "string_or_vec"
    )]
    pub protocol: Vec<String>,

    /// Match domain suffix
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "string_or_vec"
    )]
    pub domain_suffix: Vec<String>,

    /// Match domain keyword
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "string_or_vec"
    )]
    pub domain_keyword: Vec<String>,

    /// Match IP CIDR
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "string_or_vec"
    )]
    pub ip_cidr: Vec<String>,

    /// Match rule sets by tag
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "string_or_vec"
    )]
    pub rule_set: Vec<String>,

    /// Rule action (sniff, hijack-dns)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<RuleAction>,

    /// Target outbound tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outbound: Option<String>,
}

impl RouteRule {
    /// Create a new empty rule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Match Clash mode.
    pub fn match_clash_mode(mut self, mode: impl Into<String>) -> Self {
        self.clash_mode = Some(mode.into());
        self
    }

    /// Match sniffed protocols.
    pub fn match_protocol(mut self, protocols: Vec<String>) -> Self {
        self.protocol = protocols;
        self
    }

    /// Match domain suffixes.
    pub fn match_domain_suffix(mut self, suffixes: Vec<String>) -> Self {
        self.domain_suffix = suffixes;
        self
    }

    /// Match domain keywords.
    pub fn match_domain_keyword(mut self, keywords: Vec<String>) -> Self {
        self.domain_keyword = keywords;
        self
    }

    /// Match IP CIDRs.
    pub fn match_ip_cidr(mut self, cidrs: Vec<String>) -> Self {
        self.ip_cidr = cidrs;
        self
    }

    /// Match rule sets.
    pub fn match_rule_set(mut self, rule_sets: Vec<String>) -> Self {
        self.rule_set = rule_sets;
        self
    }

    /// Set the action.
    pub fn with_action(mut self, action: RuleAction) -> Self {
        self.action = Some(action);
        self
    }

    /// Set the target outbound.
    pub fn with_outbound(mut self, outbound: impl Into<String>) -> Self {
        self.outbound = Some(outbound.into());
        self
    }
}

// ============================================================================
// Rule Actions
// ============================================================================

/// Rule action types, serialized in the simple string form
/// (`"action": "sniff"`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuleAction {
    /// Perform protocol sniffing
    Sniff,
    /// Hijack DNS requests
    HijackDns,
}

impl RuleAction {
    fn as_str(self) -> &'static str {
        match self {
            RuleAction::Sniff => "sniff",
            RuleAction::HijackDns => "hijack-dns",
        }
    }
}

impl Serialize for RuleAction {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RuleAction {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error;
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            "sniff" => Ok(RuleAction::Sniff),
            "hijack-dns" => Ok(RuleAction::HijackDns),
            other => Err(D::Error::custom(format!("unknown action: {}", other))),
        }
    }
}

// ============================================================================
// Rule Sets
// ============================================================================

/// Rule-set declaration.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RuleSet {
    /// Local file rule set
    Local(LocalRuleSet),
    /// Remote rule set
    Remote(RemoteRuleSet),
}

impl RuleSet {
    /// Returns the rule set's tag.
    pub fn tag(&self) -> &str {
        match self {
            RuleSet::Local(rs) => &rs.tag,
            RuleSet::Remote(rs) => &rs.tag,
        }
    }
}

/// Local file rule set.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct LocalRuleSet {
    /// Tag of the rule set (required)
    pub tag: String,

    /// Format of the rule set file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<RuleSetFormat>,

    /// File path of the rule set (required)
    pub path: String,
}

/// Remote rule set.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct RemoteRuleSet {
    /// Tag of the rule set (required)
    pub tag: String,

    /// Format of the rule set file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<RuleSetFormat>,

    /// Download URL of the rule set (required)
    pub url: String,

    /// Outbound tag used to download the rule set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_detour: Option<String>,
}

impl RemoteRuleSet {
    /// Create a new remote rule set.
    pub fn new(tag: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            url: url.into(),
            format: None,
            download_detour: None,
        }
    }

    /// Set the file format.
    pub fn with_format(mut self, format: RuleSetFormat) -> Self {
        self.format = Some(format);
        self
    }
}

/// Rule-set file format.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RuleSetFormat {
    Source,
    Binary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_final_field_renamed() {
        let route = Route::new().with_final("Fall Back");
        let json = serde_json::to_string(&route).unwrap();
        assert!(json.contains(r#""final":"Fall Back""#));
    }

    #[test]
    fn test_clash_mode_rule() {
        let rule = RouteRule::new()
            .match_clash_mode("direct")
            .with_outbound("DIRECT");
        let json = serde_json::to_string(&rule).unwrap();
        assert_eq!(json, r#"{"clash_mode":"direct","outbound":"DIRECT"}"#);
    }

    #[test]
    fn test_sniff_action_serializes_as_string() {
        let rule = RouteRule::new().with_action(RuleAction::Sniff);
        let json = serde_json::to_string(&rule).unwrap();
        assert_eq!(json, r#"{"action":"sniff"}"#);
    }

    #[test]
    fn test_hijack_dns_rule() {
        let rule = RouteRule::new()
            .match_protocol(vec!["dns".to_string()])
            .with_action(RuleAction::HijackDns);
        let json = serde_json::to_string(&rule).unwrap();
        assert_eq!(json, r#"{"protocol":["dns"],"action":"hijack-dns"}"#);
    }

    #[test]
    fn test_rule_action_deserialization() {
        let rule: RouteRule = serde_json::from_str(r#"{"action": "hijack-dns"}"#).unwrap();
        assert_eq!(rule.action, Some(RuleAction::HijackDns));

        let err = serde_json::from_str::<RouteRule>(r#"{"action": "resolve"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_rule_protocol_accepts_single_string() {
        let rule: RouteRule = serde_json::from_str(r#"{"protocol": "dns"}"#).unwrap();
        assert_eq!(rule.protocol, vec!["dns"]);
    }

    #[test]
    fn test_remote_rule_set_serialization() {
        let rs = RuleSet::Remote(
            RemoteRuleSet::new(
                "geosite-google",
                "https://example.com/geosite-google.srs",
            )
            .with_format(RuleSetFormat::Binary),
        );
        let json = serde_json::to_string(&rs).unwrap();
        assert!(json.contains(r#""type":"remote""#));
        assert!(json.contains(r#""format":"binary""#));
        assert_eq!(rs.tag(), "geosite-google");
    }

    #[test]
    fn test_local_rule_set_roundtrip() {
        let json = r#"{"type": "local", "tag": "my-rules", "format": "source", "path": "./rules.json"}"#;
        let rs: RuleSet = serde_json::from_str(json).unwrap();
        match &rs {
            RuleSet::Local(local) => {
                assert_eq!(local.path, "./rules.json");
                assert_eq!(local.format, Some(RuleSetFormat::Source));
            }
            RuleSet::Remote(_) => panic!("Expected local rule set"),
        }
        assert_eq!(rs.tag(), "my-rules");
    }

    #[test]
    fn test_rule_order_preserved_in_route() {
        let route = Route::new()
            .add_rule(RouteRule::new().match_clash_mode("direct").with_outbound("DIRECT"))
            .add_rule(RouteRule::new().with_action(RuleAction::Sniff));
        assert_eq!(route.rules[0].clash_mode.as_deref(), Some("direct"));
        assert_eq!(route.rules[1].action, Some(RuleAction::Sniff));
    }
}
