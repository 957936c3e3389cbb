//! Static rule catalog and rule compilation inputs.
//!
//! The catalog maps rule-category names to their matching criteria: geosite
//! and geoip rule-set references, literal domain suffixes/keywords, literal
//! IP CIDRs, an optional sniffed-protocol filter, and the outbound group key
//! traffic is routed to. Entries are read-only; the assembly engine never
//! mutates them.
//!
//! User-supplied custom rules reuse the same [`RuleSpec`] shape and always
//! target a selector group named after the rule itself.

use serde::{Deserialize, Serialize};

use crate::config::route::{RemoteRuleSet, RuleSet, RuleSetFormat};

/// Base URL for geosite (domain) rule sets.
pub const SITE_RULE_SET_BASE_URL: &str =
    "https://raw.githubusercontent.com/SagerNet/sing-geosite/rule-set/";

/// Base URL for geoip (address) rule sets.
pub const IP_RULE_SET_BASE_URL: &str =
    "https://raw.githubusercontent.com/SagerNet/sing-geoip/rule-set/";

/// Suffix appended to ip rule-set tags to keep them out of the site
/// rule-set namespace.
pub const IP_RULE_SET_SUFFIX: &str = "-ip";

/// Matching criteria and routing target for one rule category or custom rule.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct RuleSpec {
    /// Category or custom-rule name
    pub name: String,

    /// Target outbound group key
    #[serde(default)]
    pub outbound: String,

    /// Geosite rule-set references
    #[serde(default)]
    pub site_rules: Vec<String>,

    /// Geoip rule-set references
    #[serde(default)]
    pub ip_rules: Vec<String>,

    /// Literal domain suffixes
    #[serde(default)]
    pub domain_suffix: Vec<String>,

    /// Literal domain keywords
    #[serde(default)]
    pub domain_keyword: Vec<String>,

    /// Literal IP CIDRs
    #[serde(default)]
    pub ip_cidr: Vec<String>,

    /// Sniffed-protocol filter
    #[serde(default)]
    pub protocol: Vec<String>,
}

fn category(name: &str, site_rules: &[&str], ip_rules: &[&str]) -> RuleSpec {
    RuleSpec {
        name: name.to_string(),
        outbound: name.to_string(),
        site_rules: site_rules.iter().map(|s| s.to_string()).collect(),
        ip_rules: ip_rules.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    }
}

/// The full rule catalog, in catalog declaration order.
pub fn unified_rules() -> Vec<RuleSpec> {
    vec![
        category("Ad Block", &["category-ads-all"], &[]),
        category("AI Services", &["openai", "anthropic", "bing"], &[]),
        category("Bilibili", &["bilibili"], &[]),
        category("Youtube", &["youtube"], &[]),
        category("Google", &["google"], &["google"]),
        category("Private", &["private"], &["private"]),
        category("Location:CN", &["geolocation-cn"], &["cn"]),
        category("Telegram", &["telegram"], &["telegram"]),
        category("Github", &["github", "gitlab"], &[]),
        category("Microsoft", &["microsoft"], &[]),
        category("Apple", &["apple"], &[]),
        category(
            "Social Media",
            &["facebook", "instagram", "twitter"],
            &["facebook", "twitter"],
        ),
        category(
            "Streaming",
            &["netflix", "hulu", "disney", "primevideo"],
            &["netflix"],
        ),
        category("Gaming", &["category-games"], &[]),
        category("Education", &["coursera", "edx", "khanacademy"], &[]),
        category("Financial", &["paypal", "visa"], &[]),
        category(
            "Cloud Services",
            &["aws", "azure", "digitalocean", "dropbox"],
            &[],
        ),
        category("Non-China", &["geolocation-!cn"], &[]),
    ]
}

/// Look up a single catalog entry by category name.
pub fn lookup(name: &str) -> Option<RuleSpec> {
    unified_rules().into_iter().find(|rule| rule.name == name)
}

/// Predefined selection bundles.
pub fn predefined_selection(name: &str) -> Option<Vec<String>> {
    let minimal = ["Location:CN", "Private", "Non-China"];
    let balanced_extra = ["Github", "Google", "Youtube", "AI Services", "Telegram"];

    match name {
        "minimal" => Some(minimal.iter().map(|s| s.to_string()).collect()),
        "balanced" => Some(
            minimal
                .iter()
                .chain(balanced_extra.iter())
                .map(|s| s.to_string())
                .collect(),
        ),
        "comprehensive" => Some(unified_rules().into_iter().map(|r| r.name).collect()),
        _ => None,
    }
}

/// Expand a selection: a single predefined bundle name is replaced by its
/// categories, anything else passes through unchanged.
pub fn resolve_selection(selected: &[String]) -> Vec<String> {
    if selected.len() == 1
        && let Some(expanded) = predefined_selection(&selected[0])
    {
        return expanded;
    }
    selected.to_vec()
}

/// Expand the selected categories and custom rules into the ordered rule
/// list the engine compiles from.
///
/// Custom rules come first so user-defined matches take precedence over
/// catalog categories; each custom rule targets the group named after it.
/// Selected categories follow in selection order; names with no catalog
/// entry are silently dropped.
pub fn expand_rules(selected: &[String], custom: &[RuleSpec]) -> Vec<RuleSpec> {
    let mut rules: Vec<RuleSpec> = custom
        .iter()
        .map(|rule| {
            let mut rule = rule.clone();
            rule.outbound = rule.name.clone();
            rule
        })
        .collect();

    for name in resolve_selection(selected) {
        if let Some(rule) = lookup(&name) {
            rules.push(rule);
        }
    }

    rules
}

/// Collect the rule-set declarations referenced by the expanded rules,
/// partitioned into site-type and ip-type lists, deduplicated, in first-use
/// order. Empty-string placeholders are dropped.
pub fn collect_rule_sets(selected: &[String], custom: &[RuleSpec]) -> (Vec<RuleSet>, Vec<RuleSet>) {
    let rules = expand_rules(selected, custom);

    let mut site_refs: Vec<String> = Vec::new();
    let mut ip_refs: Vec<String> = Vec::new();
    for rule in &rules {
        for site in rule.site_rules.iter().filter(|s| !s.trim().is_empty()) {
            if !site_refs.contains(site) {
                site_refs.push(site.clone());
            }
        }
        for ip in rule.ip_rules.iter().filter(|s| !s.trim().is_empty()) {
            if !ip_refs.contains(ip) {
                ip_refs.push(ip.clone());
            }
        }
    }

    let site_sets = site_refs
        .into_iter()
        .map(|name| {
            RuleSet::Remote(
                RemoteRuleSet::new(
                    name.clone(),
                    format!("{}geosite-{}.srs", SITE_RULE_SET_BASE_URL, name),
                )
                .with_format(RuleSetFormat::Binary),
            )
        })
        .collect();

    let ip_sets = ip_refs
        .into_iter()
        .map(|name| {
            RuleSet::Remote(
                RemoteRuleSet::new(
                    format!("{}{}", name, IP_RULE_SET_SUFFIX),
                    format!("{}geoip-{}.srs", IP_RULE_SET_BASE_URL, name),
                )
                .with_format(RuleSetFormat::Binary),
            )
        })
        .collect();

    (site_sets, ip_sets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known_category() {
        let rule = lookup("Location:CN").unwrap();
        assert_eq!(rule.outbound, "Location:CN");
        assert_eq!(rule.site_rules, vec!["geolocation-cn"]);
        assert_eq!(rule.ip_rules, vec!["cn"]);
    }

    #[test]
    fn test_lookup_unknown_category() {
        assert!(lookup("Does Not Exist").is_none());
    }

    #[test]
    fn test_predefined_minimal() {
        let minimal = predefined_selection("minimal").unwrap();
        assert_eq!(minimal, vec!["Location:CN", "Private", "Non-China"]);
    }

    #[test]
    fn test_predefined_comprehensive_covers_catalog() {
        let comprehensive = predefined_selection("comprehensive").unwrap();
        assert_eq!(comprehensive.len(), unified_rules().len());
    }

    #[test]
    fn test_resolve_selection_expands_bundle_name() {
        let resolved = resolve_selection(&["minimal".to_string()]);
        assert_eq!(resolved.len(), 3);

        let passthrough = resolve_selection(&["Google".to_string(), "Telegram".to_string()]);
        assert_eq!(passthrough, vec!["Google", "Telegram"]);
    }

    #[test]
    fn test_expand_rules_custom_first_in_selection_order() {
        let custom = vec![RuleSpec {
            name: "My Rule".to_string(),
            domain_suffix: vec!["example.com".to_string()],
            ..Default::default()
        }];
        let selected = vec!["Telegram".to_string(), "Google".to_string()];
        let rules = expand_rules(&selected, &custom);

        assert_eq!(rules.len(), 3);
        assert_eq!(rules[0].name, "My Rule");
        assert_eq!(rules[0].outbound, "My Rule");
        assert_eq!(rules[1].name, "Telegram");
        assert_eq!(rules[2].name, "Google");
    }

    #[test]
    fn test_expand_rules_drops_unknown_names() {
        let rules = expand_rules(&["Nope".to_string(), "Google".to_string()], &[]);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].name, "Google");
    }

    #[test]
    fn test_collect_rule_sets_partitioned_and_deduplicated() {
        // Google and Telegram both declare site and ip references; selecting
        // Google twice must not duplicate its sets.
        let selected = vec![
            "Google".to_string(),
            "Telegram".to_string(),
            "Google".to_string(),
        ];
        let (site, ip) = collect_rule_sets(&selected, &[]);

        let site_tags: Vec<&str> = site.iter().map(|rs| rs.tag()).collect();
        let ip_tags: Vec<&str> = ip.iter().map(|rs| rs.tag()).collect();
        assert_eq!(site_tags, vec!["google", "telegram"]);
        assert_eq!(ip_tags, vec!["google-ip", "telegram-ip"]);
    }

    #[test]
    fn test_collect_rule_sets_urls() {
        let (site, ip) = collect_rule_sets(&["Google".to_string()], &[]);
        match &site[0] {
            RuleSet::Remote(rs) => {
                assert_eq!(
                    rs.url,
                    "https://raw.githubusercontent.com/SagerNet/sing-geosite/rule-set/geosite-google.srs"
                );
                assert_eq!(rs.format, Some(RuleSetFormat::Binary));
            }
            RuleSet::Local(_) => panic!("Expected remote rule set"),
        }
        match &ip[0] {
            RuleSet::Remote(rs) => {
                assert_eq!(
                    rs.url,
                    "https://raw.githubusercontent.com/SagerNet/sing-geoip/rule-set/geoip-google.srs"
                );
            }
            RuleSet::Local(_) => panic!("Expected remote rule set"),
        }
    }

    #[test]
    fn test_collect_rule_sets_skips_empty_placeholders() {
        let custom = vec![RuleSpec {
            name: "Odd".to_string(),
            site_rules: vec!["".to_string(), "openai".to_string()],
            ip_rules: vec!["  ".to_string()],
            ..Default::default()
        }];
        let (site, ip) = collect_rule_sets(&[], &custom);
        assert_eq!(site.len(), 1);
        assert_eq!(site[0].tag(), "openai");
        assert!(ip.is_empty());
    }
}
