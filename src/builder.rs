//! Configuration assembly engine.
//!
//! [`ConfigBuilder`] takes parsed proxy descriptors, a set of selected rule
//! categories, and user-defined custom rules, and produces a finished
//! sing-box document: deduplicated outbounds, generated
//! node-select/auto-select/category/fallback groups, and compiled routing
//! rules in evaluation order.
//!
//! A builder owns its document (cloned from the skeleton at construction),
//! so concurrent builds never share state. The build itself is a plain
//! sequential computation with no fatal error paths: duplicate descriptors
//! are skipped, tag collisions are renamed, and empty candidate lists
//! degrade to the built-in `DIRECT`/`REJECT` targets.

use tracing::{debug, info};

use crate::catalog::{self, IP_RULE_SET_SUFFIX, RuleSpec};
use crate::config::SingBoxConfig;
use crate::config::outbound::{Outbound, SelectorOutbound, UrlTestOutbound};
use crate::config::route::{Route, RouteRule, RuleAction};
use crate::i18n::Localize;
use crate::template::{self, DIRECT_TAG, REJECT_TAG};

/// Group key of the manual node selector.
pub const NODE_SELECT_KEY: &str = "Node Select";

/// Group key of the latency-based automatic selector.
pub const AUTO_SELECT_KEY: &str = "Auto Select";

/// Group key of the final catch-all selector.
pub const FALLBACK_KEY: &str = "Fall Back";

// ============================================================================
// Merge & Deduplication
// ============================================================================

/// Decision for inserting a candidate outbound into an existing list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MergeOutcome {
    /// An outbound with identical non-tag fields already exists.
    Skip,
    /// No collision; insert under the candidate's own tag.
    Insert,
    /// The tag is taken by a different outbound; insert under this tag.
    InsertRenamed(String),
}

/// Decide how a candidate merges into the existing outbound list.
///
/// Payload identity ("all fields except tag are equal") is checked against
/// every existing outbound regardless of tag spelling. Tag collisions count
/// existing tags equal to the candidate tag or to the candidate tag plus a
/// numeric suffix, so repeated collisions yield `tag`, `tag 2`, `tag 3`, …
/// in submission order.
pub fn resolve(existing: &[Outbound], candidate: &Outbound) -> MergeOutcome {
    if existing.iter().any(|o| o.payload_eq(candidate)) {
        return MergeOutcome::Skip;
    }

    let Some(tag) = candidate.tag() else {
        return MergeOutcome::Insert;
    };

    let collisions = existing
        .iter()
        .filter_map(Outbound::tag)
        .filter(|existing_tag| tag_collides(existing_tag, tag))
        .count();

    if collisions > 0 {
        MergeOutcome::InsertRenamed(format!("{} {}", tag, collisions + 1))
    } else {
        MergeOutcome::Insert
    }
}

fn tag_collides(existing: &str, base: &str) -> bool {
    existing == base
        || existing
            .strip_prefix(base)
            .and_then(|rest| rest.strip_prefix(' '))
            .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
}

// ============================================================================
// Builder
// ============================================================================

/// Assembles one sing-box configuration document.
pub struct ConfigBuilder {
    config: SingBoxConfig,
    selected: Vec<String>,
    custom: Vec<RuleSpec>,
    translator: Box<dyn Localize>,
}

impl ConfigBuilder {
    /// Create a builder over a fresh base skeleton.
    pub fn new(
        selected: Vec<String>,
        custom: Vec<RuleSpec>,
        translator: Box<dyn Localize>,
    ) -> Self {
        Self::with_base(template::base_config(), selected, custom, translator)
    }

    /// Create a builder over a caller-supplied skeleton.
    ///
    /// The skeleton is consumed: callers running multiple builds must hand
    /// each builder its own clone.
    pub fn with_base(
        base: SingBoxConfig,
        selected: Vec<String>,
        custom: Vec<RuleSpec>,
        translator: Box<dyn Localize>,
    ) -> Self {
        Self {
            config: base,
            selected,
            custom,
            translator,
        }
    }

    /// Merge one proxy descriptor into the document.
    pub fn add_proxy(&mut self, mut outbound: Outbound) {
        match resolve(&self.config.outbounds, &outbound) {
            MergeOutcome::Skip => {
                debug!(
                    "Skipping duplicate outbound '{}'",
                    outbound.tag().unwrap_or("<no tag>")
                );
            }
            MergeOutcome::Insert => {
                debug!("Adding outbound '{}'", outbound.tag().unwrap_or("<no tag>"));
                self.config.outbounds.push(outbound);
            }
            MergeOutcome::InsertRenamed(tag) => {
                debug!(
                    "Renaming outbound '{}' -> '{}'",
                    outbound.tag().unwrap_or("<no tag>"),
                    tag
                );
                outbound.set_tag(tag);
                self.config.outbounds.push(outbound);
            }
        }
    }

    /// Merge a sequence of proxy descriptors in order.
    pub fn add_proxies(&mut self, outbounds: impl IntoIterator<Item = Outbound>) {
        for outbound in outbounds {
            self.add_proxy(outbound);
        }
    }

    /// Run the remaining build sequence and return the finished document.
    pub fn build(mut self) -> SingBoxConfig {
        let proxy_tags = self.proxy_tags();
        info!(
            "Assembling config: {} proxies, {} selected categories, {} custom rules",
            proxy_tags.len(),
            self.selected.len(),
            self.custom.len()
        );

        self.add_auto_select_group(&proxy_tags);
        self.add_node_select_group(&proxy_tags);
        self.add_category_groups(&proxy_tags);
        self.add_custom_rule_groups(&proxy_tags);
        self.add_fallback_group(&proxy_tags);
        self.compile_rules();
        self.finalize();

        info!(
            "Config assembled: {} outbounds, {} route rules",
            self.config.outbounds.len(),
            self.config.route.as_ref().map_or(0, |r| r.rules.len())
        );
        self.config
    }

    /// Tags of all merged proxy outbounds, in insertion order.
    fn proxy_tags(&self) -> Vec<String> {
        self.config
            .outbounds
            .iter()
            .filter(|o| o.is_proxy())
            .filter_map(|o| o.tag().map(str::to_string))
            .collect()
    }

    /// Candidate list shared by category, custom-rule, and fallback
    /// selectors: node-select plus all proxies, or the built-in targets when
    /// no proxies exist.
    fn selector_candidates(&self, proxy_tags: &[String]) -> Vec<String> {
        if proxy_tags.is_empty() {
            vec![DIRECT_TAG.to_string(), REJECT_TAG.to_string()]
        } else {
            let mut candidates = vec![self.translator.outbound_name(NODE_SELECT_KEY)];
            candidates.extend(proxy_tags.iter().cloned());
            candidates
        }
    }

    fn add_auto_select_group(&mut self, proxy_tags: &[String]) {
        let tag = self.translator.outbound_name(AUTO_SELECT_KEY);
        // Never an empty candidate list.
        let candidates = if proxy_tags.is_empty() {
            vec![DIRECT_TAG.to_string()]
        } else {
            proxy_tags.to_vec()
        };
        self.config
            .outbounds
            .insert(0, Outbound::UrlTest(UrlTestOutbound::new(tag, candidates)));
    }

    fn add_node_select_group(&mut self, proxy_tags: &[String]) {
        let tag = self.translator.outbound_name(NODE_SELECT_KEY);
        let candidates = if proxy_tags.is_empty() {
            vec![DIRECT_TAG.to_string(), REJECT_TAG.to_string()]
        } else {
            let mut candidates = vec![
                DIRECT_TAG.to_string(),
                REJECT_TAG.to_string(),
                self.translator.outbound_name(AUTO_SELECT_KEY),
            ];
            candidates.extend(proxy_tags.iter().cloned());
            candidates
        };
        self.config
            .outbounds
            .insert(0, Outbound::Selector(SelectorOutbound::new(tag, candidates)));
    }

    fn add_category_groups(&mut self, proxy_tags: &[String]) {
        let mut seen: Vec<String> = Vec::new();
        for name in catalog::resolve_selection(&self.selected) {
            let Some(rule) = catalog::lookup(&name) else {
                continue;
            };
            // A category targeting the node selector itself would be a
            // self-referential group.
            if rule.outbound == NODE_SELECT_KEY || seen.contains(&rule.outbound) {
                continue;
            }
            seen.push(rule.outbound.clone());

            let tag = self.translator.outbound_name(&rule.outbound);
            let candidates = self.selector_candidates(proxy_tags);
            debug!("Adding category selector '{}'", tag);
            self.config
                .outbounds
                .push(Outbound::Selector(SelectorOutbound::new(tag, candidates)));
        }
    }

    fn add_custom_rule_groups(&mut self, proxy_tags: &[String]) {
        let names: Vec<String> = self.custom.iter().map(|rule| rule.name.clone()).collect();
        for name in names {
            let candidates = self.selector_candidates(proxy_tags);
            debug!("Adding custom rule selector '{}'", name);
            self.config
                .outbounds
                .push(Outbound::Selector(SelectorOutbound::new(name, candidates)));
        }
    }

    fn add_fallback_group(&mut self, proxy_tags: &[String]) {
        let tag = self.translator.outbound_name(FALLBACK_KEY);
        let candidates = self.selector_candidates(proxy_tags);
        self.config
            .outbounds
            .push(Outbound::Selector(SelectorOutbound::new(tag, candidates)));
    }

    /// Compile the selected categories and custom rules into the route
    /// block: rule-set declarations plus the ordered rule list.
    fn compile_rules(&mut self) {
        let rules = catalog::expand_rules(&self.selected, &self.custom);
        let (site_sets, ip_sets) = catalog::collect_rule_sets(&self.selected, &self.custom);

        let mut compiled: Vec<RouteRule> = Vec::new();
        for rule in &rules {
            let target = self.translator.outbound_name(&rule.outbound);

            if !rule.domain_suffix.is_empty() || !rule.domain_keyword.is_empty() {
                compiled.push(
                    RouteRule::new()
                        .match_domain_suffix(rule.domain_suffix.clone())
                        .match_domain_keyword(rule.domain_keyword.clone())
                        .match_protocol(rule.protocol.clone())
                        .with_outbound(target.clone()),
                );
            }

            let site_refs: Vec<String> = rule
                .site_rules
                .iter()
                .filter(|s| !s.trim().is_empty())
                .cloned()
                .collect();
            if !site_refs.is_empty() {
                compiled.push(
                    RouteRule::new()
                        .match_rule_set(site_refs)
                        .match_protocol(rule.protocol.clone())
                        .with_outbound(target.clone()),
                );
            }

            let ip_refs: Vec<String> = rule
                .ip_rules
                .iter()
                .filter(|s| !s.trim().is_empty())
                .map(|s| format!("{}{}", s, IP_RULE_SET_SUFFIX))
                .collect();
            if !ip_refs.is_empty() {
                compiled.push(
                    RouteRule::new()
                        .match_rule_set(ip_refs)
                        .match_protocol(rule.protocol.clone())
                        .with_outbound(target.clone()),
                );
            }

            if !rule.ip_cidr.is_empty() {
                compiled.push(
                    RouteRule::new()
                        .match_ip_cidr(rule.ip_cidr.clone())
                        .match_protocol(rule.protocol.clone())
                        .with_outbound(target),
                );
            }
        }
        debug!("Compiled {} content rules", compiled.len());

        // Clash-mode shortcuts, sniffing, and DNS hijack always evaluate
        // before content rules, regardless of category order.
        let node_select = self.translator.outbound_name(NODE_SELECT_KEY);
        let fixed = vec![
            RouteRule::new()
                .match_clash_mode("direct")
                .with_outbound(DIRECT_TAG),
            RouteRule::new()
                .match_clash_mode("global")
                .with_outbound(node_select),
            RouteRule::new().with_action(RuleAction::Sniff),
            RouteRule::new()
                .match_protocol(vec!["dns".to_string()])
                .with_action(RuleAction::HijackDns),
        ];

        let route = self.config.route.get_or_insert_with(Route::new);
        route.rule_set = site_sets.into_iter().chain(ip_sets).collect();

        let existing = std::mem::take(&mut route.rules);
        route.rules = fixed;
        route.rules.extend(existing);
        route.rules.extend(compiled);
    }

    /// Wire up the cross-references created by the earlier steps: the
    /// default route target and the DNS detour. Must run last.
    fn finalize(&mut self) {
        let fallback = self.translator.outbound_name(FALLBACK_KEY);
        let node_select = self.translator.outbound_name(NODE_SELECT_KEY);

        let route = self.config.route.get_or_insert_with(Route::new);
        route.auto_detect_interface = true;
        route.final_outbound = Some(fallback);

        if let Some(dns) = self.config.dns.as_mut()
            && let Some(primary) = dns.servers.first_mut()
        {
            primary.detour = Some(node_select);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::outbound::TrojanOutbound;
    use crate::i18n::{Lang, Translations};

    fn trojan(tag: &str, server: &str, port: u16) -> Outbound {
        Outbound::Trojan(TrojanOutbound::new(tag, server, port, "pw"))
    }

    fn builder(selected: &[&str]) -> ConfigBuilder {
        ConfigBuilder::new(
            selected.iter().map(|s| s.to_string()).collect(),
            Vec::new(),
            Box::new(Translations::new(Lang::En)),
        )
    }

    // ------------------------------------------------------------------------
    // resolve()
    // ------------------------------------------------------------------------

    #[test]
    fn test_resolve_inserts_new_outbound() {
        let existing = vec![trojan("a", "a.example.com", 443)];
        let candidate = trojan("b", "b.example.com", 443);
        assert_eq!(resolve(&existing, &candidate), MergeOutcome::Insert);
    }

    #[test]
    fn test_resolve_skips_identical_payload_any_tag() {
        let existing = vec![trojan("original", "a.example.com", 443)];
        let candidate = trojan("совершенно другой тег", "a.example.com", 443);
        assert_eq!(resolve(&existing, &candidate), MergeOutcome::Skip);
    }

    #[test]
    fn test_resolve_renames_on_tag_collision() {
        let existing = vec![trojan("node", "a.example.com", 443)];
        let candidate = trojan("node", "b.example.com", 443);
        assert_eq!(
            resolve(&existing, &candidate),
            MergeOutcome::InsertRenamed("node 2".to_string())
        );
    }

    #[test]
    fn test_resolve_suffixes_are_monotonic() {
        let existing = vec![
            trojan("node", "a.example.com", 443),
            trojan("node 2", "b.example.com", 443),
        ];
        let candidate = trojan("node", "c.example.com", 443);
        assert_eq!(
            resolve(&existing, &candidate),
            MergeOutcome::InsertRenamed("node 3".to_string())
        );
    }

    #[test]
    fn test_resolve_ignores_unrelated_prefix_tags() {
        // "node east" shares the prefix but is not a rename of "node".
        let existing = vec![trojan("node east", "a.example.com", 443)];
        let candidate = trojan("node", "b.example.com", 443);
        assert_eq!(resolve(&existing, &candidate), MergeOutcome::Insert);
    }

    // ------------------------------------------------------------------------
    // Builder
    // ------------------------------------------------------------------------

    #[test]
    fn test_add_proxy_is_idempotent() {
        let mut b = builder(&[]);
        let before = b.config.outbounds.len();
        for _ in 0..5 {
            b.add_proxy(trojan("node", "a.example.com", 443));
        }
        assert_eq!(b.config.outbounds.len(), before + 1);
    }

    #[test]
    fn test_add_proxy_renames_in_submission_order() {
        let mut b = builder(&[]);
        b.add_proxy(trojan("node", "a.example.com", 443));
        b.add_proxy(trojan("node", "b.example.com", 443));
        b.add_proxy(trojan("node", "c.example.com", 443));

        let tags = b.proxy_tags();
        assert_eq!(tags, vec!["node", "node 2", "node 3"]);
    }

    #[test]
    fn test_build_group_order_at_front() {
        let mut b = builder(&[]);
        b.add_proxy(trojan("p1", "a.example.com", 443));
        let config = b.build();

        assert_eq!(config.outbounds[0].tag(), Some("Node Select"));
        assert_eq!(config.outbounds[1].tag(), Some("Auto Select"));
    }

    #[test]
    fn test_node_select_candidates_order() {
        let mut b = builder(&[]);
        b.add_proxy(trojan("p1", "a.example.com", 443));
        b.add_proxy(trojan("p2", "b.example.com", 443));
        let config = b.build();

        match &config.outbounds[0] {
            Outbound::Selector(s) => {
                assert_eq!(
                    s.outbounds,
                    vec!["DIRECT", "REJECT", "Auto Select", "p1", "p2"]
                );
            }
            _ => panic!("Expected node-select selector first"),
        }
    }

    #[test]
    fn test_empty_proxy_list_degrades_groups() {
        let config = builder(&["minimal"]).build();

        for outbound in &config.outbounds {
            match outbound {
                Outbound::Selector(s) => {
                    assert_eq!(s.outbounds, vec!["DIRECT", "REJECT"]);
                }
                Outbound::UrlTest(u) => {
                    assert_eq!(u.outbounds, vec!["DIRECT"]);
                }
                _ => {}
            }
        }
    }

    #[test]
    fn test_fixed_rules_present_for_empty_selection() {
        let config = builder(&[]).build();
        let rules = &config.route.unwrap().rules;

        assert_eq!(rules.len(), 4);
        assert_eq!(rules[0].clash_mode.as_deref(), Some("direct"));
        assert_eq!(rules[0].outbound.as_deref(), Some("DIRECT"));
        assert_eq!(rules[1].clash_mode.as_deref(), Some("global"));
        assert_eq!(rules[1].outbound.as_deref(), Some("Node Select"));
        assert_eq!(rules[2].action, Some(RuleAction::Sniff));
        assert_eq!(rules[3].action, Some(RuleAction::HijackDns));
        assert_eq!(rules[3].protocol, vec!["dns"]);
    }

    #[test]
    fn test_finalize_sets_dns_detour_and_final() {
        let config = builder(&["minimal"]).build();

        let route = config.route.as_ref().unwrap();
        assert!(route.auto_detect_interface);
        assert_eq!(route.final_outbound.as_deref(), Some("Fall Back"));

        let dns = config.dns.as_ref().unwrap();
        assert_eq!(dns.servers[0].detour.as_deref(), Some("Node Select"));
    }

    #[test]
    fn test_category_selector_skips_duplicates() {
        let mut b = builder(&["Google", "Google"]);
        b.add_proxy(trojan("p1", "a.example.com", 443));
        let config = b.build();

        let count = config
            .outbounds
            .iter()
            .filter(|o| o.tag() == Some("Google"))
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_custom_rule_group_uses_raw_name() {
        let custom = vec![RuleSpec {
            name: "My Streaming".to_string(),
            domain_suffix: vec!["example.org".to_string()],
            ..Default::default()
        }];
        let mut b = ConfigBuilder::new(
            Vec::new(),
            custom,
            Box::new(Translations::new(Lang::Zh)),
        );
        b.add_proxy(trojan("p1", "a.example.com", 443));
        let config = b.build();

        // Custom group names bypass localization entirely.
        assert!(config.outbound("My Streaming").is_some());
    }

    #[test]
    fn test_localized_build_references_are_consistent() {
        let mut b = ConfigBuilder::new(
            vec!["minimal".to_string()],
            Vec::new(),
            Box::new(Translations::new(Lang::Zh)),
        );
        b.add_proxy(trojan("p1", "a.example.com", 443));
        let config = b.build();

        assert_eq!(config.outbounds[0].tag(), Some("节点选择"));
        let route = config.route.as_ref().unwrap();
        assert_eq!(route.rules[1].outbound.as_deref(), Some("节点选择"));
        assert_eq!(route.final_outbound.as_deref(), Some("漏网之鱼"));
        assert_eq!(
            config.dns.as_ref().unwrap().servers[0].detour.as_deref(),
            Some("节点选择")
        );
    }
}
