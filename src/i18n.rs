//! Localized display names for generated outbound groups.
//!
//! Group tags are addressed by stable keys of the form
//! `outboundNames.<name>`; the resolver maps a key to the display string for
//! the active locale. When no translation exists the key's trailing segment
//! is returned verbatim, so unknown categories and user-named custom rules
//! pass through unchanged.
//!
//! The resolver is an injected capability ([`Localize`]) rather than a global
//! registry, so tests can supply a deterministic stub.

use std::str::FromStr;

use anyhow::bail;

/// Key prefix under which group display names are resolved.
pub const OUTBOUND_NAMES_PREFIX: &str = "outboundNames.";

/// Lookup capability from a stable group key to a display string.
pub trait Localize {
    /// Resolve a full key (e.g. `outboundNames.Node Select`) to its display
    /// string, falling back to the key's literal trailing segment.
    fn localize(&self, key: &str) -> String;

    /// Resolve a group name through the `outboundNames.` namespace.
    fn outbound_name(&self, name: &str) -> String {
        self.localize(&format!("{}{}", OUTBOUND_NAMES_PREFIX, name))
    }
}

/// Supported display locales.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Lang {
    #[default]
    En,
    Zh,
}

impl FromStr for Lang {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "en" | "en-us" => Ok(Lang::En),
            "zh" | "zh-cn" => Ok(Lang::Zh),
            other => bail!("Unsupported language: {}", other),
        }
    }
}

/// Built-in translation tables.
#[derive(Clone, Copy, Debug, Default)]
pub struct Translations {
    lang: Lang,
}

impl Translations {
    /// Create a resolver for the given locale.
    pub fn new(lang: Lang) -> Self {
        Self { lang }
    }
}

impl Localize for Translations {
    fn localize(&self, key: &str) -> String {
        let name = key.strip_prefix(OUTBOUND_NAMES_PREFIX).unwrap_or(key);
        match self.lang {
            Lang::En => name.to_string(),
            Lang::Zh => zh_outbound_name(name).unwrap_or(name).to_string(),
        }
    }
}

fn zh_outbound_name(name: &str) -> Option<&'static str> {
    let translated = match name {
        "Node Select" => "节点选择",
        "Auto Select" => "自动选择",
        "Fall Back" => "漏网之鱼",
        "Ad Block" => "广告拦截",
        "AI Services" => "AI 服务",
        "Bilibili" => "哔哩哔哩",
        "Youtube" => "油管视频",
        "Google" => "谷歌服务",
        "Private" => "私有网络",
        "Location:CN" => "国内服务",
        "Telegram" => "电报消息",
        "Github" => "Github",
        "Microsoft" => "微软服务",
        "Apple" => "苹果服务",
        "Social Media" => "社交媒体",
        "Streaming" => "流媒体",
        "Gaming" => "游戏平台",
        "Education" => "教育资源",
        "Financial" => "金融服务",
        "Cloud Services" => "云服务",
        "Non-China" => "非中国",
        _ => return None,
    };
    Some(translated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_is_identity() {
        let t = Translations::new(Lang::En);
        assert_eq!(t.outbound_name("Node Select"), "Node Select");
        assert_eq!(t.outbound_name("Ad Block"), "Ad Block");
    }

    #[test]
    fn test_chinese_translations() {
        let t = Translations::new(Lang::Zh);
        assert_eq!(t.outbound_name("Node Select"), "节点选择");
        assert_eq!(t.outbound_name("Fall Back"), "漏网之鱼");
        assert_eq!(t.outbound_name("Location:CN"), "国内服务");
    }

    #[test]
    fn test_unknown_key_falls_back_to_literal() {
        let t = Translations::new(Lang::Zh);
        assert_eq!(t.outbound_name("My Custom Rule"), "My Custom Rule");
        assert_eq!(t.localize("no prefix at all"), "no prefix at all");
    }

    #[test]
    fn test_lang_from_str() {
        assert_eq!(Lang::from_str("en").unwrap(), Lang::En);
        assert_eq!(Lang::from_str("zh-CN").unwrap(), Lang::Zh);
        assert!(Lang::from_str("fr").is_err());
    }
}
