//! Compatibility data shared by the converters.
//!
//! The tables cover the aliases that show up in real lists, not every
//! modifier each adblocker has ever shipped. All of them are `static` and
//! never mutated.

// =============================================================================
// Dialect Support
// =============================================================================

bitflags::bitflags! {
    /// Adblockers that understand a construct.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Dialects: u8 {
        const ADG = 1 << 0;
        const UBO = 1 << 1;
        const ABP = 1 << 2;

        const ALL = Self::ADG.bits() | Self::UBO.bits() | Self::ABP.bits();
    }
}

// =============================================================================
// Extended CSS
// =============================================================================

/// Pseudo-classes that only an extended CSS engine can evaluate.
pub const EXT_CSS_PSEUDO_CLASSES_STRICT: &[&str] = &[
    "contains",
    "if-not",
    "matches-attr",
    "matches-css",
    "matches-property",
    "nth-ancestor",
    "remove",
    "upward",
    "xpath",
    "has-text",
    "matches-css-after",
    "matches-css-before",
    "matches-path",
    "min-text-length",
    "watch-attr",
    "-abp-contains",
    "-abp-has",
    "-abp-properties",
];

/// Strict set plus pseudo-classes browsers are starting to support natively.
pub const EXT_CSS_PSEUDO_CLASSES: &[&str] = &["has", "is"];

/// Attribute prefix of the legacy extended CSS syntax (`[-ext-has="..."]`).
pub const LEGACY_EXT_CSS_ATTRIBUTE_PREFIX: &str = "[-ext-";

pub fn is_strict_ext_css_pseudo_class(name: &str) -> bool {
    EXT_CSS_PSEUDO_CLASSES_STRICT.contains(&name)
}

pub fn is_ext_css_pseudo_class(name: &str) -> bool {
    is_strict_ext_css_pseudo_class(name) || EXT_CSS_PSEUDO_CLASSES.contains(&name)
}

// =============================================================================
// Network Modifiers
// =============================================================================

/// The noop modifier is `_` but any run of underscores is accepted.
pub fn normalize_modifier_name(name: &str) -> &str {
    if !name.is_empty() && name.bytes().all(|b| b == b'_') {
        "_"
    } else {
        name
    }
}

/// Known modifier with its aliases.
#[derive(Debug, Clone, Copy)]
pub struct ModifierInfo {
    /// Canonical AdGuard name.
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub support: Dialects,
}

const ADG_UBO: Dialects = Dialects::ADG.union(Dialects::UBO);

pub static MODIFIERS: &[ModifierInfo] = &[
    ModifierInfo { name: "_", aliases: &[], support: ADG_UBO },
    ModifierInfo { name: "all", aliases: &[], support: ADG_UBO },
    ModifierInfo { name: "badfilter", aliases: &[], support: ADG_UBO },
    ModifierInfo { name: "csp", aliases: &[], support: Dialects::ALL },
    ModifierInfo { name: "denyallow", aliases: &[], support: ADG_UBO },
    ModifierInfo { name: "document", aliases: &["doc"], support: Dialects::ALL },
    ModifierInfo { name: "domain", aliases: &["from"], support: Dialects::ALL },
    ModifierInfo { name: "elemhide", aliases: &["ehide"], support: Dialects::ALL },
    ModifierInfo { name: "font", aliases: &[], support: Dialects::ALL },
    ModifierInfo { name: "generichide", aliases: &["ghide"], support: Dialects::ALL },
    ModifierInfo { name: "header", aliases: &[], support: ADG_UBO },
    ModifierInfo { name: "image", aliases: &[], support: Dialects::ALL },
    ModifierInfo { name: "important", aliases: &[], support: ADG_UBO },
    ModifierInfo { name: "match-case", aliases: &[], support: Dialects::ALL },
    ModifierInfo { name: "media", aliases: &[], support: Dialects::ALL },
    ModifierInfo { name: "method", aliases: &[], support: ADG_UBO },
    ModifierInfo { name: "object", aliases: &[], support: Dialects::ALL },
    ModifierInfo { name: "other", aliases: &[], support: Dialects::ALL },
    ModifierInfo { name: "permissions", aliases: &[], support: ADG_UBO },
    ModifierInfo { name: "ping", aliases: &[], support: Dialects::ALL },
    ModifierInfo { name: "popup", aliases: &[], support: Dialects::ALL },
    ModifierInfo { name: "redirect", aliases: &[], support: ADG_UBO },
    ModifierInfo { name: "redirect-rule", aliases: &[], support: ADG_UBO },
    ModifierInfo { name: "removeparam", aliases: &["queryprune"], support: ADG_UBO },
    ModifierInfo { name: "rewrite", aliases: &[], support: Dialects::ABP },
    ModifierInfo { name: "script", aliases: &[], support: Dialects::ALL },
    ModifierInfo { name: "specifichide", aliases: &["shide"], support: ADG_UBO },
    ModifierInfo { name: "stylesheet", aliases: &["css"], support: Dialects::ALL },
    ModifierInfo { name: "subdocument", aliases: &["frame"], support: Dialects::ALL },
    ModifierInfo { name: "third-party", aliases: &["3p"], support: Dialects::ALL },
    ModifierInfo { name: "to", aliases: &[], support: ADG_UBO },
    ModifierInfo { name: "websocket", aliases: &[], support: Dialects::ALL },
    ModifierInfo { name: "xmlhttprequest", aliases: &["xhr"], support: Dialects::ALL },
    // AdGuard only
    ModifierInfo { name: "app", aliases: &[], support: Dialects::ADG },
    ModifierInfo { name: "content", aliases: &[], support: Dialects::ADG },
    ModifierInfo { name: "cookie", aliases: &[], support: Dialects::ADG },
    ModifierInfo { name: "extension", aliases: &[], support: Dialects::ADG },
    ModifierInfo { name: "hls", aliases: &[], support: Dialects::ADG },
    ModifierInfo { name: "jsinject", aliases: &[], support: Dialects::ADG },
    ModifierInfo { name: "jsonprune", aliases: &[], support: Dialects::ADG },
    ModifierInfo { name: "network", aliases: &[], support: Dialects::ADG },
    ModifierInfo { name: "path", aliases: &[], support: Dialects::ADG },
    ModifierInfo { name: "referrerpolicy", aliases: &[], support: Dialects::ADG },
    ModifierInfo { name: "removeheader", aliases: &[], support: Dialects::ADG },
    ModifierInfo { name: "replace", aliases: &[], support: Dialects::ADG },
    ModifierInfo { name: "stealth", aliases: &[], support: Dialects::ADG },
    ModifierInfo { name: "urlblock", aliases: &[], support: Dialects::ADG },
    // uBlock Origin only
    ModifierInfo { name: "inline-font", aliases: &[], support: Dialects::UBO },
    ModifierInfo { name: "inline-script", aliases: &[], support: Dialects::UBO },
    ModifierInfo { name: "ipaddress", aliases: &[], support: Dialects::UBO },
    ModifierInfo { name: "strict1p", aliases: &[], support: Dialects::UBO },
    ModifierInfo { name: "strict3p", aliases: &[], support: Dialects::UBO },
    ModifierInfo { name: "uritransform", aliases: &[], support: Dialects::UBO },
    ModifierInfo { name: "urlskip", aliases: &[], support: Dialects::UBO },
];

/// Look up a modifier by canonical name or alias.
pub fn find_modifier(name: &str) -> Option<&'static ModifierInfo> {
    let name = normalize_modifier_name(name);
    MODIFIERS
        .iter()
        .find(|info| info.name == name || info.aliases.contains(&name))
}

/// uBO first-party aliases, which mean `~third-party`.
pub const FIRST_PARTY_ALIASES: &[&str] = &["1p", "first-party"];

// =============================================================================
// Redirect Resources
// =============================================================================

/// `(AdGuard name, uBlock Origin name)` pairs.
pub static REDIRECT_RESOURCES: &[(&str, &str)] = &[
    ("1x1-transparent.gif", "1x1.gif"),
    ("2x2-transparent.png", "2x2.png"),
    ("3x2-transparent.png", "3x2.png"),
    ("32x32-transparent.png", "32x32.png"),
    ("noopframe", "noop.html"),
    ("noopjs", "noop.js"),
    ("noopjson", "noop.json"),
    ("nooptext", "noop.txt"),
    ("noopmp3-0.1s", "noop-0.1s.mp3"),
    ("noopmp4-1s", "noop-1s.mp4"),
    ("noopvast-2.0", "noop-vast2.xml"),
    ("noopvast-3.0", "noop-vast3.xml"),
    ("noopvmap-1.0", "noop-vmap1.xml"),
    ("google-analytics", "google-analytics_analytics.js"),
    ("google-analytics-ga", "google-analytics_ga.js"),
    ("googlesyndication-adsbygoogle", "googlesyndication_adsbygoogle.js"),
    ("googletagservices-gpt", "googletagservices_gpt.js"),
    ("scorecardresearch-beacon", "scorecardresearch_beacon.js"),
    ("click2load.html", "click2load.html"),
];

pub fn redirect_to_adg(name: &str) -> Option<&'static str> {
    REDIRECT_RESOURCES
        .iter()
        .find(|(_, ubo)| *ubo == name)
        .map(|(adg, _)| *adg)
}

pub fn redirect_to_ubo(name: &str) -> Option<&'static str> {
    REDIRECT_RESOURCES
        .iter()
        .find(|(adg, _)| *adg == name)
        .map(|(_, ubo)| *ubo)
}

/// Modifiers whose value names a redirect resource.
pub const REDIRECT_MODIFIERS: &[&str] = &["redirect", "redirect-rule"];

// =============================================================================
// Scriptlets
// =============================================================================

/// Scriptlet known under different names per adblocker.
#[derive(Debug, Clone, Copy)]
pub struct ScriptletInfo {
    pub adg: &'static str,
    /// Canonical uBO name followed by its aliases.
    pub ubo: &'static [&'static str],
    pub abp: Option<&'static str>,
}

pub static SCRIPTLETS: &[ScriptletInfo] = &[
    ScriptletInfo {
        adg: "abort-on-property-read",
        ubo: &["abort-on-property-read.js", "aopr.js", "aopr"],
        abp: Some("abort-on-property-read"),
    },
    ScriptletInfo {
        adg: "abort-on-property-write",
        ubo: &["abort-on-property-write.js", "aopw.js", "aopw"],
        abp: Some("abort-on-property-write"),
    },
    ScriptletInfo {
        adg: "abort-current-inline-script",
        ubo: &["abort-current-script.js", "acs.js", "acs", "acis.js", "acis", "abort-current-inline-script.js"],
        abp: Some("abort-current-inline-script"),
    },
    ScriptletInfo {
        adg: "set-constant",
        ubo: &["set-constant.js", "set.js", "set"],
        abp: None,
    },
    ScriptletInfo {
        adg: "prevent-setTimeout",
        ubo: &["no-setTimeout-if.js", "nostif.js", "nostif", "prevent-setTimeout.js"],
        abp: None,
    },
    ScriptletInfo {
        adg: "prevent-setInterval",
        ubo: &["no-setInterval-if.js", "nosiif.js", "nosiif", "prevent-setInterval.js"],
        abp: None,
    },
    ScriptletInfo {
        adg: "prevent-addEventListener",
        ubo: &["addEventListener-defuser.js", "aeld.js", "aeld", "prevent-addEventListener.js"],
        abp: None,
    },
    ScriptletInfo {
        adg: "remove-attr",
        ubo: &["remove-attr.js", "ra.js", "ra"],
        abp: None,
    },
    ScriptletInfo {
        adg: "remove-class",
        ubo: &["remove-class.js", "rc.js", "rc"],
        abp: None,
    },
    ScriptletInfo {
        adg: "json-prune",
        ubo: &["json-prune.js"],
        abp: Some("json-prune"),
    },
    ScriptletInfo {
        adg: "prevent-fetch",
        ubo: &["no-fetch-if.js", "prevent-fetch.js"],
        abp: None,
    },
    ScriptletInfo {
        adg: "prevent-xhr",
        ubo: &["no-xhr-if.js", "prevent-xhr.js"],
        abp: None,
    },
    ScriptletInfo {
        adg: "set-cookie",
        ubo: &["set-cookie.js"],
        abp: None,
    },
];

pub const ADG_UBO_SCRIPTLET_PREFIX: &str = "ubo-";
pub const ADG_ABP_SCRIPTLET_PREFIX: &str = "abp-";

pub fn scriptlet_by_adg_name(name: &str) -> Option<&'static ScriptletInfo> {
    SCRIPTLETS.iter().find(|info| info.adg == name)
}

pub fn scriptlet_by_abp_name(name: &str) -> Option<&'static ScriptletInfo> {
    SCRIPTLETS.iter().find(|info| info.abp == Some(name))
}

/// Canonical uBO name for a uBO name or alias.
pub fn canonical_ubo_scriptlet(name: &str) -> Option<&'static str> {
    let with_js;
    let name = if name.ends_with(".js") {
        name
    } else {
        with_js = format!("{name}.js");
        with_js.as_str()
    };
    SCRIPTLETS
        .iter()
        .find(|info| info.ubo.contains(&name))
        .and_then(|info| info.ubo.first().copied())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_noop_runs() {
        assert_eq!(normalize_modifier_name("____"), "_");
        assert_eq!(normalize_modifier_name("_"), "_");
        assert_eq!(normalize_modifier_name("_a"), "_a");
        assert!(find_modifier("___").is_some());
    }

    #[test]
    fn finds_modifiers_by_alias() {
        let info = find_modifier("xhr").expect("xhr alias");
        assert_eq!(info.name, "xmlhttprequest");
        assert!(info.support.contains(Dialects::UBO));
        assert!(!find_modifier("removeheader").expect("known").support.contains(Dialects::UBO));
    }

    #[test]
    fn maps_redirect_names_both_ways() {
        assert_eq!(redirect_to_adg("noop.js"), Some("noopjs"));
        assert_eq!(redirect_to_ubo("noopjs"), Some("noop.js"));
        assert_eq!(redirect_to_ubo("unknown"), None);
    }

    #[test]
    fn resolves_ubo_scriptlet_aliases() {
        assert_eq!(canonical_ubo_scriptlet("set"), Some("set-constant.js"));
        assert_eq!(canonical_ubo_scriptlet("aopr.js"), Some("abort-on-property-read.js"));
        assert_eq!(canonical_ubo_scriptlet("nope"), None);
    }

    #[test]
    fn classifies_extended_pseudo_classes() {
        assert!(is_strict_ext_css_pseudo_class("has-text"));
        assert!(!is_strict_ext_css_pseudo_class("has"));
        assert!(is_ext_css_pseudo_class("has"));
    }
}
