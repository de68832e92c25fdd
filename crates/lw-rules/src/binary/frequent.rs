//! Frequent-value tables.
//!
//! A string found in the table for its field is written as a one-byte index
//! instead of inline bytes. The tables are part of the schema: entries may
//! only be appended, and any change requires a schema version bump.
//! Lookups are exact, so decoding always restores the original string.

pub const AGENTS: &[&str] = &[
    "AdGuard",
    "ADG",
    "uBlock Origin",
    "uBlock",
    "uBO",
    "Adblock Plus",
    "AdblockPlus",
    "ABP",
    "AdBlock",
];

pub const HINTS: &[&str] = &["NOT_OPTIMIZED", "PLATFORM", "NOT_PLATFORM"];

pub const PLATFORMS: &[&str] = &[
    "windows",
    "mac",
    "android",
    "ios",
    "ext_chromium",
    "ext_ff",
    "ext_edge",
    "ext_opera",
    "ext_safari",
    "ext_android_cb",
    "ext_ublock",
];

pub const METADATA_HEADERS: &[&str] = &[
    "Checksum",
    "Description",
    "Expires",
    "Homepage",
    "Last Modified",
    "LastModified",
    "Licence",
    "License",
    "Time Updated",
    "TimeUpdated",
    "Title",
    "Version",
];

pub const PREPROCESSOR_DIRECTIVES: &[&str] = &["if", "else", "endif", "include", "safari_cb_affinity"];

pub const PREPROCESSOR_VARIABLES: &[&str] = &[
    "adguard",
    "adguard_app_windows",
    "adguard_app_mac",
    "adguard_app_android",
    "adguard_app_ios",
    "adguard_ext_safari",
    "adguard_ext_android_cb",
    "adguard_ext_chromium",
    "adguard_ext_firefox",
    "adguard_ext_edge",
    "adguard_ext_opera",
    "ext_abp",
    "ext_ublock",
    "env_chromium",
    "env_edge",
    "env_firefox",
    "env_mobile",
    "env_safari",
    "cap_html_filtering",
    "cap_user_stylesheet",
    "false",
];

pub const CONFIG_COMMANDS: &[&str] = &[
    "aglint",
    "aglint-disable",
    "aglint-enable",
    "aglint-disable-next-line",
    "aglint-enable-next-line",
];

pub const MODIFIERS: &[&str] = &[
    "important",
    "third-party",
    "3p",
    "first-party",
    "1p",
    "script",
    "image",
    "stylesheet",
    "css",
    "subdocument",
    "frame",
    "xmlhttprequest",
    "xhr",
    "websocket",
    "font",
    "media",
    "object",
    "ping",
    "other",
    "popup",
    "document",
    "doc",
    "domain",
    "from",
    "to",
    "denyallow",
    "redirect",
    "redirect-rule",
    "removeparam",
    "removeheader",
    "csp",
    "permissions",
    "header",
    "method",
    "cookie",
    "replace",
    "jsonprune",
    "hls",
    "generichide",
    "ghide",
    "elemhide",
    "ehide",
    "specifichide",
    "shide",
    "genericblock",
    "badfilter",
    "match-case",
    "all",
    "app",
    "network",
    "content",
    "extension",
    "jsinject",
    "urlblock",
    "stealth",
    "empty",
    "mp4",
    "path",
    "url",
    "matches-path",
];

pub const REDIRECTS: &[&str] = &[
    "noopjs",
    "noop.js",
    "noopframe",
    "noop.html",
    "nooptext",
    "noop.txt",
    "noopcss",
    "noop.css",
    "1x1-transparent.gif",
    "1x1.gif",
    "2x2-transparent.png",
    "2x2.png",
    "3x2-transparent.png",
    "3x2.png",
    "32x32-transparent.png",
    "32x32.png",
    "noopmp3-0.1s",
    "noop-0.1s.mp3",
    "noopmp4-1s",
    "noop-1s.mp4",
    "noopvast-2.0",
    "noop-vast2.xml",
    "noopvast-3.0",
    "noop-vast3.xml",
    "googletagservices-gpt",
    "googletagservices_gpt.js",
    "google-analytics",
    "google-analytics_analytics.js",
    "googlesyndication-adsbygoogle",
    "googlesyndication_adsbygoogle.js",
    "prevent-bab",
    "nobab.js",
    "click2load.html",
];

/// Index of `value` in `table`.
pub fn lookup(table: &[&str], value: &str) -> Option<u8> {
    table
        .iter()
        .position(|entry| *entry == value)
        .and_then(|index| u8::try_from(index).ok())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    const TABLES: &[&[&str]] = &[
        AGENTS,
        HINTS,
        PLATFORMS,
        METADATA_HEADERS,
        PREPROCESSOR_DIRECTIVES,
        PREPROCESSOR_VARIABLES,
        CONFIG_COMMANDS,
        MODIFIERS,
        REDIRECTS,
    ];

    #[test]
    fn tables_fit_one_byte_and_have_unique_entries() {
        for table in TABLES {
            assert!(table.len() <= u8::MAX as usize);
            let unique: HashSet<&str> = table.iter().copied().collect();
            assert_eq!(unique.len(), table.len());
        }
    }

    #[test]
    fn lookup_is_exact() {
        assert_eq!(lookup(AGENTS, "AdGuard"), Some(0));
        assert_eq!(lookup(AGENTS, "adguard"), None);
        assert_eq!(lookup(MODIFIERS, "third-party"), Some(1));
    }
}
