//! Closed enumerations describing rule syntax.
//!
//! The numeric values of the `#[repr(u8)]` enums are part of the binary
//! schema and must not be reordered.

use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// Dialects
// =============================================================================

/// Adblocker dialect a rule is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum AdblockSyntax {
    /// Understood by every adblocker
    #[default]
    Common = 0,
    /// Adblock Plus
    Abp = 1,
    /// AdGuard
    Adg = 2,
    /// uBlock Origin
    Ubo = 3,
}

impl TryFrom<u8> for AdblockSyntax {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Common),
            1 => Ok(Self::Abp),
            2 => Ok(Self::Adg),
            3 => Ok(Self::Ubo),
            _ => Err(()),
        }
    }
}

impl fmt::Display for AdblockSyntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Common => "Common",
            Self::Abp => "AdblockPlus",
            Self::Adg => "AdGuard",
            Self::Ubo => "uBlockOrigin",
        };
        f.write_str(name)
    }
}

/// Detect the dialect from an agent name such as `AdGuard` or `uBlock Origin`.
pub fn syntax_from_agent_name(name: &str) -> AdblockSyntax {
    match name.trim().to_ascii_lowercase().as_str() {
        "adguard" | "adg" => AdblockSyntax::Adg,
        "ublock" | "ublock origin" | "ubo" => AdblockSyntax::Ubo,
        "adblock" | "adblock plus" | "adblockplus" | "abp" => AdblockSyntax::Abp,
        _ => AdblockSyntax::Common,
    }
}

// =============================================================================
// Categories & Types
// =============================================================================

/// Top-level rule category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleCategory {
    Empty,
    Invalid,
    Comment,
    Cosmetic,
    Network,
}

/// Concrete rule type. Each type belongs to exactly one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleType {
    EmptyRule,
    InvalidRule,
    AgentCommentRule,
    HintCommentRule,
    PreProcessorCommentRule,
    MetadataCommentRule,
    ConfigCommentRule,
    CommentRule,
    ElementHidingRule,
    CssInjectionRule,
    ScriptletInjectionRule,
    HtmlFilteringRule,
    JsInjectionRule,
    NetworkRule,
    HostRule,
}

impl RuleType {
    pub fn category(self) -> RuleCategory {
        match self {
            Self::EmptyRule => RuleCategory::Empty,
            Self::InvalidRule => RuleCategory::Invalid,
            Self::AgentCommentRule
            | Self::HintCommentRule
            | Self::PreProcessorCommentRule
            | Self::MetadataCommentRule
            | Self::ConfigCommentRule
            | Self::CommentRule => RuleCategory::Comment,
            Self::ElementHidingRule
            | Self::CssInjectionRule
            | Self::ScriptletInjectionRule
            | Self::HtmlFilteringRule
            | Self::JsInjectionRule => RuleCategory::Cosmetic,
            Self::NetworkRule | Self::HostRule => RuleCategory::Network,
        }
    }
}

// =============================================================================
// Comment Markers
// =============================================================================

/// Leading character of a comment line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum CommentMarker {
    /// `!`
    #[default]
    Regular = 0,
    /// `#`
    Hashmark = 1,
}

impl CommentMarker {
    pub fn as_char(self) -> char {
        match self {
            Self::Regular => '!',
            Self::Hashmark => '#',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '!' => Some(Self::Regular),
            '#' => Some(Self::Hashmark),
            _ => None,
        }
    }
}

impl TryFrom<u8> for CommentMarker {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Regular),
            1 => Ok(Self::Hashmark),
            _ => Err(()),
        }
    }
}

// =============================================================================
// Cosmetic Separators
// =============================================================================

/// Token between the domain list and the body of a cosmetic rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum CosmeticSeparator {
    /// `##`
    ElementHiding = 0,
    /// `#@#`
    ElementHidingException = 1,
    /// `#?#`
    ExtendedElementHiding = 2,
    /// `#@?#`
    ExtendedElementHidingException = 3,
    /// `#$#`
    CssInjection = 4,
    /// `#@$#`
    CssInjectionException = 5,
    /// `#$?#`
    ExtendedCssInjection = 6,
    /// `#@$?#`
    ExtendedCssInjectionException = 7,
    /// `#%#`
    JsInjection = 8,
    /// `#@%#`
    JsInjectionException = 9,
    /// `$$`
    HtmlFiltering = 10,
    /// `$@$`
    HtmlFilteringException = 11,
}

/// Separators starting with `#`, longest first so prefixes never shadow.
const HASH_SEPARATORS: [CosmeticSeparator; 10] = [
    CosmeticSeparator::ExtendedCssInjectionException,
    CosmeticSeparator::ExtendedElementHidingException,
    CosmeticSeparator::CssInjectionException,
    CosmeticSeparator::JsInjectionException,
    CosmeticSeparator::ExtendedCssInjection,
    CosmeticSeparator::ElementHidingException,
    CosmeticSeparator::ExtendedElementHiding,
    CosmeticSeparator::CssInjection,
    CosmeticSeparator::JsInjection,
    CosmeticSeparator::ElementHiding,
];

impl CosmeticSeparator {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ElementHiding => "##",
            Self::ElementHidingException => "#@#",
            Self::ExtendedElementHiding => "#?#",
            Self::ExtendedElementHidingException => "#@?#",
            Self::CssInjection => "#$#",
            Self::CssInjectionException => "#@$#",
            Self::ExtendedCssInjection => "#$?#",
            Self::ExtendedCssInjectionException => "#@$?#",
            Self::JsInjection => "#%#",
            Self::JsInjectionException => "#@%#",
            Self::HtmlFiltering => "$$",
            Self::HtmlFilteringException => "$@$",
        }
    }

    pub fn is_exception(self) -> bool {
        matches!(
            self,
            Self::ElementHidingException
                | Self::ExtendedElementHidingException
                | Self::CssInjectionException
                | Self::ExtendedCssInjectionException
                | Self::JsInjectionException
                | Self::HtmlFilteringException
        )
    }

    pub fn is_extended(self) -> bool {
        matches!(
            self,
            Self::ExtendedElementHiding
                | Self::ExtendedElementHidingException
                | Self::ExtendedCssInjection
                | Self::ExtendedCssInjectionException
        )
    }

    /// Element hiding separator (`##`/`#@#`, or `#?#`/`#@?#` when extended).
    pub fn element_hiding(exception: bool, extended: bool) -> Self {
        match (exception, extended) {
            (false, false) => Self::ElementHiding,
            (true, false) => Self::ElementHidingException,
            (false, true) => Self::ExtendedElementHiding,
            (true, true) => Self::ExtendedElementHidingException,
        }
    }

    /// AdGuard CSS injection separator.
    pub fn css_injection(exception: bool, extended: bool) -> Self {
        match (exception, extended) {
            (false, false) => Self::CssInjection,
            (true, false) => Self::CssInjectionException,
            (false, true) => Self::ExtendedCssInjection,
            (true, true) => Self::ExtendedCssInjectionException,
        }
    }

    /// AdGuard scriptlet / JS injection separator.
    pub fn js_injection(exception: bool) -> Self {
        if exception {
            Self::JsInjectionException
        } else {
            Self::JsInjection
        }
    }

    /// AdGuard HTML filtering separator.
    pub fn html_filtering(exception: bool) -> Self {
        if exception {
            Self::HtmlFilteringException
        } else {
            Self::HtmlFiltering
        }
    }

    /// Locate the first cosmetic separator in `line`.
    ///
    /// Returns the byte offset of the separator and the separator itself.
    pub fn find(line: &str) -> Option<(usize, Self)> {
        let bytes = line.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'#' => {
                    let rest = &line[i..];
                    if let Some(sep) = HASH_SEPARATORS.iter().find(|sep| rest.starts_with(sep.as_str())) {
                        return Some((i, *sep));
                    }
                }
                b'$' => {
                    let rest = &line[i..];
                    if rest.starts_with("$@$") {
                        return Some((i, Self::HtmlFilteringException));
                    }
                    if rest.starts_with("$$") {
                        return Some((i, Self::HtmlFiltering));
                    }
                }
                _ => {}
            }
            i += 1;
        }
        None
    }
}

impl TryFrom<u8> for CosmeticSeparator {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::ElementHiding),
            1 => Ok(Self::ElementHidingException),
            2 => Ok(Self::ExtendedElementHiding),
            3 => Ok(Self::ExtendedElementHidingException),
            4 => Ok(Self::CssInjection),
            5 => Ok(Self::CssInjectionException),
            6 => Ok(Self::ExtendedCssInjection),
            7 => Ok(Self::ExtendedCssInjectionException),
            8 => Ok(Self::JsInjection),
            9 => Ok(Self::JsInjectionException),
            10 => Ok(Self::HtmlFiltering),
            11 => Ok(Self::HtmlFilteringException),
            _ => Err(()),
        }
    }
}

impl fmt::Display for CosmeticSeparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_longest_separator_first() {
        assert_eq!(
            CosmeticSeparator::find("example.com#@$?#body { color: red; }"),
            Some((11, CosmeticSeparator::ExtendedCssInjectionException))
        );
        assert_eq!(
            CosmeticSeparator::find("example.com##.ad"),
            Some((11, CosmeticSeparator::ElementHiding))
        );
        assert_eq!(
            CosmeticSeparator::find("example.com$@$script"),
            Some((11, CosmeticSeparator::HtmlFilteringException))
        );
        assert_eq!(CosmeticSeparator::find("||example.com^$script"), None);
    }

    #[test]
    fn separator_numeric_values_round_trip() {
        for value in 0u8..12 {
            let sep = CosmeticSeparator::try_from(value).expect("separator value");
            assert_eq!(sep as u8, value);
        }
        assert!(CosmeticSeparator::try_from(12).is_err());
    }

    #[test]
    fn detects_syntax_from_agent_names() {
        assert_eq!(syntax_from_agent_name("AdGuard"), AdblockSyntax::Adg);
        assert_eq!(syntax_from_agent_name("uBlock Origin"), AdblockSyntax::Ubo);
        assert_eq!(syntax_from_agent_name("Adblock Plus"), AdblockSyntax::Abp);
        assert_eq!(syntax_from_agent_name("Brave"), AdblockSyntax::Common);
    }

    #[test]
    fn rule_types_map_to_categories() {
        assert_eq!(RuleType::HostRule.category(), RuleCategory::Network);
        assert_eq!(RuleType::HintCommentRule.category(), RuleCategory::Comment);
        assert_eq!(RuleType::JsInjectionRule.category(), RuleCategory::Cosmetic);
    }
}
