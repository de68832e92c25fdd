//! Rule AST
//!
//! Every parsed line becomes one [`RuleNode`]. Nodes are plain owned trees:
//! no node refers back to its parent, and the converter clones before it
//! changes anything.
//!
//! # Architecture
//!
//! - [`RuleNode`] is the closed union over categories.
//! - Comment lines are split further by [`CommentRule`].
//! - Cosmetic rules share one [`CosmeticRule`] shape and differ by their
//!   [`CosmeticBody`]; the rule type is derived from the body variant.
//! - Network lines are either a [`NetworkRule`] or a [`HostRule`].
//!
//! `span` fields hold byte ranges into the parsed line and are only filled
//! when location tracking is enabled. `raws` keeps the original text for
//! faithful regeneration and is never written to the binary form.

use serde::{Deserialize, Serialize};

use crate::syntax::{AdblockSyntax, CommentMarker, CosmeticSeparator, RuleCategory, RuleType};

/// Byte range in the source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start: u32::try_from(start).unwrap_or(u32::MAX),
            end: u32::try_from(end).unwrap_or(u32::MAX),
        }
    }
}

/// Original source fragments.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Raws {
    pub text: String,
}

// =============================================================================
// Rule Node
// =============================================================================

/// One filter-list line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RuleNode {
    Empty(EmptyRule),
    Invalid(InvalidRule),
    Comment(CommentRule),
    Cosmetic(CosmeticRule),
    Network(NetworkRule),
    Host(HostRule),
}

impl RuleNode {
    pub fn category(&self) -> RuleCategory {
        self.rule_type().category()
    }

    pub fn rule_type(&self) -> RuleType {
        match self {
            Self::Empty(_) => RuleType::EmptyRule,
            Self::Invalid(_) => RuleType::InvalidRule,
            Self::Comment(comment) => comment.rule_type(),
            Self::Cosmetic(rule) => rule.rule_type(),
            Self::Network(_) => RuleType::NetworkRule,
            Self::Host(_) => RuleType::HostRule,
        }
    }

    pub fn syntax(&self) -> AdblockSyntax {
        match self {
            Self::Empty(_) | Self::Invalid(_) | Self::Host(_) => AdblockSyntax::Common,
            Self::Comment(comment) => comment.syntax(),
            Self::Cosmetic(rule) => rule.syntax,
            Self::Network(rule) => rule.syntax,
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            Self::Empty(rule) => rule.span,
            Self::Invalid(rule) => rule.span,
            Self::Comment(comment) => comment.span(),
            Self::Cosmetic(rule) => rule.span,
            Self::Network(rule) => rule.span,
            Self::Host(rule) => rule.span,
        }
    }

    /// Original line text, when the parser kept it.
    pub fn raw_text(&self) -> Option<&str> {
        let raws = match self {
            Self::Empty(_) => None,
            Self::Invalid(rule) => return Some(rule.raw.as_str()),
            Self::Comment(comment) => comment.raws(),
            Self::Cosmetic(rule) => rule.raws.as_ref(),
            Self::Network(rule) => rule.raws.as_ref(),
            Self::Host(rule) => rule.raws.as_ref(),
        };
        raws.map(|r| r.text.as_str())
    }

    /// Drop preserved source text (used after a node is rewritten).
    pub fn clear_raws(&mut self) {
        match self {
            Self::Empty(_) | Self::Invalid(_) => {}
            Self::Comment(comment) => comment.clear_raws(),
            Self::Cosmetic(rule) => rule.raws = None,
            Self::Network(rule) => rule.raws = None,
            Self::Host(rule) => rule.raws = None,
        }
    }
}

/// Blank line.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EmptyRule {
    pub span: Option<Span>,
}

/// Line that failed to parse in tolerant mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidRule {
    pub raw: String,
    pub error: InvalidRuleError,
    pub span: Option<Span>,
}

/// Captured parse error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidRuleError {
    pub name: String,
    pub message: String,
    pub span: Option<Span>,
}

// =============================================================================
// Comments
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CommentRule {
    Agent(AgentCommentRule),
    Hint(HintCommentRule),
    PreProcessor(PreProcessorCommentRule),
    Metadata(MetadataCommentRule),
    Config(ConfigCommentRule),
    Simple(SimpleCommentRule),
}

impl CommentRule {
    pub fn rule_type(&self) -> RuleType {
        match self {
            Self::Agent(_) => RuleType::AgentCommentRule,
            Self::Hint(_) => RuleType::HintCommentRule,
            Self::PreProcessor(_) => RuleType::PreProcessorCommentRule,
            Self::Metadata(_) => RuleType::MetadataCommentRule,
            Self::Config(_) => RuleType::ConfigCommentRule,
            Self::Simple(_) => RuleType::CommentRule,
        }
    }

    pub fn syntax(&self) -> AdblockSyntax {
        match self {
            Self::Hint(_) => AdblockSyntax::Adg,
            Self::PreProcessor(rule) => rule.syntax,
            _ => AdblockSyntax::Common,
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            Self::Agent(rule) => rule.span,
            Self::Hint(rule) => rule.span,
            Self::PreProcessor(rule) => rule.span,
            Self::Metadata(rule) => rule.span,
            Self::Config(rule) => rule.span,
            Self::Simple(rule) => rule.span,
        }
    }

    fn raws(&self) -> Option<&Raws> {
        match self {
            Self::Agent(rule) => rule.raws.as_ref(),
            Self::Hint(rule) => rule.raws.as_ref(),
            Self::PreProcessor(rule) => rule.raws.as_ref(),
            Self::Metadata(rule) => rule.raws.as_ref(),
            Self::Config(rule) => rule.raws.as_ref(),
            Self::Simple(rule) => rule.raws.as_ref(),
        }
    }

    fn clear_raws(&mut self) {
        match self {
            Self::Agent(rule) => rule.raws = None,
            Self::Hint(rule) => rule.raws = None,
            Self::PreProcessor(rule) => rule.raws = None,
            Self::Metadata(rule) => rule.raws = None,
            Self::Config(rule) => rule.raws = None,
            Self::Simple(rule) => rule.raws = None,
        }
    }
}

/// `[Adblock Plus 2.0; AdGuard]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentCommentRule {
    pub agents: Vec<Agent>,
    pub span: Option<Span>,
    pub raws: Option<Raws>,
}

/// One adblocker named in an agent comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub adblock: String,
    pub version: Option<String>,
    /// Derived from the name.
    pub syntax: AdblockSyntax,
    pub span: Option<Span>,
}

/// `!+ NOT_OPTIMIZED PLATFORM(windows)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HintCommentRule {
    pub hints: Vec<Hint>,
    pub span: Option<Span>,
    pub raws: Option<Raws>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hint {
    pub name: String,
    pub params: Option<Vec<String>>,
    pub span: Option<Span>,
}

/// `!#if`, `!#include`, `!#safari_cb_affinity(...)` and friends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreProcessorCommentRule {
    pub name: String,
    pub params: Option<PreProcessorParams>,
    pub syntax: AdblockSyntax,
    pub span: Option<Span>,
    pub raws: Option<Raws>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PreProcessorParams {
    /// Free-form value, e.g. the URL of `!#include`.
    Value(String),
    /// Parenthesized list, e.g. `!#safari_cb_affinity(general,privacy)`.
    Parameters(Vec<String>),
    /// Condition of `!#if`.
    Expression(LogicalExpression),
}

/// Boolean condition over pre-processor variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicalExpression {
    Variable(String),
    Not(Box<LogicalExpression>),
    And(Box<LogicalExpression>, Box<LogicalExpression>),
    Or(Box<LogicalExpression>, Box<LogicalExpression>),
    Parenthesis(Box<LogicalExpression>),
}

/// `! Title: My list`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataCommentRule {
    pub marker: CommentMarker,
    pub header: String,
    pub value: String,
    pub span: Option<Span>,
    pub raws: Option<Raws>,
}

/// `! aglint-disable rule-a, rule-b -- reason`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigCommentRule {
    pub marker: CommentMarker,
    pub command: String,
    pub params: Option<ConfigParams>,
    pub comment: Option<String>,
    pub span: Option<Span>,
    pub raws: Option<Raws>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConfigParams {
    /// Inline configuration object of the `aglint` command.
    Object(serde_json::Map<String, serde_json::Value>),
    /// Rule names of the enable/disable commands.
    RuleList(Vec<String>),
}

/// Any other comment line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleCommentRule {
    pub marker: CommentMarker,
    pub text: String,
    pub span: Option<Span>,
    pub raws: Option<Raws>,
}

// =============================================================================
// Cosmetic Rules
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CosmeticRule {
    pub syntax: AdblockSyntax,
    pub exception: bool,
    /// ADG `[$...]` prefix or uBO operators lifted out of the selector.
    pub modifiers: Option<ModifierList>,
    pub domains: Vec<Domain>,
    pub separator: CosmeticSeparator,
    pub body: CosmeticBody,
    pub span: Option<Span>,
    pub raws: Option<Raws>,
}

impl CosmeticRule {
    pub fn rule_type(&self) -> RuleType {
        match self.body {
            CosmeticBody::ElementHiding(_) => RuleType::ElementHidingRule,
            CosmeticBody::CssInjection(_) => RuleType::CssInjectionRule,
            CosmeticBody::Scriptlet(_) => RuleType::ScriptletInjectionRule,
            CosmeticBody::HtmlFiltering(_) => RuleType::HtmlFilteringRule,
            CosmeticBody::JsInjection(_) => RuleType::JsInjectionRule,
        }
    }
}

/// Domain list entry; `~example.com` sets `exception`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    pub value: String,
    pub exception: bool,
    pub span: Option<Span>,
}

impl Domain {
    pub fn new(value: impl Into<String>, exception: bool) -> Self {
        Self {
            value: value.into(),
            exception,
            span: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CosmeticBody {
    ElementHiding(ElementHidingBody),
    CssInjection(CssInjectionBody),
    Scriptlet(ScriptletBody),
    HtmlFiltering(String),
    JsInjection(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementHidingBody {
    pub selector_list: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CssInjectionBody {
    pub media_query_list: Option<String>,
    pub selector_list: String,
    pub declaration_list: Option<String>,
    pub remove: bool,
}

/// Scriptlet calls. ADG and uBO rules hold exactly one call, ABP snippet
/// rules may chain several.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptletBody {
    pub calls: Vec<ScriptletCall>,
}

/// Parameters as written, the first one being the scriptlet name. ADG
/// parameters keep their quotes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScriptletCall {
    pub params: Vec<String>,
}

// =============================================================================
// Network Rules
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkRule {
    pub syntax: AdblockSyntax,
    pub exception: bool,
    pub pattern: String,
    pub modifiers: Option<ModifierList>,
    pub span: Option<Span>,
    pub raws: Option<Raws>,
}

/// `/etc/hosts` style line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRule {
    pub ip: String,
    pub hostnames: Vec<String>,
    pub comment: Option<String>,
    pub span: Option<Span>,
    pub raws: Option<Raws>,
}

/// Ordered modifier list; order is significant.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModifierList {
    pub children: Vec<Modifier>,
    pub span: Option<Span>,
}

impl ModifierList {
    pub fn new(children: Vec<Modifier>) -> Self {
        Self { children, span: None }
    }
}

/// `~name=value`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifier {
    pub name: String,
    pub value: Option<String>,
    pub exception: bool,
    pub span: Option<Span>,
}

impl Modifier {
    pub fn new(name: impl Into<String>, value: Option<String>, exception: bool) -> Self {
        Self {
            name: name.into(),
            value,
            exception,
            span: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_offsets_saturate() {
        assert_eq!(Span::new(3, 9), Span { start: 3, end: 9 });
        let far = Span::new(usize::MAX, usize::MAX);
        assert_eq!((far.start, far.end), (u32::MAX, u32::MAX));
    }
}
