//! Rule Binary Format v1 Constants
//!
//! Multi-byte integers are little-endian. Layout:
//!
//! ```text
//! header:  magic[4] | schema_version u16 | node_count u32
//! node:    type_tag u8 | (field_tag u8, payload)* | NULL
//! string:  varint byte_len | utf-8 bytes
//! value:   VALUE_STRING string | VALUE_FREQUENT u8 index
//! ```
//!
//! Optional fields that are absent are omitted; boolean fields are encoded by
//! the presence of their tag alone.

/// Magic bytes: "LWR1"
pub const BINARY_MAGIC: [u8; 4] = [0x4C, 0x57, 0x52, 0x31];

/// Current schema version. Bump whenever a tag, table or payload changes.
pub const BINARY_SCHEMA_VERSION: u16 = 2;

/// Header size in bytes
pub const HEADER_SIZE: usize = 10;

/// Node terminator.
pub const NULL: u8 = 0;

/// Payload marker: inline string follows.
pub const VALUE_STRING: u8 = 1;
/// Payload marker: one-byte index into a frequent-values table follows.
pub const VALUE_FREQUENT: u8 = 2;

// =============================================================================
// Header Field Offsets
// =============================================================================

/// Header field byte offsets.
pub mod header {
    /// u8[4] magic = "LWR1"
    pub const MAGIC: usize = 0;
    /// u16 schema version
    pub const SCHEMA_VERSION: usize = 4;
    /// u32 number of top-level nodes
    pub const NODE_COUNT: usize = 6;
}

// =============================================================================
// Node Types
// =============================================================================

/// Leading byte of every encoded node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum NodeType {
    Empty = 1,
    Invalid = 2,
    InvalidError = 3,
    SimpleComment = 4,
    AgentComment = 5,
    Agent = 6,
    HintComment = 7,
    Hint = 8,
    PreProcessor = 9,
    Metadata = 10,
    Config = 11,
    Cosmetic = 12,
    ElementHidingBody = 13,
    CssInjectionBody = 14,
    ScriptletBody = 15,
    ScriptletCall = 16,
    HtmlFilteringBody = 17,
    JsInjectionBody = 18,
    NetworkRule = 19,
    HostRule = 20,
    ModifierList = 21,
    Modifier = 22,
    Domain = 23,
    ExpressionVariable = 24,
    ExpressionNot = 25,
    ExpressionAnd = 26,
    ExpressionOr = 27,
    ExpressionParenthesis = 28,
}

impl NodeType {
    pub fn name(self) -> &'static str {
        match self {
            Self::Empty => "EmptyRule",
            Self::Invalid => "InvalidRule",
            Self::InvalidError => "InvalidRuleError",
            Self::SimpleComment => "CommentRule",
            Self::AgentComment => "AgentCommentRule",
            Self::Agent => "Agent",
            Self::HintComment => "HintCommentRule",
            Self::Hint => "Hint",
            Self::PreProcessor => "PreProcessorCommentRule",
            Self::Metadata => "MetadataCommentRule",
            Self::Config => "ConfigCommentRule",
            Self::Cosmetic => "CosmeticRule",
            Self::ElementHidingBody => "ElementHidingBody",
            Self::CssInjectionBody => "CssInjectionBody",
            Self::ScriptletBody => "ScriptletBody",
            Self::ScriptletCall => "ScriptletCall",
            Self::HtmlFilteringBody => "HtmlFilteringBody",
            Self::JsInjectionBody => "JsInjectionBody",
            Self::NetworkRule => "NetworkRule",
            Self::HostRule => "HostRule",
            Self::ModifierList => "ModifierList",
            Self::Modifier => "Modifier",
            Self::Domain => "Domain",
            Self::ExpressionVariable => "Variable",
            Self::ExpressionNot => "Not",
            Self::ExpressionAnd => "And",
            Self::ExpressionOr => "Or",
            Self::ExpressionParenthesis => "Parenthesis",
        }
    }
}

impl TryFrom<u8> for NodeType {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Empty),
            2 => Ok(Self::Invalid),
            3 => Ok(Self::InvalidError),
            4 => Ok(Self::SimpleComment),
            5 => Ok(Self::AgentComment),
            6 => Ok(Self::Agent),
            7 => Ok(Self::HintComment),
            8 => Ok(Self::Hint),
            9 => Ok(Self::PreProcessor),
            10 => Ok(Self::Metadata),
            11 => Ok(Self::Config),
            12 => Ok(Self::Cosmetic),
            13 => Ok(Self::ElementHidingBody),
            14 => Ok(Self::CssInjectionBody),
            15 => Ok(Self::ScriptletBody),
            16 => Ok(Self::ScriptletCall),
            17 => Ok(Self::HtmlFilteringBody),
            18 => Ok(Self::JsInjectionBody),
            19 => Ok(Self::NetworkRule),
            20 => Ok(Self::HostRule),
            21 => Ok(Self::ModifierList),
            22 => Ok(Self::Modifier),
            23 => Ok(Self::Domain),
            24 => Ok(Self::ExpressionVariable),
            25 => Ok(Self::ExpressionNot),
            26 => Ok(Self::ExpressionAnd),
            27 => Ok(Self::ExpressionOr),
            28 => Ok(Self::ExpressionParenthesis),
            _ => Err(()),
        }
    }
}

// =============================================================================
// Field Tags
// =============================================================================

/// Location tags shared by every node that carries a span. Both are varint.
pub mod location {
    pub const START: u8 = 0xF0;
    pub const END: u8 = 0xF1;
}

pub mod invalid {
    /// string
    pub const RAW: u8 = 1;
    /// InvalidError node
    pub const ERROR: u8 = 2;
}

pub mod invalid_error {
    pub const NAME: u8 = 1;
    pub const MESSAGE: u8 = 2;
}

pub mod simple_comment {
    /// u8 marker
    pub const MARKER: u8 = 1;
    pub const TEXT: u8 = 2;
}

pub mod agent_comment {
    /// u8 count, then Agent nodes
    pub const AGENTS: u8 = 1;
}

pub mod agent {
    /// value (agents table)
    pub const ADBLOCK: u8 = 1;
    pub const VERSION: u8 = 2;
}

pub mod hint_comment {
    /// u8 count, then Hint nodes
    pub const HINTS: u8 = 1;
}

pub mod hint {
    /// value (hints table)
    pub const NAME: u8 = 1;
    /// u8 count, then values (platforms table)
    pub const PARAMS: u8 = 2;
}

pub mod preprocessor {
    /// value (directives table)
    pub const NAME: u8 = 1;
    pub const VALUE: u8 = 2;
    /// u8 count, then strings
    pub const PARAMETERS: u8 = 3;
    /// expression node
    pub const EXPRESSION: u8 = 4;
    /// u8 syntax
    pub const SYNTAX: u8 = 5;
}

pub mod metadata {
    pub const MARKER: u8 = 1;
    /// value (headers table)
    pub const HEADER: u8 = 2;
    pub const VALUE: u8 = 3;
}

pub mod config {
    pub const MARKER: u8 = 1;
    /// value (config commands table)
    pub const COMMAND: u8 = 2;
    /// compact JSON string
    pub const OBJECT: u8 = 3;
    /// u8 count, then strings
    pub const RULE_LIST: u8 = 4;
    pub const COMMENT: u8 = 5;
}

pub mod cosmetic {
    /// u8 syntax, omitted for `Common`
    pub const SYNTAX: u8 = 1;
    /// flag
    pub const EXCEPTION: u8 = 2;
    /// u8 separator
    pub const SEPARATOR: u8 = 3;
    /// ModifierList node
    pub const MODIFIERS: u8 = 4;
    /// u16 count, then Domain nodes
    pub const DOMAINS: u8 = 5;
    /// body node
    pub const BODY: u8 = 6;
}

pub mod element_hiding_body {
    pub const SELECTOR: u8 = 1;
}

pub mod css_injection_body {
    pub const MEDIA: u8 = 1;
    pub const SELECTOR: u8 = 2;
    pub const DECLARATIONS: u8 = 3;
    /// flag
    pub const REMOVE: u8 = 4;
}

pub mod scriptlet_body {
    /// u16 count, then ScriptletCall nodes
    pub const CALLS: u8 = 1;
}

pub mod scriptlet_call {
    /// u16 count, then strings
    pub const PARAMS: u8 = 1;
}

pub mod raw_body {
    pub const VALUE: u8 = 1;
}

pub mod network_rule {
    pub const SYNTAX: u8 = 1;
    pub const EXCEPTION: u8 = 2;
    pub const PATTERN: u8 = 3;
    pub const MODIFIERS: u8 = 4;
}

pub mod host_rule {
    pub const IP: u8 = 1;
    /// u16 count, then strings
    pub const HOSTNAMES: u8 = 2;
    pub const COMMENT: u8 = 3;
}

pub mod modifier_list {
    /// u16 count, then Modifier nodes
    pub const CHILDREN: u8 = 1;
}

pub mod modifier {
    /// value (modifiers table)
    pub const NAME: u8 = 1;
    /// value (redirects table)
    pub const VALUE: u8 = 2;
    pub const EXCEPTION: u8 = 3;
}

pub mod domain {
    pub const VALUE: u8 = 1;
    pub const EXCEPTION: u8 = 2;
}

pub mod expression {
    /// value (pre-processor variables table)
    pub const NAME: u8 = 1;
    /// operand of `Not` / `Parenthesis`, left side of binary operators
    pub const LEFT: u8 = 1;
    pub const RIGHT: u8 = 2;
}

/// Validate magic bytes.
pub fn validate_magic(data: &[u8]) -> bool {
    data.len() >= 4 && data[..4] == BINARY_MAGIC
}

/// Read a u16 from bytes at offset (little-endian).
pub fn read_u16_le(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

/// Read a u32 from bytes at offset (little-endian).
pub fn read_u32_le(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}
