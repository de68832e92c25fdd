//! Error types shared across the rule engine.

use crate::binary::{DeserializeError, SerializeError};

/// Malformed filter-list syntax.
///
/// Offsets are byte offsets into the line handed to the parser.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} (at {start}..{end})")]
pub struct AdblockSyntaxError {
    pub message: String,
    pub start: usize,
    pub end: usize,
}

impl AdblockSyntaxError {
    pub fn new(message: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            message: message.into(),
            start,
            end,
        }
    }

    /// Shift the reported range by `offset` bytes.
    pub(crate) fn shifted(mut self, offset: usize) -> Self {
        self.start += offset;
        self.end += offset;
        self
    }

    /// Error kind name stored in `Invalid` nodes.
    pub const NAME: &'static str = "AdblockSyntaxError";
}

/// The target dialect has no mapping for a construct.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct RuleConversionError(pub String);

impl RuleConversionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Umbrella error for callers that drive several stages at once.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Syntax error: {0}")]
    Syntax(#[from] AdblockSyntaxError),
    #[error("Conversion error: {0}")]
    Conversion(#[from] RuleConversionError),
    #[error("Serialization error: {0}")]
    Serialize(#[from] SerializeError),
    #[error("Deserialization error: {0}")]
    Deserialize(#[from] DeserializeError),
}
