//! Error types. Selector errors are all raised while parsing; matching
//! never fails.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    #[error("Empty selector")]
    Empty,

    #[error("Unexpected '{token}' at {offset}")]
    UnexpectedToken { token: String, offset: usize },

    #[error("Unbalanced parentheses at {0}")]
    UnbalancedParens(usize),

    #[error("Misplaced comma at {0}")]
    MisplacedComma(usize),

    #[error("Missing selector after combinator '{0}'")]
    DanglingCombinator(String),

    #[error("Invalid regular expression '{pattern}': {message}")]
    InvalidRegex { pattern: String, message: String },

    #[error("Invalid regular expression flags '{0}'")]
    InvalidRegexFlags(String),

    #[error("Invalid argument for :{name}: {message}")]
    InvalidArgument { name: String, message: String },
}

impl SelectorError {
    pub(crate) fn argument(name: &str, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name: name.to_string(),
            message: message.into(),
        }
    }
}

/// The batcher task is gone or was stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Batcher is closed")]
pub struct BatchClosed;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Session has not been started")]
    NotStarted,

    #[error("Session is closed")]
    Closed(#[from] BatchClosed),
}
