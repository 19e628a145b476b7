//! Error types for clipmark.
//!
//! Most failures inside the pipeline are degraded locally (a rule falls back
//! to plain text, a metadata field is skipped, the DOM engine hands over to
//! the regex engine). Only [`Error::InputTooLarge`] escapes
//! [`convert_to_markdown`](crate::convert_to_markdown).

/// Error type for conversion operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The input is larger than the configured limit and was not processed.
    #[error("input of {len} bytes exceeds the {max} byte limit")]
    InputTooLarge {
        /// Input length in bytes.
        len: usize,
        /// Configured maximum.
        max: usize,
    },

    /// A single conversion rule could not render its node.
    #[error("rule `{rule}` failed: {reason}")]
    RuleFailure {
        /// Name of the failing rule.
        rule: &'static str,
        /// What went wrong.
        reason: String,
    },

    /// One metadata source was malformed and its field was skipped.
    #[error("metadata field `{field}` skipped: {reason}")]
    MetadataField {
        /// Field name.
        field: &'static str,
        /// What went wrong.
        reason: String,
    },

    /// The tree-walking engine cannot handle this document.
    #[error("conversion engine unavailable: {0}")]
    EngineUnavailable(String),

    /// Frontmatter could not be serialized.
    #[error("frontmatter serialization failed: {0}")]
    Frontmatter(String),
}

impl Error {
    /// Shorthand for building a [`Error::RuleFailure`].
    pub(crate) fn rule(rule: &'static str, reason: impl Into<String>) -> Self {
        Self::RuleFailure {
            rule,
            reason: reason.into(),
        }
    }
}

/// Result type alias for conversion operations.
pub type Result<T> = std::result::Result<T, Error>;
