//! Errors raised by the links notation parser.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum TreeError {
    /// The input did not match the notation grammar.
    #[error("Syntax error in links notation:\n{message}")]
    Syntax { message: String },

    /// Parentheses nest deeper than the configured limit.
    #[error("Links notation nests deeper than {limit} levels")]
    TooDeep { limit: usize },

    /// Only whitespace was supplied where one link was expected.
    #[error("Empty links notation input")]
    Empty,

    /// More than one top-level link where exactly one was expected.
    #[error("Expected a single top-level link, found {count}")]
    Trailing { count: usize },
}
