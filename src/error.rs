//! Typed error model for the objects codec.
//!
//! ```text
//! encode → UnsupportedType | DepthLimitExceeded
//! decode → UnsupportedTypeTag | DanglingReference | MalformedNode
//!          | InvalidScalar | DepthLimitExceeded | Tree
//! ```
//!
//! Every variant is fatal for the call that raised it. `MalformedNode` is
//! only produced under `MalformedPolicy::Strict`; the lenient policy
//! substitutes a default scalar instead.

use lino_tree::TreeError;

use crate::value::NodeId;

/// Result alias used throughout the codec
pub type Result<T> = std::result::Result<T, CodecError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CodecError {
    /// The value graph holds something the codec cannot represent.
    #[error("Unsupported type: {found}")]
    UnsupportedType { found: String },

    /// A node is tagged with a kind outside the reserved vocabulary.
    #[error("Unsupported type tag: {tag}")]
    UnsupportedTypeTag { tag: String },

    /// A bare label with no definition earlier in the tree.
    #[error("Dangling reference to undefined label {label}")]
    DanglingReference { label: String },

    /// A tagged node lacks the children its kind requires.
    #[error("Malformed {kind} node: expected {expected}")]
    MalformedNode { kind: String, expected: String },

    /// A scalar payload that does not parse as its kind.
    #[error("Invalid {kind} payload: {text:?}")]
    InvalidScalar { kind: String, text: String },

    #[error("Nesting exceeds the depth limit of {limit}")]
    DepthLimitExceeded { limit: usize },

    #[error(transparent)]
    Heap(#[from] HeapError),

    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Misuse of `Heap` handles
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HeapError {
    #[error("Node {node} does not belong to this heap")]
    ForeignHandle { node: NodeId },

    #[error("Node {node} is not a sequence")]
    NotASequence { node: NodeId },

    #[error("Node {node} is not a mapping")]
    NotAMapping { node: NodeId },

    #[error("Index {index} out of range for sequence {node} of length {len}")]
    IndexOutOfRange { node: NodeId, index: usize, len: usize },
}
