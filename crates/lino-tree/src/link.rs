//! The `Link` tree and its textual rendering
//!
//! A link is either a bare leaf (a single token) or a node holding an
//! optional id followed by an ordered list of child links.
//!
//! ## Rendering rules
//!
//! - Leaves made only of word characters are written bare: `obj_0`, `YQ==`
//! - Any other leaf is double-quoted with backslash escapes: `""`, `"a b"`
//! - Nodes are written `(v1 v2 ...)`, or `(id: v1 v2 ...)` when labelled

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// LINK
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Link {
    /// A bare token
    Leaf(String),

    /// A parenthesised group with an optional `id:` prefix
    Node {
        id: Option<String>,
        values: Vec<Link>,
    },
}

impl Link {
    pub fn leaf(text: impl Into<String>) -> Self {
        Link::Leaf(text.into())
    }

    /// Unlabelled node: `(values...)`
    pub fn node(values: Vec<Link>) -> Self {
        Link::Node { id: None, values }
    }

    /// Labelled node: `(id: values...)`
    pub fn labelled(id: impl Into<String>, values: Vec<Link>) -> Self {
        Link::Node {
            id: Some(id.into()),
            values,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Link::Leaf(_))
    }

    /// Leaf text, or `None` for a node
    pub fn as_leaf(&self) -> Option<&str> {
        match self {
            Link::Leaf(text) => Some(text),
            Link::Node { .. } => None,
        }
    }

    /// The node's id, or `None` for leaves and unlabelled nodes
    pub fn id(&self) -> Option<&str> {
        match self {
            Link::Node { id, .. } => id.as_deref(),
            Link::Leaf(_) => None,
        }
    }

    /// Children of a node; a leaf has none
    pub fn values(&self) -> &[Link] {
        match self {
            Link::Node { values, .. } => values,
            Link::Leaf(_) => &[],
        }
    }

    /// Render to links notation
    pub fn to_notation(&self) -> String {
        let mut out = String::new();
        write_link(&mut out, self);
        out
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_notation())
    }
}

/// Render a link to links notation
pub fn format_link(link: &Link) -> String {
    link.to_notation()
}

// =============================================================================
// RENDERING
// =============================================================================

/// Characters that may appear in a bare (unquoted) token
pub(crate) fn is_word_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '(' | ')' | ':' | '"' | '\'' | '\\')
}

fn needs_quotes(text: &str) -> bool {
    text.is_empty() || !text.chars().all(is_word_char)
}

fn write_link(out: &mut String, link: &Link) {
    match link {
        Link::Leaf(text) => write_token(out, text),
        Link::Node { id, values } => {
            out.push('(');
            if let Some(id) = id {
                write_token(out, id);
                out.push(':');
                if !values.is_empty() {
                    out.push(' ');
                }
            }
            for (i, value) in values.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                write_link(out, value);
            }
            out.push(')');
        }
    }
}

fn write_token(out: &mut String, text: &str) {
    if !needs_quotes(text) {
        out.push_str(text);
        return;
    }

    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_bare_leaf() {
        assert_eq!(Link::leaf("obj_0").to_notation(), "obj_0");
        assert_eq!(Link::leaf("c2VsZg==").to_notation(), "c2VsZg==");
        assert_eq!(Link::leaf("-Infinity").to_notation(), "-Infinity");
    }

    #[test]
    fn test_quoted_leaf() {
        assert_eq!(Link::leaf("").to_notation(), r#""""#);
        assert_eq!(Link::leaf("a b").to_notation(), r#""a b""#);
        assert_eq!(Link::leaf("x:y").to_notation(), r#""x:y""#);
        assert_eq!(Link::leaf("say \"hi\"\n").to_notation(), r#""say \"hi\"\n""#);
    }

    #[test]
    fn test_unlabelled_node() {
        let link = Link::node(vec![Link::leaf("int"), Link::leaf("42")]);
        assert_eq!(link.to_notation(), "(int 42)");
        assert_eq!(format_link(&link), "(int 42)");
        assert_eq!(link.to_string(), "(int 42)");
    }

    #[test]
    fn test_labelled_node() {
        let link = Link::labelled(
            "obj_0",
            vec![
                Link::leaf("array"),
                Link::node(vec![Link::leaf("int"), Link::leaf("1")]),
                Link::leaf("obj_0"),
            ],
        );
        assert_eq!(link.to_notation(), "(obj_0: array (int 1) obj_0)");
    }

    #[test]
    fn test_empty_nodes() {
        assert_eq!(Link::node(vec![]).to_notation(), "()");
        assert_eq!(Link::labelled("obj_3", vec![]).to_notation(), "(obj_3:)");
    }

    #[test]
    fn test_accessors() {
        let link = Link::labelled("obj_1", vec![Link::leaf("object")]);
        assert_eq!(link.id(), Some("obj_1"));
        assert_eq!(link.values().len(), 1);
        assert_eq!(link.values()[0].as_leaf(), Some("object"));
        assert!(!link.is_leaf());
        assert!(Link::leaf("x").values().is_empty());
    }
}
