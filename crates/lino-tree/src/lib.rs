//! lino-tree: the generic labelled tree underneath the objects codec
//!
//! This crate knows nothing about types, identity or cycles. It provides:
//! - The `Link` tree (a bare leaf, or an optionally labelled node with children)
//! - A formatter that renders a tree as parenthesised links notation
//! - A nom-based parser that reads the notation back into a tree
//!
//! ```text
//! (obj_0: array (int 1) (str YQ==) obj_0)
//!  └─id─┘ └─────────── values ──────────┘
//! ```
//!
//! The codec layer assigns meaning to the leaves; this layer only preserves
//! them byte-for-byte.

pub mod error;
pub mod link;
pub mod parser;

pub use error::TreeError;
pub use link::{format_link, Link};
pub use parser::{parse_link, parse_link_with, parse_links, ParseOptions};
