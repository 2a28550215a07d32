//! Decoder - `Link` tree to value graph
//!
//! The one rule that makes cycles work: a labelled container is allocated and
//! registered under its label *before* any of its children are resolved. A
//! descendant that refers back to it then finds the (still filling) node in
//! the identity table and links to it.
//!
//! ```text
//! (obj_0: array (int 1) obj_0)
//!    1. allocate #0, table[obj_0] = #0
//!    2. push Int(1)
//!    3. obj_0 → #0, push Sequence(#0)
//! ```
//!
//! ## Legacy input
//!
//! With `legacy_forms` enabled the decoder also reads:
//! - kind aliases `None`, `list`, `dict`
//! - `(list obj_3 ...)` and `(dict obj_3 ...)`: a self label in second
//!   position (only when `obj_3` is not already defined, otherwise it is an
//!   ordinary back reference)
//! - untagged containers, classified by shape (see `looks_like_mapping`)

use std::collections::HashMap;

use lino_tree::Link;
use tracing::{debug, trace, warn};

use crate::config::{CodecConfig, MalformedPolicy};
use crate::encoder::LABEL_PREFIX;
use crate::error::{CodecError, Result};
use crate::tagger::{self, Kind};
use crate::value::{Composite, Document, Heap, NodeId, Value};

/// Per-call decoder state
pub struct Decoder<'c> {
    config: &'c CodecConfig,
    heap: Heap,
    table: HashMap<String, NodeId>,
}

impl<'c> Decoder<'c> {
    pub fn new(config: &'c CodecConfig) -> Self {
        Self {
            config,
            heap: Heap::new(),
            table: HashMap::new(),
        }
    }

    pub fn decode(mut self, root: &Link) -> Result<Document> {
        let value = self.resolve(root, 0)?;
        debug!(
            composites = self.heap.node_count(),
            labels = self.table.len(),
            "decoded value graph"
        );
        Ok(Document::new(self.heap, value))
    }

    fn resolve(&mut self, link: &Link, depth: usize) -> Result<Value> {
        let (id, values) = match link {
            Link::Leaf(label) => return self.reference(label),
            Link::Node { id, values } => (id.as_deref(), values.as_slice()),
        };

        if let Some(label) = id {
            if self.table.contains_key(label) {
                if !values.is_empty() {
                    warn!(label, "label defined twice, keeping the first definition");
                }
                return self.reference(label);
            }
        }

        let tag = values.first().and_then(Link::as_leaf);
        let aliased = matches!(tag, Some("list" | "dict"));
        match tag.and_then(|t| Kind::parse(t, self.config.legacy_forms)) {
            Some(Kind::Array) => self.sequence(id, &values[1..], aliased, depth),
            Some(Kind::Object) => self.mapping(id, &values[1..], aliased, depth),
            Some(kind) => tagger::decode_scalar(kind, values.get(1), self.config),
            None => self.untagged(id, values, tag, depth),
        }
    }

    /// A bare label must name a container defined earlier in the walk
    fn reference(&self, label: &str) -> Result<Value> {
        let id = self
            .table
            .get(label)
            .copied()
            .ok_or_else(|| CodecError::DanglingReference {
                label: label.to_string(),
            })?;
        trace!(label, %id, "resolved reference");
        Ok(self.handle(id))
    }

    fn handle(&self, id: NodeId) -> Value {
        match self.heap.node(id) {
            Some(Composite::Mapping(_)) => Value::Mapping(id),
            _ => Value::Sequence(id),
        }
    }

    /// Only containers count towards the depth limit, matching the encoder
    fn enter(&self, depth: usize) -> Result<()> {
        if depth >= self.config.max_depth {
            return Err(CodecError::DepthLimitExceeded {
                limit: self.config.max_depth,
            });
        }
        Ok(())
    }

    fn register(&mut self, label: Option<&str>, id: NodeId) {
        if let Some(label) = label {
            trace!(label, %id, "registered container");
            self.table.insert(label.to_string(), id);
        }
    }

    /// Legacy `(list obj_3 ...)`: second-position self label. Only the
    /// `list`/`dict` aliases carry one; after `array`/`object` a leading
    /// label is an ordinary reference.
    fn legacy_label<'l>(
        &self,
        id: Option<&'l str>,
        items: &'l [Link],
        aliased: bool,
    ) -> (Option<&'l str>, &'l [Link]) {
        if id.is_none() && aliased {
            if let Some(label) = items.first().and_then(Link::as_leaf) {
                if label.starts_with(LABEL_PREFIX) && !self.table.contains_key(label) {
                    return (Some(label), &items[1..]);
                }
            }
        }
        (id, items)
    }

    fn sequence(&mut self, id: Option<&str>, items: &[Link], aliased: bool, depth: usize) -> Result<Value> {
        self.enter(depth)?;
        let (label, items) = self.legacy_label(id, items, aliased);

        let node = self.heap.new_sequence();
        self.register(label, node);

        for item in items {
            let value = self.resolve(item, depth + 1)?;
            self.heap.push(node, value)?;
        }
        Ok(Value::Sequence(node))
    }

    fn mapping(&mut self, id: Option<&str>, entries: &[Link], aliased: bool, depth: usize) -> Result<Value> {
        self.enter(depth)?;
        let (label, entries) = self.legacy_label(id, entries, aliased);

        let node = self.heap.new_mapping();
        self.register(label, node);

        for entry in entries {
            let pair = entry.values();
            if pair.len() != 2 {
                self.malformed_entry(entry)?;
                if pair.len() < 2 {
                    warn!(entry = %entry, "skipping malformed mapping entry");
                    continue;
                }
                warn!(entry = %entry, "ignoring extra children of mapping entry");
            }
            let key = self.resolve(&pair[0], depth + 1)?;
            let value = self.resolve(&pair[1], depth + 1)?;
            // Entries are appended as written; keys may point at containers
            // that are still being filled
            self.heap.push_entry(node, key, value)?;
        }
        Ok(Value::Mapping(node))
    }

    /// An entry that is not exactly `(key value)` fails under the strict policy
    fn malformed_entry(&self, entry: &Link) -> Result<()> {
        match self.config.malformed_nodes {
            MalformedPolicy::Strict => Err(CodecError::MalformedNode {
                kind: Kind::Object.as_str().to_string(),
                expected: format!("(key value) entry, found {}", entry),
            }),
            MalformedPolicy::Lenient => Ok(()),
        }
    }

    /// A node whose first child is not a kind tag
    fn untagged(&mut self, id: Option<&str>, values: &[Link], tag: Option<&str>, depth: usize) -> Result<Value> {
        // An unknown leaf in tag position is a tag we don't understand, unless
        // it names a defined container (an untagged array of references)
        if let Some(tag) = tag {
            if !self.table.contains_key(tag) || !self.config.legacy_forms {
                return Err(CodecError::UnsupportedTypeTag { tag: tag.to_string() });
            }
        }

        if !self.config.legacy_forms {
            return Err(CodecError::UnsupportedTypeTag {
                tag: "<missing>".to_string(),
            });
        }

        if looks_like_mapping(values, self.config.legacy_forms) {
            self.mapping(id, values, false, depth)
        } else {
            self.sequence(id, values, false, depth)
        }
    }
}

/// Shape heuristic for untagged containers: a mapping only if there is at
/// least one child and every child is a two-element node whose first element
/// is not a scalar kind tag.
///
/// Misreads an untagged array whose items all happen to be untagged pairs;
/// tagged output never takes this path.
pub fn looks_like_mapping(values: &[Link], legacy: bool) -> bool {
    !values.is_empty()
        && values.iter().all(|child| match child {
            Link::Node { values: pair, .. } if pair.len() == 2 => !pair[0]
                .as_leaf()
                .and_then(|t| Kind::parse(t, legacy))
                .is_some_and(|kind| kind.is_scalar()),
            _ => false,
        })
}

/// Decode a tree with the given configuration
pub fn decode_tree(root: &Link, config: &CodecConfig) -> Result<Document> {
    Decoder::new(config).decode(root)
}
