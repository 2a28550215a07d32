//! Encoder - value graph to `Link` tree
//!
//! Depth-first, pre-order. A composite the planner marked gets its label at
//! first visit, recorded *before* its children are walked, so a child that
//! points back at the ancestor still being emitted becomes a bare reference:
//!
//! ```text
//! arr = [1, arr]   →   (obj_0: array (int 1) obj_0)
//! ```
//!
//! Mapping entries are two-child nodes `(key value)` after the `object` tag.

use std::collections::HashMap;

use lino_tree::Link;
use tracing::{debug, trace};

use crate::config::CodecConfig;
use crate::error::{CodecError, Result};
use crate::planner::{self, IdentityPlan};
use crate::tagger::{self, Kind};
use crate::value::{Composite, Heap, NodeId, Value};

/// Prefix of generated labels
pub const LABEL_PREFIX: &str = "obj_";

/// Per-call encoder state
pub struct Encoder<'h> {
    heap: &'h Heap,
    plan: IdentityPlan,
    emitted: HashMap<NodeId, String>,
    next_label: usize,
    max_depth: usize,
}

impl<'h> Encoder<'h> {
    /// Run the identity pre-pass for `root` and prepare a fresh label counter
    pub fn new(heap: &'h Heap, root: &Value, config: &CodecConfig) -> Result<Self> {
        let plan = planner::plan(heap, root)?;
        Ok(Self {
            heap,
            plan,
            emitted: HashMap::new(),
            next_label: 0,
            max_depth: config.max_depth,
        })
    }

    pub fn encode(mut self, root: &Value) -> Result<Link> {
        let link = self.emit(root, 0)?;
        debug!(
            composites = self.plan.reachable_count(),
            labels = self.next_label,
            "encoded value graph"
        );
        Ok(link)
    }

    fn emit(&mut self, value: &Value, depth: usize) -> Result<Link> {
        let Some(id) = value.node_id() else {
            return tagger::encode_scalar(value).ok_or_else(|| CodecError::UnsupportedType {
                found: value.kind_name().to_string(),
            });
        };

        if let Some(label) = self.emitted.get(&id) {
            return Ok(Link::leaf(label.clone()));
        }

        if depth >= self.max_depth {
            return Err(CodecError::DepthLimitExceeded {
                limit: self.max_depth,
            });
        }

        let label = if self.plan.needs_label(id) {
            let label = format!("{}{}", LABEL_PREFIX, self.next_label);
            self.next_label += 1;
            trace!(%id, label = %label, "assigned label");
            self.emitted.insert(id, label.clone());
            Some(label)
        } else {
            None
        };

        let heap = self.heap;
        let values = match planner::resolve(heap, value, id)? {
            Composite::Sequence(items) => {
                let mut values = Vec::with_capacity(items.len() + 1);
                values.push(Kind::Array.tag());
                for item in items {
                    values.push(self.emit(item, depth + 1)?);
                }
                values
            }
            Composite::Mapping(entries) => {
                let mut values = Vec::with_capacity(entries.len() + 1);
                values.push(Kind::Object.tag());
                for (key, item) in entries {
                    let key = self.emit(key, depth + 1)?;
                    let item = self.emit(item, depth + 1)?;
                    values.push(Link::node(vec![key, item]));
                }
                values
            }
        };

        Ok(Link::Node { id: label, values })
    }
}

/// Encode `root` with the given configuration
pub fn encode_tree(heap: &Heap, root: &Value, config: &CodecConfig) -> Result<Link> {
    Encoder::new(heap, root, config)?.encode(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn encode(heap: &Heap, root: &Value) -> String {
        encode_tree(heap, root, &CodecConfig::default())
            .unwrap()
            .to_notation()
    }

    #[test]
    fn test_scalar_root() {
        let heap = Heap::new();
        assert_eq!(encode(&heap, &Value::Int(5)), "(int 5)");
    }

    #[test]
    fn test_empty_containers() {
        let mut heap = Heap::new();
        let seq = heap.sequence([]);
        let map = heap.mapping([]);
        assert_eq!(encode(&heap, &seq), "(array)");
        assert_eq!(encode(&heap, &map), "(object)");
    }

    #[test]
    fn test_nested_without_sharing() {
        let mut heap = Heap::new();
        let inner = heap.sequence([Value::Int(1), Value::Bool(false)]);
        let root = heap.mapping([("a".into(), inner)]);
        assert_eq!(
            encode(&heap, &root),
            "(object ((str YQ==) (array (int 1) (bool false))))"
        );
    }

    #[test]
    fn test_self_reference() {
        let mut heap = Heap::new();
        let map = heap.new_mapping();
        heap.insert(map, "self".into(), Value::Mapping(map)).unwrap();
        assert_eq!(
            encode(&heap, &Value::Mapping(map)),
            "(obj_0: object ((str c2VsZg==) obj_0))"
        );
    }

    #[test]
    fn test_shared_sibling_defined_once() {
        let mut heap = Heap::new();
        let shared = heap.sequence([Value::Int(1)]);
        let root = heap.sequence([shared.clone(), shared.clone(), shared]);
        assert_eq!(
            encode(&heap, &root),
            "(array (obj_0: array (int 1)) obj_0 obj_0)"
        );
    }

    #[test]
    fn test_labels_follow_preorder() {
        let mut heap = Heap::new();
        let first = heap.sequence([]);
        let second = heap.sequence([]);
        let root = heap.sequence([second.clone(), first.clone(), first, second]);
        assert_eq!(
            encode(&heap, &root),
            "(array (obj_0: array) (obj_1: array) obj_1 obj_0)"
        );
    }

    #[test]
    fn test_counter_resets_per_call() {
        let mut heap = Heap::new();
        let shared = heap.sequence([]);
        let root = heap.sequence([shared.clone(), shared]);
        assert_eq!(encode(&heap, &root), encode(&heap, &root));
    }

    #[test]
    fn test_depth_limit() {
        let mut heap = Heap::new();
        let mut value = heap.sequence([]);
        for _ in 0..10 {
            value = heap.sequence([value]);
        }

        let shallow = CodecConfig {
            max_depth: 5,
            ..CodecConfig::default()
        };
        assert_eq!(
            encode_tree(&heap, &value, &shallow),
            Err(CodecError::DepthLimitExceeded { limit: 5 })
        );
        assert!(encode_tree(&heap, &value, &CodecConfig::default()).is_ok());
    }
}
