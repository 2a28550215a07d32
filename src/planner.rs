//! Identity Planner
//!
//! A pre-pass over the value graph that finds every composite reachable
//! through more than one edge. Those, and only those, get a label in the
//! encoded tree; everything else is inlined.
//!
//! Sharing and cycles need no separate handling: a back edge from a
//! descendant is just a second edge into its ancestor.

use std::collections::HashSet;

use crate::error::{CodecError, Result};
use crate::value::{Composite, Heap, NodeId, Value};

/// Outcome of the pre-pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityPlan {
    labelled: HashSet<NodeId>,
    reachable: usize,
}

impl IdentityPlan {
    /// Whether the composite must carry a label
    pub fn needs_label(&self, id: NodeId) -> bool {
        self.labelled.contains(&id)
    }

    pub fn labelled_count(&self) -> usize {
        self.labelled.len()
    }

    /// Distinct composites reachable from the root
    pub fn reachable_count(&self) -> usize {
        self.reachable
    }
}

/// Pre-order walk from `root` marking composites seen twice
///
/// Uses an explicit work stack, so graph depth is not bounded by the call
/// stack. Fails with `UnsupportedType` if a handle does not resolve in `heap`.
pub fn plan(heap: &Heap, root: &Value) -> Result<IdentityPlan> {
    let mut seen: HashSet<NodeId> = HashSet::new();
    let mut labelled: HashSet<NodeId> = HashSet::new();
    let mut pending: Vec<&Value> = vec![root];

    while let Some(value) = pending.pop() {
        let Some(id) = value.node_id() else {
            continue;
        };

        if !seen.insert(id) {
            labelled.insert(id);
            continue;
        }

        // Children pushed in reverse so they pop in document order
        match resolve(heap, value, id)? {
            Composite::Sequence(items) => pending.extend(items.iter().rev()),
            Composite::Mapping(entries) => {
                for (key, item) in entries.iter().rev() {
                    pending.push(item);
                    pending.push(key);
                }
            }
        }
    }

    tracing::trace!(reachable = seen.len(), labelled = labelled.len(), "identity plan");

    Ok(IdentityPlan {
        labelled,
        reachable: seen.len(),
    })
}

/// Look up a composite, checking the handle kind matches the node kind
pub(crate) fn resolve<'h>(heap: &'h Heap, value: &Value, id: NodeId) -> Result<&'h Composite> {
    match (value, heap.node(id)) {
        (Value::Sequence(_), Some(node @ Composite::Sequence(_)))
        | (Value::Mapping(_), Some(node @ Composite::Mapping(_))) => Ok(node),
        (_, Some(_)) => Err(CodecError::UnsupportedType {
            found: format!("{} handle to a node of another kind ({})", value.kind_name(), id),
        }),
        (_, None) => Err(CodecError::UnsupportedType {
            found: format!("{} handle {} from another heap", value.kind_name(), id),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_needs_no_labels() {
        let mut heap = Heap::new();
        let inner = heap.sequence([Value::Int(1)]);
        let root = heap.mapping([("a".into(), inner), ("b".into(), Value::Null)]);

        let plan = plan(&heap, &root).unwrap();
        assert_eq!(plan.labelled_count(), 0);
        assert_eq!(plan.reachable_count(), 2);
    }

    #[test]
    fn test_shared_child_is_labelled() {
        let mut heap = Heap::new();
        let shared = heap.mapping([("k".into(), 1.into())]);
        let root = heap.mapping([("a".into(), shared.clone()), ("b".into(), shared.clone())]);

        let plan = plan(&heap, &root).unwrap();
        assert!(plan.needs_label(shared.node_id().unwrap()));
        assert!(!plan.needs_label(root.node_id().unwrap()));
        assert_eq!(plan.labelled_count(), 1);
    }

    #[test]
    fn test_cycle_labels_the_ancestor() {
        let mut heap = Heap::new();
        let arr = heap.new_sequence();
        heap.push(arr, Value::Int(1)).unwrap();
        heap.push(arr, Value::Sequence(arr)).unwrap();

        let plan = plan(&heap, &Value::Sequence(arr)).unwrap();
        assert!(plan.needs_label(arr));
        assert_eq!(plan.labelled_count(), 1);
    }

    #[test]
    fn test_composite_keys_are_walked() {
        let mut heap = Heap::new();
        let key = heap.sequence([Value::Int(1)]);
        let root = heap.mapping([(key.clone(), key.clone())]);

        let plan = plan(&heap, &root).unwrap();
        assert!(plan.needs_label(key.node_id().unwrap()));
    }

    #[test]
    fn test_foreign_handle_is_unsupported() {
        let heap = Heap::new();
        let mut stranger = Heap::new();
        let foreign = stranger.sequence([]);

        assert!(matches!(
            plan(&heap, &foreign),
            Err(CodecError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn test_mismatched_handle_kind_is_unsupported() {
        let mut heap = Heap::new();
        let seq = heap.new_sequence();
        assert!(matches!(
            plan(&heap, &Value::Mapping(seq)),
            Err(CodecError::UnsupportedType { .. })
        ));
    }
}
