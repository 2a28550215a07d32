//! Value graph - scalars plus arena-allocated composites
//!
//! Scalars (`Null`, `Missing`, `Bool`, `Int`, `Float`, `Str`) are plain
//! values, copied and compared by value. Sequences and mappings live in a
//! `Heap` and are addressed through `NodeId` handles, so two `Value`s holding
//! the same handle denote the same instance: mutating the node through one is
//! visible through the other. Cycles are simply handles that point back up.
//!
//! ```text
//! Heap { nodes: [ #0 Sequence[Int(1), Int(2), Int(3), Sequence(#0)] ] }
//!                      ▲                                        │
//!                      └────────────────────────────────────────┘
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::HeapError;

static NEXT_HEAP_ID: AtomicU64 = AtomicU64::new(1);

// =============================================================================
// HANDLES AND VALUES
// =============================================================================

/// Stable identity of a composite node within one `Heap`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    heap: u64,
    index: u32,
}

impl NodeId {
    /// Position of the node in its heap, in allocation order
    pub fn index(&self) -> usize {
        self.index as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}@{}", self.index, self.heap)
    }
}

/// A node in the value graph
///
/// `PartialEq` is shallow: composites compare by identity and `Float(NaN)`
/// is unequal to itself. Use `Heap::deep_eq` for structural comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    /// Absent/optional marker, distinct from `Null`
    Missing,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Sequence(NodeId),
    Mapping(NodeId),
}

impl Value {
    pub fn is_composite(&self) -> bool {
        matches!(self, Value::Sequence(_) | Value::Mapping(_))
    }

    /// Handle of a composite, `None` for scalars
    pub fn node_id(&self) -> Option<NodeId> {
        match self {
            Value::Sequence(id) | Value::Mapping(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Human-readable kind, used in diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Missing => "undefined",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Sequence(_) => "array",
            Value::Mapping(_) => "object",
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n.into())
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

/// Storage of a composite node
#[derive(Debug, Clone, PartialEq)]
pub enum Composite {
    Sequence(Vec<Value>),
    /// Insertion-ordered entries with keys unique by `Heap::deep_eq`
    Mapping(Vec<(Value, Value)>),
}

impl Composite {
    pub fn len(&self) -> usize {
        match self {
            Composite::Sequence(items) => items.len(),
            Composite::Mapping(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// HEAP
// =============================================================================

/// Arena owning every composite of one value graph
///
/// Each heap has a process-unique id baked into its handles, so a handle
/// from another heap is detected instead of silently aliasing a stranger's
/// node. A cloned heap keeps the id: handles stay valid for both copies.
#[derive(Debug, Clone)]
pub struct Heap {
    id: u64,
    nodes: Vec<Composite>,
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}

impl Heap {
    pub fn new() -> Self {
        Self {
            id: NEXT_HEAP_ID.fetch_add(1, Ordering::Relaxed),
            nodes: Vec::new(),
        }
    }

    /// Number of composites allocated so far
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// True when the handle was allocated by this heap
    pub fn contains(&self, id: NodeId) -> bool {
        id.heap == self.id && id.index() < self.nodes.len()
    }

    pub fn node(&self, id: NodeId) -> Option<&Composite> {
        if id.heap != self.id {
            return None;
        }
        self.nodes.get(id.index())
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Composite, HeapError> {
        if id.heap != self.id {
            return Err(HeapError::ForeignHandle { node: id });
        }
        self.nodes
            .get_mut(id.index())
            .ok_or(HeapError::ForeignHandle { node: id })
    }

    fn alloc(&mut self, node: Composite) -> NodeId {
        let id = NodeId {
            heap: self.id,
            index: self.nodes.len() as u32,
        };
        self.nodes.push(node);
        id
    }

    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    pub fn new_sequence(&mut self) -> NodeId {
        self.alloc(Composite::Sequence(Vec::new()))
    }

    pub fn new_mapping(&mut self) -> NodeId {
        self.alloc(Composite::Mapping(Vec::new()))
    }

    /// Allocate a sequence holding `items`
    pub fn sequence(&mut self, items: impl IntoIterator<Item = Value>) -> Value {
        let items = items.into_iter().collect();
        Value::Sequence(self.alloc(Composite::Sequence(items)))
    }

    /// Allocate a mapping, inserting `entries` in order (later duplicates
    /// overwrite earlier values)
    pub fn mapping(&mut self, entries: impl IntoIterator<Item = (Value, Value)>) -> Value {
        let id = self.new_mapping();
        for (key, value) in entries {
            self.insert_entry(id.index(), key, value);
        }
        Value::Mapping(id)
    }

    // -------------------------------------------------------------------------
    // Mutation
    // -------------------------------------------------------------------------

    pub fn push(&mut self, seq: NodeId, item: Value) -> Result<(), HeapError> {
        match self.node_mut(seq)? {
            Composite::Sequence(items) => {
                items.push(item);
                Ok(())
            }
            Composite::Mapping(_) => Err(HeapError::NotASequence { node: seq }),
        }
    }

    pub fn set_item(&mut self, seq: NodeId, index: usize, item: Value) -> Result<(), HeapError> {
        match self.node_mut(seq)? {
            Composite::Sequence(items) => {
                let len = items.len();
                let slot = items.get_mut(index).ok_or(HeapError::IndexOutOfRange {
                    node: seq,
                    index,
                    len,
                })?;
                *slot = item;
                Ok(())
            }
            Composite::Mapping(_) => Err(HeapError::NotASequence { node: seq }),
        }
    }

    /// Insert or overwrite an entry. A key deep-equal to an existing key keeps
    /// the existing position and returns the previous value.
    pub fn insert(&mut self, map: NodeId, key: Value, value: Value) -> Result<Option<Value>, HeapError> {
        if !matches!(self.node_mut(map)?, Composite::Mapping(_)) {
            return Err(HeapError::NotAMapping { node: map });
        }
        Ok(self.insert_entry(map.index(), key, value))
    }

    /// Append an entry without looking for an equal key.
    ///
    /// Decode uses this: encoded entries are already unique, and keys that
    /// point at containers still being filled cannot be compared yet.
    pub(crate) fn push_entry(&mut self, map: NodeId, key: Value, value: Value) -> Result<(), HeapError> {
        match self.node_mut(map)? {
            Composite::Mapping(entries) => {
                entries.push((key, value));
                Ok(())
            }
            Composite::Sequence(_) => Err(HeapError::NotAMapping { node: map }),
        }
    }

    fn insert_entry(&mut self, index: usize, key: Value, value: Value) -> Option<Value> {
        let existing = match &self.nodes[index] {
            Composite::Mapping(entries) => entries.iter().position(|(k, _)| self.deep_eq(k, &key)),
            Composite::Sequence(_) => return None,
        };

        match &mut self.nodes[index] {
            Composite::Mapping(entries) => match existing {
                Some(pos) => Some(std::mem::replace(&mut entries[pos].1, value)),
                None => {
                    entries.push((key, value));
                    None
                }
            },
            Composite::Sequence(_) => None,
        }
    }

    // -------------------------------------------------------------------------
    // Access
    // -------------------------------------------------------------------------

    pub fn items(&self, seq: NodeId) -> Option<&[Value]> {
        match self.node(seq)? {
            Composite::Sequence(items) => Some(items),
            Composite::Mapping(_) => None,
        }
    }

    pub fn entries(&self, map: NodeId) -> Option<&[(Value, Value)]> {
        match self.node(map)? {
            Composite::Mapping(entries) => Some(entries),
            Composite::Sequence(_) => None,
        }
    }

    /// Look up a mapping entry by deep-equal key
    pub fn get(&self, map: NodeId, key: &Value) -> Option<&Value> {
        self.entries(map)?
            .iter()
            .find(|(k, _)| self.deep_eq(k, key))
            .map(|(_, v)| v)
    }

    pub fn len(&self, id: NodeId) -> Option<usize> {
        self.node(id).map(Composite::len)
    }

    pub fn is_empty(&self, id: NodeId) -> Option<bool> {
        self.node(id).map(Composite::is_empty)
    }

    // -------------------------------------------------------------------------
    // Comparison
    // -------------------------------------------------------------------------

    /// Structural equality within this heap
    ///
    /// Terminates on cycles: a pair of composites already under comparison is
    /// assumed equal. Mappings compare entry by entry in order. NaN equals NaN
    /// so a NaN key can be found again.
    pub fn deep_eq(&self, a: &Value, b: &Value) -> bool {
        let mut assumed: HashSet<(NodeId, NodeId)> = HashSet::new();
        let mut pending: Vec<(&Value, &Value)> = vec![(a, b)];

        while let Some((a, b)) = pending.pop() {
            match (a, b) {
                (Value::Sequence(x), Value::Sequence(y)) | (Value::Mapping(x), Value::Mapping(y)) => {
                    if x == y || !assumed.insert((*x, *y)) {
                        continue;
                    }
                    match (self.node(*x), self.node(*y)) {
                        (Some(Composite::Sequence(xs)), Some(Composite::Sequence(ys))) => {
                            if xs.len() != ys.len() {
                                return false;
                            }
                            pending.extend(xs.iter().zip(ys.iter()));
                        }
                        (Some(Composite::Mapping(xs)), Some(Composite::Mapping(ys))) => {
                            if xs.len() != ys.len() {
                                return false;
                            }
                            for ((xk, xv), (yk, yv)) in xs.iter().zip(ys.iter()) {
                                pending.push((xk, yk));
                                pending.push((xv, yv));
                            }
                        }
                        _ => return false,
                    }
                }
                (Value::Float(x), Value::Float(y)) => {
                    if !(x == y || (x.is_nan() && y.is_nan())) {
                        return false;
                    }
                }
                _ => {
                    if a.is_composite() || b.is_composite() || a != b {
                        return false;
                    }
                }
            }
        }

        true
    }

    /// Whether the graph rooted at `a` in this heap and the graph rooted at
    /// `b` in `other` have the same shape, scalars and sharing
    ///
    /// Composites are matched by a bijection, so two distinct-but-equal nodes
    /// do not match one shared node. Floats compare bit-for-bit (any NaN
    /// matches any NaN).
    pub fn isomorphic(&self, a: &Value, other: &Heap, b: &Value) -> bool {
        let mut forward: HashMap<NodeId, NodeId> = HashMap::new();
        let mut backward: HashMap<NodeId, NodeId> = HashMap::new();
        let mut pending: Vec<(&Value, &Value)> = vec![(a, b)];

        while let Some((a, b)) = pending.pop() {
            match (a, b) {
                (Value::Sequence(x), Value::Sequence(y)) | (Value::Mapping(x), Value::Mapping(y)) => {
                    match (forward.get(x), backward.get(y)) {
                        (Some(fx), Some(by)) if fx == y && by == x => continue,
                        (None, None) => {
                            forward.insert(*x, *y);
                            backward.insert(*y, *x);
                        }
                        _ => return false,
                    }
                    match (self.node(*x), other.node(*y)) {
                        (Some(Composite::Sequence(xs)), Some(Composite::Sequence(ys))) => {
                            if xs.len() != ys.len() {
                                return false;
                            }
                            pending.extend(xs.iter().zip(ys.iter()));
                        }
                        (Some(Composite::Mapping(xs)), Some(Composite::Mapping(ys))) => {
                            if xs.len() != ys.len() {
                                return false;
                            }
                            for ((xk, xv), (yk, yv)) in xs.iter().zip(ys.iter()) {
                                pending.push((xk, yk));
                                pending.push((xv, yv));
                            }
                        }
                        _ => return false,
                    }
                }
                (Value::Float(x), Value::Float(y)) => {
                    if !(x.to_bits() == y.to_bits() || (x.is_nan() && y.is_nan())) {
                        return false;
                    }
                }
                _ => {
                    if a.is_composite() || b.is_composite() || a != b {
                        return false;
                    }
                }
            }
        }

        true
    }
}

// =============================================================================
// DOCUMENT
// =============================================================================

/// A decoded value graph: the heap that owns every composite plus the root
#[derive(Debug, Clone)]
pub struct Document {
    pub heap: Heap,
    pub root: Value,
}

impl Document {
    pub fn new(heap: Heap, root: Value) -> Self {
        Self { heap, root }
    }

    /// Encode with the default codec
    pub fn encode(&self) -> crate::error::Result<String> {
        crate::codec::encode(&self.heap, &self.root)
    }

    /// Same document shape, scalars and sharing as `other`
    pub fn isomorphic(&self, other: &Document) -> bool {
        self.heap.isomorphic(&self.root, &other.heap, &other.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_handle_sees_mutation() {
        let mut heap = Heap::new();
        let shared = heap.new_sequence();
        let outer = heap.sequence([Value::Sequence(shared), Value::Sequence(shared)]);
        heap.push(shared, Value::Int(7)).unwrap();

        let items = heap.items(outer.node_id().unwrap()).unwrap();
        assert_eq!(items[0], items[1]);
        assert_eq!(heap.items(shared).unwrap(), &[Value::Int(7)]);
    }

    #[test]
    fn test_insert_overwrites_in_place() {
        let mut heap = Heap::new();
        let map = heap.new_mapping();
        heap.insert(map, "a".into(), 1.into()).unwrap();
        heap.insert(map, "b".into(), 2.into()).unwrap();
        let previous = heap.insert(map, "a".into(), 3.into()).unwrap();

        assert_eq!(previous, Some(Value::Int(1)));
        let entries = heap.entries(map).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], (Value::from("a"), Value::Int(3)));
        assert_eq!(entries[1], (Value::from("b"), Value::Int(2)));
    }

    #[test]
    fn test_insert_nan_key_is_found_again() {
        let mut heap = Heap::new();
        let map = heap.new_mapping();
        heap.insert(map, Value::Float(f64::NAN), 1.into()).unwrap();
        heap.insert(map, Value::Float(f64::NAN), 2.into()).unwrap();

        assert_eq!(heap.len(map), Some(1));
        assert_eq!(heap.get(map, &Value::Float(f64::NAN)), Some(&Value::Int(2)));
    }

    #[test]
    fn test_int_and_float_keys_are_distinct() {
        let mut heap = Heap::new();
        let map = heap.mapping([(Value::Int(1), "int".into()), (Value::Float(1.0), "float".into())]);
        assert_eq!(heap.len(map.node_id().unwrap()), Some(2));
    }

    #[test]
    fn test_wrong_kind_and_foreign_handles() {
        let mut heap = Heap::new();
        let mut stranger = Heap::new();
        let seq = heap.new_sequence();
        let map = heap.new_mapping();
        let foreign = stranger.new_sequence();

        assert_eq!(
            heap.push(map, Value::Null),
            Err(HeapError::NotASequence { node: map })
        );
        assert_eq!(
            heap.insert(seq, Value::Null, Value::Null),
            Err(HeapError::NotAMapping { node: seq })
        );
        assert_eq!(
            heap.push(foreign, Value::Null),
            Err(HeapError::ForeignHandle { node: foreign })
        );
        assert!(!heap.contains(foreign));
        assert!(heap.node(foreign).is_none());
    }

    #[test]
    fn test_set_item_bounds() {
        let mut heap = Heap::new();
        let seq = heap.sequence([Value::Null]);
        let id = seq.node_id().unwrap();
        heap.set_item(id, 0, Value::Bool(true)).unwrap();
        assert_eq!(heap.items(id).unwrap(), &[Value::Bool(true)]);
        assert_eq!(
            heap.set_item(id, 3, Value::Null),
            Err(HeapError::IndexOutOfRange {
                node: id,
                index: 3,
                len: 1
            })
        );
    }

    #[test]
    fn test_deep_eq_on_cycles() {
        let mut heap = Heap::new();
        let a = heap.new_sequence();
        let b = heap.new_sequence();
        heap.push(a, Value::Int(1)).unwrap();
        heap.push(a, Value::Sequence(a)).unwrap();
        heap.push(b, Value::Int(1)).unwrap();
        heap.push(b, Value::Sequence(b)).unwrap();

        assert!(heap.deep_eq(&Value::Sequence(a), &Value::Sequence(b)));

        heap.push(b, Value::Null).unwrap();
        assert!(!heap.deep_eq(&Value::Sequence(a), &Value::Sequence(b)));
    }

    #[test]
    fn test_isomorphic_respects_sharing() {
        let mut left = Heap::new();
        let shared = left.sequence([]);
        let left_root = left.sequence([shared.clone(), shared]);

        let mut right = Heap::new();
        let first = right.sequence([]);
        let second = right.sequence([]);
        let right_root = right.sequence([first, second]);

        assert!(left.deep_eq(&left_root, &left_root));
        assert!(!left.isomorphic(&left_root, &right, &right_root));
        assert!(left.isomorphic(&left_root, &left.clone(), &left_root));
    }

    #[test]
    fn test_isomorphic_float_bits() {
        let heap = Heap::new();
        assert!(heap.isomorphic(&Value::Float(f64::NAN), &heap, &Value::Float(f64::NAN)));
        assert!(!heap.isomorphic(&Value::Float(0.0), &heap, &Value::Float(-0.0)));
        assert!(!heap.isomorphic(&Value::Int(1), &heap, &Value::Float(1.0)));
    }
}
