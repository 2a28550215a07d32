//! lino-objects-codec: lossless object graphs in links notation
//!
//! Serializes a value graph (scalars, sequences, mappings, with shared
//! sub-structures and cycles) into a typed links notation tree and back,
//! preserving scalar kinds, order, sharing and cycles.
//!
//! ## Pipeline
//!
//! ```text
//! Heap + root ─→ planner ─→ encoder ─→ Link ─→ text      (lino-tree)
//! text ─→ Link ─→ decoder ─→ Document { heap, root }
//! ```
//!
//! - `value`: `Value`, the composite arena `Heap`, `Document`
//! - `tagger`: scalar kind tags and payload text
//! - `planner`: which composites need a label
//! - `encoder` / `decoder`: the two tree walks
//! - `codec`: the `ObjectCodec` facade and `encode`/`decode`
//!
//! ```
//! use lino_objects_codec::{decode, encode, Heap, Value};
//!
//! let mut heap = Heap::new();
//! let arr = heap.new_sequence();
//! heap.push(arr, Value::Int(1)).unwrap();
//! heap.push(arr, Value::Sequence(arr)).unwrap();
//!
//! let text = encode(&heap, &Value::Sequence(arr)).unwrap();
//! assert_eq!(text, "(obj_0: array (int 1) obj_0)");
//!
//! let doc = decode(&text).unwrap();
//! let id = doc.root.node_id().unwrap();
//! assert_eq!(doc.heap.items(id).unwrap()[1], doc.root);
//! ```

pub mod codec;
pub mod config;
pub mod decoder;
pub mod display;
pub mod encoder;
pub mod error;
pub mod planner;
pub mod tagger;
pub mod value;

// Re-export commonly used types
pub use codec::{decode, encode, ObjectCodec};
pub use config::{CodecConfig, MalformedPolicy};
pub use error::{CodecError, HeapError, Result};
pub use lino_tree::{Link, TreeError};
pub use tagger::Kind;
pub use value::{Composite, Document, Heap, NodeId, Value};
