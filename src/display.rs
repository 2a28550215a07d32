//! Human-readable rendering of a value graph
//!
//! Shared or cyclic composites are marked the way Lisp printers do it:
//! `#0=` at the first occurrence, `#0#` afterwards.
//!
//! ```text
//! [1, 2, 3, <self>]          →  #0=[1, 2, 3, #0#]
//! {"a": s, "b": s}           →  {"a": #0={"k": 1}, "b": #0#}
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::planner::{self, IdentityPlan};
use crate::tagger::float_text;
use crate::value::{Composite, Heap, NodeId, Value};

/// `Display` adapter returned by `Heap::display`
pub struct ValueDisplay<'a> {
    heap: &'a Heap,
    value: &'a Value,
}

impl Heap {
    pub fn display<'a>(&'a self, value: &'a Value) -> ValueDisplay<'a> {
        ValueDisplay { heap: self, value }
    }
}

struct Printer<'a> {
    heap: &'a Heap,
    plan: IdentityPlan,
    marks: HashMap<NodeId, usize>,
    open: HashSet<NodeId>,
}

impl fmt::Display for ValueDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut printer = Printer {
            heap: self.heap,
            // A foreign handle makes planning fail; `open` still stops cycles
            plan: planner::plan(self.heap, self.value).unwrap_or_default(),
            marks: HashMap::new(),
            open: HashSet::new(),
        };
        printer.write(f, self.value)
    }
}

impl Printer<'_> {
    fn write(&mut self, f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
        let id = match value {
            Value::Null => return f.write_str("null"),
            Value::Missing => return f.write_str("undefined"),
            Value::Bool(b) => return write!(f, "{}", b),
            Value::Int(n) => return write!(f, "{}", n),
            Value::Float(x) => return f.write_str(&float_text(*x)),
            Value::Str(s) => return write!(f, "{:?}", s),
            Value::Sequence(id) | Value::Mapping(id) => *id,
        };

        if let Some(mark) = self.marks.get(&id) {
            return write!(f, "#{}#", mark);
        }
        if self.open.contains(&id) {
            return f.write_str("<cycle>");
        }

        if self.plan.needs_label(id) {
            let mark = self.marks.len();
            self.marks.insert(id, mark);
            write!(f, "#{}=", mark)?;
        }

        let heap = self.heap;
        self.open.insert(id);
        match heap.node(id) {
            Some(Composite::Sequence(items)) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    self.write(f, item)?;
                }
                f.write_str("]")?;
            }
            Some(Composite::Mapping(entries)) => {
                f.write_str("{")?;
                for (i, (key, item)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    self.write(f, key)?;
                    f.write_str(": ")?;
                    self.write(f, item)?;
                }
                f.write_str("}")?;
            }
            None => f.write_str("<foreign>")?,
        }
        self.open.remove(&id);
        Ok(())
    }
}
