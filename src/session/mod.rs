//! Identity and path assignment for one conversion pass.
//!
//! A `ParseSession` owns the id counter. It is created fresh for each parse,
//! so two sessions never interfere and re-parsing the same input yields the
//! same ids and paths.

use std::collections::HashMap;

use string_cache::DefaultAtom;

use crate::dom::NodeId;

/// Path of the (possibly synthetic) document root's parent.
pub const ROOT_PATH: &str = "/";

#[derive(Debug, Default)]
pub struct ParseSession {
    issued: u32,
}

impl ParseSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next id. Ids start at 1 and are never reused in a session.
    pub fn generate_id(&mut self) -> NodeId {
        self.issued += 1;
        NodeId(self.issued)
    }

    /// Start counting same-named siblings under a new parent.
    pub fn sibling_scope(&self) -> SiblingCounter {
        SiblingCounter::default()
    }
}

/// Per-parent tally of tag names seen so far.
#[derive(Debug, Default)]
pub struct SiblingCounter {
    seen: HashMap<DefaultAtom, usize>,
}

impl SiblingCounter {
    /// Number of earlier siblings sharing `name`, then record this one.
    pub fn next_index(&mut self, name: &DefaultAtom) -> usize {
        let count = self.seen.entry(name.clone()).or_insert(0);
        let index = *count;
        *count += 1;
        index
    }
}

/// `parent/name`, with `[index]` appended for every sibling after the first.
pub fn build_path(parent_path: &str, name: &str, sibling_index: usize) -> String {
    let mut path = String::with_capacity(parent_path.len() + name.len() + 6);
    path.push_str(parent_path);
    if parent_path != ROOT_PATH {
        path.push('/');
    }
    path.push_str(name);
    if sibling_index > 0 {
        path.push('[');
        path.push_str(&sibling_index.to_string());
        path.push(']');
    }
    path
}

/// Path of a CDATA section inside the element at `parent_path`.
pub fn cdata_path(parent_path: &str) -> String {
    format!("{parent_path}/cdata()")
}
