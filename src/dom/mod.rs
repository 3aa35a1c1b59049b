//! The document tree produced by the converter and consumed by every other
//! module.
//!
//! Nodes are immutable once built. Children are held behind `Arc`, so a new
//! snapshot of the tree can share every untouched subtree with the previous
//! one and an edit only copies the nodes on the route from the root to the
//! edited node. Older snapshots stay valid for as long as anything holds them.

use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};
use string_cache::DefaultAtom;

/// Process-unique identity of a node, stable across edits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node_{}", self.0)
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    Element,
    Text,
    Comment,
    Cdata,
    ProcessingInstruction,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    #[serde(serialize_with = "serialize_atom")]
    pub name: DefaultAtom,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Attribute pairs in source order; keys are unique.
    #[serde(
        skip_serializing_if = "Vec::is_empty",
        serialize_with = "serialize_attributes"
    )]
    pub attributes: Vec<(DefaultAtom, String)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Arc<Node>>,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<NodeId>,
}

impl Node {
    pub fn element(id: NodeId, name: DefaultAtom, path: String, parent_id: Option<NodeId>) -> Self {
        Node {
            id,
            name,
            kind: NodeKind::Element,
            attributes: Vec::new(),
            text_content: None,
            children: Vec::new(),
            path,
            parent_id,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| &**k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Text content, with a missing value read as the empty string.
    pub fn text(&self) -> &str {
        self.text_content.as_deref().unwrap_or("")
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Copy of this node with its text replaced. Children are shared.
    pub(crate) fn with_text(&self, text: &str) -> Node {
        let mut copy = self.clone();
        copy.text_content = text_value(text);
        copy
    }
}

/// Empty text is represented by an absent value, as it is at parse time.
pub(crate) fn text_value(text: &str) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn serialize_atom<S: Serializer>(atom: &DefaultAtom, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(atom)
}

fn serialize_attributes<S: Serializer>(
    attributes: &[(DefaultAtom, String)],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_map(attributes.iter().map(|(k, v)| (&**k, v.as_str())))
}
