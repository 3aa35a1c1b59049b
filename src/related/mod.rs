//! Related-element discovery for the detail view.
//!
//! Finds other forms of the same field (another width of a month name),
//! typed siblings, and a parent carrying text. Lookups go through paths, so
//! the configured `PathMatch` decides whether `[n]` disambiguators and case
//! are significant.

use std::sync::Arc;

use crate::config::{PathMatch, RelatedOptions};
use crate::dom::Node;
use crate::traverse::find_by_path_with;

const ALTERNATE_FORM_NODES: [&str; 4] = ["month", "day", "quarter", "era"];
const WIDTHS: [&str; 4] = ["abbreviated", "narrow", "wide", "short"];
const MAX_SIBLINGS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct RelatedElement {
    pub label: String,
    pub value: String,
    pub path: String,
    pub node: Arc<Node>,
}

impl RelatedElement {
    fn new(label: String, node: &Arc<Node>) -> Self {
        Self {
            label,
            value: node.text().to_string(),
            path: node.path.clone(),
            node: node.clone(),
        }
    }
}

pub fn find_related(node: &Node, root: &Arc<Node>, options: &RelatedOptions) -> Vec<RelatedElement> {
    let mode = options.path_match;
    let mut related = Vec::new();

    let name = node.name.to_lowercase();
    if ALTERNATE_FORM_NODES.contains(&name.as_str()) {
        related.extend(alternate_forms(node, root, mode));
    }
    if node.attribute("type").is_some() {
        related.extend(typed_siblings(node, root, mode));
    }
    if let Some(parent) = parent_context(node, root, mode) {
        related.push(parent);
    }

    related
}

pub fn has_related(node: &Node, root: &Arc<Node>, options: &RelatedOptions) -> bool {
    !find_related(node, root, options).is_empty()
}

fn alternate_forms(node: &Node, root: &Arc<Node>, mode: PathMatch) -> Vec<RelatedElement> {
    let parts: Vec<&str> = node.path.split('/').collect();
    let Some(context_index) = parts.iter().position(|part| {
        let part = part.to_lowercase();
        part.contains("format") || part.contains("standalone")
    }) else {
        return Vec::new();
    };
    let width_index = context_index + 1;
    let Some(current_width) = parts.get(width_index) else {
        return Vec::new();
    };

    let mut related = Vec::new();
    for width in WIDTHS {
        if width.eq_ignore_ascii_case(current_width) {
            continue;
        }
        let mut alternate = parts.clone();
        alternate[width_index] = width;
        let alternate_path = alternate.join("/");

        if let Some(found) = find_by_path_with(root, &alternate_path, mode) {
            if found.text_content.is_some() {
                related.push(RelatedElement::new(format!("{} form", capitalize(width)), found));
            }
        }
    }
    related
}

fn typed_siblings(node: &Node, root: &Arc<Node>, mode: PathMatch) -> Vec<RelatedElement> {
    let Some(node_type) = node.attribute("type") else {
        return Vec::new();
    };
    let Some(parent) = find_by_path_with(root, parent_path(&node.path), mode) else {
        return Vec::new();
    };

    parent
        .children
        .iter()
        .filter(|child| {
            child.name == node.name
                && child.id != node.id
                && child.text_content.is_some()
                && child
                    .attribute("type")
                    .is_some_and(|t| !t.is_empty() && t != node_type)
        })
        .take(MAX_SIBLINGS)
        .map(|sibling| RelatedElement::new(capitalize(sibling.attribute("type").unwrap_or("")), sibling))
        .collect()
}

fn parent_context(node: &Node, root: &Arc<Node>, mode: PathMatch) -> Option<RelatedElement> {
    if node.path.split('/').count() < 2 {
        return None;
    }
    let parent = find_by_path_with(root, parent_path(&node.path), mode)?;
    parent.text_content.as_ref()?;
    Some(RelatedElement::new(format!("Parent: {}", &*parent.name), parent))
}

fn parent_path(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(parent, _)| parent)
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
