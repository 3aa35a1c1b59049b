//! Document state and the text-edit engine.
//!
//! `EditDocument` is the single owner of the current tree snapshot, the
//! modification set, the undo and redo stacks, the selection and the edit
//! mode flag. Trees are never mutated: every edit builds a new snapshot that
//! copies only the route from the root to the edited node, and swaps it in.
//!
//! Invariant: a node has a `Modification` exactly when its current text
//! differs from the text it had when the document was parsed.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::ParseOptions;
use crate::convert::parse_xml_string;
use crate::dom::{Node, NodeId};
use crate::error::{ExportError, ParseError};
use crate::format;
use crate::traverse::{self, Route};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModificationKind {
    TextContent,
}

/// A node whose text has diverged from its parsed value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Modification {
    pub node_id: NodeId,
    /// Captured once, never overwritten while the record exists.
    pub original_value: String,
    pub new_value: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: ModificationKind,
    pub path: String,
    pub node_name: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    Modify,
    Revert,
}

/// One reversible step on the undo or redo stack.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UndoAction {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub node_id: NodeId,
    pub previous_value: String,
    pub new_value: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct EditDocument {
    root: Option<Arc<Node>>,
    file_name: Option<String>,
    error: Option<String>,
    modifications: HashMap<NodeId, Modification>,
    undo_stack: Vec<UndoAction>,
    redo_stack: Vec<UndoAction>,
    selected: Option<Arc<Node>>,
    edit_mode: bool,
    options: ParseOptions,
}

impl EditDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ParseOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    // ---- loading --------------------------------------------------------

    /// Parse `xml` and make it the current document. On failure the previous
    /// document is dropped and the error is kept for display.
    pub fn load_str(&mut self, xml: &str, file_name: &str) -> Result<Arc<Node>, ParseError> {
        match parse_xml_string(xml, &self.options) {
            Ok(root) => {
                log::debug!("Loaded document {file_name}");
                self.reset_history();
                self.root = Some(root.clone());
                self.file_name = Some(file_name.to_string());
                self.selected = None;
                self.error = None;
                Ok(root)
            }
            Err(err) => Err(self.fail_load(err)),
        }
    }

    /// Like `load_str`, but rejects names that do not end in `.xml`.
    pub fn load_file(&mut self, file_name: &str, contents: &str) -> Result<Arc<Node>, ParseError> {
        if !file_name.to_lowercase().ends_with(".xml") {
            return Err(self.fail_load(ParseError::InvalidFileType {
                file_name: file_name.to_string(),
            }));
        }
        self.load_str(contents, file_name)
    }

    fn fail_load(&mut self, err: ParseError) -> ParseError {
        log::warn!("Failed to load document: {err}");
        self.reset_history();
        self.root = None;
        self.file_name = None;
        self.selected = None;
        self.error = Some(err.to_string());
        err
    }

    /// Drop the document and everything tied to it.
    pub fn clear(&mut self) {
        self.reset_history();
        self.root = None;
        self.selected = None;
        self.file_name = None;
        self.error = None;
        self.edit_mode = false;
    }

    fn reset_history(&mut self) {
        self.modifications.clear();
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    // ---- accessors ------------------------------------------------------

    pub fn root(&self) -> Option<&Arc<Node>> {
        self.root.as_ref()
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    pub fn node(&self, id: NodeId) -> Option<&Arc<Node>> {
        self.root.as_ref().and_then(|root| traverse::find_by_id(root, id))
    }

    pub fn current_value(&self, id: NodeId) -> Option<&str> {
        self.node(id).map(|node| node.text())
    }

    /// The current tree as XML, or `None` when nothing is loaded.
    pub fn to_xml_string(&self) -> Result<Option<String>, ExportError> {
        self.root.as_deref().map(format::to_xml_string).transpose()
    }

    // ---- selection and mode ---------------------------------------------

    pub fn selected(&self) -> Option<&Arc<Node>> {
        self.selected.as_ref()
    }

    pub fn select_node(&mut self, node: Option<Arc<Node>>) {
        self.selected = node;
    }

    /// Select the node with `id` in the current tree. Unknown ids clear the
    /// selection.
    pub fn select(&mut self, id: NodeId) -> Option<&Arc<Node>> {
        self.selected = self.node(id).cloned();
        self.selected.as_ref()
    }

    /// Select and return the first node named `name`, pre-order.
    pub fn navigate_to(&mut self, name: &str) -> Option<Arc<Node>> {
        let root = self.root.as_ref()?;
        let found = traverse::find_by_name(std::slice::from_ref(root), name)?.clone();
        self.selected = Some(found.clone());
        Some(found)
    }

    pub fn edit_mode(&self) -> bool {
        self.edit_mode
    }

    pub fn set_edit_mode(&mut self, enabled: bool) {
        self.edit_mode = enabled;
    }

    pub fn toggle_edit_mode(&mut self) -> bool {
        self.edit_mode = !self.edit_mode;
        self.edit_mode
    }

    // ---- modifications --------------------------------------------------

    pub fn modifications(&self) -> &HashMap<NodeId, Modification> {
        &self.modifications
    }

    pub fn modification(&self, id: NodeId) -> Option<&Modification> {
        self.modifications.get(&id)
    }

    pub fn is_modified(&self, id: NodeId) -> bool {
        self.modifications.contains_key(&id)
    }

    pub fn has_changes(&self) -> bool {
        !self.modifications.is_empty()
    }

    pub fn change_count(&self) -> usize {
        self.modifications.len()
    }

    /// Modifications, most recent first.
    pub fn changes(&self) -> Vec<&Modification> {
        let mut changes: Vec<&Modification> = self.modifications.values().collect();
        changes.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(a.node_id.cmp(&b.node_id)));
        changes
    }

    pub fn undo_stack(&self) -> &[UndoAction] {
        &self.undo_stack
    }

    pub fn redo_stack(&self) -> &[UndoAction] {
        &self.redo_stack
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    // ---- editing --------------------------------------------------------

    /// Replace the text of node `id`. Returns whether anything changed.
    ///
    /// Unknown ids and values equal to the current text are no-ops: no
    /// history entry, no modification record, no new tree.
    pub fn update_text(&mut self, id: NodeId, new_value: &str) -> bool {
        let Some((route, current)) = self.locate(id) else {
            log::debug!("update_text: no node {id} in the current tree");
            return false;
        };
        if current == new_value {
            return false;
        }

        self.undo_stack.push(UndoAction {
            kind: ActionKind::Modify,
            node_id: id,
            previous_value: current.clone(),
            new_value: new_value.to_string(),
            timestamp: Utc::now(),
        });
        self.redo_stack.clear();

        self.apply(id, &route, &current, new_value);
        log::trace!("Edited {id}: {current:?} -> {new_value:?}");
        true
    }

    /// Step back one action. Returns whether anything changed.
    pub fn undo(&mut self) -> bool {
        let Some(action) = self.undo_stack.pop() else {
            log::debug!("undo: nothing to undo");
            return false;
        };
        if let Some((route, current)) = self.locate(action.node_id) {
            self.apply(action.node_id, &route, &current, &action.previous_value);
        }
        log::trace!("Undid {:?} on {}", action.kind, action.node_id);
        self.redo_stack.push(action);
        true
    }

    /// Re-apply the most recently undone action. Returns whether anything
    /// changed.
    pub fn redo(&mut self) -> bool {
        let Some(action) = self.redo_stack.pop() else {
            log::debug!("redo: nothing to redo");
            return false;
        };
        if let Some((route, current)) = self.locate(action.node_id) {
            self.apply(action.node_id, &route, &current, &action.new_value);
        }
        log::trace!("Redid {:?} on {}", action.kind, action.node_id);
        self.undo_stack.push(action);
        true
    }

    /// Restore one node to its parsed text, as an undoable step.
    pub fn revert_one(&mut self, id: NodeId) -> bool {
        let Some(original) = self
            .modifications
            .get(&id)
            .map(|m| m.original_value.clone())
        else {
            return false;
        };
        let Some((route, current)) = self.locate(id) else {
            self.modifications.remove(&id);
            return false;
        };

        self.undo_stack.push(UndoAction {
            kind: ActionKind::Revert,
            node_id: id,
            previous_value: current.clone(),
            new_value: original.clone(),
            timestamp: Utc::now(),
        });
        self.redo_stack.clear();

        self.apply(id, &route, &current, &original);
        log::trace!("Reverted {id} to {original:?}");
        true
    }

    /// Restore every modified node and wipe all edit history. This is a hard
    /// reset, not a sequence of undoable reverts.
    pub fn revert_all(&mut self) {
        let mut pending: Vec<(NodeId, String)> = self
            .modifications
            .drain()
            .map(|(id, m)| (id, m.original_value))
            .collect();
        pending.sort_by_key(|(id, _)| *id);

        for (id, original) in &pending {
            if let Some((route, _)) = self.locate(*id) {
                self.replace_text(*id, &route, original);
            }
        }

        self.reset_history();
        log::trace!("Reverted all {} modifications", pending.len());
    }

    // ---- internals ------------------------------------------------------

    fn locate(&self, id: NodeId) -> Option<(Route, String)> {
        let root = self.root.as_ref()?;
        let route = traverse::route_to(root, id)?;
        let node = follow(root, &route);
        Some((route, node.text().to_string()))
    }

    /// Write `value` into the tree and bring the modification set in line.
    /// `current` is the node's text before the write.
    fn apply(&mut self, id: NodeId, route: &Route, current: &str, value: &str) {
        let Some(edited) = self.replace_text(id, route, value) else {
            return;
        };

        let original = self
            .modifications
            .get(&id)
            .map(|m| m.original_value.clone())
            .unwrap_or_else(|| current.to_string());

        if value == original {
            self.modifications.remove(&id);
            return;
        }

        self.modifications.insert(
            id,
            Modification {
                node_id: id,
                original_value: original,
                new_value: value.to_string(),
                timestamp: Utc::now(),
                kind: ModificationKind::TextContent,
                path: edited.path.clone(),
                node_name: edited.name.to_string(),
            },
        );
    }

    /// Swap in a new snapshot with node `id`'s text set to `value`, refresh
    /// the selection if it points at that node, and return the new node.
    fn replace_text(&mut self, id: NodeId, route: &Route, value: &str) -> Option<Arc<Node>> {
        let root = self.root.as_ref()?;
        let new_root = rebuild(root, route, value);
        let edited = follow(&new_root, route).clone();
        self.root = Some(new_root);

        if self.selected.as_ref().is_some_and(|s| s.id == id) {
            self.selected = Some(edited.clone());
        }
        Some(edited)
    }
}

fn follow<'a>(root: &'a Arc<Node>, route: &[usize]) -> &'a Arc<Node> {
    route
        .iter()
        .fold(root, |node, &index| &node.children[index])
}

/// Copy the nodes along `route`, sharing every other subtree.
fn rebuild(node: &Arc<Node>, route: &[usize], value: &str) -> Arc<Node> {
    match route.split_first() {
        None => Arc::new(node.with_text(value)),
        Some((&index, rest)) => {
            let mut copy = Node::clone(node);
            copy.children[index] = rebuild(&node.children[index], rest, value);
            Arc::new(copy)
        }
    }
}
