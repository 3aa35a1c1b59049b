//! ldml-core: the document model behind a CLDR locale-file viewer.
//!
//! Reads an XML document (typically an LDML locale file) into an immutable,
//! path-addressable node tree, and keeps an editable session over that tree:
//! text edits, a modification set recording original versus current values,
//! linear undo/redo, and reverting. Edits never re-parse; they produce new
//! tree snapshots that share all untouched subtrees with the old one.
//!
//! This crate is a library. Fetching files, rendering the tree, and CLDR
//! lookup tables belong to the host application, which hands in complete
//! XML strings and reads nodes back out.

pub mod config;
pub mod convert;
pub mod dom;
pub mod edit;
pub mod error;
pub mod format;
pub mod related;
pub mod session;
pub mod traverse;
pub mod xml;

use std::sync::Arc;

pub use config::{MAX_FILE_SIZE, ParseOptions, PathMatch, RelatedOptions, Settings};
pub use convert::parse_xml_string;
pub use dom::{Node, NodeId, NodeKind};
pub use edit::{ActionKind, EditDocument, Modification, ModificationKind, UndoAction};
pub use error::{ConfigError, ExportError, ParseError};
pub use related::{RelatedElement, find_related};
pub use xml::is_valid_xml;

/// Parse with default options.
pub fn parse_xml_str(xml: &str) -> Result<Arc<Node>, ParseError> {
    parse_xml_string(xml, &ParseOptions::default())
}
