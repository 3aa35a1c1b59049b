//! Raw XML to node tree conversion.
//!
//! Walks the `RawDocument` arena in document order, issuing ids pre-order
//! from a `ParseSession` and computing each element's path from its parent's
//! path and its index among same-named siblings.
//!
//! - An element's text is its direct text runs, each trimmed, joined by one
//!   space. Descendant text is not included.
//! - CDATA sections become `cdata` children named `CDATA`.
//! - Comments, declarations and processing instructions are dropped.
//! - Several top-level elements are wrapped in a synthetic `root` element.
//!   Only elements count: an XML declaration, comments or processing
//!   instructions beside a single root element do not trigger the wrapper,
//!   so a CLDR file is rooted at its `ldml` element. Hosts that used to see
//!   a `root` wrapper around every declared file no longer do. Paths are
//!   unaffected, since the wrapper's children start at `/`.

use std::sync::Arc;

use generational_arena::Index;
use string_cache::DefaultAtom;

use crate::config::ParseOptions;
use crate::dom::{Node, NodeId, NodeKind};
use crate::error::ParseError;
use crate::session::{ParseSession, ROOT_PATH, SiblingCounter, build_path, cdata_path};
use crate::traverse;
use crate::xml::{RawDocument, RawElement, RawNode, read_xml};

pub const SYNTHETIC_ROOT_NAME: &str = "root";
pub const CDATA_NODE_NAME: &str = "CDATA";

/// Validate, read and convert a complete XML document.
pub fn parse_xml_string(xml: &str, options: &ParseOptions) -> Result<Arc<Node>, ParseError> {
    if xml.trim().is_empty() {
        return Err(ParseError::Empty);
    }
    if xml.len() > options.max_bytes {
        return Err(ParseError::TooLarge {
            limit: options.max_bytes,
        });
    }

    let raw = read_xml(xml, options)?;
    let mut session = ParseSession::new();
    let root = convert_document(&raw, &mut session).ok_or(ParseError::NoRoot)?;

    log::debug!(
        "Parsed XML document: root <{}>, {} nodes",
        &*root.name,
        traverse::pre_order(&root).count()
    );
    Ok(root)
}

/// Convert a raw document. `None` when it holds no element at all.
pub fn convert_document(raw: &RawDocument, session: &mut ParseSession) -> Option<Arc<Node>> {
    let top: Vec<(Index, &RawElement)> = raw.top_level_elements().collect();

    match top.as_slice() {
        [] => None,
        [(_, element)] => {
            let mut siblings = session.sibling_scope();
            Some(convert_element(
                raw,
                element,
                ROOT_PATH,
                None,
                &mut siblings,
                session,
            ))
        }
        _ => {
            let root_id = session.generate_id();
            let mut siblings = session.sibling_scope();
            let children = top
                .iter()
                .map(|(_, element)| {
                    convert_element(
                        raw,
                        element,
                        ROOT_PATH,
                        Some(root_id),
                        &mut siblings,
                        session,
                    )
                })
                .collect();

            let mut root = Node::element(
                root_id,
                DefaultAtom::from(SYNTHETIC_ROOT_NAME),
                ROOT_PATH.to_string(),
                None,
            );
            root.children = children;
            Some(Arc::new(root))
        }
    }
}

fn convert_element(
    raw: &RawDocument,
    element: &RawElement,
    parent_path: &str,
    parent_id: Option<NodeId>,
    siblings: &mut SiblingCounter,
    session: &mut ParseSession,
) -> Arc<Node> {
    let id = session.generate_id();
    let index = siblings.next_index(&element.name);
    let path = build_path(parent_path, &element.name, index);

    let mut text: Option<String> = None;
    let mut children = Vec::new();
    let mut child_siblings = session.sibling_scope();

    for &child_index in &element.children {
        match raw.get(child_index) {
            Some(RawNode::Text(fragment)) => {
                let fragment = fragment.trim();
                if fragment.is_empty() {
                    continue;
                }
                match text.as_mut() {
                    Some(existing) => {
                        existing.push(' ');
                        existing.push_str(fragment);
                    }
                    None => text = Some(fragment.to_string()),
                }
            }
            Some(RawNode::CData(content)) => {
                children.push(Arc::new(Node {
                    id: session.generate_id(),
                    name: DefaultAtom::from(CDATA_NODE_NAME),
                    kind: NodeKind::Cdata,
                    attributes: Vec::new(),
                    text_content: Some(content.clone()),
                    children: Vec::new(),
                    path: cdata_path(&path),
                    parent_id: Some(id),
                }));
            }
            Some(RawNode::Element(child)) => {
                children.push(convert_element(
                    raw,
                    child,
                    &path,
                    Some(id),
                    &mut child_siblings,
                    session,
                ));
            }
            Some(RawNode::Comment(_))
            | Some(RawNode::Declaration)
            | Some(RawNode::ProcessingInstruction(_))
            | None => {}
        }
    }

    let mut node = Node::element(id, element.name.clone(), path, parent_id);
    node.attributes = element.attributes.clone();
    node.text_content = text;
    node.children = children;
    Arc::new(node)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(xml: &str) -> Arc<Node> {
        parse_xml_string(xml, &ParseOptions::default()).unwrap()
    }

    fn ids_and_paths(root: &Arc<Node>) -> Vec<(NodeId, String)> {
        traverse::pre_order(root)
            .map(|n| (n.id, n.path.clone()))
            .collect()
    }

    #[test]
    fn ldml_scenario_paths_and_text() {
        let root = parse(
            r#"<ldml><identity><version number="1"/></identity><numbers><symbols><decimal>.</decimal></symbols></numbers></ldml>"#,
        );
        assert_eq!(root.path, "/ldml");
        assert_eq!(root.parent_id, None);

        let decimal = traverse::find_first(&root, |n| &*n.name == "decimal").unwrap();
        assert_eq!(decimal.path, "/ldml/numbers/symbols/decimal");
        assert_eq!(decimal.text_content.as_deref(), Some("."));

        let version = traverse::find_first(&root, |n| &*n.name == "version").unwrap();
        assert_eq!(version.attribute("number"), Some("1"));
        assert_eq!(version.text_content, None);
        assert!(version.is_leaf());
    }

    #[test]
    fn ids_are_pre_order_and_deterministic() {
        let xml = "<a><b><c/></b><b/><d>t</d></a>";
        let first = ids_and_paths(&parse(xml));
        let second = ids_and_paths(&parse(xml));
        assert_eq!(first, second);
        let ids: Vec<u32> = first.iter().map(|(id, _)| id.0).collect();
        assert_eq!(ids, [1, 2, 3, 4, 5]);
        let paths: Vec<&str> = first.iter().map(|(_, p)| p.as_str()).collect();
        assert_eq!(paths, ["/a", "/a/b", "/a/b/c", "/a/b[1]", "/a/d"]);
    }

    #[test]
    fn sibling_disambiguation_is_per_parent() {
        let root = parse(r#"<p><day type="mon"/><day type="tue"/><x><day/></x></p>"#);
        let paths: Vec<&str> = traverse::pre_order(&root).map(|n| n.path.as_str()).collect();
        assert_eq!(paths, ["/p", "/p/day", "/p/day[1]", "/p/x", "/p/x/day"]);
    }

    #[test]
    fn multiple_top_level_elements_get_synthetic_root() {
        let root = parse("<first/><second/>");
        assert_eq!(&*root.name, "root");
        assert_eq!(root.path, "/");
        assert_eq!(root.kind, NodeKind::Element);
        let paths: Vec<&str> = root.children.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, ["/first", "/second"]);
        assert!(root.children.iter().all(|c| c.parent_id == Some(root.id)));

        let repeated = parse("<a/><a/>");
        let paths: Vec<&str> = repeated.children.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, ["/a", "/a[1]"]);
    }

    #[test]
    fn declaration_and_comments_do_not_create_root() {
        let root = parse("<?xml version=\"1.0\"?>\n<!DOCTYPE ldml>\n<!-- header -->\n<ldml><!-- c --><a>x</a></ldml>");
        assert_eq!(&*root.name, "ldml");
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].text(), "x");
    }

    #[test]
    fn text_fragments_trimmed_and_joined() {
        let root = parse("<a>\n  one <b>inner</b>  two\n</a>");
        assert_eq!(root.text(), "one two");
        assert_eq!(root.children[0].text(), "inner");
    }

    #[test]
    fn cdata_becomes_child_node() {
        let root = parse("<a><note><![CDATA[ <b>raw</b> ]]></note></a>");
        let note = &root.children[0];
        assert_eq!(note.children.len(), 1);
        let cdata = &note.children[0];
        assert_eq!(cdata.kind, NodeKind::Cdata);
        assert_eq!(&*cdata.name, "CDATA");
        assert_eq!(cdata.text(), " <b>raw</b> ");
        assert_eq!(cdata.path, "/a/note/cdata()");
        assert_eq!(cdata.parent_id, Some(note.id));
        assert_eq!(note.text_content, None);
    }

    #[test]
    fn input_validation_errors() {
        let options = ParseOptions::default();
        assert_eq!(parse_xml_string("", &options), Err(ParseError::Empty));
        assert_eq!(parse_xml_string("  \n\t", &options), Err(ParseError::Empty));

        let small = ParseOptions {
            max_bytes: 8,
            ..ParseOptions::default()
        };
        assert_eq!(
            parse_xml_string("<abc>defgh</abc>", &small),
            Err(ParseError::TooLarge { limit: 8 })
        );

        let err = parse_xml_string("<a><b></a>", &options).unwrap_err();
        assert!(err.to_string().starts_with("XML parsing failed: "));

        assert_eq!(
            parse_xml_string("<?xml version=\"1.0\"?><!-- only -->", &options),
            Err(ParseError::NoRoot)
        );
    }

    #[test]
    fn independent_sessions_do_not_share_counters() {
        let raw = read_xml("<a><b/></a>", &ParseOptions::default()).unwrap();
        let mut one = ParseSession::new();
        let mut two = ParseSession::new();
        let first = convert_document(&raw, &mut one).unwrap();
        let again = convert_document(&raw, &mut one).unwrap();
        let fresh = convert_document(&raw, &mut two).unwrap();
        assert_eq!(first, fresh);
        assert_ne!(first.id, again.id);
    }
}
