//! Order-preserving XML reading.
//!
//! Uses `quick-xml` to stream events into a `generational_arena`-backed
//! `RawDocument` in a single pass. Elements, text runs, CDATA sections,
//! comments, declarations and processing instructions are all kept, in
//! source order, with attributes in source order. Deciding which of these
//! end up in the node tree is the converter's job.
//!
//! Mismatched and stray end tags are rejected by the reader itself; elements
//! still open at end of input, and nesting deeper than
//! `ParseOptions::max_depth`, are rejected here. Every later pass over the
//! tree recurses per level, so the depth bound is what keeps them in stack.

use generational_arena::{Arena, Index};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use string_cache::DefaultAtom;

use crate::config::ParseOptions;
use crate::error::ParseError;

#[derive(Debug, Clone)]
pub enum RawNode {
    Element(RawElement),
    Text(String),
    CData(String),
    Comment(String),
    Declaration,
    ProcessingInstruction(String),
}

#[derive(Debug, Clone)]
pub struct RawElement {
    pub name: DefaultAtom,
    pub attributes: Vec<(DefaultAtom, String)>,
    pub children: Vec<Index>,
}

/// Flat arena holding every raw node, plus the ordered top-level entries.
#[derive(Debug, Default)]
pub struct RawDocument {
    pub nodes: Arena<RawNode>,
    pub top_level: Vec<Index>,
}

impl RawDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: RawNode) -> Index {
        self.nodes.insert(node)
    }

    /// Attach `child` to `parent`, or to the top level when there is no parent.
    pub fn append_child(&mut self, parent: Option<Index>, child: Index) {
        match parent {
            Some(parent_id) => {
                if let Some(RawNode::Element(data)) = self.nodes.get_mut(parent_id) {
                    data.children.push(child);
                }
            }
            None => self.top_level.push(child),
        }
    }

    pub fn get(&self, index: Index) -> Option<&RawNode> {
        self.nodes.get(index)
    }

    /// Top-level entries that are elements, in document order.
    pub fn top_level_elements(&self) -> impl Iterator<Item = (Index, &RawElement)> + '_ {
        self.top_level.iter().filter_map(|&index| match self.nodes.get(index) {
            Some(RawNode::Element(data)) => Some((index, data)),
            _ => None,
        })
    }
}

pub fn read_xml(xml: &str, options: &ParseOptions) -> Result<RawDocument, ParseError> {
    let mut doc = RawDocument::new();
    let mut reader = Reader::from_str(xml);
    let mut open: Vec<(Index, DefaultAtom)> = Vec::new();

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(err) => {
                return Err(ParseError::malformed(format!(
                    "{err} (at byte {})",
                    reader.buffer_position()
                )));
            }
        };
        let current_parent = open.last().map(|(index, _)| *index);

        if matches!(event, Event::Start(_) | Event::Empty(_)) && open.len() >= options.max_depth {
            return Err(ParseError::malformed(format!(
                "element nesting exceeds maximum depth of {} (at byte {})",
                options.max_depth,
                reader.buffer_position()
            )));
        }

        match event {
            Event::Start(tag) => {
                let element = read_element(&tag, options)?;
                let name = element.name.clone();
                let node_id = doc.add_node(RawNode::Element(element));
                doc.append_child(current_parent, node_id);
                open.push((node_id, name));
            }
            Event::Empty(tag) => {
                let element = read_element(&tag, options)?;
                let node_id = doc.add_node(RawNode::Element(element));
                doc.append_child(current_parent, node_id);
            }
            Event::End(_) => {
                open.pop();
            }
            Event::Text(text) => {
                let text = text.unescape()?;
                // Text outside the root element carries nothing but layout.
                if current_parent.is_none() {
                    continue;
                }
                let id = doc.add_node(RawNode::Text(text.into_owned()));
                doc.append_child(current_parent, id);
            }
            Event::CData(data) => {
                let content = String::from_utf8_lossy(&data).into_owned();
                let id = doc.add_node(RawNode::CData(content));
                doc.append_child(current_parent, id);
            }
            Event::Comment(comment) => {
                let content = String::from_utf8_lossy(&comment).into_owned();
                let id = doc.add_node(RawNode::Comment(content));
                doc.append_child(current_parent, id);
            }
            Event::Decl(_) => {
                let id = doc.add_node(RawNode::Declaration);
                doc.append_child(current_parent, id);
            }
            Event::PI(pi) => {
                let content = String::from_utf8_lossy(&pi).into_owned();
                let id = doc.add_node(RawNode::ProcessingInstruction(content));
                doc.append_child(current_parent, id);
            }
            Event::DocType(_) => {}
            Event::Eof => break,
        }
    }

    if let Some((_, name)) = open.last() {
        return Err(ParseError::malformed(format!(
            "unclosed element <{}> at end of input",
            &**name
        )));
    }

    Ok(doc)
}

fn read_element(tag: &BytesStart<'_>, options: &ParseOptions) -> Result<RawElement, ParseError> {
    let qname = tag.name();
    let name = std::str::from_utf8(qname.as_ref())
        .map_err(|err| ParseError::malformed(format!("invalid tag name: {err}")))?;

    let mut attributes = Vec::new();
    if !options.ignore_attributes {
        for attr in tag.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            let key = std::str::from_utf8(attr.key.as_ref())
                .map_err(|err| ParseError::malformed(format!("invalid attribute name: {err}")))?;
            let value = attr.unescape_value()?;
            attributes.push((DefaultAtom::from(key), value.into_owned()));
        }
    }

    Ok(RawElement {
        name: DefaultAtom::from(name),
        attributes,
        children: Vec::new(),
    })
}

/// Whether `xml` is accepted by the reader.
pub fn is_valid_xml(xml: &str) -> bool {
    read_xml(xml, &ParseOptions::default()).is_ok()
}
