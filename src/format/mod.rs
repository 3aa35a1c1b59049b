//! Display helpers and XML export for nodes.

use quick_xml::Writer;
use quick_xml::events::{BytesCData, BytesEnd, BytesStart, BytesText, Event};

use crate::convert::SYNTHETIC_ROOT_NAME;
use crate::dom::{Node, NodeKind};
use crate::error::ExportError;
use crate::session::ROOT_PATH;

/// Attributes checked, in order, when naming an element for display.
const IDENTIFYING_ATTRIBUTES: [&str; 5] = ["id", "name", "type", "key", "class"];

pub fn kind_label(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Element => "Element",
        NodeKind::Text => "Text",
        NodeKind::Comment => "Comment",
        NodeKind::Cdata => "CDATA Section",
        NodeKind::ProcessingInstruction => "Processing Instruction",
    }
}

/// `k="v"` pairs separated by spaces, or `None`.
pub fn format_attributes(node: &Node) -> String {
    if node.attributes.is_empty() {
        return "None".to_string();
    }
    node.attributes
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", &**k, v))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Cut `text` to at most `max_chars` characters, marking the cut with `...`.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Short label for a tree row: tag plus its most identifying attribute, or
/// a short text value for leaves.
pub fn display_name(node: &Node) -> String {
    if node.kind != NodeKind::Element {
        return node.name.to_string();
    }

    for attr in IDENTIFYING_ATTRIBUTES {
        if let Some(value) = node.attribute(attr).filter(|v| !v.is_empty()) {
            return format!("{} [{}=\"{}\"]", &*node.name, attr, truncate_text(value, 20));
        }
    }

    if let Some(text) = node.text_content.as_deref() {
        if text.chars().count() <= 30 && node.is_leaf() {
            return format!("{}: \"{}\"", &*node.name, truncate_text(text, 20));
        }
    }

    node.name.to_string()
}

pub fn count_nodes(node: &Node) -> usize {
    1 + node.children.iter().map(|c| count_nodes(c)).sum::<usize>()
}

/// Number of non-empty path segments.
pub fn node_depth(node: &Node) -> usize {
    node.path.split('/').filter(|p| !p.is_empty()).count()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeStats {
    pub total_nodes: usize,
    pub depth: usize,
    pub child_count: usize,
    pub attribute_count: usize,
    pub has_text_content: bool,
}

pub fn stats(node: &Node) -> NodeStats {
    NodeStats {
        total_nodes: count_nodes(node),
        depth: node_depth(node),
        child_count: node.children.len(),
        attribute_count: node.attributes.len(),
        has_text_content: !node.text().trim().is_empty(),
    }
}

/// e.g. `2 attributes, 1 child` or `text content`.
pub fn summary(node: &Node) -> String {
    let stats = stats(node);
    let mut parts = Vec::new();

    if stats.attribute_count > 0 {
        let plural = if stats.attribute_count == 1 { "" } else { "s" };
        parts.push(format!("{} attribute{plural}", stats.attribute_count));
    }
    if stats.child_count > 0 {
        let plural = if stats.child_count == 1 { "" } else { "ren" };
        parts.push(format!("{} child{plural}", stats.child_count));
    }
    if stats.has_text_content && stats.child_count == 0 {
        parts.push("text content".to_string());
    }

    if parts.is_empty() {
        "empty element".to_string()
    } else {
        parts.join(", ")
    }
}

/// Indented XML text for the tree rooted at `node`. The synthetic root
/// produced for multi-root documents is not emitted.
pub fn to_xml_string(node: &Node) -> Result<String, ExportError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    if node.path == ROOT_PATH && &*node.name == SYNTHETIC_ROOT_NAME {
        for child in &node.children {
            write_node(&mut writer, child)?;
        }
    } else {
        write_node(&mut writer, node)?;
    }
    Ok(String::from_utf8(writer.into_inner())?)
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &Node) -> Result<(), ExportError> {
    if node.kind == NodeKind::Cdata {
        writer.write_event(Event::CData(BytesCData::new(node.text())))?;
        return Ok(());
    }

    let mut start = BytesStart::new(&*node.name);
    for (k, v) in &node.attributes {
        start.push_attribute((&**k, v.as_str()));
    }

    if node.text_content.is_none() && node.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    if let Some(text) = node.text_content.as_deref() {
        writer.write_event(Event::Text(BytesText::new(text)))?;
    }
    for child in &node.children {
        write_node(writer, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new(&*node.name)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_xml_str;
    use crate::traverse::find_first;

    #[test]
    fn labels_and_attributes() {
        assert_eq!(kind_label(NodeKind::Cdata), "CDATA Section");
        let root = parse_xml_str(r#"<a x="1" y="&quot;"/>"#).unwrap();
        assert_eq!(format_attributes(&root), "x=\"1\" y=\"\"\"");
        let bare = parse_xml_str("<a/>").unwrap();
        assert_eq!(format_attributes(&bare), "None");
    }

    #[test]
    fn truncation_is_char_aware() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("abcdef", 3), "abc...");
        assert_eq!(truncate_text("日本語テキスト", 3), "日本語...");
    }

    #[test]
    fn display_names() {
        let root = parse_xml_str(
            r#"<ldml><month type="1">January</month><decimal>.</decimal><dates><x/></dates><note><![CDATA[c]]></note></ldml>"#,
        )
        .unwrap();
        let month = find_first(&root, |n| &*n.name == "month").unwrap();
        assert_eq!(display_name(month), r#"month [type="1"]"#);
        let decimal = find_first(&root, |n| &*n.name == "decimal").unwrap();
        assert_eq!(display_name(decimal), r#"decimal: ".""#);
        let dates = find_first(&root, |n| &*n.name == "dates").unwrap();
        assert_eq!(display_name(dates), "dates");
        let cdata = find_first(&root, |n| n.kind == NodeKind::Cdata).unwrap();
        assert_eq!(display_name(cdata), "CDATA");
    }

    #[test]
    fn stats_and_summary() {
        let root = parse_xml_str(r#"<a k="v" j="w"><b>t</b><c/></a>"#).unwrap();
        assert_eq!(count_nodes(&root), 3);
        assert_eq!(node_depth(&root), 1);
        assert_eq!(summary(&root), "2 attributes, 2 children");
        assert_eq!(summary(&root.children[0]), "text content");
        assert_eq!(summary(&root.children[1]), "empty element");
        assert_eq!(stats(&root.children[0]).depth, 2);
    }

    #[test]
    fn export_round_trips_through_parser() {
        let xml = r#"<ldml><numbers><symbols numberSystem="latn"><decimal>&lt;.&gt;</decimal><group/></symbols></numbers><note><![CDATA[x < y]]></note></ldml>"#;
        let root = parse_xml_str(xml).unwrap();
        let exported = to_xml_string(&root).unwrap();
        assert!(exported.starts_with("<ldml>"));
        assert!(exported.contains("\n  <numbers>"));
        assert!(exported.contains(r#"<symbols numberSystem="latn">"#));
        assert!(exported.contains("<decimal>&lt;.&gt;</decimal>"));
        assert!(exported.contains("<group/>"));
        assert!(exported.contains("<![CDATA[x < y]]>"));
        let reparsed = parse_xml_str(&exported).unwrap();
        assert_eq!(reparsed, root);
    }

    #[test]
    fn export_escapes_quotes_and_ampersands() {
        let xml = r#"<quotes start="&quot;" alt="it&apos;s"><q>Tom &amp; Jerry's</q></quotes>"#;
        let root = parse_xml_str(xml).unwrap();
        let exported = to_xml_string(&root).unwrap();
        assert!(!exported.contains(r#"start="""#));
        assert!(exported.contains("&amp;"));
        let reparsed = parse_xml_str(&exported).unwrap();
        assert_eq!(reparsed.attribute("start"), Some("\""));
        assert_eq!(reparsed.attribute("alt"), Some("it's"));
        assert_eq!(reparsed, root);
    }

    #[test]
    fn synthetic_root_is_transparent() {
        let root = parse_xml_str("<a/><b>t</b>").unwrap();
        let exported = to_xml_string(&root).unwrap();
        assert!(exported.starts_with("<a/>"));
        assert!(exported.contains("<b>t</b>"));
        assert!(!exported.contains("<root"));
        assert_eq!(parse_xml_str(&exported).unwrap(), root);
    }
}
