//! XML-style serialization.
//!
//! Output follows the shape of a browser `XMLSerializer` run over HTML
//! elements: every attribute value is double-quoted, void elements are
//! self-closed (`<br />`), empty non-void elements get an explicit end tag
//! and the outermost element declares the XHTML namespace.

use super::{Document, NodeId, NodeKind};

/// Namespace declared on the serialized root element.
pub const XHTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Elements that never have content.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

/// Serialize `id` and its subtree.
pub fn to_xml_string(doc: &Document, id: NodeId) -> String {
    let mut out = String::new();
    write_node(doc, id, &mut out, true);
    out
}

fn write_node(doc: &Document, id: NodeId, out: &mut String, is_root: bool) {
    match doc.node(id).kind() {
        NodeKind::Document => {
            for &child in doc.children(id) {
                write_node(doc, child, out, is_root);
            }
        }
        NodeKind::Text(text) => out.push_str(&escape_text(text)),
        NodeKind::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        NodeKind::Element(element) => {
            out.push('<');
            out.push_str(&element.name);
            let declares_ns = element.attrs.iter().any(|a| a.name == "xmlns");
            if is_root && !declares_ns {
                out.push_str(" xmlns=\"");
                out.push_str(XHTML_NAMESPACE);
                out.push('"');
            }
            for attr in &element.attrs {
                out.push(' ');
                out.push_str(&attr.name);
                out.push_str("=\"");
                out.push_str(&escape_attribute(&attr.value));
                out.push('"');
            }

            let children = doc.children(id);
            if children.is_empty() && is_void(&element.name) {
                out.push_str(" />");
                return;
            }
            out.push('>');
            for &child in children {
                write_node(doc, child, out, false);
            }
            out.push_str("</");
            out.push_str(&element.name);
            out.push('>');
        }
    }
}

/// Escape character data.
pub fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape a double-quoted attribute value.
pub fn escape_attribute(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#9;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn serialize_first(html: &str, tag: &str) -> String {
        let doc = Document::parse_html(html);
        let id = doc.elements_by_tag(doc.root(), tag)[0];
        to_xml_string(&doc, id)
    }

    #[test]
    fn test_void_elements_self_close() {
        let xml = serialize_first("<section><p>a<br>b</p><img src=\"x.png\"></section>", "section");
        assert!(xml.contains("<br />"));
        assert!(xml.contains("<img src=\"x.png\" />"));
    }

    #[test]
    fn test_root_declares_namespace() {
        let xml = serialize_first("<section><p>a</p></section>", "section");
        assert_eq!(
            xml,
            "<section xmlns=\"http://www.w3.org/1999/xhtml\"><p>a</p></section>"
        );
    }

    #[test]
    fn test_empty_element_gets_end_tag() {
        let xml = serialize_first("<section><div></div></section>", "section");
        assert!(xml.contains("<div></div>"));
    }

    #[test]
    fn test_escaping() {
        let xml = serialize_first(r#"<p title="a &quot;b&quot; &amp; c">1 &lt; 2 &amp; 3</p>"#, "p");
        assert!(xml.contains(r#"title="a &quot;b&quot; &amp; c""#));
        assert!(xml.contains("1 &lt; 2 &amp; 3"));
    }

    #[test]
    fn test_escape_attribute_whitespace() {
        assert_eq!(escape_attribute("a\nb\tc"), "a&#10;b&#9;c");
    }
}
