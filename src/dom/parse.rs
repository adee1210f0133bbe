//! HTML parsing through html5ever.
//!
//! The input is parsed into an `RcDom` and then copied into the arena, so the
//! rest of the crate never deals with `Rc`/`RefCell` handles.

use super::{Attribute, Document, Element, NodeId, NodeKind};
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

impl Document {
    /// Parse a full HTML document (or anything html5ever can recover into one).
    pub fn parse_html(input: &str) -> Document {
        let dom = parse_document(RcDom::default(), Default::default()).one(input);
        let mut doc = Document::new();
        let root = doc.root();
        import_children(&mut doc, root, &dom.document);
        doc
    }

    /// Parse markup meant for an element's content.
    ///
    /// The markup is placed in a body so html5ever treats it as flow content;
    /// the nodes end up under the returned document's `<body>`.
    pub(crate) fn parse_fragment(markup: &str) -> Document {
        Document::parse_html(&format!("<!DOCTYPE html><html><head></head><body>{markup}</body></html>"))
    }
}

fn import_children(doc: &mut Document, parent: NodeId, handle: &Handle) {
    for child in handle.children.borrow().iter() {
        let id = match &child.data {
            NodeData::Element { name, attrs, .. } => {
                let attrs = attrs
                    .borrow()
                    .iter()
                    .map(|a| Attribute {
                        name: match &a.name.prefix {
                            Some(prefix) => format!("{}:{}", prefix, a.name.local),
                            None => a.name.local.to_string(),
                        },
                        value: a.value.to_string(),
                    })
                    .collect();
                let element = Element {
                    name: name.local.to_string().to_ascii_lowercase(),
                    attrs,
                };
                let id = doc.push(NodeKind::Element(element), None);
                import_children(doc, id, child);
                id
            }
            NodeData::Text { contents } => doc.create_text(&contents.borrow()),
            NodeData::Comment { contents } => doc.create_comment(contents),
            NodeData::Document | NodeData::Doctype { .. } | NodeData::ProcessingInstruction { .. } => {
                continue
            }
        };
        doc.append_child(parent, id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wraps_in_html_body() {
        let doc = Document::parse_html("<p>hi</p>");
        let html = doc.first_element_child(doc.root()).unwrap();
        assert_eq!(doc.tag_name(html), Some("html"));
        assert_eq!(doc.elements_by_tag(html, "body").len(), 1);
        assert_eq!(doc.text_content(html), "hi");
    }

    #[test]
    fn test_parse_keeps_attributes_in_order() {
        let doc = Document::parse_html(r#"<img src="x.png" alt="x" data-id="7">"#);
        let img = doc.elements_by_tag(doc.root(), "img")[0];
        let names: Vec<&str> = doc
            .element(img)
            .unwrap()
            .attrs
            .iter()
            .map(|a| a.name.as_str())
            .collect();
        assert_eq!(names, vec!["src", "alt", "data-id"]);
    }

    #[test]
    fn test_parse_decodes_entities() {
        let doc = Document::parse_html("<p>a &amp; b &lt;c&gt;</p>");
        assert_eq!(doc.text_content(doc.root()), "a & b <c>");
    }
}
