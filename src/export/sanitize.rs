//! Attribute stripping and final serialization.

use crate::dom::{to_xml_string, Document, NodeId};
use log::debug;

/// Remove `data-*`, `class` and `id` from `root` and every element below it.
pub fn strip_attributes(doc: &mut Document, root: NodeId) -> usize {
    let mut removed = 0;
    for id in doc.elements(root) {
        let Some(element) = doc.element_mut(id) else {
            continue;
        };
        let before = element.attrs.len();
        element.attrs.retain(|a| !a.name.starts_with("data-"));
        element.attrs.retain(|a| a.name != "class");
        element.attrs.retain(|a| a.name != "id");
        removed += before - element.attrs.len();
    }
    debug!("Stripped {} attribute(s)", removed);
    removed
}

/// Strip attributes under `root` and serialize it.
pub fn sanitize_and_serialize(doc: &mut Document, root: NodeId) -> String {
    strip_attributes(doc, root);
    to_xml_string(doc, root)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_tracking_attributes_including_root() {
        let mut doc = Document::parse_html(
            r#"<section class="s" id="top" data-x="1"><p class="a" data-line="3" title="t">x</p></section>"#,
        );
        let section = doc.find_by_class(doc.root(), "s").unwrap();
        assert_eq!(strip_attributes(&mut doc, section), 5);

        for id in doc.elements(section) {
            let element = doc.element(id).unwrap();
            assert!(element
                .attrs
                .iter()
                .all(|a| a.name != "class" && a.name != "id" && !a.name.starts_with("data-")));
        }
        let p = doc.elements_by_tag(section, "p")[0];
        assert_eq!(doc.attr(p, "title"), Some("t"));
    }

    #[test]
    fn test_serialize_xml_style() {
        let mut doc = Document::parse_html(
            r#"<section class="s"><p style="color: red">a<br>b</p><div></div><img src="x.png" alt='say "hi"'></section>"#,
        );
        let section = doc.find_by_class(doc.root(), "s").unwrap();
        let html = sanitize_and_serialize(&mut doc, section);
        assert_eq!(
            html,
            r#"<section xmlns="http://www.w3.org/1999/xhtml"><p style="color: red">a<br />b</p><div></div><img src="x.png" alt="say &quot;hi&quot;" /></section>"#
        );
    }
}
