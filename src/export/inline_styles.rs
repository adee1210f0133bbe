//! Copies resolved style onto the working tree as inline `style`.

use crate::dom::{Document, NodeId};
use crate::style::{ComputedStyleSource, InlineStyle, SNAPSHOT_PROPERTIES};
use log::{debug, warn};

/// Write resolved values for the snapshot properties onto every element
/// under `working_root`, reading from the source element each one was
/// cloned from.
///
/// A property already stated inline on the working element (directly or via
/// a shorthand) is never overwritten. Returns the number of elements styled.
pub fn snapshot_styles(
    working: &mut Document,
    working_root: NodeId,
    source: &Document,
    source_root: NodeId,
    styles: &dyn ComputedStyleSource,
) -> usize {
    let working_elements = working.elements(working_root);
    let source_count = source.elements(source_root).len();

    let mut paired = 0;
    let mut unpaired = 0;
    let mut styled = 0;

    for id in working_elements {
        let Some(origin) = working
            .origin(id)
            .filter(|&o| {
                source.element(o).is_some()
                    && (o == source_root || source.is_descendant_of(o, source_root))
            })
        else {
            unpaired += 1;
            continue;
        };
        paired += 1;

        let Some(computed) = styles.computed_style(origin) else {
            continue;
        };

        let mut inline = InlineStyle::of(working, id);
        let mut changed = false;
        for &property in SNAPSHOT_PROPERTIES {
            if inline.has_explicit(property) {
                continue;
            }
            if let Some(value) = computed.get(property) {
                inline.set(property, value);
                changed = true;
            }
        }
        if changed {
            inline.write_to(working, id);
            styled += 1;
        }
    }

    if unpaired > 0 || paired != source_count {
        warn!(
            "Working tree has {} element(s), source has {}: styles may be incomplete",
            paired + unpaired,
            source_count
        );
    }
    debug!("Snapshotted styles onto {} element(s)", styled);
    styled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{Cascade, ComputedStyle, StyleMap};

    fn setup(html: &str, css: &str) -> (Document, StyleMap, Document) {
        let source = Document::parse_html(html);
        let mut cascade = Cascade::new();
        cascade.add_author_css(css);
        let styles = cascade.compute(&source);
        let section = source.find_by_class(source.root(), "s").unwrap();
        let working = source.clone_subtree(section);
        (source, styles, working)
    }

    fn section_ids(source: &Document, working: &Document) -> (NodeId, NodeId) {
        (
            working.find_by_class(working.root(), "s").unwrap(),
            source.find_by_class(source.root(), "s").unwrap(),
        )
    }

    #[test]
    fn test_snapshot_copies_resolved_values() {
        let (source, styles, mut working) = setup(
            r#"<section class="s"><p class="lead">Hi</p></section>"#,
            ".s { color: #333; } .lead { font-size: 18px; margin: 0 0 8px 0; }",
        );
        let (w_root, s_root) = section_ids(&source, &working);
        snapshot_styles(&mut working, w_root, &source, s_root, &styles);

        let p = working.elements_by_tag(w_root, "p")[0];
        let style = InlineStyle::of(&working, p);
        assert_eq!(style.get("color"), Some("#333"));
        assert_eq!(style.get("font-size"), Some("18px"));
        assert_eq!(style.get("margin"), Some("0 0 8px 0"));
        // Covered by the shorthand already written.
        assert_eq!(style.get("margin-bottom"), None);
        assert_eq!(style.get("display"), Some("block"));
    }

    #[test]
    fn test_snapshot_never_overrides_inline() {
        let (source, styles, mut working) = setup(
            r#"<section class="s"><p style="color: red; border-left: 2px solid blue">Hi</p></section>"#,
            "p { color: green; border: 1px solid black; }",
        );
        let (w_root, s_root) = section_ids(&source, &working);
        snapshot_styles(&mut working, w_root, &source, s_root, &styles);

        let p = working.elements_by_tag(w_root, "p")[0];
        let style = InlineStyle::of(&working, p);
        assert_eq!(style.get("color"), Some("red"));
        assert_eq!(style.get("border-left"), Some("2px solid blue"));
        assert_eq!(style.get("border-left-color"), None);
        assert_eq!(style.get("border"), None);
        assert_eq!(style.get("border-top-color"), Some("black"));
    }

    #[test]
    fn test_snapshot_skips_synthesized_nodes() {
        let (source, styles, mut working) = setup(
            r#"<section class="s"><p>Hi</p></section>"#,
            "p { color: green; }",
        );
        let (w_root, s_root) = section_ids(&source, &working);
        let extra = working.create_element("span");
        working.append_child(w_root, extra);

        let styled = snapshot_styles(&mut working, w_root, &source, s_root, &styles);
        assert_eq!(styled, 2);
        assert_eq!(working.attr(extra, "style"), None);
    }

    #[test]
    fn test_snapshot_with_custom_source() {
        struct Fixed(ComputedStyle);
        impl ComputedStyleSource for Fixed {
            fn computed_style(&self, _node: NodeId) -> Option<&ComputedStyle> {
                Some(&self.0)
            }
        }

        let source = Document::parse_html(r#"<div class="s"><em>x</em></div>"#);
        let s_root = source.find_by_class(source.root(), "s").unwrap();
        let mut working = source.clone_subtree(s_root);
        let w_root = working.find_by_class(working.root(), "s").unwrap();

        let fixed = Fixed(ComputedStyle::from_pairs([("color", "teal"), ("transform", "none")]));
        snapshot_styles(&mut working, w_root, &source, s_root, &fixed);

        let em = working.elements_by_tag(w_root, "em")[0];
        assert_eq!(working.attr(em, "style"), Some("color: teal;"));
    }
}
