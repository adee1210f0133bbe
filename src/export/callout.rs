//! Callout widgets: literal theming and replacement by portable blockquotes.
//!
//! Callouts are themed through custom properties (`--callout-color`,
//! `--callout-background`, `--callout-border-width`) that paste targets
//! cannot resolve, so both passes turn them into literal values read from
//! the source element's resolved style.

use crate::dom::{Document, NodeId};
use crate::style::{ComputedStyle, ComputedStyleSource, InlineStyle};
use log::{debug, warn};

pub const TITLE_CLASS: &str = "callout-title-inner";
pub const CONTENT_CLASS: &str = "callout-content";

/// Defaults used when neither custom properties nor resolved style give a
/// value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalloutPalette {
    pub accent: &'static str,
    pub background: &'static str,
    pub border_width: &'static str,
}

/// Neutral grey, used when theming callouts in place.
pub const STYLED_BOX_PALETTE: CalloutPalette = CalloutPalette {
    accent: "#d0d7de",
    background: "#f6f8fa",
    border_width: "4px",
};

/// Blue accent, used when rebuilding callouts as blockquotes.
pub const BLOCKQUOTE_PALETTE: CalloutPalette = CalloutPalette {
    accent: "#3b82f6",
    background: "rgba(59,130,246,0.08)",
    border_width: "4px",
};

const BLOCKQUOTE_RADIUS: &str = "8px";

/// Literal colors for one callout.
struct CalloutColors {
    accent: String,
    background: String,
    border_width: String,
}

impl CalloutColors {
    fn resolve(computed: &ComputedStyle, palette: CalloutPalette) -> Self {
        let accent = computed
            .get("--callout-color")
            .or_else(|| computed.get("border-left-color"))
            .unwrap_or(palette.accent);
        let background = computed
            .get("--callout-background")
            .or_else(|| computed.get("background-color"))
            .unwrap_or(palette.background);
        let border_width = computed
            .get("--callout-border-width")
            .unwrap_or(palette.border_width);
        Self {
            accent: accent.to_string(),
            background: background.to_string(),
            border_width: border_width.to_string(),
        }
    }
}

/// Working callouts under `root` paired with their source's resolved style.
fn callout_pairs<'a>(
    working: &Document,
    root: NodeId,
    styles: &'a dyn ComputedStyleSource,
    callout_class: &str,
) -> Vec<(NodeId, &'a ComputedStyle)> {
    let mut pairs = Vec::new();
    for id in working.elements_with_class(root, callout_class) {
        match working.origin(id).and_then(|o| styles.computed_style(o)) {
            Some(computed) => pairs.push((id, computed)),
            None => warn!("Callout without a resolved source style, leaving it as is"),
        }
    }
    pairs
}

/// Give each callout a literal left border and background, and copy its
/// border radius, unless the working element already states them inline.
pub fn apply_callout_fallback_styles(
    working: &mut Document,
    root: NodeId,
    styles: &dyn ComputedStyleSource,
    callout_class: &str,
) -> usize {
    let pairs = callout_pairs(working, root, styles, callout_class);
    for &(id, computed) in &pairs {
        let colors = CalloutColors::resolve(computed, STYLED_BOX_PALETTE);
        let mut inline = InlineStyle::of(working, id);

        if !inline.has_explicit("border-left") {
            inline.set(
                "border-left",
                &format!("{} solid {}", colors.border_width, colors.accent),
            );
        }
        if !inline.has_explicit("background") && !inline.has_explicit("background-color") {
            inline.set("background-color", &colors.background);
        }
        if !inline.has_explicit("border-radius") {
            if let Some(radius) = computed.get("border-radius") {
                inline.set("border-radius", radius);
            }
        }
        inline.write_to(working, id);
    }
    debug!("Applied fallback styles to {} callout(s)", pairs.len());
    pairs.len()
}

/// Replace each callout with a `<blockquote>` holding its title and content.
///
/// Nested callouts are handled innermost first, so an outer callout's
/// content already carries the replaced inner ones.
pub fn replace_callouts_with_blockquotes(
    working: &mut Document,
    root: NodeId,
    styles: &dyn ComputedStyleSource,
    callout_class: &str,
) -> usize {
    let pairs = callout_pairs(working, root, styles, callout_class);
    for &(callout, computed) in pairs.iter().rev() {
        let colors = CalloutColors::resolve(computed, BLOCKQUOTE_PALETTE);
        let radius = computed.get("border-radius").unwrap_or(BLOCKQUOTE_RADIUS);

        let blockquote = working.create_element("blockquote");
        working.set_attr(
            blockquote,
            "style",
            &format!(
                "margin: 1em 0; padding: 12px 14px; border-left: {} solid {}; background: {}; border-radius: {};",
                colors.border_width, colors.accent, colors.background, radius
            ),
        );

        let title = working
            .find_by_class(callout, TITLE_CLASS)
            .map(|t| working.text_content(t).trim().to_string())
            .filter(|t| !t.is_empty());
        if let Some(title) = title {
            let p = working.create_element("p");
            working.set_attr(
                p,
                "style",
                &format!("margin: 0 0 6px 0; font-weight: 700; color: {};", colors.accent),
            );
            let text = working.create_text(&title);
            working.append_child(p, text);
            working.append_child(blockquote, p);
        }

        if let Some(content) = working.find_by_class(callout, CONTENT_CLASS) {
            let wrap = working.create_element("div");
            for child in working.children(content).to_vec() {
                let copy = working.deep_copy(child);
                working.append_child(wrap, copy);
            }
            working.append_child(blockquote, wrap);
        }

        working.replace(callout, blockquote);
    }
    debug!("Replaced {} callout(s) with blockquotes", pairs.len());
    pairs.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{Cascade, StyleMap};

    const CALLOUT_CSS: &str = r#"
        .callout { --callout-color: #ec7500; --callout-background: rgba(236, 117, 0, 0.1); border-radius: 6px; }
        .callout[data-callout="tip"] { --callout-color: #00bfa5; --callout-border-width: 2px; }
    "#;

    fn callout(kind: &str, title: &str, body: &str) -> String {
        format!(
            r#"<div class="callout" data-callout="{kind}"><div class="callout-title"><div class="callout-title-inner">{title}</div></div><div class="callout-content">{body}</div></div>"#
        )
    }

    fn setup(body: &str, css: &str) -> (Document, StyleMap, NodeId) {
        let source = Document::parse_html(&format!(r#"<section class="s">{}</section>"#, body));
        let mut cascade = Cascade::new();
        cascade.add_author_css(css);
        let styles = cascade.compute(&source);
        let section = source.find_by_class(source.root(), "s").unwrap();
        let working = source.clone_subtree(section);
        let root = working.find_by_class(working.root(), "s").unwrap();
        (working, styles, root)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Fallback styles
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_fallback_uses_custom_properties() {
        let (mut working, styles, root) = setup(&callout("warning", "Careful", "<p>x</p>"), CALLOUT_CSS);
        assert_eq!(apply_callout_fallback_styles(&mut working, root, &styles, "callout"), 1);

        let c = working.elements_with_class(root, "callout")[0];
        let style = InlineStyle::of(&working, c);
        assert_eq!(style.get("border-left"), Some("4px solid #ec7500"));
        assert_eq!(style.get("background-color"), Some("rgba(236, 117, 0, 0.1)"));
        assert_eq!(style.get("border-radius"), Some("6px"));
    }

    #[test]
    fn test_fallback_defaults() {
        let (mut working, styles, root) = setup(&callout("note", "N", ""), "");
        apply_callout_fallback_styles(&mut working, root, &styles, "callout");

        let c = working.elements_with_class(root, "callout")[0];
        let style = InlineStyle::of(&working, c);
        assert_eq!(style.get("border-left"), Some("4px solid #d0d7de"));
        assert_eq!(style.get("background-color"), Some("#f6f8fa"));
        assert_eq!(style.get("border-radius"), None);
    }

    #[test]
    fn test_fallback_respects_inline_values() {
        let html = r#"<div class="callout" style="border-left-color: red; background: none"></div>"#;
        let (mut working, styles, root) = setup(html, CALLOUT_CSS);
        apply_callout_fallback_styles(&mut working, root, &styles, "callout");

        let c = working.elements_with_class(root, "callout")[0];
        let style = InlineStyle::of(&working, c);
        assert_eq!(style.get("border-left"), None);
        assert_eq!(style.get("border-left-color"), Some("red"));
        assert_eq!(style.get("background-color"), None);
        assert_eq!(style.get("border-radius"), Some("6px"));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Blockquote replacement
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_replace_builds_blockquote() {
        let body = callout("tip", " Pro tip ", "<p>Use <strong>bold</strong> &amp; more</p>");
        let (mut working, styles, root) = setup(&body, CALLOUT_CSS);
        assert_eq!(replace_callouts_with_blockquotes(&mut working, root, &styles, "callout"), 1);

        assert!(working.elements_with_class(root, "callout").is_empty());
        let bq = working.elements_by_tag(root, "blockquote")[0];
        assert_eq!(
            working.attr(bq, "style"),
            Some("margin: 1em 0; padding: 12px 14px; border-left: 2px solid #00bfa5; background: rgba(236, 117, 0, 0.1); border-radius: 6px;")
        );

        let children = working.children(bq).to_vec();
        assert_eq!(children.len(), 2);
        assert_eq!(working.tag_name(children[0]), Some("p"));
        assert_eq!(working.text_content(children[0]), "Pro tip");
        assert_eq!(
            working.attr(children[0], "style"),
            Some("margin: 0 0 6px 0; font-weight: 700; color: #00bfa5;")
        );
        assert_eq!(working.tag_name(children[1]), Some("div"));
        assert_eq!(working.elements_by_tag(children[1], "strong").len(), 1);
        assert_eq!(working.text_content(children[1]), "Use bold & more");
    }

    #[test]
    fn test_replace_defaults_and_empty_title() {
        let (mut working, styles, root) = setup(&callout("note", "   ", "<p>x</p>"), "");
        replace_callouts_with_blockquotes(&mut working, root, &styles, "callout");

        let bq = working.elements_by_tag(root, "blockquote")[0];
        assert_eq!(
            working.attr(bq, "style"),
            Some("margin: 1em 0; padding: 12px 14px; border-left: 4px solid #3b82f6; background: rgba(59,130,246,0.08); border-radius: 8px;")
        );
        assert_eq!(working.elements_by_tag(bq, "p").len(), 1);
        assert_eq!(working.tag_name(working.children(bq)[0]), Some("div"));
    }

    #[test]
    fn test_replace_all_callouts_including_nested() {
        let inner = callout("tip", "Inner", "<p>deep</p>");
        let outer = callout("note", "Outer", &format!("<p>a</p>{}", inner));
        let body = format!("{}{}", outer, callout("info", "Third", "<p>b</p>"));
        let (mut working, styles, root) = setup(&body, CALLOUT_CSS);

        assert_eq!(replace_callouts_with_blockquotes(&mut working, root, &styles, "callout"), 3);
        assert!(working.elements_with_class(root, "callout").is_empty());
        assert_eq!(working.elements_by_tag(root, "blockquote").len(), 3);

        let first = working.elements_by_tag(root, "blockquote")[0];
        let nested = working.elements_by_tag(first, "blockquote");
        assert_eq!(nested.len(), 2);
        assert!(working.text_content(nested[1]).contains("deep"));
    }

    #[test]
    fn test_unpaired_callout_is_left_alone() {
        let (mut working, styles, root) = setup("<p>x</p>", "");
        let synthetic = working.create_element("div");
        working.set_attr(synthetic, "class", "callout");
        working.append_child(root, synthetic);

        assert_eq!(replace_callouts_with_blockquotes(&mut working, root, &styles, "callout"), 0);
        assert_eq!(working.elements_with_class(root, "callout").len(), 1);
    }
}
