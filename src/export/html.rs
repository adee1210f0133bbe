//! Host Rendering
//!
//! This module builds the *rendered document* the copy pipeline reads from:
//! Markdown is converted with comrak, the result is wrapped in the preview
//! container and content section, Markdown callouts (`> [!type] Title`)
//! become callout widgets, and every element is resolved against the
//! user-agent sheet, the base preview styles, the selected template and any
//! extra CSS.

use crate::dom::{Document, NodeId, NodeKind};
use crate::style::{Cascade, StyleMap};
use crate::templates::Template;
use comrak::{markdown_to_html, Options};
use log::debug;
use std::path::Path;

/// Class of the outer preview container.
pub const PREVIEW_CLASS: &str = "mp-preview";

// ─────────────────────────────────────────────────────────────────────────────
// Input Format
// ─────────────────────────────────────────────────────────────────────────────

/// How an input file is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Markdown,
    Html,
}

impl SourceFormat {
    /// `.md` and `.markdown` are Markdown, anything else is HTML.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("md") | Some("markdown") => SourceFormat::Markdown,
            _ => SourceFormat::Html,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Rendered Document
// ─────────────────────────────────────────────────────────────────────────────

/// Settings for host rendering.
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions<'a> {
    pub template: &'a Template,
    /// Appended after the template, in order
    pub extra_css: &'a [String],
    pub section_class: &'a str,
    pub callout_class: &'a str,
}

/// A parsed, styled preview: the source tree of the copy pipeline.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub document: Document,
    pub styles: StyleMap,
    /// The preview container, the usual root to copy from
    pub preview: NodeId,
    /// The content section inside `preview`
    pub section: NodeId,
}

/// Render Markdown into a styled preview.
pub fn render_markdown(markdown: &str, options: &RenderOptions<'_>) -> RenderedDocument {
    render_html(&markdown_to_html_body(markdown), options)
}

/// Render HTML into a styled preview.
///
/// If the markup already contains an element with the content-section
/// class, it is used as is; otherwise the body content is wrapped in a new
/// preview container and content section.
pub fn render_html(html: &str, options: &RenderOptions<'_>) -> RenderedDocument {
    let mut document = Document::parse_html(html);
    let (preview, section) = match document.find_by_class(document.root(), options.section_class) {
        Some(section) => {
            let preview = std::iter::once(section)
                .chain(document.ancestors(section))
                .find(|&a| document.has_class(a, PREVIEW_CLASS))
                .unwrap_or(section);
            (preview, section)
        }
        None => wrap_body(&mut document, options.section_class),
    };

    let converted = convert_callouts(&mut document, section, options.callout_class);
    if converted > 0 {
        debug!("Converted {} Markdown callout(s)", converted);
    }

    let scope = format!(".{}", options.section_class);
    let mut cascade = Cascade::new();
    cascade.add_author_css(BASE_CSS);
    cascade.add_author_css(&options.template.to_css(&scope));
    for css in embedded_styles(&document) {
        cascade.add_author_css(&css);
    }
    for css in options.extra_css {
        cascade.add_author_css(css);
    }
    let styles = cascade.compute(&document);

    RenderedDocument {
        document,
        styles,
        preview,
        section,
    }
}

/// Move the body's children into `<div class="mp-preview"><section class="...">`.
fn wrap_body(document: &mut Document, section_class: &str) -> (NodeId, NodeId) {
    let root = document.root();
    let body = document
        .elements_by_tag(root, "body")
        .first()
        .copied()
        .unwrap_or(root);

    let preview = document.create_element("div");
    document.set_attr(preview, "class", PREVIEW_CLASS);
    let section = document.create_element("section");
    document.set_attr(section, "class", section_class);

    for child in document.children(body).to_vec() {
        document.append_child(section, child);
    }
    document.append_child(preview, section);
    document.append_child(body, preview);
    (preview, section)
}

/// Text of every `<style>` element, in document order.
fn embedded_styles(document: &Document) -> Vec<String> {
    document
        .elements_by_tag(document.root(), "style")
        .into_iter()
        .map(|s| document.text_content(s))
        .collect()
}

/// Convert markdown to HTML body content.
pub fn markdown_to_html_body(markdown: &str) -> String {
    let mut options = Options::default();

    // Enable common extensions
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.footnotes = true;
    options.extension.header_ids = Some(String::new());

    // Render options
    options.render.unsafe_ = true; // Allow raw HTML

    markdown_to_html(markdown, &options)
}

// ─────────────────────────────────────────────────────────────────────────────
// Callouts
// ─────────────────────────────────────────────────────────────────────────────

/// Turn every blockquote under `root` whose text starts with `[!type]` into
/// a callout widget:
///
/// ```text
/// <div class="callout" data-callout="type">
///   <div class="callout-title"><div class="callout-title-inner">Title</div></div>
///   <div class="callout-content">...</div>
/// </div>
/// ```
pub fn convert_callouts(doc: &mut Document, root: NodeId, callout_class: &str) -> usize {
    let mut converted = 0;
    for blockquote in doc.elements_by_tag(root, "blockquote") {
        let Some((kind, title)) = take_callout_marker(doc, blockquote) else {
            continue;
        };

        let callout = doc.create_element("div");
        doc.set_attr(callout, "class", callout_class);
        doc.set_attr(callout, "data-callout", &kind);

        let title_box = doc.create_element("div");
        doc.set_attr(title_box, "class", "callout-title");
        let title_inner = doc.create_element("div");
        doc.set_attr(title_inner, "class", "callout-title-inner");
        let text = doc.create_text(&title);
        doc.append_child(title_inner, text);
        doc.append_child(title_box, title_inner);
        doc.append_child(callout, title_box);

        let content = doc.create_element("div");
        doc.set_attr(content, "class", "callout-content");
        for child in doc.children(blockquote).to_vec() {
            doc.append_child(content, child);
        }
        doc.append_child(callout, content);

        doc.replace(blockquote, callout);
        converted += 1;
    }
    converted
}

/// Strip the `[!type] Title` line from the blockquote's first paragraph and
/// return the lowercased type and the title (the capitalized type if none).
fn take_callout_marker(doc: &mut Document, blockquote: NodeId) -> Option<(String, String)> {
    let paragraph = doc.first_element_child(blockquote)?;
    if doc.tag_name(paragraph) != Some("p") {
        return None;
    }
    let first = *doc.children(paragraph).first()?;
    let NodeKind::Text(text) = doc.node(first).kind() else {
        return None;
    };

    let (kind, rest) = parse_marker(text)?;
    let (title_line, remainder) = match rest.split_once('\n') {
        Some((line, remainder)) => (line, Some(remainder.to_string())),
        None => (rest, None),
    };
    let title = match title_line.trim() {
        "" => capitalize(&kind),
        title => title.to_string(),
    };

    match remainder {
        Some(remainder) => doc.set_text(first, &remainder),
        None => {
            doc.detach(first);
            if let Some(&next) = doc.children(paragraph).first() {
                if doc.tag_name(next) == Some("br") {
                    doc.detach(next);
                }
            }
        }
    }
    if doc.text_content(paragraph).trim().is_empty() && doc.elements(paragraph).len() == 1 {
        doc.detach(paragraph);
    }
    Some((kind, title))
}

/// `"[!Note]- Rest"` to `("note", " Rest")`.
fn parse_marker(text: &str) -> Option<(String, &str)> {
    let body = text.trim_start().strip_prefix("[!")?;
    let close = body.find(']')?;
    let kind = &body[..close];
    if kind.is_empty() || !kind.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return None;
    }
    let rest = &body[close + 1..];
    let rest = rest
        .strip_prefix('+')
        .or_else(|| rest.strip_prefix('-'))
        .unwrap_or(rest);
    Some((kind.to_ascii_lowercase(), rest))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// CSS
// ─────────────────────────────────────────────────────────────────────────────

/// Base CSS for the preview (layout, typography, callouts).
const BASE_CSS: &str = r#"
.mp-preview {
    font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', 'Noto Sans', Helvetica, Arial, sans-serif;
    font-size: 16px;
    line-height: 1.6;
    color: #24292f;
}

.mp-preview h1, .mp-preview h2, .mp-preview h3,
.mp-preview h4, .mp-preview h5, .mp-preview h6 {
    margin-top: 24px;
    margin-bottom: 16px;
    font-weight: 600;
    line-height: 1.25;
}

.mp-preview p {
    margin-top: 0;
    margin-bottom: 16px;
}

.mp-preview ul, .mp-preview ol {
    margin-top: 0;
    margin-bottom: 16px;
    padding-left: 2em;
}

.mp-preview blockquote {
    margin: 0 0 16px 0;
    padding: 0 1em;
    border-left: 4px solid #d0d7de;
}

.mp-preview pre {
    margin-top: 0;
    margin-bottom: 16px;
    padding: 16px;
    border-radius: 6px;
    line-height: 1.45;
}

.mp-preview table {
    border-collapse: collapse;
    margin-bottom: 16px;
}

.mp-preview th, .mp-preview td {
    padding: 8px 12px;
    border: 1px solid #d0d7de;
}

.mp-preview img {
    max-width: 100%;
}

/* Callouts */
.mp-preview .callout {
    --callout-color: #448aff;
    --callout-background: rgba(68, 138, 255, 0.1);
    --callout-border-width: 4px;
    margin: 1em 0;
    padding: 12px 16px;
    border-left: var(--callout-border-width) solid var(--callout-color);
    background-color: var(--callout-background);
    border-radius: 4px;
}

.mp-preview .callout-title {
    font-weight: 600;
    margin-bottom: 4px;
    color: var(--callout-color);
}

.mp-preview .callout[data-callout="tip"] { --callout-color: #00bfa5; --callout-background: rgba(0, 191, 165, 0.1); }
.mp-preview .callout[data-callout="success"] { --callout-color: #08b94e; --callout-background: rgba(8, 185, 78, 0.1); }
.mp-preview .callout[data-callout="question"] { --callout-color: #ec7500; --callout-background: rgba(236, 117, 0, 0.1); }
.mp-preview .callout[data-callout="warning"] { --callout-color: #ec7500; --callout-background: rgba(236, 117, 0, 0.1); }
.mp-preview .callout[data-callout="danger"] { --callout-color: #e93147; --callout-background: rgba(233, 49, 71, 0.1); }
.mp-preview .callout[data-callout="quote"] { --callout-color: #9e9e9e; --callout-background: rgba(158, 158, 158, 0.1); }
"#;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
