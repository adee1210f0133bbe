//! Rich Clipboard Export for clipstyle
//!
//! This module turns a rendered preview into a self-contained HTML payload
//! that pastes correctly into editors which never see the preview's
//! stylesheets, and writes it to the clipboard.
//!
//! # Pipeline
//!
//! 1. Clone the copy root (`dom::Document::clone_subtree`)
//! 2. Inline images as data URIs (`images.rs`, `fetch.rs`, `svg.rs`)
//! 3. Snapshot resolved styles as inline `style` (`inline_styles.rs`)
//! 4. Theme callouts, then rebuild them as blockquotes (`callout.rs`)
//! 5. Keep code indentation (`code.rs`)
//! 6. Strip tracking attributes and serialize (`sanitize.rs`)
//!
//! # Architecture
//!
//! - `html.rs` - host rendering of Markdown/HTML into a styled preview
//! - `options.rs` - per-run pipeline options
//! - `clipboard.rs` - clipboard sinks

pub mod callout;
pub mod clipboard;
pub mod code;
pub mod fetch;
pub mod html;
pub mod images;
pub mod inline_styles;
pub mod options;
pub mod sanitize;
pub mod svg;

pub use clipboard::{ClipboardSink, SystemClipboard};
pub use fetch::{DefaultFetcher, FetchBase, FetchedResource, ResourceFetcher};
pub use html::{render_html, render_markdown, RenderOptions, RenderedDocument, SourceFormat};
pub use images::InlineReport;
pub use options::CopyOptions;
pub use svg::RasterSize;

use crate::dom::{Document, NodeId};
use crate::error::{Error, Result};
use crate::style::ComputedStyleSource;
use log::{debug, error, info};

// ─────────────────────────────────────────────────────────────────────────────
// Payload & Outcome
// ─────────────────────────────────────────────────────────────────────────────

/// What gets written to the clipboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardPayload {
    /// Serialized content section (`text/html`)
    pub html: String,
    /// Text content of the copied tree, taken before any rewriting
    pub plain_text: String,
}

/// Result of one copy, for the caller to present.
#[derive(Debug)]
pub enum CopyOutcome {
    Copied { report: InlineReport },
    Failed { error: Error },
}

impl CopyOutcome {
    pub fn is_copied(&self) -> bool {
        matches!(self, CopyOutcome::Copied { .. })
    }

    /// One-line message for the user.
    pub fn message(&self) -> &'static str {
        match self {
            CopyOutcome::Copied { .. } => "Copied to clipboard",
            CopyOutcome::Failed { .. } => "Copy failed",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Pipeline
// ─────────────────────────────────────────────────────────────────────────────

/// Run every pipeline stage on a copy of `root` and return the payload.
///
/// `source` and `styles` are only read. Fails if `root` is not an element
/// or if no element with the content-section class is found (descendant or
/// self) in either the source or the copy.
pub fn build_clipboard_payload(
    source: &Document,
    styles: &dyn ComputedStyleSource,
    root: NodeId,
    fetcher: &dyn ResourceFetcher,
    options: &CopyOptions,
) -> Result<(ClipboardPayload, InlineReport)> {
    if source.element(root).is_none() {
        return Err(Error::InvalidRoot);
    }

    let mut working = source.clone_subtree(root);
    let working_root = working
        .first_element_child(working.root())
        .ok_or(Error::InvalidRoot)?;
    let plain_text = working.text_content(working_root);

    let report = if options.inline_images {
        images::inline_images(&mut working, working_root, fetcher, options.svg_fallback)
    } else {
        InlineReport::default()
    };

    let class = &options.content_section_class;
    let section_not_found = || Error::ContentSectionNotFound {
        class: class.clone(),
    };
    let source_section = source.find_by_class(root, class).ok_or_else(section_not_found)?;
    let section = working
        .find_by_class(working_root, class)
        .ok_or_else(section_not_found)?;

    inline_styles::snapshot_styles(&mut working, section, source, source_section, styles);
    callout::apply_callout_fallback_styles(&mut working, section, styles, &options.callout_class);
    if options.callout_mode.replaces_callouts() {
        callout::replace_callouts_with_blockquotes(
            &mut working,
            section,
            styles,
            &options.callout_class,
        );
    }
    code::normalize_code_indentation(&mut working, section, options.tab_width);
    let html = sanitize::sanitize_and_serialize(&mut working, section);

    debug!("Built clipboard payload: {} bytes of HTML", html.len());
    Ok((ClipboardPayload { html, plain_text }, report))
}

/// Build the payload for `root` and write it to `sink`.
///
/// Nothing is written unless every stage succeeded.
pub fn copy_to_clipboard(
    source: &Document,
    styles: &dyn ComputedStyleSource,
    root: NodeId,
    fetcher: &dyn ResourceFetcher,
    options: &CopyOptions,
    sink: &mut dyn ClipboardSink,
) -> CopyOutcome {
    let result = build_clipboard_payload(source, styles, root, fetcher, options).and_then(
        |(payload, report)| {
            sink.write(&payload.html, &payload.plain_text)?;
            Ok(report)
        },
    );

    match result {
        Ok(report) => {
            info!("Copied to clipboard");
            CopyOutcome::Copied { report }
        }
        Err(e) => {
            error!("Copy failed: {}", e);
            CopyOutcome::Failed { error: e }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
