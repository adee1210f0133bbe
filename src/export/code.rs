//! Code block whitespace that survives paste targets which collapse spaces.

use crate::dom::{Document, NodeId};
use log::debug;

/// Rewrite every `<code>` inside a `<pre>` under `root` so leading
/// indentation is made of `&nbsp;` and line breaks are `<br>` elements.
///
/// Tabs are expanded to `tab_width` spaces first. Returns the number of
/// code blocks rewritten.
pub fn normalize_code_indentation(doc: &mut Document, root: NodeId, tab_width: u8) -> usize {
    let blocks: Vec<NodeId> = doc
        .elements_by_tag(root, "code")
        .into_iter()
        .filter(|&code| {
            doc.ancestors(code)
                .any(|a| doc.tag_name(a) == Some("pre"))
        })
        .collect();

    let tab = " ".repeat(usize::from(tab_width));
    for &code in &blocks {
        let text = doc.text_content(code).replace('\t', &tab);
        let markup = indentation_markup(&text);
        doc.set_inner_html(code, &markup);
    }
    debug!("Normalized {} code block(s)", blocks.len());
    blocks.len()
}

fn indentation_markup(text: &str) -> String {
    text.split('\n')
        .map(|line| {
            let line = line.strip_suffix('\r').unwrap_or(line);
            let rest = line.trim_start_matches(' ');
            let indent = line.len() - rest.len();
            format!("{}{}", "&nbsp;".repeat(indent), escape_code(rest))
        })
        .collect::<Vec<_>>()
        .join("<br>")
}

fn escape_code(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
