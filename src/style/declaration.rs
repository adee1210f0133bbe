//! Declaration blocks and inline `style` attributes.

use super::properties::{covers, is_custom_property, longhands};
use crate::dom::{Document, NodeId};

/// A single `name: value` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub value: String,
    pub important: bool,
}

impl Declaration {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            important: false,
        }
    }
}

/// Parse the inside of a declaration block.
///
/// input: `color: red; background: url("a;b.png") !important`
/// output: two declarations, the second one important.
pub fn parse_declarations(input: &str) -> Vec<Declaration> {
    split_top_level(input, ';')
        .into_iter()
        .filter_map(|pair| {
            let (n, v) = pair.split_once(':')?;
            let n = n.trim();
            let name = if is_custom_property(n) {
                n.to_string()
            } else {
                n.to_ascii_lowercase()
            };
            if name.is_empty() {
                return None;
            }
            let (value, important) = strip_important(v.trim());
            if value.is_empty() {
                return None;
            }
            Some(Declaration {
                name,
                value: value.to_string(),
                important,
            })
        })
        .collect()
}

fn strip_important(value: &str) -> (&str, bool) {
    if let Some(bang) = value.rfind('!') {
        let keyword = value[bang + 1..].trim();
        if keyword.eq_ignore_ascii_case("important") {
            return (value[..bang].trim_end(), true);
        }
    }
    (value, false)
}

/// Split on `sep` where it is not inside quotes or parentheses.
pub(crate) fn split_top_level(input: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in input.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, c) if c == sep && depth == 0 => {
                parts.push(&input[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

/// Whitespace-separated tokens, keeping `rgb(1, 2, 3)` and quoted strings whole.
pub(crate) fn split_tokens(input: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start: Option<usize> = None;
    for (i, c) in input.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => {
                quote = Some(c);
                start.get_or_insert(i);
            }
            (None, '(') => {
                depth += 1;
                start.get_or_insert(i);
            }
            (None, ')') => depth = depth.saturating_sub(1),
            (None, c) if c.is_whitespace() && depth == 0 => {
                if let Some(s) = start.take() {
                    tokens.push(&input[s..i]);
                }
            }
            _ => {
                start.get_or_insert(i);
            }
        }
    }
    if let Some(s) = start {
        tokens.push(&input[s..]);
    }
    tokens
}

// ─────────────────────────────────────────────────────────────────────────────
// Inline Style
// ─────────────────────────────────────────────────────────────────────────────

/// The parsed `style` attribute of one element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineStyle {
    declarations: Vec<Declaration>,
}

impl InlineStyle {
    pub fn parse(css: &str) -> Self {
        Self {
            declarations: parse_declarations(css),
        }
    }

    /// Read the `style` attribute of `id` (empty for non-elements).
    pub fn of(doc: &Document, id: NodeId) -> Self {
        doc.attr(id, "style").map(Self::parse).unwrap_or_default()
    }

    /// Write back to the `style` attribute of `id`, dropping it when empty.
    pub fn write_to(&self, doc: &mut Document, id: NodeId) {
        if self.declarations.is_empty() {
            doc.remove_attr(id, "style");
        } else {
            doc.set_attr(id, "style", &self.to_css_text());
        }
    }

    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Value of the last declaration named exactly `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.declarations
            .iter()
            .rev()
            .find(|d| d.name == name)
            .map(|d| d.value.as_str())
    }

    /// True if the element already states a value for `name`.
    ///
    /// A property counts as set when declared directly, when a declared
    /// shorthand covers it, or (for a shorthand) when any of its longhands is
    /// declared, so writing it would clobber that longhand.
    pub fn has_explicit(&self, name: &str) -> bool {
        let own_longhands = longhands(name);
        self.declarations.iter().any(|d| {
            d.name == name
                || covers(&d.name, name)
                || own_longhands.contains(&d.name.as_str())
                || longhands(&d.name).iter().any(|l| own_longhands.contains(l))
        })
    }

    /// Set `name`, replacing an existing declaration of the same name in place.
    pub fn set(&mut self, name: &str, value: &str) {
        match self.declarations.iter_mut().find(|d| d.name == name) {
            Some(existing) => {
                existing.value = value.to_string();
                existing.important = false;
            }
            None => self.declarations.push(Declaration::new(name, value)),
        }
    }

    /// Serialize as `name: value; name: value;`.
    pub fn to_css_text(&self) -> String {
        self.declarations
            .iter()
            .map(|d| {
                if d.important {
                    format!("{}: {} !important;", d.name, d.value)
                } else {
                    format!("{}: {};", d.name, d.value)
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}
