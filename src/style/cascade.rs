//! Cascade and inheritance.
//!
//! For every element, matching declarations are ordered by importance tier,
//! specificity and source order, custom properties are resolved first, then
//! every other declaration is applied with `var()` substituted and
//! shorthands expanded into their longhands.

use super::declaration::{parse_declarations, split_top_level, split_tokens, Declaration};
use super::properties::{
    initial_value, is_custom_property, is_inherited, longhands, shorthands_of, side_longhand,
    ALWAYS_RESOLVED,
};
use super::selector::Specificity;
use super::stylesheet::Stylesheet;
use super::{ComputedStyle, StyleMap, USER_AGENT_CSS};
use crate::dom::{Document, NodeId};
use log::debug;
use std::collections::BTreeMap;

/// How deep `var()` references may chain before giving up.
const MAX_VAR_DEPTH: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Tier {
    UserAgent,
    AuthorNormal,
    InlineNormal,
    AuthorImportant,
    InlineImportant,
}

struct Candidate<'a> {
    declaration: &'a Declaration,
    tier: Tier,
    specificity: Specificity,
    order: u32,
}

/// Stylesheets in cascade order: the user-agent sheet, then author sheets.
#[derive(Debug, Clone)]
pub struct Cascade {
    user_agent: Stylesheet,
    author: Vec<Stylesheet>,
}

impl Default for Cascade {
    fn default() -> Self {
        Self::new()
    }
}

impl Cascade {
    /// A cascade with the built-in user-agent sheet and no author styles.
    pub fn new() -> Self {
        Self {
            user_agent: Stylesheet::parse(USER_AGENT_CSS),
            author: Vec::new(),
        }
    }

    /// Add an author stylesheet. Later sheets win ties.
    pub fn add_author_sheet(&mut self, sheet: Stylesheet) -> &mut Self {
        self.author.push(sheet);
        self
    }

    /// Parse and add author CSS text.
    pub fn add_author_css(&mut self, css: &str) -> &mut Self {
        self.add_author_sheet(Stylesheet::parse(css))
    }

    /// Resolve every element of `doc`.
    pub fn compute(&self, doc: &Document) -> StyleMap {
        let mut map = StyleMap::default();
        self.compute_subtree(doc, doc.root(), None, &mut map);
        debug!("Resolved styles for {} elements", map.len());
        map
    }

    fn compute_subtree(
        &self,
        doc: &Document,
        id: NodeId,
        parent: Option<&ComputedStyle>,
        map: &mut StyleMap,
    ) {
        let own = if doc.element(id).is_some() {
            let style = self.compute_element(doc, id, parent);
            map.insert(id, style.clone());
            Some(style)
        } else {
            None
        };
        let next_parent = own.as_ref().or(parent);
        for &child in doc.children(id) {
            self.compute_subtree(doc, child, next_parent, map);
        }
    }

    fn compute_element(
        &self,
        doc: &Document,
        id: NodeId,
        parent: Option<&ComputedStyle>,
    ) -> ComputedStyle {
        let inline = doc.attr(id, "style").map(parse_declarations).unwrap_or_default();
        let candidates = self.candidates(doc, id, &inline);

        // Custom properties: inherited values first, own declarations on top.
        let mut raw_custom: BTreeMap<String, String> = parent
            .map(|p| {
                p.values
                    .iter()
                    .filter(|(k, _)| is_custom_property(k))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default();
        for candidate in candidates.iter().filter(|c| is_custom_property(&c.declaration.name)) {
            raw_custom.insert(candidate.declaration.name.clone(), candidate.declaration.value.clone());
        }
        let custom: BTreeMap<String, String> = raw_custom
            .keys()
            .filter_map(|name| {
                resolve_custom(name, &raw_custom, 0).map(|value| (name.clone(), value))
            })
            .collect();

        // Everything else, in cascade order.
        let mut declared = Declared::default();
        for candidate in candidates.iter().filter(|c| !is_custom_property(&c.declaration.name)) {
            let lookup = |name: &str| custom.get(name).cloned();
            match substitute_vars(&candidate.declaration.value, &lookup, 0) {
                Some(value) => declared.apply(&candidate.declaration.name, &value),
                // Invalid at computed-value time: behaves as if never declared.
                None => debug!(
                    "Dropping '{}' on <{}>: unresolved var()",
                    candidate.declaration.name,
                    doc.tag_name(id).unwrap_or("?")
                ),
            }
        }

        let mut values = custom;
        if let Some(parent) = parent {
            for (name, value) in &parent.values {
                if is_inherited(name) && !is_custom_property(name) {
                    values.insert(name.clone(), value.clone());
                }
            }
        }
        for (name, value) in declared.values {
            match value.to_ascii_lowercase().as_str() {
                "inherit" => match parent.and_then(|p| p.values.get(&name)) {
                    Some(inherited) => {
                        values.insert(name, inherited.clone());
                    }
                    None => {
                        values.remove(&name);
                    }
                },
                "initial" => match initial_value(&name) {
                    Some(initial) => {
                        values.insert(name, initial.to_string());
                    }
                    None => {
                        values.remove(&name);
                    }
                },
                "unset" => {
                    if !is_inherited(&name) {
                        values.remove(&name);
                    }
                }
                _ => {
                    values.insert(name, value);
                }
            }
        }

        // Root-level defaults for inherited properties, and always-resolved ones.
        if parent.is_none() {
            for name in super::properties::SNAPSHOT_PROPERTIES {
                if is_inherited(name) && !values.contains_key(*name) {
                    if let Some(initial) = initial_value(name) {
                        values.insert(name.to_string(), initial.to_string());
                    }
                }
            }
        }
        if let Some(size) = values.get("font-size").cloned() {
            let parent_size = parent
                .and_then(|p| p.values.get("font-size"))
                .map(String::as_str)
                .unwrap_or("16px");
            if let Some(px) = resolve_font_size(&size, parent_size) {
                values.insert("font-size".to_string(), px);
            }
        }
        for name in ALWAYS_RESOLVED {
            if !values.contains_key(*name) {
                if let Some(initial) = initial_value(name) {
                    values.insert(name.to_string(), initial.to_string());
                }
            }
        }

        ComputedStyle { values }
    }

    fn candidates<'a>(
        &'a self,
        doc: &Document,
        id: NodeId,
        inline: &'a [Declaration],
    ) -> Vec<Candidate<'a>> {
        let mut out = Vec::new();
        let mut order = 0u32;

        let sheets = std::iter::once((true, &self.user_agent))
            .chain(self.author.iter().map(|s| (false, s)));
        for (is_user_agent, sheet) in sheets {
            for rule in &sheet.rules {
                let specificity = rule
                    .selectors
                    .iter()
                    .filter(|s| s.matches(doc, id))
                    .map(|s| s.specificity())
                    .max();
                let Some(specificity) = specificity else {
                    continue;
                };
                for declaration in &rule.declarations {
                    let tier = match (is_user_agent, declaration.important) {
                        (true, _) => Tier::UserAgent,
                        (false, false) => Tier::AuthorNormal,
                        (false, true) => Tier::AuthorImportant,
                    };
                    out.push(Candidate {
                        declaration,
                        tier,
                        specificity,
                        order,
                    });
                    order += 1;
                }
            }
        }

        for declaration in inline {
            let tier = if declaration.important {
                Tier::InlineImportant
            } else {
                Tier::InlineNormal
            };
            out.push(Candidate {
                declaration,
                tier,
                specificity: Specificity::default(),
                order,
            });
            order += 1;
        }

        out.sort_by(|a, b| {
            (a.tier, a.specificity, a.order).cmp(&(b.tier, b.specificity, b.order))
        });
        out
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Declared Values
// ─────────────────────────────────────────────────────────────────────────────

/// Winning declared values for one element, built up in cascade order.
#[derive(Default)]
struct Declared {
    values: BTreeMap<String, String>,
}

impl Declared {
    fn apply(&mut self, name: &str, value: &str) {
        // Any other shorthand sharing a longhand with `name` is now stale.
        let touched = std::iter::once(name).chain(longhands(name).iter().copied());
        for longhand in touched {
            for stale in shorthands_of(longhand) {
                if stale != name {
                    self.values.remove(stale);
                }
            }
        }
        self.values.insert(name.to_string(), value.to_string());
        for (longhand, longhand_value) in expand_shorthand(name, value) {
            self.values.insert(longhand.to_string(), longhand_value);
        }
    }
}

/// Longhand values implied by a shorthand declaration.
fn expand_shorthand(name: &str, value: &str) -> Vec<(&'static str, String)> {
    if is_wide_keyword(value) {
        return longhands(name).iter().map(|l| (*l, value.to_string())).collect();
    }
    let tokens = split_tokens(value);
    match name {
        "margin" | "padding" | "border-width" | "border-style" | "border-color" => {
            expand_box(name, &tokens)
        }
        "border" => {
            let (width, style, color) = classify_border(&tokens);
            ["border-top", "border-right", "border-bottom", "border-left"]
                .iter()
                .flat_map(|side| side_border(side, &width, &style, &color))
                .collect()
        }
        "border-top" | "border-right" | "border-bottom" | "border-left" => {
            let (width, style, color) = classify_border(&tokens);
            side_border(name, &width, &style, &color)
        }
        "background" => expand_background(&tokens),
        "list-style" => expand_list_style(&tokens),
        _ => Vec::new(),
    }
}

fn is_wide_keyword(value: &str) -> bool {
    ["inherit", "initial", "unset"]
        .iter()
        .any(|k| value.eq_ignore_ascii_case(k))
}

/// Relative font sizes (`2em`, `120%`) resolved against the parent size.
fn resolve_font_size(value: &str, parent: &str) -> Option<String> {
    let parent_px: f32 = parent.strip_suffix("px")?.trim().parse().ok()?;
    let factor: f32 = if let Some(em) = value.strip_suffix("rem") {
        // Root size is the initial 16px.
        return Some(format_px(em.trim().parse::<f32>().ok()? * 16.0));
    } else if let Some(em) = value.strip_suffix("em") {
        em.trim().parse().ok()?
    } else if let Some(pct) = value.strip_suffix('%') {
        pct.trim().parse::<f32>().ok()? / 100.0
    } else {
        match value {
            "smaller" => 0.8333,
            "larger" => 1.2,
            _ => return None,
        }
    };
    Some(format_px(parent_px * factor))
}

fn format_px(px: f32) -> String {
    let rounded = (px * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{}px", rounded as i64)
    } else {
        format!("{}px", rounded)
    }
}

fn expand_box(name: &str, tokens: &[&str]) -> Vec<(&'static str, String)> {
    let [top, right, bottom, left] = match tokens {
        [a] => [a, a, a, a],
        [a, b] => [a, b, a, b],
        [a, b, c] => [a, b, c, b],
        [a, b, c, d] => [a, b, c, d],
        _ => return Vec::new(),
    };
    [top, right, bottom, left]
        .iter()
        .enumerate()
        .filter_map(|(side, v)| side_longhand(name, side).map(|l| (l, v.to_string())))
        .collect()
}

const BORDER_STYLES: &[&str] = &[
    "none", "hidden", "dotted", "dashed", "solid", "double", "groove", "ridge", "inset", "outset",
];

fn is_length(token: &str) -> bool {
    matches!(token, "thin" | "medium" | "thick")
        || token.starts_with(|c: char| c.is_ascii_digit() || c == '.')
        || token.starts_with("calc(")
}

fn classify_border(tokens: &[&str]) -> (String, String, String) {
    let mut width = None;
    let mut style = None;
    let mut color = None;
    for token in tokens {
        let lower = token.to_ascii_lowercase();
        if BORDER_STYLES.contains(&lower.as_str()) {
            style = Some(token.to_string());
        } else if is_length(&lower) {
            width = Some(token.to_string());
        } else {
            color = Some(token.to_string());
        }
    }
    (
        width.unwrap_or_else(|| "medium".to_string()),
        style.unwrap_or_else(|| "none".to_string()),
        color.unwrap_or_else(|| "currentcolor".to_string()),
    )
}

fn side_border(side: &str, width: &str, style: &str, color: &str) -> Vec<(&'static str, String)> {
    match longhands(side) {
        [w, s, c] => vec![
            (*w, width.to_string()),
            (*s, style.to_string()),
            (*c, color.to_string()),
        ],
        _ => Vec::new(),
    }
}

const BACKGROUND_KEYWORDS: &[&str] = &[
    "repeat", "no-repeat", "repeat-x", "repeat-y", "space", "round", "center", "top", "bottom",
    "left", "right", "cover", "contain", "auto", "fixed", "scroll", "local", "border-box",
    "padding-box", "content-box", "text", "/",
];

fn expand_background(tokens: &[&str]) -> Vec<(&'static str, String)> {
    let mut image = None;
    let mut color = None;
    for token in tokens {
        let lower = token.to_ascii_lowercase();
        if lower.starts_with("url(") || lower.contains("gradient(") {
            image = Some(token.to_string());
        } else if lower == "none" {
            image.get_or_insert_with(|| "none".to_string());
        } else if !BACKGROUND_KEYWORDS.contains(&lower.as_str()) && !is_length(&lower) && !lower.ends_with('%') {
            color = Some(token.to_string());
        }
    }
    vec![
        ("background-color", color.unwrap_or_else(|| "transparent".to_string())),
        ("background-image", image.unwrap_or_else(|| "none".to_string())),
    ]
}

const LIST_POSITIONS: &[&str] = &["inside", "outside"];

fn expand_list_style(tokens: &[&str]) -> Vec<(&'static str, String)> {
    let mut out = Vec::new();
    for token in tokens {
        let lower = token.to_ascii_lowercase();
        if LIST_POSITIONS.contains(&lower.as_str()) {
            out.push(("list-style-position", token.to_string()));
        } else if !lower.starts_with("url(") {
            out.push(("list-style-type", token.to_string()));
        }
    }
    out
}

// ─────────────────────────────────────────────────────────────────────────────
// var() Substitution
// ─────────────────────────────────────────────────────────────────────────────

fn resolve_custom(name: &str, raw: &BTreeMap<String, String>, depth: usize) -> Option<String> {
    if depth > MAX_VAR_DEPTH {
        return None;
    }
    let value = raw.get(name)?;
    let lookup = |n: &str| resolve_custom(n, raw, depth + 1);
    substitute_vars(value, &lookup, depth)
}

/// Replace every `var(--name, fallback)` in `value`.
///
/// Returns `None` when a reference has neither a value nor a fallback.
fn substitute_vars(
    value: &str,
    lookup: &dyn Fn(&str) -> Option<String>,
    depth: usize,
) -> Option<String> {
    if depth > MAX_VAR_DEPTH {
        return None;
    }
    let mut out = String::new();
    let mut rest = value;
    while let Some(start) = rest.find("var(") {
        out.push_str(&rest[..start]);
        let args_start = start + "var(".len();
        let end = closing_paren(rest, args_start)?;
        let args = &rest[args_start..end];
        let mut parts = split_top_level(args, ',').into_iter();
        let name = parts.next().unwrap_or("").trim();
        let fallback: Vec<&str> = parts.collect();

        let replacement = match lookup(name) {
            Some(v) => v,
            None if !fallback.is_empty() => {
                substitute_vars(fallback.join(",").trim(), lookup, depth + 1)?
            }
            None => return None,
        };
        out.push_str(&replacement);
        rest = &rest[end + 1..];
    }
    out.push_str(rest);
    Some(out.trim().to_string())
}

/// Index of the `)` closing a group whose content starts at `from`.
fn closing_paren(input: &str, from: usize) -> Option<usize> {
    let mut depth = 1usize;
    for (i, c) in input[from..].char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(from + i);
                }
            }
            _ => {}
        }
    }
    None
}
