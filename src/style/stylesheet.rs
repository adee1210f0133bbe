//! Stylesheet parsing.
//!
//! A deliberately small parser: comments are stripped, at-rules are skipped
//! whole, and every remaining `selectors { declarations }` block becomes a
//! `Rule`. Selectors the matcher cannot handle are dropped individually.

use super::declaration::{parse_declarations, split_top_level, Declaration};
use super::selector::Selector;
use regex::Regex;
use std::sync::OnceLock;

/// Set of selectors and the declarations they apply.
#[derive(Debug, Clone)]
pub struct Rule {
    pub selectors: Vec<Selector>,
    pub declarations: Vec<Declaration>,
}

/// A parsed stylesheet.
#[derive(Debug, Clone, Default)]
pub struct Stylesheet {
    pub rules: Vec<Rule>,
}

fn comment_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?s)/\*.*?\*/").expect("valid comment pattern"))
}

impl Stylesheet {
    /// input: `"div, #id { color: red; } .class { font-size: 12px; }"`
    pub fn parse(input: &str) -> Stylesheet {
        let css = comment_pattern().replace_all(input, "");
        let mut rules = Vec::new();
        let mut rest: &str = &css;

        loop {
            rest = rest.trim_start();
            if rest.is_empty() {
                break;
            }

            if rest.starts_with('@') {
                rest = skip_at_rule(rest);
                continue;
            }

            let Some(open) = rest.find('{') else {
                break;
            };
            let prelude = &rest[..open];
            let Some(close) = matching_brace(rest, open) else {
                break;
            };
            let body = &rest[open + 1..close];
            rest = &rest[close + 1..];

            let selectors: Vec<Selector> = split_top_level(prelude, ',')
                .into_iter()
                .filter_map(Selector::parse)
                .collect();
            if selectors.is_empty() {
                continue;
            }
            let declarations = parse_declarations(body);
            if declarations.is_empty() {
                continue;
            }
            rules.push(Rule {
                selectors,
                declarations,
            });
        }

        Stylesheet { rules }
    }

    /// Append the rules of `other` after this sheet's rules.
    pub fn extend(&mut self, other: Stylesheet) {
        self.rules.extend(other.rules);
    }
}

/// Skip `@import ...;` or `@media ... { ... }`, returning what follows.
fn skip_at_rule(input: &str) -> &str {
    let semicolon = input.find(';');
    let brace = input.find('{');
    match (semicolon, brace) {
        (Some(s), Some(b)) if s < b => &input[s + 1..],
        (Some(s), None) => &input[s + 1..],
        (_, Some(b)) => match matching_brace(input, b) {
            Some(close) => &input[close + 1..],
            None => "",
        },
        (None, None) => "",
    }
}

/// Index of the `}` closing the `{` at `open`, honoring nesting and quotes.
fn matching_brace(input: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (i, c) in input[open..].char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(c),
            (None, '{') => depth += 1,
            (None, '}') => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}
