//! Selector parsing, matching and specificity.
//!
//! Supported: `*`, type, `.class`, `#id` and attribute selectors combined
//! into compounds, joined by descendant (whitespace) and child (`>`)
//! combinators. Anything else (pseudo-classes, sibling combinators) makes
//! the selector unsupported and it is dropped by the stylesheet parser.

use crate::dom::{Document, Element, NodeId};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd)]
pub struct Specificity(pub u16, pub u16, pub u16); // (id, class, type)

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrOp {
    Exists,
    Equals(String),
    Includes(String),
    DashMatch(String),
    Prefix(String),
    Suffix(String),
    Substring(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrSelector {
    name: String,
    op: AttrOp,
}

impl AttrSelector {
    fn matches(&self, element: &Element) -> bool {
        let Some(value) = element.attr(&self.name) else {
            return false;
        };
        match &self.op {
            AttrOp::Exists => true,
            AttrOp::Equals(want) => value == want,
            AttrOp::Includes(want) => value.split_whitespace().any(|v| v == want),
            AttrOp::DashMatch(want) => {
                value == want || value.starts_with(&format!("{}-", want))
            }
            AttrOp::Prefix(want) => !want.is_empty() && value.starts_with(want.as_str()),
            AttrOp::Suffix(want) => !want.is_empty() && value.ends_with(want.as_str()),
            AttrOp::Substring(want) => !want.is_empty() && value.contains(want.as_str()),
        }
    }
}

/// A sequence of simple selectors with no combinator (`div.note#x`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    ids: Vec<String>,
    classes: Vec<String>,
    attrs: Vec<AttrSelector>,
}

impl Compound {
    fn is_empty(&self) -> bool {
        self.tag.is_none() && self.ids.is_empty() && self.classes.is_empty() && self.attrs.is_empty()
    }

    fn matches(&self, element: &Element) -> bool {
        if let Some(tag) = &self.tag {
            if !element.name.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        self.ids.iter().all(|id| element.attr("id") == Some(id.as_str()))
            && self.classes.iter().all(|c| element.has_class(c))
            && self.attrs.iter().all(|a| a.matches(element))
    }

    fn specificity(&self) -> Specificity {
        Specificity(
            self.ids.len() as u16,
            (self.classes.len() + self.attrs.len()) as u16,
            self.tag.is_some() as u16,
        )
    }
}

/// A complex selector, stored left to right.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    /// Each compound with the combinator linking it to the previous one.
    parts: Vec<(Combinator, Compound)>,
}

impl Selector {
    /// Parse one selector (no commas). `None` if it uses unsupported syntax.
    pub fn parse(input: &str) -> Option<Selector> {
        let mut parser = Parser {
            chars: input.trim().chars().collect(),
            pos: 0,
        };
        parser.selector()
    }

    pub fn specificity(&self) -> Specificity {
        self.parts
            .iter()
            .map(|(_, c)| c.specificity())
            .fold(Specificity::default(), |acc, s| {
                Specificity(acc.0 + s.0, acc.1 + s.1, acc.2 + s.2)
            })
    }

    /// Does `id` in `doc` match this selector?
    pub fn matches(&self, doc: &Document, id: NodeId) -> bool {
        match self.parts.len() {
            0 => false,
            n => self.matches_at(doc, id, n - 1),
        }
    }

    fn matches_at(&self, doc: &Document, id: NodeId, index: usize) -> bool {
        let (combinator, compound) = &self.parts[index];
        let Some(element) = doc.element(id) else {
            return false;
        };
        if !compound.matches(element) {
            return false;
        }
        if index == 0 {
            return true;
        }
        match combinator {
            Combinator::Child => doc
                .parent(id)
                .is_some_and(|p| self.matches_at(doc, p, index - 1)),
            Combinator::Descendant => doc
                .ancestors(id)
                .any(|a| self.matches_at(doc, a, index - 1)),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Parser
// ─────────────────────────────────────────────────────────────────────────────

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos != start
    }

    fn ident(&mut self) -> Option<String> {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '-' || c == '_' || !c.is_ascii() {
                out.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        (!out.is_empty()).then_some(out)
    }

    fn selector(&mut self) -> Option<Selector> {
        let mut parts = Vec::new();
        let mut combinator = Combinator::Descendant;
        loop {
            let compound = self.compound()?;
            parts.push((combinator, compound));

            let had_space = self.skip_whitespace();
            match self.peek() {
                None => break,
                Some('>') => {
                    self.bump();
                    self.skip_whitespace();
                    combinator = Combinator::Child;
                }
                Some(_) if had_space => combinator = Combinator::Descendant,
                Some(_) => return None,
            }
        }
        Some(Selector { parts })
    }

    fn compound(&mut self) -> Option<Compound> {
        let mut compound = Compound::default();
        let mut universal = false;
        loop {
            match self.peek() {
                Some('*') => {
                    self.bump();
                    universal = true;
                }
                Some('#') => {
                    self.bump();
                    compound.ids.push(self.ident()?);
                }
                Some('.') => {
                    self.bump();
                    compound.classes.push(self.ident()?);
                }
                Some('[') => {
                    self.bump();
                    compound.attrs.push(self.attribute()?);
                }
                Some(c) if c.is_alphabetic() && compound.is_empty() && !universal => {
                    compound.tag = Some(self.ident()?.to_ascii_lowercase());
                }
                Some(c) if c.is_whitespace() || c == '>' => break,
                None => break,
                // Pseudo-classes, sibling combinators, escapes
                Some(_) => return None,
            }
        }
        (universal || !compound.is_empty()).then_some(compound)
    }

    fn attribute(&mut self) -> Option<AttrSelector> {
        self.skip_whitespace();
        let name = self.ident()?.to_ascii_lowercase();
        self.skip_whitespace();
        let op = match self.bump()? {
            ']' => return Some(AttrSelector { name, op: AttrOp::Exists }),
            '=' => "=",
            c @ ('~' | '|' | '^' | '$' | '*') => {
                if self.bump()? != '=' {
                    return None;
                }
                match c {
                    '~' => "~=",
                    '|' => "|=",
                    '^' => "^=",
                    '$' => "$=",
                    _ => "*=",
                }
            }
            _ => return None,
        };
        self.skip_whitespace();
        let value = match self.peek()? {
            q @ ('"' | '\'') => {
                self.bump();
                let mut value = String::new();
                loop {
                    let c = self.bump()?;
                    if c == q {
                        break;
                    }
                    value.push(c);
                }
                value
            }
            _ => self.ident()?,
        };
        self.skip_whitespace();
        if self.bump()? != ']' {
            return None;
        }
        let op = match op {
            "=" => AttrOp::Equals(value),
            "~=" => AttrOp::Includes(value),
            "|=" => AttrOp::DashMatch(value),
            "^=" => AttrOp::Prefix(value),
            "$=" => AttrOp::Suffix(value),
            _ => AttrOp::Substring(value),
        };
        Some(AttrSelector { name, op })
    }
}
