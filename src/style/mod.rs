//! CSS resolution for the live tree.
//!
//! Snapshotting needs "what would the browser compute for this element".
//! This module answers that for the subset of CSS the copy pipeline cares
//! about: simple selectors, the cascade, shorthands, inheritance and custom
//! properties. The result is exposed through [`ComputedStyleSource`] so the
//! pipeline does not care where resolved styles come from.

mod cascade;
mod declaration;
mod properties;
mod selector;
mod stylesheet;
mod user_agent;

pub use cascade::Cascade;
pub use declaration::{parse_declarations, Declaration, InlineStyle};
pub use properties::{is_inherited, SNAPSHOT_PROPERTIES};
pub use selector::{Selector, Specificity};
pub use stylesheet::{Rule, Stylesheet};
pub use user_agent::USER_AGENT_CSS;

use crate::dom::NodeId;
use std::collections::{BTreeMap, HashMap};

/// Resolved property values for one element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComputedStyle {
    values: BTreeMap<String, String>,
}

impl ComputedStyle {
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// Resolved value for `name`, or `None` when empty or unset.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Anything that can report the resolved style of a live-tree element.
pub trait ComputedStyleSource {
    fn computed_style(&self, node: NodeId) -> Option<&ComputedStyle>;
}

/// Resolved styles keyed by node, as produced by [`Cascade::compute`].
#[derive(Debug, Clone, Default)]
pub struct StyleMap {
    styles: HashMap<NodeId, ComputedStyle>,
}

impl StyleMap {
    pub fn insert(&mut self, node: NodeId, style: ComputedStyle) {
        self.styles.insert(node, style);
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}

impl ComputedStyleSource for StyleMap {
    fn computed_style(&self, node: NodeId) -> Option<&ComputedStyle> {
        self.styles.get(&node)
    }
}
