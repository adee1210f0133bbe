//! Visual presets for the rendered preview.
//!
//! A template maps element selectors (relative to the content section) to
//! declaration blocks. Templates only influence host rendering; the copy
//! pipeline sees their effect through resolved styles.

mod registry;

pub use registry::TemplateRegistry;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Selector key that targets the content section itself.
pub const CONTAINER_KEY: &str = "container";

/// Name of the template used when none is configured or the configured one
/// does not exist.
pub const DEFAULT_TEMPLATE: &str = "default";

/// A named set of styles for the preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Selector (or [`CONTAINER_KEY`]) to declaration block.
    #[serde(default)]
    pub styles: StyleRules,
}

// ─────────────────────────────────────────────────────────────────────────────
// Style Rules
// ─────────────────────────────────────────────────────────────────────────────

/// Selector to declaration-block pairs in the order the preset lists them.
///
/// Order matters: it breaks ties between rules of equal specificity. A
/// repeated selector keeps its first position and takes the last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleRules(Vec<(String, String)>);

impl StyleRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule, replacing the declarations of an existing selector.
    pub fn insert(&mut self, selector: &str, declarations: &str) {
        match self.0.iter_mut().find(|(s, _)| s == selector) {
            Some((_, existing)) => *existing = declarations.to_string(),
            None => self.0.push((selector.to_string(), declarations.to_string())),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(s, d)| (s.as_str(), d.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: AsRef<str>, D: AsRef<str>> FromIterator<(S, D)> for StyleRules {
    fn from_iter<I: IntoIterator<Item = (S, D)>>(iter: I) -> Self {
        let mut rules = StyleRules::new();
        for (selector, declarations) in iter {
            rules.insert(selector.as_ref(), declarations.as_ref());
        }
        rules
    }
}

impl Serialize for StyleRules {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (selector, declarations) in &self.0 {
            map.serialize_entry(selector, declarations)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for StyleRules {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RulesVisitor;

        impl<'de> Visitor<'de> for RulesVisitor {
            type Value = StyleRules;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of selectors to declaration blocks")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<StyleRules, A::Error> {
                let mut rules = StyleRules::new();
                while let Some((selector, declarations)) = access.next_entry::<String, String>()? {
                    rules.insert(&selector, &declarations);
                }
                Ok(rules)
            }
        }

        deserializer.deserialize_map(RulesVisitor)
    }
}

impl Template {
    /// A template with no styles, so the preview falls back to base styling.
    pub fn empty(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            styles: StyleRules::new(),
        }
    }

    /// Render as a stylesheet scoped under `scope`.
    ///
    /// `{"h1, h2": "color: red"}` with scope `.mp-content-section` becomes
    /// `.mp-content-section h1, .mp-content-section h2 { color: red }`.
    pub fn to_css(&self, scope: &str) -> String {
        let mut css = String::new();
        for (selector, declarations) in self.styles.iter() {
            let scoped = selector
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| {
                    if s == CONTAINER_KEY {
                        scope.to_string()
                    } else {
                        format!("{} {}", scope, s)
                    }
                })
                .collect::<Vec<_>>()
                .join(", ");
            if scoped.is_empty() {
                continue;
            }
            css.push_str(&scoped);
            css.push_str(" { ");
            css.push_str(declarations.trim());
            css.push_str(" }\n");
        }
        css
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Template {
        serde_json::from_str(
            r#"{
                "id": "sample",
                "name": "Sample",
                "styles": {
                    "container": "color: #333;",
                    "h1, h2": "font-weight: 700;"
                }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_deserialize_template() {
        let template = sample();
        assert_eq!(template.id, "sample");
        assert_eq!(template.description, "");
        assert_eq!(template.styles.len(), 2);
    }

    #[test]
    fn test_to_css_scopes_selectors() {
        let css = sample().to_css(".mp-content-section");
        assert!(css.contains(".mp-content-section { color: #333; }"));
        assert!(css.contains(".mp-content-section h1, .mp-content-section h2 { font-weight: 700; }"));
    }

    #[test]
    fn test_to_css_keeps_preset_order() {
        let template: Template = serde_json::from_str(
            r#"{
                "id": "ordered",
                "name": "Ordered",
                "styles": {
                    "p": "color: red;",
                    "blockquote p": "color: green;",
                    "a": "color: blue;",
                    "p": "color: black;"
                }
            }"#,
        )
        .unwrap();

        let selectors: Vec<&str> = template.styles.iter().map(|(s, _)| s).collect();
        assert_eq!(selectors, vec!["p", "blockquote p", "a"]);

        let css = template.to_css(".s");
        let p = css.find(".s p { color: black; }").unwrap();
        let nested = css.find(".s blockquote p { color: green; }").unwrap();
        let a = css.find(".s a { color: blue; }").unwrap();
        assert!(p < nested && nested < a);
    }

    #[test]
    fn test_style_rules_serialize_in_order() {
        let rules: StyleRules = [("z", "color: red;"), ("a", "color: blue;")].into_iter().collect();
        assert_eq!(
            serde_json::to_string(&rules).unwrap(),
            r#"{"z":"color: red;","a":"color: blue;"}"#
        );
    }

    #[test]
    fn test_empty_template_renders_nothing() {
        assert_eq!(Template::empty("x").to_css(".s"), "");
    }
}
