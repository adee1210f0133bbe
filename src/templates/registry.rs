//! Lookup of built-in and user-supplied templates.

use super::{Template, DEFAULT_TEMPLATE};
use crate::error::{Error, Result};
use log::{debug, info, warn};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Built-in presets, embedded at compile time.
const BUILTIN_PRESETS: &[(&str, &str)] = &[
    ("default", include_str!("presets/default.json")),
    ("minimal", include_str!("presets/minimal.json")),
    ("elegant", include_str!("presets/elegant.json")),
    ("dark", include_str!("presets/dark.json")),
    ("academic", include_str!("presets/academic.json")),
];

/// All known templates, built-ins first, in registration order.
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    templates: Vec<Template>,
    fallback: Template,
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TemplateRegistry {
    /// Registry holding only the embedded presets.
    pub fn builtin() -> Self {
        let mut registry = Self {
            templates: Vec::new(),
            fallback: Template::empty(DEFAULT_TEMPLATE),
        };
        for (name, json) in BUILTIN_PRESETS {
            match serde_json::from_str::<Template>(json) {
                Ok(template) => registry.insert(template),
                Err(e) => warn!("Built-in template '{}' is invalid: {}", name, e),
            }
        }
        registry
    }

    /// Add or replace a template by id.
    pub fn insert(&mut self, template: Template) {
        match self.templates.iter_mut().find(|t| t.id == template.id) {
            Some(existing) => *existing = template,
            None => self.templates.push(template),
        }
    }

    /// Load every `*.json` directly inside `dir`. A user preset with the id of
    /// a built-in replaces it. Unparseable files are skipped with a warning.
    ///
    /// Returns the number of templates loaded.
    pub fn load_dir(&mut self, dir: &Path) -> usize {
        if !dir.is_dir() {
            debug!("No template directory at {}", dir.display());
            return 0;
        }

        let mut loaded = 0;
        let entries = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                e.path()
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
            });

        for entry in entries {
            match load_template_file(entry.path()) {
                Ok(template) => {
                    debug!("Loaded template '{}' from {}", template.id, entry.path().display());
                    self.insert(template);
                    loaded += 1;
                }
                Err(e) => warn!("Skipping template: {}", e),
            }
        }

        if loaded > 0 {
            info!("Loaded {} user template(s) from {}", loaded, dir.display());
        }
        loaded
    }

    pub fn get(&self, id: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.id == id)
    }

    /// Look up `id`, falling back to the default template with a warning.
    pub fn resolve(&self, id: &str) -> &Template {
        if let Some(template) = self.get(id) {
            return template;
        }
        warn!("Unknown template '{}', using '{}'", id, DEFAULT_TEMPLATE);
        self.get(DEFAULT_TEMPLATE).unwrap_or(&self.fallback)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Template> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

fn load_template_file(path: &Path) -> Result<Template> {
    let contents = fs::read_to_string(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&contents).map_err(|e| Error::TemplateParse {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_builtin_presets_parse() {
        let registry = TemplateRegistry::builtin();
        assert_eq!(registry.len(), BUILTIN_PRESETS.len());
        let ids: Vec<&str> = registry.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["default", "minimal", "elegant", "dark", "academic"]);
        assert!(registry.iter().all(|t| !t.styles.is_empty()));
    }

    #[test]
    fn test_resolve_unknown_falls_back_to_default() {
        let registry = TemplateRegistry::builtin();
        assert_eq!(registry.resolve("elegant").id, "elegant");
        assert_eq!(registry.resolve("no-such-template").id, "default");
    }

    #[test]
    fn test_load_dir_adds_and_overrides() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("brand.json"),
            r#"{"id": "brand", "name": "Brand", "styles": {"h1": "color: #e11d48;"}}"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("dark.json"),
            r#"{"id": "dark", "name": "My Dark", "styles": {}}"#,
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        fs::write(dir.path().join("broken.json"), "{").unwrap();

        let mut registry = TemplateRegistry::builtin();
        let before = registry.len();
        assert_eq!(registry.load_dir(dir.path()), 2);
        assert_eq!(registry.len(), before + 1);
        assert_eq!(registry.get("dark").unwrap().name, "My Dark");
        assert!(registry.get("brand").is_some());
    }

    #[test]
    fn test_load_missing_dir() {
        let dir = TempDir::new().unwrap();
        let mut registry = TemplateRegistry::builtin();
        assert_eq!(registry.load_dir(&dir.path().join("nope")), 0);
    }
}
