//! User settings for clipstyle
//!
//! This module defines the `Settings` struct that holds all user-configurable
//! options, with serde support for JSON persistence.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Callout Handling
// ─────────────────────────────────────────────────────────────────────────────

/// What happens to callout widgets in the copied HTML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CalloutMode {
    /// Theme the callout, then rebuild it as a plain `<blockquote>` (default)
    #[default]
    Blockquote,
    /// Keep the original callout markup with literal colors applied
    StyledBox,
}

impl CalloutMode {
    /// Get a display label for the mode.
    pub fn label(&self) -> &'static str {
        match self {
            CalloutMode::Blockquote => "Blockquote",
            CalloutMode::StyledBox => "Styled box",
        }
    }

    /// Whether callouts are rebuilt as blockquotes.
    pub fn replaces_callouts(&self) -> bool {
        matches!(self, CalloutMode::Blockquote)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Main Settings Struct
// ─────────────────────────────────────────────────────────────────────────────

/// User settings, persisted as JSON.
///
/// Unknown fields are ignored and missing ones take their defaults, so older
/// and newer config files both load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // ─────────────────────────────────────────────────────────────────────────
    // Rendering
    // ─────────────────────────────────────────────────────────────────────────
    /// Name of the visual preset applied to the preview
    pub template: String,

    /// Class that marks the element whose content is copied
    pub content_section_class: String,

    /// Class that marks callout widgets
    pub callout_class: String,

    // ─────────────────────────────────────────────────────────────────────────
    // Copy Pipeline
    // ─────────────────────────────────────────────────────────────────────────
    /// How callouts end up in the copied HTML
    pub callout_mode: CalloutMode,

    /// Whether images are fetched and embedded as data URIs
    pub inline_images: bool,

    /// Raster width for SVGs with neither size attributes nor a viewBox
    pub svg_fallback_width: u32,

    /// Raster height for SVGs with neither size attributes nor a viewBox
    pub svg_fallback_height: u32,

    /// Timeout for each remote image request
    pub fetch_timeout_secs: u64,

    /// Largest image that will be embedded
    pub max_image_bytes: u64,

    /// Spaces per tab when normalizing code blocks
    pub tab_width: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            // Rendering
            template: String::from("default"),
            content_section_class: String::from("mp-content-section"),
            callout_class: String::from("callout"),

            // Copy Pipeline
            callout_mode: CalloutMode::default(),
            inline_images: true,
            svg_fallback_width: 1200,
            svg_fallback_height: 800,
            fetch_timeout_secs: 10,
            max_image_bytes: 20 * 1024 * 1024,
            tab_width: 4,
        }
    }
}

impl Settings {
    // ─────────────────────────────────────────────────────────────────────────
    // Validation Constants and Sanitization
    // ─────────────────────────────────────────────────────────────────────────

    /// Minimum allowed tab width.
    pub const MIN_TAB_WIDTH: u8 = 1;
    /// Maximum allowed tab width.
    pub const MAX_TAB_WIDTH: u8 = 16;
    /// Minimum SVG fallback dimension.
    pub const MIN_SVG_SIZE: u32 = 1;
    /// Maximum SVG fallback dimension.
    pub const MAX_SVG_SIZE: u32 = 8192;
    /// Minimum fetch timeout.
    pub const MIN_FETCH_TIMEOUT_SECS: u64 = 1;
    /// Maximum fetch timeout.
    pub const MAX_FETCH_TIMEOUT_SECS: u64 = 300;

    /// Sanitize settings by clamping values to valid ranges.
    ///
    /// This is useful after loading settings from a file that might have
    /// been manually edited with invalid values.
    pub fn sanitize(&mut self) {
        self.tab_width = self
            .tab_width
            .clamp(Self::MIN_TAB_WIDTH, Self::MAX_TAB_WIDTH);

        self.svg_fallback_width = self
            .svg_fallback_width
            .clamp(Self::MIN_SVG_SIZE, Self::MAX_SVG_SIZE);
        self.svg_fallback_height = self
            .svg_fallback_height
            .clamp(Self::MIN_SVG_SIZE, Self::MAX_SVG_SIZE);

        self.fetch_timeout_secs = self
            .fetch_timeout_secs
            .clamp(Self::MIN_FETCH_TIMEOUT_SECS, Self::MAX_FETCH_TIMEOUT_SECS);

        if self.max_image_bytes == 0 {
            self.max_image_bytes = Settings::default().max_image_bytes;
        }

        // Class names are matched literally; a blank one would match nothing
        if self.content_section_class.trim().is_empty() {
            self.content_section_class = Settings::default().content_section_class;
        }
        if self.callout_class.trim().is_empty() {
            self.callout_class = Settings::default().callout_class;
        }
        if self.template.trim().is_empty() {
            self.template = Settings::default().template;
        }
    }

    /// Load settings and sanitize them to ensure validity.
    ///
    /// This is a convenience method that deserializes and then sanitizes.
    pub fn from_json_sanitized(json: &str) -> Result<Self, serde_json::Error> {
        let mut settings: Self = serde_json::from_str(json)?;
        settings.sanitize();
        Ok(settings)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
