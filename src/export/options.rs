//! Copy Options
//!
//! Per-run knobs for the copy pipeline, derived from persisted [`Settings`]
//! and overridable by the caller.

use super::svg::RasterSize;
use crate::config::{CalloutMode, Settings};
use std::time::Duration;

// ─────────────────────────────────────────────────────────────────────────────
// Copy Options
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration for one run of the copy pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyOptions {
    /// Class of the element whose content ends up on the clipboard
    pub content_section_class: String,

    /// Class that marks callout widgets
    pub callout_class: String,

    /// Whether callouts are rebuilt as blockquotes or kept as styled boxes
    pub callout_mode: CalloutMode,

    /// Whether `<img>` sources are embedded as data URIs
    pub inline_images: bool,

    /// Raster size for SVGs that state no size of their own
    pub svg_fallback: RasterSize,

    /// Spaces per tab in code blocks
    pub tab_width: u8,
}

impl Default for CopyOptions {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl CopyOptions {
    /// Build options from (already sanitized) settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            content_section_class: settings.content_section_class.clone(),
            callout_class: settings.callout_class.clone(),
            callout_mode: settings.callout_mode,
            inline_images: settings.inline_images,
            svg_fallback: RasterSize {
                width: settings.svg_fallback_width,
                height: settings.svg_fallback_height,
            },
            tab_width: settings.tab_width,
        }
    }

    /// Set the callout handling mode.
    pub fn with_callout_mode(mut self, mode: CalloutMode) -> Self {
        self.callout_mode = mode;
        self
    }

    /// Enable or disable image inlining.
    pub fn with_inline_images(mut self, inline: bool) -> Self {
        self.inline_images = inline;
        self
    }
}

/// HTTP timeout for image fetches, from settings.
pub fn fetch_timeout(settings: &Settings) -> Duration {
    Duration::from_secs(settings.fetch_timeout_secs)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_options_default() {
        let options = CopyOptions::default();
        assert_eq!(options.content_section_class, "mp-content-section");
        assert_eq!(options.callout_class, "callout");
        assert_eq!(options.callout_mode, CalloutMode::Blockquote);
        assert!(options.inline_images);
        assert_eq!(options.svg_fallback, RasterSize::FALLBACK);
        assert_eq!(options.tab_width, 4);
    }

    #[test]
    fn test_copy_options_from_settings() {
        let settings = Settings {
            callout_mode: CalloutMode::StyledBox,
            svg_fallback_width: 640,
            svg_fallback_height: 480,
            tab_width: 2,
            fetch_timeout_secs: 3,
            ..Default::default()
        };
        let options = CopyOptions::from_settings(&settings);
        assert_eq!(options.callout_mode, CalloutMode::StyledBox);
        assert_eq!(options.svg_fallback, RasterSize { width: 640, height: 480 });
        assert_eq!(options.tab_width, 2);
        assert_eq!(fetch_timeout(&settings), Duration::from_secs(3));
    }

    #[test]
    fn test_copy_options_builders() {
        let options = CopyOptions::default()
            .with_callout_mode(CalloutMode::StyledBox)
            .with_inline_images(false);
        assert!(!options.callout_mode.replaces_callouts());
        assert!(!options.inline_images);
    }
}
