//! Clipboard Output
//!
//! The pipeline writes through the [`ClipboardSink`] trait so tests and
//! non-interactive runs can capture the payload. [`SystemClipboard`] is the
//! real target, backed by the arboard crate.

use crate::error::{Error, Result};
use arboard::Clipboard;
use log::debug;

// ─────────────────────────────────────────────────────────────────────────────
// Sink
// ─────────────────────────────────────────────────────────────────────────────

/// Destination for a rich clipboard payload.
pub trait ClipboardSink {
    /// Publish `html` as `text/html` with `plain_text` as the plain-text flavor.
    fn write(&mut self, html: &str, plain_text: &str) -> Result<()>;
}

/// The platform clipboard.
///
/// The arboard handle is opened lazily on the first write, so building a
/// `SystemClipboard` never fails on machines without a display.
#[derive(Default)]
pub struct SystemClipboard {
    clipboard: Option<Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&mut self) -> Result<&mut Clipboard> {
        if self.clipboard.is_none() {
            let clipboard = Clipboard::new()
                .map_err(|e| Error::Clipboard(format!("Clipboard access error: {}", e)))?;
            self.clipboard = Some(clipboard);
        }
        self.clipboard
            .as_mut()
            .ok_or_else(|| Error::Clipboard("Clipboard unavailable".to_string()))
    }
}

impl ClipboardSink for SystemClipboard {
    fn write(&mut self, html: &str, plain_text: &str) -> Result<()> {
        self.handle()?.set_html(html, Some(plain_text))?;
        debug!(
            "Wrote {} bytes of HTML ({} bytes plain text) to the clipboard",
            html.len(),
            plain_text.len()
        );
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
