//! clipstyle
//!
//! Copies a rendered, styled article preview to the clipboard as
//! self-contained HTML: resolved styles become inline `style` attributes,
//! callouts become portable blockquotes, images are embedded as data URIs
//! and code indentation survives the paste.

pub mod config;
pub mod dom;
pub mod error;
pub mod export;
pub mod style;
pub mod templates;

pub use error::{Error, Result};
