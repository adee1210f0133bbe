//! Centralized error handling for clipstyle
//!
//! This module provides a unified error type that covers the failure modes of
//! the copy pipeline, configuration, template loading and I/O. Per-image
//! failures never surface here as a pipeline error: the image inliner logs
//! them and keeps going.

use log::warn;
use std::fmt;
use std::io;
use std::path::PathBuf;

// ─────────────────────────────────────────────────────────────────────────────
// Custom Result Type Alias
// ─────────────────────────────────────────────────────────────────────────────

/// A specialized `Result` type for the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The centralized error type for the crate.
#[derive(Debug)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────────────────
    // File I/O Errors
    // ─────────────────────────────────────────────────────────────────────────
    /// Generic I/O error wrapper
    Io(io::Error),

    /// Failed to read an input file
    FileRead { path: PathBuf, source: io::Error },

    /// Failed to write file contents
    FileWrite { path: PathBuf, source: io::Error },

    // ─────────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────────
    /// Failed to load configuration file
    ConfigLoad {
        path: PathBuf,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Failed to save configuration file
    ConfigSave {
        path: PathBuf,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Failed to parse configuration (invalid JSON/format)
    ConfigParse {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration directory not found or inaccessible
    ConfigDirNotFound,

    /// A template preset file could not be parsed
    TemplateParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Pipeline Errors
    // ─────────────────────────────────────────────────────────────────────────
    /// No element with the content-section class in the source or the clone
    ContentSectionNotFound { class: String },

    /// The node handed to the pipeline is not an element of the document
    InvalidRoot,

    /// Fetching an image failed
    ImageFetch { src: String, message: String },

    /// Decoding or rasterizing an SVG failed
    SvgRender(String),

    /// The clipboard could not be opened or written
    Clipboard(String),

    // ─────────────────────────────────────────────────────────────────────────
    // Application Errors
    // ─────────────────────────────────────────────────────────────────────────
    /// Generic application error with a message
    Application(String),
}

// Implement From traits for convenient error conversion
impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::ConfigParse {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<arboard::Error> for Error {
    fn from(err: arboard::Error) -> Self {
        Error::Clipboard(err.to_string())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Display trait implementation for user-friendly error messages
// ─────────────────────────────────────────────────────────────────────────────
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // File I/O Errors
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::FileRead { path, source } => {
                write!(f, "Failed to read '{}': {}", path.display(), source)
            }
            Error::FileWrite { path, source } => {
                write!(f, "Failed to write '{}': {}", path.display(), source)
            }

            // Configuration Errors
            Error::ConfigLoad { path, source } => {
                write!(
                    f,
                    "Failed to load configuration from '{}': {}",
                    path.display(),
                    source
                )
            }
            Error::ConfigSave { path, source } => {
                write!(
                    f,
                    "Failed to save configuration to '{}': {}",
                    path.display(),
                    source
                )
            }
            Error::ConfigParse { message, .. } => {
                write!(f, "Invalid configuration format: {}", message)
            }
            Error::ConfigDirNotFound => {
                write!(f, "Configuration directory not found")
            }
            Error::TemplateParse { path, source } => {
                write!(f, "Invalid template '{}': {}", path.display(), source)
            }

            // Pipeline Errors
            Error::ContentSectionNotFound { class } => {
                write!(f, "Content section '.{}' not found", class)
            }
            Error::InvalidRoot => write!(f, "Copy root is not an element"),
            Error::ImageFetch { src, message } => {
                write!(f, "Failed to fetch image '{}': {}", src, message)
            }
            Error::SvgRender(msg) => write!(f, "SVG rasterization failed: {}", msg),
            Error::Clipboard(msg) => write!(f, "Clipboard error: {}", msg),

            // Application Errors
            Error::Application(msg) => write!(f, "{}", msg),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// std::error::Error trait implementation for error chaining
// ─────────────────────────────────────────────────────────────────────────────
impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::FileRead { source, .. } | Error::FileWrite { source, .. } => Some(source),
            Error::ConfigLoad { source, .. } => Some(source.as_ref()),
            Error::ConfigSave { source, .. } => Some(source.as_ref()),
            Error::ConfigParse { source, .. } => source
                .as_ref()
                .map(|s| s.as_ref() as &(dyn std::error::Error + 'static)),
            Error::TemplateParse { source, .. } => Some(source),
            Error::ConfigDirNotFound
            | Error::ContentSectionNotFound { .. }
            | Error::InvalidRoot
            | Error::ImageFetch { .. }
            | Error::SvgRender(_)
            | Error::Clipboard(_)
            | Error::Application(_) => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Graceful Degradation Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Extension trait for Result to support graceful degradation.
pub trait ResultExt<T> {
    /// If the result is an error, log it at warning level and return the provided default.
    fn unwrap_or_warn_default(self, default: T, context: &str) -> T;
}

impl<T> ResultExt<T> for Result<T> {
    fn unwrap_or_warn_default(self, default: T, context: &str) -> T {
        match self {
            Ok(value) => value,
            Err(err) => {
                warn!("{}: {}. Using default.", context, err);
                default
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_creation() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "test error");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_file_read_error() {
        let path = PathBuf::from("/test/article.md");
        let err = Error::FileRead {
            path: path.clone(),
            source: io::Error::new(io::ErrorKind::NotFound, "missing"),
        };
        assert!(matches!(&err, Error::FileRead { path: p, .. } if *p == path));
        assert!(err.to_string().contains("article.md"));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_result: std::result::Result<String, _> = serde_json::from_str("invalid json");
        let err = Error::from(json_result.unwrap_err());
        assert!(matches!(err, Error::ConfigParse { .. }));
    }

    #[test]
    fn test_display_content_section_not_found() {
        let err = Error::ContentSectionNotFound {
            class: "mp-content-section".to_string(),
        };
        assert_eq!(err.to_string(), "Content section '.mp-content-section' not found");
    }

    #[test]
    fn test_display_image_fetch() {
        let err = Error::ImageFetch {
            src: "https://example.com/a.png".to_string(),
            message: "HTTP 404".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("example.com/a.png"));
        assert!(msg.contains("HTTP 404"));
    }

    #[test]
    fn test_display_config_dir_not_found() {
        let err = Error::ConfigDirNotFound;
        assert_eq!(format!("{}", err), "Configuration directory not found");
    }

    #[test]
    fn test_error_source_io() {
        use std::error::Error as StdError;
        let err = Error::Io(io::Error::new(io::ErrorKind::NotFound, "not found"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_error_source_none_for_simple_variants() {
        use std::error::Error as StdError;
        assert!(Error::Application("test".to_string()).source().is_none());
        assert!(Error::Clipboard("busy".to_string()).source().is_none());
        assert!(Error::ConfigDirNotFound.source().is_none());
    }

    #[test]
    fn test_unwrap_or_warn_default_ok() {
        let result: super::Result<i32> = Ok(42);
        assert_eq!(result.unwrap_or_warn_default(0, "test context"), 42);
    }

    #[test]
    fn test_unwrap_or_warn_default_err() {
        let result: super::Result<i32> = Err(Error::Application("test".to_string()));
        assert_eq!(result.unwrap_or_warn_default(0, "test context"), 0);
    }
}
