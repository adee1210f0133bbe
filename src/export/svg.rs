//! SVG to PNG rasterization for the image inliner.

use crate::error::{Error, Result};
use log::debug;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use resvg::{tiny_skia, usvg};
use std::sync::{Arc, OnceLock};

/// Surface size used when the SVG states no usable size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterSize {
    pub width: u32,
    pub height: u32,
}

impl RasterSize {
    pub const FALLBACK: RasterSize = RasterSize {
        width: 1200,
        height: 800,
    };

    /// Longest side a surface may have.
    pub const MAX_SIDE: u32 = 8192;

    /// Size for a `width` x `height` drawing, scaled down to fit
    /// [`Self::MAX_SIDE`] with the aspect ratio kept.
    fn fitted(width: f32, height: f32) -> RasterSize {
        let longest = width.max(height);
        let scale = if longest > Self::MAX_SIDE as f32 {
            Self::MAX_SIDE as f32 / longest
        } else {
            1.0
        };
        RasterSize {
            width: to_pixels(width * scale),
            height: to_pixels(height * scale),
        }
    }

    fn fits(self) -> bool {
        self.width <= Self::MAX_SIDE && self.height <= Self::MAX_SIDE
    }
}

/// Size of the raster surface for `svg`.
///
/// Width and height come from the root element's `width`/`height`
/// attributes when both are usable numbers; otherwise both come from the
/// third and fourth `viewBox` numbers; otherwise `fallback` is used.
/// Sizes taken from the SVG are scaled down to at most
/// [`RasterSize::MAX_SIDE`] per side.
pub fn svg_raster_size(svg: &str, fallback: RasterSize) -> RasterSize {
    let Some(root) = root_attributes(svg) else {
        return fallback;
    };

    let mut width = root.width.as_deref().and_then(leading_number);
    let mut height = root.height.as_deref().and_then(leading_number);

    if width.is_none() || height.is_none() {
        if let Some(view_box) = root.view_box.as_deref() {
            let parts: Vec<&str> = view_box
                .split(|c: char| c.is_whitespace() || c == ',')
                .filter(|p| !p.is_empty())
                .collect();
            if parts.len() == 4 {
                width = leading_number(parts[2]);
                height = leading_number(parts[3]);
            }
        }
    }

    match (width, height) {
        (Some(w), Some(h)) => {
            let size = RasterSize::fitted(w, h);
            if size.width as f32 != w.round() || size.height as f32 != h.round() {
                debug!("SVG size {}x{} scaled down to {}x{}", w, h, size.width, size.height);
            }
            size
        }
        _ => fallback,
    }
}

/// Render `svg` onto a transparent surface of exactly `size`, stretching the
/// drawing to fill it, and encode the result as PNG.
///
/// Surfaces larger than [`RasterSize::MAX_SIDE`] on either side are refused.
pub fn rasterize_svg(svg: &str, size: RasterSize) -> Result<Vec<u8>> {
    if !size.fits() {
        return Err(Error::SvgRender(format!(
            "Surface {}x{} exceeds {} pixels per side",
            size.width,
            size.height,
            RasterSize::MAX_SIDE
        )));
    }
    let options = usvg::Options {
        fontdb: system_fonts(),
        ..Default::default()
    };
    let tree = usvg::Tree::from_str(svg, &options)
        .map_err(|e| Error::SvgRender(format!("Failed to parse SVG: {}", e)))?;

    let mut pixmap = tiny_skia::Pixmap::new(size.width, size.height)
        .ok_or_else(|| Error::SvgRender("Failed to create pixmap".to_string()))?;

    let tree_size = tree.size();
    let transform = tiny_skia::Transform::from_scale(
        size.width as f32 / tree_size.width(),
        size.height as f32 / tree_size.height(),
    );
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    debug!("Rasterized SVG at {}x{}", size.width, size.height);
    pixmap
        .encode_png()
        .map_err(|e| Error::SvgRender(format!("Failed to encode PNG: {}", e)))
}

fn system_fonts() -> Arc<usvg::fontdb::Database> {
    static FONTDB: OnceLock<Arc<usvg::fontdb::Database>> = OnceLock::new();
    FONTDB
        .get_or_init(|| {
            let mut db = usvg::fontdb::Database::new();
            db.load_system_fonts();
            Arc::new(db)
        })
        .clone()
}

// ─────────────────────────────────────────────────────────────────────────────
// Root Attributes
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct RootAttributes {
    width: Option<String>,
    height: Option<String>,
    view_box: Option<String>,
}

/// Size attributes of the first element, if it is `<svg>`.
fn root_attributes(svg: &str) -> Option<RootAttributes> {
    let mut reader = Reader::from_str(svg);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                if !e.local_name().as_ref().eq_ignore_ascii_case(b"svg") {
                    return None;
                }
                let mut root = RootAttributes::default();
                for attr in e.attributes().flatten() {
                    let Ok(value) = attr.unescape_value() else {
                        continue;
                    };
                    match attr.key.local_name().as_ref() {
                        b"width" => root.width = Some(value.into_owned()),
                        b"height" => root.height = Some(value.into_owned()),
                        b"viewBox" => root.view_box = Some(value.into_owned()),
                        _ => {}
                    }
                }
                return Some(root);
            }
            Ok(Event::Eof) | Err(_) => return None,
            Ok(_) => {}
        }
    }
}

/// Parse the leading number of `"120.5px"` the way lenient parsers do.
/// Percentages and non-positive values are rejected.
fn leading_number(value: &str) -> Option<f32> {
    let value = value.trim();
    if value.ends_with('%') {
        return None;
    }
    let end = value
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || c == '.' || (i == 0 && (c == '-' || c == '+'))))
        .map(|(i, _)| i)
        .unwrap_or(value.len());
    let number: f32 = value[..end].parse().ok()?;
    (number.is_finite() && number > 0.0).then_some(number)
}

fn to_pixels(value: f32) -> u32 {
    (value.round() as u32).clamp(1, RasterSize::MAX_SIDE)
}
