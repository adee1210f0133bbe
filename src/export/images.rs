//! Image inlining: every `<img>` in the working tree gets a data URI `src`.

use super::fetch::{decode_data_uri, is_svg_data_uri, ResourceFetcher, SVG_MEDIA_TYPE};
use super::svg::{rasterize_svg, svg_raster_size, RasterSize};
use crate::dom::{Document, NodeId};
use crate::error::{Error, Result};
use base64::Engine;
use log::{debug, error, info};
use std::collections::VecDeque;

/// Per-run counts. Failures are also logged individually.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InlineReport {
    pub inlined: usize,
    pub failed: usize,
}

/// Inline every image under `root`, one at a time.
///
/// A failing image keeps its original `src` and does not stop the others.
pub fn inline_images(
    doc: &mut Document,
    root: NodeId,
    fetcher: &dyn ResourceFetcher,
    svg_fallback: RasterSize,
) -> InlineReport {
    let mut queue: VecDeque<NodeId> = doc.elements_by_tag(root, "img").into();
    let mut report = InlineReport::default();
    debug!("Inlining {} image(s)", queue.len());

    while let Some(img) = queue.pop_front() {
        let Some(src) = doc.attr(img, "src").map(|s| s.trim().to_string()) else {
            error!("Image without src cannot be inlined");
            report.failed += 1;
            continue;
        };

        if src.starts_with("data:") && !is_svg_data_uri(&src) {
            debug!("Image already embedded, skipping");
            continue;
        }

        match inline_one(&src, fetcher, svg_fallback) {
            Ok(data_uri) => {
                doc.set_attr(img, "src", &data_uri);
                report.inlined += 1;
            }
            Err(e) => {
                error!("Failed to inline image: {}", e);
                report.failed += 1;
            }
        }
    }

    if report.inlined + report.failed > 0 {
        info!(
            "Images: {} inlined, {} failed",
            report.inlined, report.failed
        );
    }
    report
}

fn inline_one(src: &str, fetcher: &dyn ResourceFetcher, svg_fallback: RasterSize) -> Result<String> {
    let resource = if src.starts_with("data:") {
        decode_data_uri(src)?
    } else {
        fetcher.fetch(src)?
    };
    let media_type = resource.resolve_media_type(src);

    if media_type == SVG_MEDIA_TYPE || is_svg_data_uri(src) {
        let svg = String::from_utf8(resource.bytes).map_err(|e| Error::SvgRender(e.to_string()))?;
        let size = svg_raster_size(&svg, svg_fallback);
        let png = rasterize_svg(&svg, size)?;
        return Ok(data_uri("image/png", &png));
    }

    Ok(data_uri(&media_type, &resource.bytes))
}

/// `data:<media type>;base64,<payload>`
pub fn data_uri(media_type: &str, bytes: &[u8]) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{};base64,{}", media_type, encoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::fetch::FetchedResource;
    use std::cell::RefCell;
    use std::collections::HashMap;

    const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 1, 2, 3];
    const SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 300 150"><rect width="300" height="150" fill="#00f"/></svg>"##;

    /// Serves canned responses and records the order of requests.
    #[derive(Default)]
    struct FakeFetcher {
        responses: HashMap<String, FetchedResource>,
        requests: RefCell<Vec<String>>,
    }

    impl FakeFetcher {
        fn with(mut self, src: &str, bytes: &[u8], media_type: Option<&str>) -> Self {
            self.responses.insert(
                src.to_string(),
                FetchedResource {
                    bytes: bytes.to_vec(),
                    media_type: media_type.map(str::to_string),
                },
            );
            self
        }
    }

    impl ResourceFetcher for FakeFetcher {
        fn fetch(&self, src: &str) -> Result<FetchedResource> {
            self.requests.borrow_mut().push(src.to_string());
            self.responses.get(src).cloned().ok_or_else(|| Error::ImageFetch {
                src: src.to_string(),
                message: "HTTP 404".to_string(),
            })
        }
    }

    fn srcs(doc: &Document) -> Vec<String> {
        doc.elements_by_tag(doc.root(), "img")
            .into_iter()
            .map(|i| doc.attr(i, "src").unwrap_or("").to_string())
            .collect()
    }

    #[test]
    fn test_one_failure_does_not_stop_others() {
        let mut doc = Document::parse_html(
            r#"<img src="a.png"><img src="missing.png"><img src="c.png">"#,
        );
        let fetcher = FakeFetcher::default()
            .with("a.png", PNG_BYTES, None)
            .with("c.png", PNG_BYTES, Some("image/png"));

        let root = doc.root();
        let report = inline_images(&mut doc, root, &fetcher, RasterSize::FALLBACK);

        assert_eq!(report, InlineReport { inlined: 2, failed: 1 });
        let srcs = srcs(&doc);
        assert!(srcs[0].starts_with("data:image/png;base64,"));
        assert_eq!(srcs[1], "missing.png");
        assert!(srcs[2].starts_with("data:image/png;base64,"));
        assert_eq!(
            *fetcher.requests.borrow(),
            vec!["a.png", "missing.png", "c.png"]
        );
    }

    #[test]
    fn test_svg_becomes_png() {
        let mut doc = Document::parse_html(r#"<img src="chart.svg">"#);
        let fetcher = FakeFetcher::default().with("chart.svg", SVG.as_bytes(), Some(SVG_MEDIA_TYPE));

        let root = doc.root();
        let report = inline_images(&mut doc, root, &fetcher, RasterSize::FALLBACK);

        assert_eq!(report.inlined, 1);
        let src = &srcs(&doc)[0];
        assert!(src.starts_with("data:image/png;base64,"));
        let payload = src.trim_start_matches("data:image/png;base64,");
        let png = base64::engine::general_purpose::STANDARD.decode(payload).unwrap();
        let image = image::load_from_memory(&png).unwrap();
        assert_eq!((image.width(), image.height()), (300, 150));
    }

    fn png_size(src: &str) -> (u32, u32) {
        let payload = src.trim_start_matches("data:image/png;base64,");
        let png = base64::engine::general_purpose::STANDARD.decode(payload).unwrap();
        let image = image::load_from_memory(&png).unwrap();
        (image.width(), image.height())
    }

    #[test]
    fn test_sizeless_svg_uses_fallback_surface() {
        let sizeless = r##"<svg xmlns="http://www.w3.org/2000/svg"><rect width="10" height="10" fill="#0f0"/></svg>"##;
        let mut doc = Document::parse_html(r#"<img src="plain.svg">"#);
        let fetcher = FakeFetcher::default().with("plain.svg", sizeless.as_bytes(), Some(SVG_MEDIA_TYPE));

        let root = doc.root();
        let report = inline_images(&mut doc, root, &fetcher, RasterSize::FALLBACK);

        assert_eq!(report.inlined, 1);
        assert_eq!(png_size(&srcs(&doc)[0]), (1200, 800));
    }

    #[test]
    fn test_oversized_svg_is_capped_and_others_continue() {
        let huge = r##"<svg xmlns="http://www.w3.org/2000/svg" width="200000" height="100000"><rect width="10" height="10"/></svg>"##;
        let mut doc = Document::parse_html(r#"<img src="huge.svg"><img src="a.png">"#);
        let fetcher = FakeFetcher::default()
            .with("huge.svg", huge.as_bytes(), Some(SVG_MEDIA_TYPE))
            .with("a.png", PNG_BYTES, None);

        let root = doc.root();
        let report = inline_images(&mut doc, root, &fetcher, RasterSize::FALLBACK);

        assert_eq!(report, InlineReport { inlined: 2, failed: 0 });
        let srcs = srcs(&doc);
        assert_eq!(png_size(&srcs[0]), (RasterSize::MAX_SIDE, RasterSize::MAX_SIDE / 2));
        assert!(srcs[1].starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_svg_data_uri_is_rasterized_without_fetching() {
        let src = data_uri(SVG_MEDIA_TYPE, SVG.as_bytes());
        let mut doc = Document::parse_html(&format!(r#"<img src="{}">"#, src));
        let fetcher = FakeFetcher::default();

        let root = doc.root();
        let report = inline_images(&mut doc, root, &fetcher, RasterSize::FALLBACK);

        assert_eq!(report.inlined, 1);
        assert!(srcs(&doc)[0].starts_with("data:image/png;base64,"));
        assert!(fetcher.requests.borrow().is_empty());
    }

    #[test]
    fn test_existing_raster_data_uri_left_alone() {
        let src = data_uri("image/png", PNG_BYTES);
        let mut doc = Document::parse_html(&format!(r#"<img src="{}">"#, src));
        let root = doc.root();
        let report = inline_images(&mut doc, root, &FakeFetcher::default(), RasterSize::FALLBACK);
        assert_eq!(report, InlineReport::default());
        assert_eq!(srcs(&doc)[0], src);
    }

    #[test]
    fn test_image_without_src_counts_as_failed() {
        let mut doc = Document::parse_html("<img alt=\"x\">");
        let root = doc.root();
        let report = inline_images(&mut doc, root, &FakeFetcher::default(), RasterSize::FALLBACK);
        assert_eq!(report.failed, 1);
    }

    #[test]
    fn test_broken_svg_keeps_src() {
        let mut doc = Document::parse_html(r#"<img src="bad.svg">"#);
        let fetcher = FakeFetcher::default().with("bad.svg", b"<svg", Some(SVG_MEDIA_TYPE));
        let root = doc.root();
        let report = inline_images(&mut doc, root, &fetcher, RasterSize::FALLBACK);
        assert_eq!(report.failed, 1);
        assert_eq!(srcs(&doc)[0], "bad.svg");
    }

    #[test]
    fn test_data_uri_format() {
        assert_eq!(data_uri("image/gif", b"hi"), "data:image/gif;base64,aGk=");
    }
}
