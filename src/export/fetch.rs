//! Loading image bytes for the inliner.
//!
//! `src` values come in three shapes: `data:` URIs (decoded in place),
//! `http(s)` URLs (blocking reqwest client with a timeout), and `file:` URLs
//! or plain paths (read from disk, relative paths resolved against a base).

use crate::error::{Error, Result};
use base64::Engine;
use log::debug;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

const USER_AGENT: &str = concat!("clipstyle/", env!("CARGO_PKG_VERSION"));

pub const SVG_MEDIA_TYPE: &str = "image/svg+xml";

/// Bytes of a fetched resource plus whatever media type the source reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedResource {
    pub bytes: Vec<u8>,
    pub media_type: Option<String>,
}

impl FetchedResource {
    /// Media type to embed with: reported, else sniffed from the bytes, else
    /// guessed from the extension of `src`, else `application/octet-stream`.
    pub fn resolve_media_type(&self, src: &str) -> String {
        self.media_type
            .as_deref()
            .filter(|m| !m.is_empty() && *m != "application/octet-stream")
            .map(str::to_string)
            .or_else(|| sniff_media_type(&self.bytes).map(str::to_string))
            .or_else(|| media_type_from_extension(src).map(str::to_string))
            .unwrap_or_else(|| "application/octet-stream".to_string())
    }
}

/// Source of image bytes.
pub trait ResourceFetcher {
    fn fetch(&self, src: &str) -> Result<FetchedResource>;
}

/// Where relative `src` values are resolved from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchBase {
    Url(Url),
    Dir(PathBuf),
}

impl FetchBase {
    /// Interpret `--base` style input: an absolute URL, or a directory path.
    pub fn parse(input: &str) -> FetchBase {
        match Url::parse(input) {
            Ok(url) if matches!(url.scheme(), "http" | "https" | "file") => FetchBase::Url(url),
            _ => FetchBase::Dir(PathBuf::from(input)),
        }
    }
}

/// Fetcher used outside of tests.
pub struct DefaultFetcher {
    client: reqwest::blocking::Client,
    base: Option<FetchBase>,
    max_bytes: u64,
}

impl DefaultFetcher {
    pub fn new(timeout: Duration, max_bytes: u64) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Application(format!("HTTP client build error: {}", e)))?;
        Ok(Self {
            client,
            base: None,
            max_bytes,
        })
    }

    pub fn with_base(mut self, base: FetchBase) -> Self {
        self.base = Some(base);
        self
    }

    fn fetch_http(&self, url: &Url) -> Result<FetchedResource> {
        let fetch_error = |message: String| Error::ImageFetch {
            src: url.to_string(),
            message,
        };

        let resp = self
            .client
            .get(url.as_str())
            .send()
            .map_err(|e| fetch_error(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(fetch_error(format!("HTTP {}", status.as_u16())));
        }
        if resp.content_length().is_some_and(|len| len > self.max_bytes) {
            return Err(fetch_error(format!("larger than {} bytes", self.max_bytes)));
        }
        let media_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(essence);

        let mut bytes = Vec::new();
        resp.take(self.max_bytes + 1)
            .read_to_end(&mut bytes)
            .map_err(|e| fetch_error(e.to_string()))?;
        if bytes.len() as u64 > self.max_bytes {
            return Err(fetch_error(format!("larger than {} bytes", self.max_bytes)));
        }

        debug!("Fetched {} bytes from {}", bytes.len(), url);
        Ok(FetchedResource { bytes, media_type })
    }

    fn fetch_file(&self, src: &str, path: &Path) -> Result<FetchedResource> {
        let fetch_error = |message: String| Error::ImageFetch {
            src: src.to_string(),
            message,
        };
        let len = std::fs::metadata(path)
            .map_err(|e| fetch_error(format!("{}: {}", path.display(), e)))?
            .len();
        if len > self.max_bytes {
            return Err(fetch_error(format!("larger than {} bytes", self.max_bytes)));
        }
        let bytes =
            std::fs::read(path).map_err(|e| fetch_error(format!("{}: {}", path.display(), e)))?;
        debug!("Read {} bytes from {}", bytes.len(), path.display());
        Ok(FetchedResource {
            bytes,
            media_type: None,
        })
    }

    /// Turn `src` into something loadable.
    fn locate(&self, src: &str) -> Result<Location> {
        match Url::parse(src) {
            // Single-letter schemes are Windows drive letters.
            Ok(url) if url.scheme().len() > 1 => Ok(Location::Url(url)),
            Ok(_) => Ok(Location::Path(PathBuf::from(src))),
            Err(url::ParseError::RelativeUrlWithoutBase) => match &self.base {
                Some(FetchBase::Url(base)) => base
                    .join(src)
                    .map(Location::Url)
                    .map_err(|e| Error::ImageFetch {
                        src: src.to_string(),
                        message: e.to_string(),
                    }),
                Some(FetchBase::Dir(dir)) => Ok(Location::Path(dir.join(strip_query(src)))),
                None => Ok(Location::Path(PathBuf::from(strip_query(src)))),
            },
            Err(e) => Err(Error::ImageFetch {
                src: src.to_string(),
                message: e.to_string(),
            }),
        }
    }
}

enum Location {
    Url(Url),
    Path(PathBuf),
}

impl ResourceFetcher for DefaultFetcher {
    fn fetch(&self, src: &str) -> Result<FetchedResource> {
        if src.starts_with("data:") {
            return decode_data_uri(src);
        }
        match self.locate(src)? {
            Location::Url(url) => match url.scheme() {
                "http" | "https" => self.fetch_http(&url),
                "file" => {
                    let path = url.to_file_path().map_err(|_| Error::ImageFetch {
                        src: src.to_string(),
                        message: "not a local file URL".to_string(),
                    })?;
                    self.fetch_file(src, &path)
                }
                "data" => decode_data_uri(url.as_str()),
                other => Err(Error::ImageFetch {
                    src: src.to_string(),
                    message: format!("unsupported scheme '{}'", other),
                }),
            },
            Location::Path(path) => self.fetch_file(src, &path),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Data URIs
// ─────────────────────────────────────────────────────────────────────────────

/// Decode `data:[<media type>][;base64],<data>`.
pub fn decode_data_uri(src: &str) -> Result<FetchedResource> {
    let malformed = |message: &str| Error::ImageFetch {
        src: truncate(src),
        message: message.to_string(),
    };
    let rest = src
        .strip_prefix("data:")
        .ok_or_else(|| malformed("not a data URI"))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| malformed("missing ',' in data URI"))?;

    let mut is_base64 = false;
    let mut media_type = None;
    for (idx, segment) in header.split(';').enumerate() {
        let seg = segment.trim();
        if seg.eq_ignore_ascii_case("base64") {
            is_base64 = true;
        } else if idx == 0 && seg.contains('/') {
            media_type = Some(seg.to_ascii_lowercase());
        }
    }

    let bytes = if is_base64 {
        let compact: String = percent_decode(payload)
            .map(|b| String::from_utf8_lossy(&b).into_owned())
            .ok_or_else(|| malformed("invalid percent-escape"))?
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        base64::engine::general_purpose::STANDARD
            .decode(compact)
            .map_err(|e| malformed(&format!("invalid base64: {}", e)))?
    } else {
        percent_decode(payload).ok_or_else(|| malformed("invalid percent-escape"))?
    };

    Ok(FetchedResource { bytes, media_type })
}

fn percent_decode(input: &str) -> Option<Vec<u8>> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hi = (*bytes.get(i + 1)? as char).to_digit(16)?;
            let lo = (*bytes.get(i + 2)? as char).to_digit(16)?;
            out.push((hi * 16 + lo) as u8);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    Some(out)
}

/// True for `src` values that already carry SVG inline.
pub fn is_svg_data_uri(src: &str) -> bool {
    src.get(..18)
        .is_some_and(|p| p.eq_ignore_ascii_case("data:image/svg+xml"))
}

// ─────────────────────────────────────────────────────────────────────────────
// Media Types
// ─────────────────────────────────────────────────────────────────────────────

/// `image/png; charset=binary` -> `image/png`
fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

fn sniff_media_type(bytes: &[u8]) -> Option<&'static str> {
    if let Ok(format) = image::guess_format(bytes) {
        return Some(format.to_mime_type());
    }
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(512)]).to_ascii_lowercase();
    let head = head.trim_start_matches('\u{feff}').trim_start();
    if head.starts_with("<svg") || (head.starts_with("<?xml") && head.contains("<svg")) {
        return Some(SVG_MEDIA_TYPE);
    }
    None
}

fn media_type_from_extension(src: &str) -> Option<&'static str> {
    let path = strip_query(src);
    let extension = path.rsplit('.').next().unwrap_or("").to_ascii_lowercase();
    let media_type = match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "ico" => "image/x-icon",
        "avif" => "image/avif",
        "svg" => SVG_MEDIA_TYPE,
        _ => return None,
    };
    Some(media_type)
}

fn strip_query(src: &str) -> &str {
    src.split(['?', '#']).next().unwrap_or(src)
}

/// Data URIs can be huge; keep log lines readable.
fn truncate(src: &str) -> String {
    match src.char_indices().nth(48) {
        Some((idx, _)) => format!("{}...", &src[..idx]),
        None => src.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use std::net::TcpListener;
    use std::thread;
    use tempfile::TempDir;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    fn fetcher() -> DefaultFetcher {
        DefaultFetcher::new(Duration::from_secs(1), 1024).unwrap()
    }

    /// Fetcher that talks to the loopback server directly, whatever proxy
    /// the environment configures.
    fn local_fetcher(max_bytes: u64) -> DefaultFetcher {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(5))
            .no_proxy()
            .build()
            .unwrap();
        DefaultFetcher {
            client,
            base: None,
            max_bytes,
        }
    }

    /// Answer one request with `head` followed by `body`, then close.
    fn serve_once(head: &str, body: Vec<u8>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let head = head.to_string();
        thread::spawn(move || {
            let Ok((mut stream, _)) = listener.accept() else {
                return;
            };
            let mut request = Vec::new();
            let mut buf = [0u8; 512];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            let _ = stream.write_all(head.as_bytes());
            let _ = stream.write_all(&body);
        });
        format!("http://{}/image", addr)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Data URIs
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_decode_base64_data_uri() {
        let res = decode_data_uri("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(res.bytes, b"hello");
        assert_eq!(res.media_type.as_deref(), Some("image/png"));
    }

    #[test]
    fn test_decode_percent_encoded_svg() {
        let res = decode_data_uri("data:image/svg+xml,%3Csvg%20width%3D%221%22%2F%3E").unwrap();
        assert_eq!(res.bytes, br#"<svg width="1"/>"#);
        assert_eq!(res.media_type.as_deref(), Some(SVG_MEDIA_TYPE));
    }

    #[test]
    fn test_decode_malformed_data_uri() {
        assert!(decode_data_uri("data:image/png;base64").is_err());
        assert!(decode_data_uri("data:image/png;base64,!!!").is_err());
        assert!(decode_data_uri("data:text/plain,%G1").is_err());
    }

    #[test]
    fn test_is_svg_data_uri() {
        assert!(is_svg_data_uri("data:image/svg+xml;base64,AAAA"));
        assert!(is_svg_data_uri("DATA:IMAGE/SVG+XML,<svg/>"));
        assert!(!is_svg_data_uri("data:image/png;base64,AAAA"));
        assert!(!is_svg_data_uri("a.svg"));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Media types
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_resolve_media_type_order() {
        let reported = FetchedResource {
            bytes: PNG_MAGIC.to_vec(),
            media_type: Some("image/jpeg".to_string()),
        };
        assert_eq!(reported.resolve_media_type("x.gif"), "image/jpeg");

        let sniffed = FetchedResource {
            bytes: PNG_MAGIC.to_vec(),
            media_type: None,
        };
        assert_eq!(sniffed.resolve_media_type("x.gif"), "image/png");

        let by_extension = FetchedResource {
            bytes: b"????".to_vec(),
            media_type: Some("application/octet-stream".to_string()),
        };
        assert_eq!(by_extension.resolve_media_type("pic.GIF?v=2"), "image/gif");

        let unknown = FetchedResource {
            bytes: b"????".to_vec(),
            media_type: None,
        };
        assert_eq!(unknown.resolve_media_type("blob"), "application/octet-stream");
    }

    #[test]
    fn test_sniff_svg() {
        let res = FetchedResource {
            bytes: b"<?xml version=\"1.0\"?>\n<svg xmlns=\"http://www.w3.org/2000/svg\"/>".to_vec(),
            media_type: None,
        };
        assert_eq!(res.resolve_media_type("chart"), SVG_MEDIA_TYPE);
    }

    #[test]
    fn test_essence() {
        assert_eq!(essence("Image/PNG; charset=binary"), "image/png");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Files
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_fetch_relative_path_against_base_dir() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("img")).unwrap();
        fs::write(dir.path().join("img/a.png"), PNG_MAGIC).unwrap();

        let fetcher = fetcher().with_base(FetchBase::Dir(dir.path().to_path_buf()));
        let res = fetcher.fetch("img/a.png").unwrap();
        assert_eq!(res.bytes, PNG_MAGIC);
        assert_eq!(res.media_type, None);
    }

    #[test]
    fn test_fetch_file_url() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("b.png");
        fs::write(&path, PNG_MAGIC).unwrap();
        let url = Url::from_file_path(&path).unwrap();
        assert_eq!(fetcher().fetch(url.as_str()).unwrap().bytes, PNG_MAGIC);
    }

    #[test]
    fn test_fetch_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let fetcher = fetcher().with_base(FetchBase::Dir(dir.path().to_path_buf()));
        assert!(matches!(
            fetcher.fetch("missing.png"),
            Err(Error::ImageFetch { .. })
        ));
    }

    #[test]
    fn test_fetch_rejects_oversized_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("big.png"), vec![0u8; 4096]).unwrap();
        let fetcher = fetcher().with_base(FetchBase::Dir(dir.path().to_path_buf()));
        assert!(fetcher.fetch("big.png").is_err());
    }

    #[test]
    fn test_fetch_unsupported_scheme() {
        assert!(fetcher().fetch("ftp://example.com/a.png").is_err());
    }

    #[test]
    fn test_fetch_base_parse() {
        assert!(matches!(
            FetchBase::parse("https://example.com/posts/"),
            FetchBase::Url(_)
        ));
        assert!(matches!(FetchBase::parse("./notes"), FetchBase::Dir(_)));
    }
    // ─────────────────────────────────────────────────────────────────────────
    // HTTP
    // ─────────────────────────────────────────────────────────────────────────

    fn fetch_error_message(result: Result<FetchedResource>) -> String {
        match result {
            Err(Error::ImageFetch { message, .. }) => message,
            other => panic!("expected an image fetch error, got {:?}", other),
        }
    }

    #[test]
    fn test_http_fetch_reports_content_type_essence() {
        let head = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: Image/PNG; charset=binary\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            PNG_MAGIC.len()
        );
        let url = serve_once(&head, PNG_MAGIC.to_vec());

        let res = local_fetcher(1024).fetch(&url).unwrap();
        assert_eq!(res.bytes, PNG_MAGIC);
        assert_eq!(res.media_type.as_deref(), Some("image/png"));
    }

    #[test]
    fn test_http_fetch_rejects_error_status() {
        let url = serve_once(
            "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            Vec::new(),
        );
        assert_eq!(fetch_error_message(local_fetcher(1024).fetch(&url)), "HTTP 404");
    }

    #[test]
    fn test_http_fetch_rejects_declared_oversize() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: image/png\r\nContent-Length: 2048\r\nConnection: close\r\n\r\n",
            vec![0u8; 2048],
        );
        let message = fetch_error_message(local_fetcher(1024).fetch(&url));
        assert!(message.contains("larger than 1024 bytes"), "{}", message);
    }

    #[test]
    fn test_http_fetch_rejects_undeclared_oversize() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: image/png\r\nConnection: close\r\n\r\n",
            vec![0u8; 4096],
        );
        let message = fetch_error_message(local_fetcher(1024).fetch(&url));
        assert!(message.contains("larger than 1024 bytes"), "{}", message);
    }
}
