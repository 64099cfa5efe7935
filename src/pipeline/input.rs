//! Input resolution: turn user-supplied paths or a URL into a local source.
//!
//! pdfium needs a file-system path, so remote PDFs are downloaded into a
//! `TempDir` that lives inside [`ResolvedSource`]; cleanup happens when the
//! job drops it, even on panic. PDF magic bytes (`%PDF`) are validated before
//! returning so callers get a meaningful error rather than a pdfium crash.

use crate::error::Pdf2PptxError;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// Image extensions accepted as standalone pages.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// What the caller wants converted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceDescriptor {
    /// A PDF, as a local path or an HTTP/HTTPS URL.
    Document(String),
    /// Standalone page images, one slide each, in order.
    Images(Vec<PathBuf>),
}

impl SourceDescriptor {
    /// Classify a list of CLI-style inputs.
    ///
    /// Exactly one PDF (or URL) is a document; any number of png/jpg/jpeg
    /// files are an image list. Mixing the two is rejected.
    pub fn from_paths<S: AsRef<str>>(inputs: &[S]) -> Result<Self, Pdf2PptxError> {
        if inputs.is_empty() {
            return Err(Pdf2PptxError::InvalidInput {
                reason: "no input files given".into(),
            });
        }

        let documents = inputs
            .iter()
            .filter(|s| is_url(s.as_ref()) || has_extension(s.as_ref(), &["pdf"]))
            .count();

        match documents {
            0 => Ok(SourceDescriptor::Images(
                inputs.iter().map(|s| PathBuf::from(s.as_ref())).collect(),
            )),
            1 if inputs.len() == 1 => Ok(SourceDescriptor::Document(inputs[0].as_ref().to_string())),
            1 => Err(Pdf2PptxError::InvalidInput {
                reason: "a PDF cannot be combined with other inputs".into(),
            }),
            n => Err(Pdf2PptxError::InvalidInput {
                reason: format!("expected a single PDF, got {n}"),
            }),
        }
    }

    pub fn is_native_document(&self) -> bool {
        matches!(self, SourceDescriptor::Document(_))
    }
}

/// The resolved PDF: either a local path or a downloaded temp file.
pub enum ResolvedInput {
    /// Input was already a local file.
    Local(PathBuf),
    /// Input was a URL; PDF downloaded to a temp directory.
    /// The `TempDir` is kept alive to prevent cleanup until the job completes.
    Downloaded { path: PathBuf, _temp_dir: TempDir },
}

impl ResolvedInput {
    /// Get the path to the PDF file regardless of how it was resolved.
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Downloaded { path, .. } => path,
        }
    }
}

/// A source ready for rasterisation.
pub enum ResolvedSource {
    Document(ResolvedInput),
    Images(Vec<PathBuf>),
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

fn has_extension(input: &str, extensions: &[&str]) -> bool {
    Path::new(input)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| extensions.iter().any(|x| e.eq_ignore_ascii_case(x)))
        .unwrap_or(false)
}

/// Resolve a source descriptor to local files.
pub async fn resolve_source(
    source: &SourceDescriptor,
    timeout_secs: u64,
) -> Result<ResolvedSource, Pdf2PptxError> {
    match source {
        SourceDescriptor::Document(input) => {
            let resolved = if is_url(input) {
                download_url(input, timeout_secs).await?
            } else {
                resolve_local(input)?
            };
            Ok(ResolvedSource::Document(resolved))
        }
        SourceDescriptor::Images(paths) => {
            if paths.is_empty() {
                return Err(Pdf2PptxError::InvalidInput {
                    reason: "image list is empty".into(),
                });
            }
            for path in paths {
                resolve_image(path)?;
            }
            Ok(ResolvedSource::Images(paths.clone()))
        }
    }
}

/// Resolve a local file path, validating existence and PDF magic bytes.
fn resolve_local(path_str: &str) -> Result<ResolvedInput, Pdf2PptxError> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(Pdf2PptxError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            use std::io::Read;
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                return Err(Pdf2PptxError::NotAPdf { path, magic });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Pdf2PptxError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(Pdf2PptxError::FileNotFound { path });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(ResolvedInput::Local(path))
}

/// Validate one standalone page image.
fn resolve_image(path: &Path) -> Result<(), Pdf2PptxError> {
    if !path.exists() {
        return Err(Pdf2PptxError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let ok = path
        .to_str()
        .map(|s| has_extension(s, IMAGE_EXTENSIONS))
        .unwrap_or(false);
    if !ok {
        return Err(Pdf2PptxError::UnsupportedImage {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

/// Download a URL to a temporary directory and return the path.
async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, Pdf2PptxError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| Pdf2PptxError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            Pdf2PptxError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            Pdf2PptxError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(Pdf2PptxError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let filename = filename_from_url(url);

    let temp_dir = TempDir::new().map_err(|e| Pdf2PptxError::Internal(e.to_string()))?;
    let file_path = temp_dir.path().join(&filename);

    let bytes = response
        .bytes()
        .await
        .map_err(|e| Pdf2PptxError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    if bytes.len() >= 4 && &bytes[..4] != b"%PDF" {
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[..4]);
        return Err(Pdf2PptxError::NotAPdf {
            path: file_path,
            magic,
        });
    }

    tokio::fs::write(&file_path, &bytes)
        .await
        .map_err(|e| Pdf2PptxError::Internal(format!("Failed to write temp file: {}", e)))?;

    info!("Downloaded to: {}", file_path.display());

    Ok(ResolvedInput::Downloaded {
        path: file_path,
        _temp_dir: temp_dir,
    })
}

/// Last path segment of the URL when it looks like a file name.
fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }

    "downloaded.pdf".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/deck.pdf"));
        assert!(is_url("http://example.com/deck.pdf"));
        assert!(!is_url("/tmp/deck.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn single_pdf_is_a_document() {
        let s = SourceDescriptor::from_paths(&["talk.PDF"]).unwrap();
        assert_eq!(s, SourceDescriptor::Document("talk.PDF".into()));
        assert!(s.is_native_document());
    }

    #[test]
    fn url_is_a_document() {
        let s = SourceDescriptor::from_paths(&["https://example.com/a"]).unwrap();
        assert!(s.is_native_document());
    }

    #[test]
    fn images_are_an_image_list() {
        let s = SourceDescriptor::from_paths(&["1.png", "2.jpg"]).unwrap();
        assert_eq!(
            s,
            SourceDescriptor::Images(vec![PathBuf::from("1.png"), PathBuf::from("2.jpg")])
        );
        assert!(!s.is_native_document());
    }

    #[test]
    fn mixed_inputs_are_rejected() {
        let err = SourceDescriptor::from_paths(&["a.pdf", "b.png"]).unwrap_err();
        assert!(matches!(err, Pdf2PptxError::InvalidInput { .. }));
        let err = SourceDescriptor::from_paths(&["a.pdf", "b.pdf"]).unwrap_err();
        assert!(matches!(err, Pdf2PptxError::InvalidInput { .. }));
        let err = SourceDescriptor::from_paths::<&str>(&[]).unwrap_err();
        assert!(matches!(err, Pdf2PptxError::InvalidInput { .. }));
    }

    #[test]
    fn local_non_pdf_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.pdf");
        std::fs::write(&path, b"GIF89a").unwrap();
        let err = resolve_local(path.to_str().unwrap()).err().unwrap();
        assert!(matches!(err, Pdf2PptxError::NotAPdf { .. }));
    }

    #[test]
    fn missing_file_is_reported() {
        let err = resolve_local("/definitely/not/here.pdf").err().unwrap();
        assert!(matches!(err, Pdf2PptxError::FileNotFound { .. }));
    }

    #[test]
    fn image_with_wrong_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.gif");
        std::fs::write(&path, b"GIF89a").unwrap();
        let err = resolve_image(&path).unwrap_err();
        assert!(matches!(err, Pdf2PptxError::UnsupportedImage { .. }));
    }

    #[test]
    fn filename_falls_back_when_url_has_none() {
        assert_eq!(filename_from_url("https://example.com/decks/q3.pdf"), "q3.pdf");
        assert_eq!(filename_from_url("https://example.com/"), "downloaded.pdf");
    }
}
