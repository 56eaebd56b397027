//! Text extraction backends using pdf-extract and lopdf.

use lopdf::Document;
use tracing::{debug, warn};

use super::{pages_to_lines, Result, TextExtractor};
use crate::error::PdfError;
use crate::models::config::PdfConfig;

/// Load a PDF, decrypting documents protected by an empty password.
///
/// Returns the document together with bytes that other backends can read:
/// the original input, or the decrypted re-serialization.
pub fn load_document(data: &[u8]) -> Result<(Document, Vec<u8>)> {
    let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

    let bytes = if doc.is_encrypted() {
        if doc.decrypt("").is_err() {
            return Err(PdfError::Encrypted);
        }
        debug!("Decrypted PDF with empty password");

        let mut decrypted = Vec::new();
        doc.save_to(&mut decrypted)
            .map_err(|e| PdfError::Parse(format!("Failed to save decrypted PDF: {}", e)))?;
        decrypted
    } else {
        data.to_vec()
    };

    let page_count = doc.get_pages().len();
    if page_count == 0 {
        return Err(PdfError::NoPages);
    }

    debug!("Loaded PDF with {} pages", page_count);
    Ok((doc, bytes))
}

/// Primary backend: pdf-extract's layout-aware text output.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractText;

impl TextExtractor for PdfExtractText {
    fn name(&self) -> &'static str {
        "pdf-extract"
    }

    fn extract_pages(&self, data: &[u8]) -> Result<Vec<String>> {
        let (_, bytes) = load_document(data)?;
        pdf_extract::extract_text_from_mem_by_pages(&bytes)
            .map_err(|e| PdfError::TextExtraction(e.to_string()))
    }
}

/// Fallback backend: lopdf's per-page content stream text.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfText;

impl TextExtractor for LopdfText {
    fn name(&self) -> &'static str {
        "lopdf"
    }

    fn extract_pages(&self, data: &[u8]) -> Result<Vec<String>> {
        let (doc, _) = load_document(data)?;

        let mut pages = Vec::new();
        for page_number in doc.get_pages().keys() {
            match doc.extract_text(&[*page_number]) {
                Ok(text) => pages.push(text),
                Err(e) => {
                    debug!("lopdf could not read page {}: {}", page_number, e);
                    pages.push(String::new());
                }
            }
        }

        Ok(pages)
    }
}

/// Lines extracted from one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedLines {
    /// Trimmed non-empty lines, all pages concatenated in order.
    pub lines: Vec<String>,

    /// Backend that produced the lines, if any did.
    pub extractor: Option<&'static str>,
}

/// Runs the primary backend, then the fallback when the primary fails or
/// yields no text.
pub struct LineExtractor {
    primary: Box<dyn TextExtractor>,
    fallback: Option<Box<dyn TextExtractor>>,
    max_pages: usize,
}

impl LineExtractor {
    /// pdf-extract first, lopdf as fallback, all pages.
    pub fn new() -> Self {
        Self {
            primary: Box::new(PdfExtractText),
            fallback: Some(Box::new(LopdfText)),
            max_pages: 0,
        }
    }

    pub fn from_config(config: &PdfConfig) -> Self {
        let extractor = Self::new().with_max_pages(config.max_pages);
        if config.use_fallback_extractor {
            extractor
        } else {
            extractor.without_fallback()
        }
    }

    pub fn with_primary(mut self, primary: Box<dyn TextExtractor>) -> Self {
        self.primary = primary;
        self
    }

    pub fn with_fallback(mut self, fallback: Box<dyn TextExtractor>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn without_fallback(mut self) -> Self {
        self.fallback = None;
        self
    }

    /// Limit the number of pages read (0 = unlimited).
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Extract document lines. Failures are logged and yield no lines.
    pub fn extract_lines(&self, data: &[u8]) -> ExtractedLines {
        let backends = std::iter::once(&self.primary).chain(self.fallback.as_ref());

        for backend in backends {
            match backend.extract_pages(data) {
                Ok(pages) => {
                    let lines = pages_to_lines(&pages, self.max_pages);
                    if lines.is_empty() {
                        debug!("{} extracted no text", backend.name());
                        continue;
                    }

                    debug!("{} extracted {} lines", backend.name(), lines.len());
                    return ExtractedLines {
                        lines,
                        extractor: Some(backend.name()),
                    };
                }
                Err(e) => warn!("{} failed: {}", backend.name(), e),
            }
        }

        ExtractedLines::default()
    }
}

impl Default for LineExtractor {
    fn default() -> Self {
        Self::new()
    }
}
