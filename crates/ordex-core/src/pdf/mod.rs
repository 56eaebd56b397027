//! PDF text extraction.
//!
//! The order pipeline only needs an ordered sequence of text lines per
//! document. Extraction backends are swappable behind [`TextExtractor`];
//! [`LineExtractor`] chains a primary and a fallback backend and never
//! fails, so an unreadable document simply yields no lines.

mod extractor;

pub use extractor::{load_document, ExtractedLines, LineExtractor, LopdfText, PdfExtractText};

use crate::error::PdfError;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// A text extraction backend.
pub trait TextExtractor: Send + Sync {
    /// Short backend name, reported with the extracted lines.
    fn name(&self) -> &'static str;

    /// Extract the text of every page, in page order.
    fn extract_pages(&self, data: &[u8]) -> Result<Vec<String>>;
}

/// Split page texts into trimmed, non-empty lines in reading order.
///
/// `max_pages` of 0 reads every page.
pub fn pages_to_lines<S: AsRef<str>>(pages: &[S], max_pages: usize) -> Vec<String> {
    let limit = if max_pages == 0 { pages.len() } else { max_pages };

    pages
        .iter()
        .take(limit)
        .flat_map(|page| page.as_ref().lines())
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
