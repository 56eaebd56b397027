//! Error types for the ordex-core library.

use thiserror::Error;

/// Main error type for the ordex library.
#[derive(Error, Debug)]
pub enum OrdexError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Order conversion error.
    #[error("conversion error: {0}")]
    Conversion(#[from] ConversionError),

    /// Spreadsheet export error.
    #[error("export error: {0}")]
    Export(#[from] ExportError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,
}

/// Errors that abort the conversion of a whole document.
///
/// Per-line problems never end up here: a line that cannot be read is
/// skipped, and an order without any recognizable position is reported
/// through [`crate::order::Consistency::Empty`] rather than as an error.
#[derive(Error, Debug)]
pub enum ConversionError {
    /// No text could be obtained from the document by any extractor.
    #[error(
        "no text could be extracted from the document; \
         if it is a scan, run it through OCR first and try again"
    )]
    NoText,

    /// A configured noise pattern is not a valid regular expression.
    #[error("invalid noise pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// Errors raised while writing the exported spreadsheet.
#[derive(Error, Debug)]
pub enum ExportError {
    /// ZIP container error.
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// XML serialization error.
    #[error("xml error: {0}")]
    Xml(String),

    /// I/O error while writing the archive.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for the ordex library.
pub type Result<T> = std::result::Result<T, OrdexError>;
