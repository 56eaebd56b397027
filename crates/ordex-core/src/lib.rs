//! Core library for recovering order tables from PDF documents.
//!
//! This crate provides:
//! - PDF text extraction with a fallback backend
//! - Line normalization (noise removal, token repair, continuation merging)
//! - Layout classification over a static, prioritized grammar table
//! - Row reassembly into (position, code, quantity) records
//! - Consolidation with cross-check statistics
//! - XLSX export

pub mod error;
pub mod export;
pub mod models;
pub mod order;
pub mod pdf;

pub use error::{ConversionError, ExportError, OrdexError, PdfError, Result};
pub use export::XlsxExporter;
pub use models::{CandidateRecord, OrdexConfig, Record};
pub use order::{
    Classification, Consistency, Converter, DocumentSession, Grammar, LineNormalizer,
    ParseStrategy, RecordStats,
};
pub use pdf::{LineExtractor, TextExtractor};
