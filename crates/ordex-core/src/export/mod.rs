//! Spreadsheet export of final record sets.

mod xlsx;

pub use xlsx::XlsxExporter;
