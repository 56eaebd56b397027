//! Configuration structures for the conversion pipeline.

use serde::{Deserialize, Serialize};

use crate::order::{Grammar, ParseStrategy};

/// Main configuration for the ordex pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OrdexConfig {
    /// PDF text extraction configuration.
    pub pdf: PdfConfig,

    /// Line normalization configuration.
    pub normalize: NormalizeConfig,

    /// Layout detection and parsing configuration.
    pub parsing: ParsingConfig,

    /// Spreadsheet export configuration.
    pub export: ExportConfig,
}

/// PDF text extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Retry with the lopdf extractor when pdf-extract yields nothing.
    pub use_fallback_extractor: bool,

    /// Maximum pages to read (0 = unlimited).
    pub max_pages: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            use_fallback_extractor: true,
            max_pages: 0,
        }
    }
}

/// Line normalization configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Split a leading number glued to text ("3Gadget" -> "3 Gadget").
    pub repair_tokens: bool,

    /// Additional regular expressions for lines to drop as noise.
    pub extra_noise_patterns: Vec<String>,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            repair_tokens: true,
            extra_noise_patterns: Vec::new(),
        }
    }
}

/// Layout detection and parsing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsingConfig {
    /// Lines to look below a header line for its product code; null looks
    /// up to the next position.
    pub lookahead_window: Option<usize>,

    /// How the layout grammar is chosen.
    pub strategy: ParseStrategy,

    /// Skip classification and always use this grammar.
    pub forced_grammar: Option<Grammar>,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            lookahead_window: None,
            strategy: ParseStrategy::FirstMatch,
            forced_grammar: None,
        }
    }
}

/// Spreadsheet export configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Worksheet name.
    pub sheet_name: String,

    /// Header of the position column.
    pub position_header: String,

    /// Header of the product code column.
    pub code_header: String,

    /// Header of the quantity column.
    pub quantity_header: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            sheet_name: "Pozycje".to_string(),
            position_header: "Lp".to_string(),
            code_header: "Kod".to_string(),
            quantity_header: "Ilość".to_string(),
        }
    }
}

impl OrdexConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}
