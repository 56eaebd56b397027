//! Product code extraction.
//!
//! Codes are matched verbatim as 8-13 digit runs; no checksum is verified,
//! since order documents routinely carry internal codes of barcode length.

use serde::{Deserialize, Serialize};

use super::patterns::{CODE, LABELED_CODE, LEADING_CODE};
use super::{ExtractionMatch, FieldExtractor};

/// Which code-bearing lines an extractor accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeSource {
    /// Any bare digit run of code length, labeled or not.
    Bare,
    /// Only codes introduced by a label such as "Kod kres.:" or "EAN:".
    Labeled,
    /// Only a code that opens the line.
    Leading,
}

/// Product code extractor.
pub struct CodeExtractor {
    source: CodeSource,
}

impl CodeExtractor {
    /// Create an extractor accepting any bare code.
    pub fn new() -> Self {
        Self {
            source: CodeSource::Bare,
        }
    }

    /// Restrict the extractor to a code source.
    pub fn with_source(mut self, source: CodeSource) -> Self {
        self.source = source;
        self
    }

    pub fn labeled() -> Self {
        Self::new().with_source(CodeSource::Labeled)
    }

    pub fn leading() -> Self {
        Self::new().with_source(CodeSource::Leading)
    }
}

impl Default for CodeExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for CodeExtractor {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        let pattern = match self.source {
            CodeSource::Bare => &*CODE,
            CodeSource::Labeled => &*LABELED_CODE,
            CodeSource::Leading => &*LEADING_CODE,
        };

        let caps = pattern.captures(text)?;
        let code = caps.get(1)?;
        Some(
            ExtractionMatch::new(code.as_str().to_string(), code.as_str())
                .with_position(code.start(), code.end()),
        )
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut results = Vec::new();
        let mut offset = 0;

        // Each match may consume the delimiter that the next one needs, so
        // restart the search right after the previous code.
        while offset < text.len() {
            let Some(found) = self.extract(&text[offset..]) else {
                break;
            };
            let (start, end) = found.position.unwrap_or((0, 0));
            results.push(found.with_position(offset + start, offset + end));
            offset += end;

            if self.source == CodeSource::Leading {
                break;
            }
        }

        results
    }
}

/// Find the first bare product code in a line.
pub fn extract_code(text: &str) -> Option<String> {
    CodeExtractor::new().extract(text).map(|m| m.value)
}
