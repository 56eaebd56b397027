//! Order line records.

use serde::{Deserialize, Serialize};

/// A reconstructed order line: the canonical output unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    /// Line-item number printed on the document (Lp), starting at 1.
    pub position: u32,

    /// Product code, usually an 8-13 digit barcode number.
    pub code: String,

    /// Ordered unit count.
    pub quantity: u32,
}

impl Record {
    pub fn new(position: u32, code: impl Into<String>, quantity: u32) -> Self {
        Self {
            position,
            code: code.into(),
            quantity,
        }
    }
}

/// A record as produced by a layout parser, before consolidation.
///
/// Parsers emit one candidate per detected line group even when a field
/// could not be resolved, so the consolidator can count what went missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRecord {
    /// Position number of the line group.
    pub position: u32,

    /// Product code, if one was found inside the group's window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Quantity, if one was found and converted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,

    /// Index of the normalized line that opened the group.
    pub line: usize,
}

impl CandidateRecord {
    pub fn new(position: u32, line: usize) -> Self {
        Self {
            position,
            code: None,
            quantity: None,
            line,
        }
    }

    pub fn with_code(mut self, code: Option<String>) -> Self {
        self.code = code;
        self
    }

    pub fn with_quantity(mut self, quantity: Option<u32>) -> Self {
        self.quantity = quantity;
        self
    }

    /// Whether all three fields are resolved.
    pub fn is_complete(&self) -> bool {
        self.code.is_some() && self.quantity.is_some()
    }

    /// Convert into a final record, if complete.
    pub fn into_record(self) -> Option<Record> {
        match (self.code, self.quantity) {
            (Some(code), Some(quantity)) => Some(Record {
                position: self.position,
                code,
                quantity,
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_into_record() {
        let candidate = CandidateRecord::new(4, 10)
            .with_code(Some("5901234123457".to_string()))
            .with_quantity(Some(12));

        assert!(candidate.is_complete());
        assert_eq!(
            candidate.into_record(),
            Some(Record::new(4, "5901234123457", 12))
        );
    }

    #[test]
    fn test_incomplete_candidate() {
        let candidate = CandidateRecord::new(1, 0).with_quantity(Some(3));
        assert!(!candidate.is_complete());
        assert_eq!(candidate.into_record(), None);
    }
}
