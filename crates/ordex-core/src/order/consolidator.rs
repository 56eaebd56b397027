//! Record consolidation: filtering, deduplication and cross-check
//! statistics.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{CandidateRecord, Record};

/// Overall verdict on a consolidated record set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Consistency {
    /// One distinct code per record and no missing codes.
    Consistent,
    /// Counts disagree or codes are missing; the records are still usable.
    Flagged,
    /// No records at all.
    Empty,
}

/// Cross-check statistics of a consolidated record set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordStats {
    /// Complete records after dropping and deduplication.
    pub total_records: usize,

    /// Distinct codes among them.
    pub unique_codes: usize,

    /// Sum of their quantities.
    pub quantity_total: u64,

    /// Positions skipped because their code could not be resolved. They
    /// are not part of `total_records`.
    pub missing_codes: usize,

    /// Candidates dropped because their quantity could not be resolved.
    pub dropped_without_quantity: usize,

    /// Exact (position, code) duplicates removed.
    pub duplicates_removed: usize,
}

impl RecordStats {
    pub fn consistency(&self) -> Consistency {
        if self.total_records == 0 {
            Consistency::Empty
        } else if self.total_records == self.unique_codes && self.missing_codes == 0 {
            Consistency::Consistent
        } else {
            Consistency::Flagged
        }
    }

    /// Human-readable discrepancy summary, counts only.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.total_records != self.unique_codes {
            warnings.push(format!(
                "{} but {}",
                counted(self.total_records, "position"),
                counted(self.unique_codes, "distinct product code")
            ));
        }
        if self.missing_codes > 0 {
            warnings.push(format!(
                "skipped {} without a product code",
                counted(self.missing_codes, "position")
            ));
        }
        if self.dropped_without_quantity > 0 {
            warnings.push(format!(
                "skipped {} without a quantity",
                counted(self.dropped_without_quantity, "position")
            ));
        }

        warnings
    }
}

fn counted(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("1 {}", noun)
    } else {
        format!("{} {}s", count, noun)
    }
}

/// Result of consolidation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consolidated {
    /// Final complete records, in source order.
    pub records: Vec<Record>,
    pub stats: RecordStats,
}

/// Turns parser candidates into the final record set.
///
/// Only filters and counts; field values are passed through untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct Consolidator;

impl Consolidator {
    pub fn new() -> Self {
        Self
    }

    pub fn consolidate(&self, candidates: Vec<CandidateRecord>) -> Consolidated {
        let mut stats = RecordStats::default();
        let mut seen: HashSet<(u32, Option<String>)> = HashSet::new();
        let mut kept: Vec<CandidateRecord> = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            if candidate.quantity.is_none() {
                stats.dropped_without_quantity += 1;
                continue;
            }

            if !seen.insert((candidate.position, candidate.code.clone())) {
                stats.duplicates_removed += 1;
                continue;
            }

            kept.push(candidate);
        }

        stats.missing_codes = kept.iter().filter(|c| c.code.is_none()).count();
        let records: Vec<Record> = kept
            .into_iter()
            .filter_map(CandidateRecord::into_record)
            .collect();

        let unique: HashSet<&str> = records.iter().map(|r| r.code.as_str()).collect();
        stats.total_records = records.len();
        stats.unique_codes = unique.len();
        stats.quantity_total = records.iter().map(|r| u64::from(r.quantity)).sum();

        debug!(
            "Consolidated {} records ({} unique codes, {} missing codes, {} dropped, {} duplicates)",
            stats.total_records,
            stats.unique_codes,
            stats.missing_codes,
            stats.dropped_without_quantity,
            stats.duplicates_removed
        );

        Consolidated { records, stats }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn candidate(position: u32, code: Option<&str>, quantity: Option<u32>) -> CandidateRecord {
        CandidateRecord::new(position, 0)
            .with_code(code.map(str::to_string))
            .with_quantity(quantity)
    }

    #[test]
    fn test_duplicates_collapse_to_first() {
        let result = Consolidator::new().consolidate(vec![
            candidate(1, Some("A"), Some(5)),
            candidate(1, Some("A"), Some(5)),
            candidate(2, Some("B"), Some(3)),
        ]);

        assert_eq!(
            result.records,
            vec![Record::new(1, "A", 5), Record::new(2, "B", 3)]
        );
        assert_eq!(result.stats.total_records, 2);
        assert_eq!(result.stats.unique_codes, 2);
        assert_eq!(result.stats.quantity_total, 8);
        assert_eq!(result.stats.duplicates_removed, 1);
        assert_eq!(result.stats.consistency(), Consistency::Consistent);
        assert!(result.stats.warnings().is_empty());
    }

    #[test]
    fn test_same_code_different_quantity_keeps_first() {
        let result = Consolidator::new().consolidate(vec![
            candidate(1, Some("A"), Some(5)),
            candidate(1, Some("A"), Some(9)),
        ]);
        assert_eq!(result.records, vec![Record::new(1, "A", 5)]);
    }

    #[test]
    fn test_each_pair_exactly_once() {
        let candidates: Vec<CandidateRecord> = (0..4)
            .flat_map(|_| {
                vec![
                    candidate(1, Some("A"), Some(1)),
                    candidate(2, Some("B"), Some(2)),
                    candidate(3, Some("A"), Some(3)),
                ]
            })
            .collect();

        let result = Consolidator::new().consolidate(candidates);
        let pairs: Vec<(u32, &str)> = result
            .records
            .iter()
            .map(|r| (r.position, r.code.as_str()))
            .collect();
        assert_eq!(pairs, vec![(1, "A"), (2, "B"), (3, "A")]);
        assert_eq!(result.stats.duplicates_removed, 9);

        // Position 3 repeats code A
        assert_eq!(result.stats.unique_codes, 2);
        assert_eq!(result.stats.consistency(), Consistency::Flagged);
    }

    #[test]
    fn test_missing_fields_are_dropped_and_counted() {
        let result = Consolidator::new().consolidate(vec![
            candidate(1, Some("A"), Some(5)),
            candidate(2, None, Some(3)),
            candidate(3, Some("C"), None),
        ]);

        assert_eq!(result.records, vec![Record::new(1, "A", 5)]);
        assert_eq!(result.stats.dropped_without_quantity, 1);
        assert_eq!(result.stats.missing_codes, 1);
        assert_eq!(result.stats.total_records, 1);
        assert_eq!(result.stats.quantity_total, 5);
        assert_eq!(result.stats.consistency(), Consistency::Flagged);
        assert_eq!(
            result.stats.warnings(),
            vec![
                "skipped 1 position without a product code".to_string(),
                "skipped 1 position without a quantity".to_string(),
            ]
        );
    }

    #[test]
    fn test_repeated_code_warning_counts_complete_records() {
        let result = Consolidator::new().consolidate(vec![
            candidate(1, Some("A"), Some(5)),
            candidate(2, Some("A"), Some(3)),
            candidate(3, None, Some(1)),
            candidate(4, None, Some(1)),
        ]);

        assert_eq!(
            result.stats.warnings(),
            vec![
                "2 positions but 1 distinct product code".to_string(),
                "skipped 2 positions without a product code".to_string(),
            ]
        );
    }

    #[test]
    fn test_empty() {
        let result = Consolidator::new().consolidate(Vec::new());
        assert!(result.records.is_empty());
        assert_eq!(result.stats.consistency(), Consistency::Empty);
    }
}
