//! Code-before-header layouts.
//!
//! ```text
//! 5901234123457        <- code of position 1 (bare or labeled)
//! 1 Widget             <- position marker
//! 4 szt.               <- quantity, before the next marker
//! ```
//!
//! The code of a record is the nearest code line strictly between the
//! previous position marker and its own; the quantity is the first one at
//! or after its marker and before the next. A record whose gap holds no
//! code stays without one instead of borrowing a neighbour's.

use tracing::trace;

use super::{first_quantity, window_end};
use crate::models::CandidateRecord;
use crate::order::rules::{
    is_record_start, parse_position, record_starts, strip_position, CodeExtractor, CodeSource,
    FieldExtractor,
};

/// Parser for the code-before-header grammar family.
#[derive(Debug, Clone, Copy)]
pub struct CodeBeforeParser {
    source: CodeSource,
}

impl CodeBeforeParser {
    /// Accept any code-length digit run as a code line.
    pub fn bare() -> Self {
        Self {
            source: CodeSource::Bare,
        }
    }

    /// Accept only labeled code lines.
    pub fn labeled() -> Self {
        Self {
            source: CodeSource::Labeled,
        }
    }

    /// A code line immediately followed by a record start, with the first
    /// code line of the document coming before the first record start.
    pub fn detect(&self, lines: &[String]) -> bool {
        let Some(first_start) = lines.iter().position(|l| is_record_start(l)) else {
            return false;
        };
        let first_code = lines
            .iter()
            .position(|l| !is_record_start(l) && self.code_in(l).is_some());
        if !first_code.is_some_and(|i| i < first_start) {
            return false;
        }

        lines.windows(2).any(|pair| {
            !is_record_start(&pair[0])
                && self.code_in(&pair[0]).is_some()
                && is_record_start(&pair[1])
                && (self.source == CodeSource::Labeled
                    || self.code_in(strip_position(&pair[1])).is_none())
        })
    }

    pub fn parse(&self, lines: &[String]) -> Vec<CandidateRecord> {
        let starts = record_starts(lines);
        let mut candidates = Vec::with_capacity(starts.len());

        for (k, &start) in starts.iter().enumerate() {
            let Some(position) = parse_position(&lines[start]) else {
                continue;
            };

            let lower = if k == 0 { 0 } else { starts[k - 1] + 1 };
            let upper = window_end(&starts, k, lines.len());

            let code = (lower..start)
                .rev()
                .find_map(|j| self.code_in(&lines[j]));

            let quantity = first_quantity(
                std::iter::once(strip_position(&lines[start]))
                    .chain(lines[start + 1..upper].iter().map(String::as_str)),
            );

            trace!(
                "Marker line {}: position {} code {:?} quantity {:?}",
                start, position, code, quantity
            );

            candidates.push(
                CandidateRecord::new(position, start)
                    .with_code(code)
                    .with_quantity(quantity),
            );
        }

        candidates
    }

    fn code_in(&self, text: &str) -> Option<String> {
        CodeExtractor::new()
            .with_source(self.source)
            .extract(text)
            .map(|m| m.value)
    }
}
