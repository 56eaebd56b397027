//! Header-then-code-below layout.
//!
//! ```text
//! 3  Gadget  12 szt.           <- position + quantity
//! Kod kres.: 1234567890123     <- code, within the lookahead window
//! ```

use tracing::trace;

use super::{first_quantity, window_end, ParseOptions};
use crate::models::CandidateRecord;
use crate::order::rules::patterns::QUANTITY;
use crate::order::rules::{
    extract_code, parse_position, record_starts, strip_position, CodeExtractor, FieldExtractor,
};

/// Parser for the header-then-code-below grammar.
#[derive(Debug, Clone, Copy)]
pub struct HeaderBelowParser {
    lookahead_window: Option<usize>,
}

impl HeaderBelowParser {
    pub fn new(options: &ParseOptions) -> Self {
        Self {
            lookahead_window: options.lookahead_window,
        }
    }

    /// A header line with a quantity but no code, followed by a code line
    /// inside its window.
    pub fn detect(&self, lines: &[String]) -> bool {
        let starts = record_starts(lines);

        starts.iter().enumerate().any(|(k, &start)| {
            let header = strip_position(&lines[start]);
            QUANTITY.is_match(header)
                && find_code(header).is_none()
                && self
                    .lookahead(&starts, k, lines.len())
                    .any(|j| find_code(&lines[j]).is_some())
        })
    }

    pub fn parse(&self, lines: &[String]) -> Vec<CandidateRecord> {
        let starts = record_starts(lines);
        let mut candidates = Vec::with_capacity(starts.len());

        for (k, &start) in starts.iter().enumerate() {
            let Some(position) = parse_position(&lines[start]) else {
                continue;
            };
            let header = strip_position(&lines[start]);

            let quantity = first_quantity([header]);
            let code = find_code(header).or_else(|| {
                self.lookahead(&starts, k, lines.len())
                    .find_map(|j| find_code(&lines[j]))
            });

            trace!(
                "Header line {}: position {} code {:?} quantity {:?}",
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

    /// Line indices below the k-th header: at most `lookahead_window` lines
    /// when set, never reaching the next record start.
    fn lookahead(&self, starts: &[usize], k: usize, len: usize) -> std::ops::Range<usize> {
        let start = starts[k] + 1;
        let mut end = window_end(starts, k, len);
        if let Some(window) = self.lookahead_window {
            end = end.min(start.saturating_add(window));
        }
        start..end.max(start)
    }
}

/// A labeled code wins over a bare digit run on the same line.
fn find_code(text: &str) -> Option<String> {
    CodeExtractor::labeled()
        .extract(text)
        .map(|m| m.value)
        .or_else(|| extract_code(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    fn parser(window: Option<usize>) -> HeaderBelowParser {
        HeaderBelowParser::new(&ParseOptions {
            lookahead_window: window,
        })
    }

    #[test]
    fn test_code_below_header() {
        let input = lines(&["3  Gadget  12 szt.", "Kod kres.: 1234567890123"]);

        assert!(parser(Some(3)).detect(&input));
        assert_eq!(
            parser(Some(3)).parse(&input),
            vec![CandidateRecord::new(3, 0)
                .with_code(Some("1234567890123".to_string()))
                .with_quantity(Some(12))]
        );
    }

    #[test]
    fn test_code_after_description_lines() {
        let input = lines(&[
            "1 Widget premium 4 szt.",
            "w opakowaniu zbiorczym",
            "Indeks: W-100",
            "EAN: 5901234123457",
            "2 Gadget 2 szt.",
            "EAN: 5901234123464",
        ]);

        let candidates = parser(Some(3)).parse(&input);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].code.as_deref(), Some("5901234123457"));
        assert_eq!(candidates[1].code.as_deref(), Some("5901234123464"));
    }

    #[test]
    fn test_window_is_bounded_by_lookahead() {
        let input = lines(&[
            "1 Widget 4 szt.",
            "opis",
            "opis",
            "EAN: 5901234123457",
        ]);

        assert_eq!(parser(Some(1)).parse(&input)[0].code, None);
        assert_eq!(
            parser(Some(3)).parse(&input)[0].code.as_deref(),
            Some("5901234123457")
        );
        assert_eq!(
            parser(None).parse(&input)[0].code.as_deref(),
            Some("5901234123457")
        );
    }

    #[test]
    fn test_unbounded_window_spans_repeated_table_header() {
        let input = lines(&[
            "1 Widget 4 szt.",
            "Kod kres.: 5901234123457",
            "2 Gadget 12 szt.",
            "Lp",
            "Nazwa towaru",
            "Ilość",
            "Kod kres.: 5901234123464",
            "3 Gizmo 7 szt.",
            "Kod kres.: 5901234123471",
        ]);

        let codes: Vec<Option<String>> =
            parser(None).parse(&input).into_iter().map(|c| c.code).collect();
        assert_eq!(
            codes,
            vec![
                Some("5901234123457".to_string()),
                Some("5901234123464".to_string()),
                Some("5901234123471".to_string()),
            ]
        );
    }

    #[test]
    fn test_huge_window_does_not_overflow() {
        let input = lines(&["1 Widget 4 szt.", "EAN: 5901234123457"]);
        assert_eq!(
            parser(Some(usize::MAX)).parse(&input)[0].code.as_deref(),
            Some("5901234123457")
        );
    }

    #[test]
    fn test_code_is_never_taken_from_next_record() {
        let input = lines(&[
            "1 Widget 4 szt.",
            "2 Gadget 2 szt.",
            "EAN: 5901234123464",
        ]);

        let candidates = parser(None).parse(&input);
        assert_eq!(candidates[0].code, None);
        assert_eq!(candidates[1].code.as_deref(), Some("5901234123464"));
    }

    #[test]
    fn test_labeled_code_preferred_on_same_line() {
        assert_eq!(
            find_code("Indeks 12345678 EAN 5901234123457"),
            Some("5901234123457".to_string())
        );
    }

    #[test]
    fn test_header_with_inline_code_is_not_detected() {
        let input = lines(&["1 Widget 5901234123457 4 szt.", "2 Gadget 5901234123464 2 szt."]);
        assert!(!parser(None).detect(&input));
    }
}
