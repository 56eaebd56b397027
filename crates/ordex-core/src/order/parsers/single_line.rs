//! Single-line layouts: every field of a record sits on one line.

use tracing::trace;

use super::first_quantity;
use crate::models::CandidateRecord;
use crate::order::rules::patterns::QUANTITY;
use crate::order::rules::{parse_position, strip_position, CodeExtractor, FieldExtractor};

/// Where the position number of a single-line record comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionSource {
    /// Lines open with the product code; positions are numbered 1, 2, ...
    /// in encounter order.
    AutoIncrement,
    /// Lines open with a printed position marker.
    Marker,
}

/// Parser for the single-line grammar family.
#[derive(Debug, Clone, Copy)]
pub struct SingleLineParser {
    positions: PositionSource,
}

/// Fields located on one line.
struct LineFields<'a> {
    marker: Option<u32>,
    code: Option<String>,
    rest: &'a str,
}

impl SingleLineParser {
    pub fn new(positions: PositionSource) -> Self {
        Self { positions }
    }

    /// Code first, position auto-incremented.
    pub fn coded() -> Self {
        Self::new(PositionSource::AutoIncrement)
    }

    /// Position marker, code and quantity on one line.
    pub fn full() -> Self {
        Self::new(PositionSource::Marker)
    }

    /// Whether at least one line has this family member's record shape.
    pub fn detect(&self, lines: &[String]) -> bool {
        lines.iter().any(|line| {
            self.fields(line)
                .is_some_and(|f| f.code.is_some() && QUANTITY.is_match(f.rest))
        })
    }

    pub fn parse(&self, lines: &[String]) -> Vec<CandidateRecord> {
        let mut candidates = Vec::new();
        let mut next_position = 1u32;

        for (index, line) in lines.iter().enumerate() {
            let Some(fields) = self.fields(line) else {
                continue;
            };

            let position = match self.positions {
                PositionSource::AutoIncrement => {
                    let position = next_position;
                    next_position += 1;
                    position
                }
                PositionSource::Marker => match fields.marker {
                    Some(marker) => marker,
                    None => continue,
                },
            };

            let quantity = first_quantity([fields.rest]);
            trace!(
                "Line {}: position {} code {:?} quantity {:?}",
                index, position, fields.code, quantity
            );

            candidates.push(
                CandidateRecord::new(position, index)
                    .with_code(fields.code)
                    .with_quantity(quantity),
            );
        }

        candidates
    }

    /// Locate the fields of a record line, or `None` if the line does not
    /// open a record in this layout.
    fn fields<'a>(&self, line: &'a str) -> Option<LineFields<'a>> {
        match self.positions {
            PositionSource::AutoIncrement => {
                let code = CodeExtractor::leading().extract(line)?;
                let (_, end) = code.position?;
                Some(LineFields {
                    marker: None,
                    code: Some(code.value),
                    rest: &line[end..],
                })
            }
            PositionSource::Marker => {
                let marker = parse_position(line)?;
                let rest = strip_position(line);
                Some(LineFields {
                    marker: Some(marker),
                    code: CodeExtractor::new().extract(rest).map(|m| m.value),
                    rest,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_coded_single_line() {
        let parser = SingleLineParser::coded();
        let input = lines(&["5029040012366 Widget 96,00 szt."]);

        assert!(parser.detect(&input));
        assert_eq!(
            parser.parse(&input),
            vec![CandidateRecord::new(1, 0)
                .with_code(Some("5029040012366".to_string()))
                .with_quantity(Some(96))]
        );
    }

    #[test]
    fn test_coded_positions_follow_encounter_order() {
        let parser = SingleLineParser::coded();
        let input = lines(&[
            "Zamówienie 15/2024",
            "5029040012366 Widget 96,00 szt.",
            "Strona 1",
            "5029040012373 Gadget 12,00 szt.",
            "5029040012380 Gizmo bez ilości",
            "5029040012397 Doohickey 1 200,00 szt.",
        ]);

        let candidates = parser.parse(&input);
        let positions: Vec<u32> = candidates.iter().map(|c| c.position).collect();
        assert_eq!(positions, vec![1, 2, 3, 4]);
        assert!(positions.windows(2).all(|w| w[0] < w[1]));

        assert_eq!(candidates[2].quantity, None);
        assert_eq!(candidates[3].quantity, Some(1200));
    }

    #[test]
    fn test_full_single_line() {
        let parser = SingleLineParser::full();
        let input = lines(&[
            "Lp Nazwa EAN Ilość",
            "1 Widget 5901234123457 4 szt. 12,50",
            "2 Gadget 5901234123464 10 op. 3,20",
        ]);

        assert!(parser.detect(&input));
        let candidates = parser.parse(&input);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[1].position, 2);
        assert_eq!(candidates[1].code.as_deref(), Some("5901234123464"));
        assert_eq!(candidates[1].quantity, Some(10));
        assert_eq!(candidates[1].line, 2);
    }

    #[test]
    fn test_full_requires_code_on_marker_line() {
        let parser = SingleLineParser::full();
        assert!(!parser.detect(&lines(&["1 Widget 4 szt."])));

        let candidates = parser.parse(&lines(&["1 Widget 4 szt."]));
        assert_eq!(candidates[0].code, None);
    }

    #[test]
    fn test_coded_does_not_match_marker_lines() {
        let parser = SingleLineParser::coded();
        assert!(!parser.detect(&lines(&["1 Widget 5901234123457 4 szt."])));
    }
}
