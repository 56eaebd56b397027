//! Layout classification.
//!
//! The classifier walks a static table of `(grammar, detect, parse)`
//! entries in priority order and selects the first grammar whose detection
//! predicate holds for the normalized lines. Predicates are existence tests
//! over individual lines; they are heuristics, and a document that satisfies
//! several of them goes to the one listed first.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::grammar::Grammar;
use super::parsers::{CodeBeforeParser, HeaderBelowParser, ParseOptions, SingleLineParser};
use crate::models::CandidateRecord;

pub type DetectFn = fn(&[String], &ParseOptions) -> bool;
pub type ParseFn = fn(&[String], &ParseOptions) -> Vec<CandidateRecord>;

/// One row of the grammar table.
pub struct GrammarEntry {
    pub grammar: Grammar,
    pub detect: DetectFn,
    pub parse: ParseFn,
}

/// All grammars with their predicates and parsers, in priority order.
/// The last entry is the fallback.
pub static GRAMMAR_TABLE: [GrammarEntry; 5] = [
    GrammarEntry {
        grammar: Grammar::SingleLineCoded,
        detect: detect_single_line_coded,
        parse: parse_single_line_coded,
    },
    GrammarEntry {
        grammar: Grammar::HeaderCodeBelow,
        detect: detect_header_code_below,
        parse: parse_header_code_below,
    },
    GrammarEntry {
        grammar: Grammar::SingleLineFull,
        detect: detect_single_line_full,
        parse: parse_single_line_full,
    },
    GrammarEntry {
        grammar: Grammar::LabeledCode,
        detect: detect_labeled_code,
        parse: parse_labeled_code,
    },
    GrammarEntry {
        grammar: Grammar::CodeBeforeHeader,
        detect: detect_code_before_header,
        parse: parse_code_before_header,
    },
];

fn detect_single_line_coded(lines: &[String], _: &ParseOptions) -> bool {
    SingleLineParser::coded().detect(lines)
}

fn parse_single_line_coded(lines: &[String], _: &ParseOptions) -> Vec<CandidateRecord> {
    SingleLineParser::coded().parse(lines)
}

fn detect_header_code_below(lines: &[String], options: &ParseOptions) -> bool {
    HeaderBelowParser::new(options).detect(lines)
}

fn parse_header_code_below(lines: &[String], options: &ParseOptions) -> Vec<CandidateRecord> {
    HeaderBelowParser::new(options).parse(lines)
}

fn detect_single_line_full(lines: &[String], _: &ParseOptions) -> bool {
    SingleLineParser::full().detect(lines)
}

fn parse_single_line_full(lines: &[String], _: &ParseOptions) -> Vec<CandidateRecord> {
    SingleLineParser::full().parse(lines)
}

fn detect_labeled_code(lines: &[String], _: &ParseOptions) -> bool {
    CodeBeforeParser::labeled().detect(lines)
}

fn parse_labeled_code(lines: &[String], _: &ParseOptions) -> Vec<CandidateRecord> {
    CodeBeforeParser::labeled().parse(lines)
}

fn detect_code_before_header(lines: &[String], _: &ParseOptions) -> bool {
    CodeBeforeParser::bare().detect(lines)
}

fn parse_code_before_header(lines: &[String], _: &ParseOptions) -> Vec<CandidateRecord> {
    CodeBeforeParser::bare().parse(lines)
}

/// Table entry of a grammar.
pub fn entry(grammar: Grammar) -> &'static GrammarEntry {
    GRAMMAR_TABLE
        .iter()
        .find(|e| e.grammar == grammar)
        .unwrap_or(&GRAMMAR_TABLE[GRAMMAR_TABLE.len() - 1])
}

/// Outcome of classifying one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    /// Selected grammar.
    pub grammar: Grammar,

    /// Whether the grammar's predicate matched, as opposed to the fallback
    /// being selected because nothing did.
    pub detected: bool,

    /// Whether the grammar was forced by configuration.
    pub forced: bool,
}

/// Selects one layout grammar per document.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    options: ParseOptions,
    forced: Option<Grammar>,
}

impl Classifier {
    pub fn new(options: ParseOptions) -> Self {
        Self {
            options,
            forced: None,
        }
    }

    /// Skip detection and always select this grammar.
    pub fn with_forced_grammar(mut self, grammar: Option<Grammar>) -> Self {
        self.forced = grammar;
        self
    }

    pub fn forced_grammar(&self) -> Option<Grammar> {
        self.forced
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Select the grammar for a normalized, unmerged line sequence.
    pub fn classify(&self, lines: &[String]) -> Classification {
        if let Some(grammar) = self.forced {
            debug!("Using forced grammar {}", grammar);
            return Classification {
                grammar,
                detected: true,
                forced: true,
            };
        }

        for entry in &GRAMMAR_TABLE {
            if (entry.detect)(lines, &self.options) {
                debug!("Detected grammar {}", entry.grammar);
                return Classification {
                    grammar: entry.grammar,
                    detected: true,
                    forced: false,
                };
            }
        }

        debug!("No grammar predicate matched, falling back to {}", Grammar::FALLBACK);
        Classification {
            grammar: Grammar::FALLBACK,
            detected: false,
            forced: false,
        }
    }

    /// Result of every predicate, in priority order.
    pub fn evaluate(&self, lines: &[String]) -> Vec<(Grammar, bool)> {
        GRAMMAR_TABLE
            .iter()
            .map(|entry| (entry.grammar, (entry.detect)(lines, &self.options)))
            .collect()
    }

    /// Run the parser of a grammar.
    pub fn parse(&self, grammar: Grammar, lines: &[String]) -> Vec<CandidateRecord> {
        (entry(grammar).parse)(lines, &self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    fn detected(raw: &[&str]) -> Grammar {
        let classification = Classifier::default().classify(&lines(raw));
        assert!(classification.detected);
        classification.grammar
    }

    #[test]
    fn test_table_follows_priority() {
        let order: Vec<Grammar> = GRAMMAR_TABLE.iter().map(|e| e.grammar).collect();
        assert_eq!(order, Grammar::PRIORITY.to_vec());
        assert_eq!(entry(Grammar::FALLBACK).grammar, Grammar::CodeBeforeHeader);
    }

    #[test]
    fn test_single_line_coded() {
        assert_eq!(
            detected(&["5029040012366 Widget 96,00 szt."]),
            Grammar::SingleLineCoded
        );
    }

    #[test]
    fn test_header_code_below() {
        assert_eq!(
            detected(&["3  Gadget  12 szt.", "Kod kres.: 1234567890123"]),
            Grammar::HeaderCodeBelow
        );
        assert_eq!(
            detected(&[
                "1 Widget 4 szt.",
                "5901234123457",
                "2 Gadget 2 szt.",
                "5901234123464",
            ]),
            Grammar::HeaderCodeBelow
        );
    }

    #[test]
    fn test_single_line_full() {
        assert_eq!(
            detected(&[
                "Lp Nazwa EAN Ilość",
                "1 Widget 5901234123457 4 szt.",
                "2 Gadget 5901234123464 2 szt.",
            ]),
            Grammar::SingleLineFull
        );
    }

    #[test]
    fn test_labeled_code() {
        assert_eq!(
            detected(&[
                "EAN: 5901234123457",
                "1 Widget",
                "4 szt.",
                "EAN: 5901234123464",
                "2 Gadget",
                "2 szt.",
            ]),
            Grammar::LabeledCode
        );
    }

    #[test]
    fn test_code_before_header_detected() {
        assert_eq!(
            detected(&["5901234123457", "1 Widget", "4 szt."]),
            Grammar::CodeBeforeHeader
        );
    }

    #[test]
    fn test_fourteen_digits_fall_back() {
        let input = lines(&["12345678901234"]);
        let classifier = Classifier::default();

        assert!(classifier.evaluate(&input).iter().all(|(_, matched)| !matched));
        assert_eq!(
            classifier.classify(&input),
            Classification {
                grammar: Grammar::FALLBACK,
                detected: false,
                forced: false,
            }
        );
        assert!(classifier.parse(Grammar::FALLBACK, &input).is_empty());
    }

    #[test]
    fn test_first_in_priority_wins() {
        // Satisfies both the coded and the full single-line predicates
        let input = lines(&[
            "5029040012366 Widget 96,00 szt.",
            "1 Gadget 5901234123464 2 szt.",
        ]);

        let results = Classifier::default().evaluate(&input);
        assert!(results.contains(&(Grammar::SingleLineCoded, true)));
        assert!(results.contains(&(Grammar::SingleLineFull, true)));
        assert_eq!(
            Classifier::default().classify(&input).grammar,
            Grammar::SingleLineCoded
        );
    }

    #[test]
    fn test_forced_grammar() {
        let classifier =
            Classifier::default().with_forced_grammar(Some(Grammar::SingleLineFull));
        let classification = classifier.classify(&lines(&["5029040012366 Widget 96,00 szt."]));

        assert_eq!(classification.grammar, Grammar::SingleLineFull);
        assert!(classification.forced);
    }
}
