//! Conversion of one document into its final record set.
//!
//! ```text
//! raw lines -> normalize -> classify -> (merge) -> parse -> consolidate
//! ```
//!
//! Every conversion is independent: a [`Converter`] holds only immutable
//! settings and can be shared across threads.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::classifier::{entry, Classification, Classifier};
use super::consolidator::{Consistency, Consolidated, Consolidator, RecordStats};
use super::grammar::Grammar;
use super::normalizer::LineNormalizer;
use super::parsers::ParseOptions;
use crate::error::{ConversionError, Result};
use crate::models::{CandidateRecord, OrdexConfig, Record};
use crate::pdf::LineExtractor;

/// How the grammar of a document is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseStrategy {
    /// The classifier picks exactly one grammar.
    #[default]
    FirstMatch,
    /// Try every grammar in priority order and keep the first one that
    /// yields records; the classified grammar is used when none does.
    FirstNonEmpty,
}

/// Transient state of one conversion.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentSession {
    /// Lines as handed over by the extractor.
    pub raw_lines: Vec<String>,

    /// Normalized lines the grammar was selected on.
    pub lines: Vec<String>,

    /// Lines the parser ran on: merged for grammars that merge
    /// continuations, otherwise the normalized lines.
    pub parsed_lines: Vec<String>,

    /// Grammar used for parsing.
    pub classification: Classification,

    /// Parser output before consolidation.
    pub candidates: Vec<CandidateRecord>,

    /// Final records.
    pub records: Vec<Record>,

    /// Cross-check statistics.
    pub stats: RecordStats,

    /// Discrepancy warnings.
    pub warnings: Vec<String>,

    /// Text extraction backend, for PDF input.
    pub extractor: Option<String>,

    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

impl DocumentSession {
    pub fn grammar(&self) -> Grammar {
        self.classification.grammar
    }

    pub fn consistency(&self) -> Consistency {
        self.stats.consistency()
    }

    /// Whether no positions were found.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Parsing outcome of one grammar.
struct Attempt {
    classification: Classification,
    parsed_lines: Vec<String>,
    candidates: Vec<CandidateRecord>,
    consolidated: Consolidated,
}

/// Converts documents into order records.
pub struct Converter {
    normalizer: LineNormalizer,
    classifier: Classifier,
    consolidator: Consolidator,
    extractor: LineExtractor,
    strategy: ParseStrategy,
}

impl Converter {
    /// Create a converter with default settings.
    pub fn new() -> Self {
        Self {
            normalizer: LineNormalizer::new(),
            classifier: Classifier::default(),
            consolidator: Consolidator::new(),
            extractor: LineExtractor::new(),
            strategy: ParseStrategy::default(),
        }
    }

    /// Create a converter from configuration.
    pub fn from_config(config: &OrdexConfig) -> Result<Self> {
        let options = ParseOptions {
            lookahead_window: config.parsing.lookahead_window,
        };

        Ok(Self {
            normalizer: LineNormalizer::from_config(&config.normalize)?,
            classifier: Classifier::new(options)
                .with_forced_grammar(config.parsing.forced_grammar),
            consolidator: Consolidator::new(),
            extractor: LineExtractor::from_config(&config.pdf),
            strategy: config.parsing.strategy,
        })
    }

    /// Set the grammar selection strategy.
    pub fn with_strategy(mut self, strategy: ParseStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Always use this grammar instead of classifying.
    pub fn with_forced_grammar(mut self, grammar: Option<Grammar>) -> Self {
        self.classifier = self.classifier.with_forced_grammar(grammar);
        self
    }

    /// Set the header lookahead window, in lines (`None` = up to the next
    /// position).
    pub fn with_lookahead_window(mut self, window: Option<usize>) -> Self {
        let forced = self.classifier.forced_grammar();
        self.classifier = Classifier::new(ParseOptions {
            lookahead_window: window,
        })
        .with_forced_grammar(forced);
        self
    }

    pub fn with_normalizer(mut self, normalizer: LineNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn with_extractor(mut self, extractor: LineExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn normalizer(&self) -> &LineNormalizer {
        &self.normalizer
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Convert a sequence of raw text lines.
    ///
    /// Fails with [`ConversionError::NoText`] when nothing is left after
    /// normalization; in that case no grammar runs.
    pub fn convert_lines<S: AsRef<str>>(&self, raw: &[S]) -> Result<DocumentSession> {
        let started = Utc::now();

        let raw_lines: Vec<String> = raw.iter().map(|l| l.as_ref().to_string()).collect();
        let lines = self.normalizer.normalize(&raw_lines);
        if lines.is_empty() {
            return Err(ConversionError::NoText.into());
        }

        let classification = self.classifier.classify(&lines);
        let attempt = match self.strategy {
            ParseStrategy::FirstNonEmpty if !classification.forced => {
                self.first_non_empty(&lines, classification)
            }
            _ => self.attempt(&lines, classification),
        };

        let warnings = attempt.consolidated.stats.warnings();
        let processing_time_ms = (Utc::now() - started).num_milliseconds().max(0) as u64;

        info!(
            "Converted {} lines with grammar {} into {} records in {}ms",
            lines.len(),
            attempt.classification.grammar,
            attempt.consolidated.records.len(),
            processing_time_ms
        );

        Ok(DocumentSession {
            raw_lines,
            lines,
            parsed_lines: attempt.parsed_lines,
            classification: attempt.classification,
            candidates: attempt.candidates,
            records: attempt.consolidated.records,
            stats: attempt.consolidated.stats,
            warnings,
            extractor: None,
            processing_time_ms,
        })
    }

    /// Convert plain text, one line per text line.
    pub fn convert_text(&self, text: &str) -> Result<DocumentSession> {
        let lines: Vec<&str> = text.lines().collect();
        self.convert_lines(&lines)
    }

    /// Extract the text of a PDF and convert it.
    pub fn convert_pdf(&self, data: &[u8]) -> Result<DocumentSession> {
        let extracted = self.extractor.extract_lines(data);
        let mut session = self.convert_lines(&extracted.lines)?;
        session.extractor = extracted.extractor.map(str::to_string);
        Ok(session)
    }

    fn attempt(&self, lines: &[String], classification: Classification) -> Attempt {
        let grammar = classification.grammar;
        let parsed_lines = if grammar.merges_continuations() {
            self.normalizer.normalize_merged(lines)
        } else {
            lines.to_vec()
        };

        let candidates = self.classifier.parse(grammar, &parsed_lines);
        debug!("{} produced {} candidates", grammar, candidates.len());
        let consolidated = self.consolidator.consolidate(candidates.clone());

        Attempt {
            classification,
            parsed_lines,
            candidates,
            consolidated,
        }
    }

    fn first_non_empty(&self, lines: &[String], classified: Classification) -> Attempt {
        for grammar in Grammar::PRIORITY {
            let classification = if grammar == classified.grammar {
                classified
            } else {
                Classification {
                    grammar,
                    detected: (entry(grammar).detect)(lines, self.classifier.options()),
                    forced: false,
                }
            };

            let attempt = self.attempt(lines, classification);
            if !attempt.consolidated.records.is_empty() {
                return attempt;
            }
            debug!("{} yielded no records", grammar);
        }

        self.attempt(lines, classified)
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::new()
    }
}
