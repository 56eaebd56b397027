//! Order table recovery: normalization, layout classification, parsing and
//! consolidation.

mod classifier;
mod consolidator;
mod converter;
mod grammar;
mod normalizer;
pub mod parsers;
pub mod rules;

pub use classifier::{entry, Classification, Classifier, GrammarEntry, GRAMMAR_TABLE};
pub use consolidator::{Consistency, Consolidated, Consolidator, RecordStats};
pub use converter::{Converter, DocumentSession, ParseStrategy};
pub use grammar::Grammar;
pub use normalizer::LineNormalizer;
pub use parsers::ParseOptions;
