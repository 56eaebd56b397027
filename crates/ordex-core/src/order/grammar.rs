//! Layout grammars: the known ways order tables are flattened into lines.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A named layout rule set.
///
/// Grammars are static; the classifier picks exactly one per document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grammar {
    /// Code and quantity on one line, code first; positions are numbered
    /// in encounter order.
    SingleLineCoded,
    /// Position and quantity on a header line, code on a line below it.
    HeaderCodeBelow,
    /// Position, code and quantity on one (possibly wrapped) line.
    SingleLineFull,
    /// A labeled code line ("Kod kres.:", "EAN:") precedes the position line.
    LabeledCode,
    /// A bare code line precedes the position line.
    CodeBeforeHeader,
}

impl Grammar {
    /// All grammars in classification priority order.
    pub const PRIORITY: [Grammar; 5] = [
        Grammar::SingleLineCoded,
        Grammar::HeaderCodeBelow,
        Grammar::SingleLineFull,
        Grammar::LabeledCode,
        Grammar::CodeBeforeHeader,
    ];

    /// Selected when no detection predicate matches.
    pub const FALLBACK: Grammar = Grammar::CodeBeforeHeader;

    /// Stable identifier used in config files and on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Grammar::SingleLineCoded => "single_line_coded",
            Grammar::HeaderCodeBelow => "header_code_below",
            Grammar::SingleLineFull => "single_line_full",
            Grammar::LabeledCode => "labeled_code",
            Grammar::CodeBeforeHeader => "code_before_header",
        }
    }

    /// Whether continuation lines are merged into their record line before
    /// parsing.
    pub fn merges_continuations(&self) -> bool {
        matches!(self, Grammar::SingleLineFull)
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Grammar {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Grammar::PRIORITY
            .into_iter()
            .find(|g| g.name() == normalized)
            .ok_or_else(|| {
                let known: Vec<&str> = Grammar::PRIORITY.iter().map(|g| g.name()).collect();
                format!("unknown grammar '{}', expected one of: {}", s, known.join(", "))
            })
    }
}
