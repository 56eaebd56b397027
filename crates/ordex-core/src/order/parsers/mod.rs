//! Layout parsers, one parameterized algorithm per grammar family.
//!
//! Every parser returns one [`CandidateRecord`] per detected line group.
//! Fields are only ever searched inside the window bounded by the
//! neighbouring position markers, so a record can never pick up a code or
//! quantity belonging to the record before or after it.
//!
//! [`CandidateRecord`]: crate::models::CandidateRecord

mod code_before;
mod header_below;
mod single_line;

pub use code_before::CodeBeforeParser;
pub use header_below::HeaderBelowParser;
pub use single_line::{PositionSource, SingleLineParser};

use super::rules::patterns::QUANTITY;
use super::rules::extract_quantity;

/// Options shared by the layout parsers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Lines searched below a header line for its product code. `None`
    /// searches up to the next record start.
    pub lookahead_window: Option<usize>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            lookahead_window: None,
        }
    }
}

/// Quantity of the first text carrying a quantity-shaped token.
///
/// That text decides: when its value does not convert, the quantity stays
/// unresolved instead of falling through to a later line.
fn first_quantity<'a>(texts: impl IntoIterator<Item = &'a str>) -> Option<u32> {
    texts
        .into_iter()
        .find(|text| QUANTITY.is_match(text))
        .and_then(extract_quantity)
}

/// End (exclusive) of the window opened by the `k`-th record start.
fn window_end(starts: &[usize], k: usize, len: usize) -> usize {
    starts.get(k + 1).copied().unwrap_or(len)
}
