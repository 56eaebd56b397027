//! Common regex patterns for order line recognition.

use lazy_static::lazy_static;
use regex::Regex;

/// Unit-of-measure markers that close a quantity ("12 szt.", "3 op").
///
/// Longer alternatives come first: the regex engine takes the leftmost
/// alternative that matches, not the longest.
const UNITS: &str = r"sztuk[ai]?|szt|opak|op|kpl|kart|but|pcs|pc|par|kg|mb|l|m";

/// Integer part of a quantity: plain digits or space-grouped thousands.
const QUANTITY_NUMBER: &str = r"(\d{1,3}(?:[ \u{00a0}]\d{3})+|\d+)(?:,(\d{1,3}))?";

lazy_static! {
    // Record start: a 1-4 digit position number, optional dot, then
    // whitespace or end of line
    pub static ref POSITION_START: Regex = Regex::new(
        r"^(\d{1,4})\.?(?:\s+|$)"
    ).unwrap();

    // Product codes (8-13 digits, never part of a longer digit run)
    pub static ref CODE: Regex = Regex::new(
        r"(?:^|\D)(\d{8,13})(?:\D|$)"
    ).unwrap();

    pub static ref LEADING_CODE: Regex = Regex::new(
        r"^(\d{8,13})(?:\s|$)"
    ).unwrap();

    pub static ref LABELED_CODE: Regex = Regex::new(
        r"(?i)\b(?:kod\s+kres\w*|kod\s+ean|ean(?:[\s-]*(?:13|8))?|gtin|kod)\b\.?\s*:?\s*(\d{8,13})(?:\D|$)"
    ).unwrap();

    // Quantity followed by a unit marker; a preceding minus sign, digit or
    // decimal separator disqualifies the match
    pub static ref QUANTITY: Regex = Regex::new(&format!(
        r"(?i)(?:^|[^\d,.\-]){QUANTITY_NUMBER}\s*(?:{UNITS})\.?(?:[^\p{{L}}\d]|$)"
    )).unwrap();

    // A line holding nothing but a quantity ("12 szt.")
    pub static ref QUANTITY_LINE: Regex = Regex::new(&format!(
        r"(?i)^{QUANTITY_NUMBER}\s*(?:{UNITS})\.?$"
    )).unwrap();

    // Digit run glued to a following letter at line start ("3Gadget")
    pub static ref GLUED_LEADING_NUMBER: Regex = Regex::new(
        r"^(\d+)(\p{L})"
    ).unwrap();

    // Pagination and footer noise
    pub static ref PAGE_MARKER: Regex = Regex::new(
        r"(?i)^(?:strona|str\.?|page|s\.)\s*\d+(?:\s*(?:z|ze|of|/)\s*\d+)?$"
    ).unwrap();

    pub static ref DASHED_PAGE_NUMBER: Regex = Regex::new(
        r"^[-\u{2013}]\s*\d+\s*[-\u{2013}]$"
    ).unwrap();

    pub static ref PAGE_FRACTION: Regex = Regex::new(
        r"^\d+\s*/\s*\d+$"
    ).unwrap();

    pub static ref FOOTER: Regex = Regex::new(
        r"(?i)^(?:wydruk\s+z\s+programu|wydrukowano|wygenerowano|dokument\s+wygenerowany|printed\s+(?:by|from)|ci[aą]g\s+dalszy|c\.d\.|continued\b)"
    ).unwrap();
}
