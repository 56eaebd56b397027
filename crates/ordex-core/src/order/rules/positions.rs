//! Position (Lp) markers.

use super::patterns::{POSITION_START, QUANTITY_LINE};

/// Parse the position number opening a record-start line.
///
/// A line holding only a quantity ("12 szt.") is not a record start even
/// though it opens with a number. Position 0 is not a valid line number.
pub fn parse_position(line: &str) -> Option<u32> {
    if QUANTITY_LINE.is_match(line) {
        return None;
    }

    let caps = POSITION_START.captures(line)?;
    caps[1].parse::<u32>().ok().filter(|&n| n >= 1)
}

/// Whether the line opens a new record.
pub fn is_record_start(line: &str) -> bool {
    parse_position(line).is_some()
}

/// The line with its position marker removed.
pub fn strip_position(line: &str) -> &str {
    match POSITION_START.find(line) {
        Some(m) if !QUANTITY_LINE.is_match(line) => &line[m.end()..],
        _ => line,
    }
}

/// Indices of all record-start lines, in order.
pub fn record_starts<S: AsRef<str>>(lines: &[S]) -> Vec<usize> {
    lines
        .iter()
        .enumerate()
        .filter(|(_, line)| is_record_start(line.as_ref()))
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_position() {
        assert_eq!(parse_position("3  Gadget  12 szt."), Some(3));
        assert_eq!(parse_position("12. Widget"), Some(12));
        assert_eq!(parse_position("7"), Some(7));
        assert_eq!(parse_position("0 Widget"), None);
        assert_eq!(parse_position("5029040012366 Widget"), None);
        assert_eq!(parse_position("96,00 szt."), None);
        assert_eq!(parse_position("12 szt."), None);
        assert_eq!(parse_position("Kod kres.: 1234567890123"), None);
    }

    #[test]
    fn test_strip_position() {
        assert_eq!(strip_position("3  Gadget  12 szt."), "Gadget  12 szt.");
        assert_eq!(strip_position("12 szt."), "12 szt.");
        assert_eq!(strip_position("Widget"), "Widget");
    }

    #[test]
    fn test_record_starts() {
        let lines = ["header", "1 Widget", "5 szt.", "2 Gadget", "EAN 12345678"];
        assert_eq!(record_starts(&lines), vec![1, 3]);
    }
}
