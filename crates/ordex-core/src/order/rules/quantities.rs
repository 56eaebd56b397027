//! Quantity extraction for order lines.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::debug;

use super::patterns::QUANTITY;
use super::{ExtractionMatch, FieldExtractor};

/// Quantity field extractor.
///
/// A quantity is a number followed by a unit marker. The first structural
/// match in the text decides: if it cannot be converted, the quantity is
/// unresolved rather than taken from a later, less likely number.
pub struct QuantityExtractor;

impl QuantityExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for QuantityExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for QuantityExtractor {
    type Output = ExtractionMatch<u32>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        let caps = QUANTITY.captures(text)?;
        let number = caps.get(1)?;
        let fraction = caps.get(2).map(|m| m.as_str());

        match parse_quantity(number.as_str(), fraction) {
            Some(value) => Some(
                ExtractionMatch::new(value, number.as_str())
                    .with_position(number.start(), number.end()),
            ),
            None => {
                debug!("Skipping unconvertible quantity {:?} in {:?}", number.as_str(), text);
                None
            }
        }
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut results = Vec::new();

        for caps in QUANTITY.captures_iter(text) {
            let Some(number) = caps.get(1) else {
                continue;
            };
            let fraction = caps.get(2).map(|m| m.as_str());
            if let Some(value) = parse_quantity(number.as_str(), fraction) {
                results.push(
                    ExtractionMatch::new(value, number.as_str())
                        .with_position(number.start(), number.end()),
                );
            }
        }

        results
    }
}

/// Convert a matched quantity to a unit count.
///
/// Thousands separators (spaces, non-breaking spaces) are stripped and the
/// decimal fraction is discarded. Returns `None` for negative values and
/// values that do not fit a `u32`.
pub fn parse_quantity(integer_part: &str, fraction: Option<&str>) -> Option<u32> {
    let cleaned: String = integer_part
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{00a0}')
        .collect();

    let normalized = match fraction {
        Some(fraction) if !fraction.is_empty() => format!("{}.{}", cleaned, fraction),
        _ => cleaned,
    };

    let amount = Decimal::from_str(&normalized).ok()?;
    if amount.is_sign_negative() {
        return None;
    }

    amount.trunc().to_u32()
}

/// Find the first quantity in a line.
pub fn extract_quantity(text: &str) -> Option<u32> {
    QuantityExtractor::new().extract(text).map(|m| m.value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("96", Some("00")), Some(96));
        assert_eq!(parse_quantity("12", Some("75")), Some(12));
        assert_eq!(parse_quantity("1 200", None), Some(1200));
        assert_eq!(parse_quantity("1\u{00a0}200", Some("5")), Some(1200));
        assert_eq!(parse_quantity("0", None), Some(0));
        assert_eq!(parse_quantity("-4", None), None);
        assert_eq!(parse_quantity("99999999999", None), None);
    }

    #[test]
    fn test_extract_quantity() {
        assert_eq!(extract_quantity("5029040012366 Widget 96,00 szt."), Some(96));
        assert_eq!(extract_quantity("3  Gadget  12 szt."), Some(12));
        assert_eq!(extract_quantity("Karton 2 op. 15,00 PLN"), Some(2));
        assert_eq!(extract_quantity("Widget 96,00"), None);
    }

    #[test]
    fn test_negative_quantity_is_not_matched() {
        assert_eq!(extract_quantity("Korekta -3 szt."), None);
    }

    #[test]
    fn test_overflowing_quantity_is_unresolved() {
        // Structurally a quantity, but it does not convert
        assert_eq!(extract_quantity("Widget 99999999999 szt. 2 szt."), None);
    }

    #[test]
    fn test_extract_all_quantities() {
        let extractor = QuantityExtractor::new();
        let values: Vec<u32> = extractor
            .extract_all("1 op. (12 szt.)")
            .into_iter()
            .map(|m| m.value)
            .collect();
        assert_eq!(values, vec![1, 12]);
    }
}
