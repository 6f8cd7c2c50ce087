//! Unit string parsing and gram conversion
//!
//! Turns free-text units from authored plans into a [`UnitKind`] plus an
//! optional per-unit weight, and converts line amounts to grams.

use super::units::{grams_per_unit, UnitKind};

/// A unit string split into its kind and any gram annotation
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedUnit {
    /// The recognized unit (grams when unrecognized)
    pub kind: UnitKind,
    /// Gram weight if annotated (e.g., 60.0 from "stuk (60g)")
    pub gram_weight: Option<f64>,
    /// Whether the base unit string was a known unit
    pub recognized: bool,
}

/// Parse a unit string, extracting any gram annotation
///
/// Examples:
/// - "g" -> ParsedUnit { kind: Gram, gram_weight: None, .. }
/// - "stuk (60g)" -> ParsedUnit { kind: Piece, gram_weight: Some(60.0), .. }
/// - "plakje (20 gram)" -> ParsedUnit { kind: Slice, gram_weight: Some(20.0), .. }
pub fn parse_unit(unit_str: &str) -> ParsedUnit {
    let trimmed = unit_str.trim();

    let (base, gram_weight) = match (trimmed.find('('), trimmed.find(')')) {
        (Some(start), Some(end)) if end > start => (
            trimmed[..start].trim(),
            parse_gram_annotation(&trimmed[start + 1..end]),
        ),
        _ => (trimmed, None),
    };

    match UnitKind::recognize(base) {
        Some(kind) => ParsedUnit {
            kind,
            gram_weight,
            recognized: true,
        },
        None => {
            tracing::debug!(unit = unit_str, "unrecognized unit, treating amount as grams");
            ParsedUnit {
                kind: UnitKind::Gram,
                gram_weight,
                recognized: false,
            }
        }
    }
}

/// Parse a gram annotation like "20g", "20 g" or "20 gram"
fn parse_gram_annotation(s: &str) -> Option<f64> {
    let lower = s.to_lowercase();
    let trimmed = lower.trim();

    for suffix in &["grams", "gram", "gr", "g"] {
        if let Some(num_part) = trimmed.strip_suffix(suffix) {
            if let Ok(val) = num_part.trim().replace(',', ".").parse::<f64>() {
                if val > 0.0 {
                    return Some(val);
                }
            }
        }
    }

    None
}

/// Convert an amount in the given unit to grams
pub fn to_grams(amount: f64, unit: UnitKind, unit_weight_grams: Option<f64>) -> f64 {
    amount * grams_per_unit(unit, unit_weight_grams)
}

/// Convert grams back into an amount of the given unit
pub fn from_grams(grams: f64, unit: UnitKind, unit_weight_grams: Option<f64>) -> f64 {
    let per_unit = grams_per_unit(unit, unit_weight_grams);
    if per_unit <= 0.0 {
        return 0.0;
    }
    grams / per_unit
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_unit_simple() {
        let parsed = parse_unit("g");
        assert_eq!(parsed.kind, UnitKind::Gram);
        assert_eq!(parsed.gram_weight, None);
        assert!(parsed.recognized);
    }

    #[test]
    fn test_parse_unit_with_gram_annotation() {
        let parsed = parse_unit("stuk (60g)");
        assert_eq!(parsed.kind, UnitKind::Piece);
        assert_eq!(parsed.gram_weight, Some(60.0));
    }

    #[test]
    fn test_parse_unit_slice_with_spaced_annotation() {
        let parsed = parse_unit("plakje (20 gram)");
        assert_eq!(parsed.kind, UnitKind::Slice);
        assert_eq!(parsed.gram_weight, Some(20.0));
    }

    #[test]
    fn test_parse_unit_decimal_comma() {
        let parsed = parse_unit("tl (2,5g)");
        assert_eq!(parsed.kind, UnitKind::Teaspoon);
        assert_eq!(parsed.gram_weight, Some(2.5));
    }

    #[test]
    fn test_parse_unknown_unit() {
        let parsed = parse_unit("scoop (30g)");
        assert_eq!(parsed.kind, UnitKind::Gram);
        assert!(!parsed.recognized);
        assert_eq!(parsed.gram_weight, Some(30.0));
    }

    #[test]
    fn test_to_grams() {
        assert_eq!(to_grams(150.0, UnitKind::Gram, None), 150.0);
        assert_eq!(to_grams(2.0, UnitKind::Tablespoon, None), 30.0);
        assert_eq!(to_grams(2.0, UnitKind::Piece, Some(60.0)), 120.0);
        assert_eq!(to_grams(0.5, UnitKind::Cup, None), 120.0);
    }

    #[test]
    fn test_from_grams() {
        assert!((from_grams(45.0, UnitKind::Tablespoon, None) - 3.0).abs() < 1e-9);
        assert!((from_grams(120.0, UnitKind::Piece, Some(60.0)) - 2.0).abs() < 1e-9);
    }
}
