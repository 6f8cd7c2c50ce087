//! Unit kinds and unit-family semantics
//!
//! Every ingredient line carries one of a closed set of units. The unit decides
//! how many grams one unit weighs, how a scaled amount is rounded, and whether
//! the line may be scaled fractionally at all.

use serde::{Deserialize, Serialize};

/// Measurement unit of an ingredient line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UnitKind {
    /// Amount in grams
    Gram,
    /// Amount in milliliters
    Milliliter,
    /// Amount counted in 100 g portions
    Per100g,
    /// Amount counted in 30 g portions
    Per30g,
    Tablespoon,
    Teaspoon,
    Cup,
    Piece,
    Slice,
    Handful,
}

/// Rounding/scaling family of a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitFamily {
    /// Weight-like units rounded to whole units (g, ml, portions)
    Weight,
    /// Spoons, rounded to half spoons
    Spoon,
    /// Cups, rounded to one decimal
    Volume,
    /// Whole items that cannot be split in practice
    Discrete,
}

// ============================================================================
// Conversion Constants (grams per unit)
// ============================================================================

/// Grams per tablespoon
pub const G_PER_TBSP: f64 = 15.0;
/// Grams per teaspoon
pub const G_PER_TSP: f64 = 5.0;
/// Grams per cup
pub const G_PER_CUP: f64 = 240.0;
/// Grams per "per 30g" portion
pub const G_PER_30G_PORTION: f64 = 30.0;
/// Grams per "per 100g" portion
pub const G_PER_100G_PORTION: f64 = 100.0;
/// Unit weight assumed for discrete items without a known weight
pub const DEFAULT_UNIT_WEIGHT_G: f64 = 100.0;

impl UnitKind {
    /// Parse a unit string, falling back to grams for anything unrecognized
    pub fn parse(unit: &str) -> Self {
        super::converter::parse_unit(unit).kind
    }

    /// Parse a unit string, returning None when it is not a known unit
    pub fn recognize(unit: &str) -> Option<Self> {
        let lower = unit.to_lowercase();
        let trimmed = lower.trim().trim_end_matches('.');

        let kind = match trimmed {
            "g" | "gr" | "gram" | "grams" | "gramm" => UnitKind::Gram,
            "ml" | "milliliter" | "milliliters" | "millilitre" | "millilitres" => {
                UnitKind::Milliliter
            }
            "per_100g" | "per 100g" | "per 100 g" | "per100g" | "100g" => UnitKind::Per100g,
            "per_30g" | "per 30g" | "per 30 g" | "per30g" | "30g" | "portie" => UnitKind::Per30g,
            "tablespoon" | "tablespoons" | "tbsp" | "el" | "eetlepel" | "eetlepels" => {
                UnitKind::Tablespoon
            }
            "teaspoon" | "teaspoons" | "tsp" | "tl" | "theelepel" | "theelepels" => {
                UnitKind::Teaspoon
            }
            "cup" | "cups" | "kop" | "kopje" | "kopjes" => UnitKind::Cup,
            "piece" | "pieces" | "each" | "count" | "stuk" | "stuks" | "st" => UnitKind::Piece,
            "slice" | "slices" | "plak" | "plakje" | "plakjes" | "plakken" | "snee" | "sneetje"
            | "sneetjes" => UnitKind::Slice,
            "handful" | "handfuls" | "handje" | "handjes" | "handvol" => UnitKind::Handful,
            _ => return None,
        };
        Some(kind)
    }

    /// Canonical storage string
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitKind::Gram => "gram",
            UnitKind::Milliliter => "ml",
            UnitKind::Per100g => "per_100g",
            UnitKind::Per30g => "per_30g",
            UnitKind::Tablespoon => "tablespoon",
            UnitKind::Teaspoon => "teaspoon",
            UnitKind::Cup => "cup",
            UnitKind::Piece => "piece",
            UnitKind::Slice => "slice",
            UnitKind::Handful => "handful",
        }
    }

    pub fn family(&self) -> UnitFamily {
        match self {
            UnitKind::Gram | UnitKind::Milliliter | UnitKind::Per100g | UnitKind::Per30g => {
                UnitFamily::Weight
            }
            UnitKind::Tablespoon | UnitKind::Teaspoon => UnitFamily::Spoon,
            UnitKind::Cup => UnitFamily::Volume,
            UnitKind::Piece | UnitKind::Slice | UnitKind::Handful => UnitFamily::Discrete,
        }
    }

    pub fn is_discrete(&self) -> bool {
        self.family() == UnitFamily::Discrete
    }

    /// True for units whose amount is a plain gram or milliliter count
    pub fn is_mass_or_liquid(&self) -> bool {
        matches!(self, UnitKind::Gram | UnitKind::Milliliter)
    }

    /// Rounding step of this unit's family
    pub fn rounding_step(&self) -> f64 {
        match self.family() {
            UnitFamily::Weight | UnitFamily::Discrete => 1.0,
            UnitFamily::Spoon => 0.5,
            UnitFamily::Volume => 0.1,
        }
    }
}

impl From<String> for UnitKind {
    fn from(s: String) -> Self {
        UnitKind::parse(&s)
    }
}

impl From<UnitKind> for String {
    fn from(unit: UnitKind) -> Self {
        unit.as_str().to_string()
    }
}

impl std::fmt::Display for UnitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Grams represented by one unit of an ingredient line
///
/// Discrete units use the line's own unit weight, defaulting to 100 g so a
/// weightless piece multiplies its per-100g density by the raw amount.
pub fn grams_per_unit(unit: UnitKind, unit_weight_grams: Option<f64>) -> f64 {
    match unit {
        UnitKind::Gram | UnitKind::Milliliter => 1.0,
        UnitKind::Per100g => G_PER_100G_PORTION,
        UnitKind::Per30g => G_PER_30G_PORTION,
        UnitKind::Tablespoon => G_PER_TBSP,
        UnitKind::Teaspoon => G_PER_TSP,
        UnitKind::Cup => G_PER_CUP,
        UnitKind::Piece | UnitKind::Slice | UnitKind::Handful => unit_weight_grams
            .filter(|w| w.is_finite() && *w > 0.0)
            .unwrap_or(DEFAULT_UNIT_WEIGHT_G),
    }
}

/// Round a value to the nearest multiple of `step`
pub fn round_to_step(value: f64, step: f64) -> f64 {
    if step <= 0.0 {
        return value;
    }
    let rounded = (value / step).round() * step;
    // Keep one-decimal steps from printing as 0.30000000000000004
    (rounded * 1000.0).round() / 1000.0
}

/// Round a continuous amount to its unit's granularity
pub fn round_for_unit(value: f64, unit: UnitKind) -> f64 {
    round_to_step(value, unit.rounding_step())
}
