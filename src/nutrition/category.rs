//! Ingredient categories and scaling guardrails
//!
//! A category bounds how far an ingredient line may move and how coarsely its
//! amount is rounded. Records can carry a category directly; name matching is
//! the fallback for lines that don't.

use serde::{Deserialize, Serialize};

use super::units::{round_to_step, UnitKind};

/// Lower bound of the relative-change band (fraction of baseline)
pub const MIN_RELATIVE_CHANGE: f64 = 0.4;
/// Upper bound of the relative-change band (fraction of baseline)
pub const MAX_RELATIVE_CHANGE: f64 = 1.6;

const AMOUNT_EPSILON: f64 = 1e-9;

/// Coarse food category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Category {
    Egg,
    Cheese,
    Dairy,
    Meat,
    Fat,
    Carb,
    #[default]
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Egg => "egg",
            Category::Cheese => "cheese",
            Category::Dairy => "dairy",
            Category::Meat => "meat",
            Category::Fat => "fat",
            Category::Carb => "carb",
            Category::Other => "other",
        }
    }

    /// Lenient parse of a stored category tag
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "egg" | "eggs" | "ei" => Category::Egg,
            "cheese" | "kaas" => Category::Cheese,
            "dairy" | "zuivel" => Category::Dairy,
            "meat" | "fish" | "vlees" | "vis" => Category::Meat,
            "fat" | "oil" | "vet" | "olie" => Category::Fat,
            "carb" | "carbs" | "starch" | "koolhydraat" | "koolhydraten" => Category::Carb,
            _ => Category::Other,
        }
    }
}

impl From<String> for Category {
    fn from(s: String) -> Self {
        Category::from_str(&s)
    }
}

// ============================================================================
// Name Classification
// ============================================================================

#[derive(Clone, Copy)]
enum Keyword {
    /// Matches anywhere in the name
    Sub(&'static str),
    /// Matches a whole word only
    Word(&'static str),
}

struct CategoryRule {
    category: Category,
    keywords: &'static [Keyword],
    excludes: &'static [&'static str],
}

use Keyword::{Sub, Word};

// Checked in order; the first matching rule wins.
const RULES: &[CategoryRule] = &[
    CategoryRule {
        category: Category::Egg,
        keywords: &[Sub("egg"), Sub("eieren"), Sub("eitje"), Sub("omelet"), Word("ei")],
        excludes: &["eggplant", "eiwit"],
    },
    CategoryRule {
        category: Category::Fat,
        keywords: &[
            Sub("olie"), Word("oil"), Sub("boter"), Sub("butter"), Sub("ghee"),
            Sub("reuzel"), Sub("lard"), Sub("mayo"), Sub("pindakaas"),
            Sub("notenpasta"), Sub("tahin"), Sub("kokosvet"),
        ],
        excludes: &["boterham", "butternut", "buttermilk"],
    },
    CategoryRule {
        category: Category::Cheese,
        keywords: &[
            Sub("kaas"), Sub("cheese"), Sub("mozzarella"), Sub("parmezaan"),
            Sub("parmesan"), Word("feta"), Sub("cheddar"), Sub("gouda"), Word("brie"),
            Sub("halloumi"), Sub("ricotta"),
        ],
        excludes: &[],
    },
    CategoryRule {
        category: Category::Dairy,
        keywords: &[
            Sub("melk"), Sub("milk"), Sub("yoghurt"), Sub("yogurt"), Sub("kwark"),
            Sub("quark"), Sub("skyr"), Word("vla"), Word("room"), Sub("cream"),
            Sub("kefir"),
        ],
        excludes: &["kokosmelk", "coconut milk"],
    },
    CategoryRule {
        category: Category::Meat,
        keywords: &[
            Sub("kip"), Sub("chicken"), Sub("kalkoen"), Sub("turkey"), Sub("rund"),
            Sub("beef"), Sub("gehakt"), Sub("mince"), Sub("varken"), Sub("pork"),
            Sub("biefstuk"), Sub("steak"), Word("ham"), Sub("spek"), Sub("bacon"),
            Sub("worst"), Sub("sausage"), Sub("zalm"), Sub("salmon"), Sub("tonijn"),
            Sub("tuna"), Word("vis"), Sub("fish"), Sub("garnal"), Sub("shrimp"),
            Sub("kabeljauw"), Word("cod"), Word("lam"), Sub("lamb"), Sub("filet"),
            Sub("vlees"), Sub("meat"),
        ],
        excludes: &[],
    },
    CategoryRule {
        category: Category::Carb,
        keywords: &[
            Sub("rijst"), Word("rice"), Sub("pasta"), Sub("spaghetti"), Sub("macaroni"),
            Sub("brood"), Sub("bread"), Sub("boterham"), Sub("havermout"), Word("oats"),
            Sub("oatmeal"), Sub("aardappel"), Sub("potato"), Sub("quinoa"),
            Sub("couscous"), Word("wrap"), Sub("tortilla"), Sub("noedel"), Sub("noodle"),
            Sub("bulgur"), Sub("muesli"), Sub("granola"), Sub("cracker"),
            Sub("beschuit"), Sub("bagel"), Word("pita"),
        ],
        excludes: &[],
    },
];

/// Classify an ingredient by keywords in its name
pub fn classify(name: &str) -> Category {
    let lower = name.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    RULES
        .iter()
        .find(|rule| {
            !rule.excludes.iter().any(|ex| lower.contains(ex))
                && rule.keywords.iter().any(|kw| match kw {
                    Sub(k) => lower.contains(k),
                    Word(k) => words.iter().any(|w| w == k),
                })
        })
        .map(|rule| rule.category)
        .unwrap_or(Category::Other)
}

/// Category of a line: an explicit tag wins over name matching
pub fn resolve_category(name: &str, tagged: Option<Category>) -> Category {
    tagged.unwrap_or_else(|| classify(name))
}

// ============================================================================
// Bounds and Rounding
// ============================================================================

/// Category-specific limits for one ingredient line
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CategoryBounds {
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Rounding granularity overriding the unit's own step
    pub step: Option<f64>,
}

/// Limits for a category in a given unit
///
/// Gram caps only apply to lines measured in grams or milliliters, the piece
/// cap only to discrete lines.
pub fn category_bounds(category: Category, unit: UnitKind) -> CategoryBounds {
    let by_weight = unit.is_mass_or_liquid();
    match category {
        Category::Egg if unit.is_discrete() => CategoryBounds {
            min: None,
            max: Some(3.0),
            step: Some(1.0),
        },
        Category::Fat if by_weight => CategoryBounds {
            min: None,
            max: Some(50.0),
            step: Some(5.0),
        },
        Category::Cheese if by_weight => CategoryBounds {
            min: None,
            max: Some(120.0),
            step: Some(10.0),
        },
        Category::Dairy if by_weight => CategoryBounds {
            min: None,
            max: Some(400.0),
            step: Some(100.0),
        },
        Category::Meat if by_weight => CategoryBounds {
            min: Some(75.0),
            max: Some(600.0),
            step: Some(25.0),
        },
        Category::Carb if by_weight => CategoryBounds {
            min: Some(50.0),
            max: None,
            step: None,
        },
        _ => CategoryBounds::default(),
    }
}

/// Rounding step for a line given its unit and baseline
pub fn unit_step(unit: UnitKind, baseline: f64) -> f64 {
    if unit.is_discrete() && baseline < 1.0 {
        0.5
    } else {
        unit.rounding_step()
    }
}

/// Apply every guardrail to a proposed amount
///
/// Rounds to the category (or unit) granularity, then keeps the result within
/// [0.4×, 1.6×] of the baseline. Category caps are absolute and win over the
/// relative band; floors never lift an amount above its baseline. An amount
/// equal to its baseline is returned untouched.
pub fn guard(baseline: f64, proposed: f64, unit: UnitKind, category: Category) -> f64 {
    let baseline = if baseline.is_finite() { baseline.max(0.0) } else { 0.0 };
    if !proposed.is_finite() {
        return baseline;
    }
    let proposed = proposed.max(0.0);
    if (proposed - baseline).abs() < AMOUNT_EPSILON {
        return baseline;
    }

    let bounds = category_bounds(category, unit);
    let unit_step = unit_step(unit, baseline);
    let step = bounds.step.unwrap_or(unit_step);

    let mut amount = round_to_step(proposed, step);
    if unit.is_discrete() && baseline >= 1.0 {
        amount = amount.max(1.0);
    }

    let mut hi = baseline * MAX_RELATIVE_CHANGE;
    if let Some(max) = bounds.max {
        hi = hi.min(max);
    }
    let lo = (baseline * MIN_RELATIVE_CHANGE).min(hi);
    let amount = snap_within(amount, lo, hi, step, unit_step);

    match bounds.min {
        Some(min) => amount.max(min.min(baseline)).min(hi),
        None => amount,
    }
}

/// Clamp into [lo, hi], staying on a step multiple when the band allows it
fn snap_within(value: f64, lo: f64, hi: f64, step: f64, fallback_step: f64) -> f64 {
    for s in [step, fallback_step] {
        let lo_s = (lo / s - AMOUNT_EPSILON).ceil() * s;
        let hi_s = (hi / s + AMOUNT_EPSILON).floor() * s;
        if lo_s <= hi_s + AMOUNT_EPSILON {
            let snapped = round_to_step(value.clamp(lo_s, hi_s), s);
            return snapped.clamp(lo, hi);
        }
    }
    value.clamp(lo, hi)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_keywords() {
        assert_eq!(classify("Eieren"), Category::Egg);
        assert_eq!(classify("Gekookt ei"), Category::Egg);
        assert_eq!(classify("Olijfolie"), Category::Fat);
        assert_eq!(classify("Pindakaas"), Category::Fat);
        assert_eq!(classify("Geraspte kaas"), Category::Cheese);
        assert_eq!(classify("Griekse yoghurt"), Category::Dairy);
        assert_eq!(classify("Halfvolle melk"), Category::Dairy);
        assert_eq!(classify("Kipfilet"), Category::Meat);
        assert_eq!(classify("Zalm"), Category::Meat);
        assert_eq!(classify("Zilvervliesrijst"), Category::Carb);
        assert_eq!(classify("Havermout"), Category::Carb);
        assert_eq!(classify("Broccoli"), Category::Other);
    }

    #[test]
    fn test_classify_exclusions_and_whole_words() {
        assert_eq!(classify("Volkoren boterham"), Category::Carb);
        assert_eq!(classify("Eiwitpoeder"), Category::Other);
        assert_eq!(classify("Champignons"), Category::Other);
        assert_eq!(classify("Mushrooms"), Category::Other);
        assert_eq!(classify("Kokosmelk"), Category::Other);
    }

    #[test]
    fn test_tagged_category_wins() {
        assert_eq!(resolve_category("Broccoli", Some(Category::Carb)), Category::Carb);
        assert_eq!(resolve_category("Kipfilet", None), Category::Meat);
    }

    #[test]
    fn test_category_serde_is_lenient() {
        let c: Category = serde_json::from_str("\"vlees\"").unwrap();
        assert_eq!(c, Category::Meat);
        assert_eq!(serde_json::to_string(&Category::Fat).unwrap(), "\"fat\"");
    }

    #[test]
    fn test_guard_passes_baseline_through() {
        assert_eq!(guard(12.0, 12.0, UnitKind::Gram, Category::Fat), 12.0);
        assert_eq!(guard(30.0, 30.0, UnitKind::Gram, Category::Carb), 30.0);
    }

    #[test]
    fn test_guard_egg_cap_and_whole_pieces() {
        assert_eq!(guard(3.0, 4.6, UnitKind::Piece, Category::Egg), 3.0);
        assert_eq!(guard(2.0, 3.0, UnitKind::Piece, Category::Egg), 3.0);
        assert_eq!(guard(2.0, 2.4, UnitKind::Piece, Category::Egg), 2.0);
    }

    #[test]
    fn test_guard_category_rounding() {
        assert_eq!(guard(20.0, 23.0, UnitKind::Gram, Category::Fat), 25.0);
        assert_eq!(guard(60.0, 72.0, UnitKind::Gram, Category::Cheese), 70.0);
        assert_eq!(guard(200.0, 240.0, UnitKind::Gram, Category::Meat), 250.0);
        assert_eq!(guard(250.0, 340.0, UnitKind::Milliliter, Category::Dairy), 300.0);
    }

    #[test]
    fn test_guard_caps_are_absolute() {
        // A baseline above the cap is pulled down once the amount moves
        assert_eq!(guard(60.0, 80.0, UnitKind::Gram, Category::Fat), 50.0);
        assert_eq!(guard(60.0, 55.0, UnitKind::Gram, Category::Fat), 50.0);
        assert_eq!(guard(40.0, 70.0, UnitKind::Gram, Category::Fat), 50.0);
        assert_eq!(guard(4.0, 6.0, UnitKind::Piece, Category::Egg), 3.0);
        assert_eq!(guard(4.0, 3.6, UnitKind::Piece, Category::Egg), 3.0);
        assert_eq!(guard(500.0, 750.0, UnitKind::Milliliter, Category::Dairy), 400.0);
        // The egg cap wins over the 0.4x floor
        assert_eq!(guard(10.0, 12.0, UnitKind::Piece, Category::Egg), 3.0);
        // Unchanged amounts keep their baseline
        assert_eq!(guard(4.0, 4.0, UnitKind::Piece, Category::Egg), 4.0);
        // Meat floor is 75 g unless the baseline was already lower
        assert_eq!(guard(150.0, 65.0, UnitKind::Gram, Category::Meat), 75.0);
        assert_eq!(guard(60.0, 40.0, UnitKind::Gram, Category::Meat), 60.0);
        // Carb floor
        assert_eq!(guard(100.0, 45.0, UnitKind::Gram, Category::Carb), 50.0);
    }

    #[test]
    fn test_guard_relative_band() {
        assert_eq!(guard(100.0, 200.0, UnitKind::Gram, Category::Other), 160.0);
        assert_eq!(guard(100.0, 10.0, UnitKind::Gram, Category::Other), 40.0);
        assert_eq!(guard(33.0, 1.0, UnitKind::Gram, Category::Other), 14.0);
        assert_eq!(guard(1.0, 2.0, UnitKind::Piece, Category::Other), 1.0);
        assert_eq!(guard(2.0, 0.0, UnitKind::Slice, Category::Other), 1.0);
    }

    #[test]
    fn test_guard_narrow_band_falls_back() {
        // 5 g of cheese cannot land on a 10 g step inside [2, 8]
        let amount = guard(5.0, 7.0, UnitKind::Gram, Category::Cheese);
        assert_eq!(amount, 8.0);
    }

    #[test]
    fn test_guard_non_negative_and_finite() {
        assert_eq!(guard(50.0, -20.0, UnitKind::Gram, Category::Other), 20.0);
        assert_eq!(guard(50.0, f64::NAN, UnitKind::Gram, Category::Other), 50.0);
        assert_eq!(guard(0.0, 30.0, UnitKind::Gram, Category::Other), 0.0);
    }
}
