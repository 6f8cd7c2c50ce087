//! Ingredient scaler
//!
//! Turns a baseline amount into a scaled amount and computes the macro
//! contribution of a line.

use crate::models::{Ingredient, Nutrition};

use super::category::{guard, resolve_category};
use super::units::{grams_per_unit, round_for_unit, round_to_step, UnitKind};

/// Scale a baseline amount by `factor`, respecting unit semantics
///
/// Discrete lines with at least one unit never drop to zero: upscaling
/// rounds up, downscaling rounds down but keeps one.
pub fn scale_amount(baseline: f64, unit: UnitKind, factor: f64) -> f64 {
    let baseline = if baseline.is_finite() { baseline.max(0.0) } else { 0.0 };
    let factor = if factor.is_finite() && factor > 0.0 { factor } else { 1.0 };
    let raw = baseline * factor;

    if unit.is_discrete() {
        if baseline >= 1.0 {
            // Trim float noise so 2 × 1.0000000001 is not ceiled to 3
            let raw = (raw * 1e9).round() / 1e9;
            return if factor >= 1.0 {
                raw.ceil()
            } else {
                raw.floor().max(1.0)
            };
        }
        return round_to_step(raw, 0.5);
    }

    round_for_unit(raw, unit)
}

/// Macro contribution of `ingredient` at `amount` units
pub fn ingredient_nutrition(ingredient: &Ingredient, amount: f64) -> Nutrition {
    let grams = grams_per_unit(ingredient.unit, ingredient.unit_weight_grams);
    ingredient.per_100g().scale(grams / 100.0 * amount)
}

/// kcal in one unit of the ingredient
pub fn calories_per_unit(ingredient: &Ingredient) -> f64 {
    ingredient.calories_per_100g * grams_per_unit(ingredient.unit, ingredient.unit_weight_grams) / 100.0
}

/// Scaled and guarded amount for a line
///
/// `baseline` is the amount the line starts from: the authored amount, or a
/// user's custom amount when one is set.
pub fn scale_ingredient(ingredient: &Ingredient, baseline: f64, factor: f64) -> f64 {
    let category = resolve_category(&ingredient.name, ingredient.category);
    let proposed = scale_amount(baseline, ingredient.unit, factor);
    guard(baseline, proposed, ingredient.unit, category)
}
