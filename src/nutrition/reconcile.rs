//! Macro reconciler
//!
//! Brings a proportionally scaled day closer to its targets:
//!
//! 1. Surplus above the threshold is taken off the adjustable lines in
//!    proportion to their calorie share.
//! 2. A remaining deficit is added back the same way.
//! 3. Optionally, protein/carbs/fat are nudged through their typical source
//!    lines for a bounded number of iterations.
//!
//! Every changed amount goes through the category guard. A pass that does not
//! improve the result is dropped, so reconciliation never makes a day worse.

use crate::models::Nutrition;

use super::category::{guard, Category};
use super::converter::from_grams;
use super::planner::{ScaledDay, ScaledIngredient};
use super::scaler::{calories_per_unit, ingredient_nutrition};
use super::targets::{KCAL_PER_G_CARBS, KCAL_PER_G_FAT, KCAL_PER_G_PROTEIN};
use super::tolerance::{deviation_pct, CALORIE_TOLERANCE_KCAL};
use super::units::grams_per_unit;

/// Minimum share of a line's energy from one macro to count as its source
const SOURCE_ENERGY_SHARE: f64 = 0.4;
const EPSILON: f64 = 1e-9;

/// Reconciler tunables
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconcileOptions {
    /// Days within this many kcal of target are left alone
    pub calorie_tolerance_kcal: f64,
    /// Smallest surplus or deficit worth a redistribution pass
    pub min_adjustment_kcal: f64,
    /// Run the per-macro balancing pass
    pub balance_macros: bool,
    pub max_iterations: usize,
    /// Per-iteration change limit for continuous lines, in grams
    pub max_step_grams: f64,
    /// Per-iteration change limit for discrete lines, in pieces
    pub max_step_pieces: f64,
    /// A metric is on target within this percentage...
    pub macro_tolerance_pct: f64,
    /// ...or within this many grams/kcal, whichever is larger
    pub macro_tolerance_abs: f64,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            calorie_tolerance_kcal: CALORIE_TOLERANCE_KCAL,
            min_adjustment_kcal: 5.0,
            balance_macros: true,
            max_iterations: 8,
            max_step_grams: 50.0,
            max_step_pieces: 2.0,
            macro_tolerance_pct: 5.0,
            macro_tolerance_abs: 5.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Macro {
    Protein,
    Carbs,
    Fat,
}

impl Macro {
    const ALL: [Macro; 3] = [Macro::Protein, Macro::Carbs, Macro::Fat];

    fn of(&self, n: &Nutrition) -> f64 {
        match self {
            Macro::Protein => n.protein,
            Macro::Carbs => n.carbs,
            Macro::Fat => n.fat,
        }
    }

    fn kcal_per_gram(&self) -> f64 {
        match self {
            Macro::Protein => KCAL_PER_G_PROTEIN,
            Macro::Carbs => KCAL_PER_G_CARBS,
            Macro::Fat => KCAL_PER_G_FAT,
        }
    }

    fn sources(&self) -> &'static [Category] {
        match self {
            Macro::Protein => &[Category::Meat, Category::Dairy, Category::Egg],
            Macro::Carbs => &[Category::Carb],
            Macro::Fat => &[Category::Fat, Category::Cheese, Category::Egg],
        }
    }

    /// Whether a line's own energy is mostly this macro
    fn dominates(&self, line: &ScaledIngredient) -> bool {
        let per_100g = line.source.per_100g();
        per_100g.calories > 0.0
            && self.of(&per_100g) * self.kcal_per_gram() / per_100g.calories >= SOURCE_ENERGY_SHARE
    }
}

/// Working state: the day's lines and their current amounts
struct Lines<'a> {
    lines: Vec<&'a ScaledIngredient>,
    amounts: Vec<f64>,
}

impl<'a> Lines<'a> {
    fn new(day: &'a ScaledDay) -> Self {
        let lines: Vec<_> = day.lines().collect();
        let amounts = lines.iter().map(|l| l.amount).collect();
        Self { lines, amounts }
    }

    fn totals(&self) -> Nutrition {
        self.totals_of(&self.amounts)
    }

    fn totals_of(&self, amounts: &[f64]) -> Nutrition {
        self.lines
            .iter()
            .zip(amounts)
            .map(|(line, amount)| ingredient_nutrition(&line.source, *amount))
            .sum()
    }

    fn line_nutrition(&self, i: usize) -> Nutrition {
        ingredient_nutrition(&self.lines[i].source, self.amounts[i])
    }

    fn guarded(&self, i: usize, proposed: f64) -> f64 {
        let line = self.lines[i];
        guard(line.baseline_amount, proposed, line.unit, line.category)
    }

    /// Spread the calorie gap over adjustable lines by calorie share
    ///
    /// Only continuous, calorie-bearing lines move. The pass is kept only
    /// when it brings calories strictly closer to `target_kcal`.
    fn redistribute_calories(&mut self, target_kcal: f64) -> bool {
        let before = self.totals().calories;
        let gap = before - target_kcal;

        let adjustable: Vec<(usize, f64, f64)> = (0..self.lines.len())
            .filter(|&i| !self.lines[i].unit.is_discrete())
            .filter_map(|i| {
                let per_unit = calories_per_unit(&self.lines[i].source);
                let kcal = self.line_nutrition(i).calories;
                (per_unit > 0.0 && kcal > 0.0).then_some((i, kcal, per_unit))
            })
            .collect();
        let adjustable_kcal: f64 = adjustable.iter().map(|(_, kcal, _)| kcal).sum();
        if adjustable_kcal <= 0.0 {
            return false;
        }

        let mut candidate = self.amounts.clone();
        for (i, kcal, per_unit) in adjustable {
            let delta_units = gap * (kcal / adjustable_kcal) / per_unit;
            let proposed = (self.amounts[i] - delta_units).max(0.0);
            candidate[i] = self.guarded(i, proposed);
        }

        let after = self.totals_of(&candidate).calories;
        if (after - target_kcal).abs() + EPSILON < gap.abs() {
            tracing::debug!(before, after, target_kcal, "calorie redistribution applied");
            self.amounts = candidate;
            true
        } else {
            false
        }
    }

    /// Move one macro toward its target through its source lines
    fn balance_macro(&mut self, nutrient: Macro, target: f64, options: &ReconcileOptions) -> bool {
        let needed = target - nutrient.of(&self.totals());

        let by_category: Vec<usize> = (0..self.lines.len())
            .filter(|&i| nutrient.sources().contains(&self.lines[i].category))
            .collect();
        let candidates = if by_category.is_empty() {
            (0..self.lines.len())
                .filter(|&i| nutrient.dominates(self.lines[i]))
                .collect()
        } else {
            by_category
        };

        let sources: Vec<(usize, f64)> = candidates
            .into_iter()
            .map(|i| (i, nutrient.of(&self.line_nutrition(i))))
            .filter(|(_, grams)| *grams > 0.0)
            .collect();
        let source_total: f64 = sources.iter().map(|(_, grams)| grams).sum();
        if source_total <= 0.0 {
            return false;
        }

        let mut changed = false;
        for (i, grams) in sources {
            let line = self.lines[i];
            let per_unit = nutrient.of(&line.source.per_100g())
                * grams_per_unit(line.unit, line.source.unit_weight_grams)
                / 100.0;
            if per_unit <= 0.0 {
                continue;
            }

            let cap = if line.unit.is_discrete() {
                options.max_step_pieces
            } else {
                from_grams(options.max_step_grams, line.unit, line.source.unit_weight_grams)
            };
            let delta_units = (needed * (grams / source_total) / per_unit).clamp(-cap, cap);
            let proposed = (self.amounts[i] + delta_units).max(0.0);
            let next = self.guarded(i, proposed);
            if (next - self.amounts[i]).abs() > EPSILON {
                self.amounts[i] = next;
                changed = true;
            }
        }
        changed
    }
}

fn within(actual: f64, target: f64, options: &ReconcileOptions) -> bool {
    let allowed = (target.abs() * options.macro_tolerance_pct / 100.0).max(options.macro_tolerance_abs);
    (actual - target).abs() <= allowed
}

fn all_within(totals: &Nutrition, targets: &Nutrition, options: &ReconcileOptions) -> bool {
    within(totals.calories, targets.calories, options)
        && Macro::ALL
            .iter()
            .all(|m| within(m.of(totals), m.of(targets), options))
}

/// Calorie tolerance first, then summed deviation over the four metrics
///
/// Outside the calorie band only the calorie gap counts.
fn is_better(candidate: &Nutrition, best: &Nutrition, targets: &Nutrition, options: &ReconcileOptions) -> bool {
    let gap = |n: &Nutrition| (n.calories - targets.calories).abs();
    let in_band = |n: &Nutrition| gap(n) <= options.calorie_tolerance_kcal;
    let score = |n: &Nutrition| {
        deviation_pct(n.calories, targets.calories)
            + Macro::ALL
                .iter()
                .map(|m| deviation_pct(m.of(n), m.of(targets)))
                .sum::<f64>()
    };
    match (in_band(candidate), in_band(best)) {
        (true, false) => true,
        (false, true) => false,
        (false, false) => gap(candidate) + EPSILON < gap(best),
        (true, true) => score(candidate) + EPSILON < score(best),
    }
}

/// Reconcile a scaled day against `targets`
///
/// A day already within tolerance comes back unchanged. Otherwise the result
/// is the best state reached within the iteration cap, which may still be
/// outside tolerance.
pub fn reconcile(day: &ScaledDay, targets: &Nutrition, options: &ReconcileOptions) -> ScaledDay {
    let start = day.totals;
    let calories_ok = (start.calories - targets.calories).abs() <= options.calorie_tolerance_kcal;
    if calories_ok && (!options.balance_macros || all_within(&start, targets, options)) {
        return day.clone();
    }

    let mut lines = Lines::new(day);
    let original = lines.amounts.clone();

    let surplus = lines.totals().calories - targets.calories;
    if surplus > options.min_adjustment_kcal {
        lines.redistribute_calories(targets.calories);
    }
    let deficit = targets.calories - lines.totals().calories;
    if deficit > options.min_adjustment_kcal {
        lines.redistribute_calories(targets.calories);
    }

    if options.balance_macros {
        let mut best = lines.amounts.clone();
        let mut best_totals = lines.totals();

        for iteration in 0..options.max_iterations {
            if all_within(&lines.totals(), targets, options) {
                break;
            }

            let mut changed = false;
            for nutrient in Macro::ALL {
                let actual = nutrient.of(&lines.totals());
                if !within(actual, nutrient.of(targets), options) {
                    changed |= lines.balance_macro(nutrient, nutrient.of(targets), options);
                }
            }
            let gap = (lines.totals().calories - targets.calories).abs();
            if gap > options.min_adjustment_kcal {
                changed |= lines.redistribute_calories(targets.calories);
            }

            let totals = lines.totals();
            if is_better(&totals, &best_totals, targets, options) {
                best = lines.amounts.clone();
                best_totals = totals;
            }
            if !changed {
                tracing::debug!(iteration, "macro balancing stalled");
                break;
            }
        }
        lines.amounts = best;
    }

    if lines.amounts == original {
        return day.clone();
    }

    let mut result = day.with_amounts(&lines.amounts, targets);
    result.adjusted = true;
    tracing::debug!(
        day = day.day.as_str(),
        before = start.calories,
        after = result.totals.calories,
        target = targets.calories,
        "day reconciled"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition::category::category_bounds;
    use crate::models::{
        CustomAmounts, DayPlan, Ingredient, IngredientLookup, Meal, MealSlot, NutritionPlan,
        NutritionPlanCreate, UserProfile, Weekday,
    };
    use crate::nutrition::planner::{scale_day, ScalingOptions};
    use crate::nutrition::units::UnitKind;
    use std::collections::BTreeMap;

    /// Reference-weight day of 1549.2 kcal, unreconciled
    fn sample_day() -> ScaledDay {
        let mut meals = BTreeMap::new();
        meals.insert(
            MealSlot::Breakfast,
            Meal {
                ingredients: vec![Ingredient::new(
                    "Havermout",
                    UnitKind::Gram,
                    100.0,
                    Nutrition::new(370.0, 13.0, 60.0, 7.0),
                )],
                nutrition: None,
            },
        );
        meals.insert(
            MealSlot::Lunch,
            Meal {
                ingredients: vec![
                    Ingredient::new("Kipfilet", UnitKind::Gram, 200.0, Nutrition::new(110.0, 23.0, 0.0, 1.5)),
                    Ingredient::new("Rijst", UnitKind::Gram, 150.0, Nutrition::new(350.0, 8.0, 77.0, 1.0)),
                    Ingredient::new("Olijfolie", UnitKind::Gram, 20.0, Nutrition::new(884.0, 0.0, 0.0, 100.0)),
                ],
                nutrition: None,
            },
        );
        meals.insert(
            MealSlot::Dinner,
            Meal {
                ingredients: vec![Ingredient::new(
                    "Eieren",
                    UnitKind::Piece,
                    3.0,
                    Nutrition::new(143.0, 12.6, 0.7, 9.5),
                )
                .with_unit_weight(60.0)],
                nutrition: None,
            },
        );

        let plan = NutritionPlan::from_create(
            1,
            NutritionPlanCreate {
                name: "Test".to_string(),
                ..Default::default()
            },
        );
        scale_day(
            &DayPlan { meals },
            Weekday::Maandag,
            &UserProfile::default(),
            &plan,
            &CustomAmounts::new(),
            &IngredientLookup::new(),
            &ScalingOptions {
                reconcile: false,
                ..Default::default()
            },
        )
    }

    fn calories_only() -> ReconcileOptions {
        ReconcileOptions {
            balance_macros: false,
            ..Default::default()
        }
    }

    fn assert_guarded(day: &ScaledDay) {
        for line in day.lines() {
            assert!(line.amount >= 0.0);
            assert!(line.amount >= line.baseline_amount * 0.4 - 1e-9, "{} {}", line.name, line.amount);
            assert!(line.amount <= line.baseline_amount * 1.6 + 1e-9, "{} {}", line.name, line.amount);
            if line.amount != line.baseline_amount {
                if let Some(max) = category_bounds(line.category, line.unit).max {
                    assert!(line.amount <= max, "{} {} over cap", line.name, line.amount);
                }
            }
            if line.category == Category::Egg && line.unit.is_discrete() {
                assert_eq!(line.amount.fract(), 0.0);
            }
        }
    }

    /// Day whose oil line starts above the 50 g fat cap
    fn oily_day() -> ScaledDay {
        let mut meals = BTreeMap::new();
        meals.insert(
            MealSlot::Dinner,
            Meal {
                ingredients: vec![
                    Ingredient::new("Rijst", UnitKind::Gram, 150.0, Nutrition::new(350.0, 8.0, 77.0, 1.0)),
                    Ingredient::new("Olijfolie", UnitKind::Gram, 70.0, Nutrition::new(884.0, 0.0, 0.0, 100.0)),
                ],
                nutrition: None,
            },
        );
        let plan = NutritionPlan::from_create(
            1,
            NutritionPlanCreate {
                name: "Test".to_string(),
                ..Default::default()
            },
        );
        scale_day(
            &DayPlan { meals },
            Weekday::Dinsdag,
            &UserProfile::default(),
            &plan,
            &CustomAmounts::new(),
            &IngredientLookup::new(),
            &ScalingOptions {
                reconcile: false,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_sample_day_totals() {
        let day = sample_day();
        assert!((day.totals.calories - 1549.2).abs() < 1e-6);
    }

    #[test]
    fn test_within_tolerance_is_unchanged() {
        let day = sample_day();
        let targets = Nutrition::new(1600.0, 90.0, 200.0, 50.0);
        assert_eq!(reconcile(&day, &targets, &calories_only()), day);

        // With balancing on, every metric must be on target to skip
        let exact = day.totals;
        let once = reconcile(&day, &exact, &ReconcileOptions::default());
        assert_eq!(once, day);
        assert!(!once.adjusted);
    }

    #[test]
    fn test_surplus_moves_closer() {
        let day = sample_day();
        let targets = Nutrition::new(1300.0, 90.0, 150.0, 50.0);
        let result = reconcile(&day, &targets, &calories_only());
        assert!(result.adjusted);
        let before = (day.totals.calories - targets.calories).abs();
        let after = (result.totals.calories - targets.calories).abs();
        assert!(after < before);
        assert!(after <= CALORIE_TOLERANCE_KCAL);
        assert_guarded(&result);

        // Discrete lines are not adjustable
        let eggs = result.lines().find(|l| l.name == "Eieren").unwrap();
        assert_eq!(eggs.amount, 3.0);
    }

    #[test]
    fn test_deficit_moves_closer() {
        let day = sample_day();
        let targets = Nutrition::new(2200.0, 120.0, 250.0, 70.0);
        let result = reconcile(&day, &targets, &calories_only());
        let before = (day.totals.calories - targets.calories).abs();
        let after = (result.totals.calories - targets.calories).abs();
        assert!(after < before);
        assert_guarded(&result);
    }

    #[test]
    fn test_relative_guard_under_extreme_targets() {
        let day = sample_day();
        for kcal in [300.0, 600.0, 4000.0, 9000.0] {
            let targets = Nutrition::new(kcal, kcal * 0.3 / 4.0, kcal * 0.4 / 4.0, kcal * 0.3 / 9.0);
            let result = reconcile(&day, &targets, &ReconcileOptions::default());
            assert_guarded(&result);
            let before = (day.totals.calories - kcal).abs();
            assert!((result.totals.calories - kcal).abs() <= before + 1e-9);
        }
    }

    #[test]
    fn test_macro_balancing_raises_protein() {
        let day = sample_day();
        let mut targets = day.totals;
        targets.protein = 120.0;
        let result = reconcile(&day, &targets, &ReconcileOptions::default());
        assert!(result.totals.protein > day.totals.protein);
        assert!((result.totals.calories - targets.calories).abs() <= CALORIE_TOLERANCE_KCAL);
        assert_guarded(&result);
    }

    #[test]
    fn test_reconcile_is_stable_once_on_target() {
        let day = sample_day();
        let targets = Nutrition::new(1300.0, 90.0, 150.0, 50.0);
        let first = reconcile(&day, &targets, &calories_only());
        let second = reconcile(&first, &targets, &calories_only());
        assert_eq!(first, second);
    }

    #[test]
    fn test_adjusted_lines_respect_caps_above_baseline() {
        let day = oily_day();
        assert_eq!(day.lines().nth(1).unwrap().amount, 70.0);
        for kcal in [600.0, 900.0, 1600.0] {
            let targets = Nutrition::new(kcal, 20.0, 150.0, 40.0);
            let result = reconcile(&day, &targets, &ReconcileOptions::default());
            assert_guarded(&result);
            let oil = result.lines().find(|l| l.name == "Olijfolie").unwrap();
            assert!(oil.amount == 70.0 || oil.amount <= 50.0, "oil at {}", oil.amount);
        }
    }

    #[test]
    fn test_empty_day_is_unchanged() {
        let day = ScaledDay::new(Weekday::Zondag, 1.0, Nutrition::zero(), Vec::new());
        let targets = Nutrition::new(2000.0, 150.0, 200.0, 60.0);
        assert_eq!(reconcile(&day, &targets, &ReconcileOptions::default()), day);
    }
}
