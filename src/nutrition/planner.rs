//! Day and week scaling pipeline
//!
//! profile + baseline plan → targets → scaled lines → totals → optional
//! reconciliation. Inputs are borrowed and never modified; every call builds
//! a fresh result.

use serde::Serialize;

use crate::models::{
    CustomAmounts, DayPlan, Ingredient, IngredientLookup, MealSlot, Nutrition, NutritionPlan,
    UserProfile, Weekday, WeeklyPlan,
};

use super::category::{resolve_category, Category};
use super::reconcile::{reconcile, ReconcileOptions};
use super::scaler::{ingredient_nutrition, scale_ingredient};
use super::targets::{compute_scaling_factor, compute_targets};
use super::tolerance::DayStatus;
use super::units::UnitKind;

/// Pipeline switches
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalingOptions {
    /// Run the reconciler after proportional scaling
    pub reconcile: bool,
    pub reconcile_options: ReconcileOptions,
}

impl Default for ScalingOptions {
    fn default() -> Self {
        Self {
            reconcile: true,
            reconcile_options: ReconcileOptions::default(),
        }
    }
}

/// One ingredient line after scaling
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaledIngredient {
    pub name: String,
    pub unit: UnitKind,
    pub category: Category,
    /// Amount the line was scaled from (authored or custom)
    pub baseline_amount: f64,
    pub amount: f64,
    pub nutrition: Nutrition,
    pub custom: bool,
    /// The line with lookup densities applied
    #[serde(skip)]
    pub source: Ingredient,
}

impl ScaledIngredient {
    pub fn new(source: Ingredient, baseline_amount: f64, amount: f64, custom: bool) -> Self {
        let category = resolve_category(&source.name, source.category);
        Self {
            name: source.name.clone(),
            unit: source.unit,
            category,
            baseline_amount,
            amount,
            nutrition: ingredient_nutrition(&source, amount),
            custom,
            source,
        }
    }

    /// Same line at a different amount
    pub fn with_amount(&self, amount: f64) -> Self {
        Self {
            amount,
            nutrition: ingredient_nutrition(&self.source, amount),
            ..self.clone()
        }
    }
}

/// One meal after scaling
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaledMeal {
    pub slot: MealSlot,
    pub ingredients: Vec<ScaledIngredient>,
    pub nutrition: Nutrition,
    /// Author's total at 100 kg, or the authored lines' sum without one
    pub baseline_nutrition: Nutrition,
}

impl ScaledMeal {
    pub fn new(slot: MealSlot, ingredients: Vec<ScaledIngredient>, baseline_nutrition: Nutrition) -> Self {
        let nutrition = ingredients.iter().map(|i| i.nutrition).sum();
        Self {
            slot,
            ingredients,
            nutrition,
            baseline_nutrition,
        }
    }
}

/// One day after scaling
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaledDay {
    pub day: Weekday,
    pub scaling_factor: f64,
    pub targets: Nutrition,
    pub meals: Vec<ScaledMeal>,
    pub totals: Nutrition,
    pub baseline_totals: Nutrition,
    pub status: DayStatus,
    /// Whether the reconciler changed any amount
    pub adjusted: bool,
}

impl ScaledDay {
    pub fn new(day: Weekday, scaling_factor: f64, targets: Nutrition, meals: Vec<ScaledMeal>) -> Self {
        let totals: Nutrition = meals.iter().map(|m| m.nutrition).sum();
        let baseline_totals = meals.iter().map(|m| m.baseline_nutrition).sum();
        Self {
            day,
            scaling_factor,
            targets,
            status: DayStatus::new(&totals, &targets),
            meals,
            totals,
            baseline_totals,
            adjusted: false,
        }
    }

    /// All lines in meal order
    pub fn lines(&self) -> impl Iterator<Item = &ScaledIngredient> {
        self.meals.iter().flat_map(|m| m.ingredients.iter())
    }

    /// Rebuild with new amounts (in `lines()` order) against `targets`
    pub fn with_amounts(&self, amounts: &[f64], targets: &Nutrition) -> Self {
        let mut amounts = amounts.iter().copied();
        let meals = self
            .meals
            .iter()
            .map(|meal| {
                let lines = meal
                    .ingredients
                    .iter()
                    .map(|line| match amounts.next() {
                        Some(amount) => line.with_amount(amount),
                        None => line.clone(),
                    })
                    .collect();
                ScaledMeal::new(meal.slot, lines, meal.baseline_nutrition)
            })
            .collect();
        Self::new(self.day, self.scaling_factor, *targets, meals)
    }
}

/// A scaled week
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaledWeek {
    pub scaling_factor: f64,
    pub targets: Nutrition,
    pub days: Vec<ScaledDay>,
    /// Mean of the scaled day totals
    pub average_daily: Nutrition,
}

/// Scale one day of a plan for a user
pub fn scale_day(
    day_plan: &DayPlan,
    weekday: Weekday,
    profile: &UserProfile,
    plan: &NutritionPlan,
    overrides: &CustomAmounts,
    lookup: &IngredientLookup,
    options: &ScalingOptions,
) -> ScaledDay {
    let factor = compute_scaling_factor(profile);
    let targets = compute_targets(profile, plan);
    scale_day_with(day_plan, weekday, factor, targets, overrides, lookup, options)
}

/// Scale every day of a weekly plan
pub fn scale_week(
    weekly_plan: &WeeklyPlan,
    profile: &UserProfile,
    plan: &NutritionPlan,
    overrides: &CustomAmounts,
    lookup: &IngredientLookup,
    options: &ScalingOptions,
) -> ScaledWeek {
    let factor = compute_scaling_factor(profile);
    let targets = compute_targets(profile, plan);

    let days: Vec<ScaledDay> = weekly_plan
        .days
        .iter()
        .map(|(weekday, day_plan)| {
            scale_day_with(day_plan, *weekday, factor, targets, overrides, lookup, options)
        })
        .collect();

    let average_daily = if days.is_empty() {
        Nutrition::zero()
    } else {
        let sum: Nutrition = days.iter().map(|d| d.totals).sum();
        sum.scale(1.0 / days.len() as f64)
    };

    ScaledWeek {
        scaling_factor: factor,
        targets,
        days,
        average_daily,
    }
}

fn scale_day_with(
    day_plan: &DayPlan,
    weekday: Weekday,
    factor: f64,
    targets: Nutrition,
    overrides: &CustomAmounts,
    lookup: &IngredientLookup,
    options: &ScalingOptions,
) -> ScaledDay {
    let meals = day_plan
        .meals
        .iter()
        .map(|(slot, meal)| {
            let mut authored = Nutrition::zero();
            let lines = meal
                .ingredients
                .iter()
                .map(|ingredient| {
                    let resolved = lookup.resolve(ingredient);
                    if resolved.per_100g().is_empty() {
                        tracing::debug!(
                            ingredient = %ingredient.name,
                            day = weekday.as_str(),
                            slot = slot.as_str(),
                            "no macro data, line contributes nothing"
                        );
                    }
                    authored = authored + ingredient_nutrition(&resolved, ingredient.amount);

                    let custom = overrides.get(weekday, *slot, &ingredient.name);
                    let baseline = custom.unwrap_or(ingredient.amount);
                    let amount = scale_ingredient(&resolved, baseline, factor);
                    ScaledIngredient::new(resolved, baseline, amount, custom.is_some())
                })
                .collect();
            ScaledMeal::new(*slot, lines, meal.nutrition.unwrap_or(authored))
        })
        .collect();

    let day = ScaledDay::new(weekday, factor, targets, meals);
    if options.reconcile {
        reconcile(&day, &targets, &options.reconcile_options)
    } else {
        day
    }
}
