//! Personalized daily targets and the weight-ratio scaling factor
//!
//! Plans are authored for a 100 kg, moderately active person on a maintenance
//! goal. Everything here is relative to that reference.

use crate::models::{ActivityLevel, FitnessGoal, Nutrition, NutritionPlan, UserProfile};

/// kcal per gram of protein
pub const KCAL_PER_G_PROTEIN: f64 = 4.0;
/// kcal per gram of carbohydrate
pub const KCAL_PER_G_CARBS: f64 = 4.0;
/// kcal per gram of fat
pub const KCAL_PER_G_FAT: f64 = 9.0;

/// kcal per kg of body weight before the activity factor
const KCAL_PER_KG: f64 = 22.0;
/// Weight the baseline plans are written for
pub const REFERENCE_WEIGHT_KG: f64 = 100.0;

pub const MIN_SCALING_FACTOR: f64 = 0.5;
pub const MAX_SCALING_FACTOR: f64 = 1.5;

/// Default macro split (protein, carbs, fat) in percent
const DEFAULT_SPLIT: (f64, f64, f64) = (35.0, 40.0, 25.0);
/// Split for zero-carb plans
const CARNIVORE_SPLIT: (f64, f64, f64) = (35.0, 5.0, 60.0);

/// Maintenance calories plus goal adjustment, unrounded
pub fn user_ttm(profile: &UserProfile) -> f64 {
    let maintenance = profile.effective_weight() * KCAL_PER_KG * profile.activity_level.factor();
    maintenance + profile.fitness_goal.calorie_adjustment()
}

/// TTM of the reference person (2860 kcal)
pub fn baseline_ttm() -> f64 {
    REFERENCE_WEIGHT_KG * KCAL_PER_KG * ActivityLevel::Moderate.factor()
        + FitnessGoal::Maintain.calorie_adjustment()
}

/// First-pass multiplier for baseline amounts, in [0.5, 1.5]
pub fn compute_scaling_factor(profile: &UserProfile) -> f64 {
    let baseline = baseline_ttm();
    let ratio = user_ttm(profile) / baseline;
    if !ratio.is_finite() {
        return 1.0;
    }
    ratio.clamp(MIN_SCALING_FACTOR, MAX_SCALING_FACTOR)
}

/// Daily calorie and macro targets for a user on a plan
///
/// Macro grams come from, in order of preference: the plan's explicit
/// percentage split, its absolute gram targets rescaled to the user's
/// calories, or a fixed split.
pub fn compute_targets(profile: &UserProfile, plan: &NutritionPlan) -> Nutrition {
    let calories = user_ttm(profile).round().max(0.0);

    if let Some((p, c, f)) = plan.macro_percentages() {
        return from_split(calories, (p, c, f));
    }

    let has_gram_targets =
        plan.target_protein > 0.0 || plan.target_carbs > 0.0 || plan.target_fat > 0.0;
    if plan.target_calories > 0.0 && has_gram_targets {
        let ratio = calories / plan.target_calories;
        return Nutrition {
            calories,
            protein: (plan.target_protein * ratio).round(),
            carbs: (plan.target_carbs * ratio).round(),
            fat: (plan.target_fat * ratio).round(),
        };
    }

    let split = if plan.is_carnivore() {
        CARNIVORE_SPLIT
    } else {
        DEFAULT_SPLIT
    };
    tracing::debug!(plan = %plan.name, ?split, "plan has no macro targets, using fixed split");
    from_split(calories, split)
}

fn from_split(calories: f64, (p, c, f): (f64, f64, f64)) -> Nutrition {
    Nutrition {
        calories,
        protein: (calories * p / 100.0 / KCAL_PER_G_PROTEIN).round(),
        carbs: (calories * c / 100.0 / KCAL_PER_G_CARBS).round(),
        fat: (calories * f / 100.0 / KCAL_PER_G_FAT).round(),
    }
}
