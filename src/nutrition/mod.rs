//! Meal plan scaling engine
//!
//! Pure functions: units, categories, targets, scaling, reconciliation and
//! tolerance banding. Nothing here touches the database.

pub mod category;
pub mod converter;
pub mod planner;
pub mod reconcile;
pub mod scaler;
pub mod targets;
pub mod tolerance;
pub mod units;

pub use category::{classify, guard, resolve_category, Category};
pub use converter::{from_grams, parse_unit, to_grams, ParsedUnit};
pub use planner::{
    scale_day, scale_week, ScaledDay, ScaledIngredient, ScaledMeal, ScaledWeek, ScalingOptions,
};
pub use reconcile::{reconcile, ReconcileOptions};
pub use scaler::{ingredient_nutrition, scale_amount, scale_ingredient};
pub use targets::{baseline_ttm, compute_scaling_factor, compute_targets, user_ttm};
pub use tolerance::{deviation_pct, within_calorie_tolerance, DayStatus, MacroStatus, ToleranceBand};
pub use units::{grams_per_unit, UnitFamily, UnitKind};
